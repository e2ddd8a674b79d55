pub mod formatter;
pub mod map;
pub mod theme;

pub use formatter::{
    format_comparison, format_json, format_parameter_table, format_podium, format_profile,
    format_ranked_table, format_score, format_tsv, rank_badge, should_use_colors,
};
pub use map::{build_feature_collection, write_feature_collection, FillBy};
pub use theme::{BaseMapStyle, Palette, ThemeColors, ThemeConfig};
