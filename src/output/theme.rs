//! Presentation theme: one configuration shared by every renderer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Continuous color scale used for scores and parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    #[default]
    #[value(name = "ylgnbu")]
    YlGnBu,
    Viridis,
}

const YLGNBU: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xd9),
    (0xed, 0xf8, 0xb1),
    (0xc7, 0xe9, 0xb4),
    (0x7f, 0xcd, 0xbb),
    (0x41, 0xb6, 0xc4),
    (0x1d, 0x91, 0xc0),
    (0x22, 0x5e, 0xa8),
    (0x25, 0x34, 0x94),
    (0x08, 0x1d, 0x58),
];

const VIRIDIS: [(u8, u8, u8); 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

impl Palette {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Palette::YlGnBu => &YLGNBU,
            Palette::Viridis => &VIRIDIS,
        }
    }

    /// Color at position `t` in [0, 1], linearly interpolated between stops.
    /// Out-of-range and NaN positions are clamped.
    pub fn color_at(&self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - lower as f64;

        let (r0, g0, b0) = stops[lower];
        let (r1, g1, b1) = stops[lower + 1];
        let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        Rgb(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
    }

    /// Color for `value` within [min, max]; a zero-width range maps to the low end.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> Rgb {
        if max > min {
            self.color_at((value - min) / (max - min))
        } else {
            self.color_at(0.0)
        }
    }

    pub fn hex_at(&self, t: f64) -> String {
        let Rgb(r, g, b) = self.color_at(t);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

/// Background style of the base map the presentation layer draws under the
/// district polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BaseMapStyle {
    #[default]
    Light,
    Dark,
    /// Follow the terminal background
    Auto,
}

impl BaseMapStyle {
    /// Resolve `Auto` against the terminal background. Falls back to light when
    /// the terminal cannot be queried (pipes, CI).
    pub fn resolve(self) -> BaseMapStyle {
        match self {
            BaseMapStyle::Auto => match terminal_light::luma() {
                Ok(luma) if luma < 0.6 => BaseMapStyle::Dark,
                _ => BaseMapStyle::Light,
            },
            other => other,
        }
    }

    /// Tile style name understood by common web map front ends.
    pub fn tile_style(self) -> &'static str {
        match self.resolve() {
            BaseMapStyle::Dark => "carto-darkmatter",
            _ => "carto-positron",
        }
    }
}

/// Theme configuration.
///
/// Example YAML:
/// ```yaml
/// theme:
///   palette: viridis
///   base_map_style: dark
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    #[serde(default)]
    pub palette: Palette,

    #[serde(default)]
    pub base_map_style: BaseMapStyle,
}

/// Terminal colors derived from a [`ThemeConfig`].
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub palette: Palette,
    pub header: Rgb,
    pub muted: Rgb,
    pub highlight: Rgb,
    pub bar_empty: Rgb,
}

impl ThemeColors {
    pub fn from_config(config: &ThemeConfig) -> Self {
        match config.base_map_style.resolve() {
            BaseMapStyle::Dark => Self::dark(config.palette),
            _ => Self::light(config.palette),
        }
    }

    pub fn light(palette: Palette) -> Self {
        Self {
            palette,
            header: Rgb(0x4c, 0xaf, 0x50),
            muted: Rgb(0x80, 0x80, 0x80),
            highlight: Rgb(0x2e, 0x86, 0xc1),
            bar_empty: Rgb(0xd0, 0xd0, 0xd0),
        }
    }

    pub fn dark(palette: Palette) -> Self {
        Self {
            palette,
            header: Rgb(0x81, 0xc7, 0x84),
            muted: Rgb(0x9e, 0x9e, 0x9e),
            highlight: Rgb(0x85, 0xc1, 0xe9),
            bar_empty: Rgb(0x3a, 0x3a, 0x3a),
        }
    }

    /// Palette color for a score relative to the best score in the table
    pub fn score_color(&self, score: f64, max_score: f64) -> Rgb {
        if max_score > 0.0 {
            self.palette.color_at(score / max_score)
        } else {
            self.palette.color_at(0.0)
        }
    }
}
