use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde_json::json;
use std::io::Write;
use std::path::Path;

use super::theme::{Rgb, ThemeConfig};
use crate::data::{IndicatorTable, JoinResult};
use crate::scoring::ScoringError;

/// Default view over Sri Lanka
pub const DEFAULT_CENTER: (f64, f64) = (7.8731, 80.7718);
pub const DEFAULT_ZOOM: u8 = 7;

/// What the choropleth fill color encodes.
#[derive(Debug, Clone, PartialEq)]
pub enum FillBy {
    Score,
    /// Raw value of an indicator column
    Column(String),
}

/// Build a FeatureCollection from joined boundaries. Each feature carries the
/// district id, every raw indicator, the score, the rank and a `fill` color.
/// Map display hints go in a top-level `map` member.
pub fn build_feature_collection(
    joined: &JoinResult<'_>,
    raw: &IndicatorTable,
    fill_by: &FillBy,
    theme: &ThemeConfig,
) -> Result<FeatureCollection, ScoringError> {
    let fill_values: Vec<f64> = match fill_by {
        FillBy::Score => joined.matched.iter().map(|f| f.environmental_score).collect(),
        FillBy::Column(name) => {
            let index = raw.column(name)?.index();
            joined
                .matched
                .iter()
                .map(|f| f.raw.get(index).copied().unwrap_or(f64::NAN))
                .collect()
        }
    };
    let (lo, hi) = fill_values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let features = joined
        .matched
        .iter()
        .zip(&fill_values)
        .map(|(feature, &fill_value)| {
            let mut properties = JsonObject::new();
            properties.insert(raw.key.clone(), JsonValue::from(feature.boundary.id.clone()));
            for (column, value) in raw.columns.iter().zip(feature.raw) {
                properties.insert(column.clone(), JsonValue::from(*value));
            }
            properties.insert(
                "Environmental_Score".to_string(),
                JsonValue::from(feature.environmental_score),
            );
            properties.insert("Rank".to_string(), JsonValue::from(feature.rank));

            let Rgb(r, g, b) = theme.palette.color_for(fill_value, lo, hi);
            properties.insert(
                "fill".to_string(),
                JsonValue::from(format!("#{:02x}{:02x}{:02x}", r, g, b)),
            );

            Feature {
                bbox: None,
                geometry: Some(feature.boundary.geometry.clone()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let fill_label = match fill_by {
        FillBy::Score => "Environmental_Score".to_string(),
        FillBy::Column(name) => name.clone(),
    };
    let mut foreign = JsonObject::new();
    foreign.insert(
        "map".to_string(),
        json!({
            "style": theme.base_map_style.tile_style(),
            "palette": theme.palette,
            "fill_by": fill_label,
            "center": { "lat": DEFAULT_CENTER.0, "lon": DEFAULT_CENTER.1 },
            "zoom": DEFAULT_ZOOM,
            "opacity": 0.7,
        }),
    );

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    })
}

/// Write a FeatureCollection to `path` atomically.
pub fn write_feature_collection(path: &Path, collection: FeatureCollection) -> Result<()> {
    let text = GeoJson::FeatureCollection(collection).to_string();

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("Failed to write map to {}", path.display()))?;
    file.commit().context("Failed to save map")?;
    Ok(())
}
