use anyhow::{bail, Context, Result};
use geojson::{Feature, GeoJson, Geometry};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::scoring::ScoredTable;

use super::types::IndicatorTable;

/// A district polygon keyed by the join key property.
#[derive(Debug, Clone)]
pub struct DistrictBoundary {
    pub id: String,
    pub geometry: Geometry,
}

/// Load district boundaries from a GeoJSON FeatureCollection.
pub fn load_boundaries(path: &Path, key: &str) -> Result<Vec<DistrictBoundary>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open boundary file at {}", path.display()))?;
    read_boundaries(std::io::BufReader::new(file), key)
        .with_context(|| format!("Failed to load boundaries from {}", path.display()))
}

/// Parse boundaries from a GeoJSON reader. Every feature must carry a string
/// `key` property and a geometry.
pub fn read_boundaries<R: Read>(reader: R, key: &str) -> Result<Vec<DistrictBoundary>> {
    let geojson = GeoJson::from_reader(reader).context("Invalid GeoJSON")?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => bail!("Expected a GeoJSON FeatureCollection"),
    };

    let mut seen = HashSet::new();
    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let id = feature_key(&feature, key)
                .with_context(|| format!("Feature {}: missing string property '{}'", i, key))?;
            if !seen.insert(id.clone()) {
                bail!("Feature {}: duplicate {} '{}'", i, key, id);
            }
            let geometry = feature
                .geometry
                .with_context(|| format!("Feature {} ({}): no geometry", i, id))?;
            Ok(DistrictBoundary { id, geometry })
        })
        .collect()
}

fn feature_key(feature: &Feature, key: &str) -> Option<String> {
    feature
        .property(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// One joined row: a boundary with its raw values, score and rank.
#[derive(Debug, Clone)]
pub struct MapFeature<'a> {
    pub boundary: &'a DistrictBoundary,
    pub raw: &'a [f64],
    pub environmental_score: f64,
    pub rank: usize,
}

/// Inner join of boundaries with raw indicators and scores on the entity id.
#[derive(Debug, Clone)]
pub struct JoinResult<'a> {
    /// In boundary order
    pub matched: Vec<MapFeature<'a>>,
    /// Scored entities with no boundary
    pub unmatched_scores: Vec<String>,
    /// Boundaries with no scored entity
    pub unmatched_boundaries: Vec<String>,
}

pub fn join_boundaries<'a>(
    boundaries: &'a [DistrictBoundary],
    raw: &'a IndicatorTable,
    scored: &ScoredTable,
) -> JoinResult<'a> {
    let mut matched = Vec::new();
    let mut unmatched_boundaries = Vec::new();

    for boundary in boundaries {
        match (raw.record(&boundary.id), scored.get(&boundary.id)) {
            (Some(record), Some(ranked)) => matched.push(MapFeature {
                boundary,
                raw: &record.values,
                environmental_score: ranked.record.environmental_score,
                rank: ranked.rank,
            }),
            _ => unmatched_boundaries.push(boundary.id.clone()),
        }
    }

    let boundary_ids: HashSet<&str> = boundaries.iter().map(|b| b.id.as_str()).collect();
    let unmatched_scores = scored
        .records
        .iter()
        .map(|r| r.record.id.clone())
        .filter(|id| !boundary_ids.contains(id.as_str()))
        .collect();

    JoinResult {
        matched,
        unmatched_scores,
        unmatched_boundaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::IndicatorRecord;
    use crate::scoring::{score_and_rank, IndicatorSchema};

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "ADM2_EN": "Colombo" },
                "geometry": { "type": "Polygon", "coordinates": [[[79.8, 6.9], [80.0, 6.9], [80.0, 7.0], [79.8, 6.9]]] }
            },
            {
                "type": "Feature",
                "properties": { "ADM2_EN": "Mannar" },
                "geometry": { "type": "Polygon", "coordinates": [[[79.9, 8.9], [80.1, 8.9], [80.1, 9.0], [79.9, 8.9]]] }
            }
        ]
    }"#;

    fn raw_table() -> IndicatorTable {
        IndicatorTable {
            key: "ADM2_EN".to_string(),
            columns: vec!["rain".to_string()],
            records: vec![
                IndicatorRecord { id: "Colombo".to_string(), values: vec![2400.0] },
                IndicatorRecord { id: "Kandy".to_string(), values: vec![1900.0] },
            ],
        }
    }

    #[test]
    fn test_read_boundaries() {
        let boundaries = read_boundaries(SAMPLE.as_bytes(), "ADM2_EN").unwrap();
        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].id, "Colombo");
    }

    #[test]
    fn test_read_boundaries_wrong_key() {
        let err = read_boundaries(SAMPLE.as_bytes(), "NAME").unwrap_err();
        assert!(err.to_string().contains("missing string property 'NAME'"));
    }

    #[test]
    fn test_read_boundaries_not_a_collection() {
        let single = r#"{ "type": "Point", "coordinates": [80.0, 7.0] }"#;
        assert!(read_boundaries(single.as_bytes(), "ADM2_EN").is_err());
    }

    #[test]
    fn test_join_is_inner() {
        let boundaries = read_boundaries(SAMPLE.as_bytes(), "ADM2_EN").unwrap();
        let raw = raw_table();
        let scored = score_and_rank(&raw, &IndicatorSchema::new(vec!["rain".to_string()], vec![])).unwrap();

        let joined = join_boundaries(&boundaries, &raw, &scored);
        assert_eq!(joined.matched.len(), 1);
        assert_eq!(joined.matched[0].boundary.id, "Colombo");
        assert_eq!(joined.matched[0].raw, &[2400.0]);
        assert_eq!(joined.matched[0].rank, 1);
        assert_eq!(joined.unmatched_scores, vec!["Kandy"]);
        assert_eq!(joined.unmatched_boundaries, vec!["Mannar"]);
    }
}
