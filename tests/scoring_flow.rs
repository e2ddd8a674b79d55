use std::path::PathBuf;

use district_rank::config::parse_config;
use district_rank::data::{join_boundaries, load_boundaries, load_indicators, CacheConfig, CacheSource, DatasetCache};
use district_rank::output::{build_feature_collection, format_tsv, FillBy, ThemeConfig};
use district_rank::scoring::{score_and_rank, IndicatorSchema};

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

#[test]
fn test_sample_data_ranks_with_default_schema() {
    let table = load_indicators(&sample("sample_districts.csv")).unwrap();
    assert_eq!(table.key, "ADM2_EN");
    assert_eq!(table.len(), 6);

    let scored = score_and_rank(&table, &IndicatorSchema::default()).unwrap();
    assert!(scored.warnings.is_empty());

    let order: Vec<&str> = scored.by_rank().iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(
        order,
        vec!["Nuwara Eliya", "Ratnapura", "Kandy", "Gampaha", "Colombo", "Jaffna"]
    );

    for r in &scored.records {
        assert!((0.0..=1.0).contains(&r.record.environmental_score));
        assert!(r.record.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    let tsv = format_tsv(&scored);
    assert!(tsv.starts_with("1\tNuwara Eliya\t0.845"));
}

#[test]
fn test_sample_data_map_export() {
    let table = load_indicators(&sample("sample_districts.csv")).unwrap();
    let scored = score_and_rank(&table, &IndicatorSchema::default()).unwrap();
    let boundaries = load_boundaries(&sample("sample_districts.geojson"), "ADM2_EN").unwrap();

    let joined = join_boundaries(&boundaries, &table, &scored);
    assert_eq!(joined.matched.len(), 5);
    assert_eq!(joined.unmatched_scores, vec!["Jaffna"]);
    assert_eq!(joined.unmatched_boundaries, vec!["Matara"]);

    let collection =
        build_feature_collection(&joined, &table, &FillBy::Score, &ThemeConfig::default()).unwrap();
    let kandy = collection
        .features
        .iter()
        .find(|f| f.property("ADM2_EN").and_then(|v| v.as_str()) == Some("Kandy"))
        .unwrap();
    assert_eq!(kandy.property("Rank").unwrap(), 3);
}

#[test]
fn test_custom_schema_from_config() {
    let config = parse_config(
        r#"
schema:
  good: [Rain_dist_Mean_Rainfall_mm]
  bad: []
"#,
    )
    .unwrap();
    let table = load_indicators(&sample("sample_districts.csv")).unwrap();
    let scored = score_and_rank(&table, &config.effective_schema()).unwrap();

    // Rainfall alone: wettest first, driest scores zero
    assert_eq!(scored.get("Ratnapura").unwrap().rank, 1);
    assert_eq!(scored.get("Ratnapura").unwrap().record.environmental_score, 1.0);
    assert_eq!(scored.get("Jaffna").unwrap().record.environmental_score, 0.0);
    assert_eq!(scored.columns, vec!["Rain_dist_Mean_Rainfall_mm"]);
}

#[test]
fn test_cached_load_matches_fresh_load() {
    let cache_dir = std::env::temp_dir().join("district_rank_test_flow_cache");
    let _ = std::fs::remove_dir_all(&cache_dir);
    let config = CacheConfig {
        enabled: true,
        max_age: None,
    };
    let path = sample("sample_districts.csv");

    let (first, source) = DatasetCache::new(cache_dir.clone(), config.clone())
        .get_or_load(&path, load_indicators)
        .unwrap();
    assert_eq!(source, CacheSource::Loaded);

    // A new cache instance only has the disk copy
    let (second, source) = DatasetCache::new(cache_dir.clone(), config)
        .get_or_load(&path, load_indicators)
        .unwrap();
    assert_eq!(source, CacheSource::Disk);
    assert_eq!(*first, *second);

    let _ = std::fs::remove_dir_all(&cache_dir);
}
