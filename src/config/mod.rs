mod init;
mod schema;

pub use init::{run_init, starter_config, write_config};
pub use schema::{CacheSettings, Config, DataConfig};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::CacheConfig;
use crate::scoring::{validate_ranking, validate_schema};

/// Get the config directory path (~/.config/district-rank/)
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".config").join("district-rank"))
        .unwrap_or_else(|| PathBuf::from(".district-rank"))
}

/// Get the default config file path (~/.config/district-rank/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path and
///   falls back to the built-in defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);
    load_config_from(&config_path, explicit)
}

fn load_config_from(config_path: &Path, explicit: bool) -> Result<Config> {
    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    // An empty file is a valid, all-defaults config
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_saphyr::from_str(content)?)
}

/// Validate every section of the config.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_schema(&config.effective_schema()) {
        errors.extend(e);
    }
    if let Err(e) = validate_ranking(&config.effective_ranking()) {
        errors.extend(e);
    }
    if let Some(ref max_age) = config.effective_cache().max_age {
        if let Err(e) = humantime::parse_duration(max_age) {
            errors.push(format!("cache.max_age: invalid duration '{}' - {}", max_age, e));
        }
    }
    if let Some(ref key) = config.data.join_key {
        if key.trim().is_empty() {
            errors.push("data.join_key: must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Cache settings in the form the dataset cache takes. Call after
/// [`validate_config`]; an unparsable `max_age` is treated as unset.
pub fn cache_config(config: &Config, no_cache: bool) -> CacheConfig {
    let settings = config.effective_cache();
    CacheConfig {
        enabled: settings.enabled && !no_cache,
        max_age: settings
            .max_age
            .as_deref()
            .and_then(|s| humantime::parse_duration(s).ok()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::theme::{BaseMapStyle, Palette};
    use std::env;
    use std::time::Duration;

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.effective_schema().columns().len(), 8);
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
data:
  indicators: data/districts.csv
  boundaries: data/districts.geojson
  join_key: ADM2_EN
schema:
  good: [rain, ndvi]
  bad: [co]
ranking:
  tie_tolerance: 0.0001
theme:
  palette: viridis
  base_map_style: dark
cache:
  enabled: false
  max_age: 12h
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.data.indicators, Some(PathBuf::from("data/districts.csv")));
        assert_eq!(config.effective_schema().good, vec!["rain", "ndvi"]);
        assert_eq!(config.effective_ranking().effective_tolerance(), 0.0001);
        assert_eq!(config.effective_theme().palette, Palette::Viridis);
        assert_eq!(config.effective_theme().base_map_style, BaseMapStyle::Dark);
        assert!(!config.effective_cache().enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(parse_config("colors: {}").is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let yaml = r#"
schema:
  good: [rain]
  bad: [rain]
ranking:
  tie_tolerance: -1
cache:
  max_age: soon
"#;
        let config = parse_config(yaml).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.starts_with("schema.bad[0]")));
        assert!(errors.iter().any(|e| e.starts_with("ranking.tie_tolerance")));
        assert!(errors.iter().any(|e| e.starts_with("cache.max_age")));
    }

    #[test]
    fn test_cache_config_no_cache_flag() {
        let config = Config::default();
        let cache = cache_config(&config, false);
        assert!(cache.enabled);
        assert_eq!(cache.max_age, Some(Duration::from_secs(7 * 86400)));
        assert!(!cache_config(&config, true).enabled);
    }

    #[test]
    fn test_load_missing_default_is_ok_but_explicit_is_error() {
        let path = env::temp_dir().join("district_rank_test_missing_config.yaml");
        let _ = fs::remove_file(&path);
        let err = load_config(Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));

        // Same missing file at the default location falls back to defaults
        assert_eq!(load_config_from(&path, false).unwrap(), Config::default());
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let path = env::temp_dir().join("district_rank_test_config_roundtrip.yaml");
        let _ = fs::remove_file(&path);

        let config = starter_config();
        write_config(&path, &config, false).unwrap();
        let loaded = load_config(Some(path.clone())).unwrap();
        assert_eq!(loaded, config);

        // Refuses to overwrite without force
        assert!(write_config(&path, &config, false).is_err());
        assert!(write_config(&path, &config, true).is_ok());

        let _ = fs::remove_file(&path);
    }
}
