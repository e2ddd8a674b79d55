use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::theme::ThemeConfig;
use crate::scoring::{IndicatorSchema, RankingConfig};

/// Top-level configuration file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub schema: Option<IndicatorSchema>,

    #[serde(default)]
    pub ranking: Option<RankingConfig>,

    #[serde(default)]
    pub theme: Option<ThemeConfig>,

    #[serde(default)]
    pub cache: Option<CacheSettings>,
}

impl Config {
    pub fn effective_schema(&self) -> IndicatorSchema {
        self.schema.clone().unwrap_or_default()
    }

    pub fn effective_ranking(&self) -> RankingConfig {
        self.ranking.clone().unwrap_or_default()
    }

    pub fn effective_theme(&self) -> ThemeConfig {
        self.theme.clone().unwrap_or_default()
    }

    pub fn effective_cache(&self) -> CacheSettings {
        self.cache.clone().unwrap_or_default()
    }
}

/// Input files. Relative paths are resolved against the working directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// Indicator CSV (first column is the district identifier)
    #[serde(default)]
    pub indicators: Option<PathBuf>,

    /// District boundaries as a GeoJSON FeatureCollection
    #[serde(default)]
    pub boundaries: Option<PathBuf>,

    /// Boundary property holding the district identifier.
    /// Defaults to the CSV identifier column header.
    #[serde(default)]
    pub join_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// humantime duration, e.g. "7d" or "12h"
    #[serde(default)]
    pub max_age: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age: Some("7d".to_string()),
        }
    }
}
