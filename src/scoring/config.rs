use serde::{Deserialize, Serialize};

/// Whether a higher raw value means a better or worse environmental outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Good,
    Bad,
}

/// Indicator schema: which columns are scored and with which polarity.
///
/// Column order is `good` followed by `bad`. The two lists must be disjoint
/// (see [`validate_schema`](super::validate_schema)).
///
/// Example YAML:
/// ```yaml
/// schema:
///   good: [Rain_dist_Mean_Rainfall_mm, canopy_dist_Mean_Canopy_Height]
///   bad: [co_dist_Mean_CO]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndicatorSchema {
    /// Beneficial indicators: higher raw value, better outcome
    #[serde(default)]
    pub good: Vec<String>,

    /// Detrimental indicators: higher raw value, worse outcome
    #[serde(default)]
    pub bad: Vec<String>,
}

impl Default for IndicatorSchema {
    fn default() -> Self {
        Self {
            good: vec![
                "Rain_dist_Mean_Rainfall_mm".to_string(),
                "District_Mean_NDVI_2020_2025_Mean_NDVI".to_string(),
                "canopy_dist_Mean_Canopy_Height".to_string(),
                "treeloss_treecover_Mean_TreeCover2000".to_string(),
            ],
            bad: vec![
                "co_dist_Mean_CO".to_string(),
                "District_Mean_NO2_2019_2024_Mean_NO2".to_string(),
                "treeloss_treecover_Forest_Loss_km2".to_string(),
                "District_Mean_SI_2020_2025_Mean_SI".to_string(),
            ],
        }
    }
}

impl IndicatorSchema {
    pub fn new(good: Vec<String>, bad: Vec<String>) -> Self {
        Self { good, bad }
    }

    /// All scored columns, good first
    pub fn columns(&self) -> Vec<String> {
        self.good.iter().chain(self.bad.iter()).cloned().collect()
    }

    pub fn polarity(&self, column: &str) -> Option<Polarity> {
        if self.good.iter().any(|c| c == column) {
            Some(Polarity::Good)
        } else if self.bad.iter().any(|c| c == column) {
            Some(Polarity::Bad)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.good.is_empty() && self.bad.is_empty()
    }
}

/// Ranking options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    /// Scores within this distance of a tie group's first member share its rank
    #[serde(default)]
    pub tie_tolerance: Option<f64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            tie_tolerance: Some(super::engine::DEFAULT_TIE_TOLERANCE),
        }
    }
}

impl RankingConfig {
    pub fn effective_tolerance(&self) -> f64 {
        self.tie_tolerance
            .unwrap_or(super::engine::DEFAULT_TIE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_has_eight_indicators() {
        let schema = IndicatorSchema::default();
        assert_eq!(schema.good.len(), 4);
        assert_eq!(schema.bad.len(), 4);
        assert_eq!(schema.columns().len(), 8);
        assert_eq!(schema.columns()[0], "Rain_dist_Mean_Rainfall_mm");
        assert_eq!(schema.columns()[4], "co_dist_Mean_CO");
    }

    #[test]
    fn test_polarity_lookup() {
        let schema = IndicatorSchema::default();
        assert_eq!(schema.polarity("co_dist_Mean_CO"), Some(Polarity::Bad));
        assert_eq!(
            schema.polarity("canopy_dist_Mean_Canopy_Height"),
            Some(Polarity::Good)
        );
        assert_eq!(schema.polarity("ADM2_EN"), None);
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = IndicatorSchema::default();
        let yaml = serde_saphyr::to_string(&schema).unwrap();
        let parsed: IndicatorSchema = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn test_partial_schema_parse() {
        let yaml = r#"
good: [A]
"#;
        let schema: IndicatorSchema = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(schema.good, vec!["A"]);
        assert!(schema.bad.is_empty());
        assert!(!schema.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
good: [A]
ugly: [B]
"#;
        let result: Result<IndicatorSchema, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_ranking_config_tolerance() {
        let config: RankingConfig = serde_saphyr::from_str("tie_tolerance: 0.001").unwrap();
        assert_eq!(config.effective_tolerance(), 0.001);

        let empty: RankingConfig = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(empty.effective_tolerance(), 1e-9);
    }
}
