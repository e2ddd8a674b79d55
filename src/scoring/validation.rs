use std::collections::HashSet;

use super::config::{IndicatorSchema, RankingConfig};

/// Validate the indicator schema at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_schema(schema: &IndicatorSchema) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if schema.is_empty() {
        errors.push("schema: at least one good or bad indicator is required".to_string());
    }

    let mut seen = HashSet::new();
    for (section, columns) in [("good", &schema.good), ("bad", &schema.bad)] {
        for (i, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                errors.push(format!("schema.{}[{}]: column name is empty", section, i));
                continue;
            }
            if !seen.insert(column.as_str()) {
                if section == "bad" && schema.good.contains(column) {
                    errors.push(format!(
                        "schema.bad[{}]: '{}' is already listed as good",
                        i, column
                    ));
                } else {
                    errors.push(format!(
                        "schema.{}[{}]: '{}' is listed more than once",
                        section, i, column
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate ranking options.
pub fn validate_ranking(config: &RankingConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(tolerance) = config.tie_tolerance {
        if !tolerance.is_finite() || tolerance < 0.0 {
            errors.push(format!(
                "ranking.tie_tolerance: must be a non-negative number, got {}",
                tolerance
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
