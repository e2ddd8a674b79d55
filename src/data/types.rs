use serde::{Deserialize, Serialize};

use crate::scoring::{SchemaIssue, ScoringError};

/// One row of the indicator table: an entity and its indicator values,
/// ordered like the owning table's `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub id: String,
    pub values: Vec<f64>,
}

/// Rectangular table of numeric indicators keyed by entity identifier.
///
/// Raw, normalized and polarity-corrected data all share this shape; only the
/// meaning of the values changes between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorTable {
    /// Header of the identifier column (e.g. "ADM2_EN")
    pub key: String,
    pub columns: Vec<String>,
    pub records: Vec<IndicatorRecord>,
}

/// Borrowed view over a single column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    pub name: &'a str,
    index: usize,
    table: &'a IndicatorTable,
}

impl<'a> ColumnView<'a> {
    /// Position of the column in the owning table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, row: usize) -> Option<f64> {
        self.table
            .records
            .get(row)
            .and_then(|r| r.values.get(self.index))
            .copied()
    }

    /// (entity id, value) pairs in table order
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let index = self.index;
        self.table
            .records
            .iter()
            .filter_map(move |r| r.values.get(index).map(|v| (r.id.as_str(), *v)))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + 'a {
        self.entries().map(|(_, v)| v)
    }

    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl IndicatorTable {
    pub fn new(key: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            key: key.into(),
            columns,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Capability-checked column access. Unknown names are an error, never an
    /// empty column.
    pub fn column(&self, name: &str) -> Result<ColumnView<'_>, ScoringError> {
        let index = self
            .column_index(name)
            .ok_or_else(|| ScoringError::InvalidSchema(SchemaIssue::MissingColumn(name.to_string())))?;
        Ok(ColumnView {
            name: &self.columns[index],
            index,
            table: self,
        })
    }

    pub fn record(&self, id: &str) -> Option<&IndicatorRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Value of `column` for entity `id`. Unknown columns fail, unknown ids
    /// return `Ok(None)`.
    pub fn value(&self, id: &str, column: &str) -> Result<Option<f64>, ScoringError> {
        let col = self.column(column)?;
        Ok(self
            .record(id)
            .and_then(|r| r.values.get(col.index))
            .copied())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// Copy of the table restricted to `columns`, in that order.
    pub fn select(&self, columns: &[String]) -> Result<IndicatorTable, ScoringError> {
        let indices = columns
            .iter()
            .map(|c| {
                self.column_index(c)
                    .ok_or_else(|| ScoringError::InvalidSchema(SchemaIssue::MissingColumn(c.clone())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let records = self
            .records
            .iter()
            .map(|r| IndicatorRecord {
                id: r.id.clone(),
                values: indices.iter().map(|&i| r.values[i]).collect(),
            })
            .collect();

        Ok(IndicatorTable {
            key: self.key.clone(),
            columns: columns.to_vec(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> IndicatorTable {
        IndicatorTable {
            key: "ADM2_EN".to_string(),
            columns: vec!["rain".to_string(), "co".to_string()],
            records: vec![
                IndicatorRecord { id: "Colombo".to_string(), values: vec![2400.0, 0.031] },
                IndicatorRecord { id: "Kandy".to_string(), values: vec![1900.0, 0.027] },
                IndicatorRecord { id: "Jaffna".to_string(), values: vec![1200.0, 0.029] },
            ],
        }
    }

    #[test]
    fn test_column_lookup() {
        let table = sample_table();
        let col = table.column("co").unwrap();
        assert_eq!(col.name, "co");
        assert_eq!(col.get(1), Some(0.027));
        assert_eq!(col.values().count(), 3);
    }

    #[test]
    fn test_unknown_column_is_invalid_schema() {
        let table = sample_table();
        let err = table.column("no2").unwrap_err();
        assert_eq!(
            err,
            ScoringError::InvalidSchema(SchemaIssue::MissingColumn("no2".to_string()))
        );
    }

    #[test]
    fn test_min_max() {
        let table = sample_table();
        assert_eq!(table.column("rain").unwrap().min_max(), Some((1200.0, 2400.0)));
    }

    #[test]
    fn test_value_lookup() {
        let table = sample_table();
        assert_eq!(table.value("Kandy", "rain").unwrap(), Some(1900.0));
        assert_eq!(table.value("Galle", "rain").unwrap(), None);
        assert!(table.value("Kandy", "ndvi").is_err());
    }

    #[test]
    fn test_select_reorders_columns() {
        let table = sample_table();
        let selected = table.select(&["co".to_string(), "rain".to_string()]).unwrap();
        assert_eq!(selected.columns, vec!["co", "rain"]);
        assert_eq!(selected.records[0].values, vec![0.031, 2400.0]);
    }

    #[test]
    fn test_select_missing_column() {
        let table = sample_table();
        assert!(table.select(&["ndvi".to_string()]).is_err());
    }
}
