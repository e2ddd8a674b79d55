use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use super::types::{IndicatorRecord, IndicatorTable};

/// Load an indicator table from a CSV file.
///
/// The first column is the entity identifier; every other column must be
/// numeric. See [`read_indicators`] for the row rules.
pub fn load_indicators(path: &Path) -> Result<IndicatorTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open indicator file at {}", path.display()))?;
    read_indicators(file)
        .with_context(|| format!("Failed to load indicators from {}", path.display()))
}

/// Parse indicator CSV from any reader.
///
/// Cells are trimmed. Rows with an empty or duplicated identifier, or with an
/// empty or non-numeric indicator cell, are errors; nothing is skipped.
pub fn read_indicators<R: Read>(reader: R) -> Result<IndicatorTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let mut names = headers.iter();
    let key = match names.next() {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => bail!("CSV header is missing the identifier column"),
    };
    let columns: Vec<String> = names.map(str::to_string).collect();

    let mut seen_columns = HashSet::new();
    for column in &columns {
        if column.is_empty() {
            bail!("CSV header has an unnamed column");
        }
        if !seen_columns.insert(column.as_str()) || column == &key {
            bail!("CSV header repeats column '{}'", column);
        }
    }

    let mut table = IndicatorTable::new(key, columns);
    let mut seen_ids = HashSet::new();

    for (i, result) in rdr.records().enumerate() {
        // Header is line 1
        let line = i + 2;
        let record = result.with_context(|| format!("Line {}: CSV parse error", line))?;

        let id = record.get(0).unwrap_or_default().to_string();
        if id.is_empty() {
            bail!("Line {}: empty {}", line, table.key);
        }
        if !seen_ids.insert(id.clone()) {
            bail!("Line {}: duplicate {} '{}'", line, table.key, id);
        }

        let values = table
            .columns
            .iter()
            .enumerate()
            .map(|(c, column)| -> Result<f64> {
                let cell = record.get(c + 1).unwrap_or_default();
                if cell.is_empty() {
                    bail!("Line {}: missing value for '{}' ({})", line, column, id);
                }
                let value = cell.parse::<f64>().with_context(|| {
                    format!("Line {}: '{}' is not a number in column '{}'", line, cell, column)
                })?;
                if !value.is_finite() {
                    bail!("Line {}: '{}' is not a finite number in column '{}'", line, cell, column);
                }
                Ok(value)
            })
            .collect::<Result<Vec<_>>>()?;

        table.records.push(IndicatorRecord { id, values });
    }

    Ok(table)
}
