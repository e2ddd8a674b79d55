use serde::Serialize;
use std::collections::HashSet;

use super::config::IndicatorSchema;
use super::error::{DegenerateColumn, SchemaIssue, ScoringError};
use crate::data::types::{IndicatorRecord, IndicatorTable};

/// Default absolute tolerance under which two scores count as tied.
pub const DEFAULT_TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankOrder {
    /// Highest score gets rank 1
    #[default]
    Descending,
    Ascending,
}

/// Min-max normalized table plus the constant columns that fell back to 0.0.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub table: IndicatorTable,
    pub warnings: Vec<DegenerateColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub id: String,
    /// Polarity-corrected normalized values, ordered like the table columns
    pub values: Vec<f64>,
    pub environmental_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    #[serde(flatten)]
    pub record: ScoredRecord,
    pub rank: usize,
}

/// Output of [`score_and_rank`]: every input entity, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTable {
    pub key: String,
    pub columns: Vec<String>,
    pub records: Vec<RankedRecord>,
    pub warnings: Vec<DegenerateColumn>,
}

impl ScoredTable {
    /// Records sorted by rank; tied records keep input order.
    pub fn by_rank(&self) -> Vec<&RankedRecord> {
        let mut sorted: Vec<_> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.rank);
        sorted
    }

    pub fn get(&self, id: &str) -> Option<&RankedRecord> {
        self.records.iter().find(|r| r.record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_score(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.record.environmental_score)
            .fold(None, |acc, s| Some(acc.map_or(s, |m: f64| m.max(s))))
    }
}

/// Scoring options that are not part of the schema.
#[derive(Debug, Clone, Copy)]
pub struct ScoringOptions {
    pub order: RankOrder,
    pub tie_tolerance: f64,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            order: RankOrder::Descending,
            tie_tolerance: DEFAULT_TIE_TOLERANCE,
        }
    }
}

/// Min-max scale every schema column to [0, 1].
///
/// Constant columns normalize to 0.0 and are reported in `warnings`.
pub fn normalize(table: &IndicatorTable, schema: &IndicatorSchema) -> Result<Normalized, ScoringError> {
    if table.is_empty() {
        return Err(SchemaIssue::NoRows.into());
    }

    let columns = schema.columns();
    check_distinct(&columns)?;
    let selected = table.select(&columns)?;
    check_finite(&selected)?;

    let mut bounds = Vec::with_capacity(selected.columns.len());
    let mut warnings = Vec::new();
    for name in &selected.columns {
        // Non-empty and finite, so min_max is always Some
        let (lo, hi) = selected.column(name)?.min_max().unwrap_or((0.0, 0.0));
        if hi == lo {
            warnings.push(DegenerateColumn {
                column: name.clone(),
                value: lo,
            });
        }
        bounds.push((lo, hi));
    }

    let records = selected
        .records
        .iter()
        .map(|r| IndicatorRecord {
            id: r.id.clone(),
            values: r
                .values
                .iter()
                .zip(&bounds)
                .map(|(&v, &(lo, hi))| scale(v, lo, hi))
                .collect(),
        })
        .collect();

    Ok(Normalized {
        table: IndicatorTable {
            key: selected.key,
            columns: selected.columns,
            records,
        },
        warnings,
    })
}

/// Replace `v` with `1 - v` in every listed column. Applying it twice restores
/// the input.
pub fn correct_polarity(
    normalized: &IndicatorTable,
    bad_columns: &[String],
) -> Result<IndicatorTable, ScoringError> {
    check_distinct(bad_columns)?;
    let indices = column_indices(normalized, bad_columns)?;

    let mut corrected = normalized.clone();
    for record in &mut corrected.records {
        for index in &indices {
            if let Some(v) = record.values.get_mut(*index) {
                *v = 1.0 - *v;
            }
        }
    }
    Ok(corrected)
}

/// Unweighted mean over `good_columns` and `bad_columns` (already corrected,
/// so higher is better for both).
pub fn compute_score(
    corrected: &IndicatorTable,
    good_columns: &[String],
    bad_columns: &[String],
) -> Result<Vec<ScoredRecord>, ScoringError> {
    let scored: Vec<String> = good_columns.iter().chain(bad_columns).cloned().collect();
    if scored.is_empty() {
        return Err(ScoringError::EmptyColumnSet);
    }

    check_distinct(&scored)?;
    let indices = column_indices(corrected, &scored)?;

    Ok(corrected
        .records
        .iter()
        .map(|r| {
            let sum: f64 = indices.iter().filter_map(|&i| r.values.get(i)).sum();
            ScoredRecord {
                id: r.id.clone(),
                values: r.values.clone(),
                environmental_score: sum / indices.len() as f64,
            }
        })
        .collect())
}

/// Competition ranking with the default tie tolerance.
pub fn rank(scored: Vec<ScoredRecord>, order: RankOrder) -> Vec<RankedRecord> {
    rank_with_tolerance(scored, order, DEFAULT_TIE_TOLERANCE)
}

/// Competition ("min") ranking: k entities tied at rank R are followed by
/// rank R + k. A score joins the current tie group when it is within
/// `tolerance` of the group's first member. Output keeps input order.
pub fn rank_with_tolerance(
    scored: Vec<ScoredRecord>,
    order: RankOrder,
    tolerance: f64,
) -> Vec<RankedRecord> {
    let mut positions: Vec<usize> = (0..scored.len()).collect();
    positions.sort_by(|&a, &b| {
        let (sa, sb) = (scored[a].environmental_score, scored[b].environmental_score);
        match order {
            RankOrder::Descending => sb.total_cmp(&sa),
            RankOrder::Ascending => sa.total_cmp(&sb),
        }
    });

    let mut ranks = vec![0; scored.len()];
    let mut leader: Option<(f64, usize)> = None;
    for (pos, &idx) in positions.iter().enumerate() {
        let score = scored[idx].environmental_score;
        let rank = match leader {
            Some((lead, rank)) if (lead - score).abs() <= tolerance => rank,
            _ => {
                leader = Some((score, pos + 1));
                pos + 1
            }
        };
        ranks[idx] = rank;
    }

    scored
        .into_iter()
        .zip(ranks)
        .map(|(record, rank)| RankedRecord { record, rank })
        .collect()
}

/// normalize, correct polarity, score and rank in one call.
pub fn score_and_rank(table: &IndicatorTable, schema: &IndicatorSchema) -> Result<ScoredTable, ScoringError> {
    score_and_rank_with(table, schema, ScoringOptions::default())
}

pub fn score_and_rank_with(
    table: &IndicatorTable,
    schema: &IndicatorSchema,
    options: ScoringOptions,
) -> Result<ScoredTable, ScoringError> {
    if schema.is_empty() {
        return Err(ScoringError::EmptyColumnSet);
    }
    let normalized = normalize(table, schema)?;
    let corrected = correct_polarity(&normalized.table, &schema.bad)?;
    let scored = compute_score(&corrected, &schema.good, &schema.bad)?;
    let records = rank_with_tolerance(scored, options.order, options.tie_tolerance);

    Ok(ScoredTable {
        key: corrected.key,
        columns: corrected.columns,
        records,
        warnings: normalized.warnings,
    })
}

/// Min-max position of `v` in [lo, hi]. A range wider than f64::MAX is
/// scaled on halved operands so it stays finite.
fn scale(v: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return 0.0;
    }
    let range = hi - lo;
    if range.is_finite() {
        (v - lo) / range
    } else {
        (v / 2.0 - lo / 2.0) / (hi / 2.0 - lo / 2.0)
    }
}

fn check_distinct(columns: &[String]) -> Result<(), ScoringError> {
    let mut seen = HashSet::new();
    match columns.iter().find(|c| !seen.insert(c.as_str())) {
        Some(column) => Err(SchemaIssue::DuplicateColumn(column.clone()).into()),
        None => Ok(()),
    }
}

fn column_indices(table: &IndicatorTable, columns: &[String]) -> Result<Vec<usize>, ScoringError> {
    columns
        .iter()
        .map(|c| {
            table
                .column_index(c)
                .ok_or_else(|| ScoringError::from(SchemaIssue::MissingColumn(c.clone())))
        })
        .collect()
}

fn check_finite(table: &IndicatorTable) -> Result<(), ScoringError> {
    for record in &table.records {
        for (column, value) in table.columns.iter().zip(&record.values) {
            if !value.is_finite() {
                return Err(SchemaIssue::NonFinite {
                    column: column.clone(),
                    entity: record.id.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}
