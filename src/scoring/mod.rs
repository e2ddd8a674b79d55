pub mod config;
pub mod engine;
pub mod error;
pub mod validation;

pub use config::*;
pub use engine::{
    compute_score, correct_polarity, normalize, rank, rank_with_tolerance, score_and_rank,
    score_and_rank_with, Normalized, RankOrder, RankedRecord, ScoredRecord, ScoredTable,
    ScoringOptions, DEFAULT_TIE_TOLERANCE,
};
pub use error::{DegenerateColumn, SchemaIssue, ScoringError};
pub use validation::{validate_ranking, validate_schema};
