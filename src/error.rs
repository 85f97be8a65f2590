use thiserror::Error;

use crate::events::MatchId;

/// Conditions that abort a run. Everything else degrades to a default.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("raw event table is missing or empty")]
    MissingEvents,

    #[error("match metadata table is missing or empty")]
    MissingMatchMetadata,

    #[error("match {match_id} has no date; cannot order matches chronologically")]
    MissingMatchDate { match_id: MatchId },

    #[error("match {match_id} has an unreadable date {raw:?}")]
    InvalidMatchDate { match_id: MatchId, raw: String },

    #[error("input error: {0:#}")]
    Input(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
