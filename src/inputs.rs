use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::events::{MatchInfo, RawEvent};
use crate::prediction::PredictedScore;

/// The tables one run consumes.
#[derive(Debug, Clone, Default)]
pub struct SeasonInputs {
    pub events: Vec<RawEvent>,
    pub matches: Vec<MatchInfo>,
    pub predictions: Option<Vec<PredictedScore>>,
}

fn read_table<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read {what} {}", path.display()))?;
    serde_json::from_str::<Vec<T>>(&raw)
        .with_context(|| format!("parse {what} {}", path.display()))
}

pub fn load_required_events(path: &Path) -> Result<Vec<RawEvent>, EngineError> {
    if !path.exists() {
        return Err(EngineError::MissingEvents);
    }
    let events: Vec<RawEvent> = read_table(path, "events")?;
    if events.is_empty() {
        return Err(EngineError::MissingEvents);
    }
    info!(rows = events.len(), path = %path.display(), "events loaded");
    Ok(events)
}

pub fn load_required_matches(path: &Path) -> Result<Vec<MatchInfo>, EngineError> {
    if !path.exists() {
        return Err(EngineError::MissingMatchMetadata);
    }
    let matches: Vec<MatchInfo> = read_table(path, "match metadata")?;
    if matches.is_empty() {
        return Err(EngineError::MissingMatchMetadata);
    }
    info!(rows = matches.len(), path = %path.display(), "match metadata loaded");
    Ok(matches)
}

/// Predictions only feed the dark-horse detector, so any problem here
/// disables that detector instead of failing the run.
pub fn load_optional_predictions(path: &Path) -> Option<Vec<PredictedScore>> {
    if !path.exists() {
        warn!(path = %path.display(), "prediction table not found");
        return None;
    }
    match read_table::<PredictedScore>(path, "predictions") {
        Ok(rows) => {
            info!(rows = rows.len(), "predictions loaded");
            Some(rows)
        }
        Err(err) => {
            warn!("{err:#}");
            None
        }
    }
}

pub fn load_season_inputs(
    events_path: &Path,
    matches_path: &Path,
    predictions_path: Option<&Path>,
) -> Result<SeasonInputs, EngineError> {
    Ok(SeasonInputs {
        events: load_required_events(events_path)?,
        matches: load_required_matches(matches_path)?,
        predictions: predictions_path.and_then(load_optional_predictions),
    })
}
