use tracing::info;

use crate::attribution::{Attribution, attribute};
use crate::config::{EngineConfig, global_config};
use crate::error::{EngineError, Result};
use crate::events::RawEvent;
use crate::form::apply_form;
use crate::inputs::SeasonInputs;
use crate::match_stats::{PlayerMatchRecord, aggregate_matches};
use crate::prediction::{PredictedScore, Predictor, predict_all};
use crate::scoring::score_matches;
use crate::season::{MatchCalendar, PlayerSeasonRecord, aggregate_season, build_histories};
use crate::signals::{DetectionReport, detect_all};

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub attribution: Attribution,
    pub match_scores: Vec<PlayerMatchRecord>,
    pub season: Vec<PlayerSeasonRecord>,
    pub detections: DetectionReport,
}

/// Classifier, attributor, per-match aggregator and score calculator.
/// Returns only once every player-match row is scored.
pub fn score_events(
    events: &[RawEvent],
    cfg: &EngineConfig,
) -> (Attribution, Vec<PlayerMatchRecord>) {
    let attribution = attribute(events, &cfg.attribution);
    info!(
        goals = attribution.goals,
        assists = attribution.assists.len(),
        shots = attribution.shots,
        key_passes = attribution.key_passes.len(),
        "events attributed"
    );
    let rows = aggregate_matches(events, &attribution, cfg.scoring.progressive_carry_threshold);
    let scored = score_matches(rows, &cfg.scoring);
    (attribution, scored)
}

pub fn run(inputs: &SeasonInputs, cfg: &EngineConfig) -> Result<PipelineOutput> {
    run_inner(inputs, inputs.predictions.as_deref(), None, cfg)
}

/// Like [`run`], but when the inputs carry no prediction table the given
/// predictor supplies one for the dark-horse detector.
pub fn run_with_predictor(
    inputs: &SeasonInputs,
    predictor: &dyn Predictor,
    cfg: &EngineConfig,
) -> Result<PipelineOutput> {
    run_inner(inputs, inputs.predictions.as_deref(), Some(predictor), cfg)
}

/// [`run`] with the process-wide config from the environment.
pub fn run_with_env_config(inputs: &SeasonInputs) -> Result<PipelineOutput> {
    run(inputs, global_config())
}

fn run_inner(
    inputs: &SeasonInputs,
    predictions: Option<&[PredictedScore]>,
    fallback_predictor: Option<&dyn Predictor>,
    cfg: &EngineConfig,
) -> Result<PipelineOutput> {
    if inputs.events.is_empty() {
        return Err(EngineError::MissingEvents);
    }
    if inputs.matches.is_empty() {
        return Err(EngineError::MissingMatchMetadata);
    }
    let calendar = MatchCalendar::from_matches(&inputs.matches)?;

    let (attribution, match_scores) = score_events(&inputs.events, cfg);

    let histories = build_histories(&match_scores, &calendar)?;
    let season = aggregate_season(&histories);
    let season = apply_form(season, &histories, &cfg.form);

    let generated: Option<Vec<PredictedScore>> = match (predictions, fallback_predictor) {
        (None, Some(predictor)) => Some(predict_all(predictor, &season)),
        _ => None,
    };
    let predictions = predictions.or(generated.as_deref());

    let detections = detect_all(&season, &histories, predictions, &cfg.signals);

    info!(
        player_matches = match_scores.len(),
        players = season.len(),
        "pipeline complete"
    );
    Ok(PipelineOutput {
        attribution,
        match_scores,
        season,
        detections,
    })
}
