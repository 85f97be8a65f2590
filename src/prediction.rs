//! Feature engineering for the next-round score regressor, and the seam the
//! regressor plugs into. The trained model itself lives outside this crate;
//! `BaselinePredictor` is the weighted-average fallback used without one.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::events::{MatchId, PlayerId};
use crate::form::recent_average;
use crate::season::{PlayerHistory, PlayerSeasonRecord};

pub const PREDICTION_FEATURE_NAMES: [&str; 7] = [
    "recent_avg",
    "season_avg",
    "form_index",
    "position_percentile",
    "matches_played",
    "total_goals",
    "total_assists",
];

pub const MIN_TRAINING_HISTORY: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedScore {
    pub player_id: PlayerId,
    pub predicted_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures {
    pub recent_avg: f64,
    pub season_avg: f64,
    pub form_index: f64,
    pub position_percentile: f64,
    pub matches_played: u32,
    pub total_goals: u32,
    pub total_assists: u32,
}

impl PredictionFeatures {
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.recent_avg,
            self.season_avg,
            self.form_index,
            self.position_percentile,
            self.matches_played as f64,
            self.total_goals as f64,
            self.total_assists as f64,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub player_id: PlayerId,
    pub match_id: MatchId,
    pub features: PredictionFeatures,
    pub target: f64,
}

pub trait Predictor: Send + Sync {
    fn predict(&self, features: &PredictionFeatures) -> f64;

    /// Share of the prediction attributed to each feature, in percent.
    fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselinePredictor {
    pub recent_weight: f64,
    pub season_weight: f64,
    pub form_weight: f64,
}

impl Default for BaselinePredictor {
    fn default() -> Self {
        Self {
            recent_weight: 0.5,
            season_weight: 0.3,
            form_weight: 0.2,
        }
    }
}

impl Predictor for BaselinePredictor {
    fn predict(&self, f: &PredictionFeatures) -> f64 {
        f.recent_avg * self.recent_weight
            + f.season_avg * self.season_weight
            + f.season_avg * f.form_index * self.form_weight
    }

    fn feature_importance(&self) -> Vec<(&'static str, f64)> {
        let total = self.recent_weight + self.season_weight + self.form_weight;
        if total <= 0.0 {
            return Vec::new();
        }
        vec![
            ("recent_avg", self.recent_weight / total * 100.0),
            ("season_avg", self.season_weight / total * 100.0),
            ("form_index", self.form_weight / total * 100.0),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    pub recent_form: f64,
    pub season_avg: f64,
    pub position: f64,
    pub goals: f64,
    pub assists: f64,
}

/// Rough per-feature explanation of a prediction for display.
pub fn contributions(f: &PredictionFeatures, predicted: f64) -> Contributions {
    let season_share = if predicted != 0.0 {
        f.season_avg / predicted * 30.0
    } else {
        0.0
    };
    Contributions {
        recent_form: (f.form_index - 1.0) * 30.0,
        season_avg: if season_share.is_finite() { season_share } else { 0.0 },
        position: (f.position_percentile - 50.0) / 50.0 * 15.0,
        goals: (f.total_goals as f64 * 2.0).min(15.0),
        assists: (f.total_assists as f64 * 1.5).min(10.0),
    }
}

/// Share of same-position players whose season average is at or below `avg`.
pub fn position_percentile(avg: f64, position: &str, peers: &[PlayerSeasonRecord]) -> f64 {
    let mut n = 0usize;
    let mut at_or_below = 0usize;
    for p in peers.iter().filter(|p| p.position == position) {
        n += 1;
        if p.avg_fantasy_score <= avg {
            at_or_below += 1;
        }
    }
    if n == 0 {
        50.0
    } else {
        at_or_below as f64 / n as f64 * 100.0
    }
}

/// Features for the upcoming round, one row per season player.
pub fn player_features(season: &[PlayerSeasonRecord]) -> Vec<(PlayerId, PredictionFeatures)> {
    season
        .iter()
        .map(|row| {
            (
                row.player_id,
                PredictionFeatures {
                    recent_avg: row.form.recent_avg,
                    season_avg: row.avg_fantasy_score,
                    form_index: row.form.form_index,
                    position_percentile: position_percentile(
                        row.avg_fantasy_score,
                        &row.position,
                        season,
                    ),
                    matches_played: row.matches_played,
                    total_goals: row.total_goals,
                    total_assists: row.total_assists,
                },
            )
        })
        .collect()
}

/// One sample per player-match, built only from that player's earlier matches.
pub fn training_samples(
    histories: &[PlayerHistory<'_>],
    season: &[PlayerSeasonRecord],
    window: usize,
) -> Vec<TrainingSample> {
    let positions: HashMap<PlayerId, &str> = season
        .iter()
        .map(|r| (r.player_id, r.position.as_str()))
        .collect();

    histories
        .par_iter()
        .flat_map_iter(|h| {
            let position = positions.get(&h.player_id).copied().unwrap_or_default();
            (MIN_TRAINING_HISTORY..h.matches.len()).map(move |i| {
                let past = &h.matches[..i];
                let season_avg = past.iter().map(|r| r.fantasy_score).sum::<f64>() / i as f64;
                let recent_avg = recent_average(past.iter().rev().map(|r| r.fantasy_score), window)
                    .map(|(avg, _)| avg)
                    .unwrap_or(season_avg);
                let form_index = if season_avg > 0.0 {
                    recent_avg / season_avg
                } else {
                    1.0
                };
                let current = h.matches[i];
                TrainingSample {
                    player_id: h.player_id,
                    match_id: current.match_id,
                    features: PredictionFeatures {
                        recent_avg,
                        season_avg,
                        form_index,
                        position_percentile: position_percentile(season_avg, position, season),
                        matches_played: i as u32,
                        total_goals: past.iter().map(|r| r.counts.goals).sum(),
                        total_assists: past.iter().map(|r| r.counts.assists).sum(),
                    },
                    target: current.fantasy_score,
                }
            })
        })
        .collect()
}

/// Predicted score per player, best first.
pub fn predict_all(predictor: &dyn Predictor, season: &[PlayerSeasonRecord]) -> Vec<PredictedScore> {
    let mut out: Vec<PredictedScore> = player_features(season)
        .into_iter()
        .map(|(player_id, f)| PredictedScore {
            player_id,
            predicted_score: predictor.predict(&f),
        })
        .collect();
    out.sort_by(|a, b| {
        b.predicted_score
            .total_cmp(&a.predicted_score)
            .then(a.player_id.cmp(&b.player_id))
    });
    out
}
