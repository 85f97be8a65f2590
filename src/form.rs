use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::PlayerId;
use crate::season::{PlayerHistory, PlayerSeasonRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub window: usize,
    pub up_threshold: f64,
    pub down_threshold: f64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            window: 5,
            up_threshold: 1.1,
            down_threshold: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Stable,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub form_window: usize,
    pub recent_avg: f64,
    pub recent_matches: u32,
    pub last_match_score: f64,
    pub form_index: f64,
    pub trend: Trend,
}

impl FormSnapshot {
    /// A player with no recent window is read as playing at their season level.
    pub fn baseline(season_avg: f64) -> Self {
        Self {
            form_window: 0,
            recent_avg: season_avg,
            recent_matches: 0,
            last_match_score: 0.0,
            form_index: 1.0,
            trend: Trend::Stable,
        }
    }
}

/// Mean of the first `n` scores (most recent first). Fewer than `n` scores
/// average what is there; none gives `None`.
pub fn recent_average(scores_recent_first: impl Iterator<Item = f64>, n: usize) -> Option<(f64, u32)> {
    let mut sum = 0.0;
    let mut count = 0u32;
    for score in scores_recent_first.take(n.max(1)) {
        sum += score;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some((sum / count as f64, count))
    }
}

/// recent / season with a zero season average read as 1. Never infinite or NaN.
pub fn form_index(recent_avg: f64, season_avg: f64) -> f64 {
    let den = if season_avg == 0.0 { 1.0 } else { season_avg };
    let ratio = recent_avg / den;
    if ratio.is_finite() { ratio } else { 1.0 }
}

pub fn classify_trend(form_index: f64, cfg: &FormConfig) -> Trend {
    if form_index > cfg.up_threshold {
        Trend::Up
    } else if form_index < cfg.down_threshold {
        Trend::Down
    } else {
        Trend::Stable
    }
}

pub fn snapshot(history: &PlayerHistory<'_>, season_avg: f64, cfg: &FormConfig) -> FormSnapshot {
    let Some((recent_avg, recent_matches)) = recent_average(history.recent_scores(), cfg.window)
    else {
        return FormSnapshot::baseline(season_avg);
    };
    let idx = form_index(recent_avg, season_avg);
    FormSnapshot {
        form_window: cfg.window.max(1),
        recent_avg,
        recent_matches,
        last_match_score: history.recent_scores().next().unwrap_or(0.0),
        form_index: idx,
        trend: classify_trend(idx, cfg),
    }
}

/// Attach the trailing-window form to every season row.
pub fn apply_form(
    season: Vec<PlayerSeasonRecord>,
    histories: &[PlayerHistory<'_>],
    cfg: &FormConfig,
) -> Vec<PlayerSeasonRecord> {
    let by_player: HashMap<PlayerId, &PlayerHistory<'_>> =
        histories.iter().map(|h| (h.player_id, h)).collect();

    let out: Vec<PlayerSeasonRecord> = season
        .into_iter()
        .map(|mut row| {
            row.form = match by_player.get(&row.player_id) {
                Some(h) => snapshot(h, row.avg_fantasy_score, cfg),
                None => FormSnapshot::baseline(row.avg_fantasy_score),
            };
            row
        })
        .collect();

    debug!(
        up = out.iter().filter(|r| r.form.trend == Trend::Up).count(),
        down = out.iter().filter(|r| r.form.trend == Trend::Down).count(),
        window = cfg.window,
        "form applied"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_averages_what_exists() {
        let (avg, n) = recent_average([6.0, 2.0].into_iter(), 5).unwrap();
        assert_eq!(n, 2);
        assert!((avg - 4.0).abs() < 1e-12);
        assert!(recent_average(std::iter::empty(), 3).is_none());
    }

    #[test]
    fn form_index_never_blows_up() {
        assert_eq!(form_index(3.0, 0.0), 3.0);
        assert_eq!(form_index(f64::NAN, 2.0), 1.0);
        assert_eq!(form_index(f64::INFINITY, 2.0), 1.0);
        assert!((form_index(6.0, 4.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn trend_bands_are_strict() {
        let cfg = FormConfig::default();
        assert_eq!(classify_trend(1.1, &cfg), Trend::Stable);
        assert_eq!(classify_trend(1.1000001, &cfg), Trend::Up);
        assert_eq!(classify_trend(0.9, &cfg), Trend::Stable);
        assert_eq!(classify_trend(0.8999999, &cfg), Trend::Down);
    }
}
