use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::events::PlayerId;
use crate::form::recent_average;
use crate::prediction::PredictedScore;
use crate::season::{PlayerHistory, PlayerSeasonRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub surge_window: usize,
    pub dark_horse_min_surge: f64,
    pub dark_horse_max_matches: u32,
    pub dark_horse_max_percentile: f64,
    pub goals_per_match_highlight: f64,
    pub rising_min_surge: f64,
    pub rising_min_matches: u32,
    pub underrated_max_matches: u32,
    pub underrated_quantile: f64,
    pub position_top_n: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            surge_window: 3,
            dark_horse_min_surge: 1.3,
            dark_horse_max_matches: 15,
            dark_horse_max_percentile: 30.0,
            goals_per_match_highlight: 0.3,
            rising_min_surge: 1.2,
            rising_min_matches: 3,
            underrated_max_matches: 10,
            underrated_quantile: 0.7,
            position_top_n: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    DarkHorse,
    RisingStar,
    Underrated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub cohort: Cohort,
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_name: String,
    pub position: String,
    pub matches_played: u32,
    pub avg_fantasy_score: f64,
    pub recent_avg: f64,
    pub form_surge: f64,
    pub total_goals: u32,
    pub predicted_score: Option<f64>,
    pub predicted_rank: Option<u32>,
    pub predicted_percentile: Option<f64>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionReport {
    pub dark_horses: Vec<SignalEntry>,
    pub rising_stars: Vec<SignalEntry>,
    pub underrated: Vec<SignalEntry>,
    pub underrated_threshold: Option<f64>,
}

impl DetectionReport {
    pub fn memberships(&self, player_id: PlayerId) -> Vec<Cohort> {
        [&self.dark_horses, &self.rising_stars, &self.underrated]
            .into_iter()
            .flat_map(|cohort| cohort.iter())
            .filter(|e| e.player_id == player_id)
            .map(|e| e.cohort)
            .collect()
    }

    /// Dark horses per position, keeping the cohort's surge order.
    pub fn position_dark_horses(&self, top_n: usize) -> BTreeMap<String, Vec<&SignalEntry>> {
        let mut out: BTreeMap<String, Vec<&SignalEntry>> = BTreeMap::new();
        for entry in &self.dark_horses {
            let bucket = out.entry(entry.position.clone()).or_default();
            if bucket.len() < top_n {
                bucket.push(entry);
            }
        }
        out
    }
}

/// recent / season. An undefined ratio (zero season average) reads as 1.0.
pub fn surge_ratio(recent_avg: f64, season_avg: f64) -> f64 {
    let ratio = recent_avg / season_avg;
    if ratio.is_finite() { ratio } else { 1.0 }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileRank {
    pub rank: u32,
    pub percentile: f64,
}

/// Descending rank with ties sharing the minimum rank; percentile is
/// rank / population * 100, lower is better.
pub fn percentile_ranks(scores: &[(PlayerId, f64)]) -> HashMap<PlayerId, PercentileRank> {
    let mut sorted: Vec<(PlayerId, f64)> = scores.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    let population = sorted.len() as f64;

    let mut out = HashMap::with_capacity(sorted.len());
    let mut rank = 0u32;
    let mut prev: Option<f64> = None;
    for (idx, (player_id, score)) in sorted.into_iter().enumerate() {
        if prev != Some(score) {
            rank = idx as u32 + 1;
            prev = Some(score);
        }
        out.insert(
            player_id,
            PercentileRank {
                rank,
                percentile: rank as f64 / population * 100.0,
            },
        );
    }
    out
}

/// Linearly interpolated quantile, `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, Copy)]
struct Surge {
    recent_avg: f64,
    form_surge: f64,
}

fn surges(
    season: &[PlayerSeasonRecord],
    histories: &[PlayerHistory<'_>],
    window: usize,
) -> HashMap<PlayerId, Surge> {
    let by_player: HashMap<PlayerId, &PlayerHistory<'_>> =
        histories.iter().map(|h| (h.player_id, h)).collect();
    season
        .iter()
        .map(|row| {
            let recent_avg = by_player
                .get(&row.player_id)
                .and_then(|h| recent_average(h.recent_scores(), window))
                .map(|(avg, _)| avg)
                .unwrap_or(row.avg_fantasy_score);
            (
                row.player_id,
                Surge {
                    recent_avg,
                    form_surge: surge_ratio(recent_avg, row.avg_fantasy_score),
                },
            )
        })
        .collect()
}

fn entry(cohort: Cohort, row: &PlayerSeasonRecord, surge: Surge) -> SignalEntry {
    SignalEntry {
        cohort,
        player_id: row.player_id,
        player_name: row.player_name.clone(),
        team_name: row.team_name.clone(),
        position: row.position.clone(),
        matches_played: row.matches_played,
        avg_fantasy_score: row.avg_fantasy_score,
        recent_avg: surge.recent_avg,
        form_surge: surge.form_surge,
        total_goals: row.total_goals,
        predicted_score: None,
        predicted_rank: None,
        predicted_percentile: None,
        reason: String::new(),
    }
}

fn surge_pct(form_surge: f64) -> i64 {
    ((form_surge - 1.0) * 100.0) as i64
}

fn by_surge_desc(a: &SignalEntry, b: &SignalEntry) -> std::cmp::Ordering {
    b.form_surge
        .total_cmp(&a.form_surge)
        .then(a.player_id.cmp(&b.player_id))
}

pub fn dark_horse_reason(e: &SignalEntry, cfg: &SignalConfig) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if e.form_surge >= 1.5 {
        reasons.push(format!("form up {}% (surging)", surge_pct(e.form_surge)));
    } else if e.form_surge >= 1.3 {
        reasons.push(format!("form up {}%", surge_pct(e.form_surge)));
    }

    if e.matches_played < 10 {
        reasons.push("limited appearances".to_string());
    } else if e.matches_played < 15 {
        reasons.push("under the radar".to_string());
    }

    if let Some(pct) = e.predicted_percentile {
        if pct <= 15.0 {
            reasons.push("projected top 15%".to_string());
        } else if pct <= 30.0 {
            reasons.push("projected top 30%".to_string());
        }
    }

    if e.total_goals > 0 && e.matches_played > 0 {
        let per_match = e.total_goals as f64 / e.matches_played as f64;
        if per_match > cfg.goals_per_match_highlight {
            reasons.push(format!("{per_match:.2} goals per match"));
        }
    }

    if reasons.is_empty() {
        "hidden potential".to_string()
    } else {
        reasons.join(" / ")
    }
}

/// Surging form, few appearances and a strong projected rank. Without a
/// prediction table the cohort is empty.
pub fn detect_dark_horses(
    season: &[PlayerSeasonRecord],
    histories: &[PlayerHistory<'_>],
    predictions: Option<&[PredictedScore]>,
    cfg: &SignalConfig,
) -> Vec<SignalEntry> {
    let Some(predictions) = predictions else {
        warn!("no prediction table; dark horse detection skipped");
        return Vec::new();
    };

    let mut predicted: HashMap<PlayerId, f64> = HashMap::with_capacity(predictions.len());
    for p in predictions {
        if p.predicted_score.is_finite() {
            predicted.entry(p.player_id).or_insert(p.predicted_score);
        }
    }
    let population: Vec<(PlayerId, f64)> = season
        .iter()
        .map(|row| {
            let score = predicted
                .get(&row.player_id)
                .copied()
                .unwrap_or(row.avg_fantasy_score);
            (row.player_id, score)
        })
        .collect();
    let ranks = percentile_ranks(&population);
    let surge = surges(season, histories, cfg.surge_window);

    let mut out: Vec<SignalEntry> = season
        .iter()
        .zip(population.iter())
        .filter_map(|(row, (_, score))| {
            let s = *surge.get(&row.player_id)?;
            let rank = *ranks.get(&row.player_id)?;
            let qualifies = s.form_surge > cfg.dark_horse_min_surge
                && row.matches_played < cfg.dark_horse_max_matches
                && rank.percentile <= cfg.dark_horse_max_percentile;
            if !qualifies {
                return None;
            }
            let mut e = entry(Cohort::DarkHorse, row, s);
            e.predicted_score = Some(*score);
            e.predicted_rank = Some(rank.rank);
            e.predicted_percentile = Some(rank.percentile);
            e.reason = dark_horse_reason(&e, cfg);
            Some(e)
        })
        .collect();
    out.sort_by(by_surge_desc);
    out
}

pub fn detect_rising_stars(
    season: &[PlayerSeasonRecord],
    histories: &[PlayerHistory<'_>],
    cfg: &SignalConfig,
) -> Vec<SignalEntry> {
    let surge = surges(season, histories, cfg.surge_window);
    let mut out: Vec<SignalEntry> = season
        .iter()
        .filter_map(|row| {
            let s = *surge.get(&row.player_id)?;
            if s.form_surge > cfg.rising_min_surge && row.matches_played >= cfg.rising_min_matches {
                let mut e = entry(Cohort::RisingStar, row, s);
                e.reason = format!(
                    "form up {}% over the last {} matches",
                    surge_pct(s.form_surge),
                    cfg.surge_window.max(1)
                );
                Some(e)
            } else {
                None
            }
        })
        .collect();
    out.sort_by(by_surge_desc);
    out
}

/// Few appearances but a season average above the population quantile.
/// Returns the cohort and the threshold used.
pub fn detect_underrated(
    season: &[PlayerSeasonRecord],
    histories: &[PlayerHistory<'_>],
    cfg: &SignalConfig,
) -> (Vec<SignalEntry>, Option<f64>) {
    let avgs: Vec<f64> = season.iter().map(|r| r.avg_fantasy_score).collect();
    let Some(threshold) = quantile(&avgs, cfg.underrated_quantile) else {
        return (Vec::new(), None);
    };
    let surge = surges(season, histories, cfg.surge_window);
    let q_label = (cfg.underrated_quantile * 100.0).round() as u32;

    let mut out: Vec<SignalEntry> = season
        .iter()
        .filter(|row| {
            row.matches_played < cfg.underrated_max_matches && row.avg_fantasy_score > threshold
        })
        .filter_map(|row| {
            let mut e = entry(Cohort::Underrated, row, *surge.get(&row.player_id)?);
            e.reason = format!(
                "{:.1} pts per match in {} matches (p{} = {:.1})",
                row.avg_fantasy_score, row.matches_played, q_label, threshold
            );
            Some(e)
        })
        .collect();
    out.sort_by(|a, b| {
        b.avg_fantasy_score
            .total_cmp(&a.avg_fantasy_score)
            .then(a.player_id.cmp(&b.player_id))
    });
    (out, Some(threshold))
}

pub fn detect_all(
    season: &[PlayerSeasonRecord],
    histories: &[PlayerHistory<'_>],
    predictions: Option<&[PredictedScore]>,
    cfg: &SignalConfig,
) -> DetectionReport {
    let dark_horses = detect_dark_horses(season, histories, predictions, cfg);
    let rising_stars = detect_rising_stars(season, histories, cfg);
    let (underrated, underrated_threshold) = detect_underrated(season, histories, cfg);
    info!(
        dark_horses = dark_horses.len(),
        rising_stars = rising_stars.len(),
        underrated = underrated.len(),
        "signal detection complete"
    );
    DetectionReport {
        dark_horses,
        rising_stars,
        underrated,
        underrated_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_share_minimum_rank() {
        let ranks = percentile_ranks(&[(1, 9.0), (2, 7.0), (3, 9.0), (4, 3.0)]);
        assert_eq!(ranks[&1].rank, 1);
        assert_eq!(ranks[&3].rank, 1);
        assert_eq!(ranks[&2].rank, 3);
        assert_eq!(ranks[&4].rank, 4);
        assert!((ranks[&1].percentile - 25.0).abs() < 1e-12);
        assert!((ranks[&4].percentile - 100.0).abs() < 1e-12);
    }

    #[test]
    fn quantile_interpolates() {
        assert_eq!(quantile(&[], 0.7), None);
        assert_eq!(quantile(&[4.0], 0.7), Some(4.0));
        let q = quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.7).unwrap();
        assert!((q - 3.8).abs() < 1e-12);
    }

    #[test]
    fn surge_of_zero_season_is_neutral() {
        assert_eq!(surge_ratio(0.0, 0.0), 1.0);
        assert_eq!(surge_ratio(3.0, 0.0), 1.0);
        assert!((surge_ratio(8.0, 5.0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn reason_falls_back_when_nothing_stands_out() {
        let e = SignalEntry {
            cohort: Cohort::DarkHorse,
            player_id: 1,
            player_name: "A".into(),
            team_name: "T".into(),
            position: "CM".into(),
            matches_played: 20,
            avg_fantasy_score: 5.0,
            recent_avg: 5.5,
            form_surge: 1.1,
            total_goals: 0,
            predicted_score: None,
            predicted_rank: None,
            predicted_percentile: Some(80.0),
            reason: String::new(),
        };
        assert_eq!(dark_horse_reason(&e, &SignalConfig::default()), "hidden potential");
    }
}
