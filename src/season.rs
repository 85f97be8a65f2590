use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};
use crate::events::{MatchId, MatchInfo, PlayerId};
use crate::form::FormSnapshot;
use crate::match_stats::PlayerMatchRecord;

/// Chronological key per match, built from the match metadata table.
#[derive(Debug, Clone, Default)]
pub struct MatchCalendar {
    dates: HashMap<MatchId, Option<NaiveDateTime>>,
}

impl MatchCalendar {
    pub fn from_matches(matches: &[MatchInfo]) -> Result<Self> {
        let mut dates = HashMap::with_capacity(matches.len());
        for m in matches {
            let date = match m.date.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(parse_match_date(raw).ok_or_else(|| {
                    EngineError::InvalidMatchDate {
                        match_id: m.match_id,
                        raw: raw.to_string(),
                    }
                })?),
            };
            dates.insert(m.match_id, date);
        }
        Ok(Self { dates })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Sort key for a match. Unknown or undated matches are an error: recency
    /// must never be guessed.
    pub fn key(&self, match_id: MatchId) -> Result<(NaiveDateTime, MatchId)> {
        match self.dates.get(&match_id) {
            Some(Some(date)) => Ok((*date, match_id)),
            _ => Err(EngineError::MissingMatchDate { match_id }),
        }
    }
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A player's match rows, oldest first.
#[derive(Debug, Clone)]
pub struct PlayerHistory<'a> {
    pub player_id: PlayerId,
    pub matches: Vec<&'a PlayerMatchRecord>,
}

impl PlayerHistory<'_> {
    /// Scores, most recent first.
    pub fn recent_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.matches.iter().rev().map(|r| r.fantasy_score)
    }
}

pub fn build_histories<'a>(
    records: &'a [PlayerMatchRecord],
    calendar: &MatchCalendar,
) -> Result<Vec<PlayerHistory<'a>>> {
    let mut by_player: BTreeMap<PlayerId, Vec<((NaiveDateTime, MatchId), &PlayerMatchRecord)>> =
        BTreeMap::new();
    for row in records {
        let key = calendar.key(row.match_id)?;
        by_player.entry(row.player_id).or_default().push((key, row));
    }
    Ok(by_player
        .into_iter()
        .map(|(player_id, mut rows)| {
            rows.sort_by(|a, b| a.0.cmp(&b.0));
            PlayerHistory {
                player_id,
                matches: rows.into_iter().map(|(_, r)| r).collect(),
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_name: String,
    pub position: String,
    pub matches_played: u32,
    pub total_fantasy_score: f64,
    pub avg_fantasy_score: f64,
    pub std_fantasy_score: f64,
    pub max_fantasy_score: f64,
    pub total_goals: u32,
    pub total_assists: u32,
    pub total_shots: u32,
    pub total_shots_on_target: u32,
    pub total_passes_successful: u32,
    pub total_passes: u32,
    pub total_key_passes: u32,
    pub total_tackles: u32,
    pub total_interceptions: u32,
    pub total_duels_won: u32,
    pub total_duels: u32,
    pub pass_success_rate: f64,
    pub duel_win_rate: f64,
    pub shot_conversion: f64,
    #[serde(flatten)]
    pub form: FormSnapshot,
}

/// Percentage with a zero denominator read as 1, so an empty category is 0%.
pub fn safe_rate(numerator: u32, denominator: u32) -> f64 {
    let den = if denominator == 0 { 1 } else { denominator };
    numerator as f64 / den as f64 * 100.0
}

/// Sample standard deviation; a single observation has zero spread.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

fn season_row(history: &PlayerHistory<'_>) -> Option<PlayerSeasonRecord> {
    let first = history.matches.first()?;
    let scores: Vec<f64> = history.matches.iter().map(|r| r.fantasy_score).collect();
    let n = scores.len();
    let total: f64 = scores.iter().sum();
    let avg = total / n as f64;
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let sum = |f: fn(&PlayerMatchRecord) -> u32| -> u32 {
        history.matches.iter().map(|r| f(r)).sum()
    };
    let goals = sum(|r| r.counts.goals);
    let shots = sum(|r| r.counts.shots);
    let passes_ok = sum(|r| r.counts.passes_successful);
    let passes = sum(|r| r.counts.passes_total);
    let duels_won = sum(|r| r.counts.duels_won);
    let duels = sum(|r| r.counts.duels_total);

    Some(PlayerSeasonRecord {
        player_id: history.player_id,
        player_name: first.player_name.clone(),
        team_name: first.team_name.clone(),
        position: first.position.clone(),
        matches_played: n as u32,
        total_fantasy_score: total,
        avg_fantasy_score: avg,
        std_fantasy_score: sample_std(&scores),
        max_fantasy_score: max,
        total_goals: goals,
        total_assists: sum(|r| r.counts.assists),
        total_shots: shots,
        total_shots_on_target: sum(|r| r.counts.shots_on_target),
        total_passes_successful: passes_ok,
        total_passes: passes,
        total_key_passes: sum(|r| r.counts.key_passes),
        total_tackles: sum(|r| r.counts.tackles_successful),
        total_interceptions: sum(|r| r.counts.interceptions),
        total_duels_won: duels_won,
        total_duels: duels,
        pass_success_rate: safe_rate(passes_ok, passes),
        duel_win_rate: safe_rate(duels_won, duels),
        shot_conversion: safe_rate(goals, shots),
        form: FormSnapshot::baseline(avg),
    })
}

/// One row per player, ordered by season average (best first, then player id).
/// Form fields hold the neutral baseline until the form engine runs.
pub fn aggregate_season(histories: &[PlayerHistory<'_>]) -> Vec<PlayerSeasonRecord> {
    let mut rows: Vec<PlayerSeasonRecord> = histories.par_iter().filter_map(season_row).collect();
    rows.sort_by(by_avg_desc);
    info!(players = rows.len(), "season table built");
    rows
}

pub(crate) fn by_avg_desc(a: &PlayerSeasonRecord, b: &PlayerSeasonRecord) -> Ordering {
    b.avg_fantasy_score
        .total_cmp(&a.avg_fantasy_score)
        .then(a.player_id.cmp(&b.player_id))
}
