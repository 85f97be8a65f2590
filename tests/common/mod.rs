#![allow(dead_code)]

use chrono::{Duration, NaiveDate};

use kleague_fantasy::events::{EventCategory, EventOutcome, MatchInfo, RawEvent};
use kleague_fantasy::match_stats::{EventCounts, PlayerMatchRecord};

pub fn event(
    match_id: u64,
    player_id: u32,
    team_id: u32,
    t: f64,
    category: &str,
    outcome: Option<&str>,
) -> RawEvent {
    RawEvent {
        match_id,
        player_id,
        team_id,
        timestamp_seconds: t,
        category: EventCategory::from_label(category),
        outcome: outcome.map(EventOutcome::from_label),
        spatial_start: None,
        spatial_end: None,
        episode_id: None,
        player_name: Some(format!("Player {player_id}")),
        team_name: Some(format!("Team {team_id}")),
        position: Some("CM".to_string()),
    }
}

/// Match `i` (1-based) is played `i - 1` days after 2024-03-01.
pub fn dated_matches(n: u64) -> Vec<MatchInfo> {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
    (1..=n)
        .map(|id| MatchInfo {
            match_id: id,
            date: Some((start + Duration::days(id as i64 - 1)).format("%Y-%m-%d").to_string()),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
        })
        .collect()
}

pub fn scored_row(match_id: u64, player_id: u32, score: f64) -> PlayerMatchRecord {
    PlayerMatchRecord {
        match_id,
        player_id,
        player_name: format!("Player {player_id}"),
        team_name: "Team 1".to_string(),
        position: "CM".to_string(),
        counts: EventCounts::default(),
        fantasy_score: score,
    }
}

/// Rows for one player over matches 1..=scores.len(), oldest first.
pub fn player_rows(player_id: u32, scores: &[f64]) -> Vec<PlayerMatchRecord> {
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| scored_row(i as u64 + 1, player_id, *s))
        .collect()
}
