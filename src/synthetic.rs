use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::events::{EventCategory, EventOutcome, MatchInfo, PitchPoint, RawEvent};
use crate::inputs::SeasonInputs;

const POSITIONS: [&str; 11] = ["GK", "CB", "CB", "LB", "RB", "CDM", "CM", "CAM", "LW", "RW", "ST"];

#[derive(Debug, Clone, Copy)]
pub struct SyntheticSeason {
    pub teams: u32,
    pub rounds: u32,
    pub events_per_team: u32,
}

impl Default for SyntheticSeason {
    fn default() -> Self {
        Self {
            teams: 12,
            rounds: 22,
            events_per_team: 600,
        }
    }
}

/// Deterministic season for a given seed: round-robin fixtures one week apart,
/// eleven players per team, events spread over 95 minutes.
pub fn generate_season(seed: u64, shape: SyntheticSeason) -> SeasonInputs {
    let mut rng = StdRng::seed_from_u64(seed);
    let Some(start) = NaiveDate::from_ymd_opt(2024, 3, 1) else {
        return SeasonInputs::default();
    };
    let teams = shape.teams.max(2);

    let mut events = Vec::new();
    let mut matches = Vec::new();
    let mut match_id = 1u64;

    for round in 0..shape.rounds {
        let date = start + Duration::days(7 * round as i64);
        for pair in 0..teams / 2 {
            let home = (pair + round) % teams + 1;
            let away = (teams - 1 - pair + round) % teams + 1;
            if home == away {
                continue;
            }
            matches.push(MatchInfo {
                match_id,
                date: Some(date.format("%Y-%m-%d").to_string()),
                home_team: format!("Team {home}"),
                away_team: format!("Team {away}"),
            });
            for team in [home, away] {
                push_team_events(&mut rng, &mut events, match_id, team, shape.events_per_team);
            }
            match_id += 1;
        }
    }

    events.sort_by(|a, b| {
        a.match_id
            .cmp(&b.match_id)
            .then(a.timestamp_seconds.total_cmp(&b.timestamp_seconds))
    });

    SeasonInputs {
        events,
        matches,
        predictions: None,
    }
}

fn push_team_events(
    rng: &mut StdRng,
    out: &mut Vec<RawEvent>,
    match_id: u64,
    team: u32,
    count: u32,
) {
    let episode_len = 8u32;
    for i in 0..count {
        let slot = rng.gen_range(0..POSITIONS.len());
        let player_id = team * 100 + slot as u32;
        let t = rng.gen_range(0.0..5700.0);
        let (category, outcome) = random_action(rng);
        let (start, end) = if category == EventCategory::Carry {
            let x = rng.gen_range(0.0..90.0);
            (
                Some(PitchPoint { x, y: rng.gen_range(0.0..68.0) }),
                Some(PitchPoint { x: x + rng.gen_range(-5.0..25.0), y: rng.gen_range(0.0..68.0) }),
            )
        } else {
            (None, None)
        };
        out.push(RawEvent {
            match_id,
            player_id,
            team_id: team,
            timestamp_seconds: t,
            category,
            outcome,
            spatial_start: start,
            spatial_end: end,
            episode_id: Some((i / episode_len) as u64),
            player_name: Some(format!("Player {player_id}")),
            team_name: Some(format!("Team {team}")),
            position: Some(POSITIONS[slot].to_string()),
        });
    }
}

fn random_action(rng: &mut StdRng) -> (EventCategory, Option<EventOutcome>) {
    let roll = rng.gen_range(0..100);
    let success = |rng: &mut StdRng, p: f64| {
        if rng.gen_bool(p) {
            EventOutcome::Successful
        } else {
            EventOutcome::Unsuccessful
        }
    };
    match roll {
        0..=49 => (EventCategory::Pass, Some(success(rng, 0.82))),
        50..=61 => (EventCategory::Carry, None),
        62..=64 => {
            let outcome = if rng.gen_bool(0.12) {
                EventOutcome::Goal
            } else {
                success(rng, 0.35)
            };
            (EventCategory::Shot, Some(outcome))
        }
        65..=71 => (EventCategory::Duel, Some(success(rng, 0.5))),
        72..=76 => (EventCategory::Tackle, Some(success(rng, 0.6))),
        77..=80 => (EventCategory::Interception, None),
        81..=84 => (EventCategory::Recovery, None),
        85..=87 => (EventCategory::Clearance, None),
        88..=89 => (EventCategory::Block, None),
        _ => (EventCategory::Other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_season() {
        let shape = SyntheticSeason {
            teams: 4,
            rounds: 3,
            events_per_team: 50,
        };
        let a = generate_season(7, shape);
        let b = generate_season(7, shape);
        assert_eq!(a.matches.len(), 6);
        assert_eq!(a.events.len(), 600);
        assert_eq!(a.events.len(), b.events.len());
        assert!(
            a.events
                .iter()
                .zip(b.events.iter())
                .all(|(x, y)| x.player_id == y.player_id && x.timestamp_seconds == y.timestamp_seconds)
        );
    }
}
