use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::attribution::Attribution;
use crate::events::{MatchId, PlayerId, RawEvent};

/// Discrete per-match counts for one player. Input of the score calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub shots: u32,
    pub shots_on_target: u32,
    pub goals: u32,
    pub passes_total: u32,
    pub passes_successful: u32,
    pub passes_failed: u32,
    pub carries: u32,
    pub carries_progressive: u32,
    pub tackles_total: u32,
    pub tackles_successful: u32,
    pub interceptions: u32,
    pub blocks: u32,
    pub clearances: u32,
    pub recoveries: u32,
    pub duels_total: u32,
    pub duels_won: u32,
    pub assists: u32,
    pub key_passes: u32,
}

impl EventCounts {
    pub fn tackles_failed(&self) -> u32 {
        self.tackles_total.saturating_sub(self.tackles_successful)
    }

    pub fn duels_lost(&self) -> u32 {
        self.duels_total.saturating_sub(self.duels_won)
    }

    fn push(&mut self, ev: &RawEvent, progressive_threshold: f64) {
        self.shots += ev.is_shot() as u32;
        self.shots_on_target += ev.is_shot_on_target() as u32;
        self.goals += ev.is_goal() as u32;
        self.passes_total += ev.is_pass() as u32;
        self.passes_successful += ev.is_successful_pass() as u32;
        self.passes_failed += ev.is_failed_pass() as u32;
        self.carries += ev.is_carry() as u32;
        self.carries_progressive += ev.is_progressive_carry(progressive_threshold) as u32;
        self.tackles_total += ev.is_tackle() as u32;
        self.tackles_successful += ev.is_successful_tackle() as u32;
        self.interceptions += ev.is_interception() as u32;
        self.blocks += ev.is_block() as u32;
        self.clearances += ev.is_clearance() as u32;
        self.recoveries += ev.is_recovery() as u32;
        self.duels_total += ev.is_duel() as u32;
        self.duels_won += ev.is_duel_won() as u32;
    }
}

/// One row per (match, player) that produced at least one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchRecord {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub team_name: String,
    pub position: String,
    #[serde(flatten)]
    pub counts: EventCounts,
    pub fantasy_score: f64,
}

/// Group events by (match, player) and count every category. Identity fields
/// come from the group's first event in feed order. Assist and key-pass counts
/// are joined from `attribution`; rows without credits get zero. Rows are
/// ordered by (match, player) and carry a zero score until scored.
pub fn aggregate_matches(
    events: &[RawEvent],
    attribution: &Attribution,
    progressive_threshold: f64,
) -> Vec<PlayerMatchRecord> {
    let mut groups: BTreeMap<(MatchId, PlayerId), Vec<&RawEvent>> = BTreeMap::new();
    for ev in events {
        groups.entry((ev.match_id, ev.player_id)).or_default().push(ev);
    }

    let credits = attribution.counts_by_player();
    let groups: Vec<((MatchId, PlayerId), Vec<&RawEvent>)> = groups.into_iter().collect();

    let rows: Vec<PlayerMatchRecord> = groups
        .par_iter()
        .filter_map(|((match_id, player_id), group)| {
            let first = group.first()?;
            let mut counts = EventCounts::default();
            for ev in group {
                counts.push(ev, progressive_threshold);
            }
            let (assists, key_passes) = credits
                .get(&(*match_id, *player_id))
                .copied()
                .unwrap_or((0, 0));
            counts.assists = assists;
            counts.key_passes = key_passes;
            Some(PlayerMatchRecord {
                match_id: *match_id,
                player_id: *player_id,
                player_name: first.player_name_or_unknown(),
                team_name: first.team_name_or_unknown(),
                position: first.position_or_unknown(),
                counts,
                fantasy_score: 0.0,
            })
        })
        .collect();

    info!(rows = rows.len(), "player-match rows aggregated");
    rows
}
