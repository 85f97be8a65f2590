use std::cmp::Ordering;
use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{MatchId, PlayerId, RawEvent, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    pub assist_window_secs: f64,
    pub key_pass_window_secs: f64,
    pub assist_same_episode: bool,
    pub key_pass_same_episode: bool,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            assist_window_secs: 10.0,
            key_pass_window_secs: 5.0,
            assist_same_episode: true,
            key_pass_same_episode: false,
        }
    }
}

impl AttributionConfig {
    pub fn assist_rule(&self) -> WindowRule {
        WindowRule {
            window_secs: self.assist_window_secs,
            same_episode: self.assist_same_episode,
        }
    }

    pub fn key_pass_rule(&self) -> WindowRule {
        WindowRule {
            window_secs: self.key_pass_window_secs,
            same_episode: self.key_pass_same_episode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowRule {
    pub window_secs: f64,
    pub same_episode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditKind {
    Assist,
    KeyPass,
}

/// A pass credited to the goal or shot at `trigger_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedCredit {
    pub kind: CreditKind,
    pub match_id: MatchId,
    pub trigger_player_id: PlayerId,
    pub crediting_player_id: PlayerId,
    pub team_id: TeamId,
    pub timestamp_seconds: f64,
    pub trigger_timestamp_seconds: f64,
    pub trigger_index: usize,
    pub pass_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Attribution {
    pub goals: usize,
    pub shots: usize,
    pub assists: Vec<AttributedCredit>,
    pub key_passes: Vec<AttributedCredit>,
}

impl Attribution {
    /// (match, crediting player) -> (assists, key passes)
    pub fn counts_by_player(&self) -> HashMap<(MatchId, PlayerId), (u32, u32)> {
        let mut out: HashMap<(MatchId, PlayerId), (u32, u32)> = HashMap::new();
        for c in &self.assists {
            out.entry((c.match_id, c.crediting_player_id)).or_default().0 += 1;
        }
        for c in &self.key_passes {
            out.entry((c.match_id, c.crediting_player_id)).or_default().1 += 1;
        }
        out
    }
}

/// Whether `pass` may be credited for `trigger` under `rule`.
pub fn qualifies(pass: &RawEvent, trigger: &RawEvent, rule: WindowRule) -> bool {
    if !pass.is_successful_pass() {
        return false;
    }
    if pass.match_id != trigger.match_id || pass.team_id != trigger.team_id {
        return false;
    }
    if pass.player_id == trigger.player_id {
        return false;
    }
    let t = trigger.timestamp_seconds;
    if !(pass.timestamp_seconds < t && pass.timestamp_seconds >= t - rule.window_secs) {
        return false;
    }
    episode_compatible(pass, trigger, rule)
}

fn episode_compatible(pass: &RawEvent, trigger: &RawEvent, rule: WindowRule) -> bool {
    if !rule.same_episode {
        return true;
    }
    match (pass.episode_id, trigger.episode_id) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Single-trigger lookup over a match stream: the latest qualifying pass,
/// later stream position winning on equal timestamps.
pub fn crediting_pass<'a>(
    trigger: &RawEvent,
    stream: &'a [RawEvent],
    rule: WindowRule,
) -> Option<&'a RawEvent> {
    let mut best: Option<&RawEvent> = None;
    for ev in stream {
        if !qualifies(ev, trigger, rule) {
            continue;
        }
        match best {
            Some(b) if ev.timestamp_seconds < b.timestamp_seconds => {}
            _ => best = Some(ev),
        }
    }
    best
}

/// Attribute assists (goals) and key passes (all shots) over the whole feed.
///
/// Events are partitioned by (match, team); each partition is swept once with a
/// sliding window over its time-sorted successful passes.
pub fn attribute(events: &[RawEvent], cfg: &AttributionConfig) -> Attribution {
    let mut partitions: HashMap<(MatchId, TeamId), Partition> = HashMap::new();
    let mut goals = 0usize;
    let mut shots = 0usize;

    for (idx, ev) in events.iter().enumerate() {
        if !ev.timestamp_seconds.is_finite() {
            continue;
        }
        let key = (ev.match_id, ev.team_id);
        if ev.is_successful_pass() {
            partitions.entry(key).or_default().passes.push(idx);
        } else if ev.is_shot() {
            shots += 1;
            if ev.is_goal() {
                goals += 1;
            }
            partitions.entry(key).or_default().shots.push(idx);
        }
    }

    let assist_rule = cfg.assist_rule();
    let key_pass_rule = cfg.key_pass_rule();

    let per_partition: Vec<(Vec<AttributedCredit>, Vec<AttributedCredit>)> = partitions
        .into_par_iter()
        .map(|(_, mut part)| {
            part.sort(events);
            let assists = part.sweep(events, assist_rule, CreditKind::Assist, |ev| ev.is_goal());
            let key_passes = part.sweep(events, key_pass_rule, CreditKind::KeyPass, |_| true);
            (assists, key_passes)
        })
        .collect();

    let mut out = Attribution {
        goals,
        shots,
        ..Default::default()
    };
    for (assists, key_passes) in per_partition {
        out.assists.extend(assists);
        out.key_passes.extend(key_passes);
    }
    out.assists.sort_by_key(|c| c.trigger_index);
    out.key_passes.sort_by_key(|c| c.trigger_index);

    debug!(
        goals = out.goals,
        shots = out.shots,
        assists = out.assists.len(),
        key_passes = out.key_passes.len(),
        "attribution complete"
    );
    out
}

#[derive(Debug, Default)]
struct Partition {
    passes: Vec<usize>,
    shots: Vec<usize>,
}

impl Partition {
    fn sort(&mut self, events: &[RawEvent]) {
        let by_time = |a: &usize, b: &usize| -> Ordering {
            events[*a]
                .timestamp_seconds
                .total_cmp(&events[*b].timestamp_seconds)
                .then(a.cmp(b))
        };
        self.passes.sort_by(by_time);
        self.shots.sort_by(by_time);
    }

    fn sweep(
        &self,
        events: &[RawEvent],
        rule: WindowRule,
        kind: CreditKind,
        is_trigger: impl Fn(&RawEvent) -> bool,
    ) -> Vec<AttributedCredit> {
        let mut out = Vec::new();
        let mut lo = 0usize;
        let mut hi = 0usize;

        for &trigger_idx in &self.shots {
            let trigger = &events[trigger_idx];
            if !is_trigger(trigger) {
                continue;
            }
            let t = trigger.timestamp_seconds;
            while hi < self.passes.len() && events[self.passes[hi]].timestamp_seconds < t {
                hi += 1;
            }
            while lo < hi && events[self.passes[lo]].timestamp_seconds < t - rule.window_secs {
                lo += 1;
            }

            let credited = self.passes[lo..hi].iter().rev().copied().find(|&pass_idx| {
                let pass = &events[pass_idx];
                pass.player_id != trigger.player_id && episode_compatible(pass, trigger, rule)
            });

            if let Some(pass_idx) = credited {
                let pass = &events[pass_idx];
                out.push(AttributedCredit {
                    kind,
                    match_id: trigger.match_id,
                    trigger_player_id: trigger.player_id,
                    crediting_player_id: pass.player_id,
                    team_id: trigger.team_id,
                    timestamp_seconds: pass.timestamp_seconds,
                    trigger_timestamp_seconds: t,
                    trigger_index: trigger_idx,
                    pass_index: pass_idx,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventCategory, EventOutcome};

    fn ev(player: u32, team: u32, t: f64, category: EventCategory, outcome: EventOutcome) -> RawEvent {
        RawEvent {
            match_id: 1,
            player_id: player,
            team_id: team,
            timestamp_seconds: t,
            category,
            outcome: Some(outcome),
            spatial_start: None,
            spatial_end: None,
            episode_id: None,
            player_name: None,
            team_name: None,
            position: None,
        }
    }

    fn pass(player: u32, team: u32, t: f64) -> RawEvent {
        ev(player, team, t, EventCategory::Pass, EventOutcome::Successful)
    }

    fn goal(player: u32, team: u32, t: f64) -> RawEvent {
        ev(player, team, t, EventCategory::Shot, EventOutcome::Goal)
    }

    #[test]
    fn last_pass_in_window_wins() {
        let events = vec![pass(1, 1, 40.0), pass(2, 1, 45.0), goal(3, 1, 48.0)];
        let out = attribute(&events, &AttributionConfig::default());
        assert_eq!(out.assists.len(), 1);
        assert_eq!(out.assists[0].crediting_player_id, 2);
        assert_eq!(out.key_passes.len(), 1);
        assert_eq!(out.key_passes[0].crediting_player_id, 2);
    }

    #[test]
    fn window_bounds_are_inclusive_then_strict() {
        let events = vec![pass(1, 1, 38.0), goal(3, 1, 48.0), pass(2, 1, 48.0)];
        let out = attribute(&events, &AttributionConfig::default());
        assert_eq!(out.assists.len(), 1);
        assert_eq!(out.assists[0].crediting_player_id, 1);
        // 10s back is outside the 5s key-pass window.
        assert!(out.key_passes.is_empty());
    }

    #[test]
    fn scorer_and_opponents_are_skipped() {
        let events = vec![
            pass(2, 1, 41.0),
            pass(9, 2, 46.0),
            pass(3, 1, 47.0),
            goal(3, 1, 48.0),
        ];
        let out = attribute(&events, &AttributionConfig::default());
        assert_eq!(out.assists[0].crediting_player_id, 2);
        assert!(out.key_passes.is_empty());
    }

    #[test]
    fn episode_constraint_applies_only_to_assists() {
        let mut p = pass(2, 1, 46.0);
        p.episode_id = Some(4);
        let mut g = goal(3, 1, 48.0);
        g.episode_id = Some(5);
        let out = attribute(&[p, g], &AttributionConfig::default());
        assert!(out.assists.is_empty());
        assert_eq!(out.key_passes.len(), 1);
    }

    #[test]
    fn equal_timestamps_prefer_later_stream_position() {
        let events = vec![pass(1, 1, 45.0), pass(2, 1, 45.0), goal(3, 1, 48.0)];
        let out = attribute(&events, &AttributionConfig::default());
        assert_eq!(out.assists[0].crediting_player_id, 2);
        let single = crediting_pass(&events[2], &events, AttributionConfig::default().assist_rule())
            .expect("credit");
        assert_eq!(single.player_id, 2);
    }

    #[test]
    fn no_candidate_yields_no_credit() {
        let events = vec![goal(3, 1, 5.0)];
        let out = attribute(&events, &AttributionConfig::default());
        assert_eq!(out.goals, 1);
        assert!(out.assists.is_empty());
        assert!(out.key_passes.is_empty());
    }
}
