use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::match_stats::{EventCounts, PlayerMatchRecord};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointTable {
    pub goal: f64,
    pub shot_on_target: f64,
    pub shot: f64,
    pub assist: f64,
    pub key_pass: f64,
    pub pass_successful: f64,
    pub pass_failed: f64,
    pub carry: f64,
    pub carry_progressive: f64,
    pub tackle_successful: f64,
    pub tackle_failed: f64,
    pub interception: f64,
    pub block: f64,
    pub clearance: f64,
    pub recovery: f64,
    pub duel_won: f64,
    pub duel_lost: f64,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            goal: 10.0,
            shot_on_target: 2.0,
            shot: 1.0,
            assist: 5.0,
            key_pass: 2.0,
            pass_successful: 0.1,
            pass_failed: -0.05,
            carry: 0.05,
            carry_progressive: 0.3,
            tackle_successful: 1.5,
            tackle_failed: -0.3,
            interception: 1.5,
            block: 1.0,
            clearance: 0.5,
            recovery: 0.3,
            duel_won: 1.0,
            duel_lost: -0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionMultiplier {
    pub defensive: f64,
    pub offensive: f64,
}

impl Default for PositionMultiplier {
    fn default() -> Self {
        Self {
            defensive: 1.0,
            offensive: 1.0,
        }
    }
}

static DEFAULT_POSITION_MULTIPLIERS: Lazy<BTreeMap<String, PositionMultiplier>> = Lazy::new(|| {
    [
        ("GK", 1.5, 0.3),
        ("CB", 1.3, 0.7),
        ("RB", 1.1, 0.9),
        ("LB", 1.1, 0.9),
        ("RWB", 1.0, 1.0),
        ("LWB", 1.0, 1.0),
        ("CDM", 1.2, 0.8),
        ("CM", 1.0, 1.0),
        ("CAM", 0.7, 1.3),
        ("RM", 0.8, 1.2),
        ("LM", 0.8, 1.2),
        ("RW", 0.6, 1.4),
        ("LW", 0.6, 1.4),
        ("CF", 0.5, 1.5),
        ("ST", 0.4, 1.6),
    ]
    .into_iter()
    .map(|(pos, defensive, offensive)| {
        (
            pos.to_string(),
            PositionMultiplier {
                defensive,
                offensive,
            },
        )
    })
    .collect()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub points: PointTable,
    pub position_multipliers: BTreeMap<String, PositionMultiplier>,
    /// Off by default: the multiplier table is published configuration but the
    /// live score is the plain point-table product.
    pub apply_position_multipliers: bool,
    pub progressive_carry_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points: PointTable::default(),
            position_multipliers: DEFAULT_POSITION_MULTIPLIERS.clone(),
            apply_position_multipliers: false,
            progressive_carry_threshold: 10.0,
        }
    }
}

impl ScoringConfig {
    pub fn multiplier_for(&self, position: &str) -> PositionMultiplier {
        self.position_multipliers
            .get(position.trim())
            .or_else(|| {
                self.position_multipliers
                    .get(&position.trim().to_ascii_uppercase())
            })
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreParts {
    pub offensive: f64,
    pub defensive: f64,
}

impl ScoreParts {
    pub fn total(&self) -> f64 {
        self.offensive + self.defensive
    }
}

pub fn score_parts(c: &EventCounts, p: &PointTable) -> ScoreParts {
    let n = |v: u32| v as f64;
    let offensive = n(c.goals) * p.goal
        + n(c.shots_on_target) * p.shot_on_target
        + n(c.shots) * p.shot
        + n(c.assists) * p.assist
        + n(c.key_passes) * p.key_pass
        + n(c.passes_successful) * p.pass_successful
        + n(c.passes_failed) * p.pass_failed
        + n(c.carries) * p.carry
        + n(c.carries_progressive) * p.carry_progressive;
    let defensive = n(c.tackles_successful) * p.tackle_successful
        + n(c.tackles_failed()) * p.tackle_failed
        + n(c.interceptions) * p.interception
        + n(c.blocks) * p.block
        + n(c.clearances) * p.clearance
        + n(c.recoveries) * p.recovery
        + n(c.duels_won) * p.duel_won
        + n(c.duels_lost()) * p.duel_lost;
    ScoreParts {
        offensive,
        defensive,
    }
}

/// Fantasy score of one count vector. The position multiplier only applies
/// when `cfg.apply_position_multipliers` is set.
pub fn fantasy_score(counts: &EventCounts, position: &str, cfg: &ScoringConfig) -> f64 {
    let parts = score_parts(counts, &cfg.points);
    if !cfg.apply_position_multipliers {
        return parts.total();
    }
    let m = cfg.multiplier_for(position);
    parts.offensive * m.offensive + parts.defensive * m.defensive
}

pub fn score_matches(rows: Vec<PlayerMatchRecord>, cfg: &ScoringConfig) -> Vec<PlayerMatchRecord> {
    let scored: Vec<PlayerMatchRecord> = rows
        .into_par_iter()
        .map(|mut row| {
            row.fantasy_score = fantasy_score(&row.counts, &row.position, cfg);
            row
        })
        .collect();

    if !scored.is_empty() {
        let mean = scored.iter().map(|r| r.fantasy_score).sum::<f64>() / scored.len() as f64;
        let max = scored
            .iter()
            .map(|r| r.fantasy_score)
            .fold(f64::NEG_INFINITY, f64::max);
        info!(
            rows = scored.len(),
            multipliers = cfg.apply_position_multipliers,
            "fantasy scores computed (mean {mean:.2}, max {max:.2})"
        );
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striker_counts() -> EventCounts {
        EventCounts {
            shots: 3,
            shots_on_target: 1,
            goals: 1,
            passes_total: 12,
            passes_successful: 10,
            passes_failed: 2,
            tackles_total: 2,
            tackles_successful: 1,
            duels_total: 4,
            duels_won: 1,
            assists: 1,
            key_passes: 2,
            ..Default::default()
        }
    }

    #[test]
    fn point_table_dot_product() {
        let c = striker_counts();
        // 10 + 2 + 3 + 5 + 4 + 1.0 - 0.1 + 1.5 - 0.3 + 1.0 - 0.6
        let expected = 26.5;
        let got = fantasy_score(&c, "ST", &ScoringConfig::default());
        assert!((got - expected).abs() < 1e-9, "got {got}");
    }

    #[test]
    fn multipliers_are_off_unless_enabled() {
        let c = striker_counts();
        let mut cfg = ScoringConfig::default();
        let plain = fantasy_score(&c, "ST", &cfg);
        assert_eq!(plain, fantasy_score(&c, "GK", &cfg));

        cfg.apply_position_multipliers = true;
        let parts = score_parts(&c, &cfg.points);
        let boosted = fantasy_score(&c, "st", &cfg);
        assert!((boosted - (parts.offensive * 1.6 + parts.defensive * 0.4)).abs() < 1e-9);
        assert!((fantasy_score(&c, "Sweeper", &cfg) - plain).abs() < 1e-9);
    }

    #[test]
    fn empty_counts_score_zero() {
        assert_eq!(
            fantasy_score(&EventCounts::default(), "CM", &ScoringConfig::default()),
            0.0
        );
    }
}
