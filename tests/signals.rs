mod common;

use kleague_fantasy::match_stats::PlayerMatchRecord;
use kleague_fantasy::prediction::PredictedScore;
use kleague_fantasy::season::{MatchCalendar, aggregate_season, build_histories};
use kleague_fantasy::signals::{Cohort, DetectionReport, SignalConfig, detect_all};

use common::{dated_matches, player_rows};

fn detect(
    rows: &[PlayerMatchRecord],
    predictions: Option<&[PredictedScore]>,
    cfg: &SignalConfig,
) -> DetectionReport {
    let calendar = MatchCalendar::from_matches(&dated_matches(25)).unwrap();
    let histories = build_histories(rows, &calendar).unwrap();
    let season = aggregate_season(&histories);
    detect_all(&season, &histories, predictions, cfg)
}

/// Player 1 surges from a 5.0 season average to 8.0 over the last three
/// matches; players 2..=5 are flat at 3.0.
fn surging_squad() -> (Vec<PlayerMatchRecord>, Vec<PredictedScore>) {
    let mut rows = player_rows(1, &[4.0, 4.0, 4.0, 2.0, 2.0, 8.0, 8.0, 8.0]);
    for id in 2..=5 {
        rows.extend(player_rows(id, &[3.0; 8]));
    }
    let predictions = (1..=5)
        .map(|id| PredictedScore {
            player_id: id,
            predicted_score: if id == 1 { 9.0 } else { 10.0 - id as f64 * 2.0 },
        })
        .collect();
    (rows, predictions)
}

#[test]
fn surging_player_with_top_projection_is_a_dark_horse() {
    let (rows, predictions) = surging_squad();
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());

    assert_eq!(report.dark_horses.len(), 1);
    let dh = &report.dark_horses[0];
    assert_eq!(dh.player_id, 1);
    assert_eq!(dh.matches_played, 8);
    assert!((dh.avg_fantasy_score - 5.0).abs() < 1e-12);
    assert!((dh.recent_avg - 8.0).abs() < 1e-12);
    assert!((dh.form_surge - 1.6).abs() < 1e-12);
    assert_eq!(dh.predicted_rank, Some(1));
    assert!((dh.predicted_percentile.unwrap() - 20.0).abs() < 1e-12);
    assert!(dh.reason.contains("form up 60% (surging)"), "{}", dh.reason);
    assert!(dh.reason.contains("limited appearances"), "{}", dh.reason);
    assert!(dh.reason.contains("projected top 30%"), "{}", dh.reason);
}

#[test]
fn surging_player_is_also_rising_and_underrated() {
    let (rows, predictions) = surging_squad();
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());

    assert_eq!(report.rising_stars.len(), 1);
    assert_eq!(report.rising_stars[0].player_id, 1);

    // p70 of [3, 3, 3, 3, 5] is 3.0 and only player 1 is strictly above it.
    assert_eq!(report.underrated_threshold, Some(3.0));
    assert_eq!(report.underrated.len(), 1);
    assert_eq!(report.underrated[0].player_id, 1);

    assert_eq!(
        report.memberships(1),
        vec![Cohort::DarkHorse, Cohort::RisingStar, Cohort::Underrated]
    );
    assert!(report.memberships(2).is_empty());
}

#[test]
fn no_prediction_table_means_no_dark_horses() {
    let (rows, _) = surging_squad();
    let report = detect(&rows, None, &SignalConfig::default());
    assert!(report.dark_horses.is_empty());
    assert_eq!(report.rising_stars.len(), 1);
}

#[test]
fn missing_prediction_falls_back_to_season_average() {
    let (rows, _) = surging_squad();
    // Player 1 has no projection and is ranked on its 5.0 season average.
    let mut predictions: Vec<PredictedScore> = (2..=5)
        .map(|id| PredictedScore {
            player_id: id,
            predicted_score: 5.0 - id as f64,
        })
        .collect();
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());
    let dh = &report.dark_horses[0];
    assert_eq!(dh.player_id, 1);
    assert_eq!(dh.predicted_score, Some(5.0));
    assert_eq!(dh.predicted_rank, Some(1));

    // One projection above 5.0 pushes it to the 40th percentile.
    predictions[0].predicted_score = 6.0;
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());
    assert!(report.dark_horses.is_empty());
}

#[test]
fn dark_horses_respect_every_threshold() {
    // Players with growing appearance counts, each with a late surge.
    let mut rows = Vec::new();
    let mut predictions = Vec::new();
    for (id, n) in [(1u32, 6usize), (2, 12), (3, 16), (4, 18)] {
        let mut scores = vec![2.0; n - 3];
        scores.extend([9.0, 9.0, 9.0]);
        rows.extend(player_rows(id, &scores));
        predictions.push(PredictedScore {
            player_id: id,
            predicted_score: 20.0 - id as f64,
        });
    }
    for id in 10..=19 {
        rows.extend(player_rows(id, &[1.0; 5]));
        predictions.push(PredictedScore {
            player_id: id,
            predicted_score: 1.0,
        });
    }

    let strict = SignalConfig::default();
    let report = detect(&rows, Some(&predictions), &strict);
    let population = 14.0;
    for dh in &report.dark_horses {
        assert!(dh.form_surge > strict.dark_horse_min_surge);
        assert!(dh.matches_played < strict.dark_horse_max_matches);
        let pct = dh.predicted_percentile.unwrap();
        assert!(pct <= strict.dark_horse_max_percentile);
        assert!(pct >= 100.0 / population - 1e-9);
    }
    let strict_ids: Vec<u32> = report.dark_horses.iter().map(|e| e.player_id).collect();
    assert!(strict_ids.contains(&1));
    assert!(strict_ids.contains(&2));
    assert!(!strict_ids.contains(&3));

    // Loosening the appearance cap can only grow the cohort.
    let loose = SignalConfig {
        dark_horse_max_matches: 20,
        ..SignalConfig::default()
    };
    let loose_ids: Vec<u32> = detect(&rows, Some(&predictions), &loose)
        .dark_horses
        .iter()
        .map(|e| e.player_id)
        .collect();
    assert!(strict_ids.iter().all(|id| loose_ids.contains(id)));
    assert!(loose_ids.contains(&3));
    assert!(loose_ids.len() > strict_ids.len());
}

#[test]
fn tied_projections_share_a_rank() {
    let (rows, _) = surging_squad();
    let predictions: Vec<PredictedScore> = (1..=5)
        .map(|id| PredictedScore {
            player_id: id,
            predicted_score: if id <= 2 { 9.0 } else { 1.0 },
        })
        .collect();
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());
    let dh = &report.dark_horses[0];
    assert_eq!(dh.player_id, 1);
    assert_eq!(dh.predicted_rank, Some(1));
    assert!((dh.predicted_percentile.unwrap() - 20.0).abs() < 1e-12);
}

#[test]
fn position_breakdown_keeps_top_entries() {
    let (rows, predictions) = surging_squad();
    let report = detect(&rows, Some(&predictions), &SignalConfig::default());
    let by_position = report.position_dark_horses(3);
    assert_eq!(by_position.len(), 1);
    assert_eq!(by_position["CM"].len(), 1);
    assert!(report.position_dark_horses(0)["CM"].is_empty());
}
