use motoric::config::HumanizeConfig;
use motoric::fitts::{fit_fitts_law, index_of_difficulty, DurationModel};

fn config() -> HumanizeConfig {
    HumanizeConfig::default()
}

#[test]
fn duration_is_non_decreasing_in_distance() {
    let cfg = config();
    let model = DurationModel::with_defaults(&cfg);

    let mut previous = 0;
    for distance in (0..3000).step_by(25) {
        let duration = model.duration_ms(distance as f64, 24.0);
        assert!(
            duration >= previous,
            "duration regressed at distance {distance}: {duration} < {previous}"
        );
        previous = duration;
    }
}

#[test]
fn duration_is_non_increasing_in_width() {
    let cfg = config();
    let model = DurationModel::with_defaults(&cfg);

    let mut previous = u64::MAX;
    for width in (1..200).step_by(3) {
        let duration = model.duration_ms(800.0, width as f64);
        assert!(
            duration <= previous,
            "duration grew at width {width}: {duration} > {previous}"
        );
        previous = duration;
    }
}

#[test]
fn duration_stays_within_configured_window() {
    let cfg = HumanizeConfig {
        min_duration_ms: 200,
        max_duration_ms: 500,
        ..HumanizeConfig::default()
    };
    let model = DurationModel::with_defaults(&cfg);

    assert_eq!(model.duration_ms(0.0, 24.0), 200);
    assert_eq!(model.duration_ms(1_000_000.0, 1.0), 500);

    for distance in [0.0, 10.0, 100.0, 5000.0, 100_000.0] {
        let d = model.duration_ms(distance, 24.0);
        assert!((200..=500).contains(&d));
    }
}

#[test]
fn index_of_difficulty_matches_definition() {
    assert_eq!(index_of_difficulty(0.0, 24.0), 0.0);
    let id = index_of_difficulty(24.0, 24.0);
    assert!((id - 1.0).abs() < 1e-12, "ID(d=w) should be exactly 1 bit, got {id}");
    assert!(index_of_difficulty(240.0, 24.0) > id);
}

#[test]
fn ols_recovers_known_coefficients() {
    let (a, b) = (50.0, 120.0);
    let pairs: Vec<(f64, f64)> = [1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]
        .iter()
        .map(|&id| (id, a + b * id))
        .collect();

    let (fit_a, fit_b) = fit_fitts_law(&pairs).expect("fit should succeed");
    assert!((fit_a - a).abs() < 1e-9, "intercept {fit_a} != {a}");
    assert!((fit_b - b).abs() < 1e-9, "slope {fit_b} != {b}");
}

#[test]
fn fit_requires_at_least_five_pairs() {
    let pairs = vec![(1.0, 170.0), (2.0, 290.0), (3.0, 410.0), (4.0, 530.0)];
    assert_eq!(fit_fitts_law(&pairs), None);
}

#[test]
fn fit_rejects_degenerate_identical_ids() {
    let pairs = vec![(2.0, 100.0); 8];
    assert_eq!(fit_fitts_law(&pairs), None);
}

#[test]
fn fit_clamps_negative_slope_to_zero() {
    // Durations shrinking with difficulty is not aimed movement.
    let pairs: Vec<(f64, f64)> = (1..=6).map(|i| (i as f64, 700.0 - 100.0 * i as f64)).collect();
    let (_, slope) = fit_fitts_law(&pairs).expect("fit should still return");
    assert_eq!(slope, 0.0);
}

#[test]
fn model_clamps_negative_coefficients() {
    let cfg = config();
    let model = DurationModel::new(-50.0, -10.0, &cfg);
    assert_eq!(model.intercept_ms(), 0.0);
    assert_eq!(model.slope_ms(), 0.0);
}
