use rand::rngs::StdRng;
use rand::SeedableRng;

use motoric::config::HumanizeConfig;
use motoric::model::Point;
use motoric::trajectory::plan_trajectory;

fn config() -> HumanizeConfig {
    HumanizeConfig::default()
}

#[test]
fn final_point_always_equals_target_exactly() {
    let cfg = config();
    let pairs = [
        ((0, 0), (800, 600)),
        ((100, 100), (105, 103)),
        ((1900, 30), (12, 1040)),
        ((50, 50), (50, 50)),
        ((640, 480), (644, 480)),
        ((0, 500), (1200, 500)),
    ];

    for (seed, (from, to)) in pairs.iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(seed as u64);
        let trajectory = plan_trajectory(
            Point::from(*from),
            Point::from(*to),
            &cfg,
            420,
            &mut rng,
        );

        assert_eq!(
            trajectory.end(),
            Some(Point::from(*to)),
            "trajectory {from:?} -> {to:?} must end exactly on target"
        );
        assert!(trajectory.len() >= 2, "trajectory must have at least 2 points");
    }
}

#[test]
fn starts_at_the_given_start_point() {
    let cfg = config();
    let mut rng = StdRng::seed_from_u64(7);
    let trajectory = plan_trajectory(Point::new(10, 20), Point::new(700, 300), &cfg, 500, &mut rng);

    let first = trajectory.points()[0];
    assert_eq!((first.x, first.y), (10, 20));
}

#[test]
fn no_long_consecutive_stalls() {
    let cfg = config();
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let trajectory =
            plan_trajectory(Point::new(0, 0), Point::new(900, 700), &cfg, 600, &mut rng);

        let points = trajectory.points();
        let mut repeats = 1usize;
        for pair in points.windows(2) {
            if pair[0].point() == pair[1].point() {
                repeats += 1;
                assert!(
                    repeats <= 3,
                    "seed {seed}: point {:?} repeated {repeats} times consecutively",
                    pair[0].point()
                );
            } else {
                repeats = 1;
            }
        }
    }
}

#[test]
fn near_zero_distance_returns_direct_two_point_path() {
    let cfg = config();
    let mut rng = StdRng::seed_from_u64(1);
    let trajectory = plan_trajectory(Point::new(100, 100), Point::new(102, 101), &cfg, 200, &mut rng);

    assert_eq!(trajectory.len(), 2);
    assert_eq!(trajectory.points()[0].point(), Point::new(100, 100));
    assert_eq!(trajectory.points()[1].point(), Point::new(102, 101));
}

#[test]
fn identical_start_and_end_still_yields_valid_path() {
    let cfg = config();
    let mut rng = StdRng::seed_from_u64(2);
    let trajectory = plan_trajectory(Point::new(300, 300), Point::new(300, 300), &cfg, 150, &mut rng);

    assert!(trajectory.len() >= 2);
    assert_eq!(trajectory.end(), Some(Point::new(300, 300)));
}

#[test]
fn timestamps_are_monotone_and_span_the_duration() {
    let cfg = config();
    let mut rng = StdRng::seed_from_u64(9);
    let duration = 480;
    let trajectory =
        plan_trajectory(Point::new(0, 0), Point::new(640, 480), &cfg, duration, &mut rng);

    let points = trajectory.points();
    assert_eq!(points[0].elapsed_ms, 0);
    assert_eq!(trajectory.total_duration_ms(), duration);

    for pair in points.windows(2) {
        assert!(
            pair[0].elapsed_ms <= pair[1].elapsed_ms,
            "elapsed times must be non-decreasing"
        );
    }
}

#[test]
fn zero_jitter_still_reaches_target() {
    let cfg = HumanizeConfig {
        jitter_pixels: 0.0,
        overshoot_probability: 0.0,
        ..HumanizeConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(11);
    let trajectory = plan_trajectory(Point::new(5, 5), Point::new(400, 900), &cfg, 300, &mut rng);
    assert_eq!(trajectory.end(), Some(Point::new(400, 900)));
}
