use rand::Rng;
use tracing::debug;

use crate::config::HumanizeConfig;
use crate::model::{Point, TimedPoint, Trajectory};

/// Below this distance the force-field simulation is numerically unstable,
/// so the planner returns the two-point direct path instead.
const DIRECT_PATH_THRESHOLD: f64 = 5.0;

/// Output point count after Catmull-Rom resampling.
const SMOOTHED_POINT_COUNT: usize = 48;

/// Overshoot travel past the target, in pixels.
const OVERSHOOT_MIN_PX: f64 = 4.0;
const OVERSHOOT_MAX_PX: f64 = 14.0;

/// Plan a humanized cursor movement from `start` to `end`.
///
/// `duration_ms` (normally from [`crate::fitts::DurationModel`]) paces the
/// timestamps; the spatial shape comes from a stochastic force-field
/// simulation followed by spline smoothing and per-point jitter. The final
/// point always equals `end` exactly.
pub fn plan_trajectory(
    start: Point,
    end: Point,
    config: &HumanizeConfig,
    duration_ms: u64,
    rng: &mut impl Rng,
) -> Trajectory {
    let distance = start.distance_to(end);

    if distance < DIRECT_PATH_THRESHOLD {
        return pace(
            vec![(start.x as f64, start.y as f64), (end.x as f64, end.y as f64)],
            start,
            end,
            duration_ms,
        );
    }

    let mut raw = simulate_wind_path(start, end, config, rng);

    // Occasionally fly past the target and settle back, like a real hand.
    if rng.gen_bool(config.overshoot_probability) && distance > config.target_area * 3.0 {
        let past = overshoot_point(start, end, rng);
        let mut first_leg = simulate_wind_path(start, past, config, rng);
        let second_leg = simulate_wind_path(past, end, config, rng);
        first_leg.extend(second_leg.into_iter().skip(1));
        raw = first_leg;
        debug!(
            from = ?(start.x, start.y),
            to = ?(end.x, end.y),
            via = ?(past.x, past.y),
            "overshoot path"
        );
    }

    let mut points = if raw.len() >= 4 {
        catmull_rom_resample(&raw, SMOOTHED_POINT_COUNT)
    } else {
        raw
    };

    apply_jitter(&mut points, config.jitter_pixels, rng);

    pace(points, start, end, duration_ms)
}

/// Stochastic force-field ("wind") simulation. Returns floating-point
/// positions from `start` to approximately `end`; the caller pins the exact
/// endpoints afterwards.
fn simulate_wind_path(
    start: Point,
    end: Point,
    config: &HumanizeConfig,
    rng: &mut impl Rng,
) -> Vec<(f64, f64)> {
    let sqrt3 = 3.0f64.sqrt();
    let sqrt5 = 5.0f64.sqrt();

    let (tx, ty) = (end.x as f64, end.y as f64);
    let mut x = start.x as f64;
    let mut y = start.y as f64;
    let mut wind_x = 0.0;
    let mut wind_y = 0.0;
    let mut vel_x = 0.0;
    let mut vel_y = 0.0;

    let mut path = vec![(x, y)];

    // The velocity clamp keeps the loop converging, but give it a hard cap
    // anyway so a pathological config cannot spin forever.
    let max_steps = (start.distance_to(end) as usize) * 8 + 256;

    for _ in 0..max_steps {
        let dx = tx - x;
        let dy = ty - y;
        let dist = dx.hypot(dy);
        if dist < 1.0 {
            break;
        }

        if dist >= config.target_area {
            let f = config.wind.min(dist);
            wind_x = wind_x / sqrt3 + rng.gen_range(-f..=f) / sqrt5;
            wind_y = wind_y / sqrt3 + rng.gen_range(-f..=f) / sqrt5;
        } else {
            wind_x /= sqrt3;
            wind_y /= sqrt3;
        }

        let pull = config.gravity.min(dist);
        vel_x += wind_x + pull * dx / dist;
        vel_y += wind_y + pull * dy / dist;

        let speed = vel_x.hypot(vel_y);
        if speed > dist {
            // Clamp to a random 50-100% of the remaining distance so the
            // cursor cannot oscillate around the target.
            let scale = dist * rng.gen_range(0.5..=1.0) / speed;
            vel_x *= scale;
            vel_y *= scale;
        }

        x += vel_x;
        y += vel_y;

        let rounded = (x.round(), y.round());
        let last = *path.last().unwrap_or(&(x, y));
        if (last.0.round(), last.1.round()) != rounded {
            path.push((x, y));
        }
    }

    path.push((tx, ty));
    path
}

fn overshoot_point(start: Point, end: Point, rng: &mut impl Rng) -> Point {
    let dx = (end.x - start.x) as f64;
    let dy = (end.y - start.y) as f64;
    let dist = dx.hypot(dy).max(1.0);
    let past = rng.gen_range(OVERSHOOT_MIN_PX..=OVERSHOOT_MAX_PX);
    Point::new(
        (end.x as f64 + dx / dist * past).round() as i32,
        (end.y as f64 + dy / dist * past).round() as i32,
    )
}

/// Resample the polyline through a Catmull-Rom spline interpolating every
/// raw point, producing `count` evenly parameterized output points.
fn catmull_rom_resample(raw: &[(f64, f64)], count: usize) -> Vec<(f64, f64)> {
    debug_assert!(raw.len() >= 4 && count >= 2);

    let segments = raw.len() - 1;
    let mut out = Vec::with_capacity(count);

    for j in 0..count {
        let u = j as f64 / (count - 1) as f64 * segments as f64;
        let seg = (u.floor() as usize).min(segments - 1);
        let t = u - seg as f64;

        let p0 = raw[seg.saturating_sub(1)];
        let p1 = raw[seg];
        let p2 = raw[seg + 1];
        let p3 = raw[(seg + 2).min(raw.len() - 1)];

        out.push((
            catmull_rom(p0.0, p1.0, p2.0, p3.0, t),
            catmull_rom(p0.1, p1.1, p2.1, p3.1, t),
        ));
    }

    out
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

/// Uniform noise on every interior point; the endpoints stay exact.
fn apply_jitter(points: &mut [(f64, f64)], amount: f64, rng: &mut impl Rng) {
    if amount <= 0.0 || points.len() <= 2 {
        return;
    }
    let last = points.len() - 1;
    for p in &mut points[1..last] {
        p.0 += rng.gen_range(-amount..=amount);
        p.1 += rng.gen_range(-amount..=amount);
    }
}

/// Round to integer points, drop consecutive duplicates, pin the endpoints,
/// and distribute `duration_ms` proportionally to cumulative path length.
fn pace(points: Vec<(f64, f64)>, start: Point, end: Point, duration_ms: u64) -> Trajectory {
    let mut integer: Vec<Point> = Vec::with_capacity(points.len());
    for (x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if integer.last() != Some(&p) {
            integer.push(p);
        }
    }

    if let Some(first) = integer.first_mut() {
        *first = start;
    }
    match integer.last_mut() {
        Some(last) if *last != end => integer.push(end),
        Some(_) => {}
        None => integer.push(end),
    }
    if integer.len() < 2 {
        integer.insert(0, start);
    }

    let mut cumulative = vec![0.0f64];
    for pair in integer.windows(2) {
        let step = pair[0].distance_to(pair[1]);
        cumulative.push(cumulative.last().unwrap() + step);
    }
    let total = *cumulative.last().unwrap();

    let count = integer.len();
    let timed = integer
        .iter()
        .zip(&cumulative)
        .enumerate()
        .map(|(i, (p, travelled))| {
            let frac = if total > 0.0 {
                travelled / total
            } else {
                i as f64 / (count - 1) as f64
            };
            TimedPoint {
                x: p.x,
                y: p.y,
                elapsed_ms: (duration_ms as f64 * frac).round() as u64,
            }
        })
        .collect();

    Trajectory::new(timed)
}
