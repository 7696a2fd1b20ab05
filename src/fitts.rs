use crate::config::HumanizeConfig;
use crate::model::Point;

/// Target width assumed when the caller does not know the real one.
pub const DEFAULT_TARGET_WIDTH: f64 = 24.0;

/// Fallback Fitts coefficients used before any profile has been learned.
pub const DEFAULT_INTERCEPT_MS: f64 = 120.0;
pub const DEFAULT_SLOPE_MS: f64 = 160.0;

/// Movements shorter than this are discarded as noise when fitting.
pub const MIN_FIT_DISTANCE: f64 = 10.0;

/// Minimum number of (ID, duration) pairs before a fit is attempted.
pub const MIN_FIT_PAIRS: usize = 5;

/// Fitts's index of difficulty: `log2(distance/width + 1)`.
pub fn index_of_difficulty(distance: f64, width: f64) -> f64 {
    let width = width.max(1.0);
    (distance.max(0.0) / width + 1.0).log2()
}

/// Movement-time model `duration = a + b * ID`, clamped into the configured
/// duration window.
#[derive(Debug, Clone, Copy)]
pub struct DurationModel {
    intercept_ms: f64,
    slope_ms: f64,
    min_duration_ms: u64,
    max_duration_ms: u64,
}

impl DurationModel {
    pub fn new(intercept_ms: f64, slope_ms: f64, config: &HumanizeConfig) -> Self {
        Self {
            intercept_ms: intercept_ms.max(0.0),
            slope_ms: slope_ms.max(0.0),
            min_duration_ms: config.min_duration_ms,
            max_duration_ms: config.max_duration_ms,
        }
    }

    pub fn with_defaults(config: &HumanizeConfig) -> Self {
        Self::new(DEFAULT_INTERCEPT_MS, DEFAULT_SLOPE_MS, config)
    }

    pub fn intercept_ms(&self) -> f64 {
        self.intercept_ms
    }

    pub fn slope_ms(&self) -> f64 {
        self.slope_ms
    }

    /// Predicted movement duration for a given distance and target width.
    pub fn duration_ms(&self, distance: f64, target_width: f64) -> u64 {
        let id = index_of_difficulty(distance, target_width);
        let raw = self.intercept_ms + self.slope_ms * id;
        (raw.round() as u64).clamp(self.min_duration_ms, self.max_duration_ms)
    }

    pub fn duration_between(&self, start: Point, end: Point, target_width: Option<f64>) -> u64 {
        self.duration_ms(
            start.distance_to(end),
            target_width.unwrap_or(DEFAULT_TARGET_WIDTH),
        )
    }
}

/// Ordinary least squares for `duration = a + b * ID`.
///
/// Returns `None` when there are too few pairs or the pairs are degenerate
/// (all IDs equal). Negative coefficients are clamped to zero rather than
/// accepted: a negative slope means the data does not describe aimed
/// movement at all.
pub fn fit_fitts_law(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
    if pairs.len() < MIN_FIT_PAIRS {
        return None;
    }

    let n = pairs.len() as f64;
    let sum_x: f64 = pairs.iter().map(|(id, _)| id).sum();
    let sum_y: f64 = pairs.iter().map(|(_, t)| t).sum();
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (id, t) in pairs {
        let dx = id - mean_x;
        sxx += dx * dx;
        sxy += dx * (t - mean_y);
    }

    if sxx <= f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    Some((intercept.max(0.0), slope.max(0.0)))
}
