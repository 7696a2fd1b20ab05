use std::path::Path;

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fitts::{
    fit_fitts_law, index_of_difficulty, DEFAULT_INTERCEPT_MS, DEFAULT_SLOPE_MS, DEFAULT_TARGET_WIDTH,
    MIN_FIT_DISTANCE,
};
use crate::model::Point;

/// Inter-key delays above this are treated as pauses, not typing.
const PAUSE_CEILING_MS: u64 = 2000;

/// A sample's path counts as an overshoot when it exceeds the straight-line
/// distance by more than this fraction.
const OVERSHOOT_EXCESS: f64 = 0.10;

/// One recorded human mouse movement. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSample {
    pub start: Point,
    pub end: Point,
    pub duration_ms: u64,
    pub straight_distance: f64,
    pub path_length: f64,
    pub overshoot: bool,
    pub timestamp: DateTime<Utc>,
}

/// One recorded human keystroke. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeSample {
    pub key: String,
    pub previous_key: Option<String>,
    pub inter_key_delay_ms: u64,
    pub hold_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Calibrated motor-behavior scalars plus the raw samples they were derived
/// from. Mutated only by a full re-analysis pass, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalProfile {
    pub name: String,
    pub created_at: DateTime<Utc>,

    pub mouse_speed_mean: f64,
    pub mouse_speed_stddev: f64,
    pub overshoot_rate: f64,
    pub jitter_amplitude: f64,
    pub fitts_intercept_ms: f64,
    pub fitts_slope_ms: f64,

    pub wpm_mean: f64,
    pub wpm_stddev: f64,
    pub typo_rate: f64,
    pub mean_hold_ms: f64,
    pub mean_inter_key_ms: f64,

    pub mouse_samples: Vec<MouseSample>,
    pub keystroke_samples: Vec<KeystrokeSample>,
}

impl PersonalProfile {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize profile")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(name = %self.name, path = %path.display(), "saved profile");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let profile: Self =
            serde_json::from_str(&json).context("failed to parse profile JSON")?;
        ensure!(!profile.name.is_empty(), "profile name must not be empty");
        Ok(profile)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Fits a [`PersonalProfile`] from a recording session's samples.
#[derive(Debug, Default)]
pub struct ProfileLearner {
    mouse_samples: Vec<MouseSample>,
    keystroke_samples: Vec<KeystrokeSample>,
}

impl ProfileLearner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mouse_sample(&mut self, sample: MouseSample) {
        self.mouse_samples.push(sample);
    }

    pub fn add_keystroke_sample(&mut self, sample: KeystrokeSample) {
        self.keystroke_samples.push(sample);
    }

    pub fn mouse_sample_count(&self) -> usize {
        self.mouse_samples.len()
    }

    pub fn keystroke_sample_count(&self) -> usize {
        self.keystroke_samples.len()
    }

    /// Full analysis pass over the accumulated samples.
    pub fn analyze(&self, name: &str) -> PersonalProfile {
        let speeds: Vec<f64> = self
            .mouse_samples
            .iter()
            .filter(|s| s.duration_ms > 0)
            .map(|s| s.straight_distance / s.duration_ms as f64)
            .collect();
        let speed_mean = mean(&speeds);
        let speed_stddev = stddev(&speeds, speed_mean);

        let overshoot_rate = if self.mouse_samples.is_empty() {
            0.0
        } else {
            let overshoots = self
                .mouse_samples
                .iter()
                .filter(|s| {
                    s.straight_distance > 0.0
                        && s.path_length > s.straight_distance * (1.0 + OVERSHOOT_EXCESS)
                })
                .count();
            overshoots as f64 / self.mouse_samples.len() as f64
        };

        // Wobble proxy: how much longer the travelled path is than the
        // straight line, in pixels per hundred pixels of distance.
        let excess_ratios: Vec<f64> = self
            .mouse_samples
            .iter()
            .filter(|s| s.straight_distance > 0.0)
            .map(|s| (s.path_length / s.straight_distance - 1.0).max(0.0))
            .collect();
        let jitter_amplitude = (mean(&excess_ratios) * 10.0).clamp(0.5, 4.0);

        let fit_pairs: Vec<(f64, f64)> = self
            .mouse_samples
            .iter()
            .filter(|s| s.straight_distance > MIN_FIT_DISTANCE)
            .map(|s| {
                (
                    index_of_difficulty(s.straight_distance, DEFAULT_TARGET_WIDTH),
                    s.duration_ms as f64,
                )
            })
            .collect();
        let (fitts_intercept_ms, fitts_slope_ms) = match fit_fitts_law(&fit_pairs) {
            Some(coeffs) => coeffs,
            None => {
                debug!(
                    pairs = fit_pairs.len(),
                    "not enough usable mouse samples for a Fitts fit; using defaults"
                );
                (DEFAULT_INTERCEPT_MS, DEFAULT_SLOPE_MS)
            }
        };

        let delays: Vec<f64> = self
            .keystroke_samples
            .iter()
            .filter(|s| s.inter_key_delay_ms > 0 && s.inter_key_delay_ms <= PAUSE_CEILING_MS)
            .map(|s| s.inter_key_delay_ms as f64)
            .collect();
        let mean_inter_key_ms = mean(&delays);
        let delay_stddev = stddev(&delays, mean_inter_key_ms);

        let (wpm_mean, wpm_stddev) = if mean_inter_key_ms > 0.0 {
            let wpm = 12_000.0 / mean_inter_key_ms;
            (wpm, wpm * (delay_stddev / mean_inter_key_ms))
        } else {
            (0.0, 0.0)
        };

        let typo_rate = if self.keystroke_samples.is_empty() {
            0.0
        } else {
            let backspaces = self
                .keystroke_samples
                .iter()
                .filter(|s| s.key.eq_ignore_ascii_case("backspace"))
                .count();
            backspaces as f64 / self.keystroke_samples.len() as f64
        };

        let holds: Vec<f64> = self
            .keystroke_samples
            .iter()
            .map(|s| s.hold_duration_ms as f64)
            .collect();
        let mean_hold_ms = mean(&holds);

        info!(
            name,
            mouse_samples = self.mouse_samples.len(),
            keystroke_samples = self.keystroke_samples.len(),
            fitts_intercept_ms,
            fitts_slope_ms,
            wpm_mean,
            "analyzed recording session"
        );

        PersonalProfile {
            name: name.to_string(),
            created_at: Utc::now(),
            mouse_speed_mean: speed_mean,
            mouse_speed_stddev: speed_stddev,
            overshoot_rate,
            jitter_amplitude,
            fitts_intercept_ms,
            fitts_slope_ms,
            wpm_mean,
            wpm_stddev,
            typo_rate,
            mean_hold_ms,
            mean_inter_key_ms,
            mouse_samples: self.mouse_samples.clone(),
            keystroke_samples: self.keystroke_samples.clone(),
        }
    }
}
