use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// Every recognized tuning option, with defaults. Unknown keys in a config
/// file are a hard error rather than being silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HumanizeConfig {
    /// Attraction toward the target in the force-field movement model.
    pub gravity: f64,
    /// Strength of the random "wind" perturbation.
    pub wind: f64,
    /// Distance at which wind stops being refreshed and only decays.
    pub target_area: f64,
    /// Uniform per-point jitter amplitude applied after smoothing.
    pub jitter_pixels: f64,
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    /// Chance a movement deliberately overshoots before settling.
    pub overshoot_probability: f64,
    pub base_wpm: f64,
    /// Relative spread of per-character delays (fraction of the mean).
    pub wpm_variance: f64,
    pub typo_rate: f64,
    /// Largest per-axis jump a healing candidate may make from the prior
    /// coordinates before it is treated as the wrong element.
    pub healing_max_delta_px: i32,
    pub consecutive_failure_threshold: u32,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            gravity: 9.0,
            wind: 3.0,
            target_area: 12.0,
            jitter_pixels: 1.5,
            min_duration_ms: 120,
            max_duration_ms: 2200,
            overshoot_probability: 0.12,
            base_wpm: 65.0,
            wpm_variance: 0.25,
            typo_rate: 0.02,
            healing_max_delta_px: 200,
            consecutive_failure_threshold: 3,
        }
    }
}

impl HumanizeConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.gravity.is_finite() && self.gravity > 0.0,
            "gravity must be finite and > 0"
        );
        ensure!(
            self.wind.is_finite() && self.wind >= 0.0,
            "wind must be finite and >= 0"
        );
        ensure!(
            self.target_area.is_finite() && self.target_area >= 1.0,
            "target_area must be finite and >= 1"
        );
        ensure!(
            self.jitter_pixels.is_finite() && self.jitter_pixels >= 0.0,
            "jitter_pixels must be finite and >= 0"
        );
        ensure!(
            self.min_duration_ms <= self.max_duration_ms,
            "min_duration_ms must be <= max_duration_ms"
        );
        ensure!(
            (0.0..=1.0).contains(&self.overshoot_probability),
            "overshoot_probability must be between 0.0 and 1.0"
        );
        ensure!(
            self.base_wpm.is_finite() && self.base_wpm > 0.0,
            "base_wpm must be finite and > 0"
        );
        ensure!(
            self.wpm_variance.is_finite() && self.wpm_variance >= 0.0,
            "wpm_variance must be finite and >= 0"
        );
        ensure!(
            (0.0..=1.0).contains(&self.typo_rate),
            "typo_rate must be between 0.0 and 1.0"
        );
        ensure!(
            self.healing_max_delta_px > 0,
            "healing_max_delta_px must be > 0"
        );
        ensure!(
            self.consecutive_failure_threshold >= 1,
            "consecutive_failure_threshold must be >= 1"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
