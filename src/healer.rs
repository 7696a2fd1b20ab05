use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HumanizeConfig;
use crate::model::Point;
use crate::store::CoordinateStore;

/// Confidence assumed when the oracle does not report one.
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// A captured screen image. The healer treats the pixel data as opaque; only
/// the dimensions matter to it.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Screenshot collaborator. Implementations own their transport and must
/// fail with an error (not hang) when capture times out.
pub trait ScreenCapture: Send + Sync {
    fn capture(&self) -> Result<Bitmap>;
}

/// Answer to a "where is this element" query.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionResponse {
    pub found: bool,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub confidence: Option<f64>,
}

/// Vision oracle collaborator: locates an element described in natural
/// language within a bitmap. Expensive; invoked only when healing.
pub trait VisionOracle: Send + Sync {
    fn locate(&self, bitmap: &Bitmap, description: &str) -> Result<VisionResponse>;
}

/// Why a healing attempt produced no new coordinates. The cache is left
/// untouched in every one of these cases.
#[derive(Debug, Error)]
pub enum HealError {
    #[error("screenshot capture failed: {0}")]
    Screenshot(String),
    #[error("failed to save debug screenshot: {0}")]
    DebugCopy(String),
    #[error("vision oracle error: {0}")]
    Oracle(String),
    #[error("vision oracle could not find element: {description}")]
    NotFound { description: String },
    #[error("candidate ({x}, {y}) outside screen bounds {width}x{height}")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    #[error("candidate x {x} outside expected range [{min}, {max}]")]
    OutsideExpectedRange { x: i32, min: i32, max: i32 },
    #[error("candidate delta ({dx}, {dy}) from prior coordinates exceeds {max_px} px; likely the wrong element")]
    DeltaTooLarge { dx: i32, dy: i32, max_px: i32 },
}

/// Outcome of a successful heal.
#[derive(Debug, Clone, PartialEq)]
pub struct HealSuccess {
    pub coordinates: Point,
    pub confidence: f64,
    /// Per-axis movement from the prior coordinates, `None` when the step
    /// had no known position before.
    pub delta: Option<(i32, i32)>,
    pub screenshot_path: PathBuf,
}

/// Vision-assisted recalibration of a drifted coordinate.
///
/// One invocation runs capture -> debug copy -> oracle query -> validation,
/// and on acceptance writes back through [`CoordinateStore::update_coordinates`].
/// Both collaborator calls block, so run healing on a worker thread rather
/// than the input hot path; unrelated steps keep clicking meanwhile.
pub struct SelfHealer {
    screen: Box<dyn ScreenCapture>,
    oracle: Box<dyn VisionOracle>,
    screen_bounds: (u32, u32),
    max_delta_px: i32,
    debug_dir: PathBuf,
}

impl SelfHealer {
    pub fn new(
        screen: Box<dyn ScreenCapture>,
        oracle: Box<dyn VisionOracle>,
        screen_bounds: (u32, u32),
        config: &HumanizeConfig,
        debug_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            screen,
            oracle,
            screen_bounds,
            max_delta_px: config.healing_max_delta_px,
            debug_dir: debug_dir.into(),
        }
    }

    /// Attempt to heal `step`, writing the accepted coordinate back through
    /// the store. On any failure the store is left exactly as it was.
    pub fn heal(
        &self,
        store: &CoordinateStore,
        step: &str,
        description: &str,
    ) -> Result<HealSuccess, HealError> {
        info!(step, description, "healing started");

        let bitmap = self.screen.capture().map_err(|err| {
            warn!(step, error = %format!("{err:#}"), "healing aborted: no screenshot");
            HealError::Screenshot(format!("{err:#}"))
        })?;

        let screenshot_path = self.save_debug_copy(step, &bitmap).map_err(|err| {
            warn!(step, error = %format!("{err:#}"), "healing aborted: debug copy failed");
            HealError::DebugCopy(format!("{err:#}"))
        })?;

        let response = self.oracle.locate(&bitmap, description).map_err(|err| {
            warn!(step, error = %format!("{err:#}"), "healing aborted: oracle error");
            HealError::Oracle(format!("{err:#}"))
        })?;

        if !response.found {
            warn!(step, description, "healing aborted: element not found");
            return Err(HealError::NotFound {
                description: description.to_string(),
            });
        }

        let (Some(x), Some(y)) = (response.x, response.y) else {
            return Err(HealError::Oracle(
                "oracle reported found without coordinates".to_string(),
            ));
        };
        let candidate = Point::new(x, y);

        let prior = store.get_coordinates(step);
        let expected_x_range = store.expected_x_range(step);
        self.validate_candidate(candidate, expected_x_range, prior)
            .map_err(|err| {
                warn!(
                    step,
                    candidate = ?(candidate.x, candidate.y),
                    reason = %err,
                    "healing candidate rejected"
                );
                err
            })?;

        let confidence = response.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let delta = prior.map(|p| (candidate.x - p.x, candidate.y - p.y));

        let mut context = Map::new();
        context.insert("confidence".to_string(), json!(confidence));
        context.insert("element_description".to_string(), json!(description));
        context.insert(
            "screenshot".to_string(),
            json!(screenshot_path.display().to_string()),
        );

        store.update_coordinates(step, candidate, "vision_heal", context);

        info!(
            step,
            new = ?(candidate.x, candidate.y),
            ?delta,
            confidence,
            "healing succeeded"
        );

        Ok(HealSuccess {
            coordinates: candidate,
            confidence,
            delta,
            screenshot_path,
        })
    }

    /// All three rules must pass: screen bounds, declared expected-x range,
    /// and maximum per-axis delta from the prior coordinates.
    fn validate_candidate(
        &self,
        candidate: Point,
        expected_x_range: Option<(i32, i32)>,
        prior: Option<Point>,
    ) -> Result<(), HealError> {
        let (width, height) = self.screen_bounds;
        if candidate.x < 0
            || candidate.y < 0
            || candidate.x >= width as i32
            || candidate.y >= height as i32
        {
            return Err(HealError::OutOfBounds {
                x: candidate.x,
                y: candidate.y,
                width,
                height,
            });
        }

        if let Some((min, max)) = expected_x_range {
            if candidate.x < min || candidate.x > max {
                return Err(HealError::OutsideExpectedRange {
                    x: candidate.x,
                    min,
                    max,
                });
            }
        }

        if let Some(prior) = prior {
            let dx = candidate.x - prior.x;
            let dy = candidate.y - prior.y;
            if dx.abs() > self.max_delta_px || dy.abs() > self.max_delta_px {
                return Err(HealError::DeltaTooLarge {
                    dx,
                    dy,
                    max_px: self.max_delta_px,
                });
            }
        }

        Ok(())
    }

    fn save_debug_copy(&self, step: &str, bitmap: &Bitmap) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.debug_dir)?;
        let filename = format!(
            "heal-{}-{}.raw",
            sanitize_step(step),
            Utc::now().format("%Y%m%dT%H%M%S%3f")
        );
        let path = self.debug_dir.join(filename);
        std::fs::write(&path, &bitmap.data)?;
        debug!(
            step,
            path = %path.display(),
            width = bitmap.width,
            height = bitmap.height,
            "saved debug screenshot"
        );
        Ok(path)
    }
}

fn sanitize_step(step: &str) -> String {
    step.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        })
        .collect()
}
