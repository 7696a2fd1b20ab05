use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::Point;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateType {
    /// Never expected to move.
    Static,
    /// May drift between sessions.
    Dynamic,
}

/// One recalibration, appended to an entry's history and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingEvent {
    pub timestamp: DateTime<Utc>,
    pub old_coords: Option<Point>,
    pub new_coords: Point,
    /// Per-axis movement, `None` when there were no prior coordinates.
    pub delta: Option<(i32, i32)>,
    pub trigger: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, Value>,
}

/// Per-step record. Entries are created on first success, failure, or seed
/// and never deleted, so the healing history stays auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateEntry {
    /// `None` until the step has a known position (placeholder entries
    /// created by failures on unseen steps start without one).
    pub x: Option<i32>,
    pub y: Option<i32>,
    #[serde(rename = "type")]
    pub kind: CoordinateType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_x_range: Option<(i32, i32)>,
    pub success_count: u64,
    pub failure_count: u64,
    pub consecutive_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_healed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub healing_history: Vec<HealingEvent>,
}

impl CoordinateEntry {
    fn placeholder(description: &str) -> Self {
        Self {
            x: None,
            y: None,
            kind: CoordinateType::Dynamic,
            description: description.to_string(),
            expected_x_range: None,
            success_count: 0,
            failure_count: 0,
            consecutive_failures: 0,
            last_verified: None,
            last_healed: None,
            healing_history: Vec::new(),
        }
    }

    pub fn coordinates(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Aggregate counters, maintained incrementally and persisted with the
/// entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateStoreStats {
    pub total_clicks: u64,
    pub successful_clicks: u64,
    pub failed_clicks: u64,
    pub healing_events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_healing: Option<DateTime<Utc>>,
}

/// Durable snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    platform: String,
    resolution: (u32, u32),
    last_updated: DateTime<Utc>,
    coordinates: BTreeMap<String, CoordinateEntry>,
    stats: CoordinateStoreStats,
}

/// Persistent, thread-safe cache of "where do we click for step X".
///
/// One mutex guards both the in-memory map and the on-disk write, so a
/// failure recording and the should-heal decision it produces are a single
/// atomic unit. Every mutation persists before returning; persistence
/// failures are logged and swallowed because the in-memory state is the
/// source of truth for the running process.
pub struct CoordinateStore {
    path: PathBuf,
    heal_threshold: u32,
    inner: Mutex<StoreFile>,
}

impl CoordinateStore {
    /// Open an existing store file or start a fresh one.
    pub fn open(
        path: impl Into<PathBuf>,
        platform: &str,
        resolution: (u32, u32),
        heal_threshold: u32,
    ) -> Result<Self> {
        let path = path.into();

        let inner = if path.exists() {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file: StoreFile = serde_json::from_str(&json)
                .with_context(|| format!("failed to parse store {}", path.display()))?;
            anyhow::ensure!(
                file.schema_version == SCHEMA_VERSION,
                "unsupported store schema version {} (expected {})",
                file.schema_version,
                SCHEMA_VERSION
            );
            info!(
                path = %path.display(),
                steps = file.coordinates.len(),
                "loaded coordinate store"
            );
            file
        } else {
            StoreFile {
                schema_version: SCHEMA_VERSION,
                platform: platform.to_string(),
                resolution,
                last_updated: Utc::now(),
                coordinates: BTreeMap::new(),
                stats: CoordinateStoreStats::default(),
            }
        };

        Ok(Self {
            path,
            heal_threshold,
            inner: Mutex::new(inner),
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.inner.lock().resolution
    }

    pub fn get_coordinates(&self, step: &str) -> Option<Point> {
        self.inner
            .lock()
            .coordinates
            .get(step)
            .and_then(CoordinateEntry::coordinates)
    }

    pub fn expected_x_range(&self, step: &str) -> Option<(i32, i32)> {
        self.inner
            .lock()
            .coordinates
            .get(step)
            .and_then(|e| e.expected_x_range)
    }

    /// Record a click that worked. Resets the consecutive-failure counter
    /// and silently adopts the actual click point when it drifted from the
    /// cached one. Creates the entry if the step was never seeded.
    pub fn record_success(&self, step: &str, actual: Point) {
        let mut inner = self.inner.lock();
        let entry = inner.coordinates.entry(step.to_string()).or_insert_with(|| {
            debug!(step, "recording success for unseeded step; creating entry");
            CoordinateEntry::placeholder("auto-created on first success")
        });

        if entry.coordinates() != Some(actual) {
            if let Some(old) = entry.coordinates() {
                debug!(
                    step,
                    old = ?(old.x, old.y),
                    new = ?(actual.x, actual.y),
                    "drift correction from successful click"
                );
            }
            entry.x = Some(actual.x);
            entry.y = Some(actual.y);
        }
        entry.success_count += 1;
        entry.consecutive_failures = 0;
        entry.last_verified = Some(Utc::now());

        inner.stats.total_clicks += 1;
        inner.stats.successful_clicks += 1;

        self.persist_or_log(&mut inner);
    }

    /// Record a click that failed and decide, in the same critical section,
    /// whether the step now needs healing.
    pub fn record_failure(&self, step: &str) -> bool {
        let mut inner = self.inner.lock();
        let threshold = self.heal_threshold;
        let entry = inner.coordinates.entry(step.to_string()).or_insert_with(|| {
            debug!(step, "recording failure for unseen step; creating placeholder");
            CoordinateEntry::placeholder("auto-created on first failure")
        });

        entry.failure_count += 1;
        entry.consecutive_failures += 1;
        let heal_required = entry.consecutive_failures >= threshold;

        if heal_required {
            warn!(
                step,
                consecutive = entry.consecutive_failures,
                "consecutive failure threshold reached; healing required"
            );
        }

        inner.stats.total_clicks += 1;
        inner.stats.failed_clicks += 1;

        self.persist_or_log(&mut inner);
        heal_required
    }

    /// Read-only check of the same threshold `record_failure` applies.
    pub fn should_heal(&self, step: &str) -> bool {
        self.inner
            .lock()
            .coordinates
            .get(step)
            .map(|e| e.consecutive_failures >= self.heal_threshold)
            .unwrap_or(false)
    }

    /// Write back a healed coordinate. Appends exactly one healing event,
    /// resets the consecutive-failure counter, and persists.
    pub fn update_coordinates(
        &self,
        step: &str,
        new_coords: Point,
        trigger: &str,
        context: serde_json::Map<String, Value>,
    ) {
        let mut inner = self.inner.lock();
        let entry = inner.coordinates.entry(step.to_string()).or_insert_with(|| {
            warn!(step, "updating coordinates for unknown step; creating entry");
            CoordinateEntry::placeholder("auto-created on heal")
        });

        let old = entry.coordinates();
        let delta = old.map(|o| (new_coords.x - o.x, new_coords.y - o.y));
        let now = Utc::now();

        entry.healing_history.push(HealingEvent {
            timestamp: now,
            old_coords: old,
            new_coords,
            delta,
            trigger: trigger.to_string(),
            context,
        });
        entry.x = Some(new_coords.x);
        entry.y = Some(new_coords.y);
        entry.consecutive_failures = 0;
        entry.last_healed = Some(now);

        inner.stats.healing_events += 1;
        inner.stats.last_healing = Some(now);

        info!(
            step,
            old = ?old.map(|o| (o.x, o.y)),
            new = ?(new_coords.x, new_coords.y),
            trigger,
            "coordinates healed"
        );

        self.persist_or_log(&mut inner);
    }

    /// Seed a step with known coordinates. No-op (with a warning) when the
    /// step already exists.
    pub fn add_coordinate(
        &self,
        step: &str,
        coords: Point,
        kind: CoordinateType,
        description: &str,
        expected_x_range: Option<(i32, i32)>,
    ) {
        let mut inner = self.inner.lock();
        if inner.coordinates.contains_key(step) {
            warn!(step, "add_coordinate called for existing step; ignoring");
            return;
        }

        inner.coordinates.insert(
            step.to_string(),
            CoordinateEntry {
                x: Some(coords.x),
                y: Some(coords.y),
                kind,
                description: description.to_string(),
                expected_x_range,
                success_count: 0,
                failure_count: 0,
                consecutive_failures: 0,
                last_verified: None,
                last_healed: None,
                healing_history: Vec::new(),
            },
        );

        self.persist_or_log(&mut inner);
    }

    pub fn get_stats(&self) -> CoordinateStoreStats {
        self.inner.lock().stats.clone()
    }

    pub fn get_all_steps(&self) -> Vec<String> {
        self.inner.lock().coordinates.keys().cloned().collect()
    }

    pub fn get_entry(&self, step: &str) -> Option<CoordinateEntry> {
        self.inner.lock().coordinates.get(step).cloned()
    }

    fn persist_or_log(&self, inner: &mut StoreFile) {
        if let Err(err) = self.persist(inner) {
            // In-memory state stays authoritative; the next mutation
            // retries the write.
            warn!(
                path = %self.path.display(),
                error = %format!("{err:#}"),
                "failed to persist coordinate store"
            );
        }
    }

    /// Atomic snapshot write: back up the previous file, write a temp file,
    /// rename it into place.
    fn persist(&self, inner: &mut StoreFile) -> Result<()> {
        inner.last_updated = Utc::now();
        let json = serde_json::to_string_pretty(inner).context("failed to serialize store")?;

        if self.path.exists() {
            let backup = backup_path(&self.path);
            fs::copy(&self.path, &backup)
                .with_context(|| format!("failed to back up to {}", backup.display()))?;
        }

        let tmp = temp_path(&self.path);
        fs::write(&tmp, json)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to rename into {}", self.path.display()))?;

        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".bak");
    PathBuf::from(os)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
