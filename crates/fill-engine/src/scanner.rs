//! Document scanning with a short-lived cache
//!
//! A scan is one round-trip to the host. Results are kept for a fixed TTL so
//! repeated checks against an unchanged document don't re-read it. Any write
//! must call [`ScanCache::invalidate`] before the next read is trusted.

use shared_types::{Control, RawControl};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::HostError;

/// Controls grouped by the field id they represent
pub type ControlMap = HashMap<String, Vec<Control>>;

#[derive(Debug)]
struct CacheEntry {
    controls: Arc<[Control]>,
    by_field: Option<Arc<ControlMap>>,
    fetched_at: Instant,
}

/// The most recent scan, its derived field map, and when it was taken
#[derive(Debug)]
pub struct ScanCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl ScanCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Cached controls if the entry is younger than the TTL
    pub fn fresh(&self) -> Option<Arc<[Control]>> {
        self.fresh_entry().map(|e| Arc::clone(&e.controls))
    }

    fn fresh_entry(&self) -> Option<&CacheEntry> {
        self.entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
    }

    /// Replace the cache with a new scan
    pub fn store(&mut self, controls: Vec<Control>) -> Arc<[Control]> {
        let controls: Arc<[Control]> = controls.into();
        self.entry = Some(CacheEntry {
            controls: Arc::clone(&controls),
            by_field: None,
            fetched_at: Instant::now(),
        });
        controls
    }

    /// Field map for the cached scan, built once per entry
    pub fn field_map(&mut self) -> Option<Arc<ControlMap>> {
        let ttl = self.ttl;
        let entry = self
            .entry
            .as_mut()
            .filter(|e| e.fetched_at.elapsed() < ttl)?;
        if entry.by_field.is_none() {
            entry.by_field = Some(Arc::new(group_by_field(&entry.controls)));
        }
        entry.by_field.clone()
    }

    /// Drop the cached scan and its field map
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("Scan cache invalidated");
        }
    }

    pub fn is_populated(&self) -> bool {
        self.entry.is_some()
    }
}

/// Result of a scan for read-only callers
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// Served from the cache without touching the host
    Cached(Arc<[Control]>),
    /// Read from the host just now
    Fresh(Arc<[Control]>),
    /// The host read failed; there are no controls to report
    Failed(HostError),
}

impl ScanOutcome {
    /// Controls found, empty when the scan failed
    pub fn controls(&self) -> &[Control] {
        match self {
            ScanOutcome::Cached(controls) | ScanOutcome::Fresh(controls) => &controls[..],
            ScanOutcome::Failed(_) => &[],
        }
    }

    pub fn shared(&self) -> Option<&Arc<[Control]>> {
        match self {
            ScanOutcome::Cached(controls) | ScanOutcome::Fresh(controls) => Some(controls),
            ScanOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&HostError> {
        match self {
            ScanOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, ScanOutcome::Cached(_))
    }
}

/// Interpret raw host regions, dropping the ones with neither tag nor label
pub fn interpret_controls(raw: &[RawControl], unfilled_markers: &[String]) -> Vec<Control> {
    raw.iter()
        .filter_map(|r| {
            let control = Control::from_raw(r, unfilled_markers);
            if control.is_none() {
                tracing::debug!(control_id = %r.id, "Ignoring control without tag or label");
            }
            control
        })
        .collect()
}

/// Group controls by field id, keeping document order within each group
pub fn group_by_field(controls: &[Control]) -> ControlMap {
    let mut map: ControlMap = HashMap::new();
    for control in controls {
        map.entry(control.key.field_id.clone())
            .or_default()
            .push(control.clone());
    }
    map
}
