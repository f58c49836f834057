//! Engine configuration
//!
//! Defaults suit an interactive task pane; every knob can be overridden
//! from the environment or by the embedding application.

use anyhow::{anyhow, Context, Result};
use shared_types::DatePattern;
use std::time::Duration;

/// How long a scan stays trusted
pub const DEFAULT_SCAN_TTL: Duration = Duration::from_secs(5);

/// Maximum number of undo levels kept
pub const DEFAULT_MAX_UNDO_DEPTH: usize = 20;

/// Stock placeholder text hosts put in freshly inserted controls
pub const DEFAULT_UNFILLED_MARKER: &str = "Click or tap here to enter text.";

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Lifetime of a cached scan
    pub scan_ttl: Duration,
    /// Bound on the undo stack; the oldest entries are dropped first
    pub max_undo_depth: usize,
    /// Date rendering used when a field doesn't choose one
    pub date_pattern: DatePattern,
    /// Currency symbol used when a field doesn't choose one
    pub currency_symbol: String,
    /// Literal texts that mark a control as still unfilled
    pub unfilled_markers: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_ttl: DEFAULT_SCAN_TTL,
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
            date_pattern: DatePattern::default(),
            currency_symbol: "$".to_string(),
            unfilled_markers: vec![DEFAULT_UNFILLED_MARKER.to_string()],
        }
    }
}

impl EngineConfig {
    pub fn with_scan_ttl(mut self, ttl: Duration) -> Self {
        self.scan_ttl = ttl;
        self
    }

    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    pub fn with_date_pattern(mut self, pattern: DatePattern) -> Self {
        self.date_pattern = pattern;
        self
    }

    pub fn with_unfilled_marker(mut self, marker: impl Into<String>) -> Self {
        self.unfilled_markers.push(marker.into());
        self
    }

    /// Load configuration from environment variables
    ///
    /// Recognized variables:
    /// - TEMPLATE_FILL_SCAN_TTL_MS: scan cache lifetime in milliseconds
    /// - TEMPLATE_FILL_MAX_UNDO_DEPTH: number of undo levels kept
    /// - TEMPLATE_FILL_DATE_PATTERN: long, long_ordinal, day_month_year, us, eu or iso
    /// - TEMPLATE_FILL_CURRENCY_SYMBOL: currency symbol, e.g. "$"
    ///
    /// Unset variables keep their defaults; malformed values are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(ttl) = lookup("TEMPLATE_FILL_SCAN_TTL_MS") {
            let millis: u64 = ttl
                .trim()
                .parse()
                .with_context(|| format!("Invalid TEMPLATE_FILL_SCAN_TTL_MS: {}", ttl))?;
            config.scan_ttl = Duration::from_millis(millis);
        }

        if let Some(depth) = lookup("TEMPLATE_FILL_MAX_UNDO_DEPTH") {
            config.max_undo_depth = depth
                .trim()
                .parse()
                .with_context(|| format!("Invalid TEMPLATE_FILL_MAX_UNDO_DEPTH: {}", depth))?;
        }

        if let Some(pattern) = lookup("TEMPLATE_FILL_DATE_PATTERN") {
            config.date_pattern = DatePattern::from_name(pattern.trim())
                .ok_or_else(|| anyhow!("Unknown date pattern: {}", pattern))?;
        }

        if let Some(symbol) = lookup("TEMPLATE_FILL_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        Ok(config)
    }
}
