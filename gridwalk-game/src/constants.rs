//! Centralized tuning constants for Grid Walk runs.
//!
//! Defaults used when a caller does not supply a value of its own. Keeping
//! them together means the cadence and bias can only change through code.

/// Milliseconds between two scheduled ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 300;

/// Vertical threshold applied when a run configuration omits one.
pub const DEFAULT_VERTICAL_THRESHOLD: i64 = 5;

/// Start column (0-based) applied when a run configuration omits one.
pub const DEFAULT_START_COLUMN: usize = 0;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_RUN: &str = "gridwalk::run";
pub(crate) const LOG_TARGET_ENGINE: &str = "gridwalk::engine";
