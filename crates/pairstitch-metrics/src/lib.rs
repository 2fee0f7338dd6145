#![deny(unsafe_code)]

//! Diagnostic categories, stitching metrics, and a TSV writer for pairstitch.
//!
//! This crate provides:
//! - [`diagnostic`] with the named soft-failure categories a stitcher records
//! - [`stitching`] with the per-engine [`StitchingMetrics`] counters
//! - [`writer`] for TSV file output

pub mod diagnostic;
pub mod stitching;
pub mod writer;

use serde::{Deserialize, Serialize};

/// Number of decimal places used for float metrics.
pub const FLOAT_PRECISION: usize = 6;

/// Formats a float value with the standard precision for metrics.
///
/// # Example
/// ```
/// use pairstitch_metrics::format_float;
/// assert_eq!(format_float(0.9), "0.900000");
/// ```
#[must_use]
pub fn format_float(value: f64) -> String {
    format!("{value:.FLOAT_PRECISION$}")
}

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type, used in error messages.
    fn metric_name() -> &'static str;
}

/// Common interface for metrics that track processing pipeline counts.
pub trait ProcessingMetrics {
    /// Total number of input items processed.
    fn total_input(&self) -> u64;

    /// Total number of output items produced.
    fn total_output(&self) -> u64;

    /// Total number of items filtered out or rejected.
    fn total_filtered(&self) -> u64;

    /// Processing efficiency as a percentage (output / input * 100).
    fn efficiency(&self) -> f64 {
        if self.total_input() == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "pair counts never exceed 2^53")]
            let result = self.total_output() as f64 / self.total_input() as f64 * 100.0;
            result
        }
    }
}

pub use diagnostic::{StitchDiagnostic, format_count};
pub use stitching::{StitchingKvMetric, StitchingMetrics};
pub use writer::{write_metrics, write_metrics_auto};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(0.0), "0.000000");
        assert_eq!(format_float(1.0 / 3.0), "0.333333");
    }

    #[test]
    fn test_efficiency_zero_input() {
        let metrics = StitchingMetrics::default();
        assert!(metrics.efficiency().abs() < f64::EPSILON);
    }
}
