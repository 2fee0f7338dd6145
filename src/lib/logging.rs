//! Logging helpers for stitching run summaries.
//!
//! Logger initialisation belongs to the host binary; this module only emits
//! records through the `log` facade.

use pairstitch_metrics::{StitchingMetrics, format_count};

/// Formats a fraction as a percentage with `decimals` decimal places.
///
/// # Examples
///
/// ```
/// use pairstitch_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(0.5, 1), "50.0%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Logs a formatted summary of stitching metrics at info level.
///
/// # Examples
///
/// ```no_run
/// use pairstitch_lib::logging::log_stitching_summary;
/// use pairstitch_metrics::StitchingMetrics;
///
/// let mut metrics = StitchingMetrics::new();
/// metrics.pairs_attempted = 10_000;
/// metrics.pairs_stitched = 8_000;
///
/// log_stitching_summary(&metrics);
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn log_stitching_summary(metrics: &StitchingMetrics) {
    log::info!("Stitching Summary:");
    log::info!("  Pairs attempted: {}", format_count(metrics.pairs_attempted));
    log::info!("  Pairs stitched: {}", format_count(metrics.pairs_stitched));

    if metrics.pairs_attempted > 0 {
        let rate = metrics.pairs_stitched as f64 / metrics.pairs_attempted as f64;
        log::info!("  Stitch rate: {}", format_percent(rate, 2));
    }

    if metrics.pairs_stitched > 0 {
        log::info!("  Stitched bases: {}", format_count(metrics.stitched_bases));
    }

    let ignored = metrics.ignored_probe_prefix_bases + metrics.ignored_probe_suffix_bases;
    if ignored > 0 {
        log::info!(
            "  Ignored probe bases: {} prefix, {} suffix",
            format_count(metrics.ignored_probe_prefix_bases),
            format_count(metrics.ignored_probe_suffix_bases)
        );
    }

    if metrics.footprints_built > 0 {
        log::info!("  Footprints built: {}", format_count(metrics.footprints_built));
    }

    let summary = metrics.diagnostic_summary();
    if !summary.is_empty() {
        log::info!("  Diagnostics:");
        let mut sorted: Vec<_> = summary.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.key().cmp(b.0.key())));

        for (diagnostic, count) in sorted {
            log::info!("    {}: {}", diagnostic.description(), format_count(*count));
        }
    }
}
