//! Metrics for read-pair stitching.
//!
//! A [`StitchingMetrics`] is owned by each stitching engine and incremented as
//! pairs are processed. Engines running on separate workers are combined with
//! [`StitchingMetrics::merge`] before reporting.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::diagnostic::StitchDiagnostic;
use crate::{Metric, ProcessingMetrics, format_float};

/// A key-value-description metric row for vertical metric output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchingKvMetric {
    /// The metric key/name
    pub key: String,
    /// The metric value (as a string for TSV output)
    pub value: String,
    /// Human-readable description of the metric
    pub description: String,
}

impl StitchingKvMetric {
    /// Creates a new key-value-description metric.
    #[must_use]
    pub fn new(key: impl Into<String>, value: String, description: impl Into<String>) -> Self {
        Self { key: key.into(), value, description: description.into() }
    }
}

/// Counts of stitching attempts, outcomes, and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchingMetrics {
    /// Mate pairs submitted for stitching
    pub pairs_attempted: u64,
    /// Mate pairs merged into a consensus read
    pub pairs_stitched: u64,
    /// Placeholder (footprint) reads produced
    pub footprints_built: u64,
    /// Read bases contributed by both mates across all stitched reads
    pub stitched_bases: u64,
    /// Probe soft-clip bases excluded at the fragment start
    pub ignored_probe_prefix_bases: u64,
    /// Probe soft-clip bases excluded at the fragment end
    pub ignored_probe_suffix_bases: u64,
    /// Pairs whose aligned spans did not overlap
    pub no_overlap: u64,
    /// Pairs with operations that could not be reconciled
    pub unreconcilable_operations: u64,
    /// Pairs with an ambiguously placed insertion
    pub ambiguous_indel: u64,
    /// Pairs whose merged operations had an internal soft clip
    pub internal_softclip: u64,
    /// Pairs whose merged operations did not match the emitted bases
    pub base_count_mismatch: u64,
    /// Stitched reads whose reference length differed from the mates' span
    pub length_mismatch: u64,
    /// Stitched reads whose operations differed from an upstream hint
    pub hint_disagreement: u64,
}

impl StitchingMetrics {
    /// Creates a new metrics struct with all counts zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `diagnostic`.
    pub fn record(&mut self, diagnostic: StitchDiagnostic) {
        *self.counter_mut(diagnostic) += 1;
    }

    /// Returns the count recorded for `diagnostic`.
    #[must_use]
    pub fn count(&self, diagnostic: StitchDiagnostic) -> u64 {
        match diagnostic {
            StitchDiagnostic::NoOverlap => self.no_overlap,
            StitchDiagnostic::UnreconcilableOperations => self.unreconcilable_operations,
            StitchDiagnostic::AmbiguousIndel => self.ambiguous_indel,
            StitchDiagnostic::InternalSoftclip => self.internal_softclip,
            StitchDiagnostic::BaseCountMismatch => self.base_count_mismatch,
            StitchDiagnostic::LengthMismatch => self.length_mismatch,
            StitchDiagnostic::HintDisagreement => self.hint_disagreement,
        }
    }

    fn counter_mut(&mut self, diagnostic: StitchDiagnostic) -> &mut u64 {
        match diagnostic {
            StitchDiagnostic::NoOverlap => &mut self.no_overlap,
            StitchDiagnostic::UnreconcilableOperations => &mut self.unreconcilable_operations,
            StitchDiagnostic::AmbiguousIndel => &mut self.ambiguous_indel,
            StitchDiagnostic::InternalSoftclip => &mut self.internal_softclip,
            StitchDiagnostic::BaseCountMismatch => &mut self.base_count_mismatch,
            StitchDiagnostic::LengthMismatch => &mut self.length_mismatch,
            StitchDiagnostic::HintDisagreement => &mut self.hint_disagreement,
        }
    }

    /// Total pairs left unstitched for any reason.
    #[must_use]
    pub fn total_failures(&self) -> u64 {
        StitchDiagnostic::ALL.iter().filter(|d| d.is_failure()).map(|d| self.count(*d)).sum()
    }

    /// Returns the non-zero diagnostic counts.
    #[must_use]
    pub fn diagnostic_summary(&self) -> HashMap<StitchDiagnostic, u64> {
        StitchDiagnostic::ALL
            .iter()
            .map(|d| (*d, self.count(*d)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Adds the counts from `other` into this struct.
    pub fn merge(&mut self, other: &Self) {
        self.pairs_attempted += other.pairs_attempted;
        self.pairs_stitched += other.pairs_stitched;
        self.footprints_built += other.footprints_built;
        self.stitched_bases += other.stitched_bases;
        self.ignored_probe_prefix_bases += other.ignored_probe_prefix_bases;
        self.ignored_probe_suffix_bases += other.ignored_probe_suffix_bases;
        for diagnostic in StitchDiagnostic::ALL {
            *self.counter_mut(diagnostic) += other.count(diagnostic);
        }
    }

    /// Resets all counts to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Converts the metrics to key-value-description rows.
    ///
    /// Diagnostic rows are only included when non-zero.
    #[must_use]
    pub fn to_kv_metrics(&self) -> Vec<StitchingKvMetric> {
        let frac_stitched = if self.pairs_attempted == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "pair counts never exceed 2^53")]
            let frac = self.pairs_stitched as f64 / self.pairs_attempted as f64;
            frac
        };

        let core = [
            ("pairs_attempted", self.pairs_attempted.to_string(), "Mate pairs submitted for stitching"),
            ("pairs_stitched", self.pairs_stitched.to_string(), "Mate pairs merged into one read"),
            ("frac_pairs_stitched", format_float(frac_stitched), "Fraction of mate pairs merged into one read"),
            ("pairs_unstitched", self.total_failures().to_string(), "Mate pairs left unstitched"),
            ("stitched_bases", self.stitched_bases.to_string(), "Read bases observed by both mates"),
            ("ignored_probe_prefix_bases", self.ignored_probe_prefix_bases.to_string(), "Probe soft-clip bases ignored at the fragment start"),
            ("ignored_probe_suffix_bases", self.ignored_probe_suffix_bases.to_string(), "Probe soft-clip bases ignored at the fragment end"),
        ];
        let mut metrics: Vec<_> = core
            .into_iter()
            .map(|(key, value, description)| StitchingKvMetric::new(key, value, description))
            .collect();

        for diagnostic in StitchDiagnostic::ALL {
            let count = self.count(diagnostic);
            if count > 0 {
                metrics.push(StitchingKvMetric::new(
                    diagnostic.key(),
                    count.to_string(),
                    diagnostic.description(),
                ));
            }
        }

        if self.footprints_built > 0 {
            metrics.push(StitchingKvMetric::new(
                "footprints_built",
                self.footprints_built.to_string(),
                "Placeholder reads built without base-level consensus",
            ));
        }

        metrics
    }
}

impl Metric for StitchingMetrics {
    fn metric_name() -> &'static str {
        "stitching"
    }
}

impl ProcessingMetrics for StitchingMetrics {
    fn total_input(&self) -> u64 {
        self.pairs_attempted
    }

    fn total_output(&self) -> u64 {
        self.pairs_stitched
    }

    fn total_filtered(&self) -> u64 {
        self.total_failures()
    }
}
