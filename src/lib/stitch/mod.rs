//! The read-pair stitching engine.
//!
//! [`ReadStitcher`] merges the two overlapping mates of a fragment into one
//! consensus read. The pipeline per pair is:
//!
//! 1. expand both mates' operations into one unit per aligned position
//! 2. lay the units out in reference-position bins ([`bins`])
//! 3. walk excess terminal soft clips outward ([`softclip`])
//! 4. combine the two mates bin by bin ([`reconcile`])
//! 5. compress the merged units into operations and directions ([`assemble`])
//! 6. call consensus bases and qualities ([`consensus`])
//!
//! Pairs that cannot be merged yield `Ok(None)` and a diagnostic in the engine's
//! [`StitchingMetrics`]; hard errors are reserved for malformed input and
//! exhausted preallocated storage.
//!
//! # Example
//!
//! ```
//! use pairstitch_lib::builder::ReadBuilder;
//! use pairstitch_lib::options::StitcherOptions;
//! use pairstitch_lib::read::MatePair;
//! use pairstitch_lib::stitch::ReadStitcher;
//!
//! let read1 = ReadBuilder::new().position(12341).cigar("1M2I5M").build().unwrap();
//! let read2 = ReadBuilder::new().position(12342).cigar("5M1I2M").build().unwrap();
//! let pair = MatePair::new(read1, read2).unwrap();
//!
//! let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
//! let stitched = stitcher.stitch(&pair).unwrap().unwrap();
//! assert_eq!(stitched.cigar_string(), "1M2I5M1I2M");
//! ```

pub mod assemble;
pub mod bins;
pub mod consensus;
pub mod footprint;
pub mod reconcile;
pub mod softclip;

use noodles::sam::alignment::record::cigar::op::Kind;
use pairstitch_metrics::{StitchDiagnostic, StitchingMetrics};

use crate::cigar::{expand, format_cigar, reference_length};
use crate::errors::{Result, StitchError};
use crate::options::StitcherOptions;
use crate::read::{MatePair, StitchedRead};

pub use assemble::StitchingResult;
use bins::{BinArena, build_bins};
use reconcile::{MergedUnit, Reconciler};

/// Stitching engine with preallocated scratch storage.
///
/// An engine is not shared between concurrent callers; give each worker its own.
pub struct ReadStitcher {
    options: StitcherOptions,
    arena: BinArena,
    units: [Vec<Kind>; 2],
    merged: Vec<MergedUnit>,
    metrics: StitchingMetrics,
}

impl ReadStitcher {
    /// Creates an engine, preallocating `2 * max_read_length - 1` bins.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidParameter`] if the options are invalid.
    pub fn new(options: StitcherOptions) -> Result<Self> {
        options.validate()?;
        let capacity = options.bin_capacity();
        Ok(Self {
            arena: BinArena::new(capacity),
            units: [Vec::with_capacity(options.max_read_length), Vec::with_capacity(options.max_read_length)],
            merged: Vec::with_capacity(capacity),
            metrics: StitchingMetrics::new(),
            options,
        })
    }

    /// The engine's options.
    #[must_use]
    pub fn options(&self) -> &StitcherOptions {
        &self.options
    }

    /// Counters accumulated since creation or the last reset.
    #[must_use]
    pub fn metrics(&self) -> &StitchingMetrics {
        &self.metrics
    }

    /// Clears the accumulated counters.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Stitches a mate pair into a consensus read.
    ///
    /// Returns `Ok(None)` when the mates cannot be merged; the reason is recorded in
    /// [`ReadStitcher::metrics`].
    ///
    /// # Errors
    ///
    /// Returns an error for malformed input (e.g. both mates' probe clips excluded at
    /// the same unit) or when the merged footprint exceeds the preallocated bins.
    pub fn stitch(&mut self, pair: &MatePair) -> Result<Option<StitchedRead>> {
        let outcome = self.merge_operations(pair).and_then(|result| {
            let [read1, read2] = pair.reads();
            let consensus = consensus::build_consensus(&self.merged, [read1, read2], &self.options)?;
            consensus::check_base_count(&result.cigar, consensus.bases.len())?;
            Ok(StitchedRead {
                name: read1.name().or(read2.name()).map(ToString::to_string),
                chromosome: read1.chromosome().to_string(),
                position: pair.reads()[pair.left_index()].position(),
                bases: consensus.bases,
                qualities: consensus.qualities,
                cigar: result.cigar,
                directions: result.directions,
                ignored_probe_prefix_bases: result.ignored_probe_prefix_bases,
                ignored_probe_suffix_bases: result.ignored_probe_suffix_bases,
                stitched_bases: result.stitched_bases,
            })
        });

        let stitched = self.record_outcome(pair, outcome)?;
        if let Some(read) = &stitched {
            log::trace!(
                "Stitched {} into {} ({} bases, {})",
                pair_name(pair),
                read.cigar_string(),
                read.bases.len(),
                read.directions
            );
        }
        Ok(stitched)
    }

    /// Computes only the merged operations and directions of a mate pair.
    ///
    /// Returns `Ok(None)` when the mates cannot be merged.
    ///
    /// # Errors
    ///
    /// As for [`ReadStitcher::stitch`].
    pub fn stitched_cigar(&mut self, pair: &MatePair) -> Result<Option<StitchingResult>> {
        let outcome = self.merge_operations(pair);
        self.record_outcome(pair, outcome)
    }

    /// Builds a placeholder read spanning both mates with no-call bases.
    pub fn footprint(&mut self, pair: &MatePair) -> StitchedRead {
        self.metrics.footprints_built += 1;
        footprint::build_footprint(pair)
    }

    fn record_outcome<T: Stitched>(&mut self, pair: &MatePair, outcome: Result<T>) -> Result<Option<T>> {
        self.metrics.pairs_attempted += 1;
        match outcome {
            Ok(stitched) => {
                self.metrics.pairs_stitched += 1;
                self.metrics.stitched_bases += stitched.stitched_bases() as u64;
                self.metrics.ignored_probe_prefix_bases += stitched.ignored_bases()[0] as u64;
                self.metrics.ignored_probe_suffix_bases += stitched.ignored_bases()[1] as u64;
                Ok(Some(stitched))
            }
            Err(StitchError::Unstitchable(diagnostic)) => {
                self.metrics.record(diagnostic);
                if self.options.debug {
                    log::debug!("Unable to stitch {}: {diagnostic}", pair_name(pair));
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the pipeline up to the merged operations, leaving the merged units in
    /// the engine's scratch buffer.
    fn merge_operations(&mut self, pair: &MatePair) -> Result<StitchingResult> {
        let [read1, read2] = pair.reads();

        let left = pair.left_index();
        let left_start = pair.reads()[left].start();
        let overlap_start = read1.start().max(read2.start());
        let overlap_end = read1.end().min(read2.end());
        if overlap_start > overlap_end {
            return Err(StitchDiagnostic::NoOverlap.into());
        }

        for (units, read) in self.units.iter_mut().zip([read1, read2]) {
            units.clear();
            expand(read.cigar(), units)?;
        }
        let offsets = [read1.start() - left_start, read2.start() - left_start];
        build_bins(&mut self.arena, [&self.units[0], &self.units[1]], offsets)?;
        softclip::redistribute(
            &mut self.arena,
            self.options.allow_terminal_clips_to_support_overlapping_deletions,
        )?;

        let counts = Reconciler::new(&self.options, [read1, read2], left, pair.is_outie())
            .reconcile(self.arena.bins(), &mut self.merged)?;
        let result = assemble::assemble(&self.merged, counts)?;

        let span = read1.end().max(read2.end()) - left_start + 1;
        let merged_span = reference_length(&result.cigar);
        if merged_span != span {
            self.metrics.record(StitchDiagnostic::LengthMismatch);
            log::debug!(
                "Merged operations {} of {} span {merged_span} reference bases, mates span {span}",
                result.cigar_string(),
                pair_name(pair)
            );
        }

        for read in [read1, read2] {
            if let Some(hint) = read.stitched_cigar() {
                if hint != result.cigar.as_slice() {
                    self.metrics.record(StitchDiagnostic::HintDisagreement);
                    log::debug!(
                        "Merged operations {} of {} differ from upstream {}",
                        result.cigar_string(),
                        pair_name(pair),
                        format_cigar(hint)
                    );
                }
            }
        }

        Ok(result)
    }
}

fn pair_name(pair: &MatePair) -> &str {
    pair.read1().name().or(pair.read2().name()).unwrap_or("<unnamed>")
}

/// Successful stitching outputs that feed the engine's counters.
trait Stitched {
    fn stitched_bases(&self) -> usize;
    fn ignored_bases(&self) -> [usize; 2];
}

impl Stitched for StitchedRead {
    fn stitched_bases(&self) -> usize {
        self.stitched_bases
    }

    fn ignored_bases(&self) -> [usize; 2] {
        [self.ignored_probe_prefix_bases, self.ignored_probe_suffix_bases]
    }
}

impl Stitched for StitchingResult {
    fn stitched_bases(&self) -> usize {
        self.stitched_bases
    }

    fn ignored_bases(&self) -> [usize; 2] {
        [self.ignored_probe_prefix_bases, self.ignored_probe_suffix_bases]
    }
}
