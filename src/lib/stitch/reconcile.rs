//! Site reconciliation.
//!
//! Walks the bins in reference order and combines the two mates' units into a
//! single merged unit per position, deciding the merged operation, which mate(s)
//! supply the base, and the direction of the merged unit.

use noodles::sam::alignment::record::cigar::op::Kind;
use pairstitch_metrics::StitchDiagnostic;

use super::bins::ReferenceBin;
use crate::cigar::consumes_read;
use crate::errors::{Result, StitchError};
use crate::options::StitcherOptions;
use crate::read::{Direction, Read};

/// Which mate(s) supply the base of a merged unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Read 1 alone
    Read1,
    /// Read 2 alone
    Read2,
    /// Both mates
    Both,
}

impl Source {
    fn single(mate: usize) -> Self {
        if mate == 0 { Self::Read1 } else { Self::Read2 }
    }
}

/// One unit of the merged alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedUnit {
    /// Merged operation
    pub kind: Kind,
    /// Direction of the merged unit
    pub direction: Direction,
    /// Mate(s) supplying the base
    pub source: Source,
    /// Whether each mate's read cursor moves past a base at this unit
    pub consumed: [bool; 2],
}

/// Per-call counters gathered while reconciling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    /// Probe clip units excluded at the fragment start
    pub ignored_probe_prefix_bases: usize,
    /// Probe clip units excluded at the fragment end
    pub ignored_probe_suffix_bases: usize,
    /// Read-consuming units supplied by both mates
    pub stitched_bases: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeEnd {
    Prefix,
    Suffix,
}

/// Combines bins into merged units.
pub struct Reconciler<'a> {
    options: &'a StitcherOptions,
    reads: [&'a Read; 2],
    /// Mate holding the probe at the fragment start and at the fragment end
    probe_mates: [usize; 2],
    num_bins: usize,
    cursors: [usize; 2],
    counts: ReconcileCounts,
}

impl<'a> Reconciler<'a> {
    /// Creates a reconciler for `reads`.
    ///
    /// `left` is the index of the earlier-starting mate. The fragment-start probe
    /// belongs to that mate, or to the other mate when the pair is outie.
    #[must_use]
    pub fn new(options: &'a StitcherOptions, reads: [&'a Read; 2], left: usize, outie: bool) -> Self {
        let start_probe = if outie { 1 - left } else { left };
        Self {
            options,
            reads,
            probe_mates: [start_probe, 1 - start_probe],
            num_bins: 0,
            cursors: [0, 0],
            counts: ReconcileCounts::default(),
        }
    }

    /// Reconciles every bin, appending merged units to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Unstitchable`] for ambiguous insertions or
    /// irreconcilable operations, and [`StitchError::ConflictingProbeClips`] if
    /// both mates are excluded at the same unit.
    pub fn reconcile(mut self, bins: &[ReferenceBin], out: &mut Vec<MergedUnit>) -> Result<ReconcileCounts> {
        out.clear();
        self.num_bins = bins.len();

        for (index, bin) in bins.iter().enumerate() {
            check_ambiguous_insertion(bins, index)?;

            let has_mapped = bin.has_mapped();
            let width = bin.prefix[0].len().max(bin.prefix[1].len());
            for i in 0..width {
                let unit = |mate: usize| {
                    let run = &bin.prefix[mate];
                    if has_mapped {
                        let pad = width - run.len();
                        i.checked_sub(pad).map(|j| run[j])
                    } else {
                        run.get(i).copied()
                    }
                };
                self.combine(index, [unit(0), unit(1)], out)?;
            }

            if has_mapped {
                self.combine(index, bin.mapped, out)?;
            }
        }

        Ok(self.counts)
    }

    fn probe_end(&self, bin: usize, mate: usize, kind: Option<Kind>) -> Option<ProbeEnd> {
        if !self.options.ignore_probe_softclips || kind != Some(Kind::SoftClip) {
            return None;
        }
        if mate == self.probe_mates[0] && bin < self.options.probe_prefix_window {
            Some(ProbeEnd::Prefix)
        } else if mate == self.probe_mates[1] && self.num_bins - bin <= self.options.probe_suffix_window {
            Some(ProbeEnd::Suffix)
        } else {
            None
        }
    }

    fn combine(&mut self, bin: usize, units: [Option<Kind>; 2], out: &mut Vec<MergedUnit>) -> Result<()> {
        let kind = match units {
            [Some(a), Some(b)] if a == b => a,
            [Some(Kind::SoftClip), Some(k)] | [Some(k), Some(Kind::SoftClip)] => k,
            [Some(_), Some(_)] => return Err(StitchDiagnostic::UnreconcilableOperations.into()),
            [Some(k), None] | [None, Some(k)] => k,
            [None, None] => return Ok(()),
        };

        let probe = [self.probe_end(bin, 0, units[0]), self.probe_end(bin, 1, units[1])];
        if probe[0].is_some() && probe[1].is_some() {
            return Err(StitchError::ConflictingProbeClips { bin });
        }
        for end in probe.iter().flatten() {
            match end {
                ProbeEnd::Prefix => self.counts.ignored_probe_prefix_bases += 1,
                ProbeEnd::Suffix => self.counts.ignored_probe_suffix_bases += 1,
            }
        }
        let excluded = [probe[0].is_some(), probe[1].is_some()];

        let used: [bool; 2] = std::array::from_fn(|m| {
            units[m].is_some_and(|k| k != Kind::SoftClip || self.options.use_softclipped_bases) && !excluded[m]
        });
        let consumed: [bool; 2] = std::array::from_fn(|m| units[m].is_some_and(consumes_read));

        let source = match used {
            [true, true] => Source::Both,
            [true, false] => Source::Read1,
            [false, true] => Source::Read2,
            [false, false] => {
                let fallback = (0..2)
                    .find(|&m| units[m].is_some() && !excluded[m])
                    .or_else(|| (0..2).find(|&m| units[m].is_some()))
                    .unwrap_or(0);
                Source::single(fallback)
            }
        };

        let direction = match source {
            Source::Both => Direction::Stitched,
            Source::Read1 => self.reads[0].direction_at(self.cursors[0]),
            Source::Read2 => self.reads[1].direction_at(self.cursors[1]),
        };

        if source == Source::Both && consumes_read(kind) {
            self.counts.stitched_bases += 1;
        }
        for (cursor, advance) in self.cursors.iter_mut().zip(consumed) {
            if advance {
                *cursor += 1;
            }
        }

        out.push(MergedUnit { kind, direction, source, consumed });
        Ok(())
    }
}

/// Fails when one mate has a pure insertion run that the other mate, aligned on
/// both sides of it, does not report.
fn check_ambiguous_insertion(bins: &[ReferenceBin], index: usize) -> Result<()> {
    let Some(previous) = index.checked_sub(1).map(|i| &bins[i]) else {
        return Ok(());
    };
    let bin = &bins[index];
    for mate in 0..2 {
        let other = 1 - mate;
        let run = &bin.prefix[mate];
        if !run.is_empty()
            && run.iter().all(|&k| k == Kind::Insertion)
            && bin.prefix[other].is_empty()
            && previous.mapped[other].is_some()
            && bin.mapped[other].is_some()
        {
            return Err(StitchDiagnostic::AmbiguousIndel.into());
        }
    }
    Ok(())
}
