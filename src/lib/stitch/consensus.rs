//! Consensus base calling over merged units.

use std::cmp::Ordering;

use noodles::sam::alignment::record::cigar::Op;
use pairstitch_metrics::StitchDiagnostic;

use super::reconcile::{MergedUnit, Source};
use crate::cigar::{consumes_read, read_length};
use crate::errors::{Result, StitchError};
use crate::options::StitcherOptions;
use crate::phred::{NO_CALL_BASE, NO_CALL_QUALITY, PhredScore, sum_phred};
use crate::read::{Direction, Read};

/// Consensus bases and qualities of a stitched read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsensusBases {
    /// Called bases
    pub bases: Vec<u8>,
    /// Called qualities
    pub qualities: Vec<PhredScore>,
}

/// Walks the merged units with one read cursor per mate and calls a base for
/// every unit that consumes a read base.
///
/// # Errors
///
/// Returns [`StitchError::InconsistentOperations`] if a unit asks for a base past
/// the end of its source mate.
pub fn build_consensus(
    units: &[MergedUnit],
    reads: [&Read; 2],
    options: &StitcherOptions,
) -> Result<ConsensusBases> {
    let mut consensus = ConsensusBases {
        bases: Vec::with_capacity(units.len()),
        qualities: Vec::with_capacity(units.len()),
    };
    let mut cursors = [0usize; 2];

    for unit in units {
        if consumes_read(unit.kind) {
            let (base, qual) = match unit.source {
                Source::Read1 => observation(reads, 0, cursors[0])?,
                Source::Read2 => observation(reads, 1, cursors[1])?,
                Source::Both => {
                    let first = observation(reads, 0, cursors[0])?;
                    let second = observation(reads, 1, cursors[1])?;
                    let directions = [reads[0].direction_at(cursors[0]), reads[1].direction_at(cursors[1])];
                    call_stitched_base(first, second, directions, options)
                }
            };
            consensus.bases.push(base);
            consensus.qualities.push(qual);
        }

        for (cursor, advance) in cursors.iter_mut().zip(unit.consumed) {
            if advance {
                *cursor += 1;
            }
        }
    }

    Ok(consensus)
}

fn observation(reads: [&Read; 2], mate: usize, offset: usize) -> Result<(u8, PhredScore)> {
    let read = reads[mate];
    match (read.bases().get(offset), read.qualities().get(offset)) {
        (Some(&base), Some(&qual)) => Ok((base, qual)),
        _ => Err(StitchError::InconsistentOperations {
            mate: if mate == 0 { "read1" } else { "read2" }.to_string(),
            offset,
        }),
    }
}

/// Calls one base observed by both mates.
///
/// Agreeing bases sum their qualities (capped at Q93). Disagreeing bases become a
/// no-call when `nify_disagreements` is set; otherwise the higher-quality base
/// wins, keeping its quality only if the other observation is below
/// `min_base_call_quality`. Equal qualities go to the forward-reading mate, or to
/// read 1 when that does not decide.
#[must_use]
pub fn call_stitched_base(
    first: (u8, PhredScore),
    second: (u8, PhredScore),
    directions: [Direction; 2],
    options: &StitcherOptions,
) -> (u8, PhredScore) {
    let (base1, qual1) = first;
    let (base2, qual2) = second;

    if base1.eq_ignore_ascii_case(&base2) {
        return (base1, sum_phred(qual1, qual2));
    }
    if options.nify_disagreements {
        return (NO_CALL_BASE, NO_CALL_QUALITY);
    }

    let first_wins = match qual1.cmp(&qual2) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            !(directions[1] == Direction::Forward && directions[0] != Direction::Forward)
        }
    };
    let ((base, qual), loser_qual) = if first_wins { (first, qual2) } else { (second, qual1) };

    if loser_qual < options.min_base_call_quality {
        (base, qual)
    } else {
        (base, NO_CALL_QUALITY)
    }
}

/// Checks that the merged operations describe exactly `num_bases` bases.
///
/// # Errors
///
/// Returns [`StitchDiagnostic::BaseCountMismatch`] (as an unstitchable error).
pub fn check_base_count(cigar: &[Op], num_bases: usize) -> Result<()> {
    if read_length(cigar) == num_bases {
        Ok(())
    } else {
        Err(StitchDiagnostic::BaseCountMismatch.into())
    }
}
