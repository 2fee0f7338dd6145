//! Merged operation and direction assembly.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use pairstitch_metrics::StitchDiagnostic;

use super::reconcile::{MergedUnit, ReconcileCounts};
use crate::cigar::{compress, format_cigar};
use crate::errors::Result;
use crate::read::DirectionInfo;

/// Merged operations and directions for a mate pair, without bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchingResult {
    /// Run-length compressed merged operations
    pub cigar: Vec<Op>,
    /// Run-length compressed direction of every merged unit
    pub directions: DirectionInfo,
    /// Probe soft-clip bases excluded at the fragment start
    pub ignored_probe_prefix_bases: usize,
    /// Probe soft-clip bases excluded at the fragment end
    pub ignored_probe_suffix_bases: usize,
    /// Bases observed by both mates
    pub stitched_bases: usize,
}

impl StitchingResult {
    /// The merged operations as text.
    #[must_use]
    pub fn cigar_string(&self) -> String {
        format_cigar(&self.cigar)
    }
}

/// Compresses merged units into a [`StitchingResult`].
///
/// # Errors
///
/// Returns [`StitchDiagnostic::InternalSoftclip`] (as an unstitchable error) if a
/// soft-clip run sits between two other runs.
pub fn assemble(units: &[MergedUnit], counts: ReconcileCounts) -> Result<StitchingResult> {
    let cigar = compress(units.iter().map(|unit| unit.kind));
    let internal_clip =
        cigar.len() > 2 && cigar[1..cigar.len() - 1].iter().any(|op| op.kind() == Kind::SoftClip);
    if internal_clip {
        return Err(StitchDiagnostic::InternalSoftclip.into());
    }

    Ok(StitchingResult {
        cigar,
        directions: units.iter().map(|unit| unit.direction).collect(),
        ignored_probe_prefix_bases: counts.ignored_probe_prefix_bases,
        ignored_probe_suffix_bases: counts.ignored_probe_suffix_bases,
        stitched_bases: counts.stitched_bases,
    })
}
