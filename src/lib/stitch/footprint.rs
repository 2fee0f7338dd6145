//! Placeholder ("footprint") reads.
//!
//! A footprint covers the outer span of both mates, clips included, without
//! base-level consensus: every base is a no-call at Q0. It is used where only the
//! merged extent and direction layout of a fragment matter.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::cigar::{leading_soft_clips, trailing_insertions, trailing_soft_clips};
use crate::phred::{NO_CALL_BASE, NO_CALL_QUALITY};
use crate::read::{Direction, DirectionInfo, MatePair, StitchedRead};

/// Builds the footprint read for `pair`.
#[must_use]
pub fn build_footprint(pair: &MatePair) -> StitchedRead {
    let reads = pair.reads();
    let left = pair.left_index();

    let min_start = reads.iter().map(|r| r.start()).min().unwrap_or(1);
    let max_end = reads.iter().map(|r| r.end()).max().unwrap_or(min_start);
    let overlap_start = reads.iter().map(|r| r.start()).max().unwrap_or(min_start);
    let overlap_end = reads.iter().map(|r| r.end()).min().unwrap_or(max_end);

    // The mate reaching furthest right; the right-hand mate on a tie.
    let right = if reads[left].end() > reads[1 - left].end() { left } else { 1 - left };
    let tail_insertions = trailing_insertions(reads[right].cigar());

    // Clips may reach before reference position 1, so no clip-adjusted start is formed.
    let leading = reads
        .iter()
        .map(|r| leading_soft_clips(r.cigar()).saturating_sub(r.start() - min_start))
        .max()
        .unwrap_or(0);

    let aligned = max_end - min_start + 1 + tail_insertions;

    let clipped_end = reads
        .iter()
        .map(|r| r.end() + trailing_insertions(r.cigar()) + trailing_soft_clips(r.cigar()))
        .max()
        .unwrap_or(max_end);
    let trailing = clipped_end.saturating_sub(max_end + tail_insertions);

    let mut cigar = Vec::with_capacity(3);
    for (kind, len) in [(Kind::SoftClip, leading), (Kind::Match, aligned), (Kind::SoftClip, trailing)] {
        if len > 0 {
            cigar.push(Op::new(kind, len));
        }
    }

    let total = leading + aligned + trailing;
    let before_overlap = leading + (overlap_start - min_start);
    let overlap = (overlap_end + 1).saturating_sub(overlap_start);
    let mut directions = DirectionInfo::new();
    let left_read = &reads[left];
    let right_read = &reads[right];
    directions.push_run(left_read.direction_at(0), before_overlap.min(total));
    directions.push_run(Direction::Stitched, overlap.min(total.saturating_sub(before_overlap)));
    directions.push_run(
        right_read.direction_at(right_read.len().saturating_sub(1)),
        total.saturating_sub(before_overlap + overlap),
    );

    StitchedRead {
        name: reads[0].name().or(reads[1].name()).map(ToString::to_string),
        chromosome: reads[0].chromosome().to_string(),
        position: reads[left].position(),
        bases: vec![NO_CALL_BASE; total],
        qualities: vec![NO_CALL_QUALITY; total],
        cigar,
        directions,
        ignored_probe_prefix_bases: 0,
        ignored_probe_suffix_bases: 0,
        stitched_bases: 0,
    }
}
