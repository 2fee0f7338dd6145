//! Integration tests for pairstitch.
//!
//! Run with: `cargo test --test integration_tests`
//!
//! These tests drive the public stitching API end to end, from read construction
//! through consensus calling and metric accounting.

use noodles::sam::alignment::record::cigar::op::Kind;
use pairstitch_lib::builder::ReadBuilder;
use pairstitch_lib::cigar::{read_length, reference_length};
use pairstitch_lib::{
    Direction, MatePair, Read, ReadStitcher, StitchError, StitchedRead, StitcherOptions,
};
use pairstitch_metrics::StitchDiagnostic;
use rstest::rstest;

fn read(position: usize, cigar: &str, direction: Direction) -> Read {
    ReadBuilder::new().position(position).cigar(cigar).direction(direction).build().unwrap()
}

fn stitch_with(options: StitcherOptions, read1: Read, read2: Read) -> Option<StitchedRead> {
    let pair = MatePair::new(read1, read2).unwrap();
    ReadStitcher::new(options).unwrap().stitch(&pair).unwrap()
}

/// Mates with one insertion each, read 1 `TTTTTTTT`/Q30 and read 2 `AAAAAAAA`/Q20.
fn disagreeing_insertion_pair() -> (Read, Read) {
    let read1 = ReadBuilder::new()
        .position(12341)
        .cigar("1M2I5M")
        .bases("TTTTTTTT")
        .quality(30)
        .direction(Direction::Forward)
        .build()
        .unwrap();
    let read2 = ReadBuilder::new()
        .position(12342)
        .cigar("5M1I2M")
        .bases("AAAAAAAA")
        .quality(20)
        .direction(Direction::Reverse)
        .build()
        .unwrap();
    (read1, read2)
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn test_insertions_in_each_mate_are_both_kept() {
    let stitched = stitch_with(
        StitcherOptions::default(),
        read(12341, "1M2I5M", Direction::Forward),
        read(12342, "5M1I2M", Direction::Reverse),
    )
    .unwrap();
    assert_eq!(stitched.cigar_string(), "1M2I5M1I2M");
    assert_eq!(stitched.position.get(), 12341);
    assert_eq!(stitched.bases.len(), 11);
}

#[test]
fn test_disagreements_become_no_calls_when_nified() {
    let (read1, read2) = disagreeing_insertion_pair();
    let options = StitcherOptions { nify_disagreements: true, ..Default::default() };
    let stitched = stitch_with(options, read1, read2).unwrap();

    assert_eq!(stitched.bases_string(), "TTTNNNNNAAA");
    assert_eq!(stitched.qualities, vec![30, 30, 30, 0, 0, 0, 0, 0, 20, 20, 20]);
    assert_eq!(stitched.directions.to_string(), "3F5S3R");
    assert_eq!(stitched.stitched_bases, 5);
}

#[test]
fn test_disagreements_arbitrated_by_quality() {
    let (read1, read2) = disagreeing_insertion_pair();
    let stitched = stitch_with(StitcherOptions::default(), read1, read2).unwrap();

    // Q30 beats Q20, but Q20 is not below the threshold so the call drops to Q0.
    assert_eq!(stitched.bases_string(), "TTTTTTTTAAA");
    assert_eq!(stitched.qualities, vec![30, 30, 30, 0, 0, 0, 0, 0, 20, 20, 20]);
}

#[test]
fn test_disagreement_keeps_quality_when_loser_is_low() {
    let (read1, read2) = disagreeing_insertion_pair();
    let options = StitcherOptions { min_base_call_quality: 25, ..Default::default() };
    let stitched = stitch_with(options, read1, read2).unwrap();
    assert_eq!(stitched.bases_string(), "TTTTTTTTAAA");
    assert_eq!(stitched.qualities[3..8], [30; 5]);
}

#[test]
fn test_clips_insertion_and_deletion() {
    let stitched = stitch_with(
        StitcherOptions::default(),
        read(50, "1S1M1I1M1D1M1S", Direction::Forward),
        read(51, "1S1M1D5M2S", Direction::Reverse),
    )
    .unwrap();
    assert_eq!(stitched.cigar_string(), "1S1M1I1M1D5M2S");
    assert_eq!(stitched.stitched_bases, 2);
    assert_eq!(stitched.bases.len(), 11);
    assert_eq!(stitched.directions.to_string(), "3F3S6R");
}

#[test]
fn test_non_overlapping_mates_are_left_unstitched() {
    let pair = MatePair::new(read(100, "50M", Direction::Forward), read(300, "50M", Direction::Reverse)).unwrap();
    let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();

    assert!(stitcher.stitch(&pair).unwrap().is_none());
    assert_eq!(stitcher.metrics().count(StitchDiagnostic::NoOverlap), 1);

    // The caller still owns both mates.
    let [read1, read2] = pair.into_reads();
    assert_eq!(read1.start(), 100);
    assert_eq!(read2.start(), 300);
}

#[test]
fn test_footprint_beyond_capacity_is_an_error() {
    let options = StitcherOptions { max_read_length: 5, ..Default::default() };
    let pair = MatePair::new(read(100, "2M6D3M", Direction::Forward), read(108, "5M", Direction::Reverse)).unwrap();
    let mut stitcher = ReadStitcher::new(options).unwrap();

    let err = stitcher.stitch(&pair).unwrap_err();
    assert!(matches!(err, StitchError::CapacityExceeded { capacity: 9, .. }));
    assert!(err.to_string().contains("only 9 are preallocated"));
}

// ============================================================================
// Failure categories
// ============================================================================

#[rstest]
#[case::ambiguous_insertion("5M2I5M", 100, "10M", 100, StitchDiagnostic::AmbiguousIndel)]
#[case::deletion_vs_match("5M1D5M", 100, "11M", 100, StitchDiagnostic::UnreconcilableOperations)]
#[case::internal_clip("3M2S3M", 100, "3M", 100, StitchDiagnostic::InternalSoftclip)]
#[case::no_overlap("10M", 100, "10M", 110, StitchDiagnostic::NoOverlap)]
fn test_unstitchable_pairs(
    #[case] cigar1: &str,
    #[case] start1: usize,
    #[case] cigar2: &str,
    #[case] start2: usize,
    #[case] expected: StitchDiagnostic,
) {
    let pair = MatePair::new(read(start1, cigar1, Direction::Forward), read(start2, cigar2, Direction::Reverse))
        .unwrap();
    let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
    assert!(stitcher.stitch(&pair).unwrap().is_none());
    assert_eq!(stitcher.metrics().count(expected), 1);
    assert_eq!(stitcher.metrics().total_failures(), 1);
}

#[test]
fn test_wrong_read_count_is_an_error() {
    let reads = vec![read(100, "10M", Direction::Forward)];
    let err = MatePair::from_reads(reads).unwrap_err();
    assert!(matches!(err, StitchError::WrongReadCount { count: 1 }));
}

// ============================================================================
// Soft clips
// ============================================================================

#[rstest]
#[case::clips_both_ends("2S10M3S", 100, "4S10M2S", 105, "2S15M2S")]
#[case::long_leading_clip("10M", 100, "8S10M", 103, "5S13M")]
#[case::trailing_clip_over_mate("5M3S", 100, "10M", 100, "10M")]
fn test_softclip_redistribution(
    #[case] cigar1: &str,
    #[case] start1: usize,
    #[case] cigar2: &str,
    #[case] start2: usize,
    #[case] expected: &str,
) {
    let stitched = stitch_with(
        StitcherOptions::default(),
        read(start1, cigar1, Direction::Forward),
        read(start2, cigar2, Direction::Reverse),
    )
    .unwrap();
    assert_eq!(stitched.cigar_string(), expected);
}

#[test]
fn test_terminal_clip_supporting_deletion() {
    let read1 = read(100, "5M2D5M", Direction::Forward);
    let read2 = read(107, "2S5M", Direction::Reverse);

    // The clip cannot cross the deletion and is left inside the merged alignment.
    let pair = MatePair::new(read1.clone(), read2.clone()).unwrap();
    let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
    assert!(stitcher.stitch(&pair).unwrap().is_none());
    assert_eq!(stitcher.metrics().internal_softclip, 1);

    let options =
        StitcherOptions { allow_terminal_clips_to_support_overlapping_deletions: true, ..Default::default() };
    let supported = stitch_with(options, read1, read2).unwrap();
    assert_eq!(supported.cigar_string(), "5M2D5M");
    assert_eq!(supported.directions.to_string(), "5F7S");
    assert_eq!(supported.stitched_bases, 5);
}

#[test]
fn test_probe_softclips_are_ignored() {
    let read1 = ReadBuilder::new().position(100).cigar("2S8M").bases("GGACGTACGT").build().unwrap();
    let read2 = ReadBuilder::new()
        .position(102)
        .cigar("8M2S")
        .bases("GTACGTACCC")
        .direction(Direction::Reverse)
        .build()
        .unwrap();
    let pair = MatePair::new(read1, read2).unwrap();
    let options = StitcherOptions { ignore_probe_softclips: true, ..Default::default() };
    let mut stitcher = ReadStitcher::new(options).unwrap();

    let stitched = stitcher.stitch(&pair).unwrap().unwrap();
    assert_eq!(stitched.cigar_string(), "2S10M2S");
    assert_eq!(stitched.ignored_probe_prefix_bases, 2);
    assert_eq!(stitched.ignored_probe_suffix_bases, 2);
    assert_eq!(stitched.bases_string(), "GGACGTACGTACCC");
    assert_eq!(stitcher.metrics().ignored_probe_prefix_bases, 2);
    assert_eq!(stitcher.metrics().ignored_probe_suffix_bases, 2);
}

#[test]
fn test_conflicting_probe_clips_are_an_error() {
    let options = StitcherOptions { ignore_probe_softclips: true, probe_suffix_window: 64, ..Default::default() };
    let pair = MatePair::new(read(100, "2S8M", Direction::Forward), read(100, "2S8M", Direction::Reverse)).unwrap();
    let err = ReadStitcher::new(options).unwrap().stitch(&pair).unwrap_err();
    assert!(matches!(err, StitchError::ConflictingProbeClips { .. }));
}

// ============================================================================
// Quality laws
// ============================================================================

#[rstest]
#[case::sum(30, 20, 50)]
#[case::capped(60, 60, 93)]
#[case::zero(0, 0, 0)]
fn test_agreeing_bases_sum_qualities(#[case] q1: u8, #[case] q2: u8, #[case] expected: u8) {
    let read1 = ReadBuilder::new().position(10).bases("ACGT").quality(q1).build().unwrap();
    let read2 = ReadBuilder::new().position(10).bases("ACGT").quality(q2).direction(Direction::Reverse).build().unwrap();
    let stitched = stitch_with(StitcherOptions::default(), read1, read2).unwrap();
    assert_eq!(stitched.bases_string(), "ACGT");
    assert!(stitched.qualities.iter().all(|&q| q == expected));
    assert_eq!(stitched.directions.to_string(), "4S");
}

#[test]
fn test_equal_quality_disagreement_prefers_forward_mate() {
    let read1 = ReadBuilder::new().position(10).bases("AAAA").quality(30).direction(Direction::Reverse).build().unwrap();
    let read2 = ReadBuilder::new().position(10).bases("CCCC").quality(30).direction(Direction::Forward).build().unwrap();
    let stitched = stitch_with(StitcherOptions::default(), read1, read2).unwrap();
    assert_eq!(stitched.bases_string(), "CCCC");
    assert!(stitched.qualities.iter().all(|&q| q == 0));
}

// ============================================================================
// Metrics and determinism
// ============================================================================

#[test]
fn test_metrics_merge_across_engines() {
    let good = MatePair::new(read(100, "10M", Direction::Forward), read(105, "10M", Direction::Reverse)).unwrap();
    let bad = MatePair::new(read(100, "10M", Direction::Forward), read(500, "10M", Direction::Reverse)).unwrap();

    let mut a = ReadStitcher::new(StitcherOptions::default()).unwrap();
    let mut b = ReadStitcher::new(StitcherOptions::default()).unwrap();
    a.stitch(&good).unwrap();
    b.stitch(&good).unwrap();
    b.stitch(&bad).unwrap();

    let mut total = a.metrics().clone();
    total.merge(b.metrics());
    assert_eq!(total.pairs_attempted, 3);
    assert_eq!(total.pairs_stitched, 2);
    assert_eq!(total.stitched_bases, 10);
    assert_eq!(total.no_overlap, 1);
}

#[test]
fn test_stitching_is_deterministic() {
    let pair = MatePair::new(
        read(50, "1S1M1I1M1D1M1S", Direction::Forward),
        read(51, "1S1M1D5M2S", Direction::Reverse),
    )
    .unwrap();
    let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
    let first = stitcher.stitch(&pair).unwrap();
    let second = stitcher.stitch(&pair).unwrap();
    let fresh = ReadStitcher::new(StitcherOptions::default()).unwrap().stitch(&pair).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, fresh);
}

#[test]
fn test_record_buf_round_trip() {
    let pair = MatePair::new(read(100, "10M", Direction::Forward), read(105, "10M", Direction::Reverse)).unwrap();
    let stitched = ReadStitcher::new(StitcherOptions::default()).unwrap().stitch(&pair).unwrap().unwrap();
    let record = stitched.to_record_buf(0);
    let reread = Read::from_record_buf(&record, "chr1").unwrap();
    assert_eq!(reread.start(), 100);
    assert_eq!(reread.len(), 15);
    assert_eq!(reread.direction_at(0), Direction::Forward);
    assert_eq!(reread.direction_at(7), Direction::Stitched);
    assert_eq!(reread.direction_at(14), Direction::Reverse);
}

#[test]
fn test_metrics_written_after_a_run() -> anyhow::Result<()> {
    let mut stitcher = ReadStitcher::new(StitcherOptions::default())?;
    let pairs = [
        MatePair::new(read(100, "10M", Direction::Forward), read(105, "10M", Direction::Reverse))?,
        MatePair::new(read(100, "5M2I5M", Direction::Forward), read(100, "10M", Direction::Reverse))?,
        MatePair::new(read(100, "10M", Direction::Forward), read(900, "10M", Direction::Reverse))?,
    ];
    for pair in &pairs {
        stitcher.stitch(pair)?;
    }
    pairstitch_lib::logging::log_stitching_summary(stitcher.metrics());

    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("stitching.metrics.txt");
    pairstitch_metrics::write_metrics(&path, &stitcher.metrics().to_kv_metrics(), "stitching")?;

    let contents = std::fs::read_to_string(&path)?;
    assert!(contents.contains("pairs_attempted\t3\t"));
    assert!(contents.contains("pairs_stitched\t1\t"));
    assert!(contents.contains("ambiguous_indel\t1\t"));
    assert!(contents.contains("no_overlap\t1\t"));
    Ok(())
}

#[test]
fn test_record_buf_round_trip_keeps_directions_around_deletion() {
    let pair = MatePair::new(
        read(50, "1S1M1I1M1D1M1S", Direction::Forward),
        read(51, "1S1M1D5M2S", Direction::Reverse),
    )
    .unwrap();
    let stitched = ReadStitcher::new(StitcherOptions::default()).unwrap().stitch(&pair).unwrap().unwrap();
    assert_eq!(stitched.directions.to_string(), "3F3S6R");

    let reread = Read::from_record_buf(&stitched.to_record_buf(0), "chr1").unwrap();
    assert_eq!(reread.len(), 11);
    let directions: String = reread.directions().iter().map(|d| d.as_char()).collect();
    assert_eq!(directions, "FFFSSRRRRRR");
}

// ============================================================================
// Properties
// ============================================================================

mod proptest_tests {
    use super::*;
    use pairstitch_lib::cigar::{consumes_read, expand};
    use proptest::prelude::*;

    /// An indel carried by both mates at a fragment offset.
    #[derive(Debug, Clone, Copy)]
    enum SharedIndel {
        Insertion { at: usize, len: usize },
        Deletion { at: usize, len: usize },
    }

    /// Places an indel strictly inside the overlap `[from, to)`, leaving at least one
    /// aligned base of both mates on each side. Kind 0 means no indel.
    fn shared_indel(kind: usize, len: usize, seed: usize, from: usize, to: usize) -> Option<SharedIndel> {
        let lo = from + 1;
        let hi = match kind {
            1 => to.checked_sub(1)?,
            2 => to.checked_sub(1 + len)?,
            _ => return None,
        };
        if hi < lo {
            return None;
        }
        let at = lo + seed % (hi - lo + 1);
        Some(if kind == 1 { SharedIndel::Insertion { at, len } } else { SharedIndel::Deletion { at, len } })
    }

    fn fragment_base(offset: i64, seed: usize) -> char {
        ['A', 'C', 'G', 'T'][(offset * 7 + seed as i64).rem_euclid(4) as usize]
    }

    fn push_aligned(ops: &mut Vec<(usize, char)>, bases: &mut String, from: usize, to: usize, seed: usize) {
        ops.push((to - from, 'M'));
        bases.extend((from..to).map(|offset| fragment_base(offset as i64, seed)));
    }

    /// Builds a mate aligned over fragment offsets `[from, to)`. Bases, clips
    /// included, are read off one shared fragment so overlapping mates agree.
    fn layout_mate(
        origin: usize,
        span: (usize, usize),
        clips: (usize, usize),
        indel: Option<SharedIndel>,
        seed: usize,
        quality: u8,
        direction: Direction,
    ) -> Read {
        let (from, to) = span;
        let (lead, trail) = clips;
        let mut ops = vec![(lead, 'S')];
        let mut bases: String =
            (0..lead).map(|i| fragment_base(from as i64 - (lead - i) as i64, seed)).collect();

        match indel {
            Some(SharedIndel::Insertion { at, len }) => {
                push_aligned(&mut ops, &mut bases, from, at, seed);
                ops.push((len, 'I'));
                bases.extend((0..len).map(|j| fragment_base(-1000 - j as i64, seed)));
                push_aligned(&mut ops, &mut bases, at, to, seed);
            }
            Some(SharedIndel::Deletion { at, len }) => {
                push_aligned(&mut ops, &mut bases, from, at, seed);
                ops.push((len, 'D'));
                push_aligned(&mut ops, &mut bases, at + len, to, seed);
            }
            None => push_aligned(&mut ops, &mut bases, from, to, seed),
        }

        ops.push((trail, 'S'));
        bases.extend((0..trail).map(|i| fragment_base((to + i) as i64, seed)));

        let cigar: String = ops.iter().filter(|(n, _)| *n > 0).map(|(n, op)| format!("{n}{op}")).collect();
        ReadBuilder::new()
            .position(origin + from)
            .cigar(&cigar)
            .bases(&bases)
            .quality(quality)
            .direction(direction)
            .build()
            .unwrap()
    }

    // Property: overlapping mates with clips and a shared indel always stitch, and
    // the result satisfies the length, direction, clip-placement, reference-span,
    // and quality invariants.
    proptest! {
        #[test]
        fn proptest_stitched_read_invariants(
            start in 1usize..500,
            offset_seed in 0usize..1000,
            spans in (6usize..60, 6usize..60),
            clips in (0usize..6, 0usize..6, 0usize..6, 0usize..6),
            indel in (0usize..3, 1usize..4, 0usize..1000),
            quals in (0u8..60, 0u8..60),
            seed in 0usize..1000,
            swap in any::<bool>(),
        ) {
            let (l0, l1) = spans;
            let offset = offset_seed % l0;
            let shared = shared_indel(indel.0, indel.1, indel.2, offset, l0.min(offset + l1));
            let (q_left, q_right) = quals;

            let left = layout_mate(start, (0, l0), (clips.0, clips.1), shared, seed, q_left, Direction::Forward);
            let right =
                layout_mate(start, (offset, offset + l1), (clips.2, clips.3), shared, seed, q_right, Direction::Reverse);
            let (read1, read2) = if swap { (right, left) } else { (left, right) };

            let min_start = read1.start().min(read2.start());
            let max_end = read1.end().max(read2.end());
            let pair = MatePair::new(read1, read2).unwrap();

            let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
            let stitched = stitcher.stitch(&pair).unwrap();
            prop_assert!(stitched.is_some(), "overlapping mates with a shared indel should stitch");
            let stitched = stitched.unwrap();

            prop_assert_eq!(stitched.bases.len(), read_length(&stitched.cigar));
            prop_assert_eq!(stitched.qualities.len(), stitched.bases.len());

            let mut units = Vec::new();
            expand(&stitched.cigar, &mut units).unwrap();
            prop_assert_eq!(stitched.directions.len(), units.len());

            let n = stitched.cigar.len();
            for op in stitched.cigar.iter().take(n.saturating_sub(1)).skip(1) {
                prop_assert_ne!(op.kind(), Kind::SoftClip);
            }

            prop_assert_eq!(reference_length(&stitched.cigar), max_end - min_start + 1);
            prop_assert_eq!(stitched.position.get(), min_start);

            match shared {
                Some(SharedIndel::Insertion { len, .. }) => {
                    prop_assert!(stitched.cigar.iter().any(|op| op.kind() == Kind::Insertion && op.len() == len));
                }
                Some(SharedIndel::Deletion { len, .. }) => {
                    prop_assert!(stitched.cigar.iter().any(|op| op.kind() == Kind::Deletion && op.len() == len));
                }
                None => {}
            }

            // Mates agree everywhere, so every base keeps its source mate's quality
            // or, when observed twice, the capped sum.
            let per_base: Vec<Direction> = units
                .iter()
                .zip(stitched.directions.iter())
                .filter(|(kind, _)| consumes_read(**kind))
                .map(|(_, direction)| direction)
                .collect();
            prop_assert_eq!(per_base.len(), stitched.bases.len());
            prop_assert!(!stitched.bases.contains(&b'N'));
            for (direction, &quality) in per_base.iter().zip(&stitched.qualities) {
                let expected = match direction {
                    Direction::Forward => q_left,
                    Direction::Reverse => q_right,
                    Direction::Stitched => (u16::from(q_left) + u16::from(q_right)).min(93) as u8,
                };
                prop_assert_eq!(quality, expected);
            }
            let twice_observed = per_base.iter().filter(|d| **d == Direction::Stitched).count();
            prop_assert_eq!(stitched.stitched_bases, twice_observed);

            let again = ReadStitcher::new(StitcherOptions::default()).unwrap().stitch(&pair).unwrap();
            prop_assert_eq!(Some(stitched), again);
            prop_assert_eq!(stitcher.metrics().length_mismatch, 0);
        }
    }

    // Property: the footprint always spans the stitched read's aligned extent.
    proptest! {
        #[test]
        fn proptest_footprint_matches_stitched_extent(
            start in 1usize..500,
            offset_seed in 0usize..1000,
            matches in (5usize..60, 5usize..60),
        ) {
            let (m0, m1) = matches;
            let offset = offset_seed % m0;
            let pair = MatePair::new(
                read(start, &format!("{m0}M"), Direction::Forward),
                read(start + offset, &format!("{m1}M"), Direction::Reverse),
            )
            .unwrap();
            let mut stitcher = ReadStitcher::new(StitcherOptions::default()).unwrap();
            let stitched = stitcher.stitch(&pair).unwrap().unwrap();
            let footprint = stitcher.footprint(&pair);

            prop_assert_eq!(footprint.cigar_string(), stitched.cigar_string());
            prop_assert_eq!(footprint.directions.to_string(), stitched.directions.to_string());
            prop_assert!(footprint.bases.iter().all(|&b| b == b'N'));
        }
    }
}
