//! Aligned reads, mate pairs, and stitched reads.
//!
//! A [`Read`] is one aligned mate together with the per-base sequencing direction
//! assigned by the caller. Two reads form a [`MatePair`], which is what the
//! stitching engine consumes. A successful stitch produces a [`StitchedRead`].

use std::fmt;
use std::str::FromStr;

use noodles::core::Position;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};

use crate::cigar::{consumes_read, expand, format_cigar, parse_cigar, read_length, reference_length};
use crate::errors::{Result, StitchError};

/// Tag carrying the run-length direction track of a stitched read.
pub const DIRECTION_TAG: Tag = Tag::new(b'X', b'D');

/// Tag carrying an upstream merged-operation hint.
pub const STITCHED_CIGAR_TAG: Tag = Tag::new(b'X', b'C');

/// Sequencing direction of a single base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Observed by the forward-strand mate
    Forward,
    /// Observed by the reverse-strand mate
    Reverse,
    /// Observed by both mates
    Stitched,
}

impl Direction {
    /// Returns the single-character code (`F`, `R`, `S`).
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Forward => 'F',
            Self::Reverse => 'R',
            Self::Stitched => 'S',
        }
    }

    /// Parses a single-character code.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'F' => Some(Self::Forward),
            'R' => Some(Self::Reverse),
            'S' => Some(Self::Stitched),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Run-length encoded per-base directions, displayed as e.g. `3F3S6R`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionInfo {
    runs: Vec<(Direction, usize)>,
}

impl DirectionInfo {
    /// Creates an empty track.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one base.
    pub fn push(&mut self, direction: Direction) {
        self.push_run(direction, 1);
    }

    /// Appends `len` bases, merging with the previous run when possible.
    pub fn push_run(&mut self, direction: Direction, len: usize) {
        if len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some((last, n)) if *last == direction => *n += len,
            _ => self.runs.push((direction, len)),
        }
    }

    /// The runs in order.
    #[must_use]
    pub fn runs(&self) -> &[(Direction, usize)] {
        &self.runs
    }

    /// Total number of bases covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().map(|(_, n)| n).sum()
    }

    /// True if no bases are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of bases with the given direction.
    #[must_use]
    pub fn count(&self, direction: Direction) -> usize {
        self.runs.iter().filter(|(d, _)| *d == direction).map(|(_, n)| n).sum()
    }

    /// Iterates one direction per base.
    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.runs.iter().flat_map(|&(d, n)| std::iter::repeat_n(d, n))
    }
}

impl FromIterator<Direction> for DirectionInfo {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut info = Self::new();
        for direction in iter {
            info.push(direction);
        }
        info
    }
}

impl fmt::Display for DirectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (direction, len) in &self.runs {
            write!(f, "{len}{direction}")?;
        }
        Ok(())
    }
}

impl FromStr for DirectionInfo {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StitchError::InvalidRead { reason: format!("invalid direction track '{s}'") };

        let mut info = Self::new();
        let mut len: usize = 0;
        let mut have_len = false;
        for c in s.chars() {
            if let Some(digit) = c.to_digit(10) {
                len = len.checked_mul(10).and_then(|v| v.checked_add(digit as usize)).ok_or_else(invalid)?;
                have_len = true;
            } else {
                let direction = Direction::from_char(c).ok_or_else(invalid)?;
                if !have_len || len == 0 {
                    return Err(invalid());
                }
                info.push_run(direction, len);
                len = 0;
                have_len = false;
            }
        }
        if have_len {
            return Err(invalid());
        }
        Ok(info)
    }
}

/// One aligned mate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    name: Option<String>,
    chromosome: String,
    position: Position,
    bases: Vec<u8>,
    qualities: Vec<u8>,
    cigar: Vec<Op>,
    directions: Vec<Direction>,
    stitched_cigar: Option<Vec<Op>>,
}

impl Read {
    /// Creates a read whose bases all share `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidRead`] if the operations do not describe exactly
    /// `bases.len()` bases, the quality count differs from the base count, or the
    /// operations have no reference-consuming unit; and
    /// [`StitchError::InvalidCigar`] if the operations contain a reference skip.
    pub fn new(
        chromosome: impl Into<String>,
        position: Position,
        cigar: Vec<Op>,
        bases: Vec<u8>,
        qualities: Vec<u8>,
        direction: Direction,
    ) -> Result<Self> {
        let directions = vec![direction; bases.len()];
        let read = Self {
            name: None,
            chromosome: chromosome.into(),
            position,
            bases,
            qualities,
            cigar,
            directions,
            stitched_cigar: None,
        };
        read.validate()?;
        Ok(read)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(StitchError::InvalidRead { reason });

        if self.cigar.iter().any(|op| op.kind() == Kind::Skip) {
            return Err(StitchError::InvalidCigar {
                cigar: format_cigar(&self.cigar),
                reason: "reference skips cannot be stitched".to_string(),
            });
        }
        if reference_length(&self.cigar) == 0 {
            return invalid(format!("'{}' aligns no reference bases", format_cigar(&self.cigar)));
        }
        let expected = read_length(&self.cigar);
        if expected != self.bases.len() {
            return invalid(format!(
                "'{}' describes {expected} bases but the read has {}",
                format_cigar(&self.cigar),
                self.bases.len()
            ));
        }
        if self.qualities.len() != self.bases.len() {
            return invalid(format!(
                "{} qualities for {} bases",
                self.qualities.len(),
                self.bases.len()
            ));
        }
        if self.directions.len() != self.bases.len() {
            return invalid(format!(
                "{} directions for {} bases",
                self.directions.len(),
                self.bases.len()
            ));
        }
        Ok(())
    }

    /// Replaces the per-base directions.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidRead`] unless there is one direction per base.
    pub fn with_directions(mut self, directions: Vec<Direction>) -> Result<Self> {
        self.directions = directions;
        self.validate()?;
        Ok(self)
    }

    /// Attaches an upstream merged-operation hint.
    #[must_use]
    pub fn with_stitched_cigar(mut self, cigar: Vec<Op>) -> Self {
        self.stitched_cigar = Some(cigar);
        self
    }

    /// Sets the read name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a read from a mapped record.
    ///
    /// All bases take the record's strand as their direction unless the record has
    /// a direction track (`XD`) covering every base. An `XC` tag becomes the
    /// merged-operation hint.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidRead`] if the record is unmapped or its fields
    /// are inconsistent.
    pub fn from_record_buf(record: &RecordBuf, chromosome: &str) -> Result<Self> {
        if record.flags().is_unmapped() {
            return Err(StitchError::InvalidRead { reason: "record is unmapped".to_string() });
        }
        let position = record
            .alignment_start()
            .ok_or_else(|| StitchError::InvalidRead { reason: "record has no alignment start".to_string() })?;

        let direction = if record.flags().is_reverse_complemented() {
            Direction::Reverse
        } else {
            Direction::Forward
        };

        let mut read = Self::new(
            chromosome,
            position,
            record.cigar().as_ref().to_vec(),
            record.sequence().as_ref().to_vec(),
            record.quality_scores().as_ref().to_vec(),
            direction,
        )?;
        read.name = record.name().map(ToString::to_string);

        if let Some(Value::String(track)) = record.data().get(&DIRECTION_TAG) {
            let info: DirectionInfo = track.to_string().parse()?;
            if let Some(directions) = per_base_directions(&info, &read.cigar, read.len())? {
                read.directions = directions;
            } else {
                log::trace!(
                    "Ignoring direction track '{info}' covering {} of {} bases",
                    info.len(),
                    read.len()
                );
            }
        }

        if let Some(Value::String(hint)) = record.data().get(&STITCHED_CIGAR_TAG) {
            read.stitched_cigar = Some(parse_cigar(&hint.to_string())?);
        }

        Ok(read)
    }

    /// The read name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The chromosome the read is aligned to.
    #[must_use]
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// 1-based leftmost mapped position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// 1-based leftmost mapped position as an integer.
    #[must_use]
    pub fn start(&self) -> usize {
        usize::from(self.position)
    }

    /// 1-based rightmost mapped position (inclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.start() + reference_length(&self.cigar) - 1
    }

    /// Number of bases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// True if the read has no bases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// The read bases.
    #[must_use]
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Per-base Phred qualities.
    #[must_use]
    pub fn qualities(&self) -> &[u8] {
        &self.qualities
    }

    /// The alignment operations.
    #[must_use]
    pub fn cigar(&self) -> &[Op] {
        &self.cigar
    }

    /// Per-base directions.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Direction of the base at `offset`, falling back to the last base.
    #[must_use]
    pub fn direction_at(&self, offset: usize) -> Direction {
        self.directions
            .get(offset)
            .or_else(|| self.directions.last())
            .copied()
            .unwrap_or(Direction::Forward)
    }

    /// Upstream merged-operation hint, if any.
    #[must_use]
    pub fn stitched_cigar(&self) -> Option<&[Op]> {
        self.stitched_cigar.as_deref()
    }
}

/// Maps a direction track onto read bases.
///
/// A track holds either one entry per base or one entry per alignment unit, in
/// which case entries for units that consume no read base (deletions) are dropped.
/// Returns `None` if the track fits neither layout.
fn per_base_directions(info: &DirectionInfo, cigar: &[Op], num_bases: usize) -> Result<Option<Vec<Direction>>> {
    if info.len() == num_bases {
        return Ok(Some(info.iter().collect()));
    }
    let mut units = Vec::with_capacity(info.len());
    expand(cigar, &mut units)?;
    if units.len() != info.len() {
        return Ok(None);
    }
    let directions =
        units.iter().zip(info.iter()).filter(|(kind, _)| consumes_read(**kind)).map(|(_, d)| d).collect();
    Ok(Some(directions))
}

/// The two mates of one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatePair {
    reads: [Read; 2],
    outie: bool,
}

impl MatePair {
    /// Pairs two mates, inferring the outie flag.
    ///
    /// The pair is outie when the left-most mate (read 1 on a tie) reads in reverse
    /// and the other mate reads forward.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::ChromosomeMismatch`] if the mates are on different
    /// chromosomes.
    pub fn new(read1: Read, read2: Read) -> Result<Self> {
        let (left, right) = if read2.start() < read1.start() { (&read2, &read1) } else { (&read1, &read2) };
        let outie = left.direction_at(0) == Direction::Reverse
            && right.direction_at(0) == Direction::Forward;
        Self::with_outie(read1, read2, outie)
    }

    /// Pairs two mates with an explicit outie flag.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::ChromosomeMismatch`] if the mates are on different
    /// chromosomes.
    pub fn with_outie(read1: Read, read2: Read, outie: bool) -> Result<Self> {
        if read1.chromosome() != read2.chromosome() {
            return Err(StitchError::ChromosomeMismatch {
                read1: read1.chromosome().to_string(),
                read2: read2.chromosome().to_string(),
            });
        }
        Ok(Self { reads: [read1, read2], outie })
    }

    /// Pairs the reads of a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::WrongReadCount`] unless exactly two reads are given, and
    /// any error from [`MatePair::new`].
    pub fn from_reads(reads: Vec<Read>) -> Result<Self> {
        let count = reads.len();
        let Ok([read1, read2]) = <[Read; 2]>::try_from(reads) else {
            return Err(StitchError::WrongReadCount { count });
        };
        Self::new(read1, read2)
    }

    /// Read 1.
    #[must_use]
    pub fn read1(&self) -> &Read {
        &self.reads[0]
    }

    /// Read 2.
    #[must_use]
    pub fn read2(&self) -> &Read {
        &self.reads[1]
    }

    /// Both reads, read 1 first.
    #[must_use]
    pub fn reads(&self) -> &[Read; 2] {
        &self.reads
    }

    /// True when the mates face away from each other.
    #[must_use]
    pub fn is_outie(&self) -> bool {
        self.outie
    }

    /// Index (0 or 1) of the earlier-starting mate; read 1 on a tie.
    #[must_use]
    pub fn left_index(&self) -> usize {
        usize::from(self.reads[1].start() < self.reads[0].start())
    }

    /// Consumes the pair, returning both reads.
    #[must_use]
    pub fn into_reads(self) -> [Read; 2] {
        self.reads
    }
}

/// A consensus read built from two overlapping mates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchedRead {
    /// Read name (from read 1, else read 2)
    pub name: Option<String>,
    /// Chromosome shared by both mates
    pub chromosome: String,
    /// Leftmost mapped position of the two mates
    pub position: Position,
    /// Consensus bases
    pub bases: Vec<u8>,
    /// Consensus qualities
    pub qualities: Vec<u8>,
    /// Merged alignment operations
    pub cigar: Vec<Op>,
    /// Merged direction track
    pub directions: DirectionInfo,
    /// Probe soft-clip bases excluded at the fragment start
    pub ignored_probe_prefix_bases: usize,
    /// Probe soft-clip bases excluded at the fragment end
    pub ignored_probe_suffix_bases: usize,
    /// Bases observed by both mates
    pub stitched_bases: usize,
}

impl StitchedRead {
    /// The merged operations as text.
    #[must_use]
    pub fn cigar_string(&self) -> String {
        format_cigar(&self.cigar)
    }

    /// Bases as a string (lossy for non-ASCII).
    #[must_use]
    pub fn bases_string(&self) -> String {
        String::from_utf8_lossy(&self.bases).into_owned()
    }

    /// Converts to a mapped record on `reference_sequence_id`, with the direction
    /// track stored in the `XD` tag.
    #[must_use]
    pub fn to_record_buf(&self, reference_sequence_id: usize) -> RecordBuf {
        let mut record = RecordBuf::default();
        if let Some(name) = &self.name {
            *record.name_mut() = Some(name.as_bytes().to_vec().into());
        }
        *record.flags_mut() = Flags::empty();
        *record.reference_sequence_id_mut() = Some(reference_sequence_id);
        *record.alignment_start_mut() = Some(self.position);
        *record.cigar_mut() = self.cigar.iter().copied().collect();
        *record.sequence_mut() = Sequence::from(self.bases.clone());
        *record.quality_scores_mut() = QualityScores::from(self.qualities.clone());
        record.data_mut().insert(DIRECTION_TAG, Value::from(self.directions.to_string()));
        record
    }
}
