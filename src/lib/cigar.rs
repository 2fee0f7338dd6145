//! Alignment operation (CIGAR) utilities.
//!
//! Stitching compares two mates unit by unit, so the central helper here is
//! [`expand`], which turns a run-length operation string into one [`Kind`] per
//! aligned unit. [`compress`] is its inverse. Only match, insertion, deletion and
//! soft-clip units take part in stitching: `=`/`X` are folded into match, while
//! hard clips and pads carry no bases and are dropped.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::errors::{Result, StitchError};

/// Returns the single-character code for an operation kind.
#[must_use]
pub fn kind_to_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

fn char_to_kind(c: char) -> Option<Kind> {
    match c {
        'M' => Some(Kind::Match),
        'I' => Some(Kind::Insertion),
        'D' => Some(Kind::Deletion),
        'N' => Some(Kind::Skip),
        'S' => Some(Kind::SoftClip),
        'H' => Some(Kind::HardClip),
        'P' => Some(Kind::Pad),
        '=' => Some(Kind::SequenceMatch),
        'X' => Some(Kind::SequenceMismatch),
        _ => None,
    }
}

/// True for operations that consume a reference base.
#[inline]
#[must_use]
pub fn consumes_reference(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Match | Kind::Deletion | Kind::Skip | Kind::SequenceMatch | Kind::SequenceMismatch
    )
}

/// True for operations that consume a read base.
#[inline]
#[must_use]
pub fn consumes_read(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Match
            | Kind::Insertion
            | Kind::SoftClip
            | Kind::SequenceMatch
            | Kind::SequenceMismatch
    )
}

/// Parses an operation string such as `5S10M2I3M`.
///
/// # Errors
///
/// Returns [`StitchError::InvalidCigar`] for empty input, unknown operation codes,
/// missing or zero lengths.
pub fn parse_cigar(text: &str) -> Result<Vec<Op>> {
    let invalid = |reason: &str| StitchError::InvalidCigar {
        cigar: text.to_string(),
        reason: reason.to_string(),
    };

    if text.is_empty() || text == "*" {
        return Err(invalid("no operations"));
    }

    let mut ops = Vec::new();
    let mut len: Option<usize> = None;
    for c in text.chars() {
        if let Some(digit) = c.to_digit(10) {
            let current = len.unwrap_or(0);
            len = current.checked_mul(10).and_then(|v| v.checked_add(digit as usize));
            if len.is_none() {
                return Err(invalid("operation length overflows"));
            }
        } else {
            let kind = char_to_kind(c).ok_or_else(|| invalid(&format!("unknown operation '{c}'")))?;
            match len.take() {
                Some(0) => return Err(invalid("zero-length operation")),
                Some(n) => ops.push(Op::new(kind, n)),
                None => return Err(invalid(&format!("operation '{c}' has no length"))),
            }
        }
    }

    if len.is_some() {
        return Err(invalid("trailing length without an operation"));
    }

    Ok(ops)
}

/// Formats operations as a CIGAR string.
#[must_use]
pub fn format_cigar(ops: &[Op]) -> String {
    use std::fmt::Write;

    let mut text = String::with_capacity(ops.len() * 4);
    for op in ops {
        let _ = write!(text, "{}{}", op.len(), kind_to_char(op.kind()));
    }
    text
}

/// Expands run-length operations into one entry per unit, appending to `out`.
///
/// `=`/`X` are recorded as [`Kind::Match`]; hard clips and pads are skipped.
///
/// # Errors
///
/// Returns [`StitchError::InvalidCigar`] if the operations contain a reference skip.
pub fn expand(ops: &[Op], out: &mut Vec<Kind>) -> Result<()> {
    for op in ops {
        let kind = match op.kind() {
            Kind::HardClip | Kind::Pad => continue,
            Kind::SequenceMatch | Kind::SequenceMismatch => Kind::Match,
            Kind::Skip => {
                return Err(StitchError::InvalidCigar {
                    cigar: format_cigar(ops),
                    reason: "reference skips cannot be stitched".to_string(),
                });
            }
            kind => kind,
        };
        out.extend(std::iter::repeat_n(kind, op.len()));
    }
    Ok(())
}

/// Run-length compresses a stream of unit kinds.
#[must_use]
pub fn compress<I: IntoIterator<Item = Kind>>(units: I) -> Vec<Op> {
    let mut ops: Vec<Op> = Vec::new();
    let mut current: Option<(Kind, usize)> = None;
    for kind in units {
        current = match current {
            Some((k, n)) if k == kind => Some((k, n + 1)),
            Some((k, n)) => {
                ops.push(Op::new(k, n));
                Some((kind, 1))
            }
            None => Some((kind, 1)),
        };
    }
    if let Some((k, n)) = current {
        ops.push(Op::new(k, n));
    }
    ops
}

/// Number of reference bases spanned by the operations.
#[must_use]
pub fn reference_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| consumes_reference(op.kind())).map(|op| op.len()).sum()
}

/// Number of read bases described by the operations.
#[must_use]
pub fn read_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| consumes_read(op.kind())).map(|op| op.len()).sum()
}

/// Soft-clipped bases at the start of the read (hard clips are skipped).
#[must_use]
pub fn leading_soft_clips(ops: &[Op]) -> usize {
    ops.iter()
        .skip_while(|op| op.kind() == Kind::HardClip)
        .take_while(|op| op.kind() == Kind::SoftClip)
        .map(|op| op.len())
        .sum()
}

/// Soft-clipped bases at the end of the read (hard clips are skipped).
#[must_use]
pub fn trailing_soft_clips(ops: &[Op]) -> usize {
    ops.iter()
        .rev()
        .skip_while(|op| op.kind() == Kind::HardClip)
        .take_while(|op| op.kind() == Kind::SoftClip)
        .map(|op| op.len())
        .sum()
}

/// Inserted bases immediately before the trailing clip (or at the very end).
#[must_use]
pub fn trailing_insertions(ops: &[Op]) -> usize {
    ops.iter()
        .rev()
        .skip_while(|op| matches!(op.kind(), Kind::HardClip | Kind::SoftClip))
        .take_while(|op| op.kind() == Kind::Insertion)
        .map(|op| op.len())
        .sum()
}
