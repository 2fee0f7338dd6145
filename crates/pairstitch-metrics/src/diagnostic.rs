//! Named diagnostic categories for read-pair stitching.
//!
//! Every soft outcome of a stitch attempt (a pair that could not be stitched, or a
//! stitched read that tripped a non-fatal consistency check) maps to one of these
//! categories so that per-run totals can be reported.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reasons a mate pair was not stitched, plus non-fatal consistency diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StitchDiagnostic {
    /// The mates' aligned reference spans do not overlap
    NoOverlap,
    /// The mates report different operations at the same unit
    UnreconcilableOperations,
    /// An insertion in one mate cannot be placed against the other mate
    AmbiguousIndel,
    /// The merged operations contain a soft clip between aligned operations
    InternalSoftclip,
    /// The merged operations do not describe the emitted bases
    BaseCountMismatch,
    /// Merged reference length differs from the mates' outer span (non-fatal)
    LengthMismatch,
    /// Merged operations differ from the upstream merged-operation hint (non-fatal)
    HintDisagreement,
}

impl StitchDiagnostic {
    /// All diagnostic categories, in reporting order.
    pub const ALL: [Self; 7] = [
        Self::NoOverlap,
        Self::UnreconcilableOperations,
        Self::AmbiguousIndel,
        Self::InternalSoftclip,
        Self::BaseCountMismatch,
        Self::LengthMismatch,
        Self::HintDisagreement,
    ];

    /// Returns a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoOverlap => "Mates do not overlap on the reference",
            Self::UnreconcilableOperations => "Could not reconcile operations",
            Self::AmbiguousIndel => "Insertion placement is ambiguous between mates",
            Self::InternalSoftclip => "Merged operations contain an internal soft clip",
            Self::BaseCountMismatch => "Merged operations do not match the number of bases",
            Self::LengthMismatch => "Length mismatch between merged operations and mate span",
            Self::HintDisagreement => "Merged operations disagree with the upstream hint",
        }
    }

    /// Returns the snake-case key used in metric files.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::NoOverlap => "no_overlap",
            Self::UnreconcilableOperations => "unreconcilable_operations",
            Self::AmbiguousIndel => "ambiguous_indel",
            Self::InternalSoftclip => "internal_softclip",
            Self::BaseCountMismatch => "base_count_mismatch",
            Self::LengthMismatch => "length_mismatch",
            Self::HintDisagreement => "hint_disagreement",
        }
    }

    /// True when this category means the pair was left unstitched.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::LengthMismatch | Self::HintDisagreement)
    }
}

impl fmt::Display for StitchDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use pairstitch_metrics::diagnostic::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(123), "123");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
