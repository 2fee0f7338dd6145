//! Phred quality score constants and helpers used by consensus building.

/// Maximum Phred score we emit (Q93, matching `SAMUtils.MAX_PHRED_SCORE`)
pub const MAX_PHRED: u8 = 93;

/// No-call base character
pub const NO_CALL_BASE: u8 = b'N';

/// Quality assigned to no-call and conflicting bases
pub const NO_CALL_QUALITY: u8 = 0;

/// Phred score type
pub type PhredScore = u8;

/// Combines the qualities of two agreeing observations of the same base.
///
/// The sum is capped at [`MAX_PHRED`].
///
/// # Examples
/// ```
/// use pairstitch_lib::phred::{MAX_PHRED, sum_phred};
///
/// assert_eq!(sum_phred(30, 20), 50);
/// assert_eq!(sum_phred(60, 60), MAX_PHRED);
/// ```
#[inline]
#[must_use]
pub fn sum_phred(a: PhredScore, b: PhredScore) -> PhredScore {
    a.saturating_add(b).min(MAX_PHRED)
}
