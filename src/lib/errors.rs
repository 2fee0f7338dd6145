//! Error types for read-pair stitching.
//!
//! Hard errors signal a broken contract (malformed input, misconfiguration). The
//! [`StitchError::Unstitchable`] variant is the one soft outcome: it carries the
//! diagnostic category for a pair that simply cannot be merged, and the public
//! stitching entry points turn it into `Ok(None)`.

use pairstitch_metrics::StitchDiagnostic;
use thiserror::Error;

/// Result type alias for stitching operations
pub type Result<T> = std::result::Result<T, StitchError>;

/// Error type for stitching operations
#[derive(Error, Debug)]
pub enum StitchError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// Operation string could not be parsed or is not supported
    #[error("Invalid CIGAR '{cigar}': {reason}")]
    InvalidCigar {
        /// The offending operation string
        cigar: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A read's fields are inconsistent with each other
    #[error("Invalid read: {reason}")]
    InvalidRead {
        /// Explanation of the problem
        reason: String,
    },

    /// A fragment must have exactly two reads
    #[error("Expected exactly two reads for a fragment, found {count}")]
    WrongReadCount {
        /// Number of reads supplied
        count: usize,
    },

    /// Mates aligned to different chromosomes
    #[error("Mates are on different chromosomes: '{read1}' and '{read2}'")]
    ChromosomeMismatch {
        /// Chromosome of read 1
        read1: String,
        /// Chromosome of read 2
        read2: String,
    },

    /// Both mates had probe soft-clips excluded at the same unit
    #[error("Both mates have an excluded probe soft-clip at bin {bin}")]
    ConflictingProbeClips {
        /// Bin index of the conflict
        bin: usize,
    },

    /// The merged footprint does not fit the preallocated bins
    #[error(
        "Merged footprint needs {required} reference positions but only {capacity} are \
         preallocated; raise the maximum read length"
    )]
    CapacityExceeded {
        /// Number of bins required
        required: usize,
        /// Number of bins preallocated
        capacity: usize,
    },

    /// The merged operations ask for a base a mate does not have
    #[error("Merged operations are inconsistent with {mate}: no base at offset {offset}")]
    InconsistentOperations {
        /// Which mate ran out of bases
        mate: String,
        /// 0-based offset that was requested
        offset: usize,
    },

    /// The pair cannot be stitched; recorded as a diagnostic, not raised to callers
    #[error("Unable to stitch mates: {0}")]
    Unstitchable(StitchDiagnostic),
}

impl StitchError {
    /// True for the soft outcome that leaves a pair unstitched.
    #[must_use]
    pub fn is_unstitchable(&self) -> bool {
        matches!(self, Self::Unstitchable(_))
    }
}

impl From<StitchDiagnostic> for StitchError {
    fn from(diagnostic: StitchDiagnostic) -> Self {
        Self::Unstitchable(diagnostic)
    }
}
