//! Stitching configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StitchError};
use crate::phred::{MAX_PHRED, PhredScore};

/// Options for the read-pair stitching engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StitcherOptions {
    /// Loser quality at or above which a disagreement is reported at Q0
    pub min_base_call_quality: PhredScore,

    /// Whether soft-clipped bases contribute to the consensus
    pub use_softclipped_bases: bool,

    /// Whether disagreeing stitched bases become `N` at Q0
    pub nify_disagreements: bool,

    /// Whether probe soft-clips at the fragment ends are excluded
    pub ignore_probe_softclips: bool,

    /// Number of leading bins in which probe soft-clips are excluded
    pub probe_prefix_window: usize,

    /// Number of trailing bins in which probe soft-clips are excluded
    pub probe_suffix_window: usize,

    /// Whether a terminal clip may be redistributed over the other mate's deletion
    pub allow_terminal_clips_to_support_overlapping_deletions: bool,

    /// Whether unstitchable pairs are logged
    pub debug: bool,

    /// Longest read the engine must handle; sizes the bin arena
    pub max_read_length: usize,
}

impl Default for StitcherOptions {
    fn default() -> Self {
        Self {
            min_base_call_quality: 20,
            use_softclipped_bases: false,
            nify_disagreements: false,
            ignore_probe_softclips: false,
            probe_prefix_window: 1,
            probe_suffix_window: 1,
            allow_terminal_clips_to_support_overlapping_deletions: false,
            debug: false,
            max_read_length: 1024,
        }
    }
}

impl StitcherOptions {
    /// Checks that the options are usable.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidParameter`] if `max_read_length` is zero or
    /// `min_base_call_quality` is above Q93.
    pub fn validate(&self) -> Result<()> {
        if self.max_read_length == 0 {
            return Err(StitchError::InvalidParameter {
                parameter: "max-read-length".to_string(),
                reason: "must be >= 1".to_string(),
            });
        }
        if self.min_base_call_quality > MAX_PHRED {
            return Err(StitchError::InvalidParameter {
                parameter: "min-base-call-quality".to_string(),
                reason: format!("must be <= {MAX_PHRED}, got {}", self.min_base_call_quality),
            });
        }
        Ok(())
    }

    /// Number of preallocated reference-position bins: `2 * max_read_length - 1`.
    #[must_use]
    pub fn bin_capacity(&self) -> usize {
        (2 * self.max_read_length).saturating_sub(1)
    }
}
