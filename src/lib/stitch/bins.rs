//! Reference-position bins.
//!
//! Each bin is one reference coordinate of the union span of the two mates. For
//! each mate a bin holds at most one reference-consuming unit (the mapped site)
//! and the run of non-consuming units (insertions, soft clips) that immediately
//! precede it. Bins live in a preallocated [`BinArena`] that is reset between
//! calls; only the bins touched by the previous call are cleared.

use noodles::sam::alignment::record::cigar::op::Kind;

use crate::cigar::consumes_reference;
use crate::errors::{Result, StitchError};

/// One reference coordinate of the merged footprint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceBin {
    /// Reference-consuming unit of each mate at this coordinate
    pub mapped: [Option<Kind>; 2],
    /// Non-consuming units of each mate preceding the mapped site
    pub prefix: [Vec<Kind>; 2],
}

impl ReferenceBin {
    /// True if either mate has a mapped unit here.
    #[must_use]
    pub fn has_mapped(&self) -> bool {
        self.mapped.iter().any(Option::is_some)
    }

    fn clear(&mut self) {
        self.mapped = [None, None];
        self.prefix[0].clear();
        self.prefix[1].clear();
    }
}

/// Fixed-capacity pool of bins reused across stitching calls.
#[derive(Debug)]
pub struct BinArena {
    bins: Vec<ReferenceBin>,
    used: usize,
}

impl BinArena {
    /// Preallocates `capacity` bins.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { bins: vec![ReferenceBin::default(); capacity], used: 0 }
    }

    /// Number of preallocated bins.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bins.len()
    }

    /// Number of bins in use (the high-water mark since the last reset).
    #[must_use]
    pub fn len(&self) -> usize {
        self.used
    }

    /// True if no bins are in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Clears the bins used by the previous call.
    pub fn reset(&mut self) {
        for bin in &mut self.bins[..self.used] {
            bin.clear();
        }
        self.used = 0;
    }

    /// Returns bin `index`, extending the in-use range to cover it.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::CapacityExceeded`] if `index` is beyond the arena.
    pub fn claim(&mut self, index: usize) -> Result<&mut ReferenceBin> {
        if index >= self.bins.len() {
            return Err(StitchError::CapacityExceeded { required: index + 1, capacity: self.bins.len() });
        }
        self.used = self.used.max(index + 1);
        Ok(&mut self.bins[index])
    }

    /// The bins in use.
    #[must_use]
    pub fn bins(&self) -> &[ReferenceBin] {
        &self.bins[..self.used]
    }

    /// The bins in use, mutably.
    pub fn bins_mut(&mut self) -> &mut [ReferenceBin] {
        &mut self.bins[..self.used]
    }
}

/// Distributes both mates' expanded units into bins.
///
/// `offsets[m]` is the bin of mate `m`'s first mapped unit: zero for the
/// earlier-starting mate and the position difference for the other.
///
/// # Errors
///
/// Returns [`StitchError::CapacityExceeded`] if the footprint needs more bins
/// than the arena holds.
pub fn build_bins(arena: &mut BinArena, units: [&[Kind]; 2], offsets: [usize; 2]) -> Result<()> {
    arena.reset();
    for (mate, (mate_units, offset)) in units.into_iter().zip(offsets).enumerate() {
        let mut cursor = offset;
        for &kind in mate_units {
            let bin = arena.claim(cursor)?;
            if consumes_reference(kind) {
                bin.mapped[mate] = Some(kind);
                cursor += 1;
            } else {
                bin.prefix[mate].push(kind);
            }
        }
    }
    Ok(())
}
