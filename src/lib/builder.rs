//! Fluent builder for [`Read`]s, for tests and benchmarks.
//!
//! Unset fields get sensible defaults: chromosome `chr1`, position 1, a full-length
//! match when no operations are given, `A` bases when only operations are given,
//! Q30 qualities, and forward direction.
//!
//! # Examples
//!
//! ```
//! use pairstitch_lib::builder::ReadBuilder;
//!
//! let read = ReadBuilder::new()
//!     .position(12341)
//!     .cigar("1M2I5M")
//!     .bases("TTTTTTTT")
//!     .quality(30)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(read.start(), 12341);
//! assert_eq!(read.end(), 12346);
//! ```

use noodles::core::Position;

use crate::cigar::{parse_cigar, read_length};
use crate::errors::{Result, StitchError};
use crate::read::{Direction, Read};

/// Default base quality for built reads.
pub const DEFAULT_BASE_QUALITY: u8 = 30;

/// Default chromosome for built reads.
pub const DEFAULT_CHROMOSOME: &str = "chr1";

/// Builder for a single [`Read`].
#[derive(Debug, Clone, Default)]
pub struct ReadBuilder {
    name: Option<String>,
    chromosome: Option<String>,
    position: Option<usize>,
    cigar: Option<String>,
    bases: Option<Vec<u8>>,
    qualities: Option<Vec<u8>>,
    quality: Option<u8>,
    direction: Option<Direction>,
    directions: Option<Vec<Direction>>,
    stitched_cigar: Option<String>,
}

impl ReadBuilder {
    /// Creates a builder with all fields unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the chromosome.
    #[must_use]
    pub fn chromosome(mut self, chromosome: &str) -> Self {
        self.chromosome = Some(chromosome.to_string());
        self
    }

    /// Sets the 1-based leftmost mapped position.
    #[must_use]
    pub fn position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Sets the operation string.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(cigar.to_string());
        self
    }

    /// Sets the bases.
    #[must_use]
    pub fn bases(mut self, bases: &str) -> Self {
        self.bases = Some(bases.as_bytes().to_vec());
        self
    }

    /// Sets per-base qualities.
    #[must_use]
    pub fn qualities(mut self, qualities: &[u8]) -> Self {
        self.qualities = Some(qualities.to_vec());
        self
    }

    /// Sets a uniform quality for every base.
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Sets a uniform direction for every base.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets per-base directions.
    #[must_use]
    pub fn directions(mut self, directions: Vec<Direction>) -> Self {
        self.directions = Some(directions);
        self
    }

    /// Sets the upstream merged-operation hint.
    #[must_use]
    pub fn stitched_cigar(mut self, cigar: &str) -> Self {
        self.stitched_cigar = Some(cigar.to_string());
        self
    }

    /// Builds the read.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is zero, an operation string is malformed,
    /// or the fields are inconsistent (see [`Read::new`]).
    pub fn build(self) -> Result<Read> {
        let position = self.position.unwrap_or(1);
        let position = Position::new(position).ok_or_else(|| StitchError::InvalidRead {
            reason: "position must be 1-based".to_string(),
        })?;

        let (cigar, bases) = match (self.cigar, self.bases) {
            (Some(cigar), Some(bases)) => (parse_cigar(&cigar)?, bases),
            (Some(cigar), None) => {
                let ops = parse_cigar(&cigar)?;
                let bases = vec![b'A'; read_length(&ops)];
                (ops, bases)
            }
            (None, Some(bases)) => (parse_cigar(&format!("{}M", bases.len()))?, bases),
            (None, None) => (parse_cigar("10M")?, vec![b'A'; 10]),
        };

        let qualities = self
            .qualities
            .unwrap_or_else(|| vec![self.quality.unwrap_or(DEFAULT_BASE_QUALITY); bases.len()]);

        let chromosome = self.chromosome.unwrap_or_else(|| DEFAULT_CHROMOSOME.to_string());
        let direction = self.direction.unwrap_or(Direction::Forward);
        let mut read = Read::new(chromosome, position, cigar, bases, qualities, direction)?;

        if let Some(directions) = self.directions {
            read = read.with_directions(directions)?;
        }
        if let Some(hint) = self.stitched_cigar {
            read = read.with_stitched_cigar(parse_cigar(&hint)?);
        }
        if let Some(name) = self.name {
            read = read.with_name(name);
        }
        Ok(read)
    }
}
