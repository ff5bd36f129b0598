//! Inline sort validation for track streams.
//!
//! Windowing reads every track forward exactly once, so a misplaced record
//! cannot be recovered later. The validator checks each record as it is read:
//! 1. All records for a chromosome are contiguous (no interleaving)
//! 2. Within a chromosome, start positions are non-decreasing
//!
//! Any consistent chromosome order is accepted (lexicographic or genome
//! order), since only equality of chromosome names is ever compared.

use crate::error::{GlessError, Result};
use rustc_hash::FxHashSet;

/// Per-track sort validator for use within streaming reads.
#[derive(Debug, Default)]
pub struct SortValidator {
    track: String,
    prev_chrom: Option<String>,
    prev_start: u64,
    seen_chroms: FxHashSet<String>,
    record_count: usize,
}

impl SortValidator {
    /// Create a validator reporting errors against `track`.
    pub fn new(track: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            ..Self::default()
        }
    }

    /// Validate that the given record maintains sort order.
    ///
    /// `line` is only used for the error message.
    #[inline]
    pub fn validate(&mut self, chrom: &str, start: u64, line: usize) -> Result<()> {
        self.record_count += 1;

        if self.prev_chrom.as_deref() == Some(chrom) {
            if start < self.prev_start {
                return Err(GlessError::UnsortedTrack {
                    track: self.track.clone(),
                    message: format!(
                        "position {} at line {} comes after {} on {}",
                        start, line, self.prev_start, chrom
                    ),
                });
            }
        } else {
            // Switching chromosomes - this one must not have been seen before
            if self.seen_chroms.contains(chrom) {
                return Err(GlessError::UnsortedTrack {
                    track: self.track.clone(),
                    message: format!(
                        "chromosome '{}' at line {} was seen earlier (chromosomes must be contiguous)",
                        chrom, line
                    ),
                });
            }
            if let Some(prev) = self.prev_chrom.replace(chrom.to_string()) {
                self.seen_chroms.insert(prev);
            }
        }

        self.prev_start = start;
        Ok(())
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
