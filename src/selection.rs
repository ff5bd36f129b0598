//! Region selection: where the first window starts.
//!
//! A selection names a chromosome and optionally a start position or a
//! `start-end` range. Seeking fast-forwards every stream to the first record
//! that can appear in the region, truncating a record that overlaps the lower
//! bound, and sets the window counter so the first window contains it.

use crate::error::{GlessError, Result};
use crate::streaming::frontier::Frontier;
use crate::track::{TrackSet, TrackStream};
use crate::window::{WindowMode, WindowState};
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

/// A position bound `[lo, hi]`. Plain positions have `lo == hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub lo: u64,
    pub hi: u64,
}

impl Bound {
    pub fn point(pos: u64) -> Self {
        Self { lo: pos, hi: pos }
    }
}

/// A parsed region specifier: `chrom`, `chrom:pos` or `chrom:start-end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub chrom: String,
    pub start: Option<Bound>,
    pub end: Option<Bound>,
}

/// Outcome of [`Selection::seek`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeekReport {
    /// Records pulled and discarded before the region.
    pub skipped: u64,
    /// Tracks with nothing in the region, removed from the pass.
    pub dropped: Vec<usize>,
    /// Smallest pending start on the selected chromosome after seeking.
    pub min_start: Option<u64>,
}

impl Selection {
    /// Select a whole chromosome.
    pub fn new(chrom: impl Into<String>) -> Self {
        Self {
            chrom: chrom.into(),
            start: None,
            end: None,
        }
    }

    pub fn with_start(mut self, pos: u64) -> Self {
        self.start = Some(Bound::point(pos));
        self
    }

    pub fn with_end(mut self, pos: u64) -> Self {
        self.end = Some(Bound::point(pos));
        self
    }

    /// Parse an optional region string. Absent or empty input selects nothing.
    pub fn parse(input: Option<&str>) -> Result<Option<Self>> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }

    /// First position of the region (0 without a start bound).
    #[inline]
    pub fn lower_bound(&self) -> u64 {
        self.start.map(|b| b.lo).unwrap_or(0)
    }

    #[inline]
    pub fn upper_bound(&self) -> Option<u64> {
        self.end.map(|b| b.hi)
    }

    /// Fast-forward every track to the region and position the window counter.
    ///
    /// Tracks with nothing left in the region are dropped and reported. Fails
    /// with [`GlessError::RegionNotFound`] if no track has a record on the
    /// selected chromosome afterwards.
    pub fn seek<T: TrackStream>(
        &self,
        tracks: &mut TrackSet<T>,
        frontier: &mut Frontier,
        state: &mut WindowState,
    ) -> Result<SeekReport> {
        let lower = self.lower_bound();
        let mut report = SeekReport::default();

        for track in 0..frontier.tracks() {
            if frontier.get(track).is_none() {
                continue;
            }

            while frontier.get(track).is_some_and(|f| f.chrom != self.chrom) {
                frontier.refill(tracks, track)?;
                report.skipped += 1;
            }

            loop {
                let pull = match frontier.get_mut(track) {
                    Some(f) if f.chrom == self.chrom && f.start < lower => {
                        if f.end > lower {
                            f.clip_start(lower);
                            false
                        } else {
                            true
                        }
                    }
                    _ => false,
                };
                if !pull {
                    break;
                }
                frontier.refill(tracks, track)?;
                report.skipped += 1;
            }

            let past_end = match (frontier.get(track), self.upper_bound()) {
                (Some(f), Some(upper)) => f.chrom == self.chrom && f.start >= upper,
                _ => false,
            };
            if past_end {
                frontier.set(track, None);
                tracks.close(track);
            }

            if frontier.get(track).is_none() {
                warn!(
                    "Region {} not found in track {}, dropping it",
                    self,
                    tracks.name(track)
                );
                report.dropped.push(track);
            }
        }

        if !frontier.has_chrom(&self.chrom) {
            return Err(GlessError::RegionNotFound(self.to_string()));
        }

        state.current_chrom = self.chrom.clone();
        state.chrom_changed = false;
        state.next_chrom = None;
        report.min_start = frontier.min_start_on(&self.chrom);

        let size = state.size.max(1);
        match state.mode {
            WindowMode::Count => {
                state.offset = 0;
                state.times_advanced = 1 + report.skipped / size;
            }
            WindowMode::Span => {
                let first = report.min_start.unwrap_or(lower);
                state.offset = lower;
                state.times_advanced = 1 + first.saturating_sub(lower) / size;
            }
        }

        debug!(
            "Seeked to {}: skipped {} records, dropped {} tracks, starting at window {}",
            self,
            report.skipped,
            report.dropped.len(),
            state.times_advanced
        );
        Ok(report)
    }
}

fn is_chrom_name(s: &str) -> bool {
    s.strip_prefix("chr").is_some_and(|rest| {
        rest.bytes()
            .all(|b| b.is_ascii_digit() || b == b'X' || b == b'Y')
    })
}

fn parse_position(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl FromStr for Selection {
    type Err = GlessError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GlessError::InvalidSelectionFormat(s.to_string());

        let (chrom, region) = match s.split_once(':') {
            Some((chrom, region)) => (chrom, Some(region)),
            None => (s, None),
        };
        if !is_chrom_name(chrom) {
            return Err(invalid());
        }
        let selection = Selection::new(chrom);

        let Some(region) = region else {
            return Ok(selection);
        };
        match region.split_once('-') {
            None => {
                let pos = parse_position(region).ok_or_else(invalid)?;
                Ok(selection.with_start(pos))
            }
            Some((start, end)) => {
                let start = parse_position(start).ok_or_else(invalid)?;
                let end = parse_position(end).ok_or_else(invalid)?;
                if start > end {
                    return Err(invalid());
                }
                Ok(selection.with_start(start).with_end(end))
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chrom)?;
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(f, ":{}-{}", start.lo, end.hi),
            (Some(start), None) => write!(f, ":{}", start.lo),
            (None, Some(end)) => write!(f, ":0-{}", end.hi),
            (None, None) => Ok(()),
        }
    }
}
