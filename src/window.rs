//! Windowing engine: k-way merge of track streams into display batches.
//!
//! The merger keeps one pending feature per track (the [`Frontier`]) and on
//! every advance moves the next window's worth of features from the frontier
//! into a [`Batch`]. Two policies are supported:
//!
//! - **Count**: the next N features across all tracks, picked by smallest
//!   end position.
//! - **Span**: every feature within the next N base pairs.
//!
//! Features straddling a window boundary are split; the head is emitted and
//! the tail stays pending, so consecutive batches tile each feature exactly
//! once. Streams are never read backwards.

use crate::error::{GlessError, Result};
use crate::feature::Piece;
use crate::streaming::frontier::Frontier;
use crate::track::{TrackSet, TrackStream};
use log::{debug, trace};
use std::fmt;

/// Windowing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowMode {
    /// Windows hold a fixed number of features.
    Count,
    /// Windows cover a fixed number of base pairs.
    Span,
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::Count => write!(f, "count"),
            WindowMode::Span => write!(f, "span"),
        }
    }
}

/// Session-wide window counters, threaded through every merger call.
///
/// The session moves the counter between advances; the merger only sets the
/// chromosome-change flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub mode: WindowMode,
    /// Features per window (count) or base pairs per window (span).
    pub size: u64,
    /// 1-based index of the window being produced.
    pub times_advanced: u64,
    pub current_chrom: String,
    /// Set when the last batch exhausted `current_chrom`.
    pub chrom_changed: bool,
    pub next_chrom: Option<String>,
    /// Span windows start from here (the selection's lower bound).
    pub offset: u64,
}

impl WindowState {
    pub fn new(mode: WindowMode, size: u64) -> Self {
        Self {
            mode,
            size,
            times_advanced: 1,
            current_chrom: String::new(),
            chrom_changed: false,
            next_chrom: None,
            offset: 0,
        }
    }

    /// Right edge of the current span window.
    #[inline]
    pub fn window_end(&self) -> u64 {
        self.offset
            .saturating_add(self.times_advanced.saturating_mul(self.size))
    }

    /// Left edge of the current span window.
    #[inline]
    pub fn window_start(&self) -> u64 {
        self.window_end().saturating_sub(self.size).max(self.offset)
    }

    /// Move on to the next window.
    ///
    /// After a chromosome change the counter restarts at the first window of
    /// the new chromosome, without the selection offset.
    pub fn step(&mut self) {
        if self.chrom_changed {
            if let Some(next) = self.next_chrom.take() {
                self.current_chrom = next;
            }
            self.chrom_changed = false;
            self.times_advanced = 1;
            self.offset = 0;
        } else {
            self.times_advanced += 1;
        }
    }

    /// Undo the counter move of a [`step`](Self::step) that produced nothing.
    pub fn step_back(&mut self) {
        self.times_advanced = self.times_advanced.saturating_sub(1);
    }
}

/// One emitted window: a slot of pieces per track, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Window index (`times_advanced` when produced).
    pub index: u64,
    pub chrom: String,
    /// Left edge of the window.
    pub start: u64,
    /// Right edge of the window.
    pub end: u64,
    pub tracks: Vec<Vec<Piece>>,
}

impl Batch {
    fn new(index: u64, chrom: &str, tracks: usize) -> Self {
        Self {
            index,
            chrom: chrom.to_string(),
            start: 0,
            end: 0,
            tracks: vec![Vec::new(); tracks],
        }
    }

    /// Pieces of one track.
    pub fn track(&self, track: usize) -> &[Piece] {
        self.tracks.get(track).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of real (non-placeholder) pieces.
    pub fn len(&self) -> usize {
        self.pieces().count()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces().next().is_none()
    }

    /// True for the "empty window, keep going" marker batch.
    pub fn is_placeholder(&self) -> bool {
        !self.tracks.is_empty()
            && self
                .tracks
                .iter()
                .all(|t| t.len() == 1 && t[0].is_placeholder())
    }

    /// Iterate over `(track, piece)` for every real piece.
    pub fn pieces(&self) -> impl Iterator<Item = (usize, &Piece)> {
        self.tracks
            .iter()
            .enumerate()
            .flat_map(|(i, t)| t.iter().map(move |p| (i, p)))
            .filter(|(_, p)| !p.is_placeholder())
    }

    fn fill_placeholders(&mut self) {
        for slot in &mut self.tracks {
            slot.clear();
            slot.push(Piece::placeholder());
        }
    }

    /// Use the extent of the emitted pieces as the window edges.
    fn fit_to_pieces(&mut self) {
        let start = self.pieces().map(|(_, p)| p.start).min();
        let end = self.pieces().map(|(_, p)| p.end).max();
        if let (Some(start), Some(end)) = (start, end) {
            self.start = start;
            self.end = end;
        }
    }
}

/// Lifecycle of a merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergerPhase {
    /// Frontier primed, ready to produce the next batch.
    Ready,
    /// No active track and nothing pending. Terminal.
    Exhausted,
}

/// K-way merger of track streams into windows.
pub struct WindowMerger<T: TrackStream> {
    tracks: TrackSet<T>,
    frontier: Frontier,
    phase: MergerPhase,
}

impl<T: TrackStream> WindowMerger<T> {
    /// Create a merger over opened streams and their primed frontier.
    pub fn new(tracks: TrackSet<T>, frontier: Frontier) -> Self {
        Self {
            tracks,
            frontier,
            phase: MergerPhase::Ready,
        }
    }

    pub fn phase(&self) -> MergerPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn tracks(&self) -> &TrackSet<T> {
        &self.tracks
    }

    /// Produce the next batch according to `state.mode`.
    ///
    /// Returns `None` once every track is exhausted, and on every call after.
    pub fn advance(&mut self, state: &mut WindowState) -> Result<Option<Batch>> {
        let size = state.size;
        match state.mode {
            WindowMode::Count => self.advance_by_count(state, size),
            WindowMode::Span => self.advance_by_span(state, size),
        }
    }

    /// Emit the next `target_count` features of the current chromosome.
    pub fn advance_by_count(
        &mut self,
        state: &mut WindowState,
        target_count: u64,
    ) -> Result<Option<Batch>> {
        if target_count == 0 {
            return Err(GlessError::InvalidArgument(
                "feature count must be greater than 0".to_string(),
            ));
        }
        if self.phase == MergerPhase::Exhausted {
            return Ok(None);
        }
        state.chrom_changed = false;
        state.next_chrom = None;

        loop {
            let mut batch = Batch::new(
                state.times_advanced,
                &state.current_chrom,
                self.frontier.tracks(),
            );
            let mut taken = 0;
            let mut maxpos = 0;

            while taken < target_count {
                let Some(track) = self.frontier.min_end_on(&state.current_chrom) else {
                    break;
                };
                let Some(feature) = self.frontier.take(track) else {
                    break;
                };
                maxpos = maxpos.max(feature.end);
                batch.tracks[track].push(feature.into());
                taken += 1;
                self.frontier.refill(&mut self.tracks, track)?;
            }

            if taken == 0 {
                match self.frontier.first_chrom() {
                    None => {
                        debug!("All tracks exhausted after window {}", state.times_advanced);
                        self.phase = MergerPhase::Exhausted;
                        return Ok(None);
                    }
                    Some(chrom) => {
                        debug!(
                            "Nothing left on {}, moving on to {}",
                            state.current_chrom, chrom
                        );
                        state.current_chrom = chrom.to_string();
                        continue;
                    }
                }
            }

            self.emit_overflow(&mut batch, &state.current_chrom, maxpos)?;
            self.flag_chrom_change(state);
            batch.fit_to_pieces();

            debug!(
                "Count window {} on {}: {} pieces, {}-{}",
                batch.index,
                batch.chrom,
                batch.len(),
                batch.start,
                batch.end
            );
            return Ok(Some(batch));
        }
    }

    /// Emit everything on the current chromosome up to the next span edge.
    pub fn advance_by_span(
        &mut self,
        state: &mut WindowState,
        bp_size: u64,
    ) -> Result<Option<Batch>> {
        if bp_size == 0 {
            return Err(GlessError::InvalidArgument(
                "window span must be greater than 0".to_string(),
            ));
        }
        if self.phase == MergerPhase::Exhausted {
            return Ok(None);
        }
        if self.frontier.is_empty() {
            debug!("All tracks exhausted after window {}", state.times_advanced);
            self.phase = MergerPhase::Exhausted;
            return Ok(None);
        }
        state.chrom_changed = false;
        state.next_chrom = None;

        let window_end = state
            .offset
            .saturating_add(state.times_advanced.saturating_mul(bp_size));
        let mut batch = Batch::new(
            state.times_advanced,
            &state.current_chrom,
            self.frontier.tracks(),
        );
        batch.start = window_end.saturating_sub(bp_size).max(state.offset);
        batch.end = window_end;

        for track in 0..self.frontier.tracks() {
            loop {
                let fits = match self.frontier.get_mut(track) {
                    Some(feature) if feature.chrom == state.current_chrom => {
                        if feature.end <= window_end {
                            true
                        } else {
                            if feature.start < window_end {
                                batch.tracks[track].push(feature.split_at(window_end));
                            }
                            false
                        }
                    }
                    _ => false,
                };
                if !fits {
                    break;
                }
                if let Some(feature) = self.frontier.take(track) {
                    batch.tracks[track].push(feature.into());
                }
                self.frontier.refill(&mut self.tracks, track)?;
            }
        }

        self.flag_chrom_change(state);

        if batch.is_empty() {
            trace!(
                "Span window {} on {} is empty",
                batch.index,
                batch.chrom
            );
            batch.fill_placeholders();
        } else {
            debug!(
                "Span window {} on {}: {} pieces, {}-{}",
                batch.index,
                batch.chrom,
                batch.len(),
                batch.start,
                batch.end
            );
        }
        Ok(Some(batch))
    }

    /// Cut pending features that begin before `maxpos` at `maxpos`.
    ///
    /// At most one piece per track; a pending feature that ends within the
    /// window is emitted whole and its track refilled.
    fn emit_overflow(&mut self, batch: &mut Batch, chrom: &str, maxpos: u64) -> Result<()> {
        for track in 0..self.frontier.tracks() {
            let whole = match self.frontier.get_mut(track) {
                Some(feature) if feature.chrom == chrom && feature.start < maxpos => {
                    if feature.end > maxpos {
                        batch.tracks[track].push(feature.split_at(maxpos));
                        false
                    } else {
                        true
                    }
                }
                _ => false,
            };
            if whole {
                if let Some(feature) = self.frontier.take(track) {
                    batch.tracks[track].push(feature.into());
                }
                self.frontier.refill(&mut self.tracks, track)?;
            }
        }
        Ok(())
    }

    /// Flag a chromosome change once no pending feature is left on the
    /// current chromosome.
    fn flag_chrom_change(&self, state: &mut WindowState) {
        if self.frontier.has_chrom(&state.current_chrom) {
            return;
        }
        if let Some(next) = self.frontier.first_chrom_besides(&state.current_chrom) {
            debug!("Chromosome change: {} -> {}", state.current_chrom, next);
            state.chrom_changed = true;
            state.next_chrom = Some(next.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{Feature, FeatureValue};
    use crate::track::{MemoryStream, MemoryTrack};

    fn label(s: &str) -> FeatureValue {
        FeatureValue::Label(s.to_string())
    }

    fn piece(start: u64, end: u64, value: &str) -> Piece {
        Piece::new(start, end, label(value))
    }

    fn f(chrom: &str, start: u64, end: u64, value: &str) -> Feature {
        Feature::labeled(chrom, start, end, value)
    }

    fn merger_for(
        tracks: Vec<Vec<Feature>>,
        mode: WindowMode,
        size: u64,
    ) -> (WindowMerger<MemoryStream>, WindowState) {
        let sources: Vec<MemoryTrack> = tracks
            .into_iter()
            .enumerate()
            .map(|(i, features)| MemoryTrack::new(format!("t{}", i), features))
            .collect();
        let mut set = TrackSet::open(&sources).unwrap();
        let frontier = Frontier::prime(&mut set).unwrap();
        let mut state = WindowState::new(mode, size);
        if let Some(chrom) = frontier.first_chrom() {
            state.current_chrom = chrom.to_string();
        }
        (WindowMerger::new(set, frontier), state)
    }

    #[test]
    fn test_count_two_track_scenario() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 1, 12, "a"), f("chr1", 19, 34, "b")],
                vec![f("chr1", 11, 17, "c")],
            ],
            WindowMode::Count,
            2,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(1, 12, "a")], vec![piece(11, 17, "c")]]);
        assert_eq!((batch.start, batch.end), (1, 17));
        assert!(!state.chrom_changed);

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(19, 34, "b")], vec![]]);
        assert_eq!(batch.index, 2);

        state.step();
        assert!(merger.advance(&mut state).unwrap().is_none());
        assert_eq!(merger.phase(), MergerPhase::Exhausted);
        assert!(merger.advance(&mut state).unwrap().is_none());
    }

    #[test]
    fn test_count_splits_features_at_window_edge() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 0, 10, "a"), f("chr1", 20, 30, "b")],
                vec![f("chr1", 5, 25, "c")],
            ],
            WindowMode::Count,
            1,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(0, 10, "a")], vec![piece(5, 10, "c")]]);

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(20, 25, "b")], vec![piece(10, 25, "c")]]);

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(25, 30, "b")], vec![]]);

        state.step();
        assert!(merger.advance(&mut state).unwrap().is_none());
    }

    #[test]
    fn test_count_emits_nested_feature_whole() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 0, 30, "a"), f("chr1", 5, 10, "x")],
                vec![f("chr1", 1, 40, "b")],
            ],
            WindowMode::Count,
            1,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(
            batch.tracks,
            vec![
                vec![piece(0, 30, "a"), piece(5, 10, "x")],
                vec![piece(1, 30, "b")]
            ]
        );

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![], vec![piece(30, 40, "b")]]);
    }

    #[test]
    fn test_count_picks_smallest_end_first() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 0, 8, "a"), f("chr1", 9, 12, "b")],
                vec![f("chr1", 2, 5, "c"), f("chr1", 6, 10, "d")],
            ],
            WindowMode::Count,
            4,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(
            batch.tracks,
            vec![
                vec![piece(0, 8, "a"), piece(9, 12, "b")],
                vec![piece(2, 5, "c"), piece(6, 10, "d")]
            ]
        );
        assert_eq!(batch.len(), 4);
    }

    #[test]
    fn test_count_detects_chromosome_change() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 1, 5, "a"), f("chr2", 2, 8, "b")],
                vec![f("chr1", 3, 6, "c")],
            ],
            WindowMode::Count,
            5,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.chrom, "chr1");
        assert_eq!(batch.tracks, vec![vec![piece(1, 5, "a")], vec![piece(3, 6, "c")]]);
        assert!(state.chrom_changed);
        assert_eq!(state.next_chrom.as_deref(), Some("chr2"));

        state.step();
        assert_eq!(state.current_chrom, "chr2");
        assert_eq!(state.times_advanced, 1);
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.chrom, "chr2");
        assert_eq!(batch.tracks, vec![vec![piece(2, 8, "b")], vec![]]);
        assert!(!state.chrom_changed);
    }

    #[test]
    fn test_count_moves_past_empty_chromosome() {
        let (mut merger, mut state) =
            merger_for(vec![vec![f("chr2", 1, 5, "a")]], WindowMode::Count, 3);
        state.current_chrom = "chr1".to_string();

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.chrom, "chr2");
        assert_eq!(state.current_chrom, "chr2");
    }

    #[test]
    fn test_span_splits_and_continues() {
        let (mut merger, mut state) = merger_for(
            vec![vec![f("chr1", 5, 15, "x"), f("chr1", 18, 22, "y")]],
            WindowMode::Span,
            10,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(5, 10, "x")]]);
        assert_eq!((batch.start, batch.end), (0, 10));

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(10, 15, "x"), piece(18, 20, "y")]]);
        assert_eq!((batch.start, batch.end), (10, 20));

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(20, 22, "y")]]);

        state.step();
        assert!(merger.advance(&mut state).unwrap().is_none());
        assert_eq!(merger.phase(), MergerPhase::Exhausted);
    }

    #[test]
    fn test_span_empty_window_is_placeholder() {
        let (mut merger, mut state) =
            merger_for(vec![vec![f("chr1", 50, 60, "a")], vec![]], WindowMode::Span, 10);

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert!(batch.is_placeholder());
        assert!(batch.is_empty());
        assert_eq!(batch.tracks, vec![vec![Piece::placeholder()], vec![Piece::placeholder()]]);

        state.times_advanced = 6;
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert!(!batch.is_placeholder());
        assert_eq!(batch.tracks, vec![vec![piece(50, 60, "a")], vec![]]);
    }

    #[test]
    fn test_span_detects_chromosome_change() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 0, 5, "a"), f("chr2", 0, 5, "b")],
                vec![f("chr1", 2, 4, "c"), f("chr2", 1, 3, "d")],
            ],
            WindowMode::Span,
            10,
        );

        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(0, 5, "a")], vec![piece(2, 4, "c")]]);
        assert!(state.chrom_changed);
        assert_eq!(state.next_chrom.as_deref(), Some("chr2"));

        state.step();
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.chrom, "chr2");
        assert_eq!(batch.tracks, vec![vec![piece(0, 5, "b")], vec![piece(1, 3, "d")]]);
    }

    #[test]
    fn test_span_no_change_while_a_track_remains() {
        let (mut merger, mut state) = merger_for(
            vec![
                vec![f("chr1", 0, 5, "a"), f("chr2", 0, 5, "b")],
                vec![f("chr1", 12, 14, "c")],
            ],
            WindowMode::Span,
            10,
        );

        merger.advance(&mut state).unwrap().unwrap();
        assert!(!state.chrom_changed);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let (mut merger, mut state) =
            merger_for(vec![vec![f("chr1", 1, 5, "a")]], WindowMode::Count, 1);

        let err = merger.advance_by_count(&mut state, 0).unwrap_err();
        assert!(matches!(err, GlessError::InvalidArgument(_)));
        let err = merger.advance_by_span(&mut state, 0).unwrap_err();
        assert!(matches!(err, GlessError::InvalidArgument(_)));

        // Nothing was consumed
        assert_eq!(merger.phase(), MergerPhase::Ready);
        let batch = merger.advance(&mut state).unwrap().unwrap();
        assert_eq!(batch.tracks, vec![vec![piece(1, 5, "a")]]);
    }

    #[test]
    fn test_window_state_edges() {
        let mut state = WindowState::new(WindowMode::Span, 100);
        assert_eq!((state.window_start(), state.window_end()), (0, 100));

        state.offset = 1000;
        state.times_advanced = 3;
        assert_eq!((state.window_start(), state.window_end()), (1200, 1300));

        state.chrom_changed = true;
        state.next_chrom = Some("chr2".to_string());
        state.step();
        assert_eq!(state.current_chrom, "chr2");
        assert_eq!((state.window_start(), state.window_end()), (0, 100));

        state.step();
        assert_eq!(state.times_advanced, 2);
        state.step_back();
        assert_eq!(state.times_advanced, 1);
    }
}
