//! The pager controller.
//!
//! A [`Session`] owns the sources, the merger and the window counters, and
//! turns viewer actions into batches. Restarting reopens every source; no
//! stream is ever read backwards.

use crate::config::SessionConfig;
use crate::error::{GlessError, Result};
use crate::selection::SeekReport;
use crate::streaming::frontier::Frontier;
use crate::track::{TrackKind, TrackSet, TrackSource};
use crate::window::{Batch, WindowMerger, WindowState};
use log::{debug, info};
use std::fmt;
use std::str::FromStr;

/// A discrete viewer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Restart,
    Quit,
    ShiftLeft,
    ShiftRight,
}

impl FromStr for Action {
    type Err = GlessError;

    /// Parse a pager command: empty or `n` for next, `r`, `q`, `<`, `>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "n" => Ok(Action::Next),
            "r" => Ok(Action::Restart),
            "q" => Ok(Action::Quit),
            "<" => Ok(Action::ShiftLeft),
            ">" => Ok(Action::ShiftRight),
            other => Err(GlessError::InvalidArgument(format!(
                "Unknown command '{}'",
                other
            ))),
        }
    }
}

/// Result of [`Session::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Batch(Batch),
    EndOfData,
}

/// Result of [`Session::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Draw(Batch),
    EndOfData,
    Quit,
    Unsupported(Action),
}

/// Counters over the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub batches: u64,
    pub pieces: u64,
    pub placeholders: u64,
    pub restarts: u64,
}

impl SessionStats {
    fn record(&mut self, batch: &Batch) {
        self.batches += 1;
        if batch.is_placeholder() {
            self.placeholders += 1;
        } else {
            self.pieces += batch.len() as u64;
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} windows ({} empty), {} pieces, {} restarts",
            self.batches, self.placeholders, self.pieces, self.restarts
        )
    }
}

/// A windowing session over a fixed set of tracks.
pub struct Session<S: TrackSource> {
    sources: Vec<S>,
    config: SessionConfig,
    merger: WindowMerger<S::Stream>,
    state: WindowState,
    seek: Option<SeekReport>,
    started: bool,
    label: String,
    stats: SessionStats,
}

impl<S: TrackSource> Session<S> {
    /// Open every source, prime the merge and apply the selection.
    pub fn open(sources: Vec<S>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        if sources.is_empty() {
            return Err(GlessError::InvalidArgument("no tracks given".to_string()));
        }

        let (merger, state, seek) = Self::build(&sources, &config)?;
        info!(
            "Opened {} tracks, {} windows of {}, starting on {}",
            sources.len(),
            config.mode(),
            config.size(),
            if state.current_chrom.is_empty() {
                "<none>"
            } else {
                state.current_chrom.as_str()
            }
        );

        Ok(Self {
            label: state.current_chrom.clone(),
            sources,
            config,
            merger,
            state,
            seek,
            started: false,
            stats: SessionStats::default(),
        })
    }

    fn build(
        sources: &[S],
        config: &SessionConfig,
    ) -> Result<(WindowMerger<S::Stream>, WindowState, Option<SeekReport>)> {
        let mut tracks = TrackSet::open(sources)?;
        let mut frontier = Frontier::prime(&mut tracks)?;
        let mut state = WindowState::new(config.mode(), config.size());

        let seek = match config.selection() {
            Some(selection) => Some(selection.seek(&mut tracks, &mut frontier, &mut state)?),
            None => {
                if let Some(chrom) = frontier.first_chrom() {
                    state.current_chrom = chrom.to_string();
                }
                None
            }
        };

        Ok((WindowMerger::new(tracks, frontier), state, seek))
    }

    /// Produce the next window, or [`Advance::EndOfData`] once every track
    /// is exhausted.
    pub fn advance(&mut self) -> Result<Advance> {
        if self.started {
            self.state.step();
        }
        match self.merger.advance(&mut self.state)? {
            Some(batch) => {
                self.started = true;
                self.label.clone_from(&batch.chrom);
                self.stats.record(&batch);
                Ok(Advance::Batch(batch))
            }
            None => {
                if self.started {
                    self.state.step_back();
                }
                Ok(Advance::EndOfData)
            }
        }
    }

    /// Go back to the first window by reopening every source.
    pub fn restart(&mut self) -> Result<()> {
        let (merger, state, seek) = Self::build(&self.sources, &self.config)?;
        self.merger = merger;
        self.state = state;
        self.seek = seek;
        self.started = false;
        self.label.clone_from(&self.state.current_chrom);
        self.stats.restarts += 1;
        info!("Restarted from {}", self.label);
        Ok(())
    }

    /// Chromosome of the last emitted window.
    pub fn current_chromosome(&self) -> &str {
        &self.label
    }

    /// Carry out a viewer action.
    pub fn apply(&mut self, action: Action) -> Result<Response> {
        match action {
            Action::Next => self.next_response(),
            Action::Restart => {
                self.restart()?;
                self.next_response()
            }
            Action::Quit => Ok(Response::Quit),
            Action::ShiftLeft | Action::ShiftRight => {
                debug!("{:?} is not supported", action);
                Ok(Response::Unsupported(action))
            }
        }
    }

    fn next_response(&mut self) -> Result<Response> {
        Ok(match self.advance()? {
            Advance::Batch(batch) => Response::Draw(batch),
            Advance::EndOfData => Response::EndOfData,
        })
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// What the last selection seek skipped and dropped.
    pub fn seek_report(&self) -> Option<&SeekReport> {
        self.seek.as_ref()
    }

    pub fn track_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn track_kinds(&self) -> Vec<TrackKind> {
        self.sources.iter().map(TrackSource::kind).collect()
    }
}
