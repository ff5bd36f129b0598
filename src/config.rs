//! Session configuration and display options.
//!
//! Everything here is plain data filled in by the command line (or by a
//! library caller) and validated once, before any track is opened.

use crate::error::{GlessError, Result};
use crate::selection::Selection;
use crate::window::WindowMode;
use std::str::FromStr;

/// Default number of features per window.
pub const DEFAULT_FEATURE_COUNT: u64 = 10;

/// How a session cuts its tracks into windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    mode: WindowMode,
    size: u64,
    selection: Option<Selection>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::count(DEFAULT_FEATURE_COUNT)
    }
}

impl SessionConfig {
    /// Windows of `n` features.
    pub fn count(n: u64) -> Self {
        Self {
            mode: WindowMode::Count,
            size: n,
            selection: None,
        }
    }

    /// Windows of `bp` base pairs.
    pub fn span(bp: u64) -> Self {
        Self {
            mode: WindowMode::Span,
            size: bp,
            selection: None,
        }
    }

    /// Start from a region instead of the beginning of the tracks.
    pub fn with_selection(mut self, selection: Option<Selection>) -> Self {
        self.selection = selection;
        self
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Reject configurations that cannot produce windows.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            let what = match self.mode {
                WindowMode::Count => "feature count",
                WindowMode::Span => "window span",
            };
            return Err(GlessError::InvalidArgument(format!(
                "{} must be greater than 0",
                what
            )));
        }
        Ok(())
    }
}

/// Optional clamping range for density scores (`-y max` or `-y min,max`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreLimits {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreLimits {
    /// Parse an optional limit string. Absent input means no clamping.
    pub fn parse(input: Option<&str>) -> Result<Self> {
        match input.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }

    /// Clamp `score` into the configured range.
    #[inline]
    pub fn clamp(&self, score: f64) -> f64 {
        let score = self.max.map_or(score, |max| score.min(max));
        self.min.map_or(score, |min| score.max(min))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl FromStr for ScoreLimits {
    type Err = GlessError;

    fn from_str(s: &str) -> Result<Self> {
        let wrong = || GlessError::InvalidArgument(format!("Wrong format for -y option: '{}'", s));
        let number = |v: &str| v.trim().parse::<f64>().map_err(|_| wrong());

        let limits = match s.split_once(',') {
            None => Self {
                min: None,
                max: Some(number(s)?),
            },
            Some((min, max)) => Self {
                min: Some(number(min)?),
                max: Some(number(max)?),
            },
        };
        if let (Some(min), Some(max)) = (limits.min, limits.max) {
            if min > max {
                return Err(wrong());
            }
        }
        Ok(limits)
    }
}
