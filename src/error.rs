//! Error type shared by track reading, selection and windowing.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading tracks or driving a session.
///
/// End of a track stream is not an error: streams report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum GlessError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Bad region formatting, got '-s {0}'")]
    InvalidSelectionFormat(String),

    #[error("Region {0} not found in any track")]
    RegionNotFound(String),

    #[error("Malformed record in {track} at line {line}: {message}")]
    MalformedRecord {
        track: String,
        line: usize,
        message: String,
    },

    #[error("Track {track} is not sorted: {message}")]
    UnsortedTrack { track: String, message: String },

    #[error("Unsupported track format: {0} (expected .bed or .bedGraph)")]
    UnsupportedFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, GlessError>;
