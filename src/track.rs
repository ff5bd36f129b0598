//! Track sources and forward-only feature streams.
//!
//! A [`TrackSource`] describes where a track's features come from and can be
//! opened any number of times; each [`TrackStream`] it opens reads the track
//! once, from the beginning, and cannot be rewound. Going back to the start
//! of a track means opening a new stream.

use crate::bed::BedReader;
use crate::error::{GlessError, Result};
use crate::feature::Feature;
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A lazy, finite, forward-only sequence of features.
///
/// Features must be ordered by ascending start within each chromosome.
pub trait TrackStream {
    /// Pull the next feature. `Ok(None)` signals the end of the stream.
    fn next_feature(&mut self) -> Result<Option<Feature>>;
}

/// A re-openable track.
pub trait TrackSource {
    type Stream: TrackStream;

    /// Display name of the track.
    fn name(&self) -> &str;

    /// Whether the track holds intervals or density values.
    fn kind(&self) -> TrackKind;

    /// Open a fresh stream positioned at the first feature.
    fn open(&self) -> Result<Self::Stream>;
}

/// What a track's features represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    /// Labeled intervals (BED).
    Intervals,
    /// Scored intervals (bedGraph).
    Density,
}

/// On-disk track format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackFormat {
    Bed,
    BedGraph,
}

impl TrackFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "bed" => Ok(TrackFormat::Bed),
            "bedgraph" | "bdg" | "bg" => Ok(TrackFormat::BedGraph),
            _ => Err(GlessError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn kind(self) -> TrackKind {
        match self {
            TrackFormat::Bed => TrackKind::Intervals,
            TrackFormat::BedGraph => TrackKind::Density,
        }
    }
}

/// A track backed by a BED or bedGraph file.
#[derive(Debug, Clone)]
pub struct TrackFile {
    path: PathBuf,
    name: String,
    format: TrackFormat,
    check_sorted: bool,
}

impl TrackFile {
    /// Describe a track file; the format is taken from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = TrackFormat::from_path(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            format,
            check_sorted: true,
        })
    }

    /// Enable or disable inline sort validation (enabled by default).
    pub fn with_sort_check(mut self, enabled: bool) -> Self {
        self.check_sorted = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> TrackFormat {
        self.format
    }
}

impl TrackSource for TrackFile {
    type Stream = BedReader<File>;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TrackKind {
        self.format.kind()
    }

    fn open(&self) -> Result<Self::Stream> {
        Ok(BedReader::from_path(&self.path, self.format)?
            .with_name(self.name.clone())
            .with_sort_check(self.check_sorted))
    }
}

/// A track held in memory, mostly for tests and embedding.
#[derive(Debug, Clone)]
pub struct MemoryTrack {
    name: String,
    kind: TrackKind,
    features: Vec<Feature>,
}

impl MemoryTrack {
    /// Create an interval track.
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            kind: TrackKind::Intervals,
            features,
        }
    }

    pub fn with_kind(mut self, kind: TrackKind) -> Self {
        self.kind = kind;
        self
    }
}

impl TrackSource for MemoryTrack {
    type Stream = MemoryStream;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn open(&self) -> Result<Self::Stream> {
        Ok(MemoryStream {
            inner: self.features.clone().into_iter(),
        })
    }
}

/// Stream over a [`MemoryTrack`].
#[derive(Debug)]
pub struct MemoryStream {
    inner: std::vec::IntoIter<Feature>,
}

impl TrackStream for MemoryStream {
    #[inline]
    fn next_feature(&mut self) -> Result<Option<Feature>> {
        Ok(self.inner.next())
    }
}

/// The open streams of one reading pass, indexed by track.
///
/// A stream is closed (dropped) as soon as it reports its end, so every
/// track is read at most once per pass.
pub struct TrackSet<T: TrackStream> {
    names: Vec<String>,
    streams: Vec<Option<T>>,
    pulled: Vec<u64>,
}

impl<T: TrackStream> TrackSet<T> {
    /// Open one stream per source.
    pub fn open<S>(sources: &[S]) -> Result<Self>
    where
        S: TrackSource<Stream = T>,
    {
        let mut names = Vec::with_capacity(sources.len());
        let mut streams = Vec::with_capacity(sources.len());
        for source in sources {
            names.push(source.name().to_string());
            streams.push(Some(source.open()?));
        }
        Ok(Self {
            pulled: vec![0; streams.len()],
            names,
            streams,
        })
    }

    /// Number of tracks, open or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn name(&self, track: usize) -> &str {
        self.names.get(track).map(String::as_str).unwrap_or("")
    }

    /// Number of tracks whose stream is still open.
    pub fn open_count(&self) -> usize {
        self.streams.iter().filter(|s| s.is_some()).count()
    }

    #[inline]
    pub fn is_exhausted(&self, track: usize) -> bool {
        !matches!(self.streams.get(track), Some(Some(_)))
    }

    /// Number of features pulled from `track` so far.
    pub fn pulled(&self, track: usize) -> u64 {
        self.pulled.get(track).copied().unwrap_or(0)
    }

    /// Pull the next feature from `track`, closing the stream at its end.
    pub fn pull(&mut self, track: usize) -> Result<Option<Feature>> {
        let Some(stream) = self.streams.get_mut(track).and_then(Option::as_mut) else {
            return Ok(None);
        };
        let next = stream.next_feature()?;
        match next {
            Some(feature) => {
                self.pulled[track] += 1;
                Ok(Some(feature))
            }
            None => {
                debug!(
                    "Track {} exhausted after {} records",
                    self.names[track], self.pulled[track]
                );
                self.streams[track] = None;
                Ok(None)
            }
        }
    }

    /// Close the stream of `track` without reading further.
    pub fn close(&mut self, track: usize) {
        if let Some(slot) = self.streams.get_mut(track) {
            *slot = None;
        }
    }
}
