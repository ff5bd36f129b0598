//! Core feature types for genomic track records.

use std::fmt;

/// The payload carried by a feature: a display label or a numeric score.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Name column of a BED record.
    Label(String),
    /// Value column of a bedGraph record.
    Score(f64),
    /// No payload (BED3 lines, empty-window placeholders).
    Missing,
}

impl FeatureValue {
    /// Returns the score if this value is numeric.
    #[inline]
    pub fn score(&self) -> Option<f64> {
        match self {
            FeatureValue::Score(s) => Some(*s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Label(label) => write!(f, "{}", label),
            FeatureValue::Score(score) => write!(f, "{}", score),
            FeatureValue::Missing => write!(f, "."),
        }
    }
}

/// A genomic feature read from a track.
/// Uses 0-based, half-open coordinates (BED format).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub value: FeatureValue,
}

impl Feature {
    /// Create a new feature.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64, value: FeatureValue) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            value,
        }
    }

    /// Create a feature with a text label.
    pub fn labeled(chrom: impl Into<String>, start: u64, end: u64, label: &str) -> Self {
        Self::new(chrom, start, end, FeatureValue::Label(label.to_string()))
    }

    /// Create a feature with a numeric score.
    pub fn scored(chrom: impl Into<String>, start: u64, end: u64, score: f64) -> Self {
        Self::new(chrom, start, end, FeatureValue::Score(score))
    }

    /// Returns the length of the feature.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the feature has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The emitted form of this feature, without its chromosome.
    #[inline]
    pub fn to_piece(&self) -> Piece {
        Piece::new(self.start, self.end, self.value.clone())
    }

    /// Cut the feature at `pos`.
    ///
    /// Returns the head `[start, pos)` as a piece and keeps `[pos, end)` in
    /// `self`. `pos` must lie strictly inside the feature.
    pub fn split_at(&mut self, pos: u64) -> Piece {
        debug_assert!(self.start < pos && pos < self.end);
        let head = Piece::new(self.start, pos, self.value.clone());
        self.start = pos;
        head
    }

    /// Move the start forward to `pos` if the feature begins before it.
    #[inline]
    pub fn clip_start(&mut self, pos: u64) {
        if self.start < pos {
            self.start = pos.min(self.end);
        }
    }
}

impl From<Feature> for Piece {
    fn from(feature: Feature) -> Self {
        Piece::new(feature.start, feature.end, feature.value)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom, self.start, self.end, self.value
        )
    }
}

/// One `(start, end, value)` element of an emitted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub start: u64,
    pub end: u64,
    pub value: FeatureValue,
}

impl Piece {
    #[inline]
    pub fn new(start: u64, end: u64, value: FeatureValue) -> Self {
        Self { start, end, value }
    }

    /// The marker emitted for a track when a span window holds no data.
    #[inline]
    pub fn placeholder() -> Self {
        Self::new(0, 0, FeatureValue::Missing)
    }

    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.start == 0 && self.end == 0 && self.value.is_missing()
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
