//! Streaming BED / bedGraph track reader.

use crate::error::{GlessError, Result};
use crate::feature::{Feature, FeatureValue};
use crate::streaming::buffers::{DEFAULT_LINE_BUFFER, TRACK_INPUT_BUFFER};
use crate::streaming::parsing::{fourth_field, parse_bed3_bytes, should_skip_line};
use crate::streaming::validation::SortValidator;
use crate::track::{TrackFormat, TrackStream};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A forward-only reader of BED or bedGraph records.
///
/// Header, comment and blank lines are skipped. The first three columns must
/// be chrom, start and end; the fourth becomes the feature value (a label for
/// BED, a score for bedGraph).
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    format: TrackFormat,
    track: String,
    line_number: usize,
    buffer: Vec<u8>,
    validator: Option<SortValidator>,
}

impl BedReader<File> {
    /// Open a track file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P, format: TrackFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self::with_capacity(TRACK_INPUT_BUFFER, file, format).with_name(path.display().to_string()))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new reader from any readable source.
    pub fn new(reader: R, format: TrackFormat) -> Self {
        Self::with_capacity(TRACK_INPUT_BUFFER, reader, format)
    }

    /// Create a reader with custom buffer capacity.
    pub fn with_capacity(capacity: usize, reader: R, format: TrackFormat) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            format,
            track: String::from("<input>"),
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
            validator: None,
        }
    }

    /// Set the track name used in error messages.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.track = name.into();
        if self.validator.is_some() {
            self.validator = Some(SortValidator::new(self.track.clone()));
        }
        self
    }

    /// Enable or disable inline sort validation.
    pub fn with_sort_check(mut self, enabled: bool) -> Self {
        self.validator = enabled.then(|| SortValidator::new(self.track.clone()));
        self
    }

    pub fn format(&self) -> TrackFormat {
        self.format
    }

    /// Number of lines consumed so far, including skipped ones.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next feature, or `None` at the end of the stream.
    pub fn read_feature(&mut self) -> Result<Option<Feature>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_ascii_end();
            if should_skip_line(line) || line.trim_ascii_start().is_empty() {
                continue;
            }

            let feature = self.parse_line(line)?;
            if let Some(validator) = self.validator.as_mut() {
                validator.validate(&feature.chrom, feature.start, self.line_number)?;
            }
            return Ok(Some(feature));
        }
    }

    /// Parse a single data line.
    fn parse_line(&self, line: &[u8]) -> Result<Feature> {
        let (chrom, start, end, rest_start) = parse_bed3_bytes(line).ok_or_else(|| {
            self.malformed(format!(
                "expected chrom, start and end as the first three tab-separated fields, got '{}'",
                String::from_utf8_lossy(line)
            ))
        })?;

        // Zero-length records carry nothing to display
        if start >= end {
            return Err(self.malformed(format!(
                "start ({}) must be less than end ({})",
                start, end
            )));
        }

        let chrom = self.utf8(chrom, "chromosome")?;

        let value = match (self.format, fourth_field(line, rest_start)) {
            (TrackFormat::Bed, Some(name)) => {
                FeatureValue::Label(self.utf8(name, "name")?.to_string())
            }
            (TrackFormat::Bed, None) => FeatureValue::Missing,
            (TrackFormat::BedGraph, Some(raw)) => {
                let raw = self.utf8(raw, "value")?;
                let score = raw.parse::<f64>().map_err(|_| {
                    self.malformed(format!("Invalid bedGraph value: '{}'", raw))
                })?;
                FeatureValue::Score(score)
            }
            (TrackFormat::BedGraph, None) => {
                return Err(self.malformed("bedGraph record has no value column".to_string()));
            }
        };

        Ok(Feature::new(chrom, start, end, value))
    }

    fn utf8<'a>(&self, field: &'a [u8], what: &str) -> Result<&'a str> {
        std::str::from_utf8(field)
            .map_err(|_| self.malformed(format!("{} field is not valid UTF-8", what)))
    }

    fn malformed(&self, message: String) -> GlessError {
        GlessError::MalformedRecord {
            track: self.track.clone(),
            line: self.line_number,
            message,
        }
    }

    /// Get an iterator over all features.
    pub fn features(self) -> FeatureIter<R> {
        FeatureIter { reader: self }
    }
}

impl<R: Read> TrackStream for BedReader<R> {
    #[inline]
    fn next_feature(&mut self) -> Result<Option<Feature>> {
        self.read_feature()
    }
}

/// Iterator over track features.
pub struct FeatureIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for FeatureIter<R> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_feature().transpose()
    }
}

/// Parse features from a string (useful for testing).
pub fn parse_features(content: &str, format: TrackFormat) -> Result<Vec<Feature>> {
    BedReader::new(content.as_bytes(), format)
        .features()
        .collect()
}
