//! Batch output.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation per piece.

use crate::config::ScoreLimits;
use crate::error::Result;
use crate::feature::{FeatureValue, Piece};
use crate::streaming::buffers::RENDER_OUTPUT_BUFFER;
use crate::window::Batch;
use std::io::{BufWriter, Write};

/// Anything that can display emitted windows.
pub trait BatchConsumer {
    /// Show one batch. `chrom` is the chromosome the batch belongs to.
    fn draw(&mut self, batch: &Batch, chrom: &str) -> Result<()>;
}

/// Plain-text renderer: one header line per window, one line per piece.
///
/// ```text
/// #window  1  chr1  1  17
/// genes.bed  chr1  1  12  a
/// ```
pub struct TextRenderer<W: Write> {
    writer: BufWriter<W>,
    names: Vec<String>,
    limits: ScoreLimits,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> TextRenderer<W> {
    /// Create a renderer for tracks named `names`, in track order.
    pub fn new(output: W, names: Vec<String>) -> Self {
        Self {
            writer: BufWriter::with_capacity(RENDER_OUTPUT_BUFFER, output),
            names,
            limits: ScoreLimits::default(),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Clamp density scores before printing them.
    pub fn with_limits(mut self, limits: ScoreLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Write a free-form message line.
    pub fn message(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    #[inline]
    fn write_int(&mut self, n: u64) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    fn write_header(&mut self, batch: &Batch, chrom: &str) -> Result<()> {
        self.writer.write_all(b"#window\t")?;
        self.write_int(batch.index)?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_int(batch.start)?;
        self.writer.write_all(b"\t")?;
        self.write_int(batch.end)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn write_piece(&mut self, track: usize, chrom: &str, piece: &Piece) -> Result<()> {
        let name = self.names.get(track).map(String::as_str).unwrap_or("?");
        self.writer.write_all(name.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_int(piece.start)?;
        self.writer.write_all(b"\t")?;
        self.write_int(piece.end)?;
        self.writer.write_all(b"\t")?;
        match &piece.value {
            FeatureValue::Label(label) => self.writer.write_all(label.as_bytes())?,
            FeatureValue::Score(score) => {
                let score = self.limits.clamp(*score);
                self.writer.write_all(self.ryu_buf.format(score).as_bytes())?;
            }
            // Unnamed features are labeled by their coordinates
            FeatureValue::Missing => {
                self.write_int(piece.start)?;
                self.writer.write_all(b"-")?;
                self.write_int(piece.end)?;
            }
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Get mutable reference to the underlying writer.
    pub fn inner_mut(&mut self) -> &mut BufWriter<W> {
        &mut self.writer
    }
}

impl<W: Write> BatchConsumer for TextRenderer<W> {
    fn draw(&mut self, batch: &Batch, chrom: &str) -> Result<()> {
        self.write_header(batch, chrom)?;
        if batch.is_placeholder() {
            self.writer.write_all(b"#empty\n")?;
        } else {
            for (track, piece) in batch.pieces() {
                self.write_piece(track, chrom, piece)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
