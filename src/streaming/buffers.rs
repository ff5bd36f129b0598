//! Buffer size constants for track I/O.
//!
//! A pager only needs a window's worth of records at a time, so buffers
//! are sized for interactive latency rather than bulk throughput.

/// Input buffer size per open track (64 KB).
pub const TRACK_INPUT_BUFFER: usize = 64 * 1024;

/// Output buffer size for rendered batches (64 KB).
pub const RENDER_OUTPUT_BUFFER: usize = 64 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most BED lines.
pub const DEFAULT_LINE_BUFFER: usize = 1024;
