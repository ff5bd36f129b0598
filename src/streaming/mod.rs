//! Streaming building blocks shared by the track readers and the merger.
//!
//! - Zero-allocation BED field scanning
//! - Inline sort validation
//! - The merge frontier (one pending feature per track)
//! - Batch output
//!
//! Memory stays O(k) in the number of tracks: nothing is buffered beyond one
//! pending feature per track and the batch being built.

pub mod buffers;
pub mod frontier;
pub mod output;
pub mod parsing;
pub mod validation;

pub use frontier::Frontier;
pub use output::{BatchConsumer, TextRenderer};
pub use parsing::{fourth_field, parse_bed3_bytes, parse_u64_fast, should_skip_line};
pub use validation::SortValidator;
