//! gless: sequential windowing over sorted genomic tracks
//!
//! This library merges several sorted BED / bedGraph tracks into successive
//! display windows, either a fixed number of features or a fixed number of
//! base pairs at a time.
//!
//! # Features
//!
//! - **Streaming**: every track is read forward-only, one pending feature at a time
//! - **Exact tiling**: features crossing a window edge are split, never duplicated
//! - **Restartable**: a restart reopens the tracks instead of seeking backwards
//!
//! # Example
//!
//! ```rust,no_run
//! use gless::prelude::*;
//!
//! let tracks = vec![TrackFile::new("genes.bed").unwrap()];
//! let mut session = Session::open(tracks, SessionConfig::span(10_000)).unwrap();
//!
//! while let Advance::Batch(batch) = session.advance().unwrap() {
//!     println!("{} {}-{}: {} pieces", batch.chrom, batch.start, batch.end, batch.len());
//! }
//! ```

pub mod bed;
pub mod config;
pub mod error;
pub mod feature;
pub mod selection;
pub mod session;
pub mod streaming;
pub mod track;
pub mod window;

// Re-export commonly used types
pub use bed::{parse_features, BedReader};
pub use error::{GlessError, Result};
pub use feature::{Feature, FeatureValue, Piece};
pub use session::{Action, Advance, Response, Session};
pub use window::{Batch, WindowMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{parse_features, BedReader};
    pub use crate::config::{ScoreLimits, SessionConfig};
    pub use crate::error::{GlessError, Result};
    pub use crate::feature::{Feature, FeatureValue, Piece};
    pub use crate::selection::Selection;
    pub use crate::session::{Action, Advance, Response, Session, SessionStats};
    pub use crate::streaming::{BatchConsumer, TextRenderer};
    pub use crate::track::{MemoryTrack, TrackFile, TrackFormat, TrackKind, TrackSource};
    pub use crate::window::{Batch, WindowMode};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::prelude::*;

        let a = parse_features("chr1\t100\t200\tg1\nchr1\t150\t250\tg2\n", TrackFormat::Bed).unwrap();
        let b = parse_features("chr1\t0\t300\t2.5\n", TrackFormat::BedGraph).unwrap();
        let tracks = vec![
            MemoryTrack::new("a", a),
            MemoryTrack::new("b", b).with_kind(TrackKind::Density),
        ];

        let mut session = Session::open(tracks, SessionConfig::count(2)).unwrap();
        let Advance::Batch(batch) = session.advance().unwrap() else {
            panic!("expected a batch");
        };

        assert_eq!(batch.track(0).len(), 2);
        assert_eq!(batch.track(1), &[Piece::new(0, 250, FeatureValue::Score(2.5))]);
        assert_eq!(session.track_kinds(), vec![TrackKind::Intervals, TrackKind::Density]);
    }

    #[test]
    fn test_render_workflow() {
        use crate::prelude::*;

        let tracks = vec![MemoryTrack::new(
            "genes",
            vec![Feature::labeled("chr1", 5, 15, "x")],
        )];
        let mut session = Session::open(tracks, SessionConfig::span(10)).unwrap();

        let mut output = Vec::new();
        {
            let mut renderer = TextRenderer::new(&mut output, session.track_names());
            while let Advance::Batch(batch) = session.advance().unwrap() {
                renderer.draw(&batch, session.current_chromosome()).unwrap();
            }
        }

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "#window\t1\tchr1\t0\t10\ngenes\tchr1\t5\t10\tx\n\
             #window\t2\tchr1\t10\t20\ngenes\tchr1\t10\t15\tx\n"
        );
    }
}
