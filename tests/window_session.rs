//! Session-level properties of the windowing engine.
//!
//! These tests drive whole sessions over in-memory tracks and check what
//! must hold for every window size: features are tiled exactly once, windows
//! never mix chromosomes, restart replays and exhaustion is final.

use gless::prelude::*;

// =============================================================================
// Helper functions
// =============================================================================

/// Deterministic pseudo-random generator for track contents.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, modulo: u64) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) % modulo
    }
}

/// Tracks of non-overlapping features on chr1 then chr2, uniquely labeled.
fn generated_tracks(seed: u64, tracks: usize, per_chrom: usize) -> Vec<MemoryTrack> {
    let mut rng = Lcg(seed);
    (0..tracks)
        .map(|t| {
            let mut features = Vec::new();
            for chrom in ["chr1", "chr2"] {
                let mut pos = 0;
                for k in 0..per_chrom {
                    let start = pos + rng.next(7);
                    let end = start + 1 + rng.next(15);
                    features.push(Feature::labeled(
                        chrom,
                        start,
                        end,
                        &format!("t{}-{}-{}", t, chrom, k),
                    ));
                    pos = end;
                }
            }
            MemoryTrack::new(format!("track{}", t), features)
        })
        .collect()
}

/// Tracks whose features overlap and nest within each track.
///
/// Starts are non-decreasing; lengths vary enough that a long feature often
/// covers several of the following ones.
fn overlapping_tracks(seed: u64, tracks: usize, per_chrom: usize) -> Vec<MemoryTrack> {
    let mut rng = Lcg(seed);
    (0..tracks)
        .map(|t| {
            let mut features = Vec::new();
            for chrom in ["chr1", "chr2"] {
                let mut pos = 0;
                for k in 0..per_chrom {
                    let start = pos + rng.next(5);
                    let end = start + 1 + rng.next(40);
                    features.push(Feature::labeled(
                        chrom,
                        start,
                        end,
                        &format!("t{}-{}-{}", t, chrom, k),
                    ));
                    pos = start;
                }
            }
            MemoryTrack::new(format!("track{}", t), features)
        })
        .collect()
}

/// Read every source once, in track order.
fn source_features(sources: &[MemoryTrack]) -> Vec<Vec<Feature>> {
    sources
        .iter()
        .map(|t| {
            let mut stream = t.open().unwrap();
            let mut features = Vec::new();
            while let Some(f) = gless::track::TrackStream::next_feature(&mut stream).unwrap() {
                features.push(f);
            }
            features
        })
        .collect()
}

fn drain(session: &mut Session<MemoryTrack>) -> Vec<Batch> {
    let mut batches = Vec::new();
    while let Advance::Batch(batch) = session.advance().unwrap() {
        batches.push(batch);
    }
    batches
}

/// Glue consecutive pieces of one track back into features.
fn reassemble(batches: &[Batch], track: usize) -> Vec<Feature> {
    let mut features: Vec<Feature> = Vec::new();
    for batch in batches {
        for piece in batch.track(track) {
            if piece.is_placeholder() {
                continue;
            }
            match features.last_mut() {
                Some(last)
                    if last.chrom == batch.chrom
                        && last.end == piece.start
                        && last.value == piece.value =>
                {
                    last.end = piece.end;
                }
                _ => features.push(Feature::new(
                    batch.chrom.clone(),
                    piece.start,
                    piece.end,
                    piece.value.clone(),
                )),
            }
        }
    }
    features
}

fn configs() -> Vec<SessionConfig> {
    vec![
        SessionConfig::count(1),
        SessionConfig::count(2),
        SessionConfig::count(3),
        SessionConfig::count(7),
        SessionConfig::span(5),
        SessionConfig::span(13),
        SessionConfig::span(50),
    ]
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_every_feature_tiled_exactly_once() {
    for seed in [1, 7, 42] {
        let expected = source_features(&generated_tracks(seed, 3, 12));
        for config in configs() {
            let mut session = Session::open(generated_tracks(seed, 3, 12), config.clone()).unwrap();
            let batches = drain(&mut session);

            for (track, features) in expected.iter().enumerate() {
                assert_eq!(
                    &reassemble(&batches, track),
                    features,
                    "seed {} {:?} track {}",
                    seed,
                    config,
                    track
                );
            }
        }
    }
}

#[test]
fn test_overlapping_features_tiled_exactly_once() {
    for seed in [4, 19, 77] {
        let expected = source_features(&overlapping_tracks(seed, 3, 15));
        for config in configs() {
            let mut session =
                Session::open(overlapping_tracks(seed, 3, 15), config.clone()).unwrap();
            let batches = drain(&mut session);

            for (track, features) in expected.iter().enumerate() {
                assert_eq!(
                    &reassemble(&batches, track),
                    features,
                    "seed {} {:?} track {}",
                    seed,
                    config,
                    track
                );
            }
            for batch in &batches {
                for (_, piece) in batch.pieces() {
                    assert!(piece.start < piece.end, "{:?}: empty piece", config);
                }
            }
        }
    }
}

#[test]
fn test_overlapping_restart_is_idempotent() {
    for config in configs() {
        let mut session = Session::open(overlapping_tracks(8, 3, 12), config.clone()).unwrap();
        let first_pass = drain(&mut session);

        session.restart().unwrap();
        session.advance().unwrap();
        session.restart().unwrap();
        assert_eq!(drain(&mut session), first_pass, "{:?}", config);
    }
}

#[test]
fn test_windows_never_mix_chromosomes() {
    for config in configs() {
        let mut session = Session::open(generated_tracks(3, 3, 10), config.clone()).unwrap();
        let batches = drain(&mut session);

        let chroms: Vec<&str> = batches.iter().map(|b| b.chrom.as_str()).collect();
        let switch = chroms.iter().position(|c| *c == "chr2").unwrap();
        assert!(chroms[..switch].iter().all(|c| *c == "chr1"), "{:?}", config);
        assert!(chroms[switch..].iter().all(|c| *c == "chr2"), "{:?}", config);
    }
}

#[test]
fn test_span_pieces_stay_inside_window() {
    for bp in [5, 13, 50] {
        let mut session = Session::open(generated_tracks(11, 3, 10), SessionConfig::span(bp)).unwrap();
        for batch in drain(&mut session) {
            assert_eq!(batch.end - batch.start, bp);
            for (_, piece) in batch.pieces() {
                assert!(piece.start >= batch.start && piece.end <= batch.end);
            }
        }
    }
}

#[test]
fn test_span_windows_are_consecutive() {
    let mut session = Session::open(generated_tracks(5, 2, 10), SessionConfig::span(20)).unwrap();
    let batches = drain(&mut session);

    for pair in batches.windows(2) {
        if pair[0].chrom == pair[1].chrom {
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert_eq!(pair[1].start, pair[0].end);
        } else {
            assert_eq!(pair[1].index, 1);
            assert_eq!(pair[1].start, 0);
        }
    }
}

#[test]
fn test_restart_is_idempotent() {
    for config in configs() {
        let mut session = Session::open(generated_tracks(21, 3, 10), config.clone()).unwrap();
        let first_pass = drain(&mut session);

        session.restart().unwrap();
        let second_pass = drain(&mut session);
        assert_eq!(first_pass, second_pass, "{:?}", config);

        // Restart midway through a pass
        session.restart().unwrap();
        session.advance().unwrap();
        session.advance().unwrap();
        session.restart().unwrap();
        assert_eq!(drain(&mut session), first_pass, "{:?}", config);
    }
}

#[test]
fn test_exhaustion_is_terminal() {
    for config in configs() {
        let mut session = Session::open(generated_tracks(2, 2, 5), config).unwrap();
        drain(&mut session);
        let state = session.state().clone();
        let chrom = session.current_chromosome().to_string();

        for _ in 0..5 {
            assert_eq!(session.advance().unwrap(), Advance::EndOfData);
        }
        assert_eq!(session.state(), &state);
        assert_eq!(session.current_chromosome(), chrom);
    }
}

#[test]
fn test_selection_tiles_region_exactly() {
    let expected = source_features(&generated_tracks(13, 3, 12));
    let selection = Selection::parse(Some("chr2:40")).unwrap();
    let mut session =
        Session::open(generated_tracks(13, 3, 12), SessionConfig::count(3).with_selection(selection))
            .unwrap();
    let batches = drain(&mut session);
    assert!(batches.iter().all(|b| b.chrom == "chr2"));

    for (track, features) in expected.iter().enumerate() {
        let mut clipped: Vec<Feature> = features
            .iter()
            .filter(|f| f.chrom == "chr2" && f.end > 40)
            .cloned()
            .collect();
        for f in &mut clipped {
            f.clip_start(40);
        }
        assert_eq!(reassemble(&batches, track), clipped, "track {}", track);
    }
}
