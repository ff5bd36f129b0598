//! The merge frontier: at most one pending feature per track.
//!
//! The frontier is the only lookahead the windowing engine has. Each slot
//! holds the next not-yet-emitted feature of one track, possibly truncated
//! when an earlier window already emitted its head. A slot is refilled from
//! its stream as soon as its feature is consumed; an empty slot means the
//! track has left the active set for the rest of the pass.

use crate::error::Result;
use crate::feature::Feature;
use crate::track::{TrackSet, TrackStream};

#[derive(Debug, Clone, Default)]
pub struct Frontier {
    slots: Vec<Option<Feature>>,
}

impl Frontier {
    /// Create an empty frontier for `tracks` tracks.
    pub fn new(tracks: usize) -> Self {
        Self {
            slots: vec![None; tracks],
        }
    }

    /// Fill every slot with the first feature of its track.
    pub fn prime<T: TrackStream>(tracks: &mut TrackSet<T>) -> Result<Self> {
        let mut frontier = Self::new(tracks.len());
        for track in 0..tracks.len() {
            frontier.refill(tracks, track)?;
        }
        Ok(frontier)
    }

    /// Number of slots (tracks), pending or not.
    #[inline]
    pub fn tracks(&self) -> usize {
        self.slots.len()
    }

    /// Number of pending features.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True once no track has a pending feature.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    #[inline]
    pub fn get(&self, track: usize) -> Option<&Feature> {
        self.slots.get(track).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, track: usize) -> Option<&mut Feature> {
        self.slots.get_mut(track).and_then(Option::as_mut)
    }

    /// Remove and return the pending feature of `track`.
    #[inline]
    pub fn take(&mut self, track: usize) -> Option<Feature> {
        self.slots.get_mut(track).and_then(Option::take)
    }

    /// Replace the pending feature of `track`.
    #[inline]
    pub fn set(&mut self, track: usize, feature: Option<Feature>) {
        if let Some(slot) = self.slots.get_mut(track) {
            *slot = feature;
        }
    }

    /// Load the next feature of `track` from its stream into its slot.
    ///
    /// At the end of the stream the slot is left empty.
    pub fn refill<T: TrackStream>(&mut self, tracks: &mut TrackSet<T>, track: usize) -> Result<()> {
        let next = tracks.pull(track)?;
        self.set(track, next);
        Ok(())
    }

    /// Iterate over `(track, feature)` for every pending feature.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Feature)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|f| (i, f)))
    }

    /// Iterate over pending features on `chrom`.
    pub fn iter_on<'a>(&'a self, chrom: &'a str) -> impl Iterator<Item = (usize, &'a Feature)> {
        self.iter().filter(move |(_, f)| f.chrom == chrom)
    }

    /// Track whose pending feature on `chrom` ends first.
    ///
    /// Ties go to the lowest track index.
    pub fn min_end_on(&self, chrom: &str) -> Option<usize> {
        self.iter_on(chrom)
            .min_by_key(|(i, f)| (f.end, *i))
            .map(|(i, _)| i)
    }

    /// Smallest start among pending features on `chrom`.
    pub fn min_start_on(&self, chrom: &str) -> Option<u64> {
        self.iter_on(chrom).map(|(_, f)| f.start).min()
    }

    /// True if any pending feature lies on `chrom`.
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.iter_on(chrom).next().is_some()
    }

    /// Chromosome of the first pending feature, in track order.
    pub fn first_chrom(&self) -> Option<&str> {
        self.iter().next().map(|(_, f)| f.chrom.as_str())
    }

    /// Chromosome of the first pending feature not on `chrom`.
    pub fn first_chrom_besides(&self, chrom: &str) -> Option<&str> {
        self.iter()
            .find(|(_, f)| f.chrom != chrom)
            .map(|(_, f)| f.chrom.as_str())
    }
}
