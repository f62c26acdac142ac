#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ingest;
mod track;
mod units;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use features::{IDMapping, TrackID, TrackName};

pub use self::ingest::{earliest_start, ingest, Fields, IngestStats};
pub use self::track::{Placement, Pt2D, TimeExtent, Track, Vertex};
pub use self::units::{TimeUnit, Timeline};

/// Every track, ready to be replayed. A model is never changed after it's built; new source data
/// means building a new one.
#[derive(Clone, Serialize, Deserialize)]
pub struct TrackModel {
    pub timeline: Timeline,
    pub stats: IngestStats,
    tracks: BTreeMap<TrackID, Track>,
    ids: IDMapping<TrackName, TrackID>,
}

impl TrackModel {
    fn new(
        timeline: Timeline,
        tracks: BTreeMap<TrackID, Track>,
        ids: IDMapping<TrackName, TrackID>,
        stats: IngestStats,
    ) -> Self {
        Self {
            timeline,
            stats,
            tracks,
            ids,
        }
    }

    pub fn empty(timeline: Timeline) -> Self {
        Self::new(
            timeline,
            BTreeMap::new(),
            IDMapping::new(),
            IngestStats::default(),
        )
    }

    /// In ID order, which is the order tracks first appeared in the input
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn get(&self, id: TrackID) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn find(&self, name: &TrackName) -> Option<&Track> {
        self.ids.get(name).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Spans every track. None if there are no tracks.
    pub fn full_extent(&self) -> Option<TimeExtent> {
        self.tracks
            .values()
            .map(|track| track.time_extent())
            .reduce(TimeExtent::union)
    }
}
