use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use features::TrackID;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// A hit replaces the selection
    Single,
    /// Hits accumulate. Selecting the same track twice doesn't duplicate it.
    #[default]
    Multiple,
}

/// Tracks highlighted by clicking on them. Only hit-test results change this.
#[derive(Clone, Debug, Default)]
pub struct SelectionSet {
    mode: SelectionMode,
    ids: BTreeSet<TrackID>,
}

impl SelectionSet {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ids: BTreeSet::new(),
        }
    }

    /// A hit selects the track; a miss clears everything.
    pub fn apply_hit(&mut self, hit: Option<TrackID>) {
        match hit {
            Some(id) => {
                if self.mode == SelectionMode::Single {
                    self.ids.clear();
                }
                self.ids.insert(id);
            }
            None => self.ids.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: TrackID) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = TrackID> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
