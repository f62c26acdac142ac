use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The track identifier exactly as the source data spells it. Numeric identifiers are kept in
/// their decimal form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackName(pub String);

impl std::fmt::Display for TrackName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackID(pub usize);

impl CheapID for TrackID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}

pub trait CheapID: Copy {
    fn new(x: usize) -> Self;
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IDMapping<K: Ord, V> {
    orig_to_cheap: BTreeMap<K, V>,
    // We don't need to store the inverse. It's more convenient for each object to own that.
}

impl<K: Clone + std::fmt::Debug + Ord, V: CheapID> IDMapping<K, V> {
    pub fn new() -> Self {
        Self {
            orig_to_cheap: BTreeMap::new(),
        }
    }

    /// Cheap IDs are handed out in the order originals are first seen.
    pub fn insert_idempotent(&mut self, orig: &K) -> V {
        match self.orig_to_cheap.get(orig) {
            Some(x) => *x,
            None => {
                let v = V::new(self.orig_to_cheap.len());
                self.orig_to_cheap.insert(orig.clone(), v);
                v
            }
        }
    }

    pub fn get(&self, orig: &K) -> Option<V> {
        self.orig_to_cheap.get(orig).copied()
    }

    pub fn len(&self) -> usize {
        self.orig_to_cheap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orig_to_cheap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_inserts_reuse_ids() {
        let mut ids: IDMapping<TrackName, TrackID> = IDMapping::new();
        let a = ids.insert_idempotent(&TrackName("a".to_string()));
        let b = ids.insert_idempotent(&TrackName("b".to_string()));
        assert_eq!(a, TrackID(0));
        assert_eq!(b, TrackID(1));
        assert_eq!(ids.insert_idempotent(&TrackName("a".to_string())), a);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.get(&TrackName("b".to_string())), Some(b));
        assert_eq!(ids.get(&TrackName("c".to_string())), None);
    }
}
