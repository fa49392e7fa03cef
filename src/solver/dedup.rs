use std::hash::BuildHasherDefault;

use hashbrown::{HashMap as HbHashMap, HashSet as HbHashSet};
use serde::{Deserialize, Serialize};

use crate::hash::DedupKey;

type FastHasher = BuildHasherDefault<ahash::AHasher>;
type FineSet = HbHashSet<u128, FastHasher>;

/// Visited set bucketed by coarse key.
///
/// Each generation builds a fresh table. The first time a generation touches
/// a coarse key it takes over the previous generation's bucket for that key;
/// buckets the generation never touches are dropped with the old table. This
/// bounds memory to the progress levels still live on the frontier, at the
/// cost of forgetting states from abandoned levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupTable {
    buckets: HbHashMap<u32, FineSet, FastHasher>,
}

impl DedupTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` seen. Returns true if it was not seen before.
    #[inline]
    pub fn insert(&mut self, key: DedupKey) -> bool {
        self.buckets.entry(key.coarse).or_default().insert(key.fine)
    }

    /// Like [`DedupTable::insert`], but a bucket missing here is first moved
    /// over from `previous`.
    pub fn insert_inherit(&mut self, key: DedupKey, previous: &mut DedupTable) -> bool {
        self.buckets
            .entry(key.coarse)
            .or_insert_with(|| previous.buckets.remove(&key.coarse).unwrap_or_default())
            .insert(key.fine)
    }

    #[inline]
    pub fn contains(&self, key: DedupKey) -> bool {
        self.buckets
            .get(&key.coarse)
            .is_some_and(|b| b.contains(&key.fine))
    }

    /// Total number of fine keys.
    pub fn len(&self) -> usize {
        self.buckets.values().map(HbHashSet::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(HbHashSet::is_empty)
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
