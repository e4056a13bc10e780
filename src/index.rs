use indexmap::IndexMap;

use crate::normalize::normalize;
use crate::types::*;

///Maps a normalised name to all records that carry it, in insertion order
pub type LevelIndex = IndexMap<String, Vec<RecordId>>;

///One lookup map per administrative level. Holds record ids, never copies of records.
#[derive(Clone, Debug, Default)]
pub struct HierarchicalIndex {
    levels: [LevelIndex; 4],
}

impl HierarchicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    ///Build the index over a sequence of records; record ids are positions in the sequence
    pub fn build(records: &[AddressRecord]) -> Self {
        let mut index = Self::new();
        for (id, record) in records.iter().enumerate() {
            index.insert(id as RecordId, record);
        }
        index
    }

    ///Adds a record under the normalised name of every level for which it has one
    pub fn insert(&mut self, id: RecordId, record: &AddressRecord) {
        for level in Level::ALL {
            let key = normalize(record.get(level));
            if !key.is_empty() {
                self.levels[level.index()].entry(key).or_default().push(id);
            }
        }
    }

    ///Exact lookup; the key must already be normalised
    pub fn get(&self, level: Level, key: &str) -> Option<&[RecordId]> {
        self.levels[level.index()]
            .get(key)
            .map(|ids| ids.as_slice())
            .filter(|ids| !ids.is_empty())
    }

    pub fn contains_key(&self, level: Level, key: &str) -> bool {
        self.get(level, key).is_some()
    }

    ///All keys of a level, in insertion order
    pub fn keys(&self, level: Level) -> impl Iterator<Item = &str> {
        self.levels[level.index()].keys().map(|k| k.as_str())
    }

    pub fn level(&self, level: Level) -> &LevelIndex {
        &self.levels[level.index()]
    }

    ///Number of distinct keys at a level
    pub fn len(&self, level: Level) -> usize {
        self.levels[level.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|l| l.is_empty())
    }
}
