use indexmap::{map::Entry, IndexMap};

use crate::{CoverageRecord, ProfileError, RangeKey, Result};

/// Accumulated hit counts keyed by range. Iteration follows the order in
/// which each range was first seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregationTable {
    inner: IndexMap<RangeKey, i64>,
}

impl AggregationTable {
    pub fn new() -> AggregationTable {
        AggregationTable {
            inner: Default::default(),
        }
    }

    /// Adds a record's count to its range, inserting the range if unseen.
    /// Returns `true` when the record was merged into an existing range.
    pub fn add(&mut self, record: CoverageRecord) -> Result<bool> {
        match self.inner.entry(record.key) {
            Entry::Occupied(mut entry) => {
                let accumulated = *entry.get();
                let sum = accumulated.checked_add(record.count).ok_or_else(|| {
                    ProfileError::CountOverflow {
                        key: entry.key().to_string(),
                        accumulated,
                        addend: record.count,
                    }
                })?;
                *entry.get_mut() = sum;
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(record.count);
                Ok(false)
            }
        }
    }

    pub fn get(&self, key: &RangeKey) -> Option<i64> {
        self.inner.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RangeKey, i64)> {
        self.inner.iter().map(|(key, count)| (key, *count))
    }

    /// Reorders entries lexicographically by their rendered key.
    pub fn sort_by_key(&mut self) {
        self.inner
            .sort_by(|a, _, b, _| a.to_string().cmp(&b.to_string()));
    }
}
