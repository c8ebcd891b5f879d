//! Bounded probe history

use std::collections::VecDeque;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of results a health check keeps
pub const MAX_HISTORY: usize = 10;

/// Bounded FIFO of the most recent results, oldest first
///
/// Pushing past [`MAX_HISTORY`] evicts the oldest entry. Serialized as a plain
/// JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
}

impl<T> HistoryBuffer<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Append a result, evicting the oldest one at capacity
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == MAX_HISTORY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry
    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for HistoryBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::new();
        for entry in iter {
            buffer.push(entry);
        }
        buffer
    }
}

impl<T: Serialize> Serialize for HistoryBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for HistoryBuffer<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<T>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}
