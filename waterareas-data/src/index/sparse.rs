//! Indexes that only hold the ids actually seen.

use std::collections::BTreeMap;

use super::{IndexError, Location, LocationIndex};

/// Sorted vector of id/location pairs searched by bisection.
///
/// Inserts append; [`LocationIndex::sort`] must run before lookups when ids
/// arrived out of order.
#[derive(Debug)]
pub struct SparseMemArray {
    entries: Vec<(i64, Location)>,
    sorted: bool,
}

impl Default for SparseMemArray {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            sorted: true,
        }
    }
}

impl SparseMemArray {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationIndex for SparseMemArray {
    fn set(&mut self, id: i64, location: Location) -> Result<(), IndexError> {
        if let Some(&(last, _)) = self.entries.last()
            && id <= last
        {
            self.sorted = false;
        }
        self.entries.push((id, location));
        Ok(())
    }

    fn get(&self, id: i64) -> Option<Location> {
        if !self.sorted {
            return self
                .entries
                .iter()
                .rev()
                .find(|(entry, _)| *entry == id)
                .map(|&(_, location)| location);
        }
        self.entries
            .binary_search_by_key(&id, |&(entry, _)| entry)
            .ok()
            .and_then(|position| self.entries.get(position))
            .map(|&(_, location)| location)
    }

    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.entries.sort_by_key(|&(id, _)| id);
        // Later inserts win.
        self.entries.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                *earlier = *later;
                true
            } else {
                false
            }
        });
        self.sorted = true;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn used_memory(&self) -> usize {
        self.entries.capacity() * std::mem::size_of::<(i64, Location)>()
    }
}

/// Ordered map from node id to location.
#[derive(Debug, Default)]
pub struct SparseMemMap {
    entries: BTreeMap<i64, Location>,
}

impl SparseMemMap {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationIndex for SparseMemMap {
    fn set(&mut self, id: i64, location: Location) -> Result<(), IndexError> {
        self.entries.insert(id, location);
        Ok(())
    }

    fn get(&self, id: i64) -> Option<Location> {
        self.entries.get(&id).copied()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn used_memory(&self) -> usize {
        self.entries.len() * std::mem::size_of::<(i64, Location)>()
    }
}

/// Index that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndex;

impl LocationIndex for NullIndex {
    fn set(&mut self, _id: i64, _location: Location) -> Result<(), IndexError> {
        Ok(())
    }

    fn get(&self, _id: i64) -> Option<Location> {
        None
    }

    fn len(&self) -> usize {
        0
    }

    fn used_memory(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn location(lon: f64) -> Location {
        Location::from_degrees(lon, 0.0).expect("valid location")
    }

    #[rstest]
    fn sorts_out_of_order_inserts_and_keeps_last_value() {
        let mut index = SparseMemArray::new();
        for (id, lon) in [(30, 3.0), (-5, -0.5), (10, 1.0), (30, 4.0)] {
            index.set(id, location(lon)).expect("store");
        }
        assert_eq!(index.get(30), Some(location(4.0)));
        index.sort();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(-5), Some(location(-0.5)));
        assert_eq!(index.get(10), Some(location(1.0)));
        assert_eq!(index.get(30), Some(location(4.0)));
        assert_eq!(index.get(20), None);
    }

    #[rstest]
    fn map_accepts_negative_ids() {
        let mut index = SparseMemMap::new();
        index.set(-9, location(9.0)).expect("store");
        assert_eq!(index.get(-9), Some(location(9.0)));
        assert!(!index.is_empty());
    }
}
