//! Indexes addressed directly by node id.

use memmap2::MmapMut;

use super::{IndexError, Location, LocationIndex};

const SLOT_BYTES: usize = 8;
const MIN_SLOTS: usize = 1 << 16;
const UNDEFINED: (i32, i32) = (i32::MIN, i32::MIN);

fn slot(id: i64) -> Result<usize, IndexError> {
    if id < 0 {
        return Err(IndexError::NegativeId { id });
    }
    usize::try_from(id).map_err(|_| IndexError::OutOfRange { id })
}

fn grown_len(current: usize, needed: usize, id: i64) -> Result<usize, IndexError> {
    let wanted = needed
        .checked_add(1)
        .ok_or(IndexError::OutOfRange { id })?;
    Ok(wanted.max(current.saturating_mul(2)).max(MIN_SLOTS))
}

/// Node locations in an anonymous memory map, 8 bytes per possible id.
///
/// Each coordinate is stored with its sign bit flipped so untouched (zeroed)
/// pages decode as "no location".
#[derive(Debug, Default)]
pub struct DenseMmapArray {
    map: Option<MmapMut>,
    stored: usize,
}

impl DenseMmapArray {
    /// Create an empty index; memory is mapped on first insert.
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> usize {
        self.map.as_ref().map_or(0, |map| map.len() / SLOT_BYTES)
    }

    fn grow(&mut self, index: usize, id: i64) -> Result<(), IndexError> {
        let slots = grown_len(self.slots(), index, id)?;
        let bytes = slots
            .checked_mul(SLOT_BYTES)
            .ok_or(IndexError::OutOfRange { id })?;
        let mut grown =
            MmapMut::map_anon(bytes).map_err(|source| IndexError::Map { bytes, source })?;
        if let Some(old) = &self.map
            && let Some(prefix) = grown.get_mut(..old.len())
        {
            prefix.copy_from_slice(old);
        }
        self.map = Some(grown);
        Ok(())
    }

    fn decode(bytes: &[u8]) -> Option<Location> {
        let (x, y) = bytes.split_at_checked(4)?;
        let x = i32::from_le_bytes(x.try_into().ok()?) ^ i32::MIN;
        let y = i32::from_le_bytes(y.try_into().ok()?) ^ i32::MIN;
        ((x, y) != UNDEFINED).then(|| Location::from_fixed(x, y))
    }

    fn encode(location: Location) -> [u8; SLOT_BYTES] {
        let (x, y) = location.fixed();
        let mut bytes = [0; SLOT_BYTES];
        bytes[..4].copy_from_slice(&(x ^ i32::MIN).to_le_bytes());
        bytes[4..].copy_from_slice(&(y ^ i32::MIN).to_le_bytes());
        bytes
    }

    fn slot_bytes(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(SLOT_BYTES)?;
        self.map.as_ref()?.get(start..start + SLOT_BYTES)
    }
}

impl LocationIndex for DenseMmapArray {
    fn set(&mut self, id: i64, location: Location) -> Result<(), IndexError> {
        let index = slot(id)?;
        if index >= self.slots() {
            self.grow(index, id)?;
        }
        let was_empty = self.slot_bytes(index).and_then(Self::decode).is_none();
        let start = index * SLOT_BYTES;
        let target = self
            .map
            .as_mut()
            .and_then(|map| map.get_mut(start..start + SLOT_BYTES))
            .ok_or(IndexError::OutOfRange { id })?;
        target.copy_from_slice(&Self::encode(location));
        if was_empty {
            self.stored += 1;
        }
        Ok(())
    }

    fn get(&self, id: i64) -> Option<Location> {
        let index = slot(id).ok()?;
        self.slot_bytes(index).and_then(Self::decode)
    }

    fn len(&self) -> usize {
        self.stored
    }

    fn used_memory(&self) -> usize {
        self.map.as_ref().map_or(0, |map| map.len())
    }
}

/// Node locations in a heap vector indexed by node id.
#[derive(Debug, Default)]
pub struct DenseMemArray {
    slots: Vec<(i32, i32)>,
    stored: usize,
}

impl DenseMemArray {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationIndex for DenseMemArray {
    fn set(&mut self, id: i64, location: Location) -> Result<(), IndexError> {
        let index = slot(id)?;
        if index >= self.slots.len() {
            let len = grown_len(self.slots.len(), index, id)?;
            self.slots.resize(len, UNDEFINED);
        }
        let entry = self
            .slots
            .get_mut(index)
            .ok_or(IndexError::OutOfRange { id })?;
        if *entry == UNDEFINED {
            self.stored += 1;
        }
        *entry = location.fixed();
        Ok(())
    }

    fn get(&self, id: i64) -> Option<Location> {
        let index = slot(id).ok()?;
        self.slots
            .get(index)
            .filter(|entry| **entry != UNDEFINED)
            .map(|&(x, y)| Location::from_fixed(x, y))
    }

    fn len(&self) -> usize {
        self.stored
    }

    fn used_memory(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<(i32, i32)>()
    }
}
