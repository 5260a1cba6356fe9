//! Record arena
//!
//! Owns every [`WrappedRecord`] and hands out [`RecordId`] handles. Released
//! slots go on a LIFO free list and are reused by later inserts.

use crate::error::{ObjMapError, Result};
use crate::record::{RecordId, WrappedRecord};
use sip_util::IndexVec;

#[derive(Debug)]
enum Slot<T> {
    Occupied(WrappedRecord<T>),
    Free,
}

/// Slot storage for wrapped-object records
#[derive(Debug)]
pub struct RecordArena<T> {
    slots: IndexVec<RecordId, Slot<T>>,
    free: Vec<RecordId>,
    live: usize,
}

impl<T> RecordArena<T> {
    pub fn new() -> Self {
        Self {
            slots: IndexVec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Create a record with `ref_count = 1`, outside the map
    pub fn insert(&mut self, address: usize, payload: T) -> Result<RecordId> {
        let record = WrappedRecord::new(address, payload);
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id] = Slot::Occupied(record);
                id
            },
            None => self.slots.try_push(Slot::Occupied(record))?,
        };
        self.live += 1;
        Ok(id)
    }

    pub fn get(&self, id: RecordId) -> Option<&WrappedRecord<T>> {
        match self.slots.get(id) {
            Some(Slot::Occupied(record)) => Some(record),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut WrappedRecord<T>> {
        match self.slots.get_mut(id) {
            Some(Slot::Occupied(record)) => Some(record),
            _ => None,
        }
    }

    pub(crate) fn try_get(&self, id: RecordId) -> Result<&WrappedRecord<T>> {
        self.get(id)
            .ok_or(ObjMapError::InvalidRecord { index: id.0 })
    }

    pub(crate) fn try_get_mut(&mut self, id: RecordId) -> Result<&mut WrappedRecord<T>> {
        self.get_mut(id)
            .ok_or(ObjMapError::InvalidRecord { index: id.0 })
    }

    /// Free a record that is no longer in the map, returning its payload
    pub fn release(&mut self, id: RecordId) -> Result<T> {
        if self.try_get(id)?.is_in_map() {
            return Err(ObjMapError::RecordInMap { index: id.0 });
        }
        match std::mem::replace(&mut self.slots[id], Slot::Free) {
            Slot::Occupied(record) => {
                self.free.push(id);
                self.live -= 1;
                Ok(record.into_payload())
            },
            Slot::Free => Err(ObjMapError::InvalidRecord { index: id.0 }),
        }
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live records
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &WrappedRecord<T>)> {
        self.slots.iter_enumerated().filter_map(|(id, slot)| match slot {
            Slot::Occupied(record) => Some((id, record)),
            Slot::Free => None,
        })
    }

    /// Total slots allocated, live or free
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Default for RecordArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
