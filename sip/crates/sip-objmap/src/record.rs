//! Wrapped-object records
//!
//! One record per wrapping of a native object. The map links records that
//! share a bucket through `next` handles; the record itself never moves.

use sip_util::define_idx;

define_idx!(
    /// Stable handle to a record in a [`RecordArena`](crate::arena::RecordArena)
    RecordId
);

/// Set while the record is linked into a bucket chain
pub const IN_MAP: u8 = 1 << 0;
/// An add joins an existing chain instead of displacing it
pub const SHARE_MAP: u8 = 1 << 1;

/// A managed-runtime wrapper around one native object
///
/// `T` is host data carried alongside the map fields, typically the
/// wrapper's runtime type.
#[derive(Debug, Clone)]
pub struct WrappedRecord<T> {
    address: usize,
    ref_count: usize,
    flags: u8,
    pub(crate) next: Option<RecordId>,
    /// Bucket key the record was last added under
    pub(crate) key: usize,
    payload: T,
}

impl<T> WrappedRecord<T> {
    pub(crate) fn new(address: usize, payload: T) -> Self {
        Self {
            address,
            ref_count: 1,
            flags: 0,
            next: None,
            key: 0,
            payload,
        }
    }

    /// Unguarded native address (may no longer be valid)
    #[inline]
    pub fn address(&self) -> usize {
        self.address
    }

    /// Reference count; zero means the wrapper is being destroyed
    #[inline]
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    pub fn set_ref_count(&mut self, count: usize) {
        self.ref_count = count;
    }

    pub fn incref(&mut self) {
        self.ref_count += 1;
    }

    /// Returns the new count
    pub fn decref(&mut self) -> usize {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    #[inline]
    pub fn is_in_map(&self) -> bool {
        self.flags & IN_MAP != 0
    }

    pub(crate) fn set_in_map(&mut self, in_map: bool) {
        if in_map {
            self.flags |= IN_MAP;
        } else {
            self.flags &= !IN_MAP;
        }
    }

    /// Whether an `add` should join an existing chain rather than replace it
    #[inline]
    pub fn shares_map(&self) -> bool {
        self.flags & SHARE_MAP != 0
    }

    pub fn set_share_map(&mut self, share: bool) {
        if share {
            self.flags |= SHARE_MAP;
        } else {
            self.flags &= !SHARE_MAP;
        }
    }

    /// Next record in the same bucket chain
    #[inline]
    pub fn next(&self) -> Option<RecordId> {
        self.next
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    pub(crate) fn into_payload(self) -> T {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = WrappedRecord::new(0x1000, "Widget");
        assert_eq!(record.address(), 0x1000);
        assert_eq!(record.ref_count(), 1);
        assert!(!record.is_in_map());
        assert!(!record.shares_map());
        assert!(record.next().is_none());
        assert_eq!(*record.payload(), "Widget");
    }

    #[test]
    fn test_flags_independent() {
        let mut record = WrappedRecord::new(0x1000, ());
        record.set_in_map(true);
        record.set_share_map(true);
        assert!(record.is_in_map() && record.shares_map());

        record.set_in_map(false);
        assert!(!record.is_in_map());
        assert!(record.shares_map());
    }

    #[test]
    fn test_refcount() {
        let mut record = WrappedRecord::new(0x1000, ());
        record.incref();
        assert_eq!(record.decref(), 1);
        assert_eq!(record.decref(), 0);
        assert_eq!(record.decref(), 0);
    }
}
