//! Hash Table - Open-addressed bucket array keyed by native address
//!
//! # Layout
//!
//! ```text
//! bucket:  ┌──────────┬──────────────┐
//!          │ key      │ chain head   │
//!          └──────────┴──────────────┘
//!
//! key == 0                  -> unused (never occupied since the last rebuild)
//! key != 0, head == None    -> stale  (occupied once, now empty)
//! key != 0, head == Some(_) -> used
//! ```
//!
//! Collisions are resolved by double hashing:
//!
//! ```text
//! h1(k) = k mod size
//! h2(k) = size - 2 - (h1(k) mod (size - 2))
//! probe = h1, h1 + h2, h1 + 2*h2, ... (mod size)
//! ```
//!
//! A stale bucket keeps its key. Probes for other keys step over it exactly
//! as they did while it was used, so probe sequences stay repeatable until
//! the next rebuild.

use crate::error::{ObjMapError, Result};
use crate::record::RecordId;

/// Primary hash: home bucket of `key`
#[inline]
pub fn hash_1(key: usize, size: usize) -> usize {
    key % size
}

/// Secondary hash: probe stride of `key`, in `1..=size - 2`
///
/// `size` must be at least 3.
#[inline]
pub fn hash_2(key: usize, size: usize) -> usize {
    size - 2 - (hash_1(key, size) % (size - 2))
}

/// Next bucket of a probe sequence, `(hash + inc) mod size`
///
/// Both `hash` and `inc` are below `size`, so the sum is never formed and
/// cannot overflow at the largest table sizes on 32-bit targets.
#[inline]
pub fn probe_step(hash: usize, inc: usize, size: usize) -> usize {
    let room = size - inc;
    if hash >= room {
        hash - room
    } else {
        hash + inc
    }
}

/// Occupancy state of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    Unused,
    Stale,
    Used,
}

/// One slot of the bucket array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bucket {
    pub(crate) key: usize,
    pub(crate) first: Option<RecordId>,
}

impl Bucket {
    /// Native address this bucket was claimed for (0 if never claimed)
    #[inline]
    pub fn key(&self) -> usize {
        self.key
    }

    /// Most recently added record in the chain
    #[inline]
    pub fn first(&self) -> Option<RecordId> {
        self.first
    }

    pub fn state(&self) -> BucketState {
        match (self.key, self.first) {
            (0, _) => BucketState::Unused,
            (_, None) => BucketState::Stale,
            (_, Some(_)) => BucketState::Used,
        }
    }
}

/// Bucket array plus occupancy counters
///
/// Invariant: `unused + stale + occupied == size`.
#[derive(Debug)]
pub struct HashTable {
    prime_index: usize,
    unused: usize,
    stale: usize,
    buckets: Vec<Bucket>,
}

impl HashTable {
    /// Allocate a zeroed table of `size` buckets
    ///
    /// `prime_index` is the position of `size` in the configured prime table.
    pub fn with_size(prime_index: usize, size: usize) -> Result<Self> {
        debug_assert!(size >= 3, "table size {} is below 3", size);

        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(size)
            .map_err(|_| ObjMapError::AllocationFailed { buckets: size })?;
        buckets.resize(size, Bucket::default());

        Ok(Self {
            prime_index,
            unused: size,
            stale: 0,
            buckets,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn prime_index(&self) -> usize {
        self.prime_index
    }

    /// Buckets never claimed since the last rebuild
    #[inline]
    pub fn unused(&self) -> usize {
        self.unused
    }

    /// Buckets claimed once and now empty
    #[inline]
    pub fn stale(&self) -> usize {
        self.stale
    }

    /// Buckets currently holding a chain
    #[inline]
    pub fn occupied(&self) -> usize {
        self.size() - self.unused - self.stale
    }

    #[inline]
    pub fn bucket(&self, pos: usize) -> &Bucket {
        &self.buckets[pos]
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, pos: usize) -> &mut Bucket {
        &mut self.buckets[pos]
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Position of the bucket that holds, or should hold, `key`
    ///
    /// Stops at the first bucket whose key is `key` or 0. Returns `None` only
    /// when every bucket is claimed by some other key.
    pub fn find_slot(&self, key: usize) -> Option<usize> {
        let size = self.size();
        let mut hash = hash_1(key, size);
        let inc = hash_2(key, size);

        for _ in 0..size {
            let hek = self.buckets[hash].key;
            if hek == 0 || hek == key {
                return Some(hash);
            }
            hash = probe_step(hash, inc, size);
        }

        None
    }

    /// Bucket claimed for exactly `key`, if any
    pub fn lookup(&self, key: usize) -> Option<&Bucket> {
        self.find_slot(key)
            .map(|pos| &self.buckets[pos])
            .filter(|bucket| bucket.key == key)
    }

    /// Claim an unused bucket for `key`
    pub(crate) fn claim(&mut self, pos: usize, key: usize) {
        debug_assert_eq!(self.buckets[pos].key, 0);
        self.buckets[pos].key = key;
        self.unused -= 1;
    }

    /// An empty stale bucket receives a chain again
    pub(crate) fn revive(&mut self, pos: usize) {
        debug_assert!(self.buckets[pos].key != 0 && self.buckets[pos].first.is_none());
        self.stale -= 1;
    }

    /// A bucket's chain became empty; its key is kept
    pub(crate) fn mark_stale(&mut self, pos: usize) {
        debug_assert!(self.buckets[pos].first.is_none());
        self.stale += 1;
    }

    /// Build a table of `size` buckets holding only the used buckets of this one
    ///
    /// Stale buckets are dropped, so the new table has `stale == 0` and
    /// `unused == size - occupied`.
    pub fn rebuild(&self, prime_index: usize, size: usize) -> Result<HashTable> {
        let mut table = HashTable::with_size(prime_index, size)?;

        for old in self.buckets.iter().filter(|b| b.state() == BucketState::Used) {
            let pos = table.find_slot(old.key).ok_or_else(|| {
                ObjMapError::Internal(format!(
                    "no free bucket for {:#x} while rebuilding to {} buckets",
                    old.key, size
                ))
            })?;
            table.buckets[pos] = *old;
            table.unused -= 1;
        }

        Ok(table)
    }
}
