//! IndexVec - A vector indexed by a typed handle.
//!
//! [`IndexVec`] wraps a `Vec<T>` and only accepts indices of one specific
//! handle type. Record arenas use it so that a record handle can never be
//! confused with a bucket position or a plain counter.
//!
//! # Example
//!
//! ```
//! use sip_util::define_idx;
//! use sip_util::index_vec::IndexVec;
//!
//! define_idx!(WrapperId);
//!
//! let mut wrappers: IndexVec<WrapperId, usize> = IndexVec::new();
//! let id = wrappers.push(0x1000);
//! assert_eq!(wrappers[id], 0x1000);
//! ```

use crate::error::{IndexVecError, IndexVecResult};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for types that can be used as indices
///
/// Implementors convert to and from `usize`. `MAX_INDEX` bounds the handle
/// space so that [`IndexVec::try_push`] can refuse to grow past it.
pub trait Idx: Copy + Eq {
    /// Largest index representable by this type
    const MAX_INDEX: usize = usize::MAX;

    /// Convert from usize to index type
    ///
    /// # Panics
    ///
    /// Implementations may panic if the value exceeds `MAX_INDEX`.
    fn from_usize(idx: usize) -> Self;

    /// Convert index to usize for slice indexing
    fn index(self) -> usize;
}

impl Idx for usize {
    #[inline]
    fn from_usize(idx: usize) -> Self {
        idx
    }

    #[inline]
    fn index(self) -> usize {
        self
    }
}

/// A vector indexed by a specific type
///
/// # Type Parameters
///
/// - `I`: The index type (must implement [`Idx`])
/// - `T`: The element type
#[derive(Clone, Debug)]
pub struct IndexVec<I, T> {
    raw: Vec<T>,
    _marker: PhantomData<fn(&I)>,
}

impl<I, T> IndexVec<I, T> {
    /// Create an empty IndexVec
    #[inline]
    pub fn new() -> Self {
        Self {
            raw: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Create an IndexVec with room for `capacity` elements
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            raw: Vec::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements in the vector
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the vector contains no elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Removes all elements
    #[inline]
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Borrow the underlying storage
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.raw
    }
}

impl<I: Idx, T> IndexVec<I, T> {
    /// Append a value and return its index
    ///
    /// # Panics
    ///
    /// Panics if the new index does not fit in `I`. Use
    /// [`try_push`](Self::try_push) where exhaustion must be reported.
    #[inline]
    pub fn push(&mut self, value: T) -> I {
        let idx = I::from_usize(self.raw.len());
        self.raw.push(value);
        idx
    }

    /// Append a value, failing if the handle space of `I` is used up
    ///
    /// # Examples
    ///
    /// ```
    /// use sip_util::define_idx;
    /// use sip_util::index_vec::IndexVec;
    ///
    /// define_idx!(SlotId);
    ///
    /// let mut slots: IndexVec<SlotId, &str> = IndexVec::new();
    /// let id = slots.try_push("first").unwrap();
    /// assert_eq!(slots[id], "first");
    /// ```
    pub fn try_push(&mut self, value: T) -> IndexVecResult<I> {
        let length = self.raw.len();
        if length > I::MAX_INDEX {
            return Err(IndexVecError::Exhausted {
                length,
                max: I::MAX_INDEX,
            });
        }
        Ok(self.push(value))
    }

    /// Get a reference to the element at `index`
    #[inline]
    pub fn get(&self, index: I) -> Option<&T> {
        self.raw.get(index.index())
    }

    /// Get a mutable reference to the element at `index`
    #[inline]
    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.raw.get_mut(index.index())
    }

    /// Checked access that reports the bounds on failure
    pub fn try_get(&self, index: I) -> IndexVecResult<&T> {
        let length = self.raw.len();
        self.raw.get(index.index()).ok_or(IndexVecError::OutOfBounds {
            index: index.index(),
            length,
        })
    }

    /// Iterate over `(index, &value)` pairs
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (I, &T)> {
        self.raw
            .iter()
            .enumerate()
            .map(|(i, value)| (I::from_usize(i), value))
    }

    /// Iterate over all valid indices
    pub fn indices(&self) -> impl Iterator<Item = I> {
        (0..self.raw.len()).map(I::from_usize)
    }
}

impl<I: Idx, T> Index<I> for IndexVec<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: I) -> &T {
        &self.raw[index.index()]
    }
}

impl<I: Idx, T> IndexMut<I> for IndexVec<I, T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut T {
        &mut self.raw[index.index()]
    }
}

impl<I, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Define a `u32` handle type usable as an [`IndexVec`] index
///
/// # Examples
///
/// ```
/// use sip_util::define_idx;
/// use sip_util::index_vec::Idx;
///
/// define_idx!(RecordId);
///
/// let id = RecordId::from_usize(7);
/// assert_eq!(id.index(), 7);
/// ```
#[macro_export]
macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $crate::index_vec::Idx for $name {
            const MAX_INDEX: usize = u32::MAX as usize;

            fn from_usize(idx: usize) -> Self {
                assert!(idx <= u32::MAX as usize, "Index {} exceeds u32::MAX", idx);
                $name(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}
