//! Error Module - Object Map Error Types
//!
//! # Error Categories
//!
//! ## Fatal
//! - `AllocationFailed` - bucket array could not be allocated
//!
//! ## Capacity
//! - `TableFull` - largest table size exhausted
//!
//! ## Caller Misuse
//! - `NotInChain` - removing a record its bucket never held
//! - `InvalidRecord` - unknown or released record handle
//! - `RecordInMap` - releasing a record that is still mapped
//! - `AlreadyInMap` - adding a record twice
//! - `InvalidAddress` - adding a record with a null address
//!
//! ## Setup
//! - `Configuration` - invalid [`MapConfig`](crate::MapConfig)
//! - `Arena` - record handle space exhausted
//!
//! `find` has no error path: a miss is `None`.

use crate::config::ConfigError;
use sip_util::IndexVecError;
use thiserror::Error;

/// Main error type for all object map operations
///
/// # Examples
///
/// ```rust
/// use sip_objmap::ObjMapError;
///
/// fn report(err: ObjMapError) {
///     match err {
///         ObjMapError::AllocationFailed { buckets } => {
///             eprintln!("cannot allocate {} buckets", buckets);
///         }
///         err if err.is_bug() => eprintln!("caller bug: {}", err),
///         err => eprintln!("{}", err),
///     }
/// }
/// # report(ObjMapError::InvalidAddress);
/// ```
#[derive(Debug, Error)]
pub enum ObjMapError {
    /// Bucket array allocation failed
    ///
    /// **When returned:** table creation or reorganisation
    ///
    /// **Recovery strategy:** none; the map must not be used afterwards
    #[error("Allocation failed: could not allocate a table of {buckets} buckets")]
    AllocationFailed { buckets: usize },

    /// The record's bucket chain does not contain it
    ///
    /// **When returned:** `remove` of a record flagged as mapped but absent
    /// from the chain at its address
    #[error("Record at address {address:#x} is not in its bucket chain")]
    NotInChain { address: usize },

    /// Handle does not name a live record
    #[error("Invalid record handle: {index}")]
    InvalidRecord { index: u32 },

    /// Record still participates in the map
    #[error("Record {index} is still in the map")]
    RecordInMap { index: u32 },

    /// Record is already linked into the map
    #[error("Record {index} is already in the map")]
    AlreadyInMap { index: u32 },

    /// Every bucket is claimed and the table cannot grow
    ///
    /// **When returned:** `add` of a new address at the largest configured
    /// size with no unused bucket left
    #[error("Table full: all {size} buckets are claimed")]
    TableFull { size: usize },

    /// Null native address
    #[error("Invalid address: records must have a non-null address")]
    InvalidAddress,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Record arena error
    #[error("Record arena error: {0}")]
    Arena(#[from] IndexVecError),

    /// Internal error - invariant violation
    ///
    /// **Action required:** this is a bug in the map
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ObjMapError {
    /// Check if this error leaves the map unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ObjMapError::AllocationFailed { .. } | ObjMapError::Internal(_)
        )
    }

    /// Check if this error indicates a bug in the caller or the map
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            ObjMapError::NotInChain { .. }
                | ObjMapError::InvalidRecord { .. }
                | ObjMapError::RecordInMap { .. }
                | ObjMapError::AlreadyInMap { .. }
                | ObjMapError::InvalidAddress
                | ObjMapError::Internal(_)
        )
    }
}

/// Result type alias for object map operations
pub type Result<T> = std::result::Result<T, ObjMapError>;
