//! # sip-objmap - Native Address to Wrapper Map
//!
//! The SIP runtime keeps one map from native (C/C++) object addresses to the
//! managed-runtime wrappers created for them. Looking a native pointer up
//! here is how the binding layer decides whether a pointer returned by the
//! native library already has a wrapper or needs a new one.
//!
//! ## Overview
//!
//! - **Open Addressing**: one bucket per address, double hashing over a
//!   prime-sized table
//! - **Chains**: several wrappers may share one address (sub-object aliasing);
//!   records in a bucket are linked through arena handles
//! - **Address Reuse**: adding a non-sharing wrapper to an occupied address
//!   displaces the old wrappers and runs the host's destructor hook on them
//! - **Stale Buckets**: removal never clears a key, so probe sequences stay
//!   valid until the next rebuild
//! - **Reorganisation**: the table is rebuilt in place or grown to the next
//!   prime once fewer than 1/8 of its buckets are unused
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Wrapping layer (WrapperHost)              │
//! │  type checks · liveness · unguarded address · dtor hook   │
//! └──────────────┬──────────────────────────────▲────────────┘
//!                │ find / add / remove          │ common_dtor
//!                ▼                              │
//! ┌──────────────────────────────────────────────┴───────────┐
//! │                        ObjectMap                          │
//! │  ┌──────────────────────┐     ┌────────────────────────┐  │
//! │  │ HashTable            │     │ RecordArena            │  │
//! │  │ key │ first ─────────┼────▶│ record ─next─▶ record  │  │
//! │  └──────────────────────┘     └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use sip_objmap::{ObjectMap, RecordId, WrappedRecord, WrapperHost};
//!
//! struct Host;
//!
//! impl WrapperHost<u32> for Host {
//!     type Type = u32;
//!
//!     fn is_instance(&self, record: &WrappedRecord<u32>, ty: &u32) -> bool {
//!         record.payload() == ty
//!     }
//!
//!     fn common_dtor(&mut self, _map: &mut ObjectMap<u32>, _record: RecordId) {}
//! }
//!
//! fn main() -> sip_objmap::Result<()> {
//!     let mut host = Host;
//!     let mut map = sip_objmap::init::<u32>()?;
//!
//!     let wrapper = map.create_record(0x5000, 1)?;
//!     map.add(wrapper, &mut host)?;
//!     assert_eq!(map.find(0x5000, &1, &host), Some(wrapper));
//!
//!     map.remove(wrapper, &host)?;
//!     map.release_record(wrapper)?;
//!     map.finalize();
//!     Ok(())
//! }
//! ```
//!
//! ## Thread Safety
//!
//! `ObjectMap` has no internal locking. The caller serializes every call;
//! re-entrant calls from the destructor hook are supported.
//!
//! ## Modules
//!
//! - [`map`]: the object map operations
//! - [`table`]: bucket array, hashing and rebuild
//! - [`arena`]: record storage and handles
//! - [`record`]: wrapped-object records
//! - [`host`]: the wrapping-layer trait
//! - [`config`]: table sizes and thresholds
//! - [`error`]: error types
//! - [`logging`]: map events
//! - [`stats`]: operation counters

pub mod config;
pub mod error;

pub mod arena;
pub mod host;
pub mod map;
pub mod record;
pub mod table;

pub mod logging;
pub mod stats;

pub use config::{ConfigError, MapConfig, DEFAULT_PRIMES};
pub use error::{ObjMapError, Result};
pub use host::WrapperHost;
pub use map::{ChainIter, ObjectMap};
pub use record::{RecordId, WrappedRecord};
pub use stats::{MapStats, StatsSnapshot};
pub use table::{BucketState, HashTable};

/// Crate version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise a map with the default prime table
pub fn init<T>() -> Result<ObjectMap<T>> {
    ObjectMap::new(MapConfig::default())
}

/// Initialise a map with custom configuration
///
/// ```rust
/// use sip_objmap::MapConfig;
///
/// let map = sip_objmap::init_with_config::<()>(MapConfig::with_primes(vec![11, 23]))?;
/// assert_eq!(map.table_size(), 11);
/// # Ok::<(), sip_objmap::ObjMapError>(())
/// ```
pub fn init_with_config<T>(config: MapConfig) -> Result<ObjectMap<T>> {
    ObjectMap::new(config)
}
