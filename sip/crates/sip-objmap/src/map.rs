//! Object Map - native address to wrapped-object lookup
//!
//! Each used bucket holds a chain of records wrapping objects at the same
//! native address. The map tells the three reasons for a second record at an
//! occupied address apart only through the record's share hint:
//!
//! - share hint set: another wrapper for the same storage (for example a
//!   member or base sub-object that starts at the same address). The record
//!   joins the chain.
//! - share hint clear: the native allocator reused the address, so the old
//!   wrappers are stale. The chain is replaced and every old record goes
//!   through the host's common destructor.
//!
//! # Example
//!
//! ```rust
//! use sip_objmap::{ObjectMap, MapConfig, RecordId, WrappedRecord, WrapperHost};
//!
//! struct Host;
//!
//! impl WrapperHost<&'static str> for Host {
//!     type Type = str;
//!
//!     fn is_instance(&self, record: &WrappedRecord<&'static str>, ty: &str) -> bool {
//!         *record.payload() == ty
//!     }
//!
//!     fn common_dtor(&mut self, _map: &mut ObjectMap<&'static str>, _record: RecordId) {}
//! }
//!
//! let mut host = Host;
//! let mut map = ObjectMap::new(MapConfig::default())?;
//!
//! let frame = map.create_record(0x7f00_1000, "Frame")?;
//! map.add(frame, &mut host)?;
//!
//! assert_eq!(map.find(0x7f00_1000, "Frame", &host), Some(frame));
//! assert_eq!(map.find(0x7f00_1000, "Button", &host), None);
//!
//! map.remove(frame, &host)?;
//! assert_eq!(map.find(0x7f00_1000, "Frame", &host), None);
//! # Ok::<(), sip_objmap::ObjMapError>(())
//! ```

use crate::arena::RecordArena;
use crate::config::MapConfig;
use crate::error::{ObjMapError, Result};
use crate::host::WrapperHost;
use crate::logging::{MapEvent, MapLogger};
use crate::record::{RecordId, WrappedRecord};
use crate::stats::MapStats;
use crate::table::{BucketState, HashTable};

/// Address-to-object map
///
/// Not internally synchronized; callers serialize access (the binding layer
/// holds its interpreter lock around every call).
#[derive(Debug)]
pub struct ObjectMap<T> {
    config: MapConfig,
    table: HashTable,
    records: RecordArena<T>,
    mapped: usize,
    stats: MapStats,
    logger: MapLogger,
}

impl<T> ObjectMap<T> {
    /// Initialise a map with a table of the first configured size
    pub fn new(config: MapConfig) -> Result<Self> {
        config.validate()?;

        let mut logger = if config.verbose {
            MapLogger::new(config.log.clone())
        } else {
            MapLogger::disabled()
        };

        let size = config.initial_size();
        let table = match HashTable::with_size(0, size) {
            Ok(table) => table,
            Err(err) => {
                logger.log(MapEvent::AllocationFailure { buckets: size });
                return Err(err);
            },
        };
        logger.log(MapEvent::TableCreated { size });

        Ok(Self {
            config,
            table,
            records: RecordArena::new(),
            mapped: 0,
            stats: MapStats::new(),
            logger,
        })
    }

    /// Finalise the map, releasing the bucket array and all records
    pub fn finalize(self) {
        log::debug!(
            target: "sip_objmap",
            "finalising map: {} buckets, {} mapped records",
            self.table.size(),
            self.mapped
        );
    }

    // === Records ===

    /// Create a record for a native object at `address`
    ///
    /// The record starts with `ref_count = 1` and is not in the map.
    pub fn create_record(&mut self, address: usize, payload: T) -> Result<RecordId> {
        self.records.insert(address, payload)
    }

    /// Create a record with the share hint already set
    pub fn create_shared_record(&mut self, address: usize, payload: T) -> Result<RecordId> {
        let id = self.records.insert(address, payload)?;
        self.records.try_get_mut(id)?.set_share_map(true);
        Ok(id)
    }

    pub fn record(&self, id: RecordId) -> Option<&WrappedRecord<T>> {
        self.records.get(id)
    }

    pub fn record_mut(&mut self, id: RecordId) -> Option<&mut WrappedRecord<T>> {
        self.records.get_mut(id)
    }

    /// Free a record that is out of the map, returning its payload
    pub fn release_record(&mut self, id: RecordId) -> Result<T> {
        self.records.release(id)
    }

    pub fn records(&self) -> &RecordArena<T> {
        &self.records
    }

    // === Lookup ===

    /// Find the wrapper of type `ty` (or a subtype) for `address`
    ///
    /// Records being destroyed (`ref_count == 0`) and records whose native
    /// object the host reports as gone are skipped. Never changes occupancy.
    pub fn find<H>(&self, address: usize, ty: &H::Type, host: &H) -> Option<RecordId>
    where
        H: WrapperHost<T> + ?Sized,
    {
        let found = if address == 0 {
            None
        } else {
            self.iter_at(address).find(|&id| match self.records.get(id) {
                Some(record) => {
                    record.ref_count() != 0 && host.is_alive(record) && host.is_instance(record, ty)
                },
                None => false,
            })
        };

        if self.config.stats_enabled {
            self.stats.record_find(found.is_some());
        }
        found
    }

    /// Record ids chained at `address`, newest first
    pub fn iter_at(&self, address: usize) -> ChainIter<'_, T> {
        let next = self.table.lookup(address).and_then(|bucket| bucket.first());
        ChainIter {
            records: &self.records,
            next,
        }
    }

    /// Whether `id` currently participates in the map
    pub fn contains(&self, id: RecordId) -> bool {
        self.records.get(id).map_or(false, |r| r.is_in_map())
    }

    // === Mutation ===

    /// Add a record to the map under its unguarded address
    ///
    /// If the address already has a chain, the record joins it when its share
    /// hint is set. Otherwise the old chain is dropped, each old record is
    /// marked out of the map and, once the bucket is committed, handed to
    /// [`WrapperHost::common_dtor`]. Only an add that claims an empty bucket
    /// can trigger a reorganisation.
    pub fn add<H>(&mut self, id: RecordId, host: &mut H) -> Result<()>
    where
        H: WrapperHost<T> + ?Sized,
    {
        let record = self.records.try_get(id)?;
        if record.is_in_map() {
            return Err(ObjMapError::AlreadyInMap { index: id.0 });
        }
        let address = host.unguarded_address(record);
        if address == 0 {
            return Err(ObjMapError::InvalidAddress);
        }
        let share = record.shares_map();

        let pos = self.table.find_slot(address).ok_or(ObjMapError::TableFull {
            size: self.table.size(),
        })?;

        if let Some(head) = self.table.bucket(pos).first() {
            let displaced = if share {
                self.records.try_get_mut(id)?.next = Some(head);
                Vec::new()
            } else {
                self.unlink_chain(head)
            };

            self.table.bucket_mut(pos).first = Some(id);
            let record = self.records.try_get_mut(id)?;
            if !share {
                record.next = None;
            }
            record.key = address;
            record.set_in_map(true);
            self.mapped = self.mapped + 1 - displaced.len();

            if self.config.stats_enabled {
                self.stats.record_add(share, displaced.len());
            }

            if !displaced.is_empty() {
                self.logger.log(MapEvent::Displaced {
                    address,
                    count: displaced.len(),
                });
                for old in displaced {
                    host.common_dtor(self, old);
                }
            }

            return Ok(());
        }

        match self.table.bucket(pos).state() {
            BucketState::Unused => self.table.claim(pos, address),
            _ => self.table.revive(pos),
        }

        self.table.bucket_mut(pos).first = Some(id);
        let record = self.records.try_get_mut(id)?;
        record.next = None;
        record.key = address;
        record.set_in_map(true);
        self.mapped += 1;

        if self.config.stats_enabled {
            self.stats.record_add(false, 0);
        }

        self.reorganise()
    }

    /// Detach every record of a chain, returning them in chain order
    fn unlink_chain(&mut self, head: RecordId) -> Vec<RecordId> {
        let mut displaced = Vec::new();
        let mut cur = Some(head);

        while let Some(id) = cur {
            cur = match self.records.get_mut(id) {
                Some(record) => {
                    record.set_in_map(false);
                    record.next.take()
                },
                None => None,
            };
            displaced.push(id);
        }

        displaced
    }

    /// Remove a record from the map
    ///
    /// A record that is not in the map, or whose unguarded address is null,
    /// is a successful no-op. An emptied bucket becomes stale: its key stays
    /// so probes for other keys that passed it still find their buckets.
    ///
    /// If the record is not chained under its current unguarded address the
    /// result is [`ObjMapError::NotInChain`]. The record is still taken out
    /// of the bucket it was added under, so it can be released afterwards.
    pub fn remove<H>(&mut self, id: RecordId, host: &H) -> Result<()>
    where
        H: WrapperHost<T> + ?Sized,
    {
        let record = self.records.try_get(id)?;
        if !record.is_in_map() {
            return Ok(());
        }
        let address = host.unguarded_address(record);
        if address == 0 {
            return Ok(());
        }
        let added_under = record.key;

        if self.unlink(id, address)? {
            if self.config.stats_enabled {
                self.stats.record_remove(true);
            }
            return Ok(());
        }

        if added_under == address || !self.unlink(id, added_under)? {
            let record = self.records.try_get_mut(id)?;
            record.next = None;
            record.set_in_map(false);
        }

        self.remove_miss(address)
    }

    /// Splice `id` out of the chain at `key`; false if it is not there
    fn unlink(&mut self, id: RecordId, key: usize) -> Result<bool> {
        let pos = match self.table.find_slot(key) {
            Some(pos) if key != 0 && self.table.bucket(pos).key() == key => pos,
            _ => return Ok(false),
        };

        let mut prev: Option<RecordId> = None;
        let mut cur = self.table.bucket(pos).first();

        while let Some(cid) = cur {
            let next = self.records.get(cid).and_then(|r| r.next());

            if cid == id {
                match prev {
                    None => self.table.bucket_mut(pos).first = next,
                    Some(p) => self.records.try_get_mut(p)?.next = next,
                }

                let record = self.records.try_get_mut(id)?;
                record.next = None;
                record.set_in_map(false);
                self.mapped -= 1;

                if self.table.bucket(pos).first().is_none() {
                    self.table.mark_stale(pos);
                }
                return Ok(true);
            }

            prev = Some(cid);
            cur = next;
        }

        Ok(false)
    }

    fn remove_miss(&mut self, address: usize) -> Result<()> {
        if self.config.stats_enabled {
            self.stats.record_remove(false);
        }
        self.logger.log(MapEvent::RemoveMiss { address });
        Err(ObjMapError::NotInChain { address })
    }

    /// Rebuild the table if it is running short of unused buckets
    ///
    /// Nothing happens while more than 1/8 of the buckets are unused. Past
    /// that, the table moves to the next prime unless turning the stale
    /// buckets back into unused ones would already free 1/4 of it; at the
    /// largest size it is rebuilt in place.
    fn reorganise(&mut self) -> Result<()> {
        let old_size = self.table.size();
        let unused = self.table.unused();
        let stale = self.table.stale();

        if unused > old_size >> self.config.headroom_shift {
            return Ok(());
        }

        let mut prime_index = self.table.prime_index();
        let mut grew = false;
        if unused + stale < old_size >> self.config.reclaim_shift {
            if prime_index + 1 < self.config.primes.len() {
                prime_index += 1;
                grew = true;
            } else {
                self.logger.log(MapEvent::CapacityCeiling { size: old_size });
            }
        }

        let new_size = self.config.primes[prime_index];
        let table = match self.table.rebuild(prime_index, new_size) {
            Ok(table) => table,
            Err(err) => {
                self.logger.log(MapEvent::AllocationFailure { buckets: new_size });
                return Err(err);
            },
        };
        self.table = table;

        if self.config.stats_enabled {
            self.stats.record_reorganisation(grew);
        }
        self.logger.log(MapEvent::Reorganised {
            old_size,
            new_size,
            grew,
            occupied: self.table.occupied(),
            reclaimed_stale: stale,
        });

        Ok(())
    }

    // === Diagnostics ===

    /// Number of records currently in the map
    pub fn len(&self) -> usize {
        self.mapped
    }

    pub fn is_empty(&self) -> bool {
        self.mapped == 0
    }

    pub fn table(&self) -> &HashTable {
        &self.table
    }

    pub fn table_size(&self) -> usize {
        self.table.size()
    }

    pub fn prime_index(&self) -> usize {
        self.table.prime_index()
    }

    pub fn unused_buckets(&self) -> usize {
        self.table.unused()
    }

    pub fn stale_buckets(&self) -> usize {
        self.table.stale()
    }

    pub fn occupied_buckets(&self) -> usize {
        self.table.occupied()
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn stats(&self) -> &MapStats {
        &self.stats
    }

    pub fn logger(&self) -> &MapLogger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut MapLogger {
        &mut self.logger
    }

    /// Verify the structural invariants of the table and chains
    ///
    /// Checks the occupancy counters against the buckets, that every claimed
    /// bucket is the one its key probes to, and that every chained record is
    /// flagged in-map and has the bucket's key as its unguarded address.
    pub fn check_invariants<H>(&self, host: &H) -> Result<()>
    where
        H: WrapperHost<T> + ?Sized,
    {
        let mut counts = [0usize; 3];
        let mut chained = 0usize;

        for (pos, bucket) in self.table.buckets().iter().enumerate() {
            let state = bucket.state();
            counts[state as usize] += 1;

            if state == BucketState::Unused {
                if bucket.first().is_some() {
                    return Err(ObjMapError::Internal(format!(
                        "unused bucket {} has a chain",
                        pos
                    )));
                }
                continue;
            }

            if self.table.find_slot(bucket.key()) != Some(pos) {
                return Err(ObjMapError::Internal(format!(
                    "bucket {} for {:#x} is not reachable by probing",
                    pos,
                    bucket.key()
                )));
            }

            let mut cur = bucket.first();
            while let Some(id) = cur {
                let record = self.records.get(id).ok_or_else(|| {
                    ObjMapError::Internal(format!("bucket {} chains released record {}", pos, id.0))
                })?;
                if !record.is_in_map() || host.unguarded_address(record) != bucket.key() {
                    return Err(ObjMapError::Internal(format!(
                        "record {} in bucket {} for {:#x} is inconsistent",
                        id.0,
                        pos,
                        bucket.key()
                    )));
                }
                chained += 1;
                if chained > self.records.len() {
                    return Err(ObjMapError::Internal(format!(
                        "chain at bucket {} is cyclic",
                        pos
                    )));
                }
                cur = record.next();
            }
        }

        let [unused, stale, used] = counts;
        if unused != self.table.unused() || stale != self.table.stale() {
            return Err(ObjMapError::Internal(format!(
                "counters unused={} stale={} but buckets show unused={} stale={}",
                self.table.unused(),
                self.table.stale(),
                unused,
                stale
            )));
        }
        if unused + stale + used != self.table.size() {
            return Err(ObjMapError::Internal(format!(
                "{} + {} + {} buckets do not add up to {}",
                unused,
                stale,
                used,
                self.table.size()
            )));
        }
        if chained != self.mapped {
            return Err(ObjMapError::Internal(format!(
                "{} records chained but {} counted as mapped",
                chained, self.mapped
            )));
        }

        Ok(())
    }
}

/// Iterator over the record chain at one address
pub struct ChainIter<'a, T> {
    records: &'a RecordArena<T>,
    next: Option<RecordId>,
}

impl<'a, T> Iterator for ChainIter<'a, T> {
    type Item = RecordId;

    fn next(&mut self) -> Option<RecordId> {
        let id = self.next?;
        self.next = self.records.get(id).and_then(|r| r.next());
        Some(id)
    }
}
