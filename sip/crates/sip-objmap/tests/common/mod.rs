//! Test Utilities for the Object Map Test Suite
//!
//! Provides a host with a small class hierarchy, per-record liveness and a
//! scriptable destructor hook, plus a fixture bundling it with a map.

#![allow(dead_code)]

use sip_objmap::{MapConfig, ObjMapError, ObjectMap, RecordId, WrappedRecord, WrapperHost};
use std::collections::HashMap;

/// Runtime type of a wrapper
pub type TypeTag = u32;

/// Class hierarchy used by the tests
///
/// ```text
/// OBJECT
/// ├── WINDOW
/// │   ├── FRAME
/// │   └── BUTTON
/// └── SIZER
/// ```
pub const OBJECT: TypeTag = 0;
pub const WINDOW: TypeTag = 1;
pub const FRAME: TypeTag = 2;
pub const BUTTON: TypeTag = 3;
pub const SIZER: TypeTag = 4;

/// Tiny prime table so reorganisations happen after a handful of adds
pub const SMALL_PRIMES: &[usize] = &[11, 23, 47, 97, 197, 397, 797];

/// Host data stored in each record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper {
    pub ty: TypeTag,
    pub alive: bool,
}

impl Wrapper {
    pub fn new(ty: TypeTag) -> Self {
        Self { ty, alive: true }
    }
}

/// What the destructor hook does, in order, for each displaced record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtorAction {
    /// Look an address up and keep the result in `probe_results`
    Probe { address: usize, ty: TypeTag },
    /// Remove the displaced record again
    Remove,
    /// Release the displaced record's slot
    Release,
    /// Wrap a new native object from inside the hook
    Rewrap { address: usize, ty: TypeTag },
}

/// ============================================================================
/// TEST HOST
/// ============================================================================

pub struct TestHost {
    parents: HashMap<TypeTag, TypeTag>,
    pub actions: Vec<DtorAction>,
    pub dtor_log: Vec<RecordId>,
    pub probe_results: Vec<Option<RecordId>>,
    pub rewrapped: Vec<RecordId>,
    pub action_errors: Vec<ObjMapError>,
}

impl TestHost {
    pub fn new() -> Self {
        let parents = HashMap::from([
            (WINDOW, OBJECT),
            (FRAME, WINDOW),
            (BUTTON, WINDOW),
            (SIZER, OBJECT),
        ]);
        Self {
            parents,
            actions: Vec::new(),
            dtor_log: Vec::new(),
            probe_results: Vec::new(),
            rewrapped: Vec::new(),
            action_errors: Vec::new(),
        }
    }

    /// Whether `ty` is `expected` or derives from it
    pub fn is_subtype(&self, mut ty: TypeTag, expected: TypeTag) -> bool {
        loop {
            if ty == expected {
                return true;
            }
            match self.parents.get(&ty) {
                Some(&parent) => ty = parent,
                None => return false,
            }
        }
    }
}

impl WrapperHost<Wrapper> for TestHost {
    type Type = TypeTag;

    fn is_alive(&self, record: &WrappedRecord<Wrapper>) -> bool {
        record.payload().alive
    }

    fn is_instance(&self, record: &WrappedRecord<Wrapper>, ty: &TypeTag) -> bool {
        self.is_subtype(record.payload().ty, *ty)
    }

    fn common_dtor(&mut self, map: &mut ObjectMap<Wrapper>, record: RecordId) {
        self.dtor_log.push(record);

        let actions = self.actions.clone();
        for action in actions {
            let result = match action {
                DtorAction::Probe { address, ty } => {
                    let found = map.find(address, &ty, &*self);
                    self.probe_results.push(found);
                    Ok(())
                },
                DtorAction::Remove => map.remove(record, &*self),
                DtorAction::Release => map.release_record(record).map(|_| ()),
                DtorAction::Rewrap { address, ty } => {
                    match map.create_record(address, Wrapper::new(ty)) {
                        Ok(id) => {
                            let added = map.add(id, &mut *self);
                            if added.is_ok() {
                                self.rewrapped.push(id);
                            }
                            added
                        },
                        Err(err) => Err(err),
                    }
                },
            };
            if let Err(err) = result {
                self.action_errors.push(err);
            }
        }
    }
}

/// ============================================================================
/// MAP FIXTURE
/// ============================================================================

pub struct MapFixture {
    pub map: ObjectMap<Wrapper>,
    pub host: TestHost,
}

impl MapFixture {
    /// Map with the default prime table (first size 521)
    pub fn with_defaults() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Map with a custom prime table
    pub fn with_primes(primes: &[usize]) -> Self {
        Self::with_config(MapConfig::with_primes(primes.to_vec()))
    }

    pub fn with_config(config: MapConfig) -> Self {
        let map = ObjectMap::new(config).expect("map initialization should succeed with valid config");
        Self {
            map,
            host: TestHost::new(),
        }
    }

    /// Create a record and add it to the map
    pub fn wrap(&mut self, address: usize, ty: TypeTag) -> RecordId {
        let id = self
            .map
            .create_record(address, Wrapper::new(ty))
            .expect("record creation should succeed");
        self.map
            .add(id, &mut self.host)
            .expect("add should succeed");
        id
    }

    /// Create a record with the share hint and add it to the map
    pub fn wrap_shared(&mut self, address: usize, ty: TypeTag) -> RecordId {
        let id = self
            .map
            .create_shared_record(address, Wrapper::new(ty))
            .expect("record creation should succeed");
        self.map
            .add(id, &mut self.host)
            .expect("add should succeed");
        id
    }

    pub fn unwrap(&mut self, id: RecordId) {
        self.map
            .remove(id, &self.host)
            .expect("remove should succeed");
    }

    pub fn find(&self, address: usize, ty: TypeTag) -> Option<RecordId> {
        self.map.find(address, &ty, &self.host)
    }

    pub fn chain(&self, address: usize) -> Vec<RecordId> {
        self.map.iter_at(address).collect()
    }

    /// Mark the native object behind `id` as gone
    pub fn kill(&mut self, id: RecordId) {
        self.map
            .record_mut(id)
            .expect("record should exist")
            .payload_mut()
            .alive = false;
    }
}

/// Assert the structural invariants of the fixture's map
pub fn assert_invariants(fixture: &MapFixture, context: &str) {
    let map = &fixture.map;
    if let Err(err) = map.check_invariants(&fixture.host) {
        panic!("{}: invariant violated: {}", context, err);
    }
    assert_eq!(
        map.unused_buckets() + map.stale_buckets() + map.occupied_buckets(),
        map.table_size(),
        "{}: unused + stale + occupied must equal size",
        context
    );
}

/// Distinct, non-null, pointer-aligned addresses
pub fn address(i: usize) -> usize {
    0x10_0000 + i * 16
}
