//! Host collaborators
//!
//! The map only knows addresses, chains and flags. Everything it needs to
//! know about the managed runtime comes through [`WrapperHost`].

use crate::map::ObjectMap;
use crate::record::{RecordId, WrappedRecord};

/// The wrapping layer as seen by the object map
///
/// # Re-entrancy
///
/// [`common_dtor`](WrapperHost::common_dtor) runs with the map fully
/// committed: the displaced records are already unlinked, their `in_map`
/// flags cleared and the new record installed. The hook receives the map
/// mutably and may call back into `find`, `add`, `remove` or
/// `release_record`.
pub trait WrapperHost<T> {
    /// Runtime type descriptor passed to [`ObjectMap::find`]
    type Type: ?Sized;

    /// Address used as the hash key, ignoring any validity guard
    fn unguarded_address(&self, record: &WrappedRecord<T>) -> usize {
        record.address()
    }

    /// Whether the native object behind `record` is still reachable
    fn is_alive(&self, _record: &WrappedRecord<T>) -> bool {
        true
    }

    /// Whether `record` is an instance of `ty` or of a subtype of it
    fn is_instance(&self, record: &WrappedRecord<T>, ty: &Self::Type) -> bool;

    /// Tear down a record displaced by address reuse
    fn common_dtor(&mut self, map: &mut ObjectMap<T>, record: RecordId);
}
