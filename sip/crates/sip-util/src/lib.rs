//! sip-util - Foundation Types for the SIP Runtime
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! Small building blocks shared by the SIP runtime crates. The object map keeps
//! its wrapped-object records in an arena and links them through typed handles
//! instead of raw `next` pointers; the typed vector and handle macro used for
//! that live here.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. TYPE SAFETY
//!    Typed indices keep handles from different arenas apart at compile time.
//!
//! 2. STABLE IDENTITY
//!    A handle names a slot, never a copy. Moving a handle around never moves
//!    the value it refers to.
//!
//! 3. FALLIBLE GROWTH
//!    Handle spaces are bounded (`u32`). Running out is reported as an error
//!    instead of wrapping around.

pub mod error;
pub mod index_vec;

pub use error::{IndexVecError, IndexVecResult};
pub use index_vec::{Idx, IndexVec};
