//! Core error types for sip-util crate

use thiserror::Error;

/// Error type for index vector operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexVecError {
    /// Index out of bounds
    #[error("Index out of bounds: index {index}, length {length}")]
    OutOfBounds { index: usize, length: usize },

    /// The handle space of the index type is used up
    #[error("Index space exhausted: {length} elements, index type holds at most {max}")]
    Exhausted { length: usize, max: usize },
}

/// Result type alias for index vector operations
pub type IndexVecResult<T> = std::result::Result<T, IndexVecError>;
