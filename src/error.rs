use thiserror::Error;

/// Returned by [`ChainedHashMap::at`](crate::ChainedHashMap::at) when the
/// key is absent.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
#[error("key not found")]
pub struct KeyNotFound;
