//! Station directory error types.

/// A station name that is not in the directory.
///
/// This is a configuration problem, never a transient one: retrying the
/// same lookup always fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown station: {name:?}")]
pub struct UnknownStation {
    pub name: String,
}
