use super::Error;

/// Error raised while writing an entity graph.
///
/// Covers failed inserts, updates and deletes, updates of entities without a
/// primary key, operations on removed entities and relationship
/// synchronization failures.
#[derive(Debug)]
pub(super) struct PersistenceError {
    message: Box<str>,
}

impl std::error::Error for PersistenceError {}

impl core::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "persistence failed: {}", self.message)
    }
}

impl Error {
    /// Creates a persistence error.
    pub fn persistence(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Persistence(PersistenceError {
            message: message.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a persistence error.
    pub fn is_persistence(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::Persistence(_)))
    }
}
