use super::Error;

/// Error when entity metadata or engine configuration is invalid.
///
/// Raised when an entity lacks a table name or primary key, a relation names
/// an unknown target or counterpart, or a many-to-many relation cannot locate
/// its join table.
#[derive(Debug)]
pub(super) struct ConfigurationError {
    message: Box<str>,
}

impl std::error::Error for ConfigurationError {}

impl core::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl Error {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Configuration(ConfigurationError {
            message: message.into().into_boxed_str(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a configuration error.
    pub fn is_configuration(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::Configuration(_)))
    }
}
