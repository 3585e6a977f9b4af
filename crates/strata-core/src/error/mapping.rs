use super::Error;

/// Error when a column value cannot be written to, or read from, an entity field.
#[derive(Debug)]
pub(super) struct MappingError {
    entity: Box<str>,
    field: Box<str>,
}

impl std::error::Error for MappingError {}

impl core::fmt::Display for MappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cannot map field `{}.{}`", self.entity, self.field)
    }
}

impl Error {
    /// Creates a mapping error for `entity.field`.
    ///
    /// Usually attached as context to the underlying conversion failure.
    pub fn mapping(entity: impl AsRef<str>, field: impl AsRef<str>) -> Error {
        Error::from(super::ErrorKind::Mapping(MappingError {
            entity: entity.as_ref().into(),
            field: field.as_ref().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a mapping error.
    pub fn is_mapping(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::Mapping(_)))
    }
}
