/// Relations whose contents are written along with the saved entity.
///
/// Owning to-one targets are always saved first; the relations listed here
/// are the inverse and to-many sides to synchronize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    relations: Vec<String>,
}

/// Relations a removal cascades through. Cascades through every relation
/// unless restricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    only: Option<Vec<String>>,
}

impl SaveOptions {
    pub fn new() -> SaveOptions {
        SaveOptions::default()
    }

    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.relations.push(relation.into());
        self
    }

    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub(crate) fn cascades(&self, relation: &str) -> bool {
        self.relations.iter().any(|name| name == relation)
    }
}

impl RemoveOptions {
    pub fn all() -> RemoveOptions {
        RemoveOptions::default()
    }

    /// Cascades only through `relations`.
    pub fn only<I, S>(relations: I) -> RemoveOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RemoveOptions {
            only: Some(relations.into_iter().map(Into::into).collect()),
        }
    }

    pub(crate) fn cascades(&self, relation: &str) -> bool {
        match &self.only {
            Some(only) => only.iter().any(|name| name == relation),
            None => true,
        }
    }
}
