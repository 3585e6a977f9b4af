mod delete;
pub use delete::Delete;

mod insert;
pub use insert::Insert;

mod lookup;
pub use lookup::Lookup;

mod select;
pub use select::{Count, RecursiveIds, Select};

mod update;
pub use update::Update;

/// A statement ready to be serialized.
#[derive(Debug)]
pub enum Statement<'a> {
    Select(Select<'a>),
    Count(Count<'a>),
    RecursiveIds(RecursiveIds<'a>),
    Lookup(&'a Lookup),
    Insert(&'a Insert),
    Update(&'a Update),
    Delete(&'a Delete),
}

impl<'a> From<Select<'a>> for Statement<'a> {
    fn from(value: Select<'a>) -> Self {
        Statement::Select(value)
    }
}

impl<'a> From<Count<'a>> for Statement<'a> {
    fn from(value: Count<'a>) -> Self {
        Statement::Count(value)
    }
}

impl<'a> From<RecursiveIds<'a>> for Statement<'a> {
    fn from(value: RecursiveIds<'a>) -> Self {
        Statement::RecursiveIds(value)
    }
}

impl<'a> From<&'a Lookup> for Statement<'a> {
    fn from(value: &'a Lookup) -> Self {
        Statement::Lookup(value)
    }
}

impl<'a> From<&'a Insert> for Statement<'a> {
    fn from(value: &'a Insert) -> Self {
        Statement::Insert(value)
    }
}

impl<'a> From<&'a Update> for Statement<'a> {
    fn from(value: &'a Update) -> Self {
        Statement::Update(value)
    }
}

impl<'a> From<&'a Delete> for Statement<'a> {
    fn from(value: &'a Delete) -> Self {
        Statement::Delete(value)
    }
}
