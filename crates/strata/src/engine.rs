mod exec;

pub(crate) mod hierarchy;

pub(crate) mod materialize;

mod persist;
pub(crate) use persist::Persister;
