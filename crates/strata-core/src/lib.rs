pub mod driver;
pub use driver::Executor;

mod error;
pub use error::{Error, IntoError};

pub mod schema;

pub mod stmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;
