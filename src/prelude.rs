pub use crate::pkg::err::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;
