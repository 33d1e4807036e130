//! # mixcop-core
//!
//! Shared error type and trait seams for mixcop.
//!
//! Numeric code in the other crates returns [`Result`] instead of aborting, so a
//! host inference engine can reject a single invalid parameter proposal and keep
//! going.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{LogDensityModel, TruncatedLogDensity};
