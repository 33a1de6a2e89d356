//! Common utilities and types shared across evibundle crates.

pub mod error;
pub mod hash;
pub mod timestamp;

pub use error::{Error, Result};
pub use hash::FileDigest;
pub use timestamp::Timestamp;
