//! File-backed records owned by the stamper

pub mod cache;
pub mod header;

pub use cache::*;
pub use header::*;
