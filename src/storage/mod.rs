//! On-disk output layout

pub mod store;

pub use store::*;
