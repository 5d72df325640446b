//! Embed page access and packed script evaluation

pub mod client;
pub mod cookies;
pub mod packer;
pub mod page;
pub mod sandbox;

pub use client::*;
pub use cookies::*;
pub use packer::PackerEvaluator;
pub use page::*;
pub use sandbox::SandboxEvaluator;
