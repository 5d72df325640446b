//! Deobfuscation, metadata extraction and the scrape pipeline

pub mod extractor;
pub mod layout;
pub mod metadata;
pub mod scraper;
pub mod unpacker;
pub mod video_info;

pub use extractor::{extract, extract_str};
pub use metadata::*;
pub use scraper::*;
pub use unpacker::{detect, unpack, unpack_with, Engine, Evaluator, PACKER_MARKER};
pub use video_info::*;
