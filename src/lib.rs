//! # vscrape
//!
//! Scrapes video metadata from embed pages whose player setup is hidden
//! behind a P.A.C.K.E.R. packed script.
//!
//! ## Features
//!
//! - Hermetic deobfuscation in an embedded V8 isolate, or a native decoder
//! - Regex extraction of sources, tracks, quality labels and playback rates
//! - Per-video output directory with every intermediate artifact
//! - HLS/MP4 downloads through ffmpeg with progress reporting
//! - HTTP API and command line front ends
//!
//! ## Example
//!
//! ```rust,no_run
//! use vscrape::{Config, Scraper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scraper = Scraper::new(Config::default().with_output_dir("./output"))?;
//!
//!     let info = scraper.scrape("9q4yh8ji5k4w").await?;
//!     if let Some(source) = info.best_source() {
//!         println!("{}", source.file);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use core::{extract, unpack, Engine, PlainSource, Scraper, VideoInfo, VideoMetadata};
pub use error::{DecodeError, ScrapeError};

/// Result type alias for vscrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;
