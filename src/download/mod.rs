//! Download system for vscrape

pub mod ffmpeg;
pub mod progress;
pub mod retry;

pub use ffmpeg::*;
pub use progress::*;
pub use retry::*;
