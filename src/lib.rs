//! Meeting Media Library
//!
//! Fetches congregation meeting media (songs, videos and pictures) for a given
//! week: works out which publication issue covers the week, reads the metadata
//! database embedded in the publication archive, resolves every referenced media
//! item through the publisher's APIs and downloads it, with progress reporting
//! and retrying HTTP.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
