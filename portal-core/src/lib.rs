//! Portal Core - Shared infrastructure for the portal session crates
//!
//! Error handling, logging setup, configuration and async helpers used by
//! the storage, session and CLI crates.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
