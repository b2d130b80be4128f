//! Lapse Common Utilities
//!
//! Shared infrastructure for all Lapse crates:
//! - Error types and result aliases
//! - Clock abstraction and frame timestamp formatting
//! - Tracing/logging initialization
//! - Configuration loading
//! - Cooperative shutdown signalling for the capture loop

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use shutdown::*;
