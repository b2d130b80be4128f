//! Lapse Frame Store
//!
//! Describes how capture output is laid out on disk and recovers
//! synchronization state from it:
//! - **Layout:** one directory per monitor identity, one PNG per tick
//! - **Scanner:** rebuilds every directory's frame sequence from disk
//! - **Timeline:** the authoritative list of tick timestamps that every
//!   directory is aligned against
//!
//! ```text
//! <root>/
//!   screen_1920x1080_0_0/
//!     2026-01-01_00-00-00-000.png
//!     2026-01-01_00-00-05-000.png
//!   screen_1280x720_1920_0/
//!     2026-01-01_00-00-00-000_filler.png
//!     2026-01-01_00-00-05-000.png
//! ```

pub mod error;
pub mod layout;
pub mod scanner;
pub mod timeline;

pub use error::*;
pub use layout::*;
pub use scanner::*;
pub use timeline::*;
