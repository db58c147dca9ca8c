//! # silt-common
//!
//! Common types and constants for the silt storage engine.
//!
//! This crate provides the foundational types shared across all silt
//! components:
//!
//! - **Types**: Core identifiers (`PageId`, `SegmentId`)
//! - **Constants**: System-wide constants and limits
//!
//! ## Example
//!
//! ```rust
//! use silt_common::types::{PageId, SegmentId};
//!
//! let page = PageId::from_parts(SegmentId::new(3), 7);
//! assert_eq!(page.segment(), SegmentId::new(3));
//! assert_eq!(page.local(), 7);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use types::{PageId, SegmentId};
