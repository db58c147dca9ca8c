//! Type definitions for silt.
//!
//! This module contains the core identifier types used across the storage
//! engine.

mod ids;

pub use ids::{PageId, SegmentId};
