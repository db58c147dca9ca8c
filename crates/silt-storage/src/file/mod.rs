//! Synchronous file I/O layer for silt.
//!
//! This module provides the segment-file abstraction the buffer pool reads
//! and writes through:
//!
//! - **`FileHandle`**: positional `read_at`/`write_at` primitives plus
//!   `read_block`/`write_block` block helpers. Reads past the end of a file
//!   yield zero bytes for the unwritten range; writes extend the file.
//! - **`StandardFile`**: the `std::fs`-backed implementation.
//! - **`SegmentManager`**: lazily opens one file per segment, named by the
//!   decimal representation of the segment id.

mod error;
mod handle;
mod options;
mod segment;
mod std_io;

pub use error::{IoError, IoResult};
pub use handle::FileHandle;
pub use options::OpenOptions;
pub use segment::SegmentManager;
pub use std_io::StandardFile;
