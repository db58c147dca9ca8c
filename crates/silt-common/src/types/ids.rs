//! Core identifier types for silt.
//!
//! These types provide type-safe wrappers around numeric identifiers,
//! preventing accidental misuse of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{LOCAL_PAGE_ID_BITS, LOCAL_PAGE_ID_MASK};

/// Segment identifier - selects the backing file for a range of pages.
///
/// Each segment is stored in its own file, named by the decimal
/// representation of the segment id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SegmentId(u16);

impl SegmentId {
    /// Creates a new `SegmentId` from a raw u16 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentId({})", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for SegmentId {
    #[inline]
    fn from(id: u16) -> Self {
        Self::new(id)
    }
}

impl From<SegmentId> for u16 {
    #[inline]
    fn from(id: SegmentId) -> Self {
        id.0
    }
}

/// Page identifier - uniquely identifies a page in the database.
///
/// A page id packs two components into 64 bits: the high 16 bits hold the
/// segment id and the low 48 bits hold the page's position within that
/// segment. Both decompositions are total: every 64-bit value is a valid
/// page id.
///
/// # Example
///
/// ```rust
/// use silt_common::types::{PageId, SegmentId};
///
/// let page = PageId::from_parts(SegmentId::new(1), 42);
/// assert_eq!(page.segment().as_u16(), 1);
/// assert_eq!(page.local(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageId(u64);

impl PageId {
    /// Creates a new `PageId` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Builds a page id from a segment id and a segment-local page id.
    ///
    /// Bits of `local` above the low 48 are discarded.
    #[inline]
    #[must_use]
    pub const fn from_parts(segment: SegmentId, local: u64) -> Self {
        Self(((segment.as_u16() as u64) << LOCAL_PAGE_ID_BITS) | (local & LOCAL_PAGE_ID_MASK))
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the segment id held in the high 16 bits.
    #[inline]
    #[must_use]
    pub const fn segment(self) -> SegmentId {
        SegmentId::new((self.0 >> LOCAL_PAGE_ID_BITS) as u16)
    }

    /// Returns the page id within its segment, held in the low 48 bits.
    #[inline]
    #[must_use]
    pub const fn local(self) -> u64 {
        self.0 & LOCAL_PAGE_ID_MASK
    }

    /// Creates a PageId from bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Converts to bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PageId {
    #[inline]
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<PageId> for u64 {
    #[inline]
    fn from(id: PageId) -> Self {
        id.0
    }
}
