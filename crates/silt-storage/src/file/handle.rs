//! File handle trait.

use std::path::Path;

use super::error::{IoError, IoResult};

/// Trait for positional file operations.
///
/// This trait provides a unified interface for file I/O that can be
/// implemented by different backends. All operations are position-based
/// (pread/pwrite style) so concurrent calls to distinct offsets are safe.
pub trait FileHandle: Send + Sync {
    /// Returns the file path.
    fn path(&self) -> &Path;

    /// Returns the current file size.
    fn size(&self) -> IoResult<u64>;

    /// Reads data from the file at the specified offset.
    ///
    /// Returns the number of bytes read. May return less than the buffer
    /// size if EOF is reached.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize>;

    /// Writes data to the file at the specified offset.
    ///
    /// Returns the number of bytes written.
    fn write_at(&self, buf: &[u8], offset: u64) -> IoResult<usize>;

    /// Syncs all data and metadata to disk.
    fn sync(&self) -> IoResult<()>;

    /// Fills `buf` with `buf.len()` bytes starting at `offset`.
    ///
    /// Reading past the end of the file yields zero bytes for the
    /// unwritten range.
    fn read_block(&self, buf: &mut [u8], offset: u64) -> IoResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(&mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf[filled..].fill(0);
        Ok(())
    }

    /// Writes all of `buf` at `offset`, extending the file if necessary.
    fn write_block(&self, buf: &[u8], offset: u64) -> IoResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write_at(&buf[written..], offset + written as u64)?;
            if n == 0 {
                return Err(IoError::short_write(buf.len(), written));
            }
            written += n;
        }
        Ok(())
    }
}
