//! Byte sources the decoding cursor reads from.
//!
//! The contract differs from `std::io::Read` in one important way: a read
//! that returns `0` means "nothing available right now", never "end of
//! stream". A source backed by a file that another process is still writing
//! keeps returning `0` until more bytes are appended, and then returns them.
//!
//! Implementations provided here:
//!
//! - [`MemorySource`]: bytes in memory, optionally growing through an
//!   [`Appender`] handle, with an optional cap on bytes per read to simulate
//!   small network or pipe reads.
//! - `IoSource` (requires the `std` feature): any `Read + Seek`, such as a
//!   `std::fs::File`.

#[cfg(feature = "std")]
mod io;
mod memory;

#[cfg(feature = "std")]
pub use io::IoSource;
pub use memory::{Appender, MemorySource, MemorySourceError};

/// A seekable, possibly still-growing source of bytes.
pub trait ByteSource {
    /// Error reported by reads, seeks and availability queries.
    type Error;

    /// Reads the bytes available right now into `buf` and returns how many
    /// were read.
    ///
    /// # Contract
    /// - Must not block waiting for data that has not arrived yet.
    /// - `Ok(0)` means nothing is available at the moment. Later calls may
    ///   return more data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Byte offset of the next byte `read` will return.
    fn position(&self) -> u64;

    /// Moves the read position to `position`.
    ///
    /// On error the position must be unchanged.
    fn set_position(&mut self, position: u64) -> Result<(), Self::Error>;

    /// Best-effort count of bytes that can be read right now without blocking.
    fn available(&mut self) -> Result<u64, Self::Error>;

    /// Returns `true` until the source is closed.
    fn is_open(&self) -> bool;

    /// Closes the source. Closing an already closed source is a no-op.
    fn close(&mut self) -> Result<(), Self::Error>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    type Error = S::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) -> Result<(), Self::Error> {
        (**self).set_position(position)
    }

    fn available(&mut self) -> Result<u64, Self::Error> {
        (**self).available()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close()
    }
}
