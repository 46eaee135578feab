use alloc::{rc::Rc, vec::Vec};
use core::cell::RefCell;

use thiserror::Error;

use super::ByteSource;

/// Errors reported by [`MemorySource`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySourceError {
    /// A seek target lies beyond the bytes written so far.
    #[error("position {position} is past the end ({len} bytes)")]
    PositionOutOfRange {
        /// The requested position.
        position: u64,
        /// Bytes currently held.
        len: u64,
    },
    /// The source was closed.
    #[error("memory source is closed")]
    Closed,
}

#[derive(Debug, Default)]
struct Shared {
    data: Vec<u8>,
    closed: bool,
}

/// An in-memory [`ByteSource`].
///
/// Besides wrapping a fixed byte buffer, a `MemorySource` can be created
/// together with an [`Appender`] that keeps adding bytes after reading has
/// started, which is how a file being tailed behaves.
///
/// # Example: growing source
///
/// ```rust
/// use linetail::{ByteSource, MemorySource};
///
/// let (mut source, appender) = MemorySource::growing();
/// let mut buf = [0u8; 8];
/// assert_eq!(source.read(&mut buf).unwrap(), 0); // nothing yet, not EOF
///
/// appender.append(b"hi\n");
/// assert_eq!(source.read(&mut buf).unwrap(), 3);
/// assert_eq!(&buf[..3], b"hi\n");
/// ```
#[derive(Debug)]
pub struct MemorySource {
    shared: Rc<RefCell<Shared>>,
    pos: usize,
    read_limit: usize,
}

/// Write handle for a growing [`MemorySource`].
#[derive(Debug, Clone)]
pub struct Appender {
    shared: Rc<RefCell<Shared>>,
}

impl MemorySource {
    /// Creates a source over a copy of `data`.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                data: data.into(),
                closed: false,
            })),
            pos: 0,
            read_limit: usize::MAX,
        }
    }

    /// Creates an empty source and the handle used to grow it.
    #[must_use]
    pub fn growing() -> (Self, Appender) {
        let source = Self::new(Vec::new());
        let appender = Appender {
            shared: Rc::clone(&source.shared),
        };
        (source, appender)
    }

    /// Caps every `read` at `limit` bytes (minimum 1), to exercise callers
    /// with small, irregular reads.
    #[must_use]
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit.max(1);
        self
    }

    /// Returns a write handle for this source.
    #[must_use]
    pub fn appender(&self) -> Appender {
        Appender {
            shared: Rc::clone(&self.shared),
        }
    }

    fn len(&self) -> usize {
        self.shared.borrow().data.len()
    }
}

impl ByteSource for MemorySource {
    type Error = MemorySourceError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let shared = self.shared.borrow();
        if shared.closed {
            return Err(MemorySourceError::Closed);
        }
        let remaining = shared.data.get(self.pos..).unwrap_or_default();
        let n = remaining.len().min(buf.len()).min(self.read_limit);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }

    fn set_position(&mut self, position: u64) -> Result<(), Self::Error> {
        if !self.is_open() {
            return Err(MemorySourceError::Closed);
        }
        let len = self.len();
        match usize::try_from(position) {
            Ok(pos) if pos <= len => {
                self.pos = pos;
                Ok(())
            }
            _ => Err(MemorySourceError::PositionOutOfRange {
                position,
                len: len as u64,
            }),
        }
    }

    fn available(&mut self) -> Result<u64, Self::Error> {
        if !self.is_open() {
            return Err(MemorySourceError::Closed);
        }
        Ok(self.len().saturating_sub(self.pos) as u64)
    }

    fn is_open(&self) -> bool {
        !self.shared.borrow().closed
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.shared.borrow_mut().closed = true;
        Ok(())
    }
}

impl Appender {
    /// Appends bytes to the end of the source.
    pub fn append(&self, bytes: &[u8]) {
        self.shared.borrow_mut().data.extend_from_slice(bytes);
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.borrow().data.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes the source from the writing side.
    pub fn close_source(&self) {
        self.shared.borrow_mut().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_limit_caps_each_read() {
        let mut source = MemorySource::new(&b"hello world"[..]).with_read_limit(3);
        let mut buf = [0u8; 10];
        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"hel");
        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"lo ");
        assert_eq!(source.position(), 6);
        assert_eq!(source.available().unwrap(), 5);
    }

    #[test]
    fn zero_limit_is_clamped_to_one() {
        let mut source = MemorySource::new(&b"abc"[..]).with_read_limit(0);
        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap(), 1);
    }

    #[test]
    fn exhausted_source_resumes_after_append() {
        let (mut source, appender) = MemorySource::growing();
        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        appender.append(b"ab");
        assert_eq!(source.available().unwrap(), 2);
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        assert!(!appender.is_empty());
    }

    #[test]
    fn seek_past_end_is_rejected_without_moving() {
        let mut source = MemorySource::new(&b"abc"[..]);
        let mut buf = [0u8; 1];
        source.read(&mut buf).unwrap();
        assert_eq!(
            source.set_position(4),
            Err(MemorySourceError::PositionOutOfRange {
                position: 4,
                len: 3
            })
        );
        assert_eq!(source.position(), 1);
        source.set_position(3).unwrap();
        assert_eq!(source.available().unwrap(), 0);
    }

    #[test]
    fn closed_source_fails_fast() {
        let mut source = MemorySource::new(&b"abc"[..]);
        source.appender().close_source();
        assert!(!source.is_open());
        let mut buf = [0u8; 1];
        assert_eq!(source.read(&mut buf), Err(MemorySourceError::Closed));
        assert_eq!(source.set_position(0), Err(MemorySourceError::Closed));
    }
}
