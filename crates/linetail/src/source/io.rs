use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use super::ByteSource;

/// A [`ByteSource`] over any `Read + Seek`, typically a [`File`] that may
/// still be growing.
///
/// Reads that would block, or that find no new data, return `Ok(0)` instead
/// of signalling end of stream. `available` is the distance from the current
/// position to the current end, measured by seeking.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: Option<R>,
    pos: u64,
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "source is closed")
}

impl IoSource<File> {
    /// Opens the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns any error from opening the file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        log::debug!("opening {}", path.display());
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> IoSource<R> {
    /// Wraps `inner`, starting at its current position.
    ///
    /// # Errors
    ///
    /// Returns any error from querying the current position.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self {
            inner: Some(inner),
            pos,
        })
    }

    /// Returns the wrapped reader, or `None` once closed.
    pub fn into_inner(self) -> Option<R> {
        self.inner
    }

    fn inner(&mut self) -> io::Result<&mut R> {
        self.inner.as_mut().ok_or_else(closed)
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let inner = self.inner()?;
        let n = loop {
            match inner.read(buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break 0,
                Err(e) => return Err(e),
            }
        };
        self.pos += n as u64;
        log::trace!("read {n} bytes, now at {}", self.pos);
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn set_position(&mut self, position: u64) -> io::Result<()> {
        let inner = self.inner()?;
        let pos = inner.seek(SeekFrom::Start(position))?;
        self.pos = pos;
        Ok(())
    }

    fn available(&mut self) -> io::Result<u64> {
        let pos = self.pos;
        let inner = self.inner()?;
        let end = inner.seek(SeekFrom::End(0))?;
        if let Err(err) = inner.seek(SeekFrom::Start(pos)) {
            // Track wherever the failed seek left the reader.
            self.pos = inner.stream_position().unwrap_or(end);
            log::warn!("could not return to byte {pos}, now at {}: {err}", self.pos);
            return Err(err);
        }
        Ok(end.saturating_sub(pos))
    }

    fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.inner.take().is_some() {
            log::debug!("closed at byte {}", self.pos);
        }
        Ok(())
    }
}
