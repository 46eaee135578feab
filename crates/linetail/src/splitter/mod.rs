//! Line splitting on top of a [`DecodingCursor`].
//!
//! [`LineSplitter`] is demand driven: nothing is read until a caller asks for
//! a line, and a pull stops as soon as one line is queued or the source has
//! nothing more to give right now. "Nothing right now" is reported as
//! [`NextLine::Pending`], so a caller tailing a growing file simply asks again
//! later.
//!
//! Each decode produces a fresh, immutable chunk (`Arc<String>`). A line that
//! lies within one chunk is handed out as a view into it. Only a line that
//! spans chunks is copied, when the cached partial line is joined with the
//! slice that completes it.
//!
//! Line endings: `\n` ends a line, and a `\r` directly before it is part of
//! the terminator, even when the two arrive in different chunks. A `\r`
//! anywhere else is ordinary content. A terminator is always consumed with the
//! line it ends.

use alloc::{collections::VecDeque, string::String, sync::Arc, vec::Vec};
use core::mem;

use bstr::ByteSlice;

use crate::{
    cursor::{DecodeStop, DecodingCursor},
    decoder::{AnyDecoder, CharDecoder},
    error::StreamError,
    line::{Line, LineEnding},
    options::LineReaderOptions,
    source::ByteSource,
};


/// Outcome of polling a [`LineSplitter`] for its next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLine {
    /// A complete line.
    Ready(Line),
    /// No complete line is available right now. More may arrive later; this
    /// is not end of stream.
    Pending,
}

impl NextLine {
    /// Returns the line, if one was ready.
    #[must_use]
    pub fn ready(self) -> Option<Line> {
        match self {
            NextLine::Ready(line) => Some(line),
            NextLine::Pending => None,
        }
    }

    /// Returns `true` for [`NextLine::Pending`].
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, NextLine::Pending)
    }
}

/// Where a [`LineSplitter`] stands between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitterState {
    /// No lines queued; the next request pulls from the source.
    Empty,
    /// Lines are queued and will be served without reading.
    HasLines,
    /// The last pull found no complete line because the source had nothing
    /// more. A later request tries again.
    DrainingAtEofSoFar,
}

/// Splits the text decoded from a [`ByteSource`] into lines.
///
/// # Example: tailing a growing source
///
/// ```rust
/// use linetail::{LineReaderOptions, LineSplitter, MemorySource, NextLine};
///
/// let (source, appender) = MemorySource::growing();
/// let mut lines = LineSplitter::open(source, LineReaderOptions::default());
///
/// appender.append(b"first\nsec");
/// assert_eq!(lines.next_line()?.ready().unwrap(), "first");
/// assert_eq!(lines.next_line()?, NextLine::Pending);
///
/// appender.append(b"ond\r\nthi");
/// assert_eq!(lines.next_line()?.ready().unwrap(), "second");
///
/// let tail = lines.close_returning_tail()?;
/// assert_eq!(tail, ["thi"]);
/// # Ok::<(), linetail::StreamError<linetail::MemorySourceError>>(())
/// ```
#[derive(Debug)]
pub struct LineSplitter<S: ByteSource, D = AnyDecoder> {
    cursor: DecodingCursor<S, D>,
    queue: VecDeque<Line>,
    /// Unterminated text carried over from earlier chunks. Empty when none.
    partial: String,
    /// Chunk being scanned, and the byte offset scanning resumes at.
    chunk: Option<Arc<String>>,
    scan_pos: usize,
    chunk_chars: usize,
    max_lines_per_scan: usize,
    /// Malformed input found after lines that are still queued.
    deferred: Option<StreamError<S::Error>>,
    drained: bool,
    closed: bool,
}

impl<S: ByteSource> LineSplitter<S> {
    /// Creates a splitter over `source` using the charset named in `options`.
    pub fn open(source: S, options: LineReaderOptions) -> Self {
        Self::with_decoder(source, options.charset.decoder(), options)
    }
}

impl<S: ByteSource, D: CharDecoder> LineSplitter<S, D> {
    /// Creates a splitter with an explicit decoder. `options.charset` is
    /// ignored.
    pub fn with_decoder(source: S, decoder: D, options: LineReaderOptions) -> Self {
        let per_char = decoder.bytes_per_char_estimate();
        let buffer_size = options.resolved_buffer_size(per_char);
        Self {
            cursor: DecodingCursor::new(source, decoder, buffer_size),
            queue: VecDeque::new(),
            partial: String::new(),
            chunk: None,
            scan_pos: 0,
            chunk_chars: options.chunk_chars(per_char),
            max_lines_per_scan: options.max_lines_per_scan.map_or(usize::MAX, |n| n.get()),
            deferred: None,
            drained: false,
            closed: false,
        }
    }

    /// Returns the next complete line, or [`NextLine::Pending`] if none is
    /// available right now.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Closed`] after [`LineSplitter::close_returning_tail`],
    ///   or once the source is closed and no lines remain queued.
    /// - [`StreamError::Malformed`] when undecodable bytes are reached. Lines
    ///   decoded before them are returned first. The error is reported once;
    ///   reset the decoder to continue.
    /// - Errors from the source.
    pub fn next_line(&mut self) -> Result<NextLine, StreamError<S::Error>> {
        self.fill()?;
        Ok(match self.queue.pop_front() {
            Some(line) => NextLine::Ready(line),
            None => NextLine::Pending,
        })
    }

    /// Returns `true` if a complete line is available, pulling from the
    /// source if needed. Does not consume the line.
    ///
    /// # Errors
    ///
    /// Same as [`LineSplitter::next_line`].
    pub fn has_more_lines(&mut self) -> Result<bool, StreamError<S::Error>> {
        self.fill()?;
        Ok(!self.queue.is_empty())
    }

    /// Returns the next complete line without consuming it.
    ///
    /// # Errors
    ///
    /// Same as [`LineSplitter::next_line`].
    pub fn peek_line(&mut self) -> Result<Option<&Line>, StreamError<S::Error>> {
        self.fill()?;
        Ok(self.queue.front())
    }

    /// Iterates over the lines available right now.
    ///
    /// The iterator ends at the first [`NextLine::Pending`]. It yields an
    /// error at most once and then ends.
    pub fn ready(&mut self) -> Ready<'_, S, D> {
        Ready {
            splitter: self,
            done: false,
        }
    }

    /// Returns `true` if the stream is closed, or if the source reports no
    /// bytes available and none are buffered awaiting decoding.
    ///
    /// This is a point-in-time answer. A growing source can make it `false`
    /// again.
    ///
    /// # Errors
    ///
    /// Errors from the source's availability query.
    pub fn is_at_end_of_file_so_far(&mut self) -> Result<bool, StreamError<S::Error>> {
        if self.closed || !self.cursor.is_open() {
            return Ok(true);
        }
        Ok(self.cursor.available_bytes()? == 0 && !self.cursor.has_buffered_undecoded_bytes())
    }

    /// Byte position of the decoding cursor.
    ///
    /// This counts bytes read from the source, including bytes whose lines
    /// are still queued or partial. It is not the position of the next line.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Moves to byte `position`, dropping every queued line, the cached
    /// partial line and any undecoded bytes.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, or
    /// [`StreamError::InvalidPosition`] if the source rejects the offset. On
    /// error the splitter is left exactly as it was.
    pub fn set_position(&mut self, position: u64) -> Result<(), StreamError<S::Error>> {
        self.ensure_not_closed()?;
        self.cursor.set_position(position)?;
        log::debug!(
            "seek to {position}: dropped {} queued lines, {} partial bytes",
            self.queue.len(),
            self.partial.len()
        );
        self.queue.clear();
        self.partial.clear();
        self.chunk = None;
        self.scan_pos = 0;
        self.deferred = None;
        self.drained = false;
        Ok(())
    }

    /// Closes the stream and returns every line not yet handed out, followed
    /// by the unterminated trailing text, if any, as a line ending in
    /// [`LineEnding::Unterminated`].
    ///
    /// Text already decoded but not yet scanned is split too. Bytes still
    /// awaiting decoding are discarded.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Closed`] if already closed.
    /// - [`StreamError::Malformed`] if undecodable bytes were found after
    ///   lines that are still queued. The splitter stays open with those
    ///   lines queued: reset the decoder to keep reading, or close again to
    ///   collect them.
    /// - The source's error if it fails to close.
    ///
    /// On error nothing is returned or cleared.
    pub fn close_returning_tail(&mut self) -> Result<Vec<Line>, StreamError<S::Error>> {
        self.ensure_not_closed()?;
        if let Some(err) = self.deferred.take() {
            log::debug!("close refused: malformed input not yet reported");
            return Err(err);
        }
        self.cursor.close()?;
        self.closed = true;

        self.scan_chunk(usize::MAX);
        self.chunk = None;
        let mut lines: Vec<Line> = self.queue.drain(..).collect();
        if !self.partial.is_empty() {
            lines.push(Line::owned(
                mem::take(&mut self.partial),
                LineEnding::Unterminated,
            ));
        }
        log::debug!("closed, returning {} lines", lines.len());
        Ok(lines)
    }

    /// The splitter's current state.
    #[must_use]
    pub fn state(&self) -> SplitterState {
        if !self.queue.is_empty() {
            SplitterState::HasLines
        } else if self.drained {
            SplitterState::DrainingAtEofSoFar
        } else {
            SplitterState::Empty
        }
    }

    /// Discards the decoder's state after [`StreamError::Malformed`] so
    /// reading can continue at the current byte position.
    pub fn reset_decoder(&mut self) {
        self.cursor.reset_decoder();
    }

    /// Swaps in a new decoder, returning the old one.
    pub fn replace_decoder(&mut self, decoder: D) -> D {
        self.cursor.replace_decoder(decoder)
    }

    /// The underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        self.cursor.get_ref()
    }

    /// The underlying source, mutably. Repositioning it directly leaves
    /// stale lines queued; use [`LineSplitter::set_position`].
    pub fn get_mut(&mut self) -> &mut S {
        self.cursor.get_mut()
    }

    fn ensure_not_closed(&self) -> Result<(), StreamError<S::Error>> {
        if self.closed {
            Err(StreamError::Closed)
        } else {
            Ok(())
        }
    }

    /// Pulls chunks until a line is queued or the source has nothing more
    /// right now.
    fn fill(&mut self) -> Result<(), StreamError<S::Error>> {
        self.ensure_not_closed()?;
        loop {
            self.scan_chunk(self.max_lines_per_scan);
            if !self.queue.is_empty() {
                self.drained = false;
                return Ok(());
            }
            if let Some(err) = self.deferred.take() {
                return Err(err);
            }

            self.chunk = None;
            self.scan_pos = 0;
            let mut text = String::with_capacity(self.chunk_chars);
            let decoded = self.cursor.decode(&mut text, self.chunk_chars)?;
            if !text.is_empty() {
                self.chunk = Some(Arc::new(text));
            }

            if let DecodeStop::Malformed { offset, sequence } = decoded.stop {
                log::debug!("malformed input at byte {offset}");
                self.deferred = Some(StreamError::Malformed { offset, sequence });
                continue;
            }
            if decoded.produced == 0 && decoded.bytes_read == 0 {
                log::trace!("nothing available at byte {}", self.position());
                self.drained = true;
                return Ok(());
            }
        }
    }

    /// Scans the current chunk from `scan_pos`, queueing complete lines until
    /// `limit` lines are queued or the chunk is exhausted. An unterminated
    /// remainder moves into `partial`.
    fn scan_chunk(&mut self, limit: usize) {
        let Some(chunk) = self.chunk.clone() else {
            return;
        };
        let bytes = chunk.as_bytes();
        while self.scan_pos < bytes.len() && self.queue.len() < limit {
            let start = self.scan_pos;
            if let Some(found) = bytes[start..].find_byte(b'\n') {
                let newline = start + found;
                self.scan_pos = newline + 1;
                let line = self.complete_line(&chunk, start, newline);
                self.queue.push_back(line);
            } else {
                self.partial.push_str(&chunk[start..]);
                self.scan_pos = bytes.len();
            }
        }
    }

    /// Builds the line ending at the `\n` at `chunk[newline]`, joining it with
    /// any cached partial line.
    fn complete_line(&mut self, chunk: &Arc<String>, start: usize, newline: usize) -> Line {
        let slice = &chunk[start..newline];
        if self.partial.is_empty() {
            return match slice.strip_suffix('\r') {
                Some(text) => Line::shared(chunk, start, start + text.len(), LineEnding::CrLf),
                None => Line::shared(chunk, start, newline, LineEnding::Lf),
            };
        }

        let mut text = mem::take(&mut self.partial);
        text.push_str(slice);
        let ending = if text.ends_with('\r') {
            text.pop();
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        Line::owned(text, ending)
    }
}

/// Iterator over the lines a [`LineSplitter`] has available right now.
///
/// Created by [`LineSplitter::ready`].
pub struct Ready<'a, S: ByteSource, D> {
    splitter: &'a mut LineSplitter<S, D>,
    done: bool,
}

impl<S: ByteSource, D: CharDecoder> Iterator for Ready<'_, S, D> {
    type Item = Result<Line, StreamError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.splitter.next_line() {
            Ok(NextLine::Ready(line)) => Some(Ok(line)),
            Ok(NextLine::Pending) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
