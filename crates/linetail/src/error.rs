use bstr::BString;
use thiserror::Error;

/// Errors surfaced by [`DecodingCursor`](crate::DecodingCursor) and
/// [`LineSplitter`](crate::LineSplitter).
///
/// `E` is the error type of the underlying [`ByteSource`](crate::ByteSource).
/// "No bytes available right now" is never an error; it is reported as
/// [`NextLine::Pending`](crate::NextLine::Pending) or as a zero-length decode.
#[derive(Error, Debug, PartialEq)]
pub enum StreamError<E> {
    /// The decoder met bytes that do not form a character in the configured
    /// charset. The bytes have been consumed. Call `reset_decoder` (or
    /// `replace_decoder`) to continue from the current byte position.
    #[error("malformed input at byte {offset}: {sequence:?}")]
    Malformed {
        /// Absolute byte offset of the first offending byte.
        offset: u64,
        /// The offending bytes.
        sequence: BString,
    },
    /// A decode was attempted after [`StreamError::Malformed`] without
    /// resetting or replacing the decoder.
    #[error("decoder must be reset after malformed input")]
    DecoderPoisoned,
    /// The source refused to move to `position`. Nothing was changed.
    #[error("cannot seek to byte {position}: {reason}")]
    InvalidPosition {
        /// The rejected offset.
        position: u64,
        /// Why the source rejected it.
        reason: E,
    },
    /// The stream, or its source, has been closed.
    #[error("stream is closed")]
    Closed,
    /// The source failed to read or to report its state.
    #[error("source error: {0}")]
    Source(E),
}

impl<E> StreamError<E> {
    /// Returns `true` for [`StreamError::Malformed`], the one error a caller
    /// can recover from by resetting the decoder.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
