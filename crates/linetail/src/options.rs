use core::num::NonZeroUsize;

use crate::decoder::Charset;

/// Number of characters a single decode pass aims to produce when no explicit
/// buffer size is configured.
pub const DEFAULT_CHUNK_CHARS: usize = 8192;

/// Configuration for a [`LineSplitter`](crate::LineSplitter).
///
/// # Examples
///
/// ```rust
/// use core::num::NonZeroUsize;
/// use linetail::{Charset, LineReaderOptions};
///
/// let options = LineReaderOptions {
///     charset: Charset::Latin1,
///     max_lines_per_scan: NonZeroUsize::new(64),
///     ..Default::default()
/// };
/// assert_eq!(options.buffer_size, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LineReaderOptions {
    /// Character set used to decode the source bytes.
    ///
    /// # Default
    ///
    /// [`Charset::Utf8`]
    pub charset: Charset,

    /// Size of the byte staging buffer, i.e. the most bytes a single read
    /// from the source may return.
    ///
    /// When `None`, the buffer holds [`DEFAULT_CHUNK_CHARS`] characters'
    /// worth of bytes for the chosen charset.
    ///
    /// # Default
    ///
    /// `None`
    pub buffer_size: Option<NonZeroUsize>,

    /// Upper bound on the number of lines queued by one scanning pass.
    ///
    /// Bounds the latency and memory of a single `next_line` call when a very
    /// large amount of text is already available. Scanning resumes where it
    /// stopped on the next pull.
    ///
    /// # Default
    ///
    /// `None` (unbounded)
    pub max_lines_per_scan: Option<NonZeroUsize>,
}

impl LineReaderOptions {
    /// Staging buffer size in bytes for a decoder that estimates
    /// `bytes_per_char` bytes per character.
    #[must_use]
    pub fn resolved_buffer_size(&self, bytes_per_char: usize) -> usize {
        match self.buffer_size {
            Some(size) => size.get(),
            None => DEFAULT_CHUNK_CHARS.saturating_mul(bytes_per_char.max(1)),
        }
    }

    /// Characters decoded per chunk for a decoder that estimates
    /// `bytes_per_char` bytes per character. Never zero.
    #[must_use]
    pub fn chunk_chars(&self, bytes_per_char: usize) -> usize {
        (self.resolved_buffer_size(bytes_per_char) / bytes_per_char.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_buffer_scales_with_charset_width() {
        let options = LineReaderOptions::default();
        assert_eq!(options.resolved_buffer_size(1), 8192);
        assert_eq!(options.resolved_buffer_size(2), 16384);
        assert_eq!(options.chunk_chars(2), DEFAULT_CHUNK_CHARS);
    }

    #[test]
    fn tiny_buffer_still_decodes_one_char() {
        let options = LineReaderOptions {
            buffer_size: NonZeroUsize::new(1),
            ..Default::default()
        };
        assert_eq!(options.resolved_buffer_size(2), 1);
        assert_eq!(options.chunk_chars(2), 1);
        assert_eq!(options.chunk_chars(1), 1);
    }
}
