//! Line values handed out by the splitter.
//!
//! A line is either a view into the decode chunk it was found in (no copy),
//! or an owned string when its text had to be stitched together from more
//! than one chunk. Chunks are immutable `Arc<String>`s, so a view stays valid
//! however long the caller keeps the line, and a chunk is freed once the
//! splitter has moved past it and every line viewing it has been dropped.

use alloc::{string::String, sync::Arc};
use core::{fmt, ops::Deref};

/// The terminator that ended a [`Line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// No terminator: the trailing text returned when the stream is closed.
    Unterminated,
}

impl LineEnding {
    /// The terminator's text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Unterminated => "",
        }
    }
}

#[derive(Clone)]
enum Text {
    Shared {
        chunk: Arc<String>,
        start: usize,
        end: usize,
    },
    Owned(String),
}

/// One line of text, without its terminator.
///
/// Derefs to `str`. Compare against string slices directly:
///
/// ```rust
/// use linetail::{Line, LineEnding};
///
/// let line = Line::owned("hello".into(), LineEnding::CrLf);
/// assert_eq!(line, "hello");
/// assert_eq!(line.ending().as_str(), "\r\n");
/// ```
#[derive(Clone)]
pub struct Line {
    text: Text,
    ending: LineEnding,
}

impl Line {
    /// A line viewing `chunk[start..end]`.
    pub(crate) fn shared(
        chunk: &Arc<String>,
        start: usize,
        end: usize,
        ending: LineEnding,
    ) -> Self {
        debug_assert!(chunk.is_char_boundary(start) && chunk.is_char_boundary(end));
        Self {
            text: Text::Shared {
                chunk: Arc::clone(chunk),
                start,
                end,
            },
            ending,
        }
    }

    /// A line owning its text.
    #[must_use]
    pub fn owned(text: String, ending: LineEnding) -> Self {
        Self {
            text: Text::Owned(text),
            ending,
        }
    }

    /// The line's text, without the terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match &self.text {
            Text::Shared { chunk, start, end } => &chunk[*start..*end],
            Text::Owned(s) => s,
        }
    }

    /// How the line was terminated.
    #[must_use]
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    /// Returns `true` if the text is a view into a decode chunk rather than a
    /// copy.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self.text, Text::Shared { .. })
    }

    /// Converts into an owned `String`, copying only if the text is shared.
    #[must_use]
    pub fn into_string(self) -> String {
        match self.text {
            Text::Shared { chunk, start, end } => match Arc::try_unwrap(chunk) {
                Ok(mut whole) if start == 0 => {
                    whole.truncate(end);
                    whole
                }
                Ok(whole) => String::from(&whole[start..end]),
                Err(chunk) => String::from(&chunk[start..end]),
            },
            Text::Owned(s) => s,
        }
    }
}

impl Deref for Line {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Line")
            .field("text", &self.as_str())
            .field("ending", &self.ending)
            .finish()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.ending == other.ending
    }
}

impl Eq for Line {}

impl PartialEq<str> for Line {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<Line> for &str {
    fn eq(&self, other: &Line) -> bool {
        *self == other.as_str()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Line {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
