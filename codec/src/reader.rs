use bytes::{
    BufMut,
    BytesMut,
};

use crate::{
    FramingError,
    FLAG,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting for an opening delimiter.
    SeekStart,

    /// Opening delimiter seen, collecting frame bytes.
    Accumulating,

    /// Collecting bytes that arrived without an opening delimiter. They are
    /// dropped at the next delimiter.
    ErrorRecovery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// The bytes between two delimiters, still stuffed.
    Frame(BytesMut),

    /// Bytes were dropped and the reader resynchronized.
    Discarded(FramingError),
}

/// Finds frame boundaries in a byte stream, one byte at a time.
///
/// Every [`FLAG`] closes at most one frame attempt. A closing delimiter
/// returns the reader to [`State::SeekStart`]; a delimiter that ends a span of
/// unopened bytes both discards them and opens the next frame. Back-to-back
/// delimiters are idle fill and never produce a frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReader {
    buf:     BytesMut,
    opened:  bool,
    max_len: Option<usize>,
}

impl FrameReader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of bytes buffered for a single frame.
    #[inline]
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    #[inline]
    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    #[inline]
    pub fn state(&self) -> State {
        match (self.opened, self.buf.is_empty()) {
            (true, _) => State::Accumulating,
            (false, true) => State::SeekStart,
            (false, false) => State::ErrorRecovery,
        }
    }

    #[inline]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn reset(&mut self) {
        self.buf.clear();
        self.opened = false;
    }

    pub fn push(&mut self, b: u8) -> Option<ReadEvent> {
        if b == FLAG {
            if self.buf.is_empty() {
                self.opened = true;
                return None;
            }

            if self.opened {
                self.opened = false;
                return Some(ReadEvent::Frame(self.buf.split()));
            }

            let len = self.buf.len();
            self.buf.clear();
            self.opened = true;

            return Some(ReadEvent::Discarded(FramingError::Unopened {
                len,
            }));
        }

        if let Some(max) = self.max_len {
            if self.buf.len() >= max {
                self.reset();

                return Some(ReadEvent::Discarded(FramingError::Overlong {
                    max,
                }));
            }
        }

        self.buf.put_u8(b);
        None
    }

    /// Drop any partial frame at end of stream.
    pub fn finish(&mut self) -> Option<FramingError> {
        if self.buf.is_empty() {
            self.opened = false;
            return None;
        }

        let len = self.buf.len();
        let err = if self.opened {
            FramingError::Truncated {
                len,
            }
        } else {
            FramingError::Unopened {
                len,
            }
        };

        self.reset();
        Some(err)
    }
}
