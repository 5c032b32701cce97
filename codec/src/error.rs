/// Malformed frame boundaries. The codecs recover from these locally: the
/// offending bytes are dropped and scanning resumes at the next delimiter.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramingError {
    #[error("{len} bytes received before any start delimiter")]
    Unopened { len: usize },

    #[error("delimiter inside frame body")]
    EmbeddedDelimiter,

    #[error("frame ended with a dangling escape byte")]
    DanglingEscape,

    #[error("frame too short: {len} bytes after destuffing, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("frame exceeded maximum length of {max} bytes")]
    Overlong { max: usize },

    #[error("stream ended inside a frame ({len} bytes buffered)")]
    Truncated { len: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("checksum mismatch: expected 0x{}, received 0x{}", hex::encode(.expected), hex::encode(.received))]
    ChecksumMismatch {
        expected: Vec<u8>,
        received: Vec<u8>,
    },

    #[error("timed out waiting for a frame")]
    Timeout,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Failures of the underlying byte transport. These end the session;
    /// everything else is scoped to a single frame.
    #[inline]
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
