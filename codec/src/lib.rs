//! Byte-oriented HDLC-style framing.
//!
//! Frames on the wire look like
//!
//! ```text
//! full: 7E | ADDR | CTRL | STUFFED(payload ‖ FCS) | 7E
//! raw:  7E | STUFFED(payload) | 7E
//! ```
//!
//! [`FLAG`] and [`ESCAPE`] never appear literally between delimiters: each is
//! replaced with `ESCAPE, byte ^ ESCAPE_MASK`.

pub use ::tokio_util::codec as tokio_codec;

pub mod checksum;
mod error;
mod frame;
mod hdlc;
mod line;
mod observer;
mod reader;
pub mod stuffing;

pub use self::{
    checksum::{
        Checksum,
        Fcs16,
        NullChecksum,
    },
    error::{
        Error,
        FramingError,
    },
    frame::*,
    hdlc::{
        HdlcCodec,
        RawFrameCodec,
    },
    line::LineCodec,
    observer::{
        LinkObserver,
        NoopObserver,
        TracingObserver,
    },
    reader::{
        FrameReader,
        ReadEvent,
        State as ReaderState,
    },
};

/// Frame delimiter.
pub const FLAG: u8 = 0x7E;

/// Introduces a stuffed byte.
pub const ESCAPE: u8 = 0x7D;

/// Stuffed bytes are transmitted as `byte ^ ESCAPE_MASK`.
pub const ESCAPE_MASK: u8 = 0x20;

#[inline]
pub const fn is_reserved(b: u8) -> bool {
    b == FLAG || b == ESCAPE
}
