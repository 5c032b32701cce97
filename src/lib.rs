pub use codec;

pub mod config;
pub mod link;
mod macros;
pub mod serial;
pub mod trace;

pub use config::{
    ChecksumKind,
    LinkOptions,
};
pub use link::{
    FrameLink,
    FrameSink,
    FrameSource,
};
pub use serial::SerialConfig;
