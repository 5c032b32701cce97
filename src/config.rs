use std::{
    str::FromStr,
    sync::Arc,
};

use codec::{
    Checksum,
    HdlcCodec,
    LineCodec,
    LinkObserver,
    RawFrameCodec,
    TracingObserver,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChecksumKind {
    /// CRC-16/IBM-SDLC.
    Crc16,

    /// Constant `00 00`, for peers without a real FCS.
    Null,
}

impl FromStr for ChecksumKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crc16" => Ok(ChecksumKind::Crc16),
            "null" => Ok(ChecksumKind::Null),
            s => Err(eyre::eyre!("unknown checksum '{s}' (expected crc16 or null)")),
        }
    }
}

/// Framing options shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct LinkOptions {
    #[structopt(long = "checksum", default_value = "crc16", possible_values = &["crc16", "null"])]
    pub checksum: ChecksumKind,

    /// Stuff address and control bytes. Peers must agree on this.
    #[structopt(long = "escape_address_control")]
    pub escape_address_control: bool,

    /// Raw frames: no address, control or checksum.
    #[structopt(long = "raw")]
    pub raw: bool,

    /// Upper bound on a frame or diagnostic line, in bytes as received.
    #[structopt(long = "max_frame_len")]
    pub max_frame_len: Option<usize>,
}

impl LinkOptions {
    pub fn raw_codec(&self, observer: Arc<dyn LinkObserver>) -> RawFrameCodec {
        let codec = RawFrameCodec::new().with_observer(observer);

        match self.max_frame_len {
            Some(max) => codec.max_frame_len(max),
            None => codec,
        }
    }

    pub fn hdlc_codec<C>(&self, observer: Arc<dyn LinkObserver>) -> HdlcCodec<C>
    where
        C: Checksum,
    {
        let codec = HdlcCodec::<C>::default()
            .with_observer(observer)
            .escape_address_control(self.escape_address_control);

        match self.max_frame_len {
            Some(max) => codec.max_frame_len(max),
            None => codec,
        }
    }

    pub fn line_codec(&self) -> LineCodec {
        match self.max_frame_len {
            Some(max) => LineCodec::max_length(max),
            None => LineCodec::new(),
        }
    }

    #[inline]
    pub fn default_observer() -> Arc<dyn LinkObserver> {
        Arc::new(TracingObserver)
    }
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LinkOptions::from_iter_safe(["test"]).unwrap();

        assert_eq!(opts.checksum, ChecksumKind::Crc16);
        assert!(!opts.escape_address_control);
        assert!(!opts.raw);
        assert_eq!(opts.max_frame_len, None);
        assert_eq!(opts.line_codec(), LineCodec::new());
    }

    #[test]
    fn test_null_checksum_option() {
        let opts = LinkOptions::from_iter_safe(["test", "--checksum", "null", "--max_frame_len", "512"]).unwrap();

        assert_eq!(opts.checksum, ChecksumKind::Null);
        assert_eq!(opts.max_frame_len, Some(512));
        assert_eq!(opts.line_codec(), LineCodec::max_length(512));
    }

    #[test]
    fn test_bad_checksum() {
        assert!(LinkOptions::from_iter_safe(["test", "--checksum", "md5"]).is_err());
    }
}
