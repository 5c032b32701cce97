use bytes::{
    Buf,
    BufMut,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use crate::{
    Error,
    FramingError,
};

/// Newline-terminated lines of arbitrary bytes.
///
/// Peers may print diagnostic text before they start framing. Unlike
/// [`tokio_util::codec::LinesCodec`] this makes no UTF-8 assumption. The
/// trailing `\n` is stripped; anything else, `\r` included, is kept.
///
/// With a maximum length, an overlong line is reported once as
/// [`FramingError::Overlong`] and the rest of it, up to and including the next
/// `\n`, is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineCodec {
    max_length:  Option<usize>,
    search_from: usize,
    discarding:  bool,
}

impl LineCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn max_length(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::default()
        }
    }

    fn overlong(&mut self, src: &mut BytesMut, max: usize) -> Error {
        src.clear();
        self.search_from = 0;
        self.discarding = true;

        FramingError::Overlong {
            max,
        }
        .into()
    }
}

impl Decoder for LineCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let start = self.search_from.min(src.len());
            let newline = src[start..].iter().position(|&b| b == b'\n').map(|offset| start + offset);

            match (self.discarding, newline) {
                (true, Some(end)) => {
                    src.advance(end + 1);
                    self.search_from = 0;
                    self.discarding = false;
                },
                (true, None) => {
                    src.clear();
                    self.search_from = 0;
                    return Ok(None);
                },
                (false, Some(end)) => {
                    if let Some(max) = self.max_length.filter(|&max| end > max) {
                        src.advance(end + 1);
                        self.search_from = 0;

                        return Err(FramingError::Overlong {
                            max,
                        }
                        .into());
                    }

                    let mut line = src.split_to(end + 1);
                    self.search_from = 0;

                    line.truncate(end);
                    return Ok(Some(line.freeze()));
                },
                (false, None) => {
                    if let Some(max) = self.max_length.filter(|&max| src.len() > max) {
                        return Err(self.overlong(src, max));
                    }

                    self.search_from = src.len();
                    return Ok(None);
                },
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        self.search_from = 0;

        if std::mem::take(&mut self.discarding) {
            buf.clear();
        }

        if buf.is_empty() {
            return Ok(None);
        }

        Ok(Some(buf.split().freeze()))
    }
}

impl<T> Encoder<T> for LineCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let item = item.as_ref();

        dst.reserve(item.len() + 1);
        dst.put(item);
        dst.put_u8(b'\n');

        Ok(())
    }
}
