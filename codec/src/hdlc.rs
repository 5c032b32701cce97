use std::{
    fmt::{
        Debug,
        Formatter,
    },
    marker::PhantomData,
    sync::Arc,
};

use bytes::{
    Buf,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use crate::{
    decode_full,
    encode_raw_into,
    stuffing::destuff,
    Checksum,
    Error,
    Fcs16,
    Frame,
    FrameOptions,
    FrameReader,
    LinkObserver,
    ReadEvent,
    TracingObserver,
};

/// Frame boundary detection shared by both codecs.
#[derive(Clone)]
struct Deframer {
    reader:   FrameReader,
    observer: Arc<dyn LinkObserver>,
}

impl Deframer {
    fn new() -> Self {
        Self {
            reader:   FrameReader::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Feed `src` through the reader until a frame completes. Consumed bytes
    /// are removed from `src`; unconsumed ones stay for the next call.
    fn next_frame(&mut self, src: &mut BytesMut) -> Option<BytesMut> {
        for i in 0..src.len() {
            match self.reader.push(src[i]) {
                Some(ReadEvent::Frame(frame)) => {
                    src.advance(i + 1);
                    return Some(frame);
                },
                Some(ReadEvent::Discarded(e)) => self.observer.error(&e.into()),
                None => {},
            }
        }

        src.clear();
        None
    }

    fn finish(&mut self) {
        if let Some(e) = self.reader.finish() {
            self.observer.error(&e.into());
        }
    }
}

impl Debug for Deframer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deframer").field("reader", &self.reader).finish_non_exhaustive()
    }
}

/// Delimited, stuffed payloads with no header or checksum.
///
/// Empty payloads encode to two bare delimiters and are never decoded back:
/// the reader treats them as idle fill.
#[derive(Debug, Clone)]
pub struct RawFrameCodec {
    deframer: Deframer,
}

impl RawFrameCodec {
    #[inline]
    pub fn new() -> Self {
        Self {
            deframer: Deframer::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LinkObserver>) -> Self {
        self.deframer.observer = observer;
        self
    }

    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.deframer.reader = FrameReader::with_max_len(max);
        self
    }
}

impl Default for RawFrameCodec {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Encoder<T> for RawFrameCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let old_len = dst.len();

        encode_raw_into(item.as_ref(), dst);
        self.deframer.observer.frame_sent(&dst[old_len..]);

        Ok(())
    }
}

impl Decoder for RawFrameCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(raw) = self.deframer.next_frame(src) {
            match destuff(&raw) {
                Ok(payload) => {
                    self.deframer.observer.frame_received(None, None, &payload);
                    return Ok(Some(payload.freeze()));
                },
                Err(e) => self.deframer.observer.error(&e.into()),
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        self.deframer.finish();
        Ok(None)
    }
}

/// Full frames: address, control, payload and a `C` checksum.
///
/// Framing errors are reported to the observer and skipped. A checksum
/// mismatch is returned as an error; the codec stays usable and the next call
/// picks up after the bad frame.
pub struct HdlcCodec<C = Fcs16> {
    deframer: Deframer,
    options:  FrameOptions,
    _phantom: PhantomData<fn() -> C>,
}

impl HdlcCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> HdlcCodec<C> {
    pub fn with_observer(mut self, observer: Arc<dyn LinkObserver>) -> Self {
        self.deframer.observer = observer;
        self
    }

    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.deframer.reader = FrameReader::with_max_len(max);
        self
    }

    pub fn escape_address_control(mut self, escape: bool) -> Self {
        self.options.escape_address_control = escape;
        self
    }

    #[inline]
    pub fn options(&self) -> FrameOptions {
        self.options
    }
}

impl<C> Default for HdlcCodec<C> {
    fn default() -> Self {
        Self {
            deframer: Deframer::new(),
            options:  FrameOptions::default(),
            _phantom: PhantomData,
        }
    }
}

impl<C> Clone for HdlcCodec<C> {
    fn clone(&self) -> Self {
        Self {
            deframer: self.deframer.clone(),
            options:  self.options,
            _phantom: PhantomData,
        }
    }
}

impl<C> Debug for HdlcCodec<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdlcCodec")
            .field("checksum", &std::any::type_name::<C>())
            .field("deframer", &self.deframer)
            .field("options", &self.options)
            .finish()
    }
}

impl<C> Encoder<Frame> for HdlcCodec<C>
where
    C: Checksum,
{
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if !self.options.escape_address_control && item.has_reserved_header() {
            self.deframer.observer.ambiguous_header(item.address, item.control);
        }

        let old_len = dst.len();

        item.encode_into::<C>(self.options, dst);
        self.deframer.observer.frame_sent(&dst[old_len..]);

        Ok(())
    }
}

impl<C> Decoder for HdlcCodec<C>
where
    C: Checksum,
{
    type Error = Error;
    type Item = Frame;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(raw) = self.deframer.next_frame(src) {
            match decode_full::<C>(&raw) {
                Ok(frame) => {
                    self.deframer.observer.frame_received(
                        Some(frame.address),
                        Some(frame.control),
                        &frame.payload,
                    );

                    return Ok(Some(frame));
                },
                Err(e @ Error::Framing(_)) => self.deframer.observer.error(&e),
                Err(e) => {
                    self.deframer.observer.error(&e);
                    return Err(e);
                },
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        self.deframer.finish();
        Ok(None)
    }
}
