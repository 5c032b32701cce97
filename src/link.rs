//! Frames over a tokio byte stream.
//!
//! [`FrameSource`] owns the read side and suspends until a complete frame
//! arrives. [`FrameSink`] owns the write side and hands each frame to the
//! transport in a single write followed by a flush. [`FrameLink`] pairs the two
//! for one duplex transport; one link per transport, nothing is shared between
//! links.

use std::{
    io,
    time::Duration,
};

use bytes::{
    Bytes,
    BytesMut,
};
use codec::{
    tokio_codec::{
        Decoder,
        Encoder,
    },
    Checksum,
    Error,
    Fcs16,
    Frame,
    HdlcCodec,
    LineCodec,
    RawFrameCodec,
};
use tokio::io::{
    AsyncRead,
    AsyncReadExt,
    AsyncWrite,
    AsyncWriteExt,
};

const READ_CHUNK: usize = 256;

pub struct FrameSource<R, C = Fcs16> {
    reader: R,
    buf:    BytesMut,
    eof:    bool,
    raw:    RawFrameCodec,
    hdlc:   HdlcCodec<C>,
    lines:  LineCodec,
}

impl<R, C> FrameSource<R, C>
where
    R: AsyncRead + Unpin,
    C: Checksum,
{
    pub fn new(reader: R) -> Self {
        Self::with_codecs(reader, RawFrameCodec::new(), HdlcCodec::default())
    }

    pub fn with_codecs(reader: R, raw: RawFrameCodec, hdlc: HdlcCodec<C>) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            raw,
            hdlc,
            lines: LineCodec::new(),
        }
    }

    /// Replaces the codec [`read_line`](Self::read_line) uses, e.g. to bound
    /// line length.
    pub fn with_line_codec(mut self, lines: LineCodec) -> Self {
        self.lines = lines;
        self
    }

    /// Next newline-terminated line, for text a peer prints before it starts
    /// framing. Bytes after the newline stay buffered for the frame readers.
    pub async fn read_line(&mut self) -> Result<Bytes, Error> {
        read_item(&mut self.reader, &mut self.buf, &mut self.eof, &mut self.lines).await
    }

    /// Next raw frame payload. Malformed frames are skipped.
    pub async fn receive_raw(&mut self) -> Result<Bytes, Error> {
        read_item(&mut self.reader, &mut self.buf, &mut self.eof, &mut self.raw).await
    }

    /// Next full frame. Malformed frames are skipped; a checksum mismatch is
    /// returned and the following call resumes after the bad frame.
    pub async fn receive_frame(&mut self) -> Result<Frame, Error> {
        read_item(&mut self.reader, &mut self.buf, &mut self.eof, &mut self.hdlc).await
    }

    /// [`receive_raw`](Self::receive_raw), giving up after `timeout`. Nothing
    /// is lost on timeout: partial frames stay buffered.
    pub async fn receive_raw_timeout(&mut self, timeout: Duration) -> Result<Bytes, Error> {
        tokio::time::timeout(timeout, self.receive_raw()).await.map_err(|_| Error::Timeout)?
    }

    /// [`receive_frame`](Self::receive_frame), giving up after `timeout`.
    /// Nothing is lost on timeout: partial frames stay buffered.
    pub async fn receive_frame_timeout(&mut self, timeout: Duration) -> Result<Frame, Error> {
        tokio::time::timeout(timeout, self.receive_frame()).await.map_err(|_| Error::Timeout)?
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.reader
    }
}

async fn read_item<R, D>(
    reader: &mut R,
    buf: &mut BytesMut,
    eof: &mut bool,
    decoder: &mut D,
) -> Result<D::Item, Error>
where
    R: AsyncRead + Unpin,
    D: Decoder<Error = Error>,
{
    loop {
        if *eof {
            return decoder
                .decode_eof(buf)?
                .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        if let Some(item) = decoder.decode(buf)? {
            return Ok(item);
        }

        buf.reserve(READ_CHUNK);
        if reader.read_buf(buf).await? == 0 {
            tracing::debug!("transport reached eof");
            *eof = true;
        }
    }
}

pub struct FrameSink<W, C = Fcs16> {
    writer: W,
    buf:    BytesMut,
    raw:    RawFrameCodec,
    hdlc:   HdlcCodec<C>,
}

impl<W, C> FrameSink<W, C>
where
    W: AsyncWrite + Unpin,
    C: Checksum,
{
    pub fn new(writer: W) -> Self {
        Self::with_codecs(writer, RawFrameCodec::new(), HdlcCodec::default())
    }

    pub fn with_codecs(writer: W, raw: RawFrameCodec, hdlc: HdlcCodec<C>) -> Self {
        Self {
            writer,
            buf: BytesMut::new(),
            raw,
            hdlc,
        }
    }

    pub async fn send_raw(&mut self, payload: impl AsRef<[u8]>) -> Result<(), Error> {
        self.buf.clear();
        self.raw.encode(payload, &mut self.buf)?;

        self.flush_buf().await
    }

    pub async fn send_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.buf.clear();
        self.hdlc.encode(frame, &mut self.buf)?;

        self.flush_buf().await
    }

    async fn flush_buf(&mut self) -> Result<(), Error> {
        self.writer.write_all(&self.buf).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// The transport, for writes that bypass framing.
    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub struct FrameLink<R, W, C = Fcs16> {
    source: FrameSource<R, C>,
    sink:   FrameSink<W, C>,
}

impl<R, W, C> FrameLink<R, W, C>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Checksum,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_codecs(reader, writer, RawFrameCodec::new(), HdlcCodec::default())
    }

    /// Both directions get their own copy of the codecs' configuration.
    pub fn with_codecs(reader: R, writer: W, raw: RawFrameCodec, hdlc: HdlcCodec<C>) -> Self {
        Self {
            source: FrameSource::with_codecs(reader, raw.clone(), hdlc.clone()),
            sink:   FrameSink::with_codecs(writer, raw, hdlc),
        }
    }

    pub fn with_line_codec(mut self, lines: LineCodec) -> Self {
        self.source = self.source.with_line_codec(lines);
        self
    }

    #[inline]
    pub async fn send_raw(&mut self, payload: impl AsRef<[u8]>) -> Result<(), Error> {
        self.sink.send_raw(payload).await
    }

    #[inline]
    pub async fn send_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.sink.send_frame(frame).await
    }

    #[inline]
    pub async fn read_line(&mut self) -> Result<Bytes, Error> {
        self.source.read_line().await
    }

    #[inline]
    pub async fn receive_raw(&mut self) -> Result<Bytes, Error> {
        self.source.receive_raw().await
    }

    #[inline]
    pub async fn receive_frame(&mut self) -> Result<Frame, Error> {
        self.source.receive_frame().await
    }

    #[inline]
    pub async fn receive_raw_timeout(&mut self, timeout: Duration) -> Result<Bytes, Error> {
        self.source.receive_raw_timeout(timeout).await
    }

    #[inline]
    pub async fn receive_frame_timeout(&mut self, timeout: Duration) -> Result<Frame, Error> {
        self.source.receive_frame_timeout(timeout).await
    }

    #[inline]
    pub fn split(self) -> (FrameSource<R, C>, FrameSink<W, C>) {
        (self.source, self.sink)
    }
}
