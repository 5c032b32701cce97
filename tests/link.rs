use std::{
    io,
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use tokio::io::{
    split,
    AsyncWriteExt,
    DuplexStream,
    ReadHalf,
    WriteHalf,
};

use satlink::{
    codec::{
        encode_full,
        encode_raw,
        Checksum,
        Error,
        Fcs16,
        Frame,
        FramingError,
        HdlcCodec,
        LineCodec,
        NoopObserver,
        NullChecksum,
        RawFrameCodec,
        FLAG,
    },
    FrameLink,
    FrameSource,
};

type Link<C> = FrameLink<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>, C>;

fn pair<C>() -> (Link<C>, Link<C>)
where
    C: Checksum,
{
    let (a, b) = tokio::io::duplex(1024);
    let (ar, aw) = split(a);
    let (br, bw) = split(b);

    (FrameLink::new(ar, aw), FrameLink::new(br, bw))
}

#[tokio::test]
async fn test_full_frames_cross_the_link() -> eyre::Result<()> {
    let (mut ground, mut craft) = pair::<Fcs16>();

    let frames = vec![
        Frame::new(0x01, 0x03, Bytes::from_static(b"telemetry")),
        Frame::new(0x02, 0x13, vec![FLAG, 0x7D, 0x00, FLAG]),
        Frame::new(0x03, 0x00, Bytes::new()),
    ];

    for frame in &frames {
        craft.send_frame(frame.clone()).await?;
    }

    for frame in frames {
        assert_eq!(ground.receive_frame().await?, frame);
    }

    Ok(())
}

#[tokio::test]
async fn test_raw_frames_cross_the_link() -> eyre::Result<()> {
    let (mut ground, mut craft) = pair::<Fcs16>();

    craft.send_raw(b"\x78\x7e\x7d").await?;
    craft.send_raw(b"second").await?;

    assert_eq!(ground.receive_raw().await?, Bytes::from_static(b"\x78\x7e\x7d"));
    assert_eq!(ground.receive_raw().await?, Bytes::from_static(b"second"));

    Ok(())
}

#[tokio::test]
async fn test_null_checksum_wire_bytes() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(64);
    let mut source = FrameSource::<_, NullChecksum>::new(port);

    peer.write_all(&[0x7E, 0xA2, 0x03, 0x78, 0x7D, 0x5E, 0x7D, 0x5D, 0x00, 0x00, 0x7E]).await?;

    assert_eq!(source.receive_frame().await?, Frame::new(0xA2, 0x03, vec![0x78, 0x7E, 0x7D]));

    Ok(())
}

#[tokio::test]
async fn test_resyncs_after_line_noise() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(64);
    let mut source = FrameSource::<_, Fcs16>::new(port);

    peer.write_all(&[0x13, 0x37, 0x7D]).await?;
    peer.write_all(&[FLAG, 0x01, FLAG]).await?;
    peer.write_all(&encode_full::<Fcs16>(0x10, 0x20, b"after noise")).await?;

    assert_eq!(source.receive_frame().await?, Frame::new(0x10, 0x20, Bytes::from_static(b"after noise")));

    Ok(())
}

#[tokio::test]
async fn test_checksum_mismatch_is_returned_then_link_continues() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(64);
    let mut source = FrameSource::<_, Fcs16>::new(port);

    peer.write_all(&encode_full::<NullChecksum>(0x01, 0x02, b"unchecked")).await?;
    peer.write_all(&encode_full::<Fcs16>(0x01, 0x02, b"checked")).await?;

    match source.receive_frame().await {
        Err(Error::ChecksumMismatch {
            received, ..
        }) => assert_eq!(received, vec![0, 0]),
        other => panic!("expected checksum mismatch, got {other:?}"),
    }

    assert_eq!(source.receive_frame().await?, Frame::new(0x01, 0x02, Bytes::from_static(b"checked")));

    Ok(())
}

#[tokio::test]
async fn test_bootstrap_lines_then_frames() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(256);
    let mut source = FrameSource::<_, Fcs16>::new(port);

    let mut wire = b"boot ok\nfw 0.3\n".to_vec();
    wire.extend_from_slice(&encode_raw(b"first frame"));
    peer.write_all(&wire).await?;

    assert_eq!(source.read_line().await?, Bytes::from_static(b"boot ok"));
    assert_eq!(source.read_line().await?, Bytes::from_static(b"fw 0.3"));
    assert_eq!(source.receive_raw().await?, Bytes::from_static(b"first frame"));

    Ok(())
}

#[tokio::test]
async fn test_overlong_line_is_dropped() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(256);
    let mut source = FrameSource::<_, Fcs16>::new(port).with_line_codec(LineCodec::max_length(16));

    peer.write_all(&[0x41; 64]).await?;

    let result = source.read_line().await;
    assert!(
        matches!(result, Err(Error::Framing(FramingError::Overlong { max: 16 }))),
        "{result:?}"
    );

    let mut wire = [0x41; 8].to_vec();
    wire.extend_from_slice(b"\nfw 0.3\n");
    wire.extend_from_slice(&encode_raw(b"after"));
    peer.write_all(&wire).await?;

    assert_eq!(source.read_line().await?, Bytes::from_static(b"fw 0.3"));
    assert_eq!(source.receive_raw().await?, Bytes::from_static(b"after"));

    Ok(())
}

#[tokio::test]
async fn test_split_halves_run_independently() -> eyre::Result<()> {
    let (a, b) = tokio::io::duplex(256);
    let (ar, aw) = split(a);
    let (br, bw) = split(b);

    let observer = Arc::new(NoopObserver);
    let link = FrameLink::<_, _, Fcs16>::with_codecs(
        ar,
        aw,
        RawFrameCodec::new().with_observer(observer.clone()),
        HdlcCodec::default().with_observer(observer),
    );
    let (mut source, mut sink) = link.split();
    let mut peer = FrameLink::<_, _, Fcs16>::new(br, bw);

    let echo = tokio::spawn(async move {
        let frame = source.receive_frame().await?;
        Ok::<_, Error>(frame)
    });

    sink.send_raw(b"uplink").await?;
    assert_eq!(peer.receive_raw().await?, Bytes::from_static(b"uplink"));

    let frame = Frame::new(0x09, 0x01, Bytes::from_static(b"downlink"));
    peer.send_frame(frame.clone()).await?;
    assert_eq!(echo.await??, frame);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_keeps_partial_frame() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(64);
    let mut source = FrameSource::<_, Fcs16>::new(port);

    let wire = encode_full::<Fcs16>(0x05, 0x06, b"slow");
    let (head, tail) = wire.split_at(4);

    peer.write_all(head).await?;

    let result = source.receive_frame_timeout(Duration::from_millis(100)).await;
    assert!(matches!(result, Err(Error::Timeout)), "{result:?}");

    peer.write_all(tail).await?;

    assert_eq!(
        source.receive_frame_timeout(Duration::from_millis(100)).await?,
        Frame::new(0x05, 0x06, Bytes::from_static(b"slow"))
    );

    Ok(())
}

#[tokio::test]
async fn test_eof_is_a_transport_error() -> eyre::Result<()> {
    let (port, mut peer) = tokio::io::duplex(64);
    let mut source = FrameSource::<_, Fcs16>::new(port);

    peer.write_all(&[FLAG, 0x01, 0x02]).await?;
    drop(peer);

    let err = source.receive_frame().await.unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));

    Ok(())
}

#[tokio::test]
async fn test_escaped_header_link() -> eyre::Result<()> {
    let (a, b) = tokio::io::duplex(64);
    let (ar, aw) = split(a);
    let (br, bw) = split(b);

    let hdlc = HdlcCodec::<Fcs16>::default().escape_address_control(true);

    let mut ground = FrameLink::with_codecs(ar, aw, RawFrameCodec::new(), hdlc.clone());
    let mut craft = FrameLink::with_codecs(br, bw, RawFrameCodec::new(), hdlc);

    let frame = Frame::new(FLAG, 0x7D, Bytes::from_static(b"reserved header"));
    craft.send_frame(frame.clone()).await?;

    assert_eq!(ground.receive_frame().await?, frame);

    Ok(())
}
