use std::time::Duration;

use structopt::StructOpt as _;
use tokio::io::{
    AsyncRead,
    AsyncWrite,
    AsyncWriteExt,
};

use satlink::{
    codec::{
        Checksum,
        Error,
        Fcs16,
        NullChecksum,
    },
    ChecksumKind,
    FrameLink,
    LinkOptions,
};

pub use crate::options::Options;

mod options;

pub const DEFAULT_LEVEL_STR: &str = {
    cfg_if::cfg_if! {
        if #[cfg(not(debug_assertions))] {
            "warn,satlink=info"
        } else {
            "info,satlink=debug,satlink_codec=debug"
        }
    }
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    satlink::bootstrap!("starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let options: Options = Options::from_args();
    satlink::trace::init(DEFAULT_LEVEL_STR)?;

    let stream = options.serial.open()?;
    let (reader, writer) = tokio::io::split(stream);

    let monitor = async {
        match options.link.checksum {
            ChecksumKind::Crc16 => monitor::<_, _, Fcs16>(reader, writer, &options).await,
            ChecksumKind::Null => monitor::<_, _, NullChecksum>(reader, writer, &options).await,
        }
    };

    tokio::select! {
        result = monitor => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(())
        },
    }
}

fn build_link<R, W, C>(reader: R, writer: W, link: &LinkOptions) -> FrameLink<R, W, C>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Checksum,
{
    let observer = LinkOptions::default_observer();

    FrameLink::with_codecs(reader, writer, link.raw_codec(observer.clone()), link.hdlc_codec(observer))
        .with_line_codec(link.line_codec())
}

async fn monitor<R, W, C>(reader: R, writer: W, options: &Options) -> eyre::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Checksum,
{
    let mut link = build_link::<R, W, C>(reader, writer, &options.link);
    let timeout = options.timeout_ms.map(Duration::from_millis);

    if options.lines {
        return echo_lines(&mut link).await;
    }

    for _ in 0..options.bootstrap_lines {
        let line = link.read_line().await?;
        println!("LINE\t{}", String::from_utf8_lossy(&line));
    }

    tracing::info!(raw = options.link.raw, "reading frames");

    loop {
        let result = match (options.link.raw, timeout) {
            (true, Some(t)) => link.receive_raw_timeout(t).await.map(describe_raw),
            (true, None) => link.receive_raw().await.map(describe_raw),
            (false, Some(t)) => link.receive_frame_timeout(t).await.map(describe_frame),
            (false, None) => link.receive_frame().await.map(describe_frame),
        };

        match result {
            Ok(description) => println!("{description}"),
            Err(Error::Timeout) => tracing::info!(?timeout, "no frame received"),
            // already reported by the link observer
            Err(Error::ChecksumMismatch { .. }) => {},
            Err(e) => return Err(e.into()),
        }
    }
}

/// Copies newline-terminated text to stdout as received, until the port closes.
async fn echo_lines<R, W, C>(link: &mut FrameLink<R, W, C>) -> eyre::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Checksum,
{
    let mut stdout = tokio::io::stdout();

    loop {
        match link.read_line().await {
            Ok(line) => {
                stdout.write_all(&line).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            },
            Err(e @ Error::Framing(_)) => tracing::warn!(error = %e, "dropping line"),
            Err(e) => return Err(e.into()),
        }
    }
}

fn describe_raw(payload: bytes::Bytes) -> String {
    format!("RAW\t{}", hex::encode(&payload))
}

fn describe_frame(frame: satlink::codec::Frame) -> String {
    format!(
        "FRAME\taddr={:#04x} ctrl={:#04x}\t{}",
        frame.address,
        frame.control,
        hex::encode(&frame.payload)
    )
}
