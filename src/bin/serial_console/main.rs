use std::ffi::OsString;

use async_compat::CompatExt;
use rustyline_async::ReadlineError;
use structopt::StructOpt;
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
        Frame,
        NullChecksum,
    },
    ChecksumKind,
    FrameLink,
    FrameSource,
    LinkOptions,
};

mod options;

pub use options::Options;

pub const DEFAULT_LEVEL_STR: &str = {
    cfg_if::cfg_if! {
        if #[cfg(not(debug_assertions))] {
            "warn"
        } else {
            "info,satlink_codec=debug"
        }
    }
};

#[derive(structopt::StructOpt)]
#[structopt(setting = structopt::clap::AppSettings::NoBinaryName)]
enum Command {
    /// Send a raw frame.
    Raw {
        #[structopt(required = true)]
        value: String,
    },

    /// Send a full frame. Address and control are hex bytes.
    Frame {
        #[structopt(parse(try_from_str = parse_byte))]
        address: u8,

        #[structopt(parse(try_from_str = parse_byte))]
        control: u8,

        #[structopt(default_value = "")]
        value: String,
    },

    /// Write bytes to the port without framing.
    Literal {
        #[structopt(required = true)]
        value: String,
    },
}

fn parse_byte(s: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(s.trim_start_matches("0x"), 16)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts: Options = Options::from_args();
    satlink::trace::init(DEFAULT_LEVEL_STR)?;

    let stream = opts.serial.open()?;
    let (reader, writer) = tokio::io::split(stream);

    match opts.link.checksum {
        ChecksumKind::Crc16 => console::<_, _, Fcs16>(reader, writer, &opts.link).await,
        ChecksumKind::Null => console::<_, _, NullChecksum>(reader, writer, &opts.link).await,
    }
}

async fn console<R, W, C>(reader: R, writer: W, link: &LinkOptions) -> eyre::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
    C: Checksum + 'static,
{
    let observer = LinkOptions::default_observer();

    let (source, mut sink) = FrameLink::<R, W, C>::with_codecs(
        reader,
        writer,
        link.raw_codec(observer.clone()),
        link.hdlc_codec(observer),
    )
    .split();

    let (mut rl, w) = rustyline_async::Readline::new("> ".to_owned())?;

    tokio::spawn({
        let w = w.clone().compat();
        let raw = link.raw;

        async move {
            let result = read_downlink(source, raw, w).await;
            satlink::trace_catch!(result, "reading downlink");
        }
    });

    let mut w = w.compat();

    loop {
        w.flush().await?;

        let line = match rl.readline().await {
            Ok(line) => line,

            Err(ReadlineError::Closed)
            | Err(ReadlineError::Eof)
            | Err(ReadlineError::Interrupted) => return Ok(()),

            e @ Err(ReadlineError::IO(_)) => e?,
        };

        let words = match shlex::split(&line) {
            Some(x) => x,
            None => {
                w.write_all(b"failed to split line\n").await?;
                continue;
            },
        };

        let command = match Command::from_iter_safe(words.into_iter().map(OsString::from)) {
            Ok(c) => c,
            Err(e) => {
                w.write_all(format!("command error: {e}\n").as_bytes()).await?;
                continue;
            },
        };

        let result = match command {
            Command::Raw {
                value,
            } => match hex::decode(value) {
                Ok(val) => sink.send_raw(val).await,
                Err(e) => {
                    w.write_all(format!("error: invalid argument: {e}\n").as_bytes()).await?;
                    continue;
                },
            },

            Command::Frame {
                address,
                control,
                value,
            } => match hex::decode(value) {
                Ok(val) => sink.send_frame(Frame::new(address, control, val)).await,
                Err(e) => {
                    w.write_all(format!("error: invalid argument: {e}\n").as_bytes()).await?;
                    continue;
                },
            },

            Command::Literal {
                value,
            } => {
                let val = match hex::decode(value) {
                    Ok(val) => val,
                    Err(e) => {
                        w.write_all(format!("error: invalid argument: {e}\n").as_bytes()).await?;
                        continue;
                    },
                };

                let port = sink.get_mut();
                let result = async {
                    port.write_all(&val).await?;
                    port.flush().await
                }
                .await;

                result.map_err(Error::from)
            },
        };

        match result {
            Ok(()) => w.write_all(b"sent\n").await?,
            Err(e) if e.is_transport() => return Err(e.into()),
            Err(e) => w.write_all(format!("error: {e}\n").as_bytes()).await?,
        }
    }
}

async fn read_downlink<R, C>(
    mut source: FrameSource<R, C>,
    raw: bool,
    mut output: impl AsyncWrite + Unpin,
) -> eyre::Result<()>
where
    R: AsyncRead + Unpin,
    C: Checksum,
{
    loop {
        output.flush().await?;

        let line = if raw {
            match source.receive_raw().await {
                Ok(payload) => format!("DOWN RAW\n\t{}\n", hex::encode(&payload)),
                Err(e) if e.is_transport() => return Err(e.into()),
                Err(e) => format!("DOWN ERROR\n\t{e}\n"),
            }
        } else {
            match source.receive_frame().await {
                Ok(frame) => format!(
                    "DOWN FRAME\n\taddr {:#04x} ctrl {:#04x}\n\t{}\n",
                    frame.address,
                    frame.control,
                    hex::encode(&frame.payload)
                ),
                Err(e) if e.is_transport() => return Err(e.into()),
                Err(e) => format!("DOWN ERROR\n\t{e}\n"),
            }
        };

        output.write_all(line.as_bytes()).await?;
    }
}
