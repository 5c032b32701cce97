use satlink::{
    LinkOptions,
    SerialConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Options {
    #[structopt(flatten)]
    pub serial: SerialConfig,

    #[structopt(flatten)]
    pub link: LinkOptions,

    /// Only print newline-terminated lines, as received, until the port closes.
    /// Overrides `--bootstrap_lines`, `--raw` and `--checksum`.
    #[structopt(long = "lines")]
    pub lines: bool,

    /// Newline-terminated lines to print before switching to framed reads.
    #[structopt(long = "bootstrap_lines", default_value = "0")]
    pub bootstrap_lines: usize,

    /// Log a notice and keep waiting when no frame arrives in this long.
    #[structopt(long = "timeout_ms")]
    pub timeout_ms: Option<u64>,
}
