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
}
