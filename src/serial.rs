use std::str::FromStr;

use tokio_serial::{
    DataBits,
    Parity,
    SerialPortBuilder,
    SerialStream,
    StopBits,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParityArg(pub Parity);

impl FromStr for ParityArg {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parity = match s {
            "none" => Parity::None,
            "odd" => Parity::Odd,
            "even" => Parity::Even,
            s => eyre::bail!("unknown parity '{s}'"),
        };

        Ok(ParityArg(parity))
    }
}

/// Serial line settings. Defaults are 9600 baud, 8N1.
#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct SerialConfig {
    #[structopt(long = "serial_port", required = true)]
    pub port: String,

    #[structopt(long = "baud", default_value = "9600")]
    pub baud: u32,

    #[structopt(long = "data_bits", default_value = "8", possible_values = &["5", "6", "7", "8"])]
    pub data_bits: u8,

    #[structopt(long = "parity", default_value = "none", possible_values = &["none", "odd", "even"])]
    pub parity: ParityArg,

    #[structopt(long = "stop_bits", default_value = "1", possible_values = &["1", "2"])]
    pub stop_bits: u8,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port:      port.into(),
            baud:      9600,
            data_bits: 8,
            parity:    ParityArg(Parity::None),
            stop_bits: 1,
        }
    }

    pub fn builder(&self) -> eyre::Result<SerialPortBuilder> {
        let data_bits = match self.data_bits {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            8 => DataBits::Eight,
            n => eyre::bail!("unsupported data bits: {n}"),
        };

        let stop_bits = match self.stop_bits {
            1 => StopBits::One,
            2 => StopBits::Two,
            n => eyre::bail!("unsupported stop bits: {n}"),
        };

        Ok(tokio_serial::new(&self.port, self.baud)
            .data_bits(data_bits)
            .parity(self.parity.0)
            .stop_bits(stop_bits))
    }

    #[tracing::instrument(skip(self), fields(port = %self.port, baud = self.baud))]
    pub fn open(&self) -> eyre::Result<SerialStream> {
        let builder = self.builder()?;
        let stream = SerialStream::open(&builder)?;

        tracing::info!("opened serial port");

        Ok(stream)
    }
}

#[cfg(test)]
mod test {
    use structopt::StructOpt;

    use super::*;

    #[test]
    fn test_defaults_are_8n1_9600() {
        let config = SerialConfig::from_iter_safe(["test", "--serial_port", "/dev/ttyUSB0"]).unwrap();

        assert_eq!(config, SerialConfig::new("/dev/ttyUSB0"));
    }

    #[test]
    fn test_port_required() {
        assert!(SerialConfig::from_iter_safe(["test"]).is_err());
    }

    #[test]
    fn test_invalid_bits() {
        let mut config = SerialConfig::new("/dev/null");
        config.stop_bits = 3;

        assert!(config.builder().is_err());
    }

    #[test]
    fn test_parity() -> eyre::Result<()> {
        assert_eq!("even".parse::<ParityArg>()?.0, Parity::Even);
        assert!("mark".parse::<ParityArg>().is_err());

        Ok(())
    }

    #[test]
    fn test_missing_port_fails_to_open() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let result = rt.block_on(async { SerialConfig::new("/dev/satlink-does-not-exist").open() });

        assert!(result.is_err());
    }
}
