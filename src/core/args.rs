use clap::Parser;
use log::kv::{ToValue, Value};

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    #[arg(short, long)]
    pub config: Option<String>,

    /// Column path prefix to inspect, relative to the data directory
    /// (e.g. `part0/value` for `part0/value.bin` + `part0/value.mrk`).
    pub column: String,
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}
