mod args;
mod error;
mod logger;
pub mod readable;

pub use args::CliArgs;
pub use error::MarqError;
pub use logger::setup_logging;
