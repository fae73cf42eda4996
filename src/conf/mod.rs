mod cache;
mod config;
mod reader;

pub use cache::CacheConfig;
pub use config::Config;
pub use reader::{ReadSettings, ReaderSettings};
