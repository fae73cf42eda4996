use std::path::PathBuf;

use config::Config as CConfig;
use serde::{Deserialize, Serialize};

use crate::conf::{CacheConfig, ReaderSettings};
use crate::core::MarqError::{self, ConfigParsingError};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub reader: ReaderSettings,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    fn default_data_dir() -> PathBuf {
        PathBuf::from(".")
    }

    pub fn from_str(toml_str: &str) -> Result<Config, MarqError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            reader: ReaderSettings::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_correct_toml() {
        let toml = r#"
        data_dir = "/var/lib/marq"

        [reader]
        checksum_on_read = false

        [reader.read]
        buffer_size = "64 KiB"

        [cache]
        block_cache_entries = 16
        "#;
        let conf = Config::from_str(toml).unwrap();
        assert_eq!(conf.data_dir, PathBuf::from("/var/lib/marq"));
        assert!(!conf.reader.checksum_on_read);
        assert!(conf.reader.save_marks_in_cache);
        assert_eq!(conf.reader.read.buffer_size, 64 * 1024);
        assert_eq!(conf.cache.block_cache_entries, 16);
    }

    #[test]
    fn load_empty_toml_uses_defaults() {
        let conf = Config::from_str("").unwrap();
        assert_eq!(conf, Config::default());
    }

    #[test]
    fn reject_unknown_fields() {
        let conf = Config::from_str("unknown_knob = 1");
        assert!(matches!(conf, Err(MarqError::ConfigParsingError(_))));
    }
}
