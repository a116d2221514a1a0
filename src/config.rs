use crate::data::Encoding;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const PATH_VAR: &str = "STARTUP_CSV_PATH";
pub const ENCODING_VAR: &str = "STARTUP_CSV_ENCODING";
pub const DEFAULT_PATH: &str = "investments2.csv";

/// Where the start-up data lives and how it is encoded.
///
/// Values come from the environment (optionally seeded from a `.env` file);
/// the market threshold and ranking length are fixed constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input_path: PathBuf,
    pub encoding: Encoding,
}

impl Config {
    /// Reads `STARTUP_CSV_PATH` and `STARTUP_CSV_ENCODING`, falling back to
    /// `investments2.csv` in ISO-8859-1.
    ///
    /// # Errors
    /// Returns an error if the encoding variable names an unsupported encoding
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var(PATH_VAR).ok(), env::var(ENCODING_VAR).ok())
    }

    fn from_vars(path: Option<String>, encoding: Option<String>) -> Result<Self> {
        let input_path = path
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));

        let encoding = match encoding {
            Some(name) => name
                .parse::<Encoding>()
                .with_context(|| format!("invalid {}", ENCODING_VAR))?,
            None => Encoding::default(),
        };

        Ok(Self {
            input_path,
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(None, None).unwrap();
        assert_eq!(config.input_path, PathBuf::from("investments2.csv"));
        assert_eq!(config.encoding, Encoding::Latin1);
    }

    #[test]
    fn test_overrides() {
        let config =
            Config::from_vars(Some("data/startups.csv".into()), Some("UTF-8".into())).unwrap();
        assert_eq!(config.input_path, PathBuf::from("data/startups.csv"));
        assert_eq!(config.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_blank_path_uses_default() {
        let config = Config::from_vars(Some("  ".into()), None).unwrap();
        assert_eq!(config.input_path, PathBuf::from(DEFAULT_PATH));
    }

    #[test]
    fn test_unknown_encoding_fails() {
        let err = Config::from_vars(None, Some("cp1252".into())).unwrap_err();
        assert!(err.to_string().contains(ENCODING_VAR));
    }
}
