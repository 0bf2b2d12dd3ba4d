use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::parser::{ScanOptions, UnterminatedPolicy};

const DEFAULT_SHELL: &str = "/bin/sh";
const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;
const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

#[derive(Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub unterminated: Option<UnterminatedPolicy>,
    pub shell: Option<String>,
    pub cols: Option<u16>,
    pub rows: Option<u16>,
    pub read_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&toml_str).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(toml_str: &str) -> anyhow::Result<Self> {
        let config: Self = toml::de::from_str(toml_str)?;
        Ok(config)
    }

    /// Explicit path if given, otherwise the first config file found in the
    /// home directory.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(Self::get_first_existing_path)
    }

    /// Load the located config file, or defaults when there is none.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn generate_config_paths() -> Vec<PathBuf> {
        match dirs::home_dir() {
            Some(home_dir) => vec![
                home_dir.join(".config/escscan.toml"),
                home_dir.join(".escscan.toml"),
            ],
            None => Vec::new(),
        }
    }

    pub fn get_first_existing_path() -> Option<PathBuf> {
        Self::generate_config_paths()
            .into_iter()
            .find(|path| path.exists())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            unterminated: self.unterminated.unwrap_or_default(),
        }
    }

    pub fn shell(&self) -> &str {
        self.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    pub fn size(&self) -> (u16, u16) {
        (
            self.cols.unwrap_or(DEFAULT_COLS),
            self.rows.unwrap_or(DEFAULT_ROWS),
        )
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("warn")
    }
}
