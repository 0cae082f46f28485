use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::CellRadio;

pub const DEFAULT_ENDPOINT: &str = "https://us1.unwiredlabs.com/v2/process";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Radio state dump to scan
    pub input: PathBuf,
    /// CSV file receiving the extracted towers
    pub output: PathBuf,
    /// File holding the geolocation API token, read only when towers were found
    pub token_path: PathBuf,
    pub endpoint: String,
    pub radio: CellRadio,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/output.txt"),
            output: PathBuf::from("data/cell_towers.csv"),
            token_path: PathBuf::from("data/api_key.txt"),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            radio: CellRadio::Gsm,
            timeout_secs: 30,
        }
    }
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    let config = toml::from_str(&data).context("Failed to parse config")?;
    Ok(config)
}
