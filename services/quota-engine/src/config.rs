use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct QuotaEngineConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub plus_price_tcoins: u32,
    pub log_level: String,
}

impl Default for QuotaEngineConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8190,
            data_dir: PathBuf::from("data/quota"),
            plus_price_tcoins: 500,
            log_level: "info".to_string(),
        }
    }
}

impl QuotaEngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("THETAI_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("THETAI_PORT") {
            cfg.server_port = port.parse().context("THETAI_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("THETAI_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(price) = env::var("PLUS_PRICE_TCOINS") {
            cfg.plus_price_tcoins = price
                .parse()
                .context("PLUS_PRICE_TCOINS must be a positive integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_directory(&self.data_dir)?;

        if self.plus_price_tcoins == 0 {
            anyhow::bail!("PLUS_PRICE_TCOINS must be greater than zero");
        }

        Ok(())
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
