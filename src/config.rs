use crate::models::types::Limits;
use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_tick_millis() -> u64 {
    6000
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding catalogs and per-room rule documents
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Length of one world tick in milliseconds
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Fixed RNG seed; unset means seed from OS entropy
    #[serde(default)]
    pub rng_seed: Option<u64>,

    #[serde(default)]
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            tick_millis: default_tick_millis(),
            rng_seed: None,
            limits: Limits::default(),
        }
    }
}

impl Config {
    #[allow(unused)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env");
        let mut cfg = Self::default();

        if let Ok(dir) = std::env::var("CONTENT_DIR") {
            cfg.content_dir = PathBuf::from(dir);
        }
        if let Ok(ms) = std::env::var("TICK_MILLIS") {
            cfg.tick_millis = ms.parse()?;
        }
        if let Ok(seed) = std::env::var("RNG_SEED") {
            cfg.rng_seed = Some(seed.parse()?);
        }

        Ok(cfg)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.tick(), Duration::from_secs(6));
        assert_eq!(cfg.content_dir, PathBuf::from("content"));
        assert!(cfg.rng_seed.is_none());
    }

    #[test]
    fn t_toml_partial() {
        let cfg: Config = toml::from_str("tick_millis = 250\nrng_seed = 7\n").unwrap();
        assert_eq!(cfg.tick(), Duration::from_millis(250));
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.limits, Limits::default());
    }
}
