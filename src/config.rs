// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

fn default_page_range() -> String {
    "all".to_string()
}

fn default_face_value() -> f64 {
    5000.0
}

fn default_horizon() -> f64 {
    6.0
}

/// Run configuration, loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the source listing document lives.
    pub url: String,
    /// Which pages of the document feed the merge: "all", "2", or "1-3".
    #[serde(default = "default_page_range")]
    pub page_range: String,
    /// Column whose value uniquely identifies an instrument.
    pub index_column: String,
    /// Columns retained after the merge, in this order.
    pub keep_columns: Vec<String>,
    /// Par amount used to scale percent-of-par quotes into dollar figures.
    #[serde(default = "default_face_value")]
    pub face_value: f64,
    /// Candidates maturing further out than this many years are dropped.
    #[serde(default = "default_horizon")]
    pub maturity_horizon_years: f64,
    /// Base name for the output file; a timestamp is appended before the extension.
    pub csv_filename: String,
}

impl Config {
    /// Load and parse the JSON config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("loading config {}", path.display());
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(?cfg, "config loaded");
        Ok(cfg)
    }
}

/// Resolve the config file location from the two positional CLI arguments:
/// the config directory and the config file name. A missing trailing slash
/// on the directory is tolerated.
pub fn config_path_from_args(args: &[String]) -> Result<PathBuf> {
    if args.len() != 2 {
        bail!("incorrect arguments provided; expected <config dir> <config filename>");
    }
    let mut dir = args[0].clone();
    if !dir.ends_with('/') {
        dir.push('/');
    }
    Ok(PathBuf::from(format!("{}{}", dir, args[1])))
}
