// src/config.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings read from an optional JSON file.
///
/// ```json
/// { "engine": { "creation_options": ["COMPRESS=DEFLATE"], "threads": 4 } }
/// ```
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Settings {
    #[serde(default)]
    pub engine: EngineOptions,
}

/// Options handed to the raster engine with every run.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// GDAL creation options for the output GeoTIFF (KEY=VALUE)
    #[serde(default)]
    pub creation_options: Vec<String>,
    /// Passed through as the `EXTRA` parameter
    #[serde(default)]
    pub extra: String,
    /// Worker threads for pixel evaluation
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Rows read and evaluated per strip
    #[serde(default = "default_strip_rows")]
    pub strip_rows: usize,
}

fn default_threads() -> usize {
    num_cpus::get()
}

fn default_strip_rows() -> usize {
    256
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            creation_options: Vec::new(),
            extra: String::new(),
            threads: default_threads(),
            strip_rows: default_strip_rows(),
        }
    }
}

impl EngineOptions {
    /// Creation options in the `|`-separated form of the `OPTIONS` parameter.
    pub fn creation_options_string(&self) -> String {
        self.creation_options.join("|")
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(settings)
    }

    /// Defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
