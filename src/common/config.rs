use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::packer::{PackOptions, Size};

pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".panegrid")
}

pub fn chunk_store_dir() -> PathBuf {
    data_dir().join("chunks")
}

pub fn config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("panegrid")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WindowSettings {
    /// Chebyshev radius of chunks kept loaded around the viewport origin.
    #[serde(default = "default_render_distance")]
    pub render_distance: u64,
    /// How long to coalesce rapid pane mutations before a write-through.
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
}

fn default_render_distance() -> u64 {
    2
}

fn default_persist_debounce_ms() -> u64 {
    100
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            render_distance: default_render_distance(),
            persist_debounce_ms: default_persist_debounce_ms(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ChunkSettings {
    #[serde(default = "default_chunk_width")]
    pub width: u32,
    #[serde(default = "default_chunk_height")]
    pub height: u32,
}

fn default_chunk_width() -> u32 {
    1920
}

fn default_chunk_height() -> u32 {
    1080
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self { width: default_chunk_width(), height: default_chunk_height() }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub chunk: ChunkSettings,
    #[serde(default)]
    pub packing: PackOptions,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads the config file if present, falling back to defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.is_file() { Self::read(path) } else { Ok(Config::default()) }
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str::<Config>(buf)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Returns a list of issues found in the configuration.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.chunk.width == 0 || self.chunk.height == 0 {
            issues.push("chunk dimensions must be positive".to_string());
        }
        if self.packing.padding < 0.0 {
            issues.push("packing.padding must not be negative".to_string());
        }
        if self.packing.margin < 0.0 {
            issues.push("packing.margin must not be negative".to_string());
        }
        let Size { width, height } = self.packing.minimum_item_size;
        if width <= 0.0 || height <= 0.0 {
            issues.push("packing.minimum_item_size must be positive".to_string());
        }
        let usable = f64::from(self.chunk.width) - 2.0 * self.packing.margin;
        if self.chunk.width > 0 && self.packing.margin > 0.0 && usable <= 0.0 {
            issues.push("packing.margin leaves no usable chunk space".to_string());
        }
        issues
    }
}
