use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub fft: FftConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
}

#[derive(Debug, Deserialize)]
pub struct FftConfig {
    #[serde(default = "default_window")]
    pub window: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_range_db")]
    pub range_db: f64,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default)]
    pub max_ffts_per_file: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
        }
    }
}

impl Default for FftConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            range_db: default_range_db(),
            rotate: false,
            max_ffts_per_file: 0,
        }
    }
}

fn default_threads() -> usize { 1 }
fn default_window() -> String { "none".into() }
fn default_range_db() -> f64 { 100.0 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
