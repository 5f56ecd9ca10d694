//! Configuration and loader factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examforge_core::model::DEFAULT_DURATION_SECS;
use examforge_core::traits::QuestionSetLoader;

use crate::filesystem::FileSystemLoader;
use crate::http::HttpLoader;

/// Where test resources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoaderConfig {
    Filesystem {
        #[serde(default = "default_tests_dir")]
        tests_dir: PathBuf,
    },
    Http {
        base_url: String,
    },
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig::Filesystem {
            tests_dir: default_tests_dir(),
        }
    }
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("./tests")
}

/// Top-level examforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamforgeConfig {
    /// Source of test resources.
    #[serde(default)]
    pub source: LoaderConfig,
    /// Duration for resources that do not state one.
    #[serde(default = "default_duration")]
    pub default_duration_secs: u64,
    /// Countdown cadence in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Directory for JSON result reports. No report is written when unset.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_duration() -> u64 {
    DEFAULT_DURATION_SECS
}
fn default_tick_interval() -> u64 {
    1000
}

impl Default for ExamforgeConfig {
    fn default() -> Self {
        Self {
            source: LoaderConfig::default(),
            default_duration_secs: default_duration(),
            tick_interval_ms: default_tick_interval(),
            report_dir: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_loader_config(config: &LoaderConfig) -> LoaderConfig {
    match config {
        LoaderConfig::Filesystem { tests_dir } => LoaderConfig::Filesystem {
            tests_dir: PathBuf::from(resolve_env_vars(&tests_dir.to_string_lossy())),
        },
        LoaderConfig::Http { base_url } => LoaderConfig::Http {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examforge.toml` in the current directory
/// 2. `~/.config/examforge/config.toml`
///
/// Environment variable overrides: `EXAMFORGE_TESTS_DIR`, `EXAMFORGE_BASE_URL`
/// (the base URL wins if both are set).
pub fn load_config() -> Result<ExamforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examforge.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamforgeConfig::default(),
    };

    if let Ok(dir) = std::env::var("EXAMFORGE_TESTS_DIR") {
        config.source = LoaderConfig::Filesystem {
            tests_dir: PathBuf::from(dir),
        };
    }
    if let Ok(url) = std::env::var("EXAMFORGE_BASE_URL") {
        config.source = LoaderConfig::Http { base_url: url };
    }

    config.source = resolve_loader_config(&config.source);
    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config(content: &str) -> Result<ExamforgeConfig> {
    let config: ExamforgeConfig = toml::from_str(content)?;
    anyhow::ensure!(
        config.tick_interval_ms > 0,
        "tick_interval_ms must be greater than zero"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examforge"))
}

/// Create a loader instance from its configuration.
pub fn create_loader(
    config: &LoaderConfig,
    default_duration_secs: u64,
) -> Result<Box<dyn QuestionSetLoader>> {
    match config {
        LoaderConfig::Filesystem { tests_dir } => Ok(Box::new(FileSystemLoader::new(
            tests_dir.clone(),
            default_duration_secs,
        ))),
        LoaderConfig::Http { base_url } => {
            Ok(Box::new(HttpLoader::new(base_url, default_duration_secs)?))
        }
    }
}
