use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$PR_MONITOR_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/pr-monitor/config.toml`
/// 4. `~/.config/pr-monitor/config.toml`
///
/// With none of these present the built-in defaults are used, which still
/// need an owner and repo before `validate` passes.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_owned()),
        None => find_config(),
    };
    let Some(path) = path else {
        tracing::debug!("config: no config file found, using defaults");
        return Ok(AppConfig::default());
    };
    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| format!("parsing TOML from {}", path.display()))?;
    tracing::debug!("config: loaded {}", path.display());
    Ok(config)
}

/// Directory holding the store files: `[storage] data_dir` with a leading
/// `~` expanded, else `~/.local/share/pr-monitor`.
pub fn data_dir(config: &AppConfig) -> Result<PathBuf> {
    if let Some(ref dir) = config.storage.data_dir {
        return Ok(expand_tilde(dir));
    }
    let home = home_dir().context("cannot locate data directory: $HOME is not set")?;
    Ok(home.join(".local/share/pr-monitor"))
}

fn find_config() -> Option<PathBuf> {
    // $PR_MONITOR_CONFIG
    if let Ok(path) = std::env::var("PR_MONITOR_CONFIG") {
        let p = PathBuf::from(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/pr-monitor/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("pr-monitor/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/pr-monitor/config.toml
    if let Some(home) = home_dir() {
        let p = home.join(".config/pr-monitor/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
