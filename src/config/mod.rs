//! Configuration system for churnboard.
//!
//! Provides a layered configuration hierarchy:
//!
//! 1. **Built-in defaults**: [`schema::DashboardConfig::default()`]
//! 2. **User global config**: `~/.churnboard/config.toml`
//! 3. **Project local config**: `.churnboard.toml` in the current directory
//! 4. **Environment variables**: `CHURNBOARD_*` overrides (highest precedence)
//!
//! Layers are merged key by key: a file that only sets `backend.url` keeps
//! every other value from the layer below.
//!
//! # Usage
//!
//! ```rust,ignore
//! use churnboard::config;
//!
//! let cfg = config::load();
//! let client = churnboard::api::BackendClient::from_config(&cfg.backend);
//! ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DashboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. Unreadable or
/// malformed files are skipped so a broken config never blocks the dashboard.
pub fn load() -> DashboardConfig {
    let mut config = load_from(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files, in order, over the built-in defaults.
///
/// Missing paths and malformed files are ignored.
pub fn load_from(paths: &[Option<PathBuf>]) -> DashboardConfig {
    let Ok(mut merged) = toml::Value::try_from(DashboardConfig::default()) else {
        return DashboardConfig::default();
    };

    for path in paths.iter().flatten() {
        if let Some(layer) = read_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_default()
}

/// Parse a TOML file into a raw value tree, if it exists and is valid.
fn read_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject files whose values have the wrong types for the schema.
    value.clone().try_into::<DashboardConfig>().ok()?;
    Some(value)
}

/// Recursively overlay `overlay` onto `base`. Tables merge; everything else
/// replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.churnboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".churnboard").join("config.toml"))
}

/// Path to the project local config: `.churnboard.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".churnboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CHURNBOARD_BACKEND_URL`: backend base URL
/// - `CHURNBOARD_TIMEOUT_MS`: request timeout (`0` = none)
/// - `CHURNBOARD_COLOR`: coloured output (`1`/`true`/`yes`/`on`)
/// - `CHURNBOARD_LOG`: refresh log enabled
fn apply_env_overrides(config: &mut DashboardConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
fn apply_overrides_from(config: &mut DashboardConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CHURNBOARD_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.url = val;
    }
    if let Some(val) = lookup("CHURNBOARD_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Some(val) = lookup("CHURNBOARD_COLOR") {
        config.display.color = is_truthy(&val);
    }
    if let Some(val) = lookup("CHURNBOARD_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.churnboard/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, DashboardConfig::default_toml()).context("failed to write config file")
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `backend.url`. The key must exist in the schema
/// and the value must parse as the key's type.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_in(&path, key, value)
}

fn set_config_value_in(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut root =
        toml::Value::try_from(DashboardConfig::default()).context("failed to serialize defaults")?;

    if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        let current: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_values(&mut root, current);
    }

    set_toml_value(&mut root, key, value)?;

    root.clone()
        .try_into::<DashboardConfig>()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The existing value's type decides how `raw_value` is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("'{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
