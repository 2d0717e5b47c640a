//! Configuration schema and defaults for churnboard.
//!
//! Sections: `[backend]`, `[display]`, `[logging]`. Every field has a
//! built-in default, so a config file only needs the keys it changes.
use serde::{Deserialize, Serialize};

use crate::widgets::canvas::DEFAULT_BAR_WIDTH;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration, mapped from `~/.churnboard/config.toml` and
/// `.churnboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend: BackendConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the analytics backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; endpoint paths are appended to it.
    pub url: String,
    /// Per-request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Output format for dashboard commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    /// Lenient parse; anything unrecognised falls back to a table.
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Terminal rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Default output format when `--format` is not given.
    pub format: OutputFormat,
    /// ANSI colours in table output.
    pub color: bool,
    /// Width of the longest bar in columns.
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            color: true,
            bar_width: DEFAULT_BAR_WIDTH,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Refresh log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether each refresh is appended to the log.
    pub enabled: bool,
    /// Path to the JSONL refresh log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.churnboard/refresh-log.jsonl".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Annotated default config file written by `churnboard config init`.
    pub fn default_toml() -> String {
        r#"# churnboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CHURNBOARD_*)
#   2. Project config (.churnboard.toml in current directory)
#   3. User global config (~/.churnboard/config.toml)
#   4. Built-in defaults

[backend]
url = "http://localhost:8000"
timeout_ms = 0          # 0 = no timeout

[display]
format = "table"        # table | json
color = true
bar_width = 30

[logging]
enabled = true
path = "~/.churnboard/refresh-log.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_produces_defaults() {
        let config: DashboardConfig = toml::from_str("").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.backend.timeout_ms, 0);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
[backend]
url = "http://analytics.internal:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "http://analytics.internal:9000");
        assert_eq!(config.backend.timeout_ms, 0);
        assert!(config.display.color);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: DashboardConfig = toml::from_str(&DashboardConfig::default_toml()).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Table);
    }

    #[test]
    fn output_format_display() {
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
