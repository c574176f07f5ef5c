//! Driver settings read from `lumen.toml`.
//!
//! ```toml
//! [diagnostics]
//! root = "src"
//! color = false
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::path::{Path, PathBuf};

use lumen_common::DiagnosticConfig;
use serde::Deserialize;

/// File name looked up next to the program when `--config` is not given.
pub const CONFIG_FILE: &str = "lumen.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsSection {
    /// Directory diagnostic paths are shown relative to.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub color: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// An `EnvFilter` directive such as `warn` or `lumen_typeck=debug`.
    #[serde(default)]
    pub level: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        Self::from_str(&content).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn from_str(content: &str) -> Result<Config, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Load `explicit` when given, otherwise `lumen.toml` beside the
    /// program file if there is one.
    pub fn discover(explicit: Option<&Path>, program: &Path) -> Result<Config, String> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = program
            .parent()
            .map(|dir| dir.join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        if candidate.is_file() {
            Self::from_file(&candidate)
        } else {
            Ok(Config::default())
        }
    }

    /// The diagnostic settings after command-line overrides.
    pub fn diagnostic_config(&self, root: Option<PathBuf>, no_color: bool) -> DiagnosticConfig {
        let defaults = DiagnosticConfig::default();
        DiagnosticConfig {
            root: root.or_else(|| self.diagnostics.root.clone()),
            color: !no_color && self.diagnostics.color.unwrap_or(defaults.color),
        }
    }

    /// The log filter directive: `-v` wins, then the file, then `warn`.
    pub fn log_level(&self, verbose: bool) -> String {
        if verbose {
            return "debug".to_string();
        }
        self.log.level.clone().unwrap_or_else(|| "warn".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = Config::from_str(
            r#"
[diagnostics]
root = "src"
color = false

[log]
level = "info"
"#,
        )
        .unwrap();
        assert_eq!(config.diagnostics.root, Some(PathBuf::from("src")));
        assert_eq!(config.diagnostics.color, Some(false));
        assert_eq!(config.log.level.as_deref(), Some("info"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        let diagnostics = config.diagnostic_config(None, false);
        assert_eq!(diagnostics, DiagnosticConfig::default());
        assert_eq!(config.log_level(false), "warn");
    }

    #[test]
    fn flags_override_the_file() {
        let config = Config::from_str("[diagnostics]\nroot = \"src\"\ncolor = true\n[log]\nlevel = \"info\"\n").unwrap();
        let diagnostics = config.diagnostic_config(Some(PathBuf::from("lib")), true);
        assert_eq!(diagnostics.root, Some(PathBuf::from("lib")));
        assert!(!diagnostics.color);
        assert_eq!(config.log_level(true), "debug");
        assert_eq!(config.log_level(false), "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_str("[diagnostics]\ncolour = true\n").unwrap_err();
        assert!(err.starts_with("failed to parse config"), "{err}");
    }
}
