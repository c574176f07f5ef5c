//! Diagnostic presentation settings shared by the checker and the driver.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How diagnostics locate and render their source positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticConfig {
    /// Directory that origin paths are shown relative to. `None` keeps
    /// paths exactly as the module origins record them.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Whether rendered reports may use ANSI colors.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            root: None,
            color: default_color(),
        }
    }
}

impl DiagnosticConfig {
    /// Display form of an origin path: relative to `root` when it lies
    /// underneath it, unchanged otherwise.
    pub fn relative_path(&self, path: &str) -> String {
        let Some(root) = &self.root else {
            return path.to_string();
        };
        match Path::new(path).strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
            _ => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_without_root() {
        let config = DiagnosticConfig::default();
        assert_eq!(config.relative_path("/src/app/main.lm"), "/src/app/main.lm");
        assert!(config.color);
    }

    #[test]
    fn relative_path_strips_root() {
        let config = DiagnosticConfig {
            root: Some(PathBuf::from("/src")),
            color: false,
        };
        assert_eq!(config.relative_path("/src/app/main.lm"), "app/main.lm");
        assert_eq!(config.relative_path("/other/main.lm"), "/other/main.lm");
    }
}
