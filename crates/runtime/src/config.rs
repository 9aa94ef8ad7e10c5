// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/lenet.msgpack.gz"
//! framing = "gzip"          # optional; inferred from the extension
//! enable_profiling = true
//! ```

use model_ir::Framing;
use std::path::{Path, PathBuf};

/// Configuration for the inference runtime.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Path to the model file.
    pub model_path: PathBuf,
    /// Framing of the model file: `"raw"` or `"gzip"`. When absent it is
    /// picked from the file extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framing: Option<Framing>,
    /// Whether to collect per-node profiling metrics.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Creates a configuration for the given model file with default settings.
    pub fn for_model(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, super::RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            super::RuntimeError::ConfigError(format!(
                "cannot read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, super::RuntimeError> {
        toml::from_str(toml_str).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML parse error: {e}"))
        })
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, super::RuntimeError> {
        toml::to_string_pretty(self).map_err(|e| {
            super::RuntimeError::ConfigError(format!("TOML serialise error: {e}"))
        })
    }

    /// Resolves the framing: the explicit setting, else the file extension.
    pub fn resolve_framing(&self) -> Framing {
        self.framing
            .unwrap_or_else(|| Framing::from_path(&self.model_path))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("./models/model.msgpack"),
            framing: None,
            enable_profiling: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = RuntimeConfig::default();
        assert_eq!(c.framing, None);
        assert_eq!(c.resolve_framing(), Framing::Raw);
        assert!(c.enable_profiling);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
model_path = "/tmp/model.bin"
framing = "gzip"
enable_profiling = false
"#;
        let c = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(c.model_path, PathBuf::from("/tmp/model.bin"));
        assert_eq!(c.framing, Some(Framing::Gzip));
        assert_eq!(c.resolve_framing(), Framing::Gzip);
        assert!(!c.enable_profiling);
    }

    #[test]
    fn test_from_toml_minimal() {
        let c = RuntimeConfig::from_toml(r#"model_path = "net.msgpack.gz""#).unwrap();
        assert_eq!(c.framing, None);
        assert_eq!(c.resolve_framing(), Framing::Gzip);
        assert!(c.enable_profiling);
    }

    #[test]
    fn test_explicit_framing_wins() {
        let c = RuntimeConfig {
            framing: Some(Framing::Raw),
            ..RuntimeConfig::for_model("weights.gz")
        };
        assert_eq!(c.resolve_framing(), Framing::Raw);
    }

    #[test]
    fn test_unknown_framing_rejected() {
        let err = RuntimeConfig::from_toml(
            r#"
model_path = "m"
framing = "zstd"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::RuntimeError::ConfigError(_)));
    }

    #[test]
    fn test_missing_model_path_rejected() {
        assert!(RuntimeConfig::from_toml("enable_profiling = true").is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RuntimeConfig {
            framing: Some(Framing::Gzip),
            ..RuntimeConfig::for_model("/models/lenet.bin")
        };
        let toml = c.to_toml().unwrap();
        assert!(toml.contains("framing = \"gzip\""));
        let back = RuntimeConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("runtime-config-{}.toml", std::process::id()));
        std::fs::write(&path, "model_path = \"a.msgpack\"\n").unwrap();
        let c = RuntimeConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(c.model_path, PathBuf::from("a.msgpack"));

        assert!(RuntimeConfig::from_file(Path::new("/nonexistent/config.toml")).is_err());
    }
}
