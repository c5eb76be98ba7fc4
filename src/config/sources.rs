//! Layered key/value sources
//!
//! Settings are resolved from a stack of layers. Later layers win:
//! env file < process environment < secret blob. Hardcoded defaults sit
//! below the stack and are applied by the field resolver.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, SettingsError};

/// Where a layer's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    EnvFile,
    ProcessEnv,
    Secret,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::EnvFile => write!(f, "env-file"),
            LayerKind::ProcessEnv => write!(f, "process-env"),
            LayerKind::Secret => write!(f, "secret"),
        }
    }
}

/// One source of raw string values
#[derive(Debug, Clone)]
pub struct SourceLayer {
    kind: LayerKind,
    label: String,
    values: BTreeMap<String, String>,
}

impl SourceLayer {
    pub fn new(
        kind: LayerKind,
        label: impl Into<String>,
        values: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Read a dotenv file.
    ///
    /// Returns `Ok(None)` when the file is absent or cannot be opened; a file
    /// that opens but contains a malformed line is an error.
    pub fn from_env_file(path: &Path) -> Result<Option<Self>> {
        let label = path.display().to_string();

        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %label, "Env file not found, skipping");
                return Ok(None);
            }
            Err(dotenvy::Error::Io(e)) => {
                tracing::warn!(path = %label, error = %e, "Env file unreadable, skipping");
                return Ok(None);
            }
            Err(e) => return Err(env_file_error(path, e)),
        };

        let mut values = BTreeMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| env_file_error(path, e))?;
            values.insert(key, value);
        }

        tracing::debug!(path = %label, keys = values.len(), "Loaded env file");
        Ok(Some(Self {
            kind: LayerKind::EnvFile,
            label,
            values,
        }))
    }

    /// Snapshot of process environment variables
    pub fn from_process_env(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self::new(LayerKind::ProcessEnv, "process environment", vars)
    }

    /// Flatten a decoded secret blob into a layer.
    ///
    /// Strings are taken as-is, numbers and booleans are stringified and
    /// `null` counts as absent. Nested arrays or objects are rejected.
    pub fn from_secret_blob(secret_name: &str, blob: Map<String, Value>) -> Result<Self> {
        let mut values = BTreeMap::new();

        for (key, value) in blob {
            let raw = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(SettingsError::malformed_secret(
                        secret_name,
                        format!("key {} holds a nested value", key),
                    ))
                }
            };
            values.insert(key, raw);
        }

        Ok(Self {
            kind: LayerKind::Secret,
            label: format!("secret {}", secret_name),
            values,
        })
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a key; empty values count as unset
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Describe an env file failure by position only.
///
/// dotenvy's parse errors carry the offending line, which may hold a secret.
fn env_file_error(path: &Path, err: dotenvy::Error) -> SettingsError {
    let label = path.display().to_string();

    let message = match err {
        dotenvy::Error::LineParse(line, column) => {
            let line_number = std::fs::read_to_string(path).ok().and_then(|contents| {
                let offset = contents.find(line.as_str())?;
                Some(contents[..offset].matches('\n').count() + 1)
            });
            match line_number {
                Some(n) => format!("malformed entry at line {}, column {}", n, column),
                None => format!("malformed entry at column {}", column),
            }
        }
        dotenvy::Error::Io(e) => format!("read failed: {}", e.kind()),
        _ => "invalid variable substitution".to_string(),
    };

    tracing::error!(path = %label, reason = %message, "Env file rejected");
    SettingsError::source_unavailable(label, message)
}

/// A value together with the layer that supplied it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub value: &'a str,
    pub kind: LayerKind,
}

/// Precedence-ordered stack of layers
#[derive(Debug, Clone, Default)]
pub struct LayeredSource {
    // lowest precedence first
    layers: Vec<SourceLayer>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a layer on top; it overrides everything already present
    pub fn push(&mut self, layer: SourceLayer) {
        tracing::debug!(
            layer = %layer.kind(),
            source = %layer.label(),
            keys = layer.len(),
            "Adding settings layer"
        );
        self.layers.push(layer);
    }

    /// Layers from highest to lowest precedence
    pub fn highest_first(&self) -> impl Iterator<Item = &SourceLayer> {
        self.layers.iter().rev()
    }

    /// Layers from lowest to highest precedence
    pub fn lowest_first(&self) -> impl Iterator<Item = &SourceLayer> {
        self.layers.iter()
    }

    pub fn resolve(&self, key: &str) -> Option<Resolved<'_>> {
        self.highest_first().find_map(|layer| {
            layer.get(key).map(|value| Resolved {
                value,
                kind: layer.kind(),
            })
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.resolve(key).map(|r| r.value)
    }
}
