//! Logging configuration
//!
//! Every field has a default, so a JSON file only needs to name what it
//! changes. `RUST_LOG` overrides [`LogConfig::level`] unless the builder is
//! told to ignore the environment.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Crates whose events describe route calculation
const ROUTING_TARGETS: [&str; 2] = ["concourse_routing", "concourse_core"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets without their own entry
    pub level: String,
    pub console: ConsoleConfig,
    /// JSONL file output, off when absent
    pub file: Option<FileConfig>,
    /// Which fields JSONL lines carry, on the console and in files
    pub jsonl: JsonlFields,
    /// Per-target levels; `off` silences a target
    pub targets: BTreeMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlFields::default(),
            targets: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Someone watching a terminal: pretty console, routing crates at debug
    pub fn interactive() -> Self {
        let mut config = Self {
            level: "info".to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: true,
                level: None,
            },
            ..Self::default()
        };
        for target in ROUTING_TARGETS {
            config = config.with_target(target, "debug");
        }
        config
    }

    /// A long-running host: daily JSONL files under `directory`, no console
    pub fn service(directory: impl Into<PathBuf>) -> Self {
        Self {
            console: ConsoleConfig {
                format: ConsoleFormat::Off,
                ..ConsoleConfig::default()
            },
            file: Some(FileConfig {
                keep: Some(14),
                ..FileConfig::daily(directory, "concourse")
            }),
            ..Self::default()
        }
    }

    /// Warnings and errors only, one compact line each
    pub fn quiet() -> Self {
        Self {
            level: "warn".to_string(),
            console: ConsoleConfig {
                format: ConsoleFormat::Compact,
                ansi: false,
                level: None,
            },
            ..Self::default()
        }
    }

    /// Every calculation step as JSONL, with the route span on each line
    pub fn route_trace() -> Self {
        let mut config = Self {
            level: "warn".to_string(),
            jsonl: JsonlFields {
                source_location: true,
                ..JsonlFields::default()
            },
            ..Self::default()
        };
        for target in ROUTING_TARGETS {
            config = config.with_target(target, "trace");
        }
        config
    }

    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    pub fn silence(self, target: impl Into<String>) -> Self {
        self.with_target(target, "off")
    }

    /// Filter directives, base level first
    pub fn directives(&self) -> Vec<String> {
        std::iter::once(self.level.clone())
            .chain(self.targets.iter().map(|(target, level)| format!("{target}={level}")))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    Off,
    /// Multi-line, human readable
    Pretty,
    /// One human readable line per event
    Compact,
    #[default]
    Jsonl,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
    /// Colors for the pretty and compact formats
    pub ansi: bool,
    /// Stricter level for the console only
    pub level: Option<String>,
}

impl ConsoleConfig {
    pub fn is_enabled(&self) -> bool {
        self.format != ConsoleFormat::Off
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File names start with this
    pub prefix: String,
    #[serde(default)]
    pub rotation: FileRotation,
    /// Rotated files to retain; all when absent
    #[serde(default)]
    pub keep: Option<usize>,
}

impl FileConfig {
    /// `<directory>/<prefix>.log`, truncated on start
    pub fn single(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            rotation: FileRotation::Never,
            keep: None,
        }
    }

    pub fn daily(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            rotation: FileRotation::Daily,
            ..Self::single(directory, prefix)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

/// Optional parts of a JSONL line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlFields {
    /// Event fields at the top level instead of under `fields`
    pub flatten: bool,
    /// `spans`: every enclosing span, outermost first
    pub span_list: bool,
    /// `span`: the innermost span
    pub current_span: bool,
    pub thread: bool,
    /// Source file and line
    pub source_location: bool,
}

impl Default for JsonlFields {
    fn default() -> Self {
        Self {
            flatten: true,
            span_list: true,
            current_span: true,
            thread: false,
            source_location: false,
        }
    }
}
