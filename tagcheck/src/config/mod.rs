//! Checker configuration
//!
//! Built once at host startup, either from the compiler plug-in argument
//! list or from a JSON document.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::tag::{Tag, TagRelation};
use crate::util::is_under_prefix;

/// Conventional file name for the resolved-tag dump
pub const DEFAULT_DUMP_FILE: &str = "found-tags.txt";

/// Checker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Package prefixes excluded from resolution and checking
    pub ignore_packages: Vec<String>,
    /// Directed bridging edges layered on the base relation
    pub bridges: Vec<(Tag, Tag)>,
    /// Where to write the resolved-tag dump; `None` disables it
    pub dump_path: Option<PathBuf>,
    /// Emit advisories for members that defaulted to `Any`
    pub report_unannotated: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            ignore_packages: Vec::new(),
            bridges: TagRelation::DEFAULT_BRIDGES.to_vec(),
            dump_path: None,
            report_unannotated: true,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the plug-in argument list.
    ///
    /// Plain arguments are package prefixes to ignore. Recognised options:
    /// `--dump` / `--dump=<path>`, `--bridge=<From>:<To>`, `--no-unannotated`.
    pub fn from_plugin_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut config = Self::default();
        for arg in args {
            let arg = arg.as_ref().trim();
            if arg.is_empty() {
                continue;
            }
            if arg == "--dump" {
                config.dump_path = Some(PathBuf::from(DEFAULT_DUMP_FILE));
            } else if let Some(path) = arg.strip_prefix("--dump=") {
                if path.is_empty() {
                    return Err(CheckError::config("`--dump=` needs a path"));
                }
                config.dump_path = Some(PathBuf::from(path));
            } else if let Some(edge) = arg.strip_prefix("--bridge=") {
                let (from, to) = edge
                    .split_once(':')
                    .ok_or_else(|| CheckError::config(format!("bridge `{edge}` must be written From:To")))?;
                config.bridges.push((from.parse()?, to.parse()?));
            } else if arg == "--no-unannotated" {
                config.report_unannotated = false;
            } else if arg.starts_with("--") {
                return Err(CheckError::config(format!("unknown option `{arg}`")));
            } else {
                config.ignore_packages.push(arg.to_string());
            }
        }
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add an ignored package prefix
    pub fn ignore_package(mut self, prefix: impl Into<String>) -> Self {
        self.ignore_packages.push(prefix.into());
        self
    }

    /// Add a directed bridging edge
    pub fn bridge(mut self, from: Tag, to: Tag) -> Self {
        self.bridges.push((from, to));
        self
    }

    /// Enable the tag dump
    pub fn dump_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = Some(path.into());
        self
    }

    /// Toggle unannotated-default advisories
    pub fn report_unannotated(mut self, enabled: bool) -> Self {
        self.report_unannotated = enabled;
        self
    }

    /// Build the legality relation described by `bridges`.
    pub fn relation(&self) -> Result<TagRelation> {
        TagRelation::with_bridges(&self.bridges)
    }

    pub fn ignore_scope(&self) -> IgnoreScope {
        IgnoreScope::new(self.ignore_packages.iter().cloned())
    }
}

/// Package prefixes whose declarations are neither resolved nor checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreScope {
    prefixes: Vec<String>,
}

impl IgnoreScope {
    pub fn new(prefixes: impl IntoIterator<Item = String>) -> Self {
        let mut prefixes: Vec<String> = prefixes
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        prefixes.sort();
        prefixes.dedup();
        Self { prefixes }
    }

    /// Whether code owned by the qualified type `owner` is ignored.
    pub fn covers(&self, owner: &str) -> bool {
        self.prefixes.iter().any(|p| is_under_prefix(p, owner))
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
