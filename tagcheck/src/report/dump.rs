//! Resolved-tag dump for debugging
//!
//! One line per member, `<symbol> <Tag>`, sorted by symbol within each
//! unit. The file is truncated when a build starts and appended to after
//! every unit. Nothing reads it back.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::resolve::TagTable;

/// Plain-text dump file
#[derive(Debug, Clone)]
pub struct TagDump {
    path: PathBuf,
}

impl TagDump {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate (or create) the dump file.
    pub fn reset(&self) -> std::io::Result<()> {
        File::create(&self.path).map(|_| ())
    }

    /// Append one unit's table.
    pub fn append(&self, table: &TagTable) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(format_table(table).as_bytes())
    }
}

/// Render a table in dump format.
pub fn format_table(table: &TagTable) -> String {
    let mut out = String::new();
    for (symbol, resolved) in table.iter() {
        let _ = writeln!(out, "{symbol} {}", resolved.tag);
    }
    out
}
