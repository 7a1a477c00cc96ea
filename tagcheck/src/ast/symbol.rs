//! Qualified symbol names

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a declaration as assigned by the host symbol table.
///
/// Written `owner#member`, where `owner` is the qualified type name and
/// `member` the member name with its erased signature, e.g.
/// `app.ui.Panel#refresh(java.lang.String)`. A symbol without `#` names
/// a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualified name of the declaring type.
    pub fn owner(&self) -> &str {
        match self.0.split_once('#') {
            Some((owner, _)) => owner,
            None => &self.0,
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SymbolId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
