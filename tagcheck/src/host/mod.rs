//! Host symbol-table queries
//!
//! Declarations defined in the unit under check, or in units checked
//! earlier in the build, are known to the checker already. Anything else
//! (library classes, units the host compiles later) is looked up through
//! a [`SymbolSource`] provided by the host.

use std::collections::HashMap;

use crate::ast::SymbolId;
use crate::tag::Tag;

/// What the host knows about a declaration outside the checked units
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalDecl {
    /// Annotation on the member or, failing that, its declaring type
    pub tag: Option<Tag>,
    /// Members it overrides, nearest first
    pub overrides: Vec<SymbolId>,
}

impl ExternalDecl {
    pub fn tagged(tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            overrides: Vec::new(),
        }
    }

    pub fn untagged() -> Self {
        Self::default()
    }

    pub fn overriding(mut self, parent: impl Into<SymbolId>) -> Self {
        self.overrides.push(parent.into());
        self
    }
}

/// Symbol-resolution queries answered by the host front-end
pub trait SymbolSource {
    /// Look up a declaration the checker has not seen in any unit.
    fn declaration(&self, symbol: &SymbolId) -> Option<ExternalDecl>;
}

/// A host with no symbols beyond the checked units
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalSymbols;

impl SymbolSource for NoExternalSymbols {
    fn declaration(&self, _symbol: &SymbolId) -> Option<ExternalDecl> {
        None
    }
}

impl SymbolSource for HashMap<SymbolId, ExternalDecl> {
    fn declaration(&self, symbol: &SymbolId) -> Option<ExternalDecl> {
        self.get(symbol).cloned()
    }
}
