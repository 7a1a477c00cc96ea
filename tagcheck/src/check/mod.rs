//! Call-site checker
//!
//! Evaluates the tag relation at every call site collected by the
//! inference pass. Callee tags come from the unit's own table, then the
//! build cache, then the host symbol table.
//!
//! Sites whose target is unresolved or lies in the ignore scope are
//! skipped and counted, never reported: unresolvable is not the same as
//! legal, and flagging it would only produce false positives.

use std::collections::HashSet;

use crate::ast::SymbolId;
use crate::cache::TagCache;
use crate::config::IgnoreScope;
use crate::error::{Violation, ViolationKind};
use crate::host::SymbolSource;
use crate::infer::CallSite;
use crate::resolve::{ancestor_tag, TagTable};
use crate::tag::{Tag, TagRelation};

/// Per-unit call-site counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckStats {
    pub sites: usize,
    pub checked: usize,
    pub skipped_unresolved: usize,
    pub skipped_ignored: usize,
    pub cache_hits: usize,
    pub host_lookups: usize,
    /// Resolved targets no one had a tag for; treated as `Any`
    pub degraded: usize,
}

/// Checks call sites of one unit
pub struct CallChecker<'a> {
    relation: &'a TagRelation,
    ignore: &'a IgnoreScope,
    local: &'a TagTable,
    cache: &'a TagCache,
    symbols: &'a dyn SymbolSource,
    stats: CheckStats,
}

impl<'a> CallChecker<'a> {
    pub fn new(
        relation: &'a TagRelation,
        ignore: &'a IgnoreScope,
        local: &'a TagTable,
        cache: &'a TagCache,
        symbols: &'a dyn SymbolSource,
    ) -> Self {
        Self {
            relation,
            ignore,
            local,
            cache,
            symbols,
            stats: CheckStats::default(),
        }
    }

    /// Check every site, collecting all violations.
    pub fn check(&mut self, sites: &[CallSite<'_>]) -> Vec<Violation> {
        let mut violations = Vec::new();
        for site in sites {
            self.stats.sites += 1;
            let Some(target) = site.target else {
                self.stats.skipped_unresolved += 1;
                tracing::trace!(span = %site.span, "skipping unresolved target");
                continue;
            };
            if self.ignore.covers(target.owner()) {
                self.stats.skipped_ignored += 1;
                continue;
            }

            self.stats.checked += 1;
            let callee_tag = self.callee_tag(target);
            tracing::trace!(
                caller = %site.caller,
                %target,
                caller_tag = %site.caller_tag,
                %callee_tag,
                "checking call site"
            );
            if !self.relation.permits(site.caller_tag, callee_tag) {
                violations.push(Violation::new(
                    ViolationKind::IllegalCrossThreadCall {
                        caller: site.caller.clone(),
                        callee: target.clone(),
                        caller_tag: site.caller_tag,
                        callee_tag,
                        access: site.access,
                    },
                    site.span,
                ));
            }
        }
        violations
    }

    pub fn stats(&self) -> CheckStats {
        self.stats
    }

    fn callee_tag(&mut self, target: &SymbolId) -> Tag {
        if let Some(local) = self.local.get(target) {
            return local.tag;
        }
        if let Some(cached) = self.cache.get(target) {
            self.stats.cache_hits += 1;
            return cached.tag;
        }
        self.stats.host_lookups += 1;
        match self.symbols.declaration(target) {
            Some(decl) => decl.tag.unwrap_or_else(|| {
                let mut visiting = HashSet::new();
                visiting.insert(target.clone());
                decl.overrides
                    .iter()
                    .find_map(|parent| ancestor_tag(parent, self.ignore, self.cache, self.symbols, &mut visiting))
                    .unwrap_or(Tag::Any)
            }),
            None => {
                self.stats.degraded += 1;
                tracing::warn!(%target, "no tag known for resolved call target; assuming {}", Tag::Any);
                Tag::Any
            }
        }
    }
}
