//! Checker session
//!
//! The host drives one [`ThreadChecker`] through a build:
//!
//! ```text
//! begin_build ─▶ check_unit (once per unit, after semantic analysis) ─▶ finish_build
//! ```
//!
//! Each unit goes through the resolver, the inference pass and the
//! call-site checker, and its findings are reported as one batch. Only
//! the tags of exported members outlive the unit, in the shared cache.

use crate::ast::CompilationUnit;
use crate::cache::{SharedTagCache, TagCache};
use crate::check::{CallChecker, CheckStats};
use crate::config::{CheckerConfig, IgnoreScope};
use crate::error::{Result, Severity, Violation};
use crate::host::SymbolSource;
use crate::infer::{InferencePass, NestedBody};
use crate::report::{report_violations, DiagnosticSink, TagDump};
use crate::resolve::{DeclResolver, TagTable};
use crate::tag::TagRelation;

/// Everything the checker found in one unit
#[derive(Debug, Default)]
pub struct UnitReport {
    /// Ordered by position
    pub violations: Vec<Violation>,
    /// Effective tag of every member in the unit
    pub tags: TagTable,
    pub lambdas: Vec<NestedBody>,
    pub stats: CheckStats,
}

impl UnitReport {
    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity() == Severity::Error)
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.severity() == Severity::Advisory)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

/// Thread-tag checker for one build
pub struct ThreadChecker {
    config: CheckerConfig,
    relation: TagRelation,
    ignore: IgnoreScope,
    cache: SharedTagCache,
    dump: Option<TagDump>,
}

impl ThreadChecker {
    /// Create a checker with its own cache.
    pub fn new(config: CheckerConfig) -> Result<Self> {
        Self::with_cache(config, TagCache::shared())
    }

    /// Create a checker over an injected cache, e.g. one shared with
    /// checkers running on other threads of a parallel build.
    pub fn with_cache(config: CheckerConfig, cache: SharedTagCache) -> Result<Self> {
        let relation = config.relation()?;
        let ignore = config.ignore_scope();
        let dump = config.dump_path.clone().map(TagDump::new);
        let checker = Self {
            config,
            relation,
            ignore,
            cache,
            dump,
        };
        // A previous run's dump must not survive into this one
        checker.reset_dump();
        Ok(checker)
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn relation(&self) -> &TagRelation {
        &self.relation
    }

    pub fn cache(&self) -> &SharedTagCache {
        &self.cache
    }

    /// Start a full build: clear the cache and truncate the dump.
    pub fn begin_build(&mut self) {
        self.cache.write().begin_build();
        self.reset_dump();
    }

    fn reset_dump(&self) {
        if let Some(dump) = &self.dump {
            if let Err(err) = dump.reset() {
                tracing::warn!(%err, path = %dump.path().display(), "cannot reset tag dump");
            }
        }
    }

    /// Check one compilation unit and report its findings to `sink`.
    ///
    /// Never fails: internal gaps degrade to the universal tag and are
    /// logged.
    #[tracing::instrument(skip_all, fields(unit = %unit.path))]
    pub fn check_unit(
        &mut self,
        unit: &CompilationUnit,
        symbols: &dyn SymbolSource,
        sink: &mut dyn DiagnosticSink,
    ) -> UnitReport {
        let resolution = {
            let cache = self.cache.read();
            DeclResolver::new(&self.relation, &self.ignore, &cache, symbols).resolve(unit)
        };

        let inference = InferencePass::new(&resolution.declared, &self.ignore)
            .report_unannotated(self.config.report_unannotated)
            .run(unit);

        {
            let mut cache = self.cache.write();
            for symbol in &inference.exported {
                if let Some(tag) = inference.tags.get(symbol) {
                    cache.insert(symbol.clone(), tag);
                }
            }
        }

        let (call_violations, stats) = {
            let cache = self.cache.read();
            let mut checker = CallChecker::new(&self.relation, &self.ignore, &inference.tags, &cache, symbols);
            let violations = checker.check(&inference.sites);
            (violations, checker.stats())
        };

        let mut violations = resolution.violations;
        violations.extend(inference.violations);
        violations.extend(call_violations);
        violations.sort_by_key(|v| (v.span.start, v.span.end, v.severity() == Severity::Advisory));

        tracing::debug!(
            members = inference.tags.len(),
            sites = stats.sites,
            violations = violations.len(),
            "unit checked"
        );

        report_violations(&unit.path, &violations, sink);

        if let Some(dump) = &self.dump {
            if let Err(err) = dump.append(&inference.tags) {
                tracing::warn!(%err, path = %dump.path().display(), "cannot write tag dump");
            }
        }

        UnitReport {
            violations,
            tags: inference.tags,
            lambdas: inference.lambdas,
            stats,
        }
    }

    /// End the build; the cache becomes read-only.
    pub fn finish_build(&mut self) {
        let mut cache = self.cache.write();
        cache.seal();
        tracing::debug!(symbols = cache.len(), "build finished");
    }
}
