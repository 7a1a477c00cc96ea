//! Declaration resolver
//!
//! Computes the *declared* tag of every member in a unit: the tag that
//! follows from annotations alone, without looking at where the member
//! is nested. Priority:
//!
//! 1. an annotation on the member itself,
//! 2. the nearest tagged member it overrides,
//! 3. an annotation on the declaring type.
//!
//! Members left without a declared tag are finished by the inference
//! pass (`crate::infer`).
//!
//! A member must honour every tagged member it overrides. Each one whose
//! tag cannot call the member's effective tag is reported as
//! `ConflictingOverride`; an explicit annotation still wins for checking
//! purposes, and `ignore_parent` waives the obligation.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::ast::{CompilationUnit, Expr, Member, SymbolId, TypeDecl};
use crate::cache::TagCache;
use crate::config::IgnoreScope;
use crate::error::{Violation, ViolationKind};
use crate::host::SymbolSource;
use crate::tag::{Tag, TagRelation};

/// Where an effective tag came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOrigin {
    /// Annotation on the declaration itself
    Explicit,
    /// Taken from an overridden member
    Inherited,
    /// Annotation on the declaring type
    TypeLevel,
    /// Functional-interface tag of a lambda or method reference
    Context,
    /// Taken from the enclosing declaration of a nested body
    Enclosing,
    /// Nothing applied; universal tag assumed
    Default,
}

impl TagOrigin {
    /// Whether the tag is backed by an annotation somewhere, and so can be
    /// passed on to overriding members.
    pub fn is_declared(self) -> bool {
        matches!(self, TagOrigin::Explicit | TagOrigin::Inherited | TagOrigin::TypeLevel)
    }
}

/// An effective tag together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedTag {
    pub tag: Tag,
    pub origin: TagOrigin,
}

impl ResolvedTag {
    pub fn new(tag: Tag, origin: TagOrigin) -> Self {
        Self { tag, origin }
    }
}

/// Member symbol → tag, ordered by symbol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagTable {
    entries: BTreeMap<SymbolId, ResolvedTag>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &SymbolId) -> Option<ResolvedTag> {
        self.entries.get(symbol).copied()
    }

    /// Record a tag. The first tag recorded for a symbol is kept.
    pub fn insert(&mut self, symbol: SymbolId, tag: ResolvedTag) -> bool {
        match self.entries.entry(symbol) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(tag);
                true
            }
        }
    }

    pub fn contains(&self, symbol: &SymbolId) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SymbolId, &ResolvedTag)> {
        self.entries.iter()
    }
}

/// Output of the resolver for one unit
#[derive(Debug, Default)]
pub struct Resolution {
    /// Members whose tag follows from annotations
    pub declared: TagTable,
    pub violations: Vec<Violation>,
}

struct MemberEntry<'a> {
    member: &'a Member,
    type_tag: Option<Tag>,
}

/// Resolves declared tags for one compilation unit
pub struct DeclResolver<'a> {
    relation: &'a TagRelation,
    ignore: &'a IgnoreScope,
    cache: &'a TagCache,
    symbols: &'a dyn SymbolSource,
    members: HashMap<&'a SymbolId, MemberEntry<'a>>,
    order: Vec<&'a SymbolId>,
    memo: HashMap<&'a SymbolId, Option<ResolvedTag>>,
    violations: Vec<Violation>,
}

impl<'a> DeclResolver<'a> {
    pub fn new(
        relation: &'a TagRelation,
        ignore: &'a IgnoreScope,
        cache: &'a TagCache,
        symbols: &'a dyn SymbolSource,
    ) -> Self {
        Self {
            relation,
            ignore,
            cache,
            symbols,
            members: HashMap::new(),
            order: Vec::new(),
            memo: HashMap::new(),
            violations: Vec::new(),
        }
    }

    /// Resolve every member of `unit`, including members of anonymous
    /// classes nested in bodies.
    pub fn resolve(mut self, unit: &'a CompilationUnit) -> Resolution {
        for ty in &unit.types {
            self.collect_type(ty);
        }

        let order = std::mem::take(&mut self.order);
        let mut declared = TagTable::new();
        for symbol in order {
            let mut visiting = HashSet::new();
            if let Some(tag) = self.declared(symbol, &mut visiting) {
                declared.insert(symbol.clone(), tag);
            }
        }

        tracing::debug!(
            unit = %unit.path,
            members = self.members.len(),
            declared = declared.len(),
            "resolved declared tags"
        );

        Resolution {
            declared,
            violations: self.violations,
        }
    }

    fn collect_type(&mut self, ty: &'a TypeDecl) {
        if self.ignore.covers(&ty.name) {
            tracing::trace!(ty = %ty.name, "skipping ignored type");
            return;
        }
        let type_tag = ty.tag.map(|a| a.tag);
        for member in &ty.members {
            if self.members.contains_key(&member.symbol) {
                tracing::debug!(symbol = %member.symbol, "duplicate member symbol; keeping the first");
            } else {
                self.members.insert(&member.symbol, MemberEntry { member, type_tag });
                self.order.push(&member.symbol);
            }
            for expr in &member.body {
                self.collect_expr(expr);
            }
        }
    }

    fn collect_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::AnonymousClass(ty) => self.collect_type(ty),
            Expr::Lambda { body, .. } | Expr::Block(body) => {
                for e in body {
                    self.collect_expr(e);
                }
            }
            Expr::Call { .. } | Expr::New { .. } | Expr::FieldAccess { .. } | Expr::MethodRef { .. } => {}
        }
    }

    /// Declared tag of a member of this unit, memoized.
    fn declared(&mut self, symbol: &'a SymbolId, visiting: &mut HashSet<SymbolId>) -> Option<ResolvedTag> {
        if let Some(done) = self.memo.get(symbol) {
            return *done;
        }
        let (member, type_tag) = match self.members.get(symbol) {
            Some(entry) => (entry.member, entry.type_tag),
            None => return None,
        };
        if !visiting.insert(symbol.clone()) {
            tracing::warn!(%symbol, "override chain loops back on itself");
            return None;
        }

        let parents = self.tagged_parents(member, visiting);
        let result = match (member.tag, parents.first()) {
            (Some(annotation), _) => Some(ResolvedTag::new(annotation.tag, TagOrigin::Explicit)),
            (None, Some(&(tag, _))) => Some(ResolvedTag::new(tag, TagOrigin::Inherited)),
            (None, None) => type_tag.map(|tag| ResolvedTag::new(tag, TagOrigin::TypeLevel)),
        };

        let ignore_parent = member.tag.is_some_and(|a| a.ignore_parent);
        if let (Some(effective), false) = (result, ignore_parent) {
            for (inherited, overridden) in parents {
                if !self.relation.override_compatible(inherited, effective.tag) {
                    self.violations.push(Violation::new(
                        ViolationKind::ConflictingOverride {
                            member: symbol.clone(),
                            overridden,
                            declared: effective.tag,
                            inherited,
                        },
                        member.span,
                    ));
                }
            }
        }

        visiting.remove(symbol);
        self.memo.insert(symbol, result);
        result
    }

    /// Nearest tagged ancestor along each overridden member, in
    /// declaration order. The first entry decides an untagged member's tag;
    /// every entry is an obligation the member must honour.
    fn tagged_parents(&mut self, member: &'a Member, visiting: &mut HashSet<SymbolId>) -> Vec<(Tag, SymbolId)> {
        let mut parents = Vec::new();
        for parent in &member.overrides {
            let tag = if self.members.contains_key(parent) {
                self.declared(parent, visiting).map(|t| t.tag)
            } else {
                ancestor_tag(parent, self.ignore, self.cache, self.symbols, visiting)
            };
            if let Some(tag) = tag {
                parents.push((tag, parent.clone()));
            }
        }
        parents
    }
}

/// Declared tag of a member defined outside the unit under check.
///
/// Consults the build cache first, then the host. Members under the
/// ignore scope contribute nothing.
pub(crate) fn ancestor_tag(
    symbol: &SymbolId,
    ignore: &IgnoreScope,
    cache: &TagCache,
    symbols: &dyn SymbolSource,
    visiting: &mut HashSet<SymbolId>,
) -> Option<Tag> {
    if ignore.covers(symbol.owner()) {
        return None;
    }
    if let Some(cached) = cache.get(symbol) {
        if cached.origin.is_declared() {
            return Some(cached.tag);
        }
    }
    let decl = symbols.declaration(symbol)?;
    if decl.tag.is_some() {
        return decl.tag;
    }
    if !visiting.insert(symbol.clone()) {
        tracing::warn!(%symbol, "external override chain loops back on itself");
        return None;
    }
    let found = decl
        .overrides
        .iter()
        .find_map(|parent| ancestor_tag(parent, ignore, cache, symbols, visiting));
    visiting.remove(symbol);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::host::{ExternalDecl, NoExternalSymbols};

    fn resolve_with(unit: &CompilationUnit, cache: &TagCache, symbols: &dyn SymbolSource) -> Resolution {
        let relation = TagRelation::default();
        let ignore = IgnoreScope::default();
        DeclResolver::new(&relation, &ignore, cache, symbols).resolve(unit)
    }

    fn resolve(unit: &CompilationUnit) -> Resolution {
        resolve_with(unit, &TagCache::new(), &NoExternalSymbols)
    }

    fn sp(start: usize) -> Span {
        Span::new(start, start + 5)
    }

    fn tag_of(res: &Resolution, sym: &str) -> Option<ResolvedTag> {
        res.declared.get(&SymbolId::from(sym))
    }

    #[test]
    fn test_explicit_tag_used_as_is() {
        let unit = CompilationUnit::new("A.java", "app").with_type(
            TypeDecl::new("app.A", sp(0)).with_member(Member::method("app.A#load()", sp(1)).tagged(Tag::Worker)),
        );
        let res = resolve(&unit);
        assert_eq!(tag_of(&res, "app.A#load()"), Some(ResolvedTag::new(Tag::Worker, TagOrigin::Explicit)));
        assert!(res.violations.is_empty());
    }

    #[test]
    fn test_inherits_from_overridden_member_in_same_unit() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Base", sp(0)).with_member(Member::method("app.Base#run()", sp(1)).tagged(Tag::Worker)),
            )
            .with_type(
                TypeDecl::new("app.Impl", sp(10))
                    .with_member(Member::method("app.Impl#run()", sp(11)).overriding("app.Base#run()")),
            );
        let res = resolve(&unit);
        assert_eq!(tag_of(&res, "app.Impl#run()"), Some(ResolvedTag::new(Tag::Worker, TagOrigin::Inherited)));
    }

    #[test]
    fn test_inherits_through_untagged_intermediate() {
        // Impl -> Mid (untagged) -> Base (Swing), declared in reverse order
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Impl", sp(0))
                    .with_member(Member::method("app.Impl#paint()", sp(1)).overriding("app.Mid#paint()")),
            )
            .with_type(
                TypeDecl::new("app.Mid", sp(10))
                    .with_member(Member::method("app.Mid#paint()", sp(11)).overriding("app.Base#paint()")),
            )
            .with_type(
                TypeDecl::new("app.Base", sp(20))
                    .with_member(Member::method("app.Base#paint()", sp(21)).tagged(Tag::Swing)),
            );
        let res = resolve(&unit);
        assert_eq!(tag_of(&res, "app.Impl#paint()").map(|t| t.tag), Some(Tag::Swing));
        assert_eq!(tag_of(&res, "app.Mid#paint()").map(|t| t.tag), Some(Tag::Swing));
    }

    #[test]
    fn test_inherited_beats_type_level() {
        let unit = CompilationUnit::new("A.java", "app").with_type(
            TypeDecl::new("app.Panel", sp(0))
                .tagged(Tag::FxPlatform)
                .with_member(Member::method("app.Panel#call()", sp(1)).overriding("lib.Task#call()"))
                .with_member(Member::method("app.Panel#show()", sp(2))),
        );
        let mut symbols = HashMap::new();
        symbols.insert(SymbolId::from("lib.Task#call()"), ExternalDecl::tagged(Tag::Worker));
        let res = resolve_with(&unit, &TagCache::new(), &symbols);
        assert_eq!(tag_of(&res, "app.Panel#call()"), Some(ResolvedTag::new(Tag::Worker, TagOrigin::Inherited)));
        assert_eq!(tag_of(&res, "app.Panel#show()"), Some(ResolvedTag::new(Tag::FxPlatform, TagOrigin::TypeLevel)));
    }

    #[test]
    fn test_conflicting_override_reported_once_at_member() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Base", sp(0)).with_member(Member::method("app.Base#run()", sp(1)).tagged(Tag::Worker)),
            )
            .with_type(
                TypeDecl::new("app.Impl", sp(10)).with_member(
                    Member::method("app.Impl#run()", Span::new(40, 60))
                        .tagged(Tag::FxPlatform)
                        .overriding("app.Base#run()"),
                ),
            );
        let res = resolve(&unit);
        assert_eq!(res.violations.len(), 1);
        let v = &res.violations[0];
        assert_eq!(v.span, Span::new(40, 60));
        assert_eq!(
            v.kind,
            ViolationKind::ConflictingOverride {
                member: "app.Impl#run()".into(),
                overridden: "app.Base#run()".into(),
                declared: Tag::FxPlatform,
                inherited: Tag::Worker,
            }
        );
        // The annotation still decides the tag
        assert_eq!(tag_of(&res, "app.Impl#run()").map(|t| t.tag), Some(Tag::FxPlatform));
    }

    fn two_interfaces(impl_member: Member) -> CompilationUnit {
        CompilationUnit::new("A.java", "app")
            .with_type(TypeDecl::new("app.Job", sp(0)).with_member(Member::method("app.Job#run()", sp(1)).tagged(Tag::Worker)))
            .with_type(
                TypeDecl::new("app.Painter", sp(10))
                    .with_member(Member::method("app.Painter#run()", sp(11)).tagged(Tag::Swing)),
            )
            .with_type(
                TypeDecl::new("app.Impl", sp(20))
                    .with_member(impl_member.overriding("app.Job#run()").overriding("app.Painter#run()")),
            )
    }

    #[test]
    fn test_every_tagged_parent_is_checked() {
        let unit = two_interfaces(Member::method("app.Impl#run()", Span::new(30, 50)).tagged(Tag::Worker));
        let res = resolve(&unit);
        assert_eq!(res.violations.len(), 1);
        assert_eq!(res.violations[0].span, Span::new(30, 50));
        assert_eq!(
            res.violations[0].kind,
            ViolationKind::ConflictingOverride {
                member: "app.Impl#run()".into(),
                overridden: "app.Painter#run()".into(),
                declared: Tag::Worker,
                inherited: Tag::Swing,
            }
        );
    }

    #[test]
    fn test_untagged_member_with_conflicting_parents_reported() {
        let unit = two_interfaces(Member::method("app.Impl#run()", Span::new(30, 50)));
        let res = resolve(&unit);
        // First tagged parent decides the tag; the other is still an obligation
        assert_eq!(tag_of(&res, "app.Impl#run()"), Some(ResolvedTag::new(Tag::Worker, TagOrigin::Inherited)));
        assert_eq!(res.violations.len(), 1);
        assert!(matches!(
            &res.violations[0].kind,
            ViolationKind::ConflictingOverride { overridden, inherited: Tag::Swing, .. } if overridden.as_str() == "app.Painter#run()"
        ));
    }

    #[test]
    fn test_one_conflict_per_incompatible_parent() {
        let unit = two_interfaces(Member::method("app.Impl#run()", sp(30)).tagged(Tag::FxPlatform));
        let res = resolve(&unit);
        assert_eq!(res.violations.len(), 2);
        assert!(res.violations.iter().all(|v| v.code() == "ConflictingOverride"));
    }

    #[test]
    fn test_ignore_parent_waives_every_parent() {
        let unit = two_interfaces(Member::method("app.Impl#run()", sp(30)).tagged_ignoring_parent(Tag::FxPlatform));
        assert!(resolve(&unit).violations.is_empty());
    }

    #[test]
    fn test_parents_agreeing_raise_nothing() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(TypeDecl::new("app.Job", sp(0)).with_member(Member::method("app.Job#run()", sp(1)).tagged(Tag::Worker)))
            .with_type(TypeDecl::new("app.Task", sp(10)).with_member(Member::method("app.Task#run()", sp(11)).tagged(Tag::Worker)))
            .with_type(TypeDecl::new("app.Impl", sp(20)).with_member(
                Member::method("app.Impl#run()", sp(21)).overriding("app.Job#run()").overriding("app.Task#run()"),
            ));
        assert!(resolve(&unit).violations.is_empty());
    }

    #[test]
    fn test_override_with_any_is_compatible() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Base", sp(0)).with_member(Member::method("app.Base#run()", sp(1)).tagged(Tag::Worker)),
            )
            .with_type(TypeDecl::new("app.Impl", sp(10)).with_member(
                Member::method("app.Impl#run()", sp(11)).tagged(Tag::Any).overriding("app.Base#run()"),
            ));
        assert!(resolve(&unit).violations.is_empty());
    }

    #[test]
    fn test_ignore_parent_suppresses_conflict() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Base", sp(0)).with_member(Member::method("app.Base#run()", sp(1)).tagged(Tag::Worker)),
            )
            .with_type(TypeDecl::new("app.Impl", sp(10)).with_member(
                Member::method("app.Impl#run()", sp(11))
                    .tagged_ignoring_parent(Tag::Swing)
                    .overriding("app.Base#run()"),
            ));
        let res = resolve(&unit);
        assert!(res.violations.is_empty());
        assert_eq!(tag_of(&res, "app.Impl#run()").map(|t| t.tag), Some(Tag::Swing));
    }

    #[test]
    fn test_untagged_member_left_for_inference() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(TypeDecl::new("app.A", sp(0)).with_member(Member::method("app.A#helper()", sp(1))));
        let res = resolve(&unit);
        assert!(res.declared.is_empty());
        assert!(res.violations.is_empty());
    }

    #[test]
    fn test_cache_entry_used_for_ancestor() {
        let mut cache = TagCache::new();
        cache.insert("app.Base#run()".into(), ResolvedTag::new(Tag::Simulation, TagOrigin::Explicit));
        cache.insert("app.Loose#run()".into(), ResolvedTag::new(Tag::Any, TagOrigin::Default));
        let unit = CompilationUnit::new("B.java", "app").with_type(
            TypeDecl::new("app.Impl", sp(0))
                .with_member(Member::method("app.Impl#run()", sp(1)).overriding("app.Base#run()"))
                .with_member(Member::method("app.Impl#other()", sp(2)).overriding("app.Loose#run()")),
        );
        let res = resolve_with(&unit, &cache, &NoExternalSymbols);
        assert_eq!(tag_of(&res, "app.Impl#run()").map(|t| t.tag), Some(Tag::Simulation));
        // A defaulted ancestor is not a tagged ancestor
        assert_eq!(tag_of(&res, "app.Impl#other()"), None);
    }

    #[test]
    fn test_external_chain_walked() {
        let mut symbols = HashMap::new();
        symbols.insert(
            SymbolId::from("lib.Button#fire()"),
            ExternalDecl::untagged().overriding("lib.Control#fire()"),
        );
        symbols.insert(SymbolId::from("lib.Control#fire()"), ExternalDecl::tagged(Tag::Fx));
        let unit = CompilationUnit::new("A.java", "app").with_type(
            TypeDecl::new("app.MyButton", sp(0))
                .with_member(Member::method("app.MyButton#fire()", sp(1)).overriding("lib.Button#fire()")),
        );
        let res = resolve_with(&unit, &TagCache::new(), &symbols);
        assert_eq!(tag_of(&res, "app.MyButton#fire()").map(|t| t.tag), Some(Tag::Fx));
    }

    #[test]
    fn test_cyclic_override_terminates() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(TypeDecl::new("app.A", sp(0)).with_member(Member::method("app.A#m()", sp(1)).overriding("app.B#m()")))
            .with_type(TypeDecl::new("app.B", sp(10)).with_member(Member::method("app.B#m()", sp(11)).overriding("app.A#m()")));
        let res = resolve(&unit);
        assert!(res.declared.is_empty());
    }

    #[test]
    fn test_anonymous_class_members_collected() {
        let anon = TypeDecl::new("app.A$1", sp(20)).with_member(
            Member::method("app.A$1#run()", sp(21))
                .with_visibility(crate::ast::Visibility::Private)
                .overriding("app.Job#run()"),
        );
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(TypeDecl::new("app.Job", sp(0)).with_member(Member::method("app.Job#run()", sp(1)).tagged(Tag::Worker)))
            .with_type(
                TypeDecl::new("app.A", sp(10)).with_member(
                    Member::method("app.A#start()", sp(11))
                        .tagged(Tag::FxPlatform)
                        .with_expr(Expr::lambda(None, vec![Expr::AnonymousClass(anon)], sp(12))),
                ),
            );
        let res = resolve(&unit);
        assert_eq!(tag_of(&res, "app.A$1#run()").map(|t| t.tag), Some(Tag::Worker));
    }

    #[test]
    fn test_ignored_types_not_resolved() {
        let unit = CompilationUnit::new("A.java", "org.vendor").with_type(
            TypeDecl::new("org.vendor.Util", sp(0))
                .with_member(Member::method("org.vendor.Util#go()", sp(1)).tagged(Tag::Worker)),
        );
        let relation = TagRelation::default();
        let ignore = IgnoreScope::new(["org.vendor".to_string()]);
        let cache = TagCache::new();
        let res = DeclResolver::new(&relation, &ignore, &cache, &NoExternalSymbols).resolve(&unit);
        assert!(res.declared.is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let unit = CompilationUnit::new("A.java", "app")
            .with_type(
                TypeDecl::new("app.Base", sp(0)).with_member(Member::method("app.Base#run()", sp(1)).tagged(Tag::Worker)),
            )
            .with_type(
                TypeDecl::new("app.Impl", sp(10))
                    .tagged(Tag::Swing)
                    .with_member(Member::method("app.Impl#run()", sp(11)).overriding("app.Base#run()"))
                    .with_member(Member::method("app.Impl#paint()", sp(12))),
            );
        let first = resolve(&unit);
        let second = resolve(&unit);
        assert_eq!(first.declared, second.declared);
    }
}
