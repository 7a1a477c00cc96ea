//! Nested-body inference
//!
//! Finishes what the resolver leaves open, in one enclosing-to-nested
//! walk over the unit:
//!
//! - a lambda runs on its functional-interface tag if it has one, and
//!   otherwise on the tag of whatever encloses it;
//! - an anonymous-class member with no declared tag takes the tag of the
//!   enclosing body;
//! - a top-level member with no declared tag defaults to `Any` and gets
//!   an `UnannotatedDefault` advisory.
//!
//! Nesting is a tree, so a single pass suffices. Calls between sibling
//! members never feed into a tag.
//!
//! The same walk records every call site together with the effective tag
//! of its caller, ready for the call-site checker.

use crate::ast::{AccessKind, CompilationUnit, Expr, Member, Span, SymbolId, TypeDecl};
use crate::config::IgnoreScope;
use crate::error::{Caller, Violation, ViolationKind};
use crate::resolve::{ResolvedTag, TagOrigin, TagTable};
use crate::tag::Tag;

/// A call, construction, field access or method reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub caller: Caller,
    /// Effective tag of the innermost enclosing member or lambda
    pub caller_tag: Tag,
    /// `None` when the host could not resolve the target
    pub target: Option<&'a SymbolId>,
    pub access: AccessKind,
    pub span: Span,
}

/// A lambda body and the tag it runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedBody {
    pub span: Span,
    pub tag: ResolvedTag,
}

/// Output of the inference pass for one unit
#[derive(Debug, Default)]
pub struct Inference<'a> {
    /// Effective tag of every member checked in the unit
    pub tags: TagTable,
    /// Top-level members other units may refer to
    pub exported: Vec<SymbolId>,
    pub lambdas: Vec<NestedBody>,
    pub sites: Vec<CallSite<'a>>,
    pub violations: Vec<Violation>,
}

#[derive(Clone, Copy)]
struct Scope<'a> {
    member: &'a SymbolId,
    tag: Tag,
    in_lambda: bool,
}

/// Runs the inference walk
pub struct InferencePass<'a, 'r> {
    declared: &'r TagTable,
    ignore: &'r IgnoreScope,
    report_unannotated: bool,
    out: Inference<'a>,
}

impl<'a, 'r> InferencePass<'a, 'r> {
    pub fn new(declared: &'r TagTable, ignore: &'r IgnoreScope) -> Self {
        Self {
            declared,
            ignore,
            report_unannotated: true,
            out: Inference::default(),
        }
    }

    pub fn report_unannotated(mut self, enabled: bool) -> Self {
        self.report_unannotated = enabled;
        self
    }

    pub fn run(mut self, unit: &'a CompilationUnit) -> Inference<'a> {
        for ty in &unit.types {
            if self.ignore.covers(&ty.name) {
                continue;
            }
            for member in &ty.members {
                self.top_level(member);
            }
        }
        tracing::debug!(
            unit = %unit.path,
            members = self.out.tags.len(),
            lambdas = self.out.lambdas.len(),
            sites = self.out.sites.len(),
            "inferred effective tags"
        );
        self.out
    }

    fn top_level(&mut self, member: &'a Member) {
        let tag = match self.declared.get(&member.symbol) {
            Some(tag) => tag,
            None => {
                if self.report_unannotated {
                    self.out.violations.push(Violation::new(
                        ViolationKind::UnannotatedDefault {
                            member: member.symbol.clone(),
                        },
                        member.span,
                    ));
                }
                ResolvedTag::new(Tag::Any, TagOrigin::Default)
            }
        };
        if self.out.tags.insert(member.symbol.clone(), tag) && member.visibility.is_exported() {
            self.out.exported.push(member.symbol.clone());
        }
        self.walk_member(member, tag.tag);
    }

    fn walk_member(&mut self, member: &'a Member, tag: Tag) {
        let scope = Scope {
            member: &member.symbol,
            tag,
            in_lambda: false,
        };
        for expr in &member.body {
            self.walk(expr, scope);
        }
    }

    fn walk(&mut self, expr: &'a Expr, scope: Scope<'a>) {
        match expr {
            Expr::Call { target, span } => self.site(scope, scope.tag, target.as_ref(), AccessKind::Call, *span),
            Expr::New { target, span } => self.site(scope, scope.tag, target.as_ref(), AccessKind::New, *span),
            Expr::FieldAccess { target, span } => {
                self.site(scope, scope.tag, target.as_ref(), AccessKind::FieldAccess, *span)
            }
            Expr::MethodRef { target, context, span } => {
                let tag = context.unwrap_or(scope.tag);
                self.site(scope, tag, target.as_ref(), AccessKind::MethodRef, *span)
            }
            Expr::Lambda { context, body, span } => {
                let tag = match context {
                    Some(tag) => ResolvedTag::new(*tag, TagOrigin::Context),
                    None => ResolvedTag::new(scope.tag, TagOrigin::Enclosing),
                };
                self.out.lambdas.push(NestedBody { span: *span, tag });
                let inner = Scope {
                    tag: tag.tag,
                    in_lambda: true,
                    ..scope
                };
                for e in body {
                    self.walk(e, inner);
                }
            }
            Expr::AnonymousClass(ty) => self.anonymous(ty, scope.tag),
            Expr::Block(body) => {
                for e in body {
                    self.walk(e, scope);
                }
            }
        }
    }

    fn anonymous(&mut self, ty: &'a TypeDecl, enclosing: Tag) {
        if self.ignore.covers(&ty.name) {
            return;
        }
        for member in &ty.members {
            let tag = self
                .declared
                .get(&member.symbol)
                .unwrap_or_else(|| ResolvedTag::new(enclosing, TagOrigin::Enclosing));
            self.out.tags.insert(member.symbol.clone(), tag);
            self.walk_member(member, tag.tag);
        }
    }

    fn site(&mut self, scope: Scope<'a>, caller_tag: Tag, target: Option<&'a SymbolId>, access: AccessKind, span: Span) {
        self.out.sites.push(CallSite {
            caller: Caller {
                member: scope.member.clone(),
                in_lambda: scope.in_lambda,
            },
            caller_tag,
            target,
            access,
            span,
        });
    }
}
