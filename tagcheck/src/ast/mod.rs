//! Host syntax model
//!
//! The checker does not parse source. The host front-end hands over one
//! [`CompilationUnit`] per source file once semantic analysis is done,
//! with every call target already resolved through its symbol table.
//! All types are plain owned data and serde-serializable, so a host in
//! another process can ship a unit over as JSON.

mod span;
mod symbol;

pub use span::*;
pub use symbol::*;

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// One source file's worth of analyzed program structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Source path, used to label diagnostics
    pub path: String,
    /// Declared package
    #[serde(default)]
    pub package: String,
    /// Top-level and named nested types, flattened
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(path: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: TypeDecl) -> Self {
        self.types.push(ty);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A class, interface, enum or anonymous class body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Qualified name (`app.ui.Panel`, `app.ui.Panel$1` for anonymous)
    pub name: String,
    /// Type-level annotation, applied to members without their own
    #[serde(default)]
    pub tag: Option<TagAnnotation>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            tag: None,
            members: Vec::new(),
            span,
        }
    }

    pub fn tagged(mut self, tag: Tag) -> Self {
        self.tag = Some(TagAnnotation::new(tag, self.span));
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }
}

/// An explicit thread-tag annotation written by the author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAnnotation {
    pub tag: Tag,
    /// Opt out of the overridden member's tag obligation
    #[serde(default)]
    pub ignore_parent: bool,
    #[serde(default)]
    pub span: Span,
}

impl TagAnnotation {
    pub fn new(tag: Tag, span: Span) -> Self {
        Self {
            tag,
            ignore_parent: false,
            span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    Method,
    Constructor,
    /// A field; its body is the initializer
    Field,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    /// Whether other compilation units can refer to the member.
    pub fn is_exported(self) -> bool {
        !matches!(self, Visibility::Private)
    }
}

/// A method, constructor or field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub symbol: SymbolId,
    pub kind: MemberKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tag: Option<TagAnnotation>,
    /// Supertype members this one overrides or implements, nearest first
    #[serde(default)]
    pub overrides: Vec<SymbolId>,
    #[serde(default)]
    pub body: Vec<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl Member {
    fn new(kind: MemberKind, symbol: impl Into<SymbolId>, span: Span) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
            visibility: Visibility::Public,
            tag: None,
            overrides: Vec::new(),
            body: Vec::new(),
            span,
        }
    }

    pub fn method(symbol: impl Into<SymbolId>, span: Span) -> Self {
        Self::new(MemberKind::Method, symbol, span)
    }

    pub fn constructor(symbol: impl Into<SymbolId>, span: Span) -> Self {
        Self::new(MemberKind::Constructor, symbol, span)
    }

    pub fn field(symbol: impl Into<SymbolId>, span: Span) -> Self {
        Self::new(MemberKind::Field, symbol, span)
    }

    pub fn tagged(mut self, tag: Tag) -> Self {
        self.tag = Some(TagAnnotation::new(tag, self.span));
        self
    }

    /// Annotate with `tag` and drop any inherited obligation.
    pub fn tagged_ignoring_parent(mut self, tag: Tag) -> Self {
        self.tag = Some(TagAnnotation {
            tag,
            ignore_parent: true,
            span: self.span,
        });
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn overriding(mut self, parent: impl Into<SymbolId>) -> Self {
        self.overrides.push(parent.into());
        self
    }

    pub fn with_expr(mut self, expr: Expr) -> Self {
        self.body.push(expr);
        self
    }
}

/// How a call site touches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    Call,
    New,
    FieldAccess,
    MethodRef,
}

impl AccessKind {
    pub fn describe(self) -> &'static str {
        match self {
            AccessKind::Call => "call",
            AccessKind::New => "construct",
            AccessKind::FieldAccess => "access",
            AccessKind::MethodRef => "reference",
        }
    }
}

/// The parts of a member body the checker cares about
///
/// A `target` of `None` means the host could not resolve the target
/// statically (reflection, erased dynamic dispatch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    Call {
        target: Option<SymbolId>,
        span: Span,
    },
    New {
        target: Option<SymbolId>,
        span: Span,
    },
    FieldAccess {
        target: Option<SymbolId>,
        span: Span,
    },
    /// `Type::method`; `context` is the tag of the functional interface
    /// method it is converted to, if that method is annotated
    MethodRef {
        target: Option<SymbolId>,
        #[serde(default)]
        context: Option<Tag>,
        span: Span,
    },
    /// A lambda body; `context` as for `MethodRef`
    Lambda {
        #[serde(default)]
        context: Option<Tag>,
        body: Vec<Expr>,
        span: Span,
    },
    AnonymousClass(TypeDecl),
    Block(Vec<Expr>),
}

impl Expr {
    pub fn call(target: impl Into<SymbolId>, span: Span) -> Self {
        Expr::Call {
            target: Some(target.into()),
            span,
        }
    }

    /// A call the host could not resolve.
    pub fn dynamic_call(span: Span) -> Self {
        Expr::Call { target: None, span }
    }

    pub fn new_object(target: impl Into<SymbolId>, span: Span) -> Self {
        Expr::New {
            target: Some(target.into()),
            span,
        }
    }

    pub fn field(target: impl Into<SymbolId>, span: Span) -> Self {
        Expr::FieldAccess {
            target: Some(target.into()),
            span,
        }
    }

    pub fn method_ref(target: impl Into<SymbolId>, context: Option<Tag>, span: Span) -> Self {
        Expr::MethodRef {
            target: Some(target.into()),
            context,
            span,
        }
    }

    pub fn lambda(context: Option<Tag>, body: Vec<Expr>, span: Span) -> Self {
        Expr::Lambda { context, body, span }
    }
}
