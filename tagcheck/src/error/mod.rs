//! Error types and analysis findings
//!
//! [`CheckError`] covers the few operations that can genuinely fail
//! (configuration, dump I/O). Analysis never fails: its results are
//! [`Violation`]s, reported through the diagnostic sink.

use std::fmt;

use thiserror::Error;

use crate::ast::{AccessKind, Span, SymbolId};
use crate::tag::Tag;

/// Result type alias
pub type Result<T> = std::result::Result<T, CheckError>;

/// Checker setup error
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CheckError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// How a finding affects the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Prompts the author; never blocks
    Advisory,
    /// Blocking, subject to the diagnostic sink's policy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Advisory => f.write_str("advisory"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Who is making a call: a member, or a lambda nested somewhere inside one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub member: SymbolId,
    /// Set when the call sits in a lambda body rather than directly in `member`
    pub in_lambda: bool,
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_lambda {
            write!(f, "lambda in `{}`", self.member)
        } else {
            write!(f, "`{}`", self.member)
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Caller and callee tags fail the legality relation
    IllegalCrossThreadCall {
        caller: Caller,
        callee: SymbolId,
        caller_tag: Tag,
        callee_tag: Tag,
        access: AccessKind,
    },
    /// An override's annotation breaks the overridden member's obligation
    ConflictingOverride {
        member: SymbolId,
        overridden: SymbolId,
        declared: Tag,
        inherited: Tag,
    },
    /// A top-level member got `Any` only because nothing annotated it
    UnannotatedDefault { member: SymbolId },
}

impl ViolationKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::IllegalCrossThreadCall { .. } | Self::ConflictingOverride { .. } => Severity::Error,
            Self::UnannotatedDefault { .. } => Severity::Advisory,
        }
    }

    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            Self::IllegalCrossThreadCall { .. } => "IllegalCrossThreadCall",
            Self::ConflictingOverride { .. } => "ConflictingOverride",
            Self::UnannotatedDefault { .. } => "UnannotatedDefault",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::IllegalCrossThreadCall {
                caller,
                callee,
                caller_tag,
                callee_tag,
                access,
            } => format!(
                "{caller} on thread {caller_tag} cannot {} `{callee}` which requires thread {callee_tag}",
                access.describe()
            ),
            Self::ConflictingOverride {
                member,
                overridden,
                declared,
                inherited,
            } => format!(
                "`{member}` is tagged {declared} but overrides `{overridden}` which is tagged {inherited}"
            ),
            Self::UnannotatedDefault { member } => {
                format!("`{member}` has no thread tag; assuming {}", Tag::Any)
            }
        }
    }
}

/// A finding, positioned in its compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub span: Span,
}

impl Violation {
    pub fn new(kind: ViolationKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn illegal_call(in_lambda: bool) -> ViolationKind {
        ViolationKind::IllegalCrossThreadCall {
            caller: Caller {
                member: "app.Loader#load()".into(),
                in_lambda,
            },
            callee: "app.View#update()".into(),
            caller_tag: Tag::Worker,
            callee_tag: Tag::FxPlatform,
            access: AccessKind::Call,
        }
    }

    #[test]
    fn test_severity_per_kind() {
        assert_eq!(illegal_call(false).severity(), Severity::Error);
        let conflict = ViolationKind::ConflictingOverride {
            member: "a.B#m()".into(),
            overridden: "a.A#m()".into(),
            declared: Tag::FxPlatform,
            inherited: Tag::Worker,
        };
        assert_eq!(conflict.severity(), Severity::Error);
        let unannotated = ViolationKind::UnannotatedDefault {
            member: "a.A#m()".into(),
        };
        assert_eq!(unannotated.severity(), Severity::Advisory);
        assert!(Severity::Advisory < Severity::Error);
    }

    #[test]
    fn test_illegal_call_message() {
        assert_eq!(
            illegal_call(false).message(),
            "`app.Loader#load()` on thread Worker cannot call `app.View#update()` which requires thread FxPlatform"
        );
        assert!(illegal_call(true).message().starts_with("lambda in `app.Loader#load()`"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(illegal_call(false).code(), "IllegalCrossThreadCall");
        let v = Violation::new(
            ViolationKind::UnannotatedDefault {
                member: "a.A#m()".into(),
            },
            Span::new(1, 2),
        );
        assert_eq!(v.code(), "UnannotatedDefault");
        assert_eq!(v.message(), "`a.A#m()` has no thread tag; assuming Any");
    }

    #[test]
    fn test_config_error_display() {
        let err = CheckError::config("bad flag");
        assert_eq!(err.to_string(), "configuration error: bad flag");
    }
}
