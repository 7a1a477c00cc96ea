//! Thread-affinity tag checker
//!
//! Verifies at build time that every call, field access and method
//! reference in a compilation unit is legal given the thread tag of the
//! calling and the called code.
//!
//! ```text
//! CompilationUnit → Resolver → Inference → Call-site checker → Reporting
//!                       ↕                        ↕
//!                    TagCache ←─────────────────┘
//! ```

pub mod ast;
pub mod cache;
pub mod check;
pub mod config;
pub mod error;
pub mod host;
pub mod infer;
pub mod report;
pub mod resolve;
pub mod session;
pub mod tag;
pub mod util;

pub use ast::{CompilationUnit, Span, SymbolId};
pub use cache::{SharedTagCache, TagCache};
pub use config::CheckerConfig;
pub use error::{CheckError, Result, Severity, Violation, ViolationKind};
pub use session::{ThreadChecker, UnitReport};
pub use tag::{Tag, TagRelation};
