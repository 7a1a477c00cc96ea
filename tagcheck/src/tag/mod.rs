//! Thread-affinity tags
//!
//! The closed set of logical threads a declaration can be bound to, and
//! the legality relation between them (see [`TagRelation`]).

mod relation;

pub use relation::TagRelation;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CheckError;
use crate::util::{find_similar_name, format_suggestion_hint};

/// A thread-affinity tag.
///
/// Variant order is display order only; it says nothing about which
/// calls are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    /// Makes no thread assumption. Callable from anywhere, may call only `Any`.
    Any,
    /// The UI toolkit thread, without assuming the event loop is running.
    Fx,
    /// The UI toolkit event-loop thread.
    FxPlatform,
    /// The legacy toolkit's event dispatch thread.
    Swing,
    /// A background worker thread.
    Worker,
    /// The simulation thread of a running user program.
    Simulation,
}

impl Tag {
    /// Every tag, in display order.
    pub const ALL: [Tag; 6] = [
        Tag::Any,
        Tag::Fx,
        Tag::FxPlatform,
        Tag::Swing,
        Tag::Worker,
        Tag::Simulation,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Dense index into relation tables.
    pub const fn index(self) -> usize {
        match self {
            Tag::Any => 0,
            Tag::Fx => 1,
            Tag::FxPlatform => 2,
            Tag::Swing => 3,
            Tag::Worker => 4,
            Tag::Simulation => 5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Tag::Any => "Any",
            Tag::Fx => "Fx",
            Tag::FxPlatform => "FxPlatform",
            Tag::Swing => "Swing",
            Tag::Worker => "Worker",
            Tag::Simulation => "Simulation",
        }
    }

    /// Whether this is the universal tag.
    pub const fn is_universal(self) -> bool {
        matches!(self, Tag::Any)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tag {
    type Err = CheckError;

    /// Parses a tag name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(tag) = Tag::ALL.iter().find(|t| t.name().eq_ignore_ascii_case(s)) {
            return Ok(*tag);
        }
        let names: Vec<&str> = Tag::ALL.iter().map(|t| t.name()).collect();
        let hint = format_suggestion_hint(find_similar_name(s, &names, 2));
        Err(CheckError::config(format!("unknown thread tag `{s}`{hint}")))
    }
}
