//! Call legality relation between tags
//!
//! Stored as an explicit adjacency matrix rather than derived from an
//! ordering: the relation is neither symmetric nor transitive, and hosts
//! may add directed bridging edges between specific tags.

use super::Tag;
use crate::error::{CheckError, Result};

/// Directed "may call" relation over [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRelation {
    /// `table[caller][callee]`
    table: [[bool; Tag::COUNT]; Tag::COUNT],
    bridges: Vec<(Tag, Tag)>,
}

impl TagRelation {
    /// Bridging edges every checker starts from.
    ///
    /// The event-loop thread is a UI toolkit thread, so it satisfies the
    /// plain `Fx` contract. The converse does not hold.
    pub const DEFAULT_BRIDGES: [(Tag, Tag); 1] = [(Tag::FxPlatform, Tag::Fx)];

    /// The base relation with no bridging edges: a call is legal iff the
    /// callee is universal or both tags are equal.
    pub fn strict() -> Self {
        let mut table = [[false; Tag::COUNT]; Tag::COUNT];
        for caller in Tag::ALL {
            for callee in Tag::ALL {
                table[caller.index()][callee.index()] = callee.is_universal() || caller == callee;
            }
        }
        Self {
            table,
            bridges: Vec::new(),
        }
    }

    /// The base relation plus [`Self::DEFAULT_BRIDGES`].
    pub fn with_default_bridges() -> Self {
        Self::with_bridges(&Self::DEFAULT_BRIDGES).unwrap_or_else(|_| Self::strict())
    }

    /// The base relation plus the given directed bridges.
    pub fn with_bridges(bridges: &[(Tag, Tag)]) -> Result<Self> {
        let mut relation = Self::strict();
        for &(from, to) in bridges {
            relation.add_bridge(from, to)?;
        }
        Ok(relation)
    }

    /// Declare that code tagged `from` may call code tagged `to`.
    ///
    /// Bridges out of `Any` are rejected: universal code has no thread
    /// guarantee to offer a specific callee.
    pub fn add_bridge(&mut self, from: Tag, to: Tag) -> Result<()> {
        if from.is_universal() && !to.is_universal() {
            return Err(CheckError::config(format!(
                "bridge {from} -> {to} is not allowed: `{from}` code cannot satisfy a thread-specific callee"
            )));
        }
        let cell = &mut self.table[from.index()][to.index()];
        if !*cell {
            *cell = true;
            self.bridges.push((from, to));
        }
        Ok(())
    }

    /// Whether code tagged `caller` may call code tagged `callee`.
    pub fn permits(&self, caller: Tag, callee: Tag) -> bool {
        self.table[caller.index()][callee.index()]
    }

    /// Whether an override tagged `declared` honours a supertype member
    /// tagged `inherited`.
    ///
    /// Callers that reach the override through the supertype run on the
    /// inherited tag, so the inherited tag must be allowed to call it.
    pub fn override_compatible(&self, inherited: Tag, declared: Tag) -> bool {
        self.permits(inherited, declared)
    }

    /// Bridging edges added on top of the base relation, in insertion order.
    pub fn bridges(&self) -> &[(Tag, Tag)] {
        &self.bridges
    }
}

impl Default for TagRelation {
    fn default() -> Self {
        Self::with_default_bridges()
    }
}
