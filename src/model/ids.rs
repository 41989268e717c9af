//! Arena handles and the per-run identifier generator.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the entity in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle of a table inside a [`CommonModel`](super::CommonModel).
    TableId
);
arena_id!(
    /// Handle of a column inside a [`CommonModel`](super::CommonModel).
    ColumnId
);
arena_id!(
    /// Handle of a relation inside a [`CommonModel`](super::CommonModel).
    RelationId
);
arena_id!(
    /// Handle of a fact or dimension inside a [`StarModel`](super::StarModel).
    StarTableId
);
arena_id!(StarColumnId);
arena_id!(StarRelationId);

/// Lineage identifier shared by every permutation derived from one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OriginId(pub u32);

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a source database registered for sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId(pub u32);

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "db{}", self.0)
    }
}

/// Hands out origin and database identifiers for one pipeline run.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next_origin: u32,
    next_database: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_origin(&mut self) -> OriginId {
        let id = OriginId(self.next_origin);
        self.next_origin += 1;
        id
    }

    pub fn next_database(&mut self) -> DatabaseId {
        let id = DatabaseId(self.next_database);
        self.next_database += 1;
        id
    }
}
