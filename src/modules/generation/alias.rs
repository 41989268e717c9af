//! Table aliases for generated scripts.

use std::collections::{HashMap, HashSet};

use crate::model::{StarTableId, TableId};

/// Collision-free aliases for one generation run.
///
/// Source tables are aliased `S_<xx><n>` and star tables `T_<xx><n>`, where
/// `<xx>` is the first two characters of the table name and `<n>` the
/// smallest positive number not already taken.
#[derive(Debug, Default)]
pub struct AliasContext {
    sources: HashMap<TableId, String>,
    stars: HashMap<StarTableId, String>,
    known: HashSet<String>,
}

impl AliasContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&mut self, table: TableId, name: &str) -> String {
        if let Some(alias) = self.sources.get(&table) {
            return alias.clone();
        }
        let alias = self.fresh("S_", name);
        self.sources.insert(table, alias.clone());
        alias
    }

    pub fn star(&mut self, table: StarTableId, name: &str) -> String {
        if let Some(alias) = self.stars.get(&table) {
            return alias.clone();
        }
        let alias = self.fresh("T_", name);
        self.stars.insert(table, alias.clone());
        alias
    }

    fn fresh(&mut self, prefix: &str, name: &str) -> String {
        let stem: String = name.chars().take(2).collect();
        let mut offset = 1;
        loop {
            let alias = format!("{prefix}{stem}{offset}");
            if self.known.insert(alias.clone()) {
                return alias;
            }
            offset += 1;
        }
    }
}
