//! Star-schema entities and the `StarModel` arena.
//!
//! A [`StarModel`] is one fact table plus its dimensions, derived from a
//! [`CommonModel`] that it keeps alive through an `Arc`. Star tables, star
//! columns and star relations live in arenas owned by the model.
//!
//! Role-playing dimensions are separate star-table entries pointing at the
//! actual dimension through `role_of`. They have their own name and relations
//! but read their columns from the actual table, so a column added to a
//! conformed dimension shows up in every role it plays.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::datatype::DataType;
use super::ids::{ColumnId, OriginId, StarColumnId, StarRelationId, StarTableId, TableId};
use super::schema::{Cardinality, CommonModel};

// ============================================================================
// Column flags
// ============================================================================

/// Bit flags describing the role of a star column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StarColumnType(u8);

impl StarColumnType {
    pub const NONE: StarColumnType = StarColumnType(0);
    pub const KEY: StarColumnType = StarColumnType(1);
    pub const SURROGATE_KEY: StarColumnType = StarColumnType(2);
    pub const DESCRIPTIVE_MEASURE: StarColumnType = StarColumnType(4);
    pub const NUMERIC_MEASURE: StarColumnType = StarColumnType(8);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: StarColumnType) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: StarColumnType) {
        self.0 |= other.0;
    }

    /// The key-related bits only (`KEY | SURROGATE_KEY`).
    pub fn key_bits(self) -> u8 {
        self.0 & 0b11
    }

    pub fn is_measure(self) -> bool {
        self.contains(StarColumnType::NUMERIC_MEASURE)
            || self.contains(StarColumnType::DESCRIPTIVE_MEASURE)
    }
}

impl BitOr for StarColumnType {
    type Output = StarColumnType;

    fn bitor(self, rhs: StarColumnType) -> StarColumnType {
        StarColumnType(self.0 | rhs.0)
    }
}

impl fmt::Display for StarColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (StarColumnType::KEY, "key"),
            (StarColumnType::SURROGATE_KEY, "surrogate_key"),
            (StarColumnType::DESCRIPTIVE_MEASURE, "descriptive_measure"),
            (StarColumnType::NUMERIC_MEASURE, "numeric_measure"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&set.join("|"))
        }
    }
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateGranularity {
    Years,
    Quarters,
    Months,
    Weeks,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeGranularity {
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StarTableKind {
    Fact,
    Dimension,
    Junk,
    Date(DateGranularity),
    Time(TimeGranularity),
}

impl StarTableKind {
    pub fn is_date(&self) -> bool {
        matches!(self, StarTableKind::Date(_))
    }

    pub fn is_time(&self) -> bool {
        matches!(self, StarTableKind::Time(_))
    }

    /// Generated conformed date or time dimension.
    pub fn is_calendar(&self) -> bool {
        self.is_date() || self.is_time()
    }

    pub fn is_junk(&self) -> bool {
        matches!(self, StarTableKind::Junk)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarColumn {
    pub name: String,
    pub ordinal: usize,
    pub datatype: DataType,
    pub column_type: StarColumnType,
    column_ref: Option<ColumnId>,
    table: StarTableId,
}

impl StarColumn {
    /// Relational column this column was derived from.
    pub fn column_ref(&self) -> Option<ColumnId> {
        self.column_ref
    }

    /// Star table currently owning the column.
    pub fn table(&self) -> StarTableId {
        self.table
    }

    pub fn is_key(&self) -> bool {
        self.column_type.contains(StarColumnType::KEY)
    }

    pub fn is_surrogate_key(&self) -> bool {
        self.column_type.contains(StarColumnType::SURROGATE_KEY)
    }
}

/// Blueprint for a column that is not yet attached to a star table.
#[derive(Debug, Clone, PartialEq)]
pub struct StarColumnSpec {
    pub name: String,
    pub datatype: DataType,
    pub column_type: StarColumnType,
    pub column_ref: Option<ColumnId>,
}

impl StarColumnSpec {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            column_type: StarColumnType::NONE,
            column_ref: None,
        }
    }

    pub fn flags(mut self, column_type: StarColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn derived_from(mut self, column: ColumnId) -> Self {
        self.column_ref = Some(column);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRelation {
    pub anchor: StarTableId,
    pub link: StarTableId,
    pub anchor_columns: Vec<StarColumnId>,
    pub link_columns: Vec<StarColumnId>,
    pub cardinality: Cardinality,
}

impl StarRelation {
    /// A relation with no columns on either side yet.
    pub fn between(anchor: StarTableId, link: StarTableId, cardinality: Cardinality) -> Self {
        Self {
            anchor,
            link,
            anchor_columns: Vec::new(),
            link_columns: Vec::new(),
            cardinality,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarConstraints {
    pub primary_key: Vec<StarColumnId>,
    pub not_nullables: Vec<StarColumnId>,
    pub uniques: Vec<Vec<StarColumnId>>,
}

impl StarConstraints {
    fn forget(&mut self, column: StarColumnId) {
        self.primary_key.retain(|c| *c != column);
        self.not_nullables.retain(|c| *c != column);
        for unique in &mut self.uniques {
            unique.retain(|c| *c != column);
        }
        self.uniques.retain(|u| !u.is_empty());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTable {
    pub name: String,
    pub kind: StarTableKind,
    pub constraints: StarConstraints,
    columns: Vec<StarColumnId>,
    relations: Vec<StarRelationId>,
    table_ref: Option<TableId>,
    role_of: Option<StarTableId>,
}

impl StarTable {
    /// Relational table this star table was derived from.
    pub fn table_ref(&self) -> Option<TableId> {
        self.table_ref
    }

    pub fn relations(&self) -> &[StarRelationId] {
        &self.relations
    }

    pub fn is_role_playing(&self) -> bool {
        self.role_of.is_some()
    }

    pub fn role_of(&self) -> Option<StarTableId> {
        self.role_of
    }
}

// ============================================================================
// StarModel
// ============================================================================

#[derive(Debug, Clone)]
pub struct StarModel {
    origin: Arc<CommonModel>,
    fact: StarTableId,
    confidence: f64,
    dimensions: Vec<StarTableId>,
    tables: Vec<StarTable>,
    columns: Vec<StarColumn>,
    relations: Vec<StarRelation>,
}

impl StarModel {
    /// Create a star model whose fact table mirrors `fact_table`.
    pub fn new(origin: Arc<CommonModel>, fact_table: TableId, confidence: f64) -> Self {
        let mut model = Self {
            origin,
            fact: StarTableId(0),
            confidence,
            dimensions: Vec::new(),
            tables: Vec::new(),
            columns: Vec::new(),
            relations: Vec::new(),
        };
        model.fact = model.table_from_relational(fact_table, StarTableKind::Fact);
        model
    }

    pub fn origin(&self) -> &CommonModel {
        &self.origin
    }

    pub fn origin_arc(&self) -> &Arc<CommonModel> {
        &self.origin
    }

    pub fn origin_id(&self) -> OriginId {
        self.origin.origin_id()
    }

    pub fn fact(&self) -> StarTableId {
        self.fact
    }

    pub fn fact_table_ref(&self) -> Option<TableId> {
        self.tables[self.fact.0].table_ref
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Two star models describe the same fact when they come from the same
    /// origin lineage and the same relational table.
    pub fn same_fact(&self, other: &StarModel) -> bool {
        self.origin_id() == other.origin_id() && self.fact_table_ref() == other.fact_table_ref()
    }

    pub fn dimensions(&self) -> &[StarTableId] {
        &self.dimensions
    }

    /// Fact first, then dimensions in attachment order.
    pub fn table_ids(&self) -> Vec<StarTableId> {
        std::iter::once(self.fact)
            .chain(self.dimensions.iter().copied())
            .collect()
    }

    pub fn table(&self, id: StarTableId) -> &StarTable {
        &self.tables[id.0]
    }

    pub fn table_mut(&mut self, id: StarTableId) -> &mut StarTable {
        &mut self.tables[id.0]
    }

    pub fn column(&self, id: StarColumnId) -> &StarColumn {
        &self.columns[id.0]
    }

    pub fn column_mut(&mut self, id: StarColumnId) -> &mut StarColumn {
        &mut self.columns[id.0]
    }

    pub fn relation(&self, id: StarRelationId) -> &StarRelation {
        &self.relations[id.0]
    }

    pub fn relation_mut(&mut self, id: StarRelationId) -> &mut StarRelation {
        &mut self.relations[id.0]
    }

    /// The table a role-playing entry stands in for; the table itself otherwise.
    pub fn actual(&self, table: StarTableId) -> StarTableId {
        self.tables[table.0].role_of.unwrap_or(table)
    }

    /// Column ids of a table, resolved through role-playing.
    pub fn column_ids(&self, table: StarTableId) -> &[StarColumnId] {
        &self.tables[self.actual(table).0].columns
    }

    pub fn columns_of(
        &self,
        table: StarTableId,
    ) -> impl Iterator<Item = (StarColumnId, &StarColumn)> + '_ {
        self.column_ids(table)
            .iter()
            .map(move |id| (*id, &self.columns[id.0]))
    }

    pub fn relations_of(
        &self,
        table: StarTableId,
    ) -> impl Iterator<Item = (StarRelationId, &StarRelation)> + '_ {
        self.tables[table.0]
            .relations
            .iter()
            .map(move |id| (*id, &self.relations[id.0]))
    }

    pub fn find_column(&self, table: StarTableId, name: &str) -> Option<StarColumnId> {
        self.columns_of(table)
            .find(|(_, c)| c.name == name)
            .map(|(id, _)| id)
    }

    pub fn has_key(&self, table: StarTableId) -> bool {
        self.columns_of(table).any(|(_, c)| c.is_key())
    }

    /// Dimensions of a given kind, actual tables only.
    pub fn find_dimension(&self, kind: StarTableKind) -> Option<StarTableId> {
        self.dimensions
            .iter()
            .copied()
            .find(|d| self.tables[d.0].kind == kind && !self.tables[d.0].is_role_playing())
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// New star table mirroring the columns of a relational table. Not yet
    /// attached as a dimension.
    pub fn table_from_relational(&mut self, table_ref: TableId, kind: StarTableKind) -> StarTableId {
        let name = self.origin.table(table_ref).name.clone();
        let id = self.add_table(name, kind, Some(table_ref));
        let specs: Vec<StarColumnSpec> = self
            .origin
            .columns_of(table_ref)
            .map(|(cid, c)| StarColumnSpec::new(c.name(), c.datatype()).derived_from(cid))
            .collect();
        for spec in specs {
            self.push_column(id, spec);
        }
        id
    }

    /// New empty star table. Not yet attached as a dimension.
    pub fn add_table(
        &mut self,
        name: impl Into<String>,
        kind: StarTableKind,
        table_ref: Option<TableId>,
    ) -> StarTableId {
        let id = StarTableId(self.tables.len());
        self.tables.push(StarTable {
            name: name.into(),
            kind,
            constraints: StarConstraints::default(),
            columns: Vec::new(),
            relations: Vec::new(),
            table_ref,
            role_of: None,
        });
        id
    }

    pub fn push_dimension(&mut self, table: StarTableId) {
        if table != self.fact && !self.dimensions.contains(&table) {
            self.dimensions.push(table);
        }
    }

    /// Drop dimensions for which `keep` returns false.
    pub fn retain_dimensions<F: FnMut(&StarTable) -> bool>(&mut self, mut keep: F) {
        let tables = &self.tables;
        self.dimensions.retain(|d| keep(&tables[d.0]));
    }

    /// Role-playing entry for `actual`, named like it.
    pub fn add_role_playing(&mut self, actual: StarTableId) -> StarTableId {
        let actual = self.actual(actual);
        let source = &self.tables[actual.0];
        let role = StarTable {
            name: source.name.clone(),
            kind: source.kind,
            constraints: StarConstraints::default(),
            columns: Vec::new(),
            relations: Vec::new(),
            table_ref: source.table_ref,
            role_of: Some(actual),
        };
        let id = StarTableId(self.tables.len());
        self.tables.push(role);
        id
    }

    /// Append a column; its ordinal is its 1-based position.
    pub fn push_column(&mut self, table: StarTableId, spec: StarColumnSpec) -> StarColumnId {
        let table = self.actual(table);
        let ordinal = self.tables[table.0].columns.len() + 1;
        let id = self.alloc_column(table, ordinal, spec);
        self.tables[table.0].columns.push(id);
        id
    }

    /// Insert columns at the front with ordinals `1..=n`, shifting the
    /// ordinals of the existing columns by `n`.
    pub fn insert_columns_front(
        &mut self,
        table: StarTableId,
        specs: Vec<StarColumnSpec>,
    ) -> Vec<StarColumnId> {
        let table = self.actual(table);
        let shift = specs.len();
        for id in self.tables[table.0].columns.clone() {
            self.columns[id.0].ordinal += shift;
        }
        let ids: Vec<StarColumnId> = specs
            .into_iter()
            .enumerate()
            .map(|(i, spec)| self.alloc_column(table, i + 1, spec))
            .collect();
        self.tables[table.0].columns.splice(0..0, ids.iter().copied());
        ids
    }

    fn alloc_column(
        &mut self,
        table: StarTableId,
        ordinal: usize,
        spec: StarColumnSpec,
    ) -> StarColumnId {
        let id = StarColumnId(self.columns.len());
        self.columns.push(StarColumn {
            name: spec.name,
            ordinal,
            datatype: spec.datatype,
            column_type: spec.column_type,
            column_ref: spec.column_ref,
            table,
        });
        id
    }

    /// Detach a column from its table and that table's constraints.
    pub fn remove_column(&mut self, column: StarColumnId) {
        let owner = self.columns[column.0].table;
        let table = &mut self.tables[owner.0];
        table.columns.retain(|c| *c != column);
        table.constraints.forget(column);
    }

    /// Move a column to another table, appending it there.
    pub fn move_column(&mut self, column: StarColumnId, to: StarTableId) {
        let to = self.actual(to);
        self.remove_column(column);
        let ordinal = self.tables[to.0].columns.len() + 1;
        self.tables[to.0].columns.push(column);
        let moved = &mut self.columns[column.0];
        moved.table = to;
        moved.ordinal = ordinal;
    }

    /// Replace the column order of a table and renumber ordinals `1..=n`.
    pub fn set_column_order(&mut self, table: StarTableId, order: Vec<StarColumnId>) {
        let table = self.actual(table);
        for (i, id) in order.iter().enumerate() {
            self.columns[id.0].ordinal = i + 1;
        }
        self.tables[table.0].columns = order;
    }

    /// Add a relation and register it on both participating tables.
    pub fn add_relation(&mut self, relation: StarRelation) -> StarRelationId {
        let id = StarRelationId(self.relations.len());
        let (anchor, link) = (relation.anchor, relation.link);
        self.relations.push(relation);
        self.tables[anchor.0].relations.push(id);
        if anchor != link {
            self.tables[link.0].relations.push(id);
        }
        id
    }

    /// Detach every relation of `table`, from both sides.
    pub fn clear_relations(&mut self, table: StarTableId) {
        let held = std::mem::take(&mut self.tables[table.0].relations);
        for id in held {
            let rel = &self.relations[id.0];
            let other = if rel.anchor == table { rel.link } else { rel.anchor };
            self.tables[other.0].relations.retain(|r| *r != id);
        }
    }

    // ------------------------------------------------------------------
    // Lookups into the relational origin
    // ------------------------------------------------------------------

    /// The source column carried a not-null candidate.
    pub fn source_not_null(&self, column: StarColumnId) -> bool {
        self.columns[column.0]
            .column_ref
            .is_some_and(|c| self.origin.not_null_for(c).is_some())
    }

    /// The source column is a foreign key into `anchor`.
    pub fn source_references(&self, column: StarColumnId, anchor: TableId) -> bool {
        let Some(source) = self.columns[column.0].column_ref else {
            return false;
        };
        let owner = self.origin.column(source).table();
        self.origin
            .relations_of(owner)
            .any(|(_, r)| r.anchor == anchor && r.link_columns.contains(&source))
    }
}
