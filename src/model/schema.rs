//! Relational schema entities and the `CommonModel` arena.
//!
//! A [`CommonModel`] owns every table, column and relation it has ever
//! contained. Entities are addressed by [`TableId`]/[`ColumnId`]/[`RelationId`]
//! handles and never freed during a run; removing a table from a model only
//! drops it from the ordered member list. This keeps the physical tables a
//! combined table was built from reachable for generation.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::confidence::{fuse, fuse_by, Candidate};
use super::datatype::DataType;
use super::ids::{ColumnId, DatabaseId, OriginId, RelationId, TableId};

// ============================================================================
// Supporting types
// ============================================================================

/// Cardinality of a relation, read from the link side towards the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    /// Not yet refined.
    Unknown,
}

impl Cardinality {
    /// Reverse the cardinality (swap sides).
    pub fn reverse(self) -> Self {
        match self {
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            other => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Cardinality::Unknown)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:N",
            Cardinality::ManyToOne => "N:1",
            Cardinality::ManyToMany => "N:N",
            Cardinality::Unknown => "?:?",
        };
        f.write_str(s)
    }
}

/// A set of columns compared as a set (key candidates).
pub type ColumnSet = BTreeSet<ColumnId>;

/// Registered source database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    pub connection_string: String,
    pub source_type: String,
}

/// Where a column physically lives, for re-fetching samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceColumn {
    pub database: DatabaseId,
    pub schema: String,
    pub table: String,
    pub column: String,
    /// 1-based position in the source table.
    pub ordinal: usize,
}

// ============================================================================
// Column
// ============================================================================

/// A relational column with weighted name and datatype evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    ordinal: usize,
    original_name: String,
    table: TableId,
    origin_table: TableId,
    source: SourceColumn,
    names: Vec<Candidate<String>>,
    datatypes: Vec<Candidate<DataType>>,
}

impl Column {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Table currently owning the column.
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Physical table the column was extracted from.
    pub fn origin_table(&self) -> TableId {
        self.origin_table
    }

    pub fn source(&self) -> &SourceColumn {
        &self.source
    }

    /// Fused name; the original name when no candidate exists.
    pub fn name(&self) -> String {
        fuse(&self.names)
            .map(|c| c.value)
            .unwrap_or_else(|| self.original_name.clone())
    }

    /// Fused datatype; `Unknown` when no candidate exists.
    pub fn datatype(&self) -> DataType {
        fuse(&self.datatypes).map(|c| c.value).unwrap_or_default()
    }

    pub fn name_candidates(&self) -> &[Candidate<String>] {
        &self.names
    }

    pub fn datatype_candidates(&self) -> &[Candidate<DataType>] {
        &self.datatypes
    }

    pub fn add_name_candidate(&mut self, name: impl Into<String>, confidence: f64) {
        self.names.push(Candidate::new(name.into(), confidence));
    }

    pub fn add_datatype_candidate(&mut self, datatype: DataType, confidence: f64) {
        self.datatypes.push(Candidate::new(datatype, confidence));
    }
}

// ============================================================================
// Table
// ============================================================================

/// Constraint evidence of a table. Each entry is a weighted candidate, never
/// a settled answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub primary_keys: Vec<Candidate<ColumnSet>>,
    pub uniques: Vec<Candidate<ColumnSet>>,
    pub not_nullables: Vec<Candidate<ColumnId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableKind {
    Base,
    /// Merged from a link table and its anchor, in that order.
    Combined { sources: Vec<TableId> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    original_name: String,
    pub schema: String,
    /// Approximate row count; `None` when it could not be determined.
    pub row_count: Option<u64>,
    database: DatabaseId,
    columns: Vec<ColumnId>,
    relations: Vec<RelationId>,
    constraints: Constraints,
    kind: TableKind,
}

impl Table {
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn database(&self) -> DatabaseId {
        self.database
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.columns
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn kind(&self) -> &TableKind {
        &self.kind
    }

    pub fn is_combined(&self) -> bool {
        matches!(self.kind, TableKind::Combined { .. })
    }

    /// Source tables of a combined table; empty for base tables.
    pub fn sources(&self) -> &[TableId] {
        match &self.kind {
            TableKind::Combined { sources } => sources,
            TableKind::Base => &[],
        }
    }

    pub fn add_primary_key_candidate(&mut self, columns: ColumnSet, confidence: f64) {
        self.constraints
            .primary_keys
            .push(Candidate::new(columns, confidence));
    }

    pub fn add_unique_candidate(&mut self, columns: ColumnSet, confidence: f64) {
        self.constraints.uniques.push(Candidate::new(columns, confidence));
    }

    pub fn add_not_null_candidate(&mut self, column: ColumnId, confidence: f64) {
        self.constraints
            .not_nullables
            .push(Candidate::new(column, confidence));
    }

    /// The fused primary key, derived on every read.
    pub fn primary_key(&self) -> Option<Candidate<ColumnSet>> {
        fuse_by(&self.constraints.primary_keys, |a, b| a == b)
    }

    /// The fused uniqueness candidate among those covering `column`.
    pub fn unique_for(&self, column: ColumnId) -> Option<Candidate<ColumnSet>> {
        let covering: Vec<_> = self
            .constraints
            .uniques
            .iter()
            .filter(|u| u.value.contains(&column))
            .cloned()
            .collect();
        fuse(&covering)
    }

    /// Mean not-null confidence for `column`, if any evidence exists.
    pub fn not_null_for(&self, column: ColumnId) -> Option<f64> {
        let evidence: Vec<_> = self
            .constraints
            .not_nullables
            .iter()
            .filter(|n| n.value == column)
            .cloned()
            .collect();
        fuse(&evidence).map(|c| c.confidence)
    }
}

// ============================================================================
// Relation
// ============================================================================

/// A foreign-key style link: `link_columns` of `link` reference
/// `anchor_columns` of `anchor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub anchor: TableId,
    pub link: TableId,
    pub anchor_columns: Vec<ColumnId>,
    pub link_columns: Vec<ColumnId>,
    pub cardinality: Cardinality,
}

impl Relation {
    pub fn new(
        anchor: TableId,
        link: TableId,
        anchor_columns: Vec<ColumnId>,
        link_columns: Vec<ColumnId>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            anchor,
            link,
            anchor_columns,
            link_columns,
            cardinality,
        }
    }

    pub fn is_self_relation(&self) -> bool {
        self.anchor == self.link
    }

    pub fn connects(&self, a: TableId, b: TableId) -> bool {
        (self.anchor == a && self.link == b) || (self.anchor == b && self.link == a)
    }

    /// The table on the other side of `table`, if `table` participates.
    pub fn other_side(&self, table: TableId) -> Option<TableId> {
        if self.anchor == table {
            Some(self.link)
        } else if self.link == table {
            Some(self.anchor)
        } else {
            None
        }
    }
}

// ============================================================================
// CommonModel
// ============================================================================

/// One relational schema snapshot and the arena behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonModel {
    origin_id: OriginId,
    suffix: String,
    members: Vec<TableId>,
    tables: Vec<Table>,
    columns: Vec<Column>,
    relations: Vec<Relation>,
}

impl CommonModel {
    pub fn new(origin_id: OriginId) -> Self {
        Self {
            origin_id,
            suffix: String::new(),
            members: Vec::new(),
            tables: Vec::new(),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn origin_id(&self) -> OriginId {
        self.origin_id
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.suffix = suffix.into();
    }

    /// Origin id plus permutation suffix, e.g. `3.A`.
    pub fn label(&self) -> String {
        format!("{}{}", self.origin_id, self.suffix)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Add a base table as a member of the model.
    pub fn add_table(
        &mut self,
        name: &str,
        schema: &str,
        database: DatabaseId,
        row_count: Option<u64>,
    ) -> TableId {
        self.push_table(name, schema, database, row_count, TableKind::Base)
    }

    /// Add a combined table as a member of the model.
    pub fn add_combined_table(
        &mut self,
        name: &str,
        schema: &str,
        database: DatabaseId,
        row_count: Option<u64>,
        sources: Vec<TableId>,
    ) -> TableId {
        self.push_table(
            name,
            schema,
            database,
            row_count,
            TableKind::Combined { sources },
        )
    }

    fn push_table(
        &mut self,
        name: &str,
        schema: &str,
        database: DatabaseId,
        row_count: Option<u64>,
        kind: TableKind,
    ) -> TableId {
        let id = TableId(self.tables.len());
        self.tables.push(Table {
            name: name.to_string(),
            original_name: name.to_string(),
            schema: schema.to_string(),
            row_count,
            database,
            columns: Vec::new(),
            relations: Vec::new(),
            constraints: Constraints::default(),
            kind,
        });
        self.members.push(id);
        id
    }

    /// Append a column to `table`. The ordinal is its 1-based position.
    pub fn add_column(&mut self, table: TableId, original_name: &str) -> ColumnId {
        let id = ColumnId(self.columns.len());
        let owner = &mut self.tables[table.0];
        let ordinal = owner.columns.len() + 1;
        let source = SourceColumn {
            database: owner.database,
            schema: owner.schema.clone(),
            table: owner.original_name.clone(),
            column: original_name.to_string(),
            ordinal,
        };
        owner.columns.push(id);
        self.columns.push(Column {
            ordinal,
            original_name: original_name.to_string(),
            table,
            origin_table: table,
            source,
            names: Vec::new(),
            datatypes: Vec::new(),
        });
        id
    }

    /// Append a column with one name and one datatype candidate.
    pub fn add_typed_column(
        &mut self,
        table: TableId,
        name: &str,
        datatype: DataType,
        confidence: f64,
    ) -> ColumnId {
        let id = self.add_column(table, name);
        let column = &mut self.columns[id.0];
        column.add_name_candidate(name, confidence);
        column.add_datatype_candidate(datatype, confidence);
        id
    }

    /// Move a column to another table, keeping its exclusive owner pointer
    /// consistent.
    pub fn move_column(&mut self, column: ColumnId, to: TableId) {
        let from = self.columns[column.0].table;
        self.tables[from.0].columns.retain(|c| *c != column);
        self.tables[to.0].columns.push(column);
        self.columns[column.0].table = to;
    }

    /// Add a relation and register it on both participating tables.
    pub fn add_relation(&mut self, relation: Relation) -> RelationId {
        let id = RelationId(self.relations.len());
        let (anchor, link) = (relation.anchor, relation.link);
        self.relations.push(relation);
        self.tables[anchor.0].relations.push(id);
        if link != anchor {
            self.tables[link.0].relations.push(id);
        }
        id
    }

    /// Drop `relation` from the relation list of `table` only.
    pub fn unlink_relation(&mut self, table: TableId, relation: RelationId) {
        self.tables[table.0].relations.retain(|r| *r != relation);
    }

    /// Remove a table from the member list; its arena entry stays.
    pub fn remove_table(&mut self, table: TableId) {
        self.members.retain(|t| *t != table);
    }

    /// Copy of this model restricted to `members`, under a new origin.
    pub fn restricted_to(&self, origin_id: OriginId, members: Vec<TableId>) -> CommonModel {
        let mut model = self.clone();
        model.origin_id = origin_id;
        model.suffix = String::new();
        model.members = members;
        model
    }

    /// Move every member table of `other` into this model, remapping handles.
    pub fn absorb(&mut self, other: CommonModel) {
        let table_offset = self.tables.len();
        let column_offset = self.columns.len();
        let relation_offset = self.relations.len();
        let t = |id: TableId| TableId(id.0 + table_offset);
        let c = |id: ColumnId| ColumnId(id.0 + column_offset);
        let r = |id: RelationId| RelationId(id.0 + relation_offset);

        for mut table in other.tables {
            table.columns = table.columns.into_iter().map(c).collect();
            table.relations = table.relations.into_iter().map(r).collect();
            for pk in &mut table.constraints.primary_keys {
                pk.value = pk.value.iter().copied().map(c).collect();
            }
            for unique in &mut table.constraints.uniques {
                unique.value = unique.value.iter().copied().map(c).collect();
            }
            for nn in &mut table.constraints.not_nullables {
                nn.value = c(nn.value);
            }
            if let TableKind::Combined { sources } = &mut table.kind {
                *sources = sources.iter().copied().map(t).collect();
            }
            self.tables.push(table);
        }
        for mut column in other.columns {
            column.table = t(column.table);
            column.origin_table = t(column.origin_table);
            self.columns.push(column);
        }
        for mut relation in other.relations {
            relation.anchor = t(relation.anchor);
            relation.link = t(relation.link);
            relation.anchor_columns = relation.anchor_columns.into_iter().map(c).collect();
            relation.link_columns = relation.link_columns.into_iter().map(c).collect();
            self.relations.push(relation);
        }
        self.members.extend(other.members.into_iter().map(t));
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Member tables in insertion order.
    pub fn table_ids(&self) -> &[TableId] {
        &self.members
    }

    pub fn tables(&self) -> impl Iterator<Item = (TableId, &Table)> + '_ {
        self.members.iter().map(move |id| (*id, &self.tables[id.0]))
    }

    pub fn table_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains_table(&self, table: TableId) -> bool {
        self.members.contains(&table)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }

    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.tables[id.0]
    }

    pub fn column(&self, id: ColumnId) -> &Column {
        &self.columns[id.0]
    }

    pub fn column_mut(&mut self, id: ColumnId) -> &mut Column {
        &mut self.columns[id.0]
    }

    pub fn relation(&self, id: RelationId) -> &Relation {
        &self.relations[id.0]
    }

    pub fn relation_mut(&mut self, id: RelationId) -> &mut Relation {
        &mut self.relations[id.0]
    }

    /// Columns of a table in order.
    pub fn columns_of(&self, table: TableId) -> impl Iterator<Item = (ColumnId, &Column)> + '_ {
        self.tables[table.0]
            .columns
            .iter()
            .map(move |id| (*id, &self.columns[id.0]))
    }

    /// Relations a table participates in, on either side.
    pub fn relations_of(
        &self,
        table: TableId,
    ) -> impl Iterator<Item = (RelationId, &Relation)> + '_ {
        self.tables[table.0]
            .relations
            .iter()
            .map(move |id| (*id, &self.relations[id.0]))
    }

    /// Every relation held by a member table, each listed once, in
    /// first-encountered order.
    pub fn distinct_relations(&self) -> Vec<RelationId> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();
        for table in &self.members {
            for rel in &self.tables[table.0].relations {
                if seen.insert(*rel) {
                    result.push(*rel);
                }
            }
        }
        result
    }

    pub fn has_relation_between(&self, a: TableId, b: TableId) -> bool {
        self.relations_of(a).any(|(_, r)| r.connects(a, b))
    }

    pub fn has_combined_tables(&self) -> bool {
        self.tables().any(|(_, t)| t.is_combined())
    }

    /// Member table by current name, case-insensitive.
    pub fn find_table(&self, name: &str) -> Option<TableId> {
        self.tables()
            .find(|(_, t)| t.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    /// Column of `table` by fused name, case-insensitive.
    pub fn find_column(&self, table: TableId, name: &str) -> Option<ColumnId> {
        self.columns_of(table)
            .find(|(_, c)| c.name().eq_ignore_ascii_case(name))
            .map(|(id, _)| id)
    }

    // ------------------------------------------------------------------
    // Derived column roles
    // ------------------------------------------------------------------

    pub fn is_primary_key(&self, column: ColumnId) -> bool {
        let owner = self.columns[column.0].table;
        self.tables[owner.0]
            .primary_key()
            .is_some_and(|pk| pk.value.contains(&column))
    }

    /// Column holds a reference to another table.
    pub fn is_foreign_key(&self, column: ColumnId) -> bool {
        let owner = self.columns[column.0].table;
        self.relations_of(owner)
            .any(|(_, r)| r.link == owner && r.link_columns.contains(&column))
    }

    pub fn is_key(&self, column: ColumnId) -> bool {
        self.is_primary_key(column) || self.is_foreign_key(column)
    }

    pub fn unique_for(&self, column: ColumnId) -> Option<Candidate<ColumnSet>> {
        let owner = self.columns[column.0].table;
        self.tables[owner.0].unique_for(column)
    }

    pub fn not_null_for(&self, column: ColumnId) -> Option<f64> {
        let owner = self.columns[column.0].table;
        self.tables[owner.0].not_null_for(column)
    }

    /// Number of columns per fused name, used to spot duplicates.
    pub fn name_counts(&self, table: TableId) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for (_, column) in self.columns_of(table) {
            *counts.entry(column.name()).or_insert(0) += 1;
        }
        counts
    }
}
