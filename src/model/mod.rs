//! Confidence-weighted relational model and the star model derived from it.

pub mod confidence;
pub mod datatype;
pub mod ids;
pub mod schema;
pub mod star;

pub use confidence::{fuse, fuse_by, mean_confidence, Candidate};
pub use datatype::{datatype_candidate_or_fallback, DataType, DataTypeError, TypeTag};
pub use ids::{
    ColumnId, DatabaseId, IdGenerator, OriginId, RelationId, StarColumnId, StarRelationId,
    StarTableId, TableId,
};
pub use schema::{
    Cardinality, Column, ColumnSet, CommonModel, Constraints, Database, Relation, SourceColumn,
    Table, TableKind,
};
pub use star::{
    DateGranularity, StarColumn, StarColumnSpec, StarColumnType, StarConstraints, StarModel,
    StarRelation, StarTable, StarTableKind, TimeGranularity,
};
