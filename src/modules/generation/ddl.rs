//! CREATE TABLE script for a star model.
//!
//! The statements are built as small value types and rendered through
//! `Display`, in the bracket-quoted SQL Server style the ETL script also
//! uses.
//!
//! ```text
//! CREATE TABLE [Dim_Customer] (
//!     [SurKey] int IDENTITY(1,1) NOT NULL,
//!     [Name] nvarchar(60) NULL,
//!     CONSTRAINT [PK_Dim_Customer] PRIMARY KEY ([SurKey])
//! );
//! ```

use std::fmt;

use tracing::debug;

use crate::model::{DataType, StarModel, StarTableId, TypeTag};
use crate::modules::ModuleResult;

use super::Artifact;

const DEFAULT_LENGTH: u32 = 255;
const DEFAULT_PRECISION: u32 = 10;
const DEFAULT_SCALE: u32 = 3;

/// Bracket-quote an identifier.
pub fn quote(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn quote_list(names: &[String]) -> String {
    names.iter().map(|n| quote(n)).collect::<Vec<_>>().join(", ")
}

/// SQL Server type for a model datatype.
pub fn sql_type(datatype: &DataType) -> String {
    let length = datatype.length.unwrap_or(DEFAULT_LENGTH);
    let precision = datatype.precision.unwrap_or(DEFAULT_PRECISION);
    let scale = datatype.scale.unwrap_or(DEFAULT_SCALE);
    match datatype.tag {
        TypeTag::BigInt | TypeTag::UnsignedBigInt => "bigint".into(),
        TypeTag::Integer | TypeTag::UnsignedInt => "int".into(),
        TypeTag::SmallInt | TypeTag::UnsignedSmallInt => "smallint".into(),
        TypeTag::TinyInt | TypeTag::UnsignedTinyInt => "tinyint".into(),
        TypeTag::Boolean => "bit".into(),
        TypeTag::Currency => "money".into(),
        TypeTag::Single => "real".into(),
        TypeTag::Double => "float".into(),
        TypeTag::Decimal => format!("decimal({precision}, {scale})"),
        TypeTag::Numeric => format!("numeric({precision}, {scale})"),
        TypeTag::Date | TypeTag::DbDate | TypeTag::DbTimeStamp => "datetime2".into(),
        TypeTag::DbTime => "time".into(),
        TypeTag::Char => format!("char({length})"),
        TypeTag::VarChar => format!("varchar({length})"),
        TypeTag::LongVarChar => "varchar(max)".into(),
        TypeTag::WChar => format!("nchar({length})"),
        TypeTag::VarWChar => format!("nvarchar({length})"),
        TypeTag::LongVarWChar => "nvarchar(max)".into(),
        TypeTag::Binary => format!("binary({length})"),
        TypeTag::VarBinary => format!("varbinary({length})"),
        TypeTag::LongVarBinary => "varbinary(max)".into(),
        TypeTag::Guid => "uniqueidentifier".into(),
        TypeTag::Bstr | TypeTag::Unknown => "ntext".into(),
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub identity: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            identity: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// `IDENTITY(1,1)`.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote(&self.name), self.data_type)?;
        if self.identity {
            f.write_str(" IDENTITY(1,1)")?;
        }
        f.write_str(if self.nullable { " NULL" } else { " NOT NULL" })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn primary_key(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        if !self.primary_key.is_empty() {
            lines.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                quote(&format!("PK_{}", self.name)),
                quote_list(&self.primary_key)
            ));
        }
        writeln!(f, "CREATE TABLE {} (", quote(&self.name))?;
        writeln!(f, "    {}", lines.join(",\n    "))?;
        f.write_str(");")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
            quote(&self.table),
            quote(&self.name),
            quote_list(&self.columns),
            quote(&self.referenced_table),
            quote_list(&self.referenced_columns)
        )
    }
}

// ============================================================================
// Module
// ============================================================================

/// Tables the scripts create: the fact and every actual dimension.
pub fn physical_tables(star: &StarModel) -> Vec<StarTableId> {
    std::iter::once(star.fact())
        .chain(
            star.dimensions()
                .iter()
                .copied()
                .filter(|d| !star.table(*d).is_role_playing()),
        )
        .collect()
}

fn create_table(star: &StarModel, table: StarTableId) -> CreateTable {
    let entry = star.table(table);
    let mut statement = CreateTable::new(entry.name.clone());
    let mut keys = Vec::new();
    for (id, column) in star.columns_of(table) {
        let mut def = ColumnDef::new(column.name.clone(), sql_type(&column.datatype));
        if column.is_key() || entry.constraints.not_nullables.contains(&id) {
            def = def.not_null();
        }
        if column.is_surrogate_key() {
            def = def.identity();
        }
        if column.is_key() {
            keys.push(column.name.clone());
        }
        statement = statement.column(def);
    }
    statement.primary_key(keys)
}

fn foreign_keys(star: &StarModel, table: StarTableId) -> Vec<ForeignKey> {
    let link_name = &star.table(table).name;
    star.relations_of(table)
        .filter(|(_, r)| r.link == table)
        .filter_map(|(_, relation)| {
            if relation.link_columns.is_empty()
                || relation.link_columns.len() != relation.anchor_columns.len()
            {
                debug!(table = %link_name, "relation without matching key columns, no foreign key");
                return None;
            }
            let anchor = star.table(star.actual(relation.anchor));
            let columns: Vec<String> = relation
                .link_columns
                .iter()
                .map(|c| star.column(*c).name.clone())
                .collect();
            let name = if anchor.kind.is_calendar() {
                format!("FK_{}_{}_{}", link_name, columns[0], anchor.name)
            } else {
                format!("FK_{}_{}", link_name, anchor.name)
            };
            Some(ForeignKey {
                name,
                table: link_name.clone(),
                columns,
                referenced_table: anchor.name.clone(),
                referenced_columns: relation
                    .anchor_columns
                    .iter()
                    .map(|c| star.column(*c).name.clone())
                    .collect(),
            })
        })
        .collect()
}

/// Emits `DW_<Fact>.sql`: one CREATE TABLE per physical table, then the
/// foreign keys.
#[derive(Debug, Clone, Default)]
pub struct CreateScript;

impl CreateScript {
    pub fn generate(&self, star: &StarModel) -> ModuleResult<Artifact> {
        let tables = physical_tables(star);
        let mut statements: Vec<String> = tables
            .iter()
            .map(|t| create_table(star, *t).to_string())
            .collect();
        statements.extend(
            tables
                .iter()
                .flat_map(|t| foreign_keys(star, *t))
                .map(|fk| fk.to_string()),
        );
        Ok(Artifact {
            file_name: format!("DW_{}.sql", star.table(star.fact()).name),
            content: statements.join("\n\n") + "\n",
        })
    }
}
