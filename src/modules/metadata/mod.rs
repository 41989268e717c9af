//! Schema extraction and data sampling.
//!
//! An [`InferenceModule`] turns a connection into a [`CommonModel`] and later
//! serves data samples for the columns it produced. The [`SampleDirectory`]
//! remembers which module owns which database, so later phases can sample a
//! column from its [`SourceColumn`] locator alone.

mod flat_file;

pub use flat_file::CsvInference;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::graph::{CapabilitySet, RelationalCapability};
use crate::model::{CommonModel, Database, DatabaseId, OriginId, SourceColumn};

/// Errors raised by source connectors and the sample directory.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("No inference module for source type: {0}")]
    UnsupportedSource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse source data: {0}")]
    Parse(String),

    #[error("Unknown database: {0}")]
    UnknownDatabase(DatabaseId),

    #[error("Database already registered: {0}")]
    DuplicateDatabase(DatabaseId),

    #[error("Sampled columns span several databases")]
    MixedDatabases,

    #[error("Sampled columns span several tables")]
    MixedTables,

    #[error("Column {column} not found in {table}")]
    UnknownColumn { table: String, column: String },
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// A connector that extracts schemas and serves data samples.
#[async_trait]
pub trait InferenceModule: Send + Sync {
    /// Stable registry key.
    fn key(&self) -> &'static str;

    /// Source type this module serves, matched case-insensitively.
    fn source_type(&self) -> &str;

    /// Relational capabilities already present in extracted schemas.
    fn provides(&self) -> CapabilitySet<RelationalCapability>;

    /// Human-readable database name for a connection.
    fn database_name(&self, connection_string: &str) -> String {
        connection_string.to_string()
    }

    async fn is_valid_connection(&self, connection_string: &str) -> bool;

    /// Extract the schema of `database` as a model under `origin`.
    async fn schema(&self, database: &Database, origin: OriginId) -> ConnectorResult<CommonModel>;

    /// Up to `amount` values of one column.
    async fn column_sample(
        &self,
        database: &Database,
        column: &SourceColumn,
        amount: usize,
    ) -> ConnectorResult<Vec<String>>;

    /// Up to `amount` rows restricted to `columns`, all from one table.
    async fn row_sample(
        &self,
        database: &Database,
        columns: &[SourceColumn],
        amount: usize,
    ) -> ConnectorResult<Vec<Vec<String>>>;
}

struct Registration {
    database: Database,
    module: Arc<dyn InferenceModule>,
}

/// Maps registered databases to the module that can sample them.
#[derive(Default)]
pub struct SampleDirectory {
    entries: BTreeMap<DatabaseId, Registration>,
}

impl SampleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        database: Database,
        module: Arc<dyn InferenceModule>,
    ) -> ConnectorResult<()> {
        if self.entries.contains_key(&database.id) {
            return Err(ConnectorError::DuplicateDatabase(database.id));
        }
        self.entries
            .insert(database.id, Registration { database, module });
        Ok(())
    }

    pub fn database(&self, id: DatabaseId) -> Option<&Database> {
        self.entries.get(&id).map(|r| &r.database)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, id: DatabaseId) -> ConnectorResult<&Registration> {
        self.entries
            .get(&id)
            .ok_or(ConnectorError::UnknownDatabase(id))
    }

    pub async fn column_sample(
        &self,
        column: &SourceColumn,
        amount: usize,
    ) -> ConnectorResult<Vec<String>> {
        let reg = self.lookup(column.database)?;
        reg.module
            .column_sample(&reg.database, column, amount)
            .await
    }

    /// Rows over several columns; every column must come from one database.
    pub async fn row_sample(
        &self,
        columns: &[SourceColumn],
        amount: usize,
    ) -> ConnectorResult<Vec<Vec<String>>> {
        let Some(first) = columns.first() else {
            return Ok(Vec::new());
        };
        if columns.iter().any(|c| c.database != first.database) {
            return Err(ConnectorError::MixedDatabases);
        }
        let reg = self.lookup(first.database)?;
        reg.module.row_sample(&reg.database, columns, amount).await
    }
}

impl std::fmt::Debug for SampleDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(id, r)| (id, (&r.database.name, r.module.key()))),
            )
            .finish()
    }
}

/// Built-in inference modules, keyed by registry key.
pub fn builtin_inference_modules(
    settings: &crate::config::CsvSettings,
) -> Vec<Arc<dyn InferenceModule>> {
    vec![Arc::new(CsvInference::new(settings.clone()))]
}
