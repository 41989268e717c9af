//! CSV directory inference.
//!
//! A connection string names a directory; every `*.csv` file in it is one
//! table. Files carry no type information, so column types are guessed from
//! the first rows and folded with [`DataType::widen`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ConnectorError, ConnectorResult, InferenceModule};
use crate::config::CsvSettings;
use crate::graph::{CapabilitySet, RelationalCapability};
use crate::model::{CommonModel, DataType, Database, OriginId, SourceColumn, TypeTag};

const HEADER_CONFIDENCE: f64 = 1.0;
const GENERATED_NAME_CONFIDENCE: f64 = 0.01;
const DATATYPE_CONFIDENCE: f64 = 0.5;

static GROUPED_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("valid decimal regex")
});

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Inference module for directories of CSV files.
#[derive(Debug, Clone, Default)]
pub struct CsvInference {
    settings: CsvSettings,
}

/// A parsed file, split into an optional header and data rows.
struct CsvFile {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl CsvInference {
    pub fn new(settings: CsvSettings) -> Self {
        Self { settings }
    }

    fn delimiter(&self) -> ConnectorResult<u8> {
        u8::try_from(self.settings.delimiter).map_err(|_| {
            ConnectorError::Parse(format!(
                "delimiter '{}' is not a single byte",
                self.settings.delimiter
            ))
        })
    }

    async fn read_file(&self, path: &Path) -> ConnectorResult<CsvFile> {
        let bytes = tokio::fs::read(path).await?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter()?)
            .from_reader(bytes.as_slice());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ConnectorError::Parse(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if has_header(&rows, self.settings.rows_to_examine) {
            let header = rows.remove(0);
            Ok(CsvFile {
                header: Some(header),
                rows,
            })
        } else {
            Ok(CsvFile { header: None, rows })
        }
    }

    fn table_path(database: &Database, table: &str) -> PathBuf {
        Path::new(&database.connection_string).join(format!("{table}.csv"))
    }

    async fn csv_files(dir: &Path) -> ConnectorResult<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl InferenceModule for CsvInference {
    fn key(&self) -> &'static str {
        "csv"
    }

    fn source_type(&self) -> &str {
        "csv"
    }

    fn provides(&self) -> CapabilitySet<RelationalCapability> {
        CapabilitySet::of(&[RelationalCapability::Name, RelationalCapability::DataType])
    }

    fn database_name(&self, connection_string: &str) -> String {
        Path::new(connection_string)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| connection_string.to_string())
    }

    async fn is_valid_connection(&self, connection_string: &str) -> bool {
        tokio::fs::metadata(connection_string)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn schema(&self, database: &Database, origin: OriginId) -> ConnectorResult<CommonModel> {
        let dir = Path::new(&database.connection_string);
        let mut model = CommonModel::new(origin);

        for path in Self::csv_files(dir).await? {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let file = self.read_file(&path).await?;
            let examined = &file.rows[..file.rows.len().min(self.settings.rows_to_examine)];
            let datatypes = fold_column_types(examined, file.header.as_ref().map(Vec::len));

            let table = model.add_table(&name, "csv", database.id, Some(file.rows.len() as u64));
            for (i, datatype) in datatypes.into_iter().enumerate() {
                let header = file.header.as_ref().and_then(|h| h.get(i));
                let (column_name, confidence) = match header {
                    Some(h) => (h.clone(), HEADER_CONFIDENCE),
                    None => (format!("Column_{}", i + 1), GENERATED_NAME_CONFIDENCE),
                };
                let column = model.add_column(table, &column_name);
                let column = model.column_mut(column);
                column.add_name_candidate(column_name, confidence);
                column.add_datatype_candidate(datatype, DATATYPE_CONFIDENCE);
            }
            tracing::debug!(
                table = %name,
                rows = file.rows.len(),
                header = file.header.is_some(),
                "read csv table"
            );
        }

        Ok(model)
    }

    async fn column_sample(
        &self,
        database: &Database,
        column: &SourceColumn,
        amount: usize,
    ) -> ConnectorResult<Vec<String>> {
        let file = self
            .read_file(&Self::table_path(database, &column.table))
            .await?;
        let index = column.ordinal.saturating_sub(1);
        Ok(file
            .rows
            .iter()
            .take(amount)
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect())
    }

    async fn row_sample(
        &self,
        database: &Database,
        columns: &[SourceColumn],
        amount: usize,
    ) -> ConnectorResult<Vec<Vec<String>>> {
        let Some(first) = columns.first() else {
            return Ok(Vec::new());
        };
        if columns.iter().any(|c| c.table != first.table) {
            return Err(ConnectorError::MixedTables);
        }
        let file = self
            .read_file(&Self::table_path(database, &first.table))
            .await?;
        Ok(file
            .rows
            .iter()
            .take(amount)
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c.ordinal.saturating_sub(1)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect())
    }
}

// ============================================================================
// Type inference
// ============================================================================

/// First row is a header when it is all text while some later examined row
/// is not, or when it is the only row.
fn has_header(rows: &[Vec<String>], rows_to_examine: usize) -> bool {
    let examined = &rows[..rows.len().min(rows_to_examine)];
    let Some(first) = examined.first() else {
        return false;
    };
    let textual =
        |row: &Vec<String>| row.iter().all(|cell| infer_cell(cell).tag == TypeTag::VarWChar);
    (textual(first) && !examined.iter().all(textual)) || examined.len() == 1
}

/// Widen the per-cell types of every column over the examined rows.
///
/// A header-only file yields string columns.
fn fold_column_types(rows: &[Vec<String>], header_width: Option<usize>) -> Vec<DataType> {
    let width = rows
        .iter()
        .map(Vec::len)
        .chain(header_width)
        .max()
        .unwrap_or(0);
    if rows.is_empty() {
        return vec![DataType::new(TypeTag::VarWChar); width];
    }

    let mut types = vec![DataType::unknown(); width];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            types[i] = DataType::widen(&types[i], &infer_cell(cell));
        }
    }
    types
}

/// Guess the type of a single text cell.
pub fn infer_cell(value: &str) -> DataType {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return DataType::unknown();
    }
    let length = trimmed.chars().count() as u32;

    if trimmed.parse::<i32>().is_ok() {
        return DataType::new(TypeTag::Integer).with_length(length);
    }
    if trimmed.parse::<i64>().is_ok() {
        return DataType::new(TypeTag::BigInt).with_length(length);
    }
    if trimmed.bytes().any(|b| b.is_ascii_digit()) && trimmed.parse::<f64>().is_ok() {
        return DataType::new(TypeTag::Double).with_length(length.saturating_sub(1));
    }
    if GROUPED_DECIMAL.is_match(trimmed) {
        return DataType::new(TypeTag::Decimal).with_length(length.saturating_sub(1));
    }
    if is_temporal(trimmed) {
        return DataType::new(TypeTag::DbTimeStamp);
    }
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return DataType::new(TypeTag::Boolean);
    }
    DataType::new(TypeTag::VarWChar).with_length(length)
}

fn is_temporal(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
        || TIME_FORMATS
            .iter()
            .any(|f| NaiveTime::parse_from_str(value, f).is_ok())
}
