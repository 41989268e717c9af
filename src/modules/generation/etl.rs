//! ETL script: reload dimensions from their sources, then the fact.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use crate::graph::plan_joins;
use crate::model::{
    ColumnId, CommonModel, StarColumnId, StarModel, StarTableId, StarTableKind, TableId,
};
use crate::modules::{ModuleError, ModuleResult};

use super::alias::AliasContext;
use super::ddl::{physical_tables, quote};
use super::Artifact;

const MODULE: &str = "etl_script";

/// Source-side expressions of one statement and the physical tables they
/// read.
struct Sources<'a> {
    origin: &'a CommonModel,
    aliases: &'a mut AliasContext,
    used: Vec<TableId>,
}

impl<'a> Sources<'a> {
    fn new(origin: &'a CommonModel, aliases: &'a mut AliasContext) -> Self {
        Self {
            origin,
            aliases,
            used: Vec::new(),
        }
    }

    fn alias(&mut self, table: TableId) -> String {
        if !self.used.contains(&table) {
            self.used.push(table);
        }
        self.aliases
            .source(table, self.origin.table(table).original_name())
    }

    /// `alias.[column]` of a source column, in its physical table.
    fn column(&mut self, column: ColumnId) -> String {
        let origin = self.origin;
        let entry = origin.column(column);
        let alias = self.alias(entry.origin_table());
        format!("{alias}.{}", quote(&entry.source().column))
    }

    fn table_ref(&mut self, table: TableId) -> String {
        let origin = self.origin;
        let entry = origin.table(table);
        let alias = self.alias(table);
        format!(
            "{}.{} {alias}",
            quote(&entry.schema),
            quote(entry.original_name())
        )
    }

    /// FROM clause over every table used so far, outer-joined along the
    /// relations between them.
    fn from_clause(&mut self) -> ModuleResult<String> {
        let origin = self.origin;
        let plan = plan_joins(origin, &self.used.clone())?;
        let mut lines = vec![format!("FROM {}", self.table_ref(plan.from))];
        for step in plan.joins {
            let table = self.table_ref(step.table);
            let mut conditions = Vec::new();
            for rel in &step.relations {
                let relation = origin.relation(*rel);
                for (link, anchor) in relation.link_columns.iter().zip(&relation.anchor_columns) {
                    let link = self.column(*link);
                    let anchor = self.column(*anchor);
                    conditions.push(format!("{link} = {anchor}"));
                }
            }
            if conditions.is_empty() {
                lines.push(format!("CROSS JOIN {table}"));
            } else {
                lines.push(format!("FULL OUTER JOIN {table} ON {}", conditions.join(" AND ")));
            }
        }
        Ok(lines.join("\n"))
    }
}

fn equality(left: &str, right: &str, nullable: bool) -> String {
    if nullable {
        format!("({left} = {right} OR {left} IS NULL AND {right} IS NULL)")
    } else {
        format!("{left} = {right}")
    }
}

/// Column of a date or time dimension by position. These dimensions keep
/// their creation order: surrogate key first, then the calendar attributes.
fn calendar_column(star: &StarModel, dimension: StarTableId, position: usize) -> Option<String> {
    star.columns_of(dimension)
        .nth(position)
        .map(|(_, c)| quote(&c.name))
}

fn dimension_insert(
    star: &StarModel,
    dimension: StarTableId,
    aliases: &mut AliasContext,
) -> ModuleResult<Option<String>> {
    let columns: Vec<(String, ColumnId)> = star
        .columns_of(dimension)
        .filter(|(_, c)| !c.is_surrogate_key())
        .filter_map(|(_, c)| Some((c.name.clone(), c.column_ref()?)))
        .collect();
    if columns.is_empty() {
        return Ok(None);
    }

    let mut sources = Sources::new(star.origin(), aliases);
    let select: Vec<String> = columns
        .iter()
        .map(|(name, source)| format!("{} AS {}", sources.column(*source), quote(name)))
        .collect();
    let from = sources.from_clause()?;

    let table = quote(&star.table(dimension).name);
    let names: Vec<String> = columns.iter().map(|(n, _)| quote(n)).collect();
    let distinct = if star.table(dimension).kind.is_junk() {
        "DISTINCT "
    } else {
        ""
    };
    Ok(Some(format!(
        "DELETE FROM {table};\nINSERT INTO {table} ({})\nSELECT {distinct}{}\n{from};",
        names.join(", "),
        select.join(", ")
    )))
}

fn date_population(table: &str, year: i32) -> ModuleResult<String> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| ModuleError::failed(MODULE, format!("invalid year {year}")))?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| ModuleError::failed(MODULE, format!("invalid year {year}")))?;
    let table = quote(table);
    Ok(format!(
        "BEGIN TRANSACTION;
SET LANGUAGE british;

DECLARE @StartDate DATETIME = '{start}';
DECLARE @EndDate DATETIME = '{end}';
DECLARE @CurrentDate AS DATETIME = @StartDate;

DELETE FROM {table};
INSERT INTO {table} VALUES ('Unknown', 0, 'Unknown', 0, 0, 'Unknown', 0, 0, NULL);

WHILE @CurrentDate <= @EndDate
BEGIN
    INSERT INTO {table}
    SELECT
        CONVERT(char(10), @CurrentDate, 103),
        DATEPART(DD, @CurrentDate),
        DATENAME(DW, @CurrentDate),
        DATEPART(WW, @CurrentDate),
        DATEPART(MM, @CurrentDate),
        DATENAME(MM, @CurrentDate),
        DATEPART(YY, @CurrentDate),
        0,
        NULL;
    SET @CurrentDate = DATEADD(DD, 1, @CurrentDate);
END
COMMIT TRANSACTION;",
        start = start.format("%d/%m/%Y"),
        end = end.format("%d/%m/%Y"),
    ))
}

fn time_population(table: &str) -> String {
    let table = quote(table);
    format!(
        "BEGIN TRANSACTION;

DECLARE @CurrentTime DATETIME2 = '2000-01-01 00:00:00';
DECLARE @EndTime DATETIME2 = '2000-01-01 23:59:59';

DELETE FROM {table};

WHILE @CurrentTime <= @EndTime
BEGIN
    INSERT INTO {table}
    SELECT DATEPART(HH, @CurrentTime), DATEPART(MI, @CurrentTime), DATEPART(SS, @CurrentTime);
    SET @CurrentTime = DATEADD(SS, 1, @CurrentTime);
END
COMMIT TRANSACTION;"
    )
}

/// Join conditions between the fact's sources and one dimension.
fn dimension_conditions(
    star: &StarModel,
    link_columns: &[StarColumnId],
    dimension: StarTableId,
    alias: &str,
    sources: &mut Sources<'_>,
) -> Vec<String> {
    let actual = star.actual(dimension);
    let entry = star.table(actual);
    let nullable = |id: StarColumnId| !entry.constraints.not_nullables.contains(&id);
    let temporal_source = link_columns
        .first()
        .and_then(|c| star.column(*c).column_ref());

    match entry.kind {
        StarTableKind::Date(_) => {
            let (Some(source), Some(full_date)) = (temporal_source, calendar_column(star, actual, 1))
            else {
                return Vec::new();
            };
            vec![format!(
                "CONVERT(char(10), {}, 103) = {alias}.{full_date}",
                sources.column(source)
            )]
        }
        StarTableKind::Time(_) => {
            let Some(source) = temporal_source else {
                return Vec::new();
            };
            let expr = sources.column(source);
            ["HOUR", "MINUTE", "SECOND"]
                .iter()
                .enumerate()
                .filter_map(|(i, part)| {
                    let column = calendar_column(star, actual, i + 1)?;
                    Some(format!("DATEPART({part}, {expr}) = {alias}.{column}"))
                })
                .collect()
        }
        StarTableKind::Junk => star
            .columns_of(actual)
            .filter(|(_, c)| !c.is_key())
            .filter_map(|(id, c)| {
                let source = c.column_ref()?;
                let target = format!("{alias}.{}", quote(&c.name));
                Some(equality(&sources.column(source), &target, nullable(id)))
            })
            .collect(),
        StarTableKind::Fact | StarTableKind::Dimension => {
            let (Some(fact_ref), Some(dim_ref)) = (star.fact_table_ref(), entry.table_ref()) else {
                return Vec::new();
            };
            let origin = star.origin();
            let Some((_, relation)) = origin
                .relations_of(fact_ref)
                .find(|(_, r)| r.link == fact_ref && r.anchor == dim_ref)
            else {
                return Vec::new();
            };
            relation
                .link_columns
                .iter()
                .zip(&relation.anchor_columns)
                .filter_map(|(link, anchor)| {
                    let (id, column) = star
                        .columns_of(actual)
                        .find(|(_, c)| c.column_ref() == Some(*anchor))?;
                    let target = format!("{alias}.{}", quote(&column.name));
                    Some(equality(&sources.column(*link), &target, nullable(id)))
                })
                .collect()
        }
    }
}

fn fact_insert(star: &StarModel, aliases: &mut AliasContext) -> ModuleResult<String> {
    let fact = star.fact();
    let fact_ref = star
        .fact_table_ref()
        .ok_or_else(|| ModuleError::failed(MODULE, "fact table has no relational source"))?;

    let mut sources = Sources::new(star.origin(), aliases);
    let mut columns = Vec::new();
    let mut select = Vec::new();
    let mut joins = Vec::new();

    for (_, relation) in star.relations_of(fact).filter(|(_, r)| r.link == fact) {
        let dimension = relation.anchor;
        let name = star.table(star.actual(dimension)).name.clone();
        let alias = sources.aliases.star(dimension, &name);
        let conditions =
            dimension_conditions(star, &relation.link_columns, dimension, &alias, &mut sources);
        if conditions.is_empty() {
            debug!(dimension = %name, "no join condition towards dimension, skipped");
            continue;
        }
        for (link, anchor) in relation.link_columns.iter().zip(&relation.anchor_columns) {
            columns.push(quote(&star.column(*link).name));
            select.push(format!("{alias}.{}", quote(&star.column(*anchor).name)));
        }
        joins.push(format!(
            "INNER JOIN {} {alias} ON {}",
            quote(&name),
            conditions.join(" AND ")
        ));
    }

    for (_, column) in star.columns_of(fact).filter(|(_, c)| c.column_type.is_measure()) {
        if let Some(source) = column.column_ref() {
            columns.push(quote(&column.name));
            select.push(sources.column(source));
        }
    }

    if sources.used.is_empty() {
        for table in star.origin().columns_of(fact_ref).map(|(_, c)| c.origin_table()) {
            sources.alias(table);
        }
    }
    let from = sources.from_clause()?;

    let mut statement = format!(
        "INSERT INTO {} ({})\nSELECT {}\n{from}",
        quote(&star.table(fact).name),
        columns.join(", "),
        select.join(", ")
    );
    for join in joins {
        statement.push('\n');
        statement.push_str(&join);
    }
    statement.push(';');
    Ok(statement)
}

/// Emits `ETL_<Fact>.sql`.
///
/// The date dimension is populated for one calendar year, the current one
/// unless configured otherwise.
#[derive(Debug, Clone, Default)]
pub struct EtlScript {
    year: Option<i32>,
}

impl EtlScript {
    pub fn for_year(year: i32) -> Self {
        Self { year: Some(year) }
    }

    pub fn generate(&self, star: &StarModel, aliases: &mut AliasContext) -> ModuleResult<Artifact> {
        let fact_name = star.table(star.fact()).name.clone();
        let year = self.year.unwrap_or_else(|| Local::now().year());

        let mut scripts = vec![format!("TRUNCATE TABLE {};", quote(&fact_name))];
        for dimension in physical_tables(star).into_iter().skip(1) {
            let entry = star.table(dimension);
            let script = match entry.kind {
                StarTableKind::Date(_) => Some(date_population(&entry.name, year)?),
                StarTableKind::Time(_) => Some(time_population(&entry.name)),
                _ => dimension_insert(star, dimension, aliases)?,
            };
            match script {
                Some(script) => scripts.push(script),
                None => debug!(dimension = %entry.name, "dimension has no source columns"),
            }
        }
        scripts.push(fact_insert(star, aliases)?);

        Ok(Artifact {
            file_name: format!("ETL_{fact_name}.sql"),
            content: scripts.join("\n\n") + "\n",
        })
    }
}
