//! Dimension discovery.
//!
//! Dimension modules attach dimensions and classify columns of a star
//! model's fact. They declare [`StarCapability`] contracts and run in
//! dependency order, like the relational refinement modules.

use crate::graph::{CapabilitySet, Dependent, StarCapability};
use crate::model::{
    Cardinality, CommonModel, StarColumnSpec, StarColumnType, StarModel, StarRelation,
    StarTableKind, TableId,
};
use crate::modules::ModuleResult;

/// Anchors of the many-to-one references `table` holds, self references
/// excluded.
fn referenced_tables(model: &CommonModel, table: TableId) -> Vec<TableId> {
    model
        .relations_of(table)
        .filter(|(_, r)| {
            r.link == table && r.cardinality == Cardinality::ManyToOne && r.anchor != table
        })
        .map(|(_, r)| r.anchor)
        .collect()
}

/// Makes every table the fact references a dimension and folds tables those
/// dimensions reference into them, prefixed by table name.
#[derive(Debug, Clone, Default)]
pub struct FlattenDimensions;

impl FlattenDimensions {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let fact = star.fact();
        if star.dimensions().is_empty() {
            let Some(fact_ref) = star.fact_table_ref() else {
                return Ok(());
            };
            for anchor in referenced_tables(star.origin(), fact_ref) {
                let dimension = star.table_from_relational(anchor, StarTableKind::Dimension);
                star.push_dimension(dimension);
            }
        }

        for dimension in star.dimensions().to_vec() {
            let Some(table_ref) = star.table(dimension).table_ref() else {
                continue;
            };
            let columns = flatten(star.origin(), table_ref, &mut vec![table_ref]);
            for spec in columns {
                star.push_column(dimension, spec);
            }
        }

        star.clear_relations(fact);
        for dimension in star.dimensions().to_vec() {
            star.add_relation(StarRelation::between(dimension, fact, Cardinality::ManyToOne));
        }
        Ok(())
    }
}

/// Columns of every table transitively referenced from `table`, each named
/// `<Table>_<Column>`.
fn flatten(model: &CommonModel, table: TableId, visited: &mut Vec<TableId>) -> Vec<StarColumnSpec> {
    let mut columns = Vec::new();
    for anchor in referenced_tables(model, table) {
        if visited.contains(&anchor) {
            continue;
        }
        visited.push(anchor);
        let anchor_name = model.table(anchor).name.clone();

        for mut inner in flatten(model, anchor, visited) {
            inner.name = format!("{anchor_name}_{}", inner.name);
            columns.push(inner);
        }
        for (id, column) in model.columns_of(anchor) {
            columns.push(
                StarColumnSpec::new(format!("{anchor_name}_{}", column.name()), column.datatype())
                    .derived_from(id),
            );
        }
    }
    columns
}

/// Marks not-null fact columns that reference no dimension as measures.
#[derive(Debug, Clone, Default)]
pub struct Measures;

impl Measures {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let fact = star.fact();
        let dimension_tables: Vec<TableId> = star
            .dimensions()
            .iter()
            .filter_map(|d| star.table(*d).table_ref())
            .collect();

        let measures: Vec<_> = star
            .columns_of(fact)
            .map(|(id, _)| id)
            .filter(|id| star.source_not_null(*id))
            .filter(|id| !dimension_tables.iter().any(|t| star.source_references(*id, *t)))
            .collect();

        for id in measures {
            let column = star.column_mut(id);
            let flag = if column.datatype.is_numeric() {
                StarColumnType::NUMERIC_MEASURE
            } else {
                StarColumnType::DESCRIPTIVE_MEASURE
            };
            column.column_type.insert(flag);
        }
        Ok(())
    }
}

/// All dimension modules.
#[derive(Debug, Clone)]
pub enum DimensionModule {
    FlattenDimensions(FlattenDimensions),
    Measures(Measures),
}

impl DimensionModule {
    pub const KEYS: &'static [&'static str] = &["flatten_dimensions", "measures"];

    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        match self {
            DimensionModule::FlattenDimensions(m) => m.refine(star),
            DimensionModule::Measures(m) => m.refine(star),
        }
    }
}

impl Dependent<StarCapability> for DimensionModule {
    fn key(&self) -> &'static str {
        match self {
            DimensionModule::FlattenDimensions(_) => "flatten_dimensions",
            DimensionModule::Measures(_) => "measures",
        }
    }

    fn requires(&self) -> CapabilitySet<StarCapability> {
        CapabilitySet::empty()
    }

    fn affects(&self) -> CapabilitySet<StarCapability> {
        match self {
            DimensionModule::FlattenDimensions(_) => CapabilitySet::of(&[StarCapability::Dimensions]),
            DimensionModule::Measures(_) => CapabilitySet::of(&[StarCapability::Measures]),
        }
    }
}
