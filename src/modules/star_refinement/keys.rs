//! Key columns of the star: fact foreign keys, surrogate keys, and removal
//! of the relational foreign keys they replace.

use crate::model::{DataType, StarColumnSpec, StarColumnType, StarModel, StarTableId, TypeTag};
use crate::modules::ModuleResult;

pub const SURROGATE_KEY_NAME: &str = "SurKey";

/// Spec of an integer `SurKey` identity column.
pub fn surrogate_key_spec() -> StarColumnSpec {
    StarColumnSpec::new(SURROGATE_KEY_NAME, DataType::new(TypeTag::Integer))
        .flags(StarColumnType::KEY | StarColumnType::SURROGATE_KEY)
}

/// Synthesises an `<Anchor>_Key` column for every fact relation without link
/// columns. These columns become the fact's primary key.
#[derive(Debug, Clone, Default)]
pub struct FactRelationColumns;

impl FactRelationColumns {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let fact = star.fact();
        let pending: Vec<_> = star
            .relations_of(fact)
            .filter(|(_, r)| r.link == fact && r.link_columns.is_empty())
            .map(|(id, r)| (id, star.table(r.anchor).name.clone()))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let specs = pending
            .iter()
            .map(|(_, anchor)| {
                StarColumnSpec::new(format!("{anchor}_Key"), DataType::new(TypeTag::Integer))
                    .flags(StarColumnType::KEY)
            })
            .collect();
        let columns = star.insert_columns_front(fact, specs);

        for ((relation, _), column) in pending.iter().zip(&columns) {
            star.relation_mut(*relation).link_columns.push(*column);
        }
        star.table_mut(fact).constraints.primary_key = columns;
        Ok(())
    }
}

/// Prepends a `SurKey` to every dimension without a key column.
#[derive(Debug, Clone, Default)]
pub struct SurrogateKeys;

impl SurrogateKeys {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        for dimension in star.dimensions().to_vec() {
            if star.table(dimension).is_role_playing() || star.has_key(dimension) {
                continue;
            }
            add_surrogate_key(star, dimension);
        }
        Ok(())
    }
}

fn add_surrogate_key(star: &mut StarModel, table: StarTableId) {
    let key = star.insert_columns_front(table, vec![surrogate_key_spec()])[0];

    let missing: Vec<_> = star
        .relations_of(table)
        .filter(|(_, r)| r.anchor == table && r.anchor_columns.is_empty())
        .map(|(id, _)| id)
        .collect();
    for relation in missing {
        star.relation_mut(relation).anchor_columns.push(key);
    }

    let constraints = &mut star.table_mut(table).constraints;
    constraints.primary_key.push(key);
    constraints.not_nullables.push(key);
}

/// Drops columns copied from relational foreign keys of the fact and of
/// ordinary dimensions.
#[derive(Debug, Clone, Default)]
pub struct RemoveOldForeignKeys;

impl RemoveOldForeignKeys {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let tables: Vec<_> = star
            .table_ids()
            .into_iter()
            .filter(|t| {
                let table = star.table(*t);
                !table.kind.is_calendar() && !table.is_role_playing()
            })
            .collect();

        for table in tables {
            let Some(table_ref) = star.table(table).table_ref() else {
                continue;
            };
            let foreign: Vec<_> = star
                .origin()
                .relations_of(table_ref)
                .filter(|(_, r)| r.link == table_ref)
                .flat_map(|(_, r)| r.link_columns.iter().copied())
                .collect();
            let doomed: Vec<_> = star
                .columns_of(table)
                .filter(|(_, c)| c.column_ref().is_some_and(|src| foreign.contains(&src)))
                .map(|(id, _)| id)
                .collect();
            for column in doomed {
                star.remove_column(column);
            }
        }
        Ok(())
    }
}
