//! Relation discovery and cardinality.

use tracing::debug;

use super::inflection::is_table_key_name;
use crate::model::{Cardinality, ColumnSet, CommonModel, Relation, TableId};
use crate::modules::ModuleResult;

const IDENTIFIER_WORDS: &[&str] = &["id", "no", "key"];

fn is_identifier(name: &str) -> bool {
    let lower = name.to_lowercase();
    IDENTIFIER_WORDS.iter().any(|w| lower.contains(w))
}

/// Resolves `Unknown` cardinalities from the link table's key candidates.
#[derive(Debug, Clone, Default)]
pub struct CardinalityInference;

impl CardinalityInference {
    pub fn refine(&self, model: &mut CommonModel) -> ModuleResult<()> {
        for id in model.distinct_relations() {
            let relation = model.relation(id);
            if relation.cardinality != Cardinality::Unknown {
                continue;
            }

            let link_columns: ColumnSet = relation.link_columns.iter().copied().collect();
            let constraints = model.table(relation.link).constraints();
            let keyed = constraints
                .uniques
                .iter()
                .chain(constraints.primary_keys.iter())
                .any(|c| c.value == link_columns);

            model.relation_mut(id).cardinality = if keyed {
                Cardinality::OneToOne
            } else {
                Cardinality::ManyToOne
            };
        }
        Ok(())
    }
}

/// Relations from `<Table>ID` naming between otherwise unrelated tables.
#[derive(Debug, Clone, Default)]
pub struct NameRelations;

impl NameRelations {
    pub fn refine(&self, model: &mut CommonModel) -> ModuleResult<()> {
        let tables = model.table_ids().to_vec();
        for (index, &t1) in tables.iter().enumerate() {
            for &t2 in &tables[index + 1..] {
                if t1 == t2 || model.has_relation_between(t1, t2) {
                    continue;
                }

                for relation in Self::candidates(model, t1, t2) {
                    debug!(
                        anchor = %model.table(relation.anchor).name,
                        link = %model.table(relation.link).name,
                        "relation from key naming"
                    );
                    model.add_relation(relation);
                }
            }
        }
        Ok(())
    }

    fn candidates(model: &CommonModel, t1: TableId, t2: TableId) -> Vec<Relation> {
        let t1_name = &model.table(t1).name;
        let t2_name = &model.table(t2).name;
        let mut found = Vec::new();

        for (c1, column1) in model.columns_of(t1) {
            let name1 = column1.name();
            if !is_identifier(&name1) {
                continue;
            }
            for (c2, column2) in model.columns_of(t2) {
                let name2 = column2.name();
                if !is_identifier(&name2) || !name1.eq_ignore_ascii_case(&name2) {
                    continue;
                }

                if is_table_key_name(t1_name, &name1) {
                    found.push(Relation::new(t1, t2, vec![c1], vec![c2], Cardinality::ManyToOne));
                } else if is_table_key_name(t2_name, &name2) {
                    found.push(Relation::new(t2, t1, vec![c2], vec![c1], Cardinality::ManyToOne));
                }
            }
        }
        found
    }
}
