//! Junk dimension extraction.

use crate::model::{
    Cardinality, DataType, StarColumnSpec, StarColumnType, StarModel, StarRelation, StarTableKind,
    TypeTag,
};
use crate::modules::ModuleResult;

use super::keys::surrogate_key_spec;

/// Moves the remaining descriptive fact columns into one `Junk_<Fact>`
/// dimension and replaces them with a single key.
#[derive(Debug, Clone, Default)]
pub struct JunkDimension;

impl JunkDimension {
    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let fact = star.fact();
        let descriptive: Vec<_> = star
            .columns_of(fact)
            .filter(|(_, c)| {
                c.datatype.is_string()
                    && !c.is_key()
                    && !c
                        .column_ref()
                        .is_some_and(|src| star.origin().is_foreign_key(src))
            })
            .map(|(id, _)| id)
            .collect();
        if descriptive.is_empty() {
            return Ok(());
        }

        let name = format!("Junk_{}", star.table(fact).name);
        let table_ref = star.fact_table_ref();
        let junk = star.add_table(name.clone(), StarTableKind::Junk, table_ref);
        let key = star.push_column(junk, surrogate_key_spec());
        for column in &descriptive {
            star.move_column(*column, junk);
        }
        {
            let constraints = &mut star.table_mut(junk).constraints;
            constraints.primary_key.push(key);
            constraints.not_nullables.push(key);
            constraints.uniques.push(descriptive);
        }
        star.push_dimension(junk);
        let remaining = star.column_ids(fact).to_vec();
        star.set_column_order(fact, remaining);

        let foreign = star.push_column(
            fact,
            StarColumnSpec::new(format!("{name}_Key"), DataType::new(TypeTag::Integer))
                .flags(StarColumnType::KEY),
        );
        let mut relation = StarRelation::between(junk, fact, Cardinality::ManyToOne);
        relation.anchor_columns.push(key);
        relation.link_columns.push(foreign);
        star.add_relation(relation);
        Ok(())
    }
}
