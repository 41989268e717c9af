//! Naming conventions for star tables and columns.

use std::collections::HashMap;

use crate::config::NamingSettings;
use crate::model::{StarModel, StarTableId};
use crate::modules::ModuleResult;

const NAME_PLACEHOLDER: &str = "%NAME%";

/// Prefix every column whose name occurs more than once in `table` with the
/// name of the relational table it came from.
pub fn rename_duplicate_columns(star: &mut StarModel, table: StarTableId) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, column) in star.columns_of(table) {
        *counts.entry(column.name.clone()).or_insert(0) += 1;
    }

    let renames: Vec<_> = star
        .columns_of(table)
        .filter(|(_, c)| counts.get(&c.name).copied().unwrap_or(0) > 1)
        .filter_map(|(id, c)| {
            let source = c.column_ref()?;
            let origin = star.origin();
            let owner = origin.column(source).origin_table();
            Some((id, format!("{}_{}", origin.table(owner).name, c.name)))
        })
        .collect();
    for (id, name) in renames {
        star.column_mut(id).name = name;
    }
}

/// Casing styles understood by [`format_name`].
pub fn change_casing(value: &str, casing: &str) -> String {
    match casing.to_lowercase().as_str() {
        "lowercase" => value.to_lowercase(),
        "uppercase" => value.to_uppercase(),
        "pascalcase" => pascal_case(value),
        "camelcase" => camel_case(value),
        _ => value.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Words split on spaces, each capitalised and joined. Inner casing is kept.
fn pascal_case(value: &str) -> String {
    if value.chars().count() < 2 {
        return value.to_uppercase();
    }
    value.split(' ').filter(|w| !w.is_empty()).map(capitalize).collect()
}

/// As [`pascal_case`] with the first word lowercased.
fn camel_case(value: &str) -> String {
    if value.chars().count() < 2 {
        return value.to_uppercase();
    }
    let mut words = value.split(' ').filter(|w| !w.is_empty());
    let Some(first) = words.next() else {
        return String::new();
    };
    std::iter::once(first.to_lowercase())
        .chain(words.map(capitalize))
        .collect()
}

/// Strip underscores, change casing, then substitute into `structure`.
pub fn format_name(name: &str, strip_underscore: bool, casing: &str, structure: &str) -> String {
    let name = if strip_underscore {
        name.replace('_', " ")
    } else {
        name.to_string()
    };
    structure.replace(NAME_PLACEHOLDER, &change_casing(&name, casing))
}

/// Applies [`NamingSettings`] to every table and column of a star model.
#[derive(Debug, Clone, Default)]
pub struct NamingConvention {
    settings: NamingSettings,
}

impl NamingConvention {
    pub fn new(settings: NamingSettings) -> Self {
        Self { settings }
    }

    pub fn refine(&self, star: &mut StarModel) -> ModuleResult<()> {
        let s = &self.settings;
        let fact = star.fact();
        for table in star.table_ids() {
            let structure = if table == fact {
                &s.fact_table_name_structure
            } else {
                &s.dimension_name_structure
            };
            let entry = star.table_mut(table);
            entry.name = format_name(&entry.name, s.table_strip_underscore, &s.table_name_casing, structure);

            // Roles share their columns with the actual dimension
            if star.table(table).is_role_playing() {
                continue;
            }
            rename_duplicate_columns(star, table);
            for column in star.column_ids(table).to_vec() {
                let entry = star.column_mut(column);
                entry.name = format_name(
                    &entry.name,
                    s.column_strip_underscore,
                    &s.column_name_casing,
                    &s.column_name_structure,
                );
            }
        }
        Ok(())
    }
}
