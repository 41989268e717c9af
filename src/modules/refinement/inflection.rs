//! Singular forms of table names, for matching `<Table>ID` style keys.
//!
//! Uses the `inflector` crate with a small table of irregular plurals that
//! turn up in database schemas.

use inflector::Inflector;

/// Irregular plurals inflector gets wrong for schema names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("half", "halves"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("diagnosis", "diagnoses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("status", "statuses"),
];

/// Singular form of `word`, keeping the original casing of regular words.
///
/// ```ignore
/// assert_eq!(singularize("Customers"), "Customer");
/// assert_eq!(singularize("People"), "person");
/// ```
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    word.to_singular()
}

/// True when `column` is the conventional key name of `table`: `<singular>ID`.
pub fn is_table_key_name(table: &str, column: &str) -> bool {
    let key = format!("{}id", singularize(table).to_lowercase());
    column.to_lowercase() == key
}
