//! Table combination: merge thin link tables into their anchor.
//!
//! A link table with no descriptive columns and few keys and numerics is
//! usually a bridge (an order line between orders and products). Merging it
//! into its anchor gives the fact-discovery phase a wider candidate. The
//! source model is kept; every merge produces a new permutation under the
//! same origin, told apart by a letter suffix.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, error, warn};

use crate::model::{Cardinality, CommonModel, OriginId, Relation, RelationId, TableId};
use crate::modules::metadata::SampleDirectory;

const MAX_KEYS: usize = 3;
const MAX_NUMERICS: usize = 3;

/// Per-origin counters handing out `.A`, `.B`, ... permutation suffixes.
#[derive(Debug, Default)]
pub struct PermutationSuffixes {
    counters: HashMap<OriginId, u32>,
}

impl PermutationSuffixes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, origin: OriginId) -> String {
        let counter = self.counters.entry(origin).or_insert(0);
        let n = *counter;
        *counter += 1;
        format!(".{}", suffix_letters(n))
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`.
fn suffix_letters(mut n: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Column profile of a link table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkProfile {
    pub keys: usize,
    pub numerics: usize,
    pub descriptive: usize,
}

impl LinkProfile {
    pub fn of(model: &CommonModel, table: TableId) -> Self {
        let mut profile = LinkProfile::default();
        for (id, column) in model.columns_of(table) {
            if model.is_key(id) {
                profile.keys += 1;
            } else if column.datatype().is_numeric() {
                profile.numerics += 1;
            } else {
                profile.descriptive += 1;
            }
        }
        profile
    }

    pub fn is_thin(&self) -> bool {
        self.descriptive == 0 && self.numerics <= MAX_NUMERICS && self.keys <= MAX_KEYS
    }
}

/// Number of many-to-one references `table` itself holds to other tables.
fn outgoing_many_to_one(model: &CommonModel, table: TableId) -> usize {
    model
        .relations_of(table)
        .filter(|(_, r)| {
            r.cardinality == Cardinality::ManyToOne && r.link == table && !r.is_self_relation()
        })
        .count()
}

/// The `combine_tables` module.
#[derive(Debug, Clone, Default)]
pub struct CombineTables;

impl CombineTables {
    /// Relations whose link table should be merged into its anchor.
    pub fn candidates(&self, model: &CommonModel) -> Vec<RelationId> {
        model
            .distinct_relations()
            .into_iter()
            .filter(|id| {
                let relation = model.relation(*id);
                !relation.is_self_relation()
                    && model.contains_table(relation.link)
                    && model.contains_table(relation.anchor)
                    && LinkProfile::of(model, relation.link).is_thin()
                    && outgoing_many_to_one(model, relation.anchor) >= 1
            })
            .collect()
    }

    /// The source model followed by one permutation per merge.
    pub async fn combine(
        &self,
        model: CommonModel,
        samples: &SampleDirectory,
        suffixes: &mut PermutationSuffixes,
    ) -> Vec<CommonModel> {
        let candidates = self.candidates(&model);
        let mut permutations = Vec::with_capacity(candidates.len() + 1);
        for relation in candidates {
            let mut permutation = model.clone();
            permutation.set_suffix(suffixes.next(model.origin_id()));
            let rows = joined_row_count(&permutation, relation, samples).await;
            merge(&mut permutation, relation, rows);
            debug!(model = %permutation.label(), "combined tables");
            permutations.push(permutation);
        }
        permutations.insert(0, model);
        permutations
    }
}

/// Inner-join row count of a single-column relation, from full samples.
async fn joined_row_count(
    model: &CommonModel,
    relation: RelationId,
    samples: &SampleDirectory,
) -> Option<u64> {
    let relation = model.relation(relation);
    if relation.anchor_columns.len() != 1 || relation.link_columns.len() != 1 {
        return None;
    }

    let amount = |table: TableId| {
        model
            .table(table)
            .row_count
            .and_then(|r| usize::try_from(r).ok())
            .unwrap_or(usize::MAX)
    };
    let link_source = model.column(relation.link_columns[0]).source().clone();
    let anchor_source = model.column(relation.anchor_columns[0]).source().clone();

    let link_values = samples.column_sample(&link_source, amount(relation.link)).await;
    let anchor_values = samples
        .column_sample(&anchor_source, amount(relation.anchor))
        .await;
    match (link_values, anchor_values) {
        (Ok(link_values), Ok(anchor_values)) => Some(count_join(&link_values, &anchor_values)),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "could not count joined rows");
            None
        }
    }
}

fn count_join(link: &[String], anchor: &[String]) -> u64 {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in anchor.iter().filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    link.iter()
        .filter_map(|v| counts.get(v.as_str()))
        .sum()
}

/// Merge the link table of `relation` into its anchor inside `model`.
fn merge(model: &mut CommonModel, relation_id: RelationId, row_count: Option<u64>) {
    let relation = model.relation(relation_id).clone();
    let (link, anchor) = (relation.link, relation.anchor);
    let name = format!("{}_{}", model.table(link).name, model.table(anchor).name);
    let schema = model.table(link).schema.clone();
    let database = model.table(link).database();

    let combined = model.add_combined_table(&name, &schema, database, row_count, vec![link, anchor]);

    // Constraints
    let mut not_nulls = Vec::new();
    let mut uniques = Vec::new();
    let mut primary_keys = Vec::new();
    for source in [link, anchor] {
        let constraints = model.table(source).constraints();
        not_nulls.extend(constraints.not_nullables.iter().cloned());
        uniques.extend(constraints.uniques.iter().cloned());
        primary_keys.extend(model.table(source).primary_key());
    }
    let target = model.table_mut(combined);
    for candidate in not_nulls {
        target.add_not_null_candidate(candidate.value, candidate.confidence);
    }
    for candidate in uniques {
        target.add_unique_candidate(candidate.value, candidate.confidence);
    }
    for candidate in primary_keys {
        target.add_primary_key_candidate(candidate.value, candidate.confidence);
    }

    // Columns: anchor first, then link without the duplicated key columns
    let anchor_columns = model.table(anchor).columns().to_vec();
    let link_columns: Vec<_> = model
        .table(link)
        .columns()
        .iter()
        .copied()
        .filter(|c| !relation.link_columns.contains(c))
        .collect();
    for column in anchor_columns.into_iter().chain(link_columns) {
        model.move_column(column, combined);
    }

    // Relations to third tables move onto the combined table
    let mut redirected: BTreeMap<TableId, usize> = BTreeMap::new();
    let held: Vec<(RelationId, Relation)> = model
        .relations_of(link)
        .chain(model.relations_of(anchor))
        .filter(|(id, _)| *id != relation_id)
        .map(|(id, r)| (id, r.clone()))
        .collect();
    let mut seen = Vec::new();
    for (old_id, old) in held {
        if seen.contains(&old_id) {
            continue;
        }
        seen.push(old_id);

        let merged = |t: TableId| t == link || t == anchor;
        if merged(old.anchor) && merged(old.link) {
            continue;
        }
        let (third, replacement) = if merged(old.link) {
            (
                old.anchor,
                Relation::new(old.anchor, combined, old.anchor_columns, old.link_columns, old.cardinality),
            )
        } else {
            (
                old.link,
                Relation::new(combined, old.link, old.anchor_columns, old.link_columns, old.cardinality),
            )
        };
        model.unlink_relation(third, old_id);
        model.add_relation(replacement);
        *redirected.entry(third).or_insert(0) += 1;
    }

    for (third, count) in redirected {
        if count > 1 {
            error!(
                table = %model.table(third).name,
                link = %model.table(link).name,
                anchor = %model.table(anchor).name,
                relations = count,
                "combined table has a double connection to a third table"
            );
        }
    }

    model.remove_table(link);
    model.remove_table(anchor);
}

/// All combination modules.
#[derive(Debug, Clone)]
pub enum CombinationModule {
    CombineTables(CombineTables),
}

impl CombinationModule {
    pub const KEYS: &'static [&'static str] = &["combine_tables"];

    pub fn key(&self) -> &'static str {
        match self {
            CombinationModule::CombineTables(_) => "combine_tables",
        }
    }

    pub async fn combine(
        &self,
        model: CommonModel,
        samples: &SampleDirectory,
        suffixes: &mut PermutationSuffixes,
    ) -> Vec<CommonModel> {
        match self {
            CombinationModule::CombineTables(m) => m.combine(model, samples, suffixes).await,
        }
    }
}
