//! Join ordering for multi-table projections.
//!
//! Given the physical tables a projection reads from, produce a FROM table
//! and a join sequence where every table is joined only after a table it
//! relates to has already appeared.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::{CommonModel, RelationId, TableId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinPathError {
    #[error("No tables to project")]
    Empty,

    #[error("Relations between the projected tables form a cycle")]
    Cyclic,
}

/// One joined table and the relations tying it to earlier tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStep {
    pub table: TableId,
    /// Empty when the table shares no relation with any earlier table.
    pub relations: Vec<RelationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    pub from: TableId,
    pub joins: Vec<JoinStep>,
}

impl JoinPlan {
    pub fn is_direct(&self) -> bool {
        self.joins.is_empty()
    }

    /// Every table of the plan in join order.
    pub fn tables(&self) -> Vec<TableId> {
        std::iter::once(self.from)
            .chain(self.joins.iter().map(|j| j.table))
            .collect()
    }
}

/// Plan the joins over `tables`, deduplicated and in first-seen order.
///
/// Relations are edges `link -> anchor`; the topological order therefore
/// starts from tables holding foreign keys and walks towards the tables
/// they reference. Tables are then pulled forward so that no table is
/// cross joined while a related one is still waiting. Self relations are
/// ignored.
pub fn plan_joins(model: &CommonModel, tables: &[TableId]) -> Result<JoinPlan, JoinPathError> {
    let mut distinct: Vec<TableId> = Vec::new();
    for t in tables {
        if !distinct.contains(t) {
            distinct.push(*t);
        }
    }
    let Some(first) = distinct.first().copied() else {
        return Err(JoinPathError::Empty);
    };
    if distinct.len() == 1 {
        return Ok(JoinPlan {
            from: first,
            joins: Vec::new(),
        });
    }

    let mut graph: DiGraph<TableId, RelationId> = DiGraph::new();
    let nodes: HashMap<TableId, NodeIndex> =
        distinct.iter().map(|t| (*t, graph.add_node(*t))).collect();

    let mut seen = BTreeSet::new();
    for table in &distinct {
        for (rel_id, rel) in model.relations_of(*table) {
            if rel.is_self_relation() || !seen.insert(rel_id) {
                continue;
            }
            if let (Some(link), Some(anchor)) = (nodes.get(&rel.link), nodes.get(&rel.anchor)) {
                graph.add_edge(*link, *anchor, rel_id);
            }
        }
    }

    let order = toposort(&graph, None).map_err(|_| JoinPathError::Cyclic)?;
    let ordered = connected_order(model, &seen, order.into_iter().map(|n| graph[n]).collect());

    let mut joins = Vec::new();
    for (i, table) in ordered.iter().enumerate().skip(1) {
        let earlier = &ordered[..i];
        let relations = seen
            .iter()
            .copied()
            .filter(|r| {
                let rel = model.relation(*r);
                rel.other_side(*table)
                    .is_some_and(|other| other != *table && earlier.contains(&other))
            })
            .collect();
        joins.push(JoinStep {
            table: *table,
            relations,
        });
    }

    Ok(JoinPlan {
        from: ordered[0],
        joins,
    })
}

/// Reorder `topological` so each table follows one it shares a relation
/// with whenever such a table exists. Among the candidates the earliest in
/// topological order wins; a table with no placed neighbour is only taken
/// when nothing else connects.
fn connected_order(
    model: &CommonModel,
    relations: &BTreeSet<RelationId>,
    topological: Vec<TableId>,
) -> Vec<TableId> {
    let mut remaining = topological;
    let mut placed = Vec::with_capacity(remaining.len());
    if remaining.is_empty() {
        return placed;
    }
    placed.push(remaining.remove(0));

    while !remaining.is_empty() {
        let connected = remaining.iter().position(|table| {
            relations.iter().any(|r| {
                model
                    .relation(*r)
                    .other_side(*table)
                    .is_some_and(|other| other != *table && placed.contains(&other))
            })
        });
        placed.push(remaining.remove(connected.unwrap_or(0)));
    }
    placed
}
