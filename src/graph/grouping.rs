//! Split a relational model into its connected components.
//!
//! Tables are vertices, relations are undirected edges. Each component
//! becomes its own `CommonModel` with a fresh origin, so schemas unrelated by
//! foreign keys are never analysed as one star.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Dfs;

use crate::model::{CommonModel, IdGenerator, TableId};

/// Member tables of `model` partitioned into connected components.
///
/// Components are listed in order of their first member, and tables inside a
/// component keep the model's member order.
pub fn connected_components(model: &CommonModel) -> Vec<Vec<TableId>> {
    let mut graph: UnGraph<TableId, ()> = UnGraph::new_undirected();
    let mut index: HashMap<TableId, NodeIndex> = HashMap::new();
    for table in model.table_ids() {
        index.insert(*table, graph.add_node(*table));
    }

    for rel_id in model.distinct_relations() {
        let rel = model.relation(rel_id);
        if let (Some(a), Some(b)) = (index.get(&rel.anchor), index.get(&rel.link)) {
            graph.add_edge(*a, *b, ());
        }
    }

    let position: HashMap<TableId, usize> = model
        .table_ids()
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, i))
        .collect();

    let mut visited = vec![false; graph.node_count()];
    let mut components = Vec::new();
    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        let mut component = Vec::new();
        let mut dfs = Dfs::new(&graph, start);
        while let Some(node) = dfs.next(&graph) {
            visited[node.index()] = true;
            component.push(graph[node]);
        }
        component.sort_by_key(|t| position[t]);
        components.push(component);
    }
    components
}

/// One model per connected component, each under a new origin id.
pub fn split_components(model: &CommonModel, ids: &mut IdGenerator) -> Vec<CommonModel> {
    connected_components(model)
        .into_iter()
        .map(|members| {
            tracing::debug!(tables = members.len(), "grouped connected component");
            model.restricted_to(ids.next_origin(), members)
        })
        .collect()
}
