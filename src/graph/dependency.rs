//! Capability masks and module execution order.
//!
//! Modules declare which capabilities they `require` and which they
//! `affect`. Module X depends on module Y when X requires something Y
//! affects; Y must then run first.

use std::fmt;
use std::marker::PhantomData;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use serde::{Deserialize, Serialize};

// ============================================================================
// Capabilities
// ============================================================================

/// A closed set of things a module can produce or consume.
pub trait Capability: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    /// Bit position of this capability (must be unique and < 32).
    fn bit(self) -> u32;

    fn name(self) -> &'static str;
}

/// Capabilities of relational refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalCapability {
    Name,
    DataType,
    NonNullable,
    Unique,
    PrimaryKey,
    Relations,
    Cardinality,
}

impl Capability for RelationalCapability {
    const ALL: &'static [Self] = &[
        RelationalCapability::Name,
        RelationalCapability::DataType,
        RelationalCapability::NonNullable,
        RelationalCapability::Unique,
        RelationalCapability::PrimaryKey,
        RelationalCapability::Relations,
        RelationalCapability::Cardinality,
    ];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            RelationalCapability::Name => "name",
            RelationalCapability::DataType => "data_type",
            RelationalCapability::NonNullable => "non_nullable",
            RelationalCapability::Unique => "unique",
            RelationalCapability::PrimaryKey => "primary_key",
            RelationalCapability::Relations => "relations",
            RelationalCapability::Cardinality => "cardinality",
        }
    }
}

/// Capabilities of dimension discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarCapability {
    Dimensions,
    Hierarchies,
    Measures,
}

impl Capability for StarCapability {
    const ALL: &'static [Self] = &[
        StarCapability::Dimensions,
        StarCapability::Hierarchies,
        StarCapability::Measures,
    ];

    fn bit(self) -> u32 {
        self as u32
    }

    fn name(self) -> &'static str {
        match self {
            StarCapability::Dimensions => "dimensions",
            StarCapability::Hierarchies => "hierarchies",
            StarCapability::Measures => "measures",
        }
    }
}

/// A bit set over one capability enum.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilitySet<C: Capability> {
    bits: u32,
    _kind: PhantomData<C>,
}

impl<C: Capability> CapabilitySet<C> {
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            _kind: PhantomData,
        }
    }

    pub fn of(capabilities: &[C]) -> Self {
        let mut set = Self::empty();
        for c in capabilities {
            set.insert(*c);
        }
        set
    }

    pub fn insert(&mut self, capability: C) {
        self.bits |= 1 << capability.bit();
    }

    pub fn contains(&self, capability: C) -> bool {
        self.bits & (1 << capability.bit()) != 0
    }

    pub fn intersects(&self, other: &Self) -> bool {
        self.bits & other.bits != 0
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
            _kind: PhantomData,
        }
    }

    /// Capabilities in `self` that `other` lacks.
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
            _kind: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = C> + '_ {
        C::ALL.iter().copied().filter(|c| self.contains(*c))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Capability::name).collect()
    }
}

impl<C: Capability> Default for CapabilitySet<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: Capability> FromIterator<C> for CapabilitySet<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut set = Self::empty();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl<C: Capability> fmt::Debug for CapabilitySet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<C: Capability> fmt::Display for CapabilitySet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        f.write_str(&self.names().join(", "))
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Anything that declares a capability contract.
pub trait Dependent<C: Capability> {
    fn key(&self) -> &'static str;
    fn requires(&self) -> CapabilitySet<C>;
    fn affects(&self) -> CapabilitySet<C>;
}

/// Modules whose declared dependencies form a cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cyclic module dependency: {}", .0.join(" -> "))]
pub struct DependencyCycle(pub Vec<String>);

/// Dependency graph between modules, nodes weighted by input position.
pub struct DependencyGraph {
    graph: DiGraph<usize, ()>,
    keys: Vec<&'static str>,
}

impl DependencyGraph {
    /// Add an edge `x -> y` whenever `x` requires something `y` affects.
    pub fn build<C: Capability, M: Dependent<C>>(modules: &[M]) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..modules.len()).map(|i| graph.add_node(i)).collect();

        for (x, module_x) in modules.iter().enumerate() {
            for (y, module_y) in modules.iter().enumerate() {
                if x != y && module_x.requires().intersects(&module_y.affects()) {
                    graph.add_edge(nodes[x], nodes[y], ());
                }
            }
        }

        Self {
            graph,
            keys: modules.iter().map(|m| m.key()).collect(),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Keys of the modules taking part in a cycle, if any.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.len() > 1)
            .map(|mut scc| {
                scc.sort_by_key(|n| self.graph[*n]);
                let mut cycle: Vec<String> =
                    scc.iter().map(|n| self.keys[self.graph[*n]].to_string()).collect();
                cycle.push(cycle[0].clone());
                cycle
            })
    }

    /// Input positions in execution order: dependencies before dependents.
    ///
    /// DFS over every node in declared order, stamping finish times; a node
    /// finishes only after everything it depends on, so ascending finish
    /// time is a valid topological order of the reversed edges.
    pub fn order(&self) -> Result<Vec<usize>, DependencyCycle> {
        if let Some(cycle) = self.find_cycle() {
            return Err(DependencyCycle(cycle));
        }

        let mut finished: Vec<(usize, usize)> = Vec::with_capacity(self.graph.node_count());
        depth_first_search(&self.graph, self.graph.node_indices(), |event| {
            if let DfsEvent::Finish(node, time) = event {
                finished.push((time.0, self.graph[node]));
            }
        });
        finished.sort_by_key(|(time, _)| *time);
        Ok(finished.into_iter().map(|(_, position)| position).collect())
    }
}

/// Reorder modules so every module runs after the modules it depends on.
pub fn order_modules<C: Capability, M: Dependent<C>>(
    modules: Vec<M>,
) -> Result<Vec<M>, DependencyCycle> {
    let order = DependencyGraph::build(&modules).order()?;
    let mut slots: Vec<Option<M>> = modules.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|position| slots[position].take())
        .collect())
}
