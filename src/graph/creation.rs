// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`TopologyGraph`] instances from given buses and
//! branches.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::{categories::BusPredicates, Branch, Bus, Error};

use super::{BusIndexMap, TopologyGraph};

/// `TopologyGraph` instantiation.
impl<B, L> TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    /// Creates a new [`TopologyGraph`] from the given buses and branches.
    ///
    /// Branches that refer to buses that don't exist are logged and skipped.
    ///
    /// Returns an error if the resulting graph is not a tree rooted at a
    /// single root bus.
    pub fn try_new<BusIterator: IntoIterator<Item = B>, BranchIterator: IntoIterator<Item = L>>(
        buses: BusIterator,
        branches: BranchIterator,
    ) -> Result<Self, Error> {
        let (graph, indices) = Self::create_graph(buses)?;
        let root = Self::find_root(&graph)?;

        let mut tg = Self {
            graph,
            bus_indices: indices,
            root,
            branches: Vec::new(),
            branch_indices: HashMap::new(),
        };
        tg.add_branches(branches)?;

        tg.validate()?;

        Ok(tg)
    }

    fn find_root(graph: &UnGraph<B, usize>) -> Result<NodeIndex, Error> {
        let mut roots_iter = graph.node_indices().filter(|&i| graph[i].is_root());

        let root = roots_iter
            .next()
            .ok_or_else(|| Error::invalid_topology("No root bus found."))?;

        if let Some(other) = roots_iter.next() {
            return Err(Error::invalid_topology(format!(
                "Multiple root buses found: {}, {}.",
                graph[root].name(),
                graph[other].name()
            )));
        }

        Ok(root)
    }

    fn create_graph(
        buses: impl IntoIterator<Item = B>,
    ) -> Result<(UnGraph<B, usize>, BusIndexMap), Error> {
        let mut graph = UnGraph::default();
        let mut indices = BusIndexMap::new();

        for bus in buses {
            let name = bus.name().to_string();
            let voltage_base = bus.voltage_base();

            if !(voltage_base.is_finite() && voltage_base > 0.0) {
                return Err(Error::invalid_bus(format!(
                    "Bus {name} has an invalid voltage base: {voltage_base}"
                )));
            }
            if indices.contains_key(&name) {
                return Err(Error::invalid_bus(format!(
                    "Duplicate bus name found: {name}"
                )));
            }

            let idx = graph.add_node(bus);
            indices.insert(name, idx);
        }

        Ok((graph, indices))
    }

    fn add_branches(&mut self, branches: impl IntoIterator<Item = L>) -> Result<(), Error> {
        for branch in branches {
            let device_id = branch.device_id().to_string();
            let sending = branch.sending_bus();
            let receiving = branch.receiving_bus();

            if sending == receiving {
                return Err(Error::invalid_branch(format!(
                    "Branch {device_id}:({sending}, {receiving}) can't connect a bus to itself."
                )));
            }
            if self.branch_indices.contains_key(&device_id) {
                return Err(Error::invalid_branch(format!(
                    "Duplicate branch device ID found: {device_id}"
                )));
            }

            let (Some(&sending_idx), Some(&receiving_idx)) = (
                self.bus_indices.get(sending),
                self.bus_indices.get(receiving),
            ) else {
                tracing::warn!(
                    "Branch {device_id}:({sending}, {receiving}) refers to an unknown bus. Skipping."
                );
                continue;
            };

            let branch_idx = self.branches.len();
            self.graph.add_edge(sending_idx, receiving_idx, branch_idx);
            self.branch_indices.insert(device_id, branch_idx);
            self.branches.push(branch);
        }

        Ok(())
    }
}
