// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating that a [`TopologyGraph`] is a tree: it has one
//! branch less than it has buses, it is acyclic, and it is connected.

use std::collections::BTreeSet;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::{Branch, Bus, Error};

use super::TopologyValidator;

impl<B, L> TopologyValidator<'_, B, L>
where
    B: Bus,
    L: Branch,
{
    /// Validates that a tree over the buses can be formed from the branches.
    pub(super) fn validate_branch_count(&self) -> Result<(), Error> {
        let num_buses = self.tg.graph.node_count();
        let num_branches = self.tg.graph.edge_count();

        if num_branches + 1 != num_buses {
            return Err(Error::invalid_topology(format!(
                "Expected {} branches for {} buses, found {}.",
                num_buses.saturating_sub(1),
                num_buses,
                num_branches
            )));
        }

        Ok(())
    }

    /// Validates that all buses are connected into a single graph.
    ///
    /// It does so by ensuring that all the buses are reachable by traversing
    /// the graph from the root bus.
    pub(super) fn validate_connected_graph(&self) -> Result<(), Error> {
        let graph = &self.tg.graph;
        let mut visited = BTreeSet::new();
        let mut queue = vec![self.root];
        visited.insert(self.root);
        while let Some(index) = queue.pop() {
            for neighbor in graph.neighbors(index) {
                if visited.insert(neighbor) {
                    queue.push(neighbor);
                }
            }
        }

        let unvisited = graph
            .node_indices()
            .filter(|index| !visited.contains(index))
            .map(|index| graph[index].name())
            .collect::<Vec<_>>();

        if !unvisited.is_empty() {
            return Err(Error::invalid_topology(format!(
                "Buses {:?} are not connected to the root.",
                unvisited
            )));
        }

        Ok(())
    }

    /// Validates that there are no cycles in the graph.
    ///
    /// Walks the graph depth first from the root, entering each bus through
    /// at most one branch.  Reaching a bus that is already on the current
    /// path through any other branch closes a cycle, which is returned as an
    /// error listing its buses.
    pub(super) fn validate_acyclicity(&self) -> Result<(), Error> {
        let graph = &self.tg.graph;
        let mut path = vec![self.root];
        let mut path_position = vec![None; graph.node_count()];
        path_position[self.root.index()] = Some(0);
        let mut pending = vec![self.sorted_edges(self.root, None)];

        while let Some(edges) = pending.last_mut() {
            let Some((edge_id, neighbor)) = edges.next() else {
                pending.pop();
                if let Some(index) = path.pop() {
                    path_position[index.index()] = None;
                }
                continue;
            };
            if let Some(first_occurance) = path_position[neighbor.index()] {
                return Err(Error::invalid_topology(format!(
                    "Cycle detected: {} -> {}",
                    path[first_occurance..]
                        .iter()
                        .map(|i| graph[*i].name())
                        .collect::<Vec<_>>()
                        .join(" -> "),
                    graph[neighbor].name()
                )));
            }
            path_position[neighbor.index()] = Some(path.len());
            path.push(neighbor);
            pending.push(self.sorted_edges(neighbor, Some(edge_id)));
        }
        Ok(())
    }

    /// Returns the branches of a bus other than `via`, with the buses they
    /// lead to, in input order so that reported cycles are stable.
    fn sorted_edges(
        &self,
        index: NodeIndex,
        via: Option<EdgeIndex>,
    ) -> std::vec::IntoIter<(EdgeIndex, NodeIndex)> {
        let mut edges = self
            .tg
            .graph
            .edges(index)
            .filter(|edge| Some(edge.id()) != via)
            .map(|edge| {
                let neighbor = if edge.source() == index {
                    edge.target()
                } else {
                    edge.source()
                };
                (*edge.weight(), edge.id(), neighbor)
            })
            .collect::<Vec<_>>();
        edges.sort_unstable_by_key(|(branch_idx, _, _)| *branch_idx);
        edges
            .into_iter()
            .map(|(_, edge_id, neighbor)| (edge_id, neighbor))
            .collect::<Vec<_>>()
            .into_iter()
    }
}
