// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the buses of a radial distribution network and
//! the branches between them.

mod creation;
mod paths;
mod retrieval;
mod validation;

pub mod iterators;
mod traversal;

#[cfg(test)]
pub(crate) mod test_utils;

pub use paths::PathCache;

use crate::{Branch, Bus};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

/// `Bus`es stored in an `UnGraph` instance can be addressed with `NodeIndex`es.
///
/// `BusIndexMap` stores the corresponding `NodeIndex` for any bus name, so
/// that buses in the `UnGraph` can be retrieved from their names.
pub(crate) type BusIndexMap = HashMap<String, NodeIndex>;

/// A graph representation of a radial distribution network.
///
/// Edges of the underlying graph carry the position of their `Branch` in
/// `branches`, so that the branch between any two adjacent buses can be
/// resolved regardless of which end is the sending end.
///
/// Buses keep the order in which they were given: the position of a bus in
/// that order is its *bus index*, and the position of a branch is its
/// *branch index*.  Solver working arrays are addressed with these indices.
pub struct TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    graph: UnGraph<B, usize>,
    bus_indices: BusIndexMap,
    root: NodeIndex,
    branches: Vec<L>,
    branch_indices: HashMap<String, usize>,
}
