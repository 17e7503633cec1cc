// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`TopologyGraph`].

mod validate_graph;

use petgraph::graph::NodeIndex;

use crate::{Branch, Bus, Error, TopologyGraph};

pub(crate) struct TopologyValidator<'a, B, L>
where
    B: Bus,
    L: Branch,
{
    tg: &'a TopologyGraph<B, L>,
    root: NodeIndex,
}

impl<B, L> TopologyGraph<B, L>
where
    B: Bus,
    L: Branch,
{
    /// Checks that the graph is a tree rooted at the root bus.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let validator = TopologyValidator {
            tg: self,
            root: self.root,
        };

        validator.validate_branch_count()?;
        validator.validate_acyclicity()?;
        validator.validate_connected_graph()?;

        Ok(())
    }
}
