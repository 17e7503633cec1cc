// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Radial Grid State

This is a library for computing the steady-state voltages and currents of a
radial, three-phase, unbalanced distribution network, once per simulation
epoch.

The network is represented as a tree of buses connected by branches, and
solved with a backward-forward sweep: nodal currents are accumulated from the
leaves towards the root, then the root voltage is propagated out to the
leaves, until the voltages stop changing.  Every bus and branch carries four
rails: the three phases and the neutral.

## The `Bus` and `Branch` traits

The topology is held in a [`TopologyGraph`], instances of which can be
created by passing an iterator of buses and the branches between them to the
[`try_new`][TopologyGraph::try_new] method.

The graph doesn't depend on any concrete bus or branch type and instead uses
traits to interact with them.  To be usable with this library, bus and branch
types must implement the [`Bus`] and [`Branch`] traits, respectively.  The
records of the [`messages`] module implement them for the network information
system's data.

## Validation

The [`try_new`][TopologyGraph::try_new] method checks that:

- There is exactly one root bus, and every bus has a positive voltage base.
- Bus names and branch device ids are unique.
- No branch connects a bus to itself.
- There is exactly one branch less than there are buses.
- There are no cycles, and every bus is reachable from the root.

Branches that refer to unknown buses are logged and skipped.  If any of the
checks fail, the method returns an [`Error`] for which
[`is_topology_error`][Error::is_topology_error] is true.

## The grid component

A [`GridComponent`] collects the inputs of every epoch: network and customer
data once in the first epoch, and one resource state per configured resource
every epoch.  Once all of them have arrived, it assembles the nodal powers,
solves the power flow and hands the voltage and current records to a
[`Publisher`].

```rust
use radial_grid_state::messages::Input;
use radial_grid_state::{
    CurrentRecord, EpochStatus, Error, GridComponent, PowerFlowConfig, Publisher, VoltageRecord,
};

struct LogPublisher;

impl Publisher for LogPublisher {
    fn publish_voltage(&mut self, topic: &str, record: &VoltageRecord) -> Result<(), Error> {
        println!("{topic}: {:.4} kV at {:.2} deg", record.magnitude, record.angle);
        Ok(())
    }

    fn publish_current(&mut self, topic: &str, record: &CurrentRecord) -> Result<(), Error> {
        println!("{topic}: {:.2} A", record.magnitude_sending_end);
        Ok(())
    }
}

fn run_first_epoch(inputs: Vec<Input>) -> Result<(), Error> {
    let mut component = GridComponent::new(PowerFlowConfig::from_env()?);
    component.start_epoch(1);
    for input in inputs {
        if component.handle_input(input) {
            assert_eq!(component.process_epoch(&mut LogPublisher)?, EpochStatus::Completed);
        }
    }
    Ok(())
}
```

A solve that reaches the iteration cap before the configured precision is
not an error.  It is logged, and its outcome is available from
[`GridComponent::last_report`].
*/

mod categories;
pub use categories::{BusType, Phase, PhaseConnection};

mod rails;
pub use rails::Rails;

mod graph;
pub use graph::{iterators, PathCache, TopologyGraph};

mod graph_traits;
pub use graph_traits::{Branch, Bus};

mod error;
pub use error::Error;

mod config;
pub use config::PowerFlowConfig;

pub mod messages;

mod per_unit;
pub use per_unit::PerUnitBases;

mod aggregator;
pub use aggregator::{CollectedState, InputAggregator};

mod nodal_power;
pub use nodal_power::assemble_nodal_power;

mod solver;
pub use solver::{
    flat_start, BackwardForwardSweep, ConvergenceReport, PowerFlowSolution, SolverSettings,
};

mod results;
pub use results::{CurrentRecord, NetworkState, VoltageRecord, NETWORK_STATE_TOPIC};

mod grid;
pub use grid::{EpochStatus, GridComponent, Publisher};
