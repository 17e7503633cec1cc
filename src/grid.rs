// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The grid component: collects the inputs of every epoch, solves the power
//! flow once they are complete and publishes the network state.

use crate::aggregator::InputAggregator;
use crate::messages::{BranchRecord, BusRecord, Input};
use crate::nodal_power::assemble_nodal_power;
use crate::per_unit::PerUnitBases;
use crate::results::{CurrentRecord, NetworkState, VoltageRecord};
use crate::solver::{BackwardForwardSweep, ConvergenceReport, SolverSettings};
use crate::{Bus, Error, PathCache, PowerFlowConfig, TopologyGraph};

/// Receives the records of a solved epoch.
pub trait Publisher {
    fn publish_voltage(&mut self, topic: &str, record: &VoltageRecord) -> Result<(), Error>;
    fn publish_current(&mut self, topic: &str, record: &CurrentRecord) -> Result<(), Error>;
}

/// Whether the current epoch is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpochStatus {
    /// Some inputs of the epoch are still missing.
    Waiting,
    /// The epoch was solved and its records published.
    Completed,
}

/// Network artifacts built from the topology data of the first epoch and
/// kept for the lifetime of the component.
struct Topology {
    graph: TopologyGraph<BusRecord, BranchRecord>,
    bases: PerUnitBases,
    paths: PathCache,
}

/// The records of a solved epoch, and how many of them were published.
struct PendingRecords {
    epoch: u64,
    state: NetworkState,
    published: usize,
}

impl PendingRecords {
    /// Publishes the records that weren't published yet, voltages first.
    fn publish(&mut self, grid_id: &str, publisher: &mut impl Publisher) -> Result<(), Error> {
        for record in self.state.voltages.iter().skip(self.published) {
            publisher.publish_voltage(&record.topic(grid_id), record)?;
            self.published += 1;
        }
        let currents_published = self.published - self.state.voltages.len();
        for record in self.state.currents.iter().skip(currents_published) {
            publisher.publish_current(&record.topic(grid_id), record)?;
            self.published += 1;
        }
        Ok(())
    }
}

/// Computes the state of a radial distribution grid once per epoch.
pub struct GridComponent {
    config: PowerFlowConfig,
    aggregator: InputAggregator,
    topology: Option<Topology>,
    pending: Option<PendingRecords>,
    completed_epoch: Option<u64>,
    last_report: Option<ConvergenceReport>,
}

impl GridComponent {
    pub fn new(config: PowerFlowConfig) -> Self {
        Self {
            aggregator: InputAggregator::new(&config),
            config,
            topology: None,
            pending: None,
            completed_epoch: None,
            last_report: None,
        }
    }

    pub fn config(&self) -> &PowerFlowConfig {
        &self.config
    }

    /// Returns the current epoch, `0` before the first one has started.
    pub fn epoch(&self) -> u64 {
        self.aggregator.epoch()
    }

    /// Returns the apparent-power base in use.  The value of the network
    /// component data takes precedence over the configured one.
    pub fn power_base(&self) -> f64 {
        self.topology
            .as_ref()
            .map(|t| t.bases.power_base())
            .unwrap_or_else(|| self.config.power_base())
    }

    /// Returns the convergence report of the last solve.
    pub fn last_report(&self) -> Option<&ConvergenceReport> {
        self.last_report.as_ref()
    }

    /// Starts a new epoch.  Inputs of the previous epoch are dropped if
    /// `epoch` is newer than the current one.
    pub fn start_epoch(&mut self, epoch: u64) {
        if self.aggregator.start_epoch(epoch) {
            tracing::info!("Epoch {epoch} started.");
        }
    }

    /// Handles one input.
    ///
    /// Returns true if this input completed the inputs of the current epoch.
    /// Inputs that can't be used are logged and dropped.
    pub fn handle_input(&mut self, input: Input) -> bool {
        match self.aggregator.handle_input(input) {
            Ok(ready) => ready,
            Err(err) => {
                tracing::warn!("Input dropped: {err}");
                false
            }
        }
    }

    /// Solves and publishes the current epoch, if all of its inputs have
    /// arrived.
    ///
    /// Each epoch is solved once: calling this again after completion
    /// publishes nothing, and calling it again after a failed publication
    /// publishes only the records that are still missing.  Errors are
    /// returned only when the epoch can't be solved at all, or when
    /// publishing fails.
    pub fn process_epoch(&mut self, publisher: &mut impl Publisher) -> Result<EpochStatus, Error> {
        let epoch = self.aggregator.epoch();
        if self.completed_epoch == Some(epoch) {
            return Ok(EpochStatus::Completed);
        }
        if !self.aggregator.is_ready() {
            return Ok(EpochStatus::Waiting);
        }

        let pending = match self.pending.take() {
            Some(pending) if pending.epoch == epoch => pending,
            _ => {
                let state = self.solve().map_err(|err| {
                    tracing::error!("Epoch {epoch} can't be solved: {err}");
                    err
                })?;
                PendingRecords {
                    epoch,
                    state,
                    published: 0,
                }
            }
        };
        let pending = self.pending.insert(pending);
        if let Err(err) = pending.publish(self.config.grid_id(), publisher) {
            tracing::warn!(
                "Epoch {epoch}: publishing failed after {} records: {err}",
                pending.published
            );
            return Err(err);
        }
        tracing::info!(
            "Epoch {epoch}: published {} voltage and {} current records.",
            pending.state.voltages.len(),
            pending.state.currents.len()
        );

        self.pending = None;
        self.completed_epoch = Some(epoch);
        Ok(EpochStatus::Completed)
    }

    fn solve(&mut self) -> Result<NetworkState, Error> {
        if self.topology.is_none() {
            self.topology = Some(self.build_topology()?);
        }
        let (Some(topology), Some(customers)) = (&self.topology, self.aggregator.customers())
        else {
            return Err(Error::internal("Customer data missing at solve time."));
        };

        let nodal_power = assemble_nodal_power(
            &topology.graph,
            &topology.bases,
            customers,
            self.aggregator.resource_states(),
            self.aggregator.storage_states(),
        );
        let solver = BackwardForwardSweep::new(
            &topology.graph,
            &topology.bases,
            &topology.paths,
            SolverSettings::from(&self.config),
        );
        let solution = solver.solve(&nodal_power)?;
        let state = NetworkState::from_solution(&topology.graph, &topology.bases, &solution)?;

        self.last_report = Some(solution.report);
        Ok(state)
    }

    fn build_topology(&self) -> Result<Topology, Error> {
        let (Some(buses), Some(components)) = (
            self.aggregator.network_buses(),
            self.aggregator.network_components(),
        ) else {
            return Err(Error::internal("Network data missing at solve time."));
        };

        let mut power_base = self.config.power_base();
        if components.power_base != power_base {
            tracing::warn!(
                "Power base {} of the network data differs from the configured {power_base}, \
                 using the network data.",
                components.power_base
            );
            power_base = components.power_base;
        }

        let graph = TopologyGraph::try_new(buses.buses.clone(), components.branches.clone())?;
        let bases = PerUnitBases::from_graph(&graph, power_base)?;
        let paths = graph.path_cache()?;
        tracing::info!(
            "Topology built with {} buses and {} branches, root bus {}.",
            graph.num_buses(),
            graph.num_branches(),
            graph.root().name()
        );

        Ok(Topology {
            graph,
            bases,
            paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{CustomerInfo, NetworkBusInfo, NetworkComponentInfo, ResourceState};
    use crate::Phase;

    #[derive(Default)]
    struct RecordingPublisher {
        voltages: Vec<(String, VoltageRecord)>,
        currents: Vec<(String, CurrentRecord)>,
    }

    impl Publisher for RecordingPublisher {
        fn publish_voltage(&mut self, topic: &str, record: &VoltageRecord) -> Result<(), Error> {
            self.voltages.push((topic.to_string(), record.clone()));
            Ok(())
        }

        fn publish_current(&mut self, topic: &str, record: &CurrentRecord) -> Result<(), Error> {
            self.currents.push((topic.to_string(), record.clone()));
            Ok(())
        }
    }

    /// Fails once, when asked to publish the voltage record at `fail_at`.
    struct FlakyPublisher {
        inner: RecordingPublisher,
        fail_at: Option<usize>,
    }

    impl Publisher for FlakyPublisher {
        fn publish_voltage(&mut self, topic: &str, record: &VoltageRecord) -> Result<(), Error> {
            if self.fail_at == Some(self.inner.voltages.len()) {
                self.fail_at = None;
                return Err(Error::internal("Broker unavailable."));
            }
            self.inner.publish_voltage(topic, record)
        }

        fn publish_current(&mut self, topic: &str, record: &CurrentRecord) -> Result<(), Error> {
            self.inner.publish_current(topic, record)
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn two_bus_inputs(power_base: f64) -> Result<Vec<Input>, Error> {
        Ok(vec![
            Input::NetworkBuses(NetworkBusInfo::from_columns(
                strings(&["R", "L"]),
                strings(&["root", "usage_point"]),
                vec![0.4, 0.4],
            )?),
            Input::NetworkComponents(NetworkComponentInfo::from_columns(
                strings(&["RL"]),
                strings(&["R"]),
                strings(&["L"]),
                vec![0.1],
                vec![0.2],
                vec![0.0],
                power_base,
            )?),
            Input::Customers(CustomerInfo::from_columns(
                strings(&["load1"]),
                strings(&["L"]),
            )?),
        ])
    }

    fn load(power: f64) -> Input {
        Input::ResourceState {
            routing_key: "ResourceState.Load.load1".to_string(),
            source_process_id: "load1".to_string(),
            state: ResourceState::new("c1", power, 1),
        }
    }

    #[test]
    fn test_two_bus_epochs() -> Result<(), Error> {
        let config = PowerFlowConfig::try_new("Grid1", 1, ["Load"])?;
        let mut component = GridComponent::new(config);
        let mut publisher = RecordingPublisher::default();

        component.start_epoch(1);
        for input in two_bus_inputs(10_000.0)? {
            assert!(!component.handle_input(input));
        }
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Waiting);
        assert!(component.handle_input(load(-5000.0)));
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);

        let report = component.last_report().cloned();
        assert!(report.is_some_and(|r| r.converged && r.iterations <= 3));

        assert_eq!(publisher.voltages.len(), 6);
        assert_eq!(publisher.currents.len(), 3);
        let voltage = |bus: &str| {
            publisher
                .voltages
                .iter()
                .find(|(_, v)| v.bus == bus && v.phase == Phase::One)
                .map(|(_, v)| v.magnitude)
                .unwrap_or_default()
        };
        assert!((voltage("R") - 0.408).abs() < 1e-12);
        assert!(voltage("L") < voltage("R"));
        assert!(voltage("L") > 0.4);

        let (topic, current) = &publisher.currents[0];
        assert_eq!(topic, "NetworkState.Grid1.Current.RL");
        assert_eq!(current.phase, Phase::One);
        assert!(current.magnitude_sending_end > 0.0);
        assert!(current.angle_sending_end < 0.0);
        assert_eq!(publisher.voltages[0].0, "NetworkState.Grid1.Voltage.R");

        // A completed epoch is not solved or published again.
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);
        assert!(!component.handle_input(load(-1000.0)));
        assert_eq!(publisher.voltages.len(), 6);

        component.start_epoch(2);
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Waiting);
        for input in two_bus_inputs(10_000.0)? {
            assert!(!component.handle_input(input));
        }
        assert!(component.handle_input(load(0.0)));
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);
        assert_eq!(publisher.voltages.len(), 12);
        assert!((publisher.voltages[9].1.magnitude - 0.408).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_publish_retry() -> Result<(), Error> {
        let config = PowerFlowConfig::try_new("Grid1", 1, ["Load"])?;
        let mut component = GridComponent::new(config);
        let mut publisher = FlakyPublisher {
            inner: RecordingPublisher::default(),
            fail_at: Some(2),
        };

        component.start_epoch(1);
        for input in two_bus_inputs(10_000.0)? {
            component.handle_input(input);
        }
        assert!(component.handle_input(load(-5000.0)));

        assert_eq!(
            component.process_epoch(&mut publisher),
            Err(Error::internal("Broker unavailable."))
        );
        assert_eq!(publisher.inner.voltages.len(), 2);
        let report = component.last_report().cloned();

        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);
        assert_eq!(component.last_report().cloned(), report);
        assert_eq!(publisher.inner.voltages.len(), 6);
        assert_eq!(publisher.inner.currents.len(), 3);
        let mut published: Vec<_> = publisher
            .inner
            .voltages
            .iter()
            .map(|(topic, v)| (topic.clone(), v.phase.number()))
            .collect();
        published.sort();
        published.dedup();
        assert_eq!(published.len(), 6);

        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);
        assert_eq!(publisher.inner.voltages.len(), 6);

        Ok(())
    }

    #[test]
    fn test_power_base_from_network_data() -> Result<(), Error> {
        let config = PowerFlowConfig::try_new("Grid1", 1, ["Load"])?;
        let mut component = GridComponent::new(config);
        let mut publisher = RecordingPublisher::default();
        assert_eq!(component.power_base(), 10_000.0);

        component.start_epoch(1);
        for input in two_bus_inputs(20_000.0)? {
            component.handle_input(input);
        }
        component.handle_input(load(-5000.0));
        assert_eq!(component.process_epoch(&mut publisher)?, EpochStatus::Completed);
        assert_eq!(component.power_base(), 20_000.0);

        Ok(())
    }

    #[test]
    fn test_invalid_topology() -> Result<(), Error> {
        let config = PowerFlowConfig::try_new("Grid1", 1, ["Load"])?;
        let mut component = GridComponent::new(config);
        let mut publisher = RecordingPublisher::default();

        component.start_epoch(1);
        let inputs = vec![
            Input::NetworkBuses(NetworkBusInfo::from_columns(
                strings(&["R", "A", "B"]),
                strings(&["root", "", ""]),
                vec![0.4, 0.4, 0.4],
            )?),
            Input::NetworkComponents(NetworkComponentInfo::from_columns(
                strings(&["RA1", "RA2"]),
                strings(&["R", "A"]),
                strings(&["A", "R"]),
                vec![0.1, 0.1],
                vec![0.2, 0.2],
                vec![0.0, 0.0],
                10_000.0,
            )?),
            Input::Customers(CustomerInfo::from_columns(
                strings(&["load1"]),
                strings(&["A"]),
            )?),
            load(-100.0),
        ];
        for input in inputs {
            component.handle_input(input);
        }

        assert!(component
            .process_epoch(&mut publisher)
            .is_err_and(|e| e.is_topology_error()));
        assert!(publisher.voltages.is_empty());

        Ok(())
    }
}
