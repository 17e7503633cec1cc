// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The input barrier of the grid component.
//!
//! Topology and customer data arrive once, during the first epoch, and are
//! kept for the lifetime of the component.  Resource states arrive every
//! epoch, at most once per resource.  The aggregator becomes ready exactly
//! once per epoch, when every expected input has arrived.

use std::collections::HashSet;

use crate::messages::{
    CustomerInfo, Input, NetworkBusInfo, NetworkComponentInfo, ResourceState, ResourceTopic,
};
use crate::{Error, PowerFlowConfig};

/// A resource state collected during an epoch, with the identity it was
/// deduplicated by.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedState {
    /// The resource id for regular states, the source process id for
    /// storage overrides.
    pub source: String,
    pub state: ResourceState,
}

/// Collects the inputs of the grid component and decides when an epoch can
/// be solved.
#[derive(Debug)]
pub struct InputAggregator {
    expected_resources: usize,
    resource_categories: Vec<String>,
    storage_sources: HashSet<String>,

    epoch: u64,
    network_buses: Option<NetworkBusInfo>,
    network_components: Option<NetworkComponentInfo>,
    customers: Option<CustomerInfo>,

    resource_states: Vec<CollectedState>,
    storage_states: Vec<CollectedState>,
    ready: bool,
}

impl InputAggregator {
    pub fn new(config: &PowerFlowConfig) -> Self {
        Self {
            expected_resources: config.resource_count(),
            resource_categories: config.resource_categories().to_vec(),
            storage_sources: config.storage_resources().iter().cloned().collect(),
            epoch: 0,
            network_buses: None,
            network_components: None,
            customers: None,
            resource_states: Vec::new(),
            storage_states: Vec::new(),
            ready: false,
        }
    }

    /// Moves the aggregator to the given epoch.
    ///
    /// Per-epoch inputs are cleared if `epoch` is newer than the current
    /// one.  Returns true in that case.
    pub fn start_epoch(&mut self, epoch: u64) -> bool {
        if epoch <= self.epoch {
            return false;
        }
        self.epoch = epoch;
        self.resource_states.clear();
        self.storage_states.clear();
        self.ready = false;
        true
    }

    /// Returns the current epoch, `0` before the first one has started.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns true once every input of the current epoch has arrived.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Records one input.
    ///
    /// Returns true if this input completed the inputs of the epoch.  Inputs
    /// that are duplicates of earlier ones are discarded and logged.  Inputs
    /// that can't be used at all are returned as errors.
    pub fn handle_input(&mut self, input: Input) -> Result<bool, Error> {
        if self.ready {
            return Err(Error::protocol_violation(format!(
                "All inputs of epoch {} were already received, ignoring {}.",
                self.epoch,
                input_name(&input)
            )));
        }

        match input {
            Input::NetworkBuses(info) => self.on_network_buses(info)?,
            Input::NetworkComponents(info) => self.on_network_components(info)?,
            Input::Customers(info) => self.on_customers(info)?,
            Input::ResourceState {
                routing_key,
                source_process_id,
                state,
            } => self.on_resource_state(&routing_key, source_process_id, state)?,
        }

        Ok(self.update_readiness())
    }

    fn check_first_epoch(&self, name: &str) -> Result<(), Error> {
        if self.epoch > 1 {
            return Err(Error::protocol_violation(format!(
                "{name} is only accepted in the first epoch, ignored in epoch {}.",
                self.epoch
            )));
        }
        Ok(())
    }

    fn on_network_buses(&mut self, info: NetworkBusInfo) -> Result<(), Error> {
        self.check_first_epoch("NetworkBusInfo")?;
        if self.network_buses.is_some() {
            tracing::warn!("NetworkBusInfo was already received, discarding the repeat.");
            return Ok(());
        }
        tracing::info!("NetworkBusInfo received with {} buses.", info.buses.len());
        self.network_buses = Some(info);
        Ok(())
    }

    fn on_network_components(&mut self, info: NetworkComponentInfo) -> Result<(), Error> {
        self.check_first_epoch("NetworkComponentInfo")?;
        if self.network_components.is_some() {
            tracing::warn!("NetworkComponentInfo was already received, discarding the repeat.");
            return Ok(());
        }
        tracing::info!(
            "NetworkComponentInfo received with {} branches.",
            info.branches.len()
        );
        self.network_components = Some(info);
        Ok(())
    }

    fn on_customers(&mut self, info: CustomerInfo) -> Result<(), Error> {
        self.check_first_epoch("CustomerInfo")?;
        if self.customers.is_some() {
            tracing::warn!("CustomerInfo was already received, discarding the repeat.");
            return Ok(());
        }
        if info.len() != self.expected_resources {
            tracing::warn!(
                "CustomerInfo lists {} resources, but {} are configured.",
                info.len(),
                self.expected_resources
            );
        }
        self.customers = Some(info);
        Ok(())
    }

    fn on_resource_state(
        &mut self,
        routing_key: &str,
        source_process_id: String,
        state: ResourceState,
    ) -> Result<(), Error> {
        if self.storage_sources.contains(&source_process_id) {
            if self
                .storage_states
                .iter()
                .any(|s| s.source == source_process_id)
            {
                tracing::warn!(
                    "Storage state from {source_process_id} was already received in epoch {}.",
                    self.epoch
                );
                return Ok(());
            }
            tracing::debug!("Storage state received from {source_process_id}.");
            self.storage_states.push(CollectedState {
                source: source_process_id,
                state,
            });
            return Ok(());
        }

        let topic = ResourceTopic::parse(routing_key)?;
        if !self.resource_categories.contains(&topic.category) {
            return Err(Error::invalid_input(format!(
                "Resource category {} of {routing_key} is not configured.",
                topic.category
            )));
        }

        if self
            .resource_states
            .iter()
            .any(|s| s.source == topic.resource_id)
        {
            tracing::warn!(
                "State of resource {} was already received in epoch {}.",
                topic.resource_id,
                self.epoch
            );
            return Ok(());
        }

        tracing::debug!(
            "State of resource {} received ({} of {}).",
            topic.resource_id,
            self.resource_states.len() + 1,
            self.expected_resources
        );
        self.resource_states.push(CollectedState {
            source: topic.resource_id,
            state,
        });
        Ok(())
    }

    fn update_readiness(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = self.network_buses.is_some()
            && self.network_components.is_some()
            && self.customers.is_some()
            && self.resource_states.len() == self.expected_resources
            && self.storage_states.len() == self.storage_sources.len();
        if self.ready {
            tracing::info!("All inputs of epoch {} received.", self.epoch);
        }
        self.ready
    }

    pub fn network_buses(&self) -> Option<&NetworkBusInfo> {
        self.network_buses.as_ref()
    }

    pub fn network_components(&self) -> Option<&NetworkComponentInfo> {
        self.network_components.as_ref()
    }

    pub fn customers(&self) -> Option<&CustomerInfo> {
        self.customers.as_ref()
    }

    /// Returns the regular resource states of the epoch, in arrival order.
    pub fn resource_states(&self) -> &[CollectedState] {
        &self.resource_states
    }

    /// Returns the storage overrides of the epoch, in arrival order.
    pub fn storage_states(&self) -> &[CollectedState] {
        &self.storage_states
    }
}

fn input_name(input: &Input) -> String {
    match input {
        Input::NetworkBuses(_) => "NetworkBusInfo".to_string(),
        Input::NetworkComponents(_) => "NetworkComponentInfo".to_string(),
        Input::Customers(_) => "CustomerInfo".to_string(),
        Input::ResourceState { routing_key, .. } => format!("resource state {routing_key}"),
    }
}
