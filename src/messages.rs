// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Field-level shapes of the inputs consumed by the grid component, and the
//! topics they arrive on.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use num_complex::Complex64;

use crate::{Branch, Bus, BusType, Error, PhaseConnection};

/// Topic of the bus data of the network information system.
pub const NETWORK_BUS_INFO_TOPIC: &str = "Init.NIS.NetworkBusInfo";
/// Topic of the component data of the network information system.
pub const NETWORK_COMPONENT_INFO_TOPIC: &str = "Init.NIS.NetworkComponentInfo";
/// Topic of the customer data of the customer information system.
pub const CUSTOMER_INFO_TOPIC: &str = "Init.CIS.CustomerInfo";
/// Prefix of all resource-state topics.
pub const RESOURCE_STATE_TOPIC: &str = "ResourceState";

/// A bus of the network information system.
#[derive(Clone, Debug, PartialEq)]
pub struct BusRecord {
    pub name: String,
    pub bus_type: BusType,
    /// Line-to-line voltage base, in kV.
    pub voltage_base: f64,
}

impl Bus for BusRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn bus_type(&self) -> BusType {
        self.bus_type
    }

    fn voltage_base(&self) -> f64 {
        self.voltage_base
    }
}

/// A line or cable segment of the network information system.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchRecord {
    pub device_id: String,
    pub sending_bus: String,
    pub receiving_bus: String,
    /// Series resistance, in Ω.
    pub resistance: f64,
    /// Series reactance, in Ω.
    pub reactance: f64,
    /// Total shunt admittance, in S.
    pub shunt_admittance: f64,
}

impl Branch for BranchRecord {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn sending_bus(&self) -> &str {
        &self.sending_bus
    }

    fn receiving_bus(&self) -> &str {
        &self.receiving_bus
    }

    fn impedance(&self) -> Complex64 {
        Complex64::new(self.resistance, self.reactance)
    }

    fn shunt_admittance(&self) -> f64 {
        self.shunt_admittance
    }
}

fn check_columns(what: &str, expected: usize, columns: &[(&str, usize)]) -> Result<(), Error> {
    for (name, len) in columns {
        if *len != expected {
            return Err(Error::invalid_input(format!(
                "{what}: column {name} has {len} entries, expected {expected}."
            )));
        }
    }
    Ok(())
}

/// Bus data of the network information system.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkBusInfo {
    pub buses: Vec<BusRecord>,
}

impl NetworkBusInfo {
    /// Builds the bus records from the parallel columns of the wire format.
    pub fn from_columns(
        names: Vec<String>,
        types: Vec<String>,
        voltage_bases: Vec<f64>,
    ) -> Result<Self, Error> {
        check_columns(
            "NetworkBusInfo",
            names.len(),
            &[("BusType", types.len()), ("BusVoltageBase", voltage_bases.len())],
        )?;

        let buses = names
            .into_iter()
            .zip(types)
            .zip(voltage_bases)
            .map(|((name, bus_type), voltage_base)| BusRecord {
                name,
                bus_type: BusType::from_code(&bus_type),
                voltage_base,
            })
            .collect();

        Ok(Self { buses })
    }
}

/// Component data of the network information system.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkComponentInfo {
    pub branches: Vec<BranchRecord>,
    /// Apparent-power base of the network, in VA.
    pub power_base: f64,
}

impl NetworkComponentInfo {
    /// Builds the branch records from the parallel columns of the wire format.
    pub fn from_columns(
        device_ids: Vec<String>,
        sending: Vec<String>,
        receiving: Vec<String>,
        resistance: Vec<f64>,
        reactance: Vec<f64>,
        shunt_admittance: Vec<f64>,
        power_base: f64,
    ) -> Result<Self, Error> {
        check_columns(
            "NetworkComponentInfo",
            device_ids.len(),
            &[
                ("SendingEndBus", sending.len()),
                ("ReceivingEndBus", receiving.len()),
                ("Resistance", resistance.len()),
                ("Reactance", reactance.len()),
                ("ShuntAdmittance", shunt_admittance.len()),
            ],
        )?;

        let branches = device_ids
            .into_iter()
            .zip(sending)
            .zip(receiving)
            .zip(resistance.into_iter().zip(reactance))
            .zip(shunt_admittance)
            .map(
                |((((device_id, sending_bus), receiving_bus), (resistance, reactance)), shunt)| {
                    BranchRecord {
                        device_id,
                        sending_bus,
                        receiving_bus,
                        resistance,
                        reactance,
                        shunt_admittance: shunt,
                    }
                },
            )
            .collect();

        Ok(Self {
            branches,
            power_base,
        })
    }
}

/// Customer data of the customer information system: the bus every resource
/// is connected to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomerInfo {
    buses: HashMap<String, String>,
}

impl CustomerInfo {
    /// Creates the customer data from its columns.
    ///
    /// A resource listed more than once keeps its first bus; the other
    /// entries are logged and dropped.
    pub fn from_columns(resource_ids: Vec<String>, bus_names: Vec<String>) -> Result<Self, Error> {
        check_columns("CustomerInfo", resource_ids.len(), &[("BusName", bus_names.len())])?;
        let mut buses = HashMap::with_capacity(resource_ids.len());
        for (resource_id, bus_name) in resource_ids.into_iter().zip(bus_names) {
            match buses.entry(resource_id) {
                Entry::Occupied(entry) => tracing::warn!(
                    "Resource {} is listed more than once in the customer data, \
                     keeping bus {} and ignoring bus {bus_name}.",
                    entry.key(),
                    entry.get()
                ),
                Entry::Vacant(entry) => {
                    entry.insert(bus_name);
                }
            }
        }
        Ok(Self { buses })
    }

    /// Returns the name of the bus the given resource is connected to.
    pub fn bus_of(&self, resource_id: &str) -> Option<&str> {
        self.buses.get(resource_id).map(String::as_str)
    }

    /// Returns the number of resources in the customer data.
    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}

/// The state of one resource for one epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceState {
    /// Customer the resource belongs to.  Storage overrides are paired with
    /// regular resource states through it.
    pub customer_id: String,
    /// Real power, in W.  Positive values are production.
    pub real_power: f64,
    pub node: PhaseConnection,
}

impl ResourceState {
    /// Creates a resource state from its wire fields.
    pub fn new(customer_id: impl Into<String>, real_power: f64, node_code: i64) -> Self {
        Self {
            customer_id: customer_id.into(),
            real_power,
            node: PhaseConnection::from_code(node_code),
        }
    }
}

/// The routing key of a resource-state input,
/// `ResourceState.<category>.<resource id>`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceTopic {
    pub category: String,
    pub resource_id: String,
}

impl ResourceTopic {
    /// Parses a routing key.  Everything after the second dot is the
    /// resource id.
    pub fn parse(routing_key: &str) -> Result<Self, Error> {
        let mut parts = routing_key.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(RESOURCE_STATE_TOPIC), Some(category), Some(resource_id))
                if !category.is_empty() && !resource_id.is_empty() =>
            {
                Ok(Self {
                    category: category.to_string(),
                    resource_id: resource_id.to_string(),
                })
            }
            _ => Err(Error::invalid_input(format!(
                "Invalid resource state routing key: {routing_key}"
            ))),
        }
    }
}

/// One input of the grid component.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    NetworkBuses(NetworkBusInfo),
    NetworkComponents(NetworkComponentInfo),
    Customers(CustomerInfo),
    ResourceState {
        /// Routing key the state arrived on; it carries the resource id.
        routing_key: String,
        /// Process that published the state.  Storage overrides are
        /// recognized by it.
        source_process_id: String,
        state: ResourceState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_network_bus_info() -> Result<(), Error> {
        let info = NetworkBusInfo::from_columns(
            strings(&["R", "L"]),
            strings(&["root", "usage_point"]),
            vec![0.4, 0.4],
        )?;
        assert_eq!(info.buses[0].bus_type(), BusType::Root);
        assert_eq!(info.buses[1].name(), "L");
        assert_eq!(info.buses[1].bus_type(), BusType::Regular);

        assert_eq!(
            NetworkBusInfo::from_columns(strings(&["R", "L"]), strings(&["root"]), vec![0.4, 0.4]),
            Err(Error::invalid_input(
                "NetworkBusInfo: column BusType has 1 entries, expected 2."
            ))
        );

        Ok(())
    }

    #[test]
    fn test_network_component_info() -> Result<(), Error> {
        let info = NetworkComponentInfo::from_columns(
            strings(&["RL"]),
            strings(&["R"]),
            strings(&["L"]),
            vec![0.1],
            vec![0.2],
            vec![0.0],
            10_000.0,
        )?;
        assert_eq!(info.power_base, 10_000.0);
        assert_eq!(info.branches[0].impedance(), Complex64::new(0.1, 0.2));
        assert_eq!(info.branches[0].sending_bus(), "R");

        assert!(NetworkComponentInfo::from_columns(
            strings(&["RL"]),
            strings(&["R"]),
            strings(&["L"]),
            vec![0.1],
            vec![],
            vec![0.0],
            10_000.0,
        )
        .is_err_and(|e| e
            == Error::invalid_input(
                "NetworkComponentInfo: column Reactance has 0 entries, expected 1."
            )));

        Ok(())
    }

    #[test]
    fn test_customer_info() -> Result<(), Error> {
        let info = CustomerInfo::from_columns(strings(&["load1", "pv1"]), strings(&["L", "L"]))?;
        assert_eq!(info.len(), 2);
        assert_eq!(info.bus_of("pv1"), Some("L"));
        assert_eq!(info.bus_of("ev1"), None);
        assert!(CustomerInfo::from_columns(strings(&["load1"]), vec![]).is_err());

        // Repeated resources keep their first bus.
        let info = CustomerInfo::from_columns(
            strings(&["load1", "pv1", "load1"]),
            strings(&["A", "B", "C"]),
        )?;
        assert_eq!(info.len(), 2);
        assert_eq!(info.bus_of("load1"), Some("A"));
        assert_eq!(info.bus_of("pv1"), Some("B"));

        Ok(())
    }

    #[test]
    fn test_resource_topic() {
        assert_eq!(
            ResourceTopic::parse("ResourceState.Load.load1"),
            Ok(ResourceTopic {
                category: "Load".to_string(),
                resource_id: "load1".to_string(),
            })
        );
        assert_eq!(
            ResourceTopic::parse("ResourceState.Generator.pv.roof.2")
                .map(|t| t.resource_id),
            Ok("pv.roof.2".to_string())
        );
        for key in ["ResourceState.Load", "ResourceState..x", "Other.Load.x", ""] {
            assert_eq!(
                ResourceTopic::parse(key),
                Err(Error::invalid_input(format!(
                    "Invalid resource state routing key: {key}"
                )))
            );
        }
    }

    #[test]
    fn test_resource_state() {
        let state = ResourceState::new("c1", -5000.0, 2);
        assert_eq!(state.node, PhaseConnection::Single(Phase::Two));
        assert_eq!(
            ResourceState::new("c1", -5000.0, 4).node,
            PhaseConnection::ThreePhase
        );
    }
}
