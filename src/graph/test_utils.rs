// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the crate.
//!
//! - the `TestBus` and `TestBranch` types, which implement the `Bus` and
//!   `Branch` traits respectively.
//! - the `TopologyBuilder`, which can declaratively build radial networks
//!   for use in tests.

use num_complex::Complex64;

use crate::{Branch, Bus, BusType, Error, TopologyGraph};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestBus {
    pub(crate) name: String,
    pub(crate) bus_type: BusType,
    pub(crate) voltage_base: f64,
}

impl TestBus {
    pub(crate) fn new(name: &str, bus_type: BusType) -> Self {
        TestBus {
            name: name.to_string(),
            bus_type,
            voltage_base: 0.4,
        }
    }

    pub(crate) fn with_voltage_base(mut self, voltage_base: f64) -> Self {
        self.voltage_base = voltage_base;
        self
    }
}

impl Bus for TestBus {
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

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TestBranch {
    pub(crate) device_id: String,
    pub(crate) sending: String,
    pub(crate) receiving: String,
    pub(crate) impedance: Complex64,
    pub(crate) shunt_admittance: f64,
}

impl TestBranch {
    pub(crate) fn new(device_id: &str, sending: &str, receiving: &str) -> Self {
        TestBranch {
            device_id: device_id.to_string(),
            sending: sending.to_string(),
            receiving: receiving.to_string(),
            impedance: Complex64::new(0.1, 0.2),
            shunt_admittance: 0.0,
        }
    }

    pub(crate) fn with_impedance(mut self, resistance: f64, reactance: f64) -> Self {
        self.impedance = Complex64::new(resistance, reactance);
        self
    }

    pub(crate) fn with_shunt_admittance(mut self, shunt_admittance: f64) -> Self {
        self.shunt_admittance = shunt_admittance;
        self
    }
}

impl Branch for TestBranch {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn sending_bus(&self) -> &str {
        &self.sending
    }

    fn receiving_bus(&self) -> &str {
        &self.receiving
    }

    fn impedance(&self) -> Complex64 {
        self.impedance
    }

    fn shunt_admittance(&self) -> f64 {
        self.shunt_admittance
    }
}

/// Represents a bus added to the `TopologyBuilder`.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub(crate) struct BusHandle(usize);

impl BusHandle {
    /// Returns the name of the bus.
    pub(crate) fn name(&self) -> String {
        format!("B{}", self.0)
    }

    /// Returns the bus index of the bus in the built graph.
    pub(crate) fn index(&self) -> usize {
        self.0
    }
}

/// A builder for creating radial networks easily, for use in tests.
///
/// Buses are named `B<n>` in creation order, branches `L<from>-<to>`.
pub(crate) struct TopologyBuilder {
    buses: Vec<TestBus>,
    branches: Vec<TestBranch>,
    impedance: (f64, f64),
    shunt_admittance: f64,
}

impl TopologyBuilder {
    /// Creates a new `TopologyBuilder`.
    pub(crate) fn new() -> Self {
        TopologyBuilder {
            buses: Vec::new(),
            branches: Vec::new(),
            impedance: (0.1, 0.2),
            shunt_admittance: 0.0,
        }
    }

    /// Sets the impedance of branches connected after this call.
    pub(crate) fn impedance(&mut self, resistance: f64, reactance: f64) -> &mut Self {
        self.impedance = (resistance, reactance);
        self
    }

    /// Sets the shunt admittance of branches connected after this call.
    pub(crate) fn shunt_admittance(&mut self, shunt_admittance: f64) -> &mut Self {
        self.shunt_admittance = shunt_admittance;
        self
    }

    fn add_bus(&mut self, bus_type: BusType) -> BusHandle {
        let handle = BusHandle(self.buses.len());
        self.buses.push(TestBus::new(&handle.name(), bus_type));
        handle
    }

    /// Adds the root bus to the network and returns its handle.
    pub(crate) fn root(&mut self) -> BusHandle {
        self.add_bus(BusType::Root)
    }

    /// Adds a regular bus to the network and returns its handle.
    pub(crate) fn bus(&mut self) -> BusHandle {
        self.add_bus(BusType::Regular)
    }

    /// Connects two buses with a branch.
    pub(crate) fn connect(&mut self, from: BusHandle, to: BusHandle) -> &mut Self {
        let (resistance, reactance) = self.impedance;
        self.branches.push(
            TestBranch::new(
                &format!("L{}-{}", from.0, to.0),
                &from.name(),
                &to.name(),
            )
            .with_impedance(resistance, reactance)
            .with_shunt_admittance(self.shunt_admittance),
        );
        self
    }

    /// Adds a chain of `length` buses hanging off `from`, and returns the
    /// handle of the last bus in the chain.
    pub(crate) fn chain(&mut self, from: BusHandle, length: usize) -> BusHandle {
        let mut last = from;
        for _ in 0..length {
            let next = self.bus();
            self.connect(last, next);
            last = next;
        }
        last
    }

    /// Builds and returns the topology graph from the buses and branches
    /// added to the builder.
    pub(crate) fn build(&self) -> Result<TopologyGraph<TestBus, TestBranch>, Error> {
        TopologyGraph::try_new(self.buses.clone(), self.branches.clone())
    }
}
