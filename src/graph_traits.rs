// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by the types
//! that represent a bus and a branch.

use num_complex::Complex64;

use crate::categories::BusType;

/**
This trait needs to be implemented by the type that represents a bus.

Read more about why this is necessary [here][crate#the-bus-and-branch-traits].

<details>
<summary>Example implementation for a network information record:</summary>

```ignore
impl radial_grid_state::Bus for nis::BusRow {
    fn name(&self) -> &str {
        &self.bus_name
    }

    fn bus_type(&self) -> radial_grid_state::BusType {
        radial_grid_state::BusType::from_code(&self.bus_type)
    }

    fn voltage_base(&self) -> f64 {
        self.bus_voltage_base.value
    }
}
```

</details>
*/
pub trait Bus {
    /// Returns the unique name of the bus.
    fn name(&self) -> &str;
    /// Returns the type of the bus.
    fn bus_type(&self) -> BusType;
    /// Returns the nominal line-to-line voltage base of the bus, in kV.
    fn voltage_base(&self) -> f64;
}

/**
This trait needs to be implemented by the type that represents a branch.

Read more about why this is necessary [here][crate#the-bus-and-branch-traits].

<details>
<summary>Example implementation for a network information record:</summary>

```ignore
impl radial_grid_state::Branch for nis::ComponentRow {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn sending_bus(&self) -> &str {
        &self.sending_end_bus
    }

    fn receiving_bus(&self) -> &str {
        &self.receiving_end_bus
    }

    fn impedance(&self) -> num_complex::Complex64 {
        num_complex::Complex64::new(self.resistance.value, self.reactance.value)
    }

    fn shunt_admittance(&self) -> f64 {
        self.shunt_admittance.value
    }
}
```

</details>
*/
pub trait Branch {
    /// Returns the device id of the branch.
    fn device_id(&self) -> &str;
    /// Returns the name of the sending-end bus.
    fn sending_bus(&self) -> &str;
    /// Returns the name of the receiving-end bus.
    fn receiving_bus(&self) -> &str;
    /// Returns the series impedance in ohms, identical on every rail.
    fn impedance(&self) -> Complex64;
    /// Returns the total shunt admittance of the branch, in siemens.
    fn shunt_admittance(&self) -> f64;
}
