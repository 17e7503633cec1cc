// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `GridComponent`.

use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Deserializer};

use crate::messages::{
    CUSTOMER_INFO_TOPIC, NETWORK_BUS_INFO_TOPIC, NETWORK_COMPONENT_INFO_TOPIC,
    RESOURCE_STATE_TOPIC,
};
use crate::Error;

/// Environment variables read by [`PowerFlowConfig::from_env`].
const ENV_KEYS: &[&str] = &[
    "GRID_ID",
    "NUM_OF_RESOURCES",
    "RESOURCE_CATEGORIES",
    "STORAGE_RESOURCE_LIST",
    "POWER_FLOW_PRECISION",
    "POWER_FLOW_PERCISION",
    "MAX_ITERATION",
    "APPARENT_POWER_BASE",
    "ROOT_BUS_VOLTAGE",
];

/// The settings as they appear in the environment, with lowercased keys.
#[derive(Debug, Deserialize)]
struct EnvSettings {
    #[serde(deserialize_with = "text")]
    grid_id: String,
    num_of_resources: usize,
    #[serde(deserialize_with = "text")]
    resource_categories: String,
    #[serde(default, deserialize_with = "text")]
    storage_resource_list: String,
    #[serde(default = "default_precision", alias = "power_flow_percision")]
    power_flow_precision: f64,
    #[serde(default = "default_max_iterations")]
    max_iteration: usize,
    #[serde(default = "default_power_base")]
    apparent_power_base: f64,
    #[serde(default = "default_root_voltage")]
    root_bus_voltage: f64,
}

fn default_precision() -> f64 {
    0.001
}

fn default_max_iterations() -> usize {
    3
}

fn default_power_base() -> f64 {
    10_000.0
}

fn default_root_voltage() -> f64 {
    1.02
}

/// Reads a string setting.  Values that look like integers arrive as
/// numbers from the environment and are turned back into text.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Int(i64),
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Str(value) => value,
        Text::Int(value) => value.to_string(),
    })
}

/// Configuration options for the `GridComponent`.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerFlowConfig {
    grid_id: String,
    resource_count: usize,
    resource_categories: Vec<String>,
    storage_resources: Vec<String>,
    precision: f64,
    max_iterations: usize,
    power_base: f64,
    root_voltage: f64,
}

impl PowerFlowConfig {
    /// Creates a configuration from the required options, with defaults for
    /// everything else.
    pub fn try_new(
        grid_id: impl Into<String>,
        resource_count: usize,
        resource_categories: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, Error> {
        let config = Self {
            grid_id: grid_id.into(),
            resource_count,
            resource_categories: resource_categories.into_iter().map(Into::into).collect(),
            storage_resources: Vec::new(),
            precision: default_precision(),
            max_iterations: default_max_iterations(),
            power_base: default_power_base(),
            root_voltage: default_root_voltage(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the largest per-unit voltage change between two sweep
    /// iterations at which the solve is considered converged.
    pub fn with_precision(mut self, precision: f64) -> Result<Self, Error> {
        self.precision = precision;
        self.validate().map(|_| self)
    }

    /// Sets the iteration cap of the sweep.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self, Error> {
        self.max_iterations = max_iterations;
        self.validate().map(|_| self)
    }

    /// Sets the apparent-power base, in VA.
    pub fn with_power_base(mut self, power_base: f64) -> Result<Self, Error> {
        self.power_base = power_base;
        self.validate().map(|_| self)
    }

    /// Sets the per-unit voltage magnitude of the root bus.
    pub fn with_root_voltage(mut self, root_voltage: f64) -> Result<Self, Error> {
        self.root_voltage = root_voltage;
        self.validate().map(|_| self)
    }

    /// Sets the ids of the processes that publish storage overrides.
    pub fn with_storage_resources(
        mut self,
        storage_resources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.storage_resources = storage_resources.into_iter().map(Into::into).collect();
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// `GRID_ID`, `NUM_OF_RESOURCES` and `RESOURCE_CATEGORIES` are required.
    /// Lists are comma separated, and a `STORAGE_RESOURCE_LIST` of `empty`
    /// means no storage resources.  The precision is also read from
    /// `POWER_FLOW_PERCISION`, the key older deployments use.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_figment(Figment::new().merge(Env::raw().only(ENV_KEYS)))
    }

    fn from_figment(figment: Figment) -> Result<Self, Error> {
        let settings: EnvSettings = figment.extract().map_err(|err| {
            Error::invalid_config(format!("Invalid environment configuration: {err}"))
        })?;

        let storage_resources = if settings
            .storage_resource_list
            .trim()
            .eq_ignore_ascii_case("empty")
        {
            Vec::new()
        } else {
            split_list(&settings.storage_resource_list)
        };

        let config = Self {
            grid_id: settings.grid_id.trim().to_string(),
            resource_count: settings.num_of_resources,
            resource_categories: split_list(&settings.resource_categories),
            storage_resources,
            precision: settings.power_flow_precision,
            max_iterations: settings.max_iteration,
            power_base: settings.apparent_power_base,
            root_voltage: settings.root_bus_voltage,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.grid_id.trim().is_empty() {
            return Err(Error::invalid_config("Grid id must not be empty."));
        }
        if self.resource_categories.is_empty() {
            return Err(Error::invalid_config(
                "At least one resource category is required.",
            ));
        }
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(Error::invalid_config(format!(
                "Power flow precision must be positive, got {}.",
                self.precision
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid_config(
                "Maximum iteration count must be at least 1.",
            ));
        }
        if !(self.power_base.is_finite() && self.power_base > 0.0) {
            return Err(Error::invalid_config(format!(
                "Apparent power base must be positive, got {}.",
                self.power_base
            )));
        }
        if !(self.root_voltage.is_finite() && self.root_voltage > 0.0) {
            return Err(Error::invalid_config(format!(
                "Root bus voltage must be positive, got {}.",
                self.root_voltage
            )));
        }
        Ok(())
    }

    /// Returns the grid id, which namespaces the output topics.
    pub fn grid_id(&self) -> &str {
        &self.grid_id
    }

    /// Returns the number of resource states expected every epoch.
    pub fn resource_count(&self) -> usize {
        self.resource_count
    }

    pub fn resource_categories(&self) -> &[String] {
        &self.resource_categories
    }

    /// Returns the ids of the processes that publish storage overrides.
    /// One override is expected from each of them every epoch.
    pub fn storage_resources(&self) -> &[String] {
        &self.storage_resources
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the configured apparent-power base, in VA.
    pub fn power_base(&self) -> f64 {
        self.power_base
    }

    /// Returns the per-unit voltage magnitude of the root bus.
    pub fn root_voltage(&self) -> f64 {
        self.root_voltage
    }

    /// Returns the topics the component has to subscribe to.
    pub fn subscription_topics(&self) -> Vec<String> {
        [
            NETWORK_BUS_INFO_TOPIC,
            NETWORK_COMPONENT_INFO_TOPIC,
            CUSTOMER_INFO_TOPIC,
        ]
        .iter()
        .map(|t| t.to_string())
        .chain(
            self.resource_categories
                .iter()
                .map(|c| format!("{RESOURCE_STATE_TOPIC}.{c}.#")),
        )
        .collect()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
