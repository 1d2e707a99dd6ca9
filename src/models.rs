//! Data types and associated functions and methods

use crate::error::StatsError;
use crate::settings::Settings;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum_macros::Display;
use validator::{Validate, ValidationError};

/// Detail levels of the experiment hierarchy, from coarsest to finest.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Above all projects
    Root,
    Project,
    Experiment,
    Replicate,
    Lane,
    Read,
}

impl Level {
    /// All levels in hierarchy order.
    pub const ALL: [Level; 6] = [
        Level::Root,
        Level::Project,
        Level::Experiment,
        Level::Replicate,
        Level::Lane,
        Level::Read,
    ];

    /// Configuration key holding the identifier at this level, e.g. `laneid`.
    pub fn key(self) -> Option<String> {
        match self {
            Level::Root => None,
            level => Some(format!("{}id", level)),
        }
    }

    /// Column title for identifiers at this level, e.g. `Lane Id`.
    pub fn title(self) -> &'static str {
        match self {
            Level::Root => "",
            Level::Project => "Project Id",
            Level::Experiment => "Experiment Id",
            Level::Replicate => "Replicate Id",
            Level::Lane => "Lane Id",
            Level::Read => "Read Id",
        }
    }

    /// Title for statistics resolved at this level, e.g. `Lane Level`.
    pub fn resolution_title(self) -> &'static str {
        match self {
            Level::Root => "",
            Level::Project => "Project Level",
            Level::Experiment => "Experiment Level",
            Level::Replicate => "Replicate Level",
            Level::Lane => "Lane Level",
            Level::Read => "Read Level",
        }
    }

    /// The level partitions are drawn from when a request is made at this level.
    pub fn partition_level(self) -> Level {
        match self {
            Level::Root => Level::Project,
            Level::Project => Level::Experiment,
            Level::Experiment => Level::Replicate,
            Level::Replicate => Level::Lane,
            Level::Lane | Level::Read => Level::Read,
        }
    }

    /// Levels strictly below `self`, down to and including `resolution`.
    pub fn levels_until(self, resolution: Level) -> Vec<Level> {
        Level::ALL
            .into_iter()
            .filter(|level| *level > self && *level <= resolution)
            .collect()
    }

    /// Levels from the root down to and including `self`.
    pub fn levels_from_root(self) -> Vec<Level> {
        Level::ALL
            .into_iter()
            .filter(|level| *level <= self)
            .collect()
    }
}

/// Statistic categories accepted in request paths
#[derive(Clone, Copy, Debug, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatType {
    Read,
    Mapping,
    Expression,
    Splicing,
    Discovery,
}

/// A unit of work: identifiers of the project, experiment, replicate, lane or read a query
/// applies to, plus any extra request parameters.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Configuration(BTreeMap<String, String>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this configuration with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Return the value for `key`, or an error if it is missing.
    pub fn require(&self, key: &str) -> Result<&str, StatsError> {
        self.get(key)
            .ok_or_else(|| StatsError::MissingConfigurationKey {
                key: key.to_string(),
            })
    }

    /// Return the identifier at `level`, or an error if it is missing.
    pub fn id(&self, level: Level) -> Result<&str, StatsError> {
        match level.key() {
            Some(key) => self.require(&key),
            None => Err(StatsError::MissingConfigurationKey {
                key: level.to_string(),
            }),
        }
    }

    /// Derive the configuration of a child at `level` with identifier `id`.
    pub fn child(&self, level: Level, id: impl Into<String>) -> Self {
        let mut child = self.clone();
        if let Some(key) = level.key() {
            child.insert(key, id);
        }
        child
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Configuration(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Configurations after expansion to the resolution level.
#[derive(Clone, Debug, PartialEq)]
pub enum Configurations {
    /// All configurations, merged into one aggregate
    Flat(Vec<Configuration>),
    /// Configurations grouped by partition key, in key order
    Partitioned(BTreeMap<String, Vec<Configuration>>),
}

/// Everything a statistic needs to know about a request.
#[derive(Clone, Debug)]
pub struct Context {
    /// Level of the request
    pub level: Level,
    /// Level at which the statistic is stored
    pub resolution: Level,
    /// Level partitions are labelled with
    pub partition_level: Level,
    /// Expanded configurations
    pub configurations: Configurations,
    /// Validated request parameters
    pub params: Configuration,
    /// Project settings
    pub settings: Arc<Settings>,
}

impl Context {
    /// The flat list of configurations.
    pub fn flat(&self) -> Result<&[Configuration], StatsError> {
        match &self.configurations {
            Configurations::Flat(configurations) => Ok(configurations),
            Configurations::Partitioned(_) => {
                Err(StatsError::ConfigurationShape { expected: "flat" })
            }
        }
    }

    /// Configurations grouped by partition key.
    pub fn partitions(&self) -> Result<&BTreeMap<String, Vec<Configuration>>, StatsError> {
        match &self.configurations {
            Configurations::Partitioned(partitions) => Ok(partitions),
            Configurations::Flat(_) => Err(StatsError::ConfigurationShape {
                expected: "partitioned",
            }),
        }
    }

    /// Label describing how many resolution-level sets a value was averaged over.
    ///
    /// # Arguments
    ///
    /// * `average_by`: Number of sets that contributed to the average
    pub fn average_label(&self, average_by: usize) -> String {
        match average_by {
            0 => String::new(),
            1 => format!("For one set of {}s", self.resolution),
            n => format!("Average over {} sets of {}s", n, self.resolution),
        }
    }
}

/// Parameters extracted from the request path
#[derive(Debug, Default, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResourcePath {
    #[validate(custom = "validate_identifier")]
    pub projectid: Option<String>,
    #[validate(custom = "validate_parameter_token")]
    pub parameter_list: Option<String>,
    #[validate(custom = "validate_parameter_token")]
    pub parameter_values: Option<String>,
    #[validate(custom = "validate_identifier")]
    pub replicateid: Option<String>,
    #[validate(custom = "validate_lane")]
    pub laneid: Option<String>,
    pub stattype: Option<StatType>,
    #[validate(custom = "validate_statistic_name")]
    pub statid: Option<String>,
}

impl ResourcePath {
    /// Convert into the request configuration, dropping the statistic selectors.
    pub fn into_configuration(self) -> Configuration {
        [
            ("projectid", self.projectid),
            ("parameter_list", self.parameter_list),
            ("parameter_values", self.parameter_values),
            ("replicateid", self.replicateid),
            ("laneid", self.laneid),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }
}

/// Check that a value is non-empty and only contains ASCII alphanumerics or `extra` characters.
fn validate_token(value: &str, extra: &[char], code: &'static str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || extra.contains(&c));
    if !valid {
        let mut error = ValidationError::new(code);
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validate a project or replicate identifier
fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    validate_token(value, &['_'], "identifier must be alphanumeric")
}

/// Validate a lane identifier
fn validate_lane(value: &str) -> Result<(), ValidationError> {
    validate_token(value, &['_', '.'], "lane identifier must be alphanumeric")
}

/// Validate a parameter list or parameter values
fn validate_parameter_token(value: &str) -> Result<(), ValidationError> {
    validate_token(value, &['-', '_', '.'], "parameters must be alphanumeric")
}

/// Validate the name of a statistic
fn validate_statistic_name(value: &str) -> Result<(), ValidationError> {
    validate_token(value, &['_'], "statistic name must be alphanumeric")
}
