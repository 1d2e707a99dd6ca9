//! Project settings loaded from a JSON file.
//!
//! The settings describe which databases hold each project's pipeline results and which
//! experimental parameters distinguish the experiments of a project.
//!
//! ```json
//! {
//!   "parameters": [
//!     {"name": "cell", "label": "Cell Type", "column": "CellType"},
//!     {"name": "rnaExtract", "label": "RNA Type", "column": "RNAType"}
//!   ],
//!   "projects": {
//!     "ENCODE": {
//!       "pipeline_database": "encode_pipeline",
//!       "common_database": "encode_common",
//!       "parameters": ["cell", "rnaExtract"]
//!     }
//!   }
//! }
//! ```

use crate::error::StatsError;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use validator::{Validate, ValidationError};

/// Default value of a parameter that is not set for an experiment.
const DEFAULT_PARAMETER_VALUE: &str = "@";

fn default_parameter_value() -> String {
    DEFAULT_PARAMETER_VALUE.to_string()
}

/// An experimental parameter, such as the cell type or RNA extract.
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct Parameter {
    /// Name used in request paths, e.g. `cell`
    #[validate(custom = "validate_parameter_name")]
    pub name: String,
    /// Human readable label, e.g. `Cell Type`
    pub label: String,
    /// Column of the `experiments` table holding the value
    #[validate(custom = "validate_sql_name")]
    pub column: String,
    /// Value used when the column is empty
    #[serde(default = "default_parameter_value")]
    pub default: String,
}

/// Databases and parameters of a single project
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSettings {
    /// Database holding per-replicate pipeline tables
    pub pipeline_database: String,
    /// Database holding the shared `experiments` and `projects` tables
    pub common_database: String,
    /// Names of the parameters distinguishing this project's experiments, in order.
    /// Defaults to all parameters.
    #[serde(default)]
    pub parameters: Option<Vec<String>>,
}

/// Settings for all projects
#[derive(Clone, Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_settings"))]
pub struct Settings {
    /// All known parameters, in display order
    #[validate]
    pub parameters: Vec<Parameter>,
    /// Projects keyed by project identifier
    pub projects: BTreeMap<String, ProjectSettings>,
}

impl Settings {
    /// Load and validate settings from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path`: Path of the settings file
    pub fn load(path: &Path) -> Result<Self, StatsError> {
        let json = std::fs::read_to_string(path).map_err(|source| StatsError::SettingsRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&json)
    }

    /// Parse and validate settings from a JSON string.
    pub fn parse(json: &str) -> Result<Self, StatsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate().map_err(StatsError::InvalidSettings)?;
        Ok(settings)
    }

    /// Return the settings of a project.
    pub fn project(&self, projectid: &str) -> Result<&ProjectSettings, StatsError> {
        self.projects
            .get(projectid)
            .ok_or_else(|| StatsError::UnknownProject {
                project: projectid.to_string(),
            })
    }

    /// Return a parameter by name.
    pub fn parameter(&self, name: &str) -> Result<&Parameter, StatsError> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .ok_or_else(|| StatsError::UnknownParameter {
                parameter: name.to_string(),
            })
    }

    /// Return the parameters distinguishing the experiments of a project, in order.
    pub fn project_parameters(&self, projectid: &str) -> Result<Vec<&Parameter>, StatsError> {
        match &self.project(projectid)?.parameters {
            Some(names) => names.iter().map(|name| self.parameter(name)).collect(),
            None => Ok(self.parameters.iter().collect()),
        }
    }
}

/// Validate a parameter name
fn validate_parameter_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        let mut error = ValidationError::new("parameter name must be alphanumeric");
        error.add_param("name".into(), &name);
        return Err(error);
    }
    Ok(())
}

/// Validate a database or column name
fn validate_sql_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        let mut error = ValidationError::new("name must only contain alphanumerics or _");
        error.add_param("name".into(), &name);
        return Err(error);
    }
    Ok(())
}

/// Validate that projects refer to known parameters and valid databases
fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    for (projectid, project) in &settings.projects {
        validate_sql_name(projectid)?;
        validate_sql_name(&project.pipeline_database)?;
        validate_sql_name(&project.common_database)?;
        for name in project.parameters.iter().flatten() {
            if settings.parameter(name).is_err() {
                let mut error = ValidationError::new("project refers to an unknown parameter");
                error.add_param("project".into(), &projectid);
                error.add_param("parameter".into(), &name);
                return Err(error);
            }
        }
    }
    Ok(())
}
