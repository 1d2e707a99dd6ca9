//! Lookups of the children of a project, experiment, replicate or lane.
//!
//! Experiments are not stored explicitly. An experiment is the set of replicates of a project
//! sharing the same parameter values, and its identifier is those values joined with `-`.

use crate::error::StatsError;
use crate::models::{Configuration, Level};
use crate::settings::{Parameter, Settings};
use crate::source::{Direction, Query, StatsSource};
use crate::table::{Cell, Row};

use std::collections::BTreeSet;

/// Separator between parameter names or values in paths and experiment identifiers.
pub const PARAMETER_SEPARATOR: char = '-';

/// A replicate of a project together with its parameter values
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicateParameters {
    pub replicateid: String,
    /// One value per project parameter, defaults applied
    pub values: Vec<String>,
}

impl ReplicateParameters {
    /// Identifier of the experiment this replicate belongs to.
    pub fn experimentid(&self) -> String {
        self.values.join(&PARAMETER_SEPARATOR.to_string())
    }
}

/// Return the value of a cell, or the parameter default if it is null or empty.
fn value_or_default(parameter: &Parameter, cell: &Cell) -> String {
    let value = cell.to_string();
    if value.is_empty() {
        parameter.default.clone()
    } else {
        value
    }
}

/// First cell of each row as a string, skipping nulls.
fn first_column(rows: Vec<Row>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(|cell| !cell.is_null())
        .map(|cell| cell.to_string())
        .collect()
}

/// Return every replicate of the configuration's project with its parameter values.
pub async fn project_replicates(
    source: &dyn StatsSource,
    settings: &Settings,
    conf: &Configuration,
) -> Result<Vec<ReplicateParameters>, StatsError> {
    let projectid = conf.id(Level::Project)?;
    let parameters = settings.project_parameters(projectid)?;
    let columns: Vec<&str> = std::iter::once("experiment_id")
        .chain(parameters.iter().map(|parameter| parameter.column.as_str()))
        .collect();
    let query = Query::common("experiments", &columns)
        .filter_eq("project_id", projectid)
        .order_by("experiment_id", Direction::Ascending);
    let rows = source.fetch(&query, conf).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let replicateid = cells.next().unwrap_or(Cell::Null).to_string();
            let values = parameters
                .iter()
                .map(|parameter| value_or_default(parameter, &cells.next().unwrap_or(Cell::Null)))
                .collect();
            ReplicateParameters {
                replicateid,
                values,
            }
        })
        .collect())
}

/// Return the sorted, distinct experiment identifiers of the configuration's project.
pub async fn project_experiments(
    source: &dyn StatsSource,
    settings: &Settings,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    let experiments: BTreeSet<String> = project_replicates(source, settings, conf)
        .await?
        .iter()
        .map(ReplicateParameters::experimentid)
        .collect();
    Ok(experiments.into_iter().collect())
}

/// Return the parameters selecting the configuration's experiment, paired with their values.
///
/// The experiment is given either by `parameter_list` and `parameter_values` or by an
/// `experimentid` made of values for every project parameter. Without either, no parameters are
/// returned and the whole project is selected.
pub fn experiment_parameters<'a>(
    settings: &'a Settings,
    conf: &Configuration,
) -> Result<Vec<(&'a Parameter, String)>, StatsError> {
    let (parameters, values) = match (
        conf.get("parameter_list"),
        conf.get("parameter_values"),
        conf.get("experimentid"),
    ) {
        (Some(list), Some(values), _) => {
            let parameters = list
                .split(PARAMETER_SEPARATOR)
                .map(|name| settings.parameter(name))
                .collect::<Result<Vec<_>, _>>()?;
            (parameters, values)
        }
        (_, _, Some(experimentid)) => (
            settings.project_parameters(conf.id(Level::Project)?)?,
            experimentid,
        ),
        _ => return Ok(vec![]),
    };
    let values: Vec<&str> = values.split(PARAMETER_SEPARATOR).collect();
    if parameters.len() != values.len() {
        return Err(StatsError::ParameterMismatch {
            list: parameters.len(),
            values: values.len(),
        });
    }
    Ok(parameters
        .into_iter()
        .zip(values)
        .map(|(parameter, value)| (parameter, value.to_string()))
        .collect())
}

/// Query selecting `columns` of the replicates of the configuration's experiment, ordered by
/// identifier.
pub fn experiment_query<S: AsRef<str>>(
    settings: &Settings,
    conf: &Configuration,
    columns: &[S],
) -> Result<Query, StatsError> {
    let projectid = conf.id(Level::Project)?;
    let mut query = Query::common("experiments", columns).filter_eq("project_id", projectid);
    for (parameter, value) in experiment_parameters(settings, conf)? {
        // Defaults stand in for empty columns.
        query = if value == parameter.default {
            query.filter_eq_or_empty(parameter.column.clone(), value)
        } else {
            query.filter_eq(parameter.column.clone(), value)
        };
    }
    Ok(query.order_by("experiment_id", Direction::Ascending))
}

/// Return the replicates of the configuration's experiment, ordered by identifier.
pub async fn experiment_replicates(
    source: &dyn StatsSource,
    settings: &Settings,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    let query = experiment_query(settings, conf, &["experiment_id"])?;
    Ok(first_column(source.fetch(&query, conf).await?))
}

/// Return the lanes of the configuration's replicate, ordered by identifier.
pub async fn replicate_lanes(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    let query = Query::pipeline("dataset", &["pair_id"])
        .distinct()
        .order_by("pair_id", Direction::Ascending);
    Ok(first_column(source.fetch(&query, conf).await?))
}

/// Return the reads of the configuration's lane, ordered by identifier.
pub async fn lane_reads(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    let query = Query::pipeline("dataset", &["lane_id"])
        .distinct()
        .filter_eq("pair_id", conf.id(Level::Lane)?)
        .order_by("lane_id", Direction::Ascending);
    Ok(first_column(source.fetch(&query, conf).await?))
}

/// Return the identifiers of the children at `level` of the unit described by `conf`.
pub async fn children(
    source: &dyn StatsSource,
    settings: &Settings,
    level: Level,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    match level {
        Level::Root | Level::Project => Ok(vec![]),
        Level::Experiment => project_experiments(source, settings, conf).await,
        Level::Replicate => experiment_replicates(source, settings, conf).await,
        Level::Lane => replicate_lanes(source, conf).await,
        Level::Read => lane_reads(source, conf).await,
    }
}
