//! Expansion of a request into the configurations a statistic is computed over.
//!
//! A request names a unit at some level of the hierarchy, e.g. a replicate. Statistics are
//! stored at a finer resolution, e.g. per lane, so the request is expanded into one
//! configuration per lane of the replicate. Partitioned statistics additionally group the
//! expanded configurations by the identifier one level below the request.

use crate::aggregate::record_expand_failure;
use crate::error::StatsError;
use crate::hierarchy;
use crate::models::{Configuration, Configurations, Context, Level};
use crate::settings::Settings;
use crate::source::StatsSource;

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Replace each configuration with one configuration per child at `level`.
///
/// Configurations whose children cannot be looked up are dropped. Expanding to the root or
/// project level returns the configurations unchanged.
pub async fn configurations_for_level(
    source: &dyn StatsSource,
    settings: &Settings,
    configurations: Vec<Configuration>,
    level: Level,
) -> Vec<Configuration> {
    if level <= Level::Project {
        return configurations;
    }
    let mut expanded = vec![];
    for conf in configurations {
        match hierarchy::children(source, settings, level, &conf).await {
            Ok(ids) => expanded.extend(ids.into_iter().map(|id| conf.child(level, id))),
            Err(error) => record_expand_failure(&conf, &error),
        }
    }
    expanded
}

/// Group configurations by their identifier at `level`.
pub fn partition_configurations(
    configurations: Vec<Configuration>,
    level: Level,
) -> Result<BTreeMap<String, Vec<Configuration>>, StatsError> {
    let mut partitions: BTreeMap<String, Vec<Configuration>> = BTreeMap::new();
    for conf in configurations {
        let key = conf.id(level)?.to_string();
        partitions.entry(key).or_default().push(conf);
    }
    Ok(partitions)
}

/// Build the context of a statistic request.
///
/// # Arguments
///
/// * `source`: Source used for hierarchy lookups
/// * `settings`: Project settings
/// * `level`: Level of the request
/// * `resolution`: Level at which the statistic is stored
/// * `partition`: Whether to group configurations by partition
/// * `params`: Validated request parameters
pub async fn get_configurations(
    source: &dyn StatsSource,
    settings: Arc<Settings>,
    level: Level,
    resolution: Level,
    partition: bool,
    params: Configuration,
) -> Result<Context, StatsError> {
    let levels = level.levels_until(resolution);
    let mut configurations = vec![params.clone()];
    for next in &levels {
        configurations = configurations_for_level(source, &settings, configurations, *next).await;
    }
    debug!(
        %level,
        %resolution,
        count = configurations.len(),
        "expanded configurations"
    );
    let configurations = if partition {
        let key_level = levels.first().copied().unwrap_or(resolution);
        Configurations::Partitioned(partition_configurations(configurations, key_level)?)
    } else {
        Configurations::Flat(configurations)
    };
    Ok(Context {
        level,
        resolution,
        partition_level: level.partition_level(),
        configurations,
        params,
        settings,
    })
}
