//! Merging and aggregation of per-configuration query results.
//!
//! A statistic usually runs the same query once per configuration and combines the results.
//! Individual queries may fail; such failures are logged and counted but never abort the
//! combination as a whole.

use crate::error::StatsError;
use crate::metrics::QUERY_FAILURES;
use crate::models::Configuration;

use hashbrown::HashMap;
use std::future::Future;
use std::hash::Hash;
use tracing::warn;

/// Merge strategy that keeps the right hand value.
pub fn overwrite<V>(_left: V, right: V) -> V {
    right
}

/// Merge two mappings.
///
/// Keys present in only one input keep their value; keys present in both are combined with
/// `combine(left, right)`.
///
/// # Arguments
///
/// * `left`: First mapping
/// * `right`: Second mapping
/// * `combine`: Strategy for keys present in both mappings
pub fn merge<K, V, F>(mut left: HashMap<K, V>, right: HashMap<K, V>, combine: F) -> HashMap<K, V>
where
    K: Eq + Hash,
    F: Fn(V, V) -> V,
{
    for (key, value) in right {
        let merged = match left.remove(&key) {
            Some(existing) => combine(existing, value),
            None => value,
        };
        left.insert(key, merged);
    }
    left
}

/// Result of aggregating a query over several configurations
#[derive(Debug, PartialEq)]
pub struct Aggregate<K: Eq + Hash, V> {
    /// Merged results, or `None` if no query succeeded
    pub stats: Option<HashMap<K, V>>,
    /// Number of failed queries
    pub failed: usize,
    /// Number of queries attempted
    pub attempted: usize,
}

impl<K: Eq + Hash, V> Aggregate<K, V> {
    /// Number of successful queries, i.e. the divisor for averages.
    pub fn average_by(&self) -> usize {
        self.attempted - self.failed
    }

    /// Return the averaged value for `key`, or `None` if nothing succeeded or the key is absent.
    pub fn average(&self, key: &K) -> Option<f64>
    where
        V: Copy + Into<f64>,
    {
        let average_by = self.average_by();
        if average_by == 0 {
            return None;
        }
        self.stats
            .as_ref()
            .and_then(|stats| stats.get(key))
            .map(|value| (*value).into() / average_by as f64)
    }
}

/// Record a failed query.
fn record_failure(stage: &str, conf: &Configuration, error: &StatsError) {
    warn!(stage, ?conf, %error, "query failed");
    QUERY_FAILURES.with_label_values(&[stage]).inc();
}

/// Run `query` once per configuration, in order, merging successful results.
///
/// # Arguments
///
/// * `configurations`: Configurations to query
/// * `query`: Query for a single configuration
/// * `combine`: Strategy for keys present in more than one result
pub async fn aggregate<'a, K, V, Q, Fut, F>(
    configurations: &'a [Configuration],
    query: Q,
    combine: F,
) -> Aggregate<K, V>
where
    K: Eq + Hash,
    Q: Fn(&'a Configuration) -> Fut,
    Fut: Future<Output = Result<HashMap<K, V>, StatsError>>,
    F: Fn(V, V) -> V,
{
    let mut stats: Option<HashMap<K, V>> = None;
    let mut failed = 0;
    for conf in configurations {
        match query(conf).await {
            Ok(result) => {
                stats = Some(match stats.take() {
                    Some(existing) => merge(existing, result, &combine),
                    None => result,
                });
            }
            Err(error) => {
                record_failure("aggregate", conf, &error);
                failed += 1;
            }
        }
    }
    Aggregate {
        stats,
        failed,
        attempted: configurations.len(),
    }
}

/// Run `query` once per configuration, in order, transforming and concatenating the rows of
/// successful results.
///
/// # Arguments
///
/// * `configurations`: Configurations to query
/// * `query`: Query for a single configuration
/// * `transform`: Applied to each row together with the configuration that produced it
pub async fn collect<'a, T, R, Q, Fut, F>(
    configurations: &'a [Configuration],
    query: Q,
    transform: F,
) -> Vec<R>
where
    Q: Fn(&'a Configuration) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StatsError>>,
    F: Fn(&Configuration, T) -> R,
{
    let mut results = vec![];
    for conf in configurations {
        match query(conf).await {
            Ok(rows) => results.extend(rows.into_iter().map(|row| transform(conf, row))),
            Err(error) => record_failure("collect", conf, &error),
        }
    }
    results
}

/// Await a single query, logging and discarding a failure.
pub async fn attempt<T, Fut>(conf: &Configuration, query: Fut) -> Option<T>
where
    Fut: Future<Output = Result<T, StatsError>>,
{
    match query.await {
        Ok(result) => Some(result),
        Err(error) => {
            record_failure("attempt", conf, &error);
            None
        }
    }
}

/// Log and count a failed hierarchy lookup.
pub(crate) fn record_expand_failure(conf: &Configuration, error: &StatsError) {
    record_failure("expand", conf, error);
}
