//! Lookup table from statistic keys to statistics.
//!
//! A statistic stored at some resolution can be requested at that level or any coarser one.
//! Registering it adds one key per level: the bare name at the root level and
//! `<level>_<name>` below it, e.g. `read_summary`, `project_read_summary`, ...,
//! `read_read_summary`.

use crate::error::StatsError;
use crate::models::Level;
use crate::statistic::Statistic;

use hashbrown::HashMap;
use std::sync::Arc;

/// A registered statistic and the levels it is computed for
#[derive(Clone)]
pub struct Entry {
    /// Name the statistic was registered under
    pub name: &'static str,
    pub statistic: Arc<dyn Statistic>,
    /// Level of requests using this key
    pub level: Level,
    /// Level at which the statistic is stored
    pub resolution: Level,
    /// Whether configurations are grouped by partition
    pub partition: bool,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("resolution", &self.resolution)
            .field("partition", &self.partition)
            .finish()
    }
}

/// Return the registry key of `name` at `level`.
pub fn key(level: Level, name: &str) -> String {
    match level {
        Level::Root => name.to_string(),
        level => format!("{}_{}", level, name),
    }
}

/// Builder collecting registrations until the registry is frozen
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<String, Entry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statistic under `name` for every level down to `resolution`.
    ///
    /// # Arguments
    ///
    /// * `name`: Name of the statistic
    /// * `resolution`: Level at which the statistic is stored
    /// * `partition`: Whether configurations are grouped by partition
    /// * `statistic`: The statistic
    pub fn register<S: Statistic + 'static>(
        mut self,
        name: &'static str,
        resolution: Level,
        partition: bool,
        statistic: S,
    ) -> Result<Self, StatsError> {
        let statistic: Arc<dyn Statistic> = Arc::new(statistic);
        for level in resolution.levels_from_root() {
            let key = key(level, name);
            if self.entries.contains_key(&key) {
                return Err(StatsError::DuplicateStatistic { key });
            }
            let entry = Entry {
                name,
                statistic: statistic.clone(),
                level,
                resolution,
                partition,
            };
            self.entries.insert(key, entry);
        }
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Immutable registry of statistics
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    /// Look up a statistic by key.
    pub fn get(&self, key: &str) -> Result<&Entry, StatsError> {
        self.entries
            .get(key)
            .ok_or_else(|| StatsError::UnknownStatistic {
                statistic: key.to_string(),
            })
    }

    /// Look up a statistic by key, requiring it to be registered for `level`.
    pub fn get_at(&self, key: &str, level: Level) -> Result<&Entry, StatsError> {
        let entry = self.get(key)?;
        if entry.level != level {
            return Err(StatsError::UnknownStatistic {
                statistic: key.to_string(),
            });
        }
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
