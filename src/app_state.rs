use crate::cli::CommandLineArgs;
use crate::error::StatsError;
use crate::mysql::MySqlSource;
use crate::registry::Registry;
use crate::settings::Settings;
use crate::source::StatsSource;
use crate::statistics;

use expanduser::expanduser;
use std::sync::Arc;

/// Shared application state passed to each statistics request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Project settings.
    pub settings: Arc<Settings>,

    /// Every statistic, keyed by level and name.
    pub registry: Registry,

    /// Source of statistics data.
    pub source: Arc<dyn StatsSource>,
}

impl AppState {
    /// Create and return an [AppState] reading from MySQL.
    ///
    /// Loads the settings file and registers every statistic.
    pub fn new(args: &CommandLineArgs) -> Result<Self, StatsError> {
        let path = expanduser(&args.settings_file).map_err(|source| StatsError::SettingsRead {
            path: args.settings_file.clone(),
            source,
        })?;
        let settings = Arc::new(Settings::load(&path)?);
        let source = Arc::new(MySqlSource::new(args, settings.clone())?);
        Self::with_source(args, settings, source)
    }

    /// Create and return an [AppState] reading from any source.
    pub fn with_source(
        args: &CommandLineArgs,
        settings: Arc<Settings>,
        source: Arc<dyn StatsSource>,
    ) -> Result<Self, StatsError> {
        let registry = statistics::register_all(args.expression_selector)?;
        Ok(Self {
            args: args.clone(),
            settings,
            registry,
            source,
        })
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
