use crate::error::StatsError;
use crate::models::{Configuration, Configurations, Context, Level};
use crate::settings::Settings;
use crate::source::{Query, StatsSource};
use crate::table::Row;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type Handler = dyn Fn(&Query, &Configuration) -> Result<Vec<Row>, StatsError> + Send + Sync;

/// In-memory [StatsSource] answering queries with a closure.
pub(crate) struct FakeSource {
    handler: Box<Handler>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&Query, &Configuration) -> Result<Vec<Row>, StatsError> + Send + Sync + 'static,
    {
        FakeSource {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that fails every query with an empty result.
    pub(crate) fn empty() -> Self {
        Self::new(|query, _| Err(empty_result(query)))
    }

    /// Number of queries run so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsSource for FakeSource {
    async fn fetch(&self, query: &Query, conf: &Configuration) -> Result<Vec<Row>, StatsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.handler)(query, conf)
    }
}

/// The error a source returns for a missing table or row.
pub(crate) fn empty_result(query: &Query) -> StatsError {
    StatsError::EmptyResult {
        relation: query.relation.name().to_string(),
    }
}

/// Settings with two projects: `P` using two parameters and `Q` using all three.
pub(crate) fn settings() -> Settings {
    Settings::parse(
        r#"{
            "parameters": [
                {"name": "cell", "label": "Cell Type", "column": "CellType"},
                {"name": "rnaExtract", "label": "RNA Type", "column": "RNAType"},
                {"name": "bio_replicate", "label": "Bio Replicate", "column": "Bioreplicate", "default": "1"}
            ],
            "projects": {
                "P": {
                    "pipeline_database": "p_pipeline",
                    "common_database": "p_common",
                    "parameters": ["cell", "rnaExtract"]
                },
                "Q": {"pipeline_database": "q_pipeline", "common_database": "q_common"}
            }
        }"#,
    )
    .unwrap()
}

/// Configuration of lane `laneid` in replicate `replicateid` of project `P`.
pub(crate) fn lane(replicateid: &str, laneid: &str) -> Configuration {
    Configuration::new()
        .with("projectid", "P")
        .with("replicateid", replicateid)
        .with("laneid", laneid)
}

/// Configuration of read `readid` of a lane in project `P`.
pub(crate) fn read(replicateid: &str, laneid: &str, readid: &str) -> Configuration {
    lane(replicateid, laneid).with("readid", readid)
}

/// Context with the given levels and configurations, using [settings].
pub(crate) fn context(level: Level, resolution: Level, configurations: Configurations) -> Context {
    Context {
        level,
        resolution,
        partition_level: level.partition_level(),
        configurations,
        params: Configuration::new().with("projectid", "P"),
        settings: Arc::new(settings()),
    }
}
