//! Statistics server API

use crate::app_state::{AppState, SharedAppState};
use crate::configurations::get_configurations;
use crate::error::StatsError;
use crate::hierarchy;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{Configuration, Level, ResourcePath};
use crate::table::Table;
use crate::validated_path::ValidatedPath;

use axum::{
    extract::State,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// `axum` service type
pub type Service = NormalizePath<Router>;

impl IntoResponse for Table {
    /// Render the table as JSON.
    fn into_response(self) -> Response {
        match serde_json::to_string(&self) {
            Ok(body) => (
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                body,
            )
                .into_response(),
            Err(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise table: {}", error),
            )
                .into_response(),
        }
    }
}

/// Returns a [axum::Router] for the statistics API
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn router(state: SharedAppState) -> Router {
    const STATISTIC: &str = "statistics/:stattype/:statid";

    Router::new()
        .route("/projects", get(projects))
        .route("/project/:projectid", get(project_info))
        .route("/project/:projectid/experiments", get(project_experiments))
        .route("/project/:projectid/experiments/table", get(experiments_table))
        .route("/project/:projectid/replicates", get(project_replicates))
        .route(
            "/project/:projectid/replicate/:replicateid",
            get(replicate_info),
        )
        .route(
            "/project/:projectid/:parameter_list/:parameter_values",
            get(experiment_info),
        )
        .route(
            "/project/:projectid/:parameter_list/:parameter_values/replicates",
            get(experiment_replicates),
        )
        .route(&format!("/project/:projectid/{}", STATISTIC), get(statistic))
        .route(
            &format!("/project/:projectid/:parameter_list/:parameter_values/{}", STATISTIC),
            get(statistic),
        )
        .route(
            &format!("/project/:projectid/replicate/:replicateid/{}", STATISTIC),
            get(statistic),
        )
        .route(
            &format!(
                "/project/:projectid/replicate/:replicateid/lane/:laneid/{}",
                STATISTIC
            ),
            get(statistic),
        )
        .route("/metrics", get(metrics_handler))
        .layer(
            TraceLayer::new_for_http()
                .on_request(request_counter)
                .on_response(record_response_metrics),
        )
        .with_state(state)
}

/// Returns an [axum::Router] wrapped in a service that trims trailing slashes
///
/// The [NormalizePath] layer has to wrap the router for the trimmed path to be routed.
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn service(state: SharedAppState) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Level of a request, given by the finest identifier in its path.
fn request_level(path: &ResourcePath) -> Level {
    if path.laneid.is_some() {
        Level::Lane
    } else if path.replicateid.is_some() {
        Level::Replicate
    } else if path.parameter_list.is_some() {
        Level::Experiment
    } else if path.projectid.is_some() {
        Level::Project
    } else {
        Level::Root
    }
}

/// Look up and compute a statistic.
///
/// # Arguments
///
/// * `state`: Application state
/// * `level`: Level of the request
/// * `key`: Registry key of the statistic, e.g. `lane_read_summary`
/// * `params`: Configuration taken from the request path
async fn dispatch(
    state: &AppState,
    level: Level,
    key: &str,
    params: Configuration,
) -> Result<Table, StatsError> {
    let entry = state.registry.get_at(key, level)?;
    if let Some(projectid) = params.get("projectid") {
        state.settings.project(projectid)?;
    }
    if params.get("parameter_list").is_some() {
        // Malformed experiment selectors are request errors, not empty expansions.
        hierarchy::experiment_parameters(&state.settings, &params)?;
    }
    debug!(%key, resolution = %entry.resolution, partition = entry.partition, "computing statistic");
    let source = state.source.as_ref();
    let context = get_configurations(
        source,
        state.settings.clone(),
        level,
        entry.resolution,
        entry.partition,
        params,
    )
    .await?;
    entry
        .statistic
        .compute(source, &context)
        .await
        .map_err(|error| error.unavailable(key))
}

async fn projects(State(state): State<SharedAppState>) -> Result<Table, StatsError> {
    dispatch(&state, Level::Root, "projects", Configuration::new()).await
}

async fn project_info(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(&state, Level::Project, "project_info", path.into_configuration()).await
}

async fn project_experiments(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(
        &state,
        Level::Root,
        "project_experiments",
        path.into_configuration(),
    )
    .await
}

async fn experiments_table(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(
        &state,
        Level::Project,
        "project_experimentstable",
        path.into_configuration(),
    )
    .await
}

async fn project_replicates(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(
        &state,
        Level::Root,
        "project_replicates",
        path.into_configuration(),
    )
    .await
}

async fn replicate_info(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(&state, Level::Root, "replicate_info", path.into_configuration()).await
}

async fn experiment_info(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(&state, Level::Root, "experiment_info", path.into_configuration()).await
}

async fn experiment_replicates(
    State(state): State<SharedAppState>,
    ValidatedPath(path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    dispatch(
        &state,
        Level::Root,
        "experiment_replicates",
        path.into_configuration(),
    )
    .await
}

/// Handler for every `.../statistics/:stattype/:statid` route
///
/// `statid` is the registry key, which names the level of the request, e.g.
/// `lane_read_summary` below a lane.
async fn statistic(
    State(state): State<SharedAppState>,
    ValidatedPath(mut path): ValidatedPath<ResourcePath>,
) -> Result<Table, StatsError> {
    let level = request_level(&path);
    let key = path.statid.take().unwrap_or_default();
    dispatch(&state, level, &key, path.into_configuration()).await
}
