//! Error handling.

use axum::{
    extract::rejection::PathRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// Statistics server error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Row pushed into a table with the wrong number of cells
    #[error("row has {found} values but the table has {expected} columns")]
    ColumnCount { expected: usize, found: usize },

    /// Statistic received configurations in a shape it cannot handle
    #[error("statistic expects {expected} configurations")]
    ConfigurationShape { expected: &'static str },

    /// Error while querying a project database
    #[error("database query failed")]
    Database(#[from] sqlx::Error),

    /// A statistic was registered twice under the same key
    #[error("statistic {key} is already registered")]
    DuplicateStatistic { key: String },

    /// A query returned no rows where at least one was required
    #[error("no rows found in {relation}")]
    EmptyResult { relation: String },

    /// A table or column name contained characters outside the allowed set
    #[error("invalid SQL identifier {identifier:?}")]
    InvalidIdentifier { identifier: String },

    /// Settings file failed validation
    #[error("settings are not valid")]
    InvalidSettings(#[source] validator::ValidationErrors),

    /// A configuration lacks a key required at this detail level
    #[error("configuration is missing {key}")]
    MissingConfigurationKey { key: String },

    /// Parameter list and parameter values differ in length
    #[error("parameter list has {list} entries but {values} values were given")]
    ParameterMismatch { list: usize, values: usize },

    /// Error extracting the request path
    #[error("request path is not valid")]
    RequestPathRejection(#[from] PathRejection),

    /// Error validating the request path (single error)
    #[error("request path is not valid")]
    RequestPathValidationSingle(#[from] validator::ValidationError),

    /// Error validating the request path (multiple errors)
    #[error("request path is not valid")]
    RequestPathValidation(#[from] validator::ValidationErrors),

    /// Error reading the settings file
    #[error("failed to read settings file {path}")]
    SettingsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing the settings file
    #[error("failed to parse settings file")]
    SettingsParse(#[from] serde_json::Error),

    /// The queries behind a statistic failed
    #[error("statistic {statistic} is not available")]
    StatisticUnavailable {
        statistic: String,
        #[source]
        source: Box<StatsError>,
    },

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// Parameter name not present in the settings
    #[error("unknown parameter {parameter}")]
    UnknownParameter { parameter: String },

    /// Project not present in the settings
    #[error("unknown project {project}")]
    UnknownProject { project: String },

    /// Statistic not present in the registry
    #[error("unknown statistic {statistic}")]
    UnknownStatistic { statistic: String },
}

impl StatsError {
    /// Wrap an error raised while computing a statistic.
    ///
    /// Query failures become [StatsError::StatisticUnavailable] so that they are reported as
    /// missing data. Everything else is passed through untouched.
    ///
    /// # Arguments
    ///
    /// * `statistic`: Registry key of the statistic
    pub fn unavailable(self, statistic: &str) -> Self {
        match self {
            StatsError::Database(_) | StatsError::EmptyResult { .. } => {
                StatsError::StatisticUnavailable {
                    statistic: statistic.to_string(),
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }
}

impl IntoResponse for StatsError {
    /// Convert from a `StatsError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<StatsError> for ErrorResponse {
    /// Convert from a `StatsError` into an `ErrorResponse`.
    fn from(error: StatsError) -> Self {
        let response = match &error {
            // Bad request
            StatsError::InvalidIdentifier { identifier: _ }
            | StatsError::ParameterMismatch { list: _, values: _ }
            | StatsError::RequestPathRejection(_)
            | StatsError::RequestPathValidationSingle(_)
            | StatsError::RequestPathValidation(_) => Self::bad_request(&error),

            // Not found
            StatsError::EmptyResult { relation: _ }
            | StatsError::StatisticUnavailable {
                statistic: _,
                source: _,
            }
            | StatsError::UnknownProject { project: _ }
            | StatsError::UnknownStatistic { statistic: _ } => Self::not_found(&error),

            // Internal server error
            StatsError::ColumnCount {
                expected: _,
                found: _,
            }
            | StatsError::ConfigurationShape { expected: _ }
            | StatsError::Database(_)
            | StatsError::DuplicateStatistic { key: _ }
            | StatsError::InvalidSettings(_)
            | StatsError::MissingConfigurationKey { key: _ }
            | StatsError::SettingsRead { path: _, source: _ }
            | StatsError::SettingsParse(_)
            | StatsError::TryFromInt(_)
            | StatsError::UnknownParameter { parameter: _ } => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::HeaderMap;

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    async fn test_stats_error(
        error: StatsError,
        status: StatusCode,
        message: &str,
        caused_by: Option<Vec<&'static str>>,
    ) {
        let response = error.into_response();
        assert_eq!(status, response.status());
        let mut headers = HeaderMap::new();
        headers.insert(&header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(headers, *response.headers());
        let error_response: ErrorResponse =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(message.to_string(), error_response.error.message);
        // Map Vec items from str to String
        let caused_by = caused_by.map(|cb| cb.iter().map(|s| s.to_string()).collect());
        assert_eq!(caused_by, error_response.error.caused_by);
    }

    #[tokio::test]
    async fn column_count_error() {
        let error = StatsError::ColumnCount {
            expected: 3,
            found: 2,
        };
        let message = "row has 2 values but the table has 3 columns";
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn configuration_shape_error() {
        let error = StatsError::ConfigurationShape {
            expected: "partitioned",
        };
        let message = "statistic expects partitioned configurations";
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn database_error() {
        let error = StatsError::Database(sqlx::Error::RowNotFound);
        let message = "database query failed";
        let caused_by = Some(vec![
            "no rows returned by a query that expected to return at least one row",
        ]);
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn empty_result_error() {
        let error = StatsError::EmptyResult {
            relation: "read_stats".to_string(),
        };
        let message = "no rows found in read_stats";
        test_stats_error(error, StatusCode::NOT_FOUND, message, None).await;
    }

    #[tokio::test]
    async fn invalid_identifier_error() {
        let error = StatsError::InvalidIdentifier {
            identifier: "a`b".to_string(),
        };
        let message = "invalid SQL identifier \"a`b\"";
        test_stats_error(error, StatusCode::BAD_REQUEST, message, None).await;
    }

    #[tokio::test]
    async fn missing_configuration_key_error() {
        let error = StatsError::MissingConfigurationKey {
            key: "laneid".to_string(),
        };
        let message = "configuration is missing laneid";
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, None).await;
    }

    #[tokio::test]
    async fn parameter_mismatch_error() {
        let error = StatsError::ParameterMismatch { list: 2, values: 1 };
        let message = "parameter list has 2 entries but 1 values were given";
        test_stats_error(error, StatusCode::BAD_REQUEST, message, None).await;
    }

    #[tokio::test]
    async fn request_path_validation_single() {
        let validation_error = validator::ValidationError::new("foo");
        let error = StatsError::RequestPathValidationSingle(validation_error);
        let message = "request path is not valid";
        let caused_by = Some(vec!["Validation error: foo [{}]"]);
        test_stats_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn request_path_validation() {
        let mut validation_errors = validator::ValidationErrors::new();
        let validation_error = validator::ValidationError::new("foo");
        validation_errors.add("bar", validation_error);
        let error = StatsError::RequestPathValidation(validation_errors);
        let message = "request path is not valid";
        let caused_by = Some(vec!["bar: Validation error: foo [{}]"]);
        test_stats_error(error, StatusCode::BAD_REQUEST, message, caused_by).await;
    }

    #[tokio::test]
    async fn settings_read_error() {
        let error = StatsError::SettingsRead {
            path: "/tmp/projects.json".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let message = "failed to read settings file /tmp/projects.json";
        let caused_by = Some(vec!["entity not found"]);
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn statistic_unavailable_error() {
        let error = StatsError::EmptyResult {
            relation: "read_stats".to_string(),
        }
        .unavailable("read_summary");
        let message = "statistic read_summary is not available";
        let caused_by = Some(vec!["no rows found in read_stats"]);
        test_stats_error(error, StatusCode::NOT_FOUND, message, caused_by).await;
    }

    #[test]
    fn unavailable_passes_invariant_errors_through() {
        let error = StatsError::ColumnCount {
            expected: 2,
            found: 1,
        }
        .unavailable("read_summary");
        assert!(matches!(error, StatsError::ColumnCount { .. }));
    }

    #[tokio::test]
    async fn try_from_int_error() {
        let error = StatsError::TryFromInt(u8::try_from(-1_i8).unwrap_err());
        let message = "out of range integral type conversion attempted";
        let caused_by = None;
        test_stats_error(error, StatusCode::INTERNAL_SERVER_ERROR, message, caused_by).await;
    }

    #[tokio::test]
    async fn unknown_project_error() {
        let error = StatsError::UnknownProject {
            project: "foo".to_string(),
        };
        let message = "unknown project foo";
        test_stats_error(error, StatusCode::NOT_FOUND, message, None).await;
    }

    #[tokio::test]
    async fn unknown_statistic_error() {
        let error = StatsError::UnknownStatistic {
            statistic: "foo".to_string(),
        };
        let message = "unknown statistic foo";
        test_stats_error(error, StatusCode::NOT_FOUND, message, None).await;
    }
}
