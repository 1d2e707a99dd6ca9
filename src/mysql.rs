//! MySQL implementation of [StatsSource].
//!
//! Queries are rendered into SQL in which every value is a bound parameter. Identifiers cannot be
//! bound, so database, table and column names are checked against an allow-list and quoted with
//! backticks. A single connection pool serves every project; tables are qualified with the
//! project's database from the settings.

use crate::cli::CommandLineArgs;
use crate::error::StatsError;
use crate::models::{Configuration, Level};
use crate::settings::{ProjectSettings, Settings};
use crate::source::{Database, Direction, Filter, Query, StatsSource};
use crate::table::{Cell, Row};

use async_trait::async_trait;
use itertools::Itertools;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Row as _, TypeInfo, ValueRef};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Statistics source reading the MySQL databases named in the project settings
pub struct MySqlSource {
    pool: MySqlPool,
    settings: Arc<Settings>,
}

impl MySqlSource {
    /// Create a source with a lazily connecting pool.
    ///
    /// No connection is made until the first query, so the server starts even if the database is
    /// down.
    ///
    /// # Arguments
    ///
    /// * `args`: Command line arguments holding the database URL and pool limits
    /// * `settings`: Project settings naming each project's databases
    pub fn new(args: &CommandLineArgs, settings: Arc<Settings>) -> Result<Self, StatsError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(args.acquire_timeout))
            .connect_lazy(args.database_url.as_str())?;
        info!(
            host = args.database_url.host_str(),
            max_connections = args.max_connections,
            "created database pool"
        );
        Ok(MySqlSource { pool, settings })
    }
}

#[async_trait]
impl StatsSource for MySqlSource {
    async fn fetch(&self, query: &Query, conf: &Configuration) -> Result<Vec<Row>, StatsError> {
        let project = self.settings.project(conf.id(Level::Project)?)?;
        let (sql, binds) = render(query, conf, project)?;
        debug!(%sql, ?binds, "running query");
        let mut statement = sqlx::query(&sql);
        for value in binds {
            statement = statement.bind(value);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Check that an identifier only contains `[A-Za-z0-9_.-]` and quote it with backticks.
pub fn quote_identifier(identifier: &str) -> Result<String, StatsError> {
    let valid = !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(StatsError::InvalidIdentifier {
            identifier: identifier.to_string(),
        });
    }
    Ok(format!("`{}`", identifier))
}

/// Render a query into SQL and the values to bind to its placeholders, in order.
///
/// # Arguments
///
/// * `query`: Query to render
/// * `conf`: Configuration naming the project and replicate of per-replicate tables
/// * `project`: Settings of the configuration's project
pub fn render(
    query: &Query,
    conf: &Configuration,
    project: &ProjectSettings,
) -> Result<(String, Vec<String>), StatsError> {
    let database = match query.database {
        Database::Pipeline => &project.pipeline_database,
        Database::Common => &project.common_database,
    };
    let columns = query
        .columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sql = String::from("SELECT ");
    if query.distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&columns.join(", "));
    sql.push_str(&format!(
        " FROM {}.{}",
        quote_identifier(database)?,
        quote_identifier(&query.table_name(conf)?)?
    ));

    let mut binds = vec![];
    let mut conditions = vec![];
    for filter in &query.filters {
        let condition = match filter {
            Filter::Equal(column, value) => {
                binds.push(value.clone());
                format!("{} = ?", quote_identifier(column)?)
            }
            Filter::EqualOrEmpty(column, value) => {
                let column = quote_identifier(column)?;
                binds.push(value.clone());
                format!("({0} = ? OR {0} IS NULL OR {0} = '')", column)
            }
            Filter::NotEqual(column, value) => {
                binds.push(value.clone());
                format!("{} != ?", quote_identifier(column)?)
            }
            // Nothing is in an empty set.
            Filter::In(_, values) if values.is_empty() => "1 = 0".to_string(),
            Filter::In(column, values) => {
                binds.extend(values.iter().cloned());
                format!(
                    "{} IN ({})",
                    quote_identifier(column)?,
                    values.iter().map(|_| "?").join(", ")
                )
            }
        };
        conditions.push(condition);
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if !query.order_by.is_empty() {
        let order = query
            .order_by
            .iter()
            .map(|(column, direction)| {
                let direction = match direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                Ok(format!("{} {}", quote_identifier(column)?, direction))
            })
            .collect::<Result<Vec<_>, StatsError>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    Ok((sql, binds))
}

/// Decode every column of a result row into a cell.
fn decode_row(row: &MySqlRow) -> Result<Row, StatsError> {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

/// Decode a single column by its MySQL type.
///
/// Integers of any width decode as [Cell::Int], floating point and decimal numbers as
/// [Cell::Float]. Bit fields are read as big endian integers and dates are formatted. Everything
/// else is text.
fn decode_cell(row: &MySqlRow, index: usize) -> Result<Cell, StatsError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Cell::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let (type_name, unsigned) = column_type(&type_name);
    let cell = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            // Signed decoding sign-extends the stored bytes.
            if unsigned {
                unsigned_cell(row.try_get_unchecked::<u64, _>(index)?)
            } else {
                Cell::Int(row.try_get_unchecked::<i64, _>(index)?)
            }
        }
        "FLOAT" => Cell::Float(row.try_get_unchecked::<f32, _>(index)? as f64),
        "DOUBLE" => Cell::Float(row.try_get_unchecked::<f64, _>(index)?),
        "DECIMAL" => {
            let text = row.try_get_unchecked::<String, _>(index)?;
            text.parse::<f64>().map_or(Cell::Str(text), Cell::Float)
        }
        "BIT" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Cell::Int(bit_value(&bytes))
        }
        "DATE" | "DATETIME" | "TIMESTAMP" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Cell::Str(date_text(&bytes))
        }
        _ => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Cell::Str(String::from_utf8_lossy(&bytes).into_owned())
        }
    };
    Ok(cell)
}

/// Split a MySQL type name into its base name and whether it is unsigned.
fn column_type(type_name: &str) -> (&str, bool) {
    match type_name.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (type_name, false),
    }
}

/// Cell of an unsigned integer. Values beyond `i64::MAX` become floats.
fn unsigned_cell(value: u64) -> Cell {
    i64::try_from(value).map_or(Cell::Float(value as f64), Cell::Int)
}

/// Text of a date or timestamp, e.g. `2010-01-01` or `2010-01-01 12:30:00`.
///
/// Binary results encode these as a length byte followed by a little endian year, then month,
/// day, hour, minute and second bytes. Text results already hold the formatted value.
fn date_text(bytes: &[u8]) -> String {
    let packed = match bytes.split_first() {
        Some((length, rest)) if usize::from(*length) == rest.len() => rest,
        _ => return String::from_utf8_lossy(bytes).into_owned(),
    };
    match packed {
        [] => "0000-00-00".to_string(),
        [y0, y1, month, day] => {
            format!("{:04}-{:02}-{:02}", u16::from_le_bytes([*y0, *y1]), month, day)
        }
        [y0, y1, month, day, hour, minute, second, ..] => format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            u16::from_le_bytes([*y0, *y1]),
            month,
            day,
            hour,
            minute,
            second
        ),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Value of a big endian bit field.
fn bit_value(bytes: &[u8]) -> i64 {
    bytes
        .iter()
        .fold(0i64, |value, byte| (value << 8) | i64::from(*byte))
}
