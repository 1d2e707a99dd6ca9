//! Query descriptions and the trait implemented by statistics data sources.

use crate::error::StatsError;
use crate::models::{Configuration, Level};
use crate::table::Row;

use async_trait::async_trait;

/// Database holding a relation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Database {
    /// Per-project pipeline results
    Pipeline,
    /// Tables shared between the replicates of a project
    Common,
}

/// A table a query reads from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    /// A table with a fixed name, e.g. `experiments`
    Shared(&'static str),
    /// A per-replicate table named `<projectid>_<replicateid>_<suffix>`
    Replicate(&'static str),
}

impl Relation {
    /// Table name, or the suffix of per-replicate tables.
    pub fn name(self) -> &'static str {
        match self {
            Relation::Shared(name) | Relation::Replicate(name) => name,
        }
    }
}

/// Sort direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A condition on a column
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Equal(String, String),
    /// Equal to the value, `NULL` or the empty string
    EqualOrEmpty(String, String),
    NotEqual(String, String),
    In(String, Vec<String>),
}

/// Declarative description of a single `SELECT`.
///
/// Values only ever appear in filters so that backends can bind them as parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub database: Database,
    pub relation: Relation,
    pub columns: Vec<String>,
    pub distinct: bool,
    pub filters: Vec<Filter>,
    pub order_by: Vec<(String, Direction)>,
    pub limit: Option<u32>,
}

impl Query {
    /// Start a query selecting `columns` from `relation`.
    pub fn select<S: AsRef<str>>(database: Database, relation: Relation, columns: &[S]) -> Self {
        Query {
            database,
            relation,
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            distinct: false,
            filters: vec![],
            order_by: vec![],
            limit: None,
        }
    }

    /// Select from the per-replicate pipeline table with the given suffix.
    pub fn pipeline<S: AsRef<str>>(suffix: &'static str, columns: &[S]) -> Self {
        Self::select(Database::Pipeline, Relation::Replicate(suffix), columns)
    }

    /// Select from a shared table in the common database.
    pub fn common<S: AsRef<str>>(table: &'static str, columns: &[S]) -> Self {
        Self::select(Database::Common, Relation::Shared(table), columns)
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Equal(column.into(), value.into()));
        self
    }

    pub fn filter_eq_or_empty(
        mut self,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.filters
            .push(Filter::EqualOrEmpty(column.into(), value.into()));
        self
    }

    pub fn filter_ne(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .push(Filter::NotEqual(column.into(), value.into()));
        self
    }

    pub fn filter_in(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        self.filters.push(Filter::In(column.into(), values));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Name of the table this query reads for a configuration.
    pub fn table_name(&self, conf: &Configuration) -> Result<String, StatsError> {
        match self.relation {
            Relation::Shared(name) => Ok(name.to_string()),
            Relation::Replicate(suffix) => Ok(format!(
                "{}_{}_{}",
                conf.id(Level::Project)?,
                conf.id(Level::Replicate)?,
                suffix
            )),
        }
    }

    /// Value of the first equality filter on `column`.
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters.iter().find_map(|filter| match filter {
            Filter::Equal(c, value) if c == column => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Source of statistics rows.
///
/// This forms the contract between statistics and the databases they read.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Run a query for a configuration.
    ///
    /// Returns the rows in the order produced by the query, with one cell per selected column.
    ///
    /// # Arguments
    ///
    /// * `query`: Query to run
    /// * `conf`: Configuration identifying the project and, for per-replicate tables, the
    ///   replicate
    async fn fetch(&self, query: &Query, conf: &Configuration) -> Result<Vec<Row>, StatsError>;
}

/// Return the first row of a result, or an error naming the relation if there is none.
pub fn first_row(rows: Vec<Row>, query: &Query) -> Result<Row, StatsError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StatsError::EmptyResult {
            relation: query.relation.name().to_string(),
        })
}
