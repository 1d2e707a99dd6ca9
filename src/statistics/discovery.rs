//! Novel junction discovery, stored per replicate.

use crate::aggregate::collect;
use crate::error::StatsError;
use crate::models::{Configuration, Context};
use crate::source::{Direction, Query, StatsSource};
use crate::statistic::Statistic;
use crate::statistics::insert_replicate;
use crate::table::{top_rows, Column, ColumnType, Row, Table};

use async_trait::async_trait;

const TOP_LIMIT: usize = 20;

/// Novel junctions with the most supporting reads
pub struct NovelJunctions {
    suffix: &'static str,
    /// Selected columns; the last one names the lane
    columns: &'static [&'static str],
    /// Column ranking the junctions
    support: &'static str,
    /// Junction types left out
    exclude_type: Option<&'static str>,
    /// Descriptors of the selected columns except the lane
    description: &'static [(&'static str, ColumnType)],
}

impl NovelJunctions {
    /// Junctions between annotated exons.
    pub const ANNOTATED: NovelJunctions = NovelJunctions {
        suffix: "novel_junctions_summary",
        columns: &["chr", "start", "end", "support", "sample"],
        support: "support",
        exclude_type: None,
        description: &[
            ("chr", ColumnType::String),
            ("start", ColumnType::Number),
            ("end", ColumnType::Number),
            ("# Reads", ColumnType::Number),
        ],
    };
    /// Split mappings outside annotated exons.
    pub const UNANNOTATED: NovelJunctions = NovelJunctions {
        suffix: "split_mapping_breakdown",
        columns: &["start_chr", "end_chr", "start", "end", "number", "filename"],
        support: "number",
        exclude_type: Some("close"),
        description: &[
            ("start chr", ColumnType::String),
            ("end chr", ColumnType::String),
            ("start", ColumnType::Number),
            ("end", ColumnType::Number),
            ("# Reads", ColumnType::Number),
        ],
    };

    async fn junctions(
        &self,
        source: &dyn StatsSource,
        conf: &Configuration,
    ) -> Result<Vec<Row>, StatsError> {
        let mut query = Query::pipeline(self.suffix, self.columns);
        if let Some(exclude) = self.exclude_type {
            query = query.filter_ne("type", exclude);
        }
        let query = query
            .order_by(self.support, Direction::Descending)
            .limit(TOP_LIMIT as u32);
        source.fetch(&query, conf).await
    }
}

#[async_trait]
impl Statistic for NovelJunctions {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut description: Vec<Column> = self
            .description
            .iter()
            .map(|(label, kind)| Column(label.to_string(), *kind))
            .collect();
        description.push(Column::string("Replicate Id"));
        description.push(Column::string("Lane Id"));
        let mut table = Table::new(description);
        let rows = collect(
            context.flat()?,
            move |conf| self.junctions(source, conf),
            insert_replicate,
        )
        .await;
        // The support column is the last one before the lane.
        table.extend(top_rows(rows, self.columns.len() - 2, TOP_LIMIT))?;
        Ok(table.or_null_row())
    }
}
