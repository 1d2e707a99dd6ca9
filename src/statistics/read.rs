//! Read quality statistics, stored per read.

use crate::aggregate::{aggregate, collect};
use crate::error::StatsError;
use crate::models::{Configuration, Context, Level};
use crate::source::{Direction, Query, StatsSource};
use crate::statistic::Statistic;
use crate::statistics::{
    fill_profile, partition_column, percent, profile_columns, profile_point, read_counts, sum,
    whole,
};
use crate::table::{Cell, Column, Row, Table};

use async_trait::async_trait;

const READ_STATS: &str = "read_stats";
const TOTAL_READS: &str = "TotalReads";
const UNAMBIGUOUS: &str = "NoAmbiguousBases";
const AMBIGUOUS: &str = "AmbiguousBases";
const UNIQUE: &str = "UniqueReads";

/// Averaged unique, unambiguous and ambiguous reads with their share of all reads.
pub struct ReadSummary {}

#[async_trait]
impl Statistic for ReadSummary {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let columns = [TOTAL_READS, UNAMBIGUOUS, AMBIGUOUS, UNIQUE];
        let columns = &columns;
        let stats = aggregate(
            context.flat()?,
            move |conf| read_counts(source, READ_STATS, columns, conf),
            sum,
        )
        .await;
        let mut table = Table::new(vec![
            Column::string(context.average_label(stats.average_by())),
            Column::number("Total"),
            Column::number("Percent"),
        ]);
        let total = stats.average(&TOTAL_READS);
        for (label, key) in [
            ("Unique Reads", UNIQUE),
            ("Unambiguous Reads", UNAMBIGUOUS),
            ("Ambiguous Reads", AMBIGUOUS),
        ] {
            let row = match (stats.average(&key), total) {
                (Some(value), Some(total)) => vec![label.into(), whole(value), percent(value, total)],
                _ => vec![label.into(), Cell::Null, Cell::Null],
            };
            table.push(row)?;
        }
        Ok(table)
    }
}

/// Share of reads with some property, per partition
pub struct ReadPercentage {
    label: &'static str,
    column: &'static str,
}

impl ReadPercentage {
    pub const AMBIGUOUS: ReadPercentage = ReadPercentage {
        label: "Reads containing ambiguous nucleotides",
        column: AMBIGUOUS,
    };
    pub const UNAMBIGUOUS: ReadPercentage = ReadPercentage {
        label: "Reads containing only unambiguous nucleotides",
        column: UNAMBIGUOUS,
    };
    pub const UNIQUE: ReadPercentage = ReadPercentage {
        label: "Unique Reads",
        column: UNIQUE,
    };
}

#[async_trait]
impl Statistic for ReadPercentage {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![
            partition_column(context),
            Column::number(self.label),
        ]);
        let columns = [TOTAL_READS, self.column];
        let columns = &columns;
        for (partition, configurations) in context.partitions()? {
            let stats = aggregate(
                configurations,
                move |conf| read_counts(source, READ_STATS, columns, conf),
                sum,
            )
            .await;
            let value = match (stats.average(&self.column), stats.average(&TOTAL_READS)) {
                (Some(part), Some(total)) => percent(part, total),
                _ => Cell::Null,
            };
            table.push(vec![partition.as_str().into(), value])?;
        }
        Ok(table)
    }
}

/// Total, unambiguous and ambiguous reads per partition, followed by their sum.
pub struct TotalAmbiguousReads {}

#[async_trait]
impl Statistic for TotalAmbiguousReads {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![
            Column::string(""),
            Column::number("Total"),
            Column::number("Unambiguous"),
            Column::number("Ambiguous"),
        ]);
        let columns = [TOTAL_READS, UNAMBIGUOUS, AMBIGUOUS];
        let columns = &columns;
        let mut totals = [0.0; 3];
        for (partition, configurations) in context.partitions()? {
            let stats = aggregate(
                configurations,
                move |conf| read_counts(source, READ_STATS, columns, conf),
                sum,
            )
            .await;
            let mut row: Row = vec![partition.as_str().into()];
            match &stats.stats {
                // A partition with any missing read is left out of the totals.
                Some(counts) if stats.failed == 0 => {
                    for (total, column) in totals.iter_mut().zip(columns) {
                        let value = counts.get(column).copied().unwrap_or_default();
                        *total += value;
                        row.push(whole(value));
                    }
                }
                _ => row.extend([Cell::Null, Cell::Null, Cell::Null]),
            }
            table.push(row)?;
        }
        let mut row: Row = vec!["Total".into()];
        row.extend(totals.into_iter().map(whole));
        table.push(row)?;
        Ok(table)
    }
}

/// Average number of reads and unique reads per partition
pub struct AverageUniqueReads {}

#[async_trait]
impl Statistic for AverageUniqueReads {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![
            Column::string(""),
            Column::number("Average number of reads"),
            Column::number("Average number of unique reads"),
        ]);
        let columns = [TOTAL_READS, UNIQUE];
        let columns = &columns;
        for (partition, configurations) in context.partitions()? {
            let stats = aggregate(
                configurations,
                move |conf| read_counts(source, READ_STATS, columns, conf),
                sum,
            )
            .await;
            table.push(vec![
                partition.as_str().into(),
                stats.average(&TOTAL_READS).into(),
                stats.average(&UNIQUE).into(),
            ])?;
        }
        Ok(table)
    }
}

/// A per-position value of the reads, one column per partition
pub struct PositionProfile {
    suffix: &'static str,
    column: &'static str,
}

impl PositionProfile {
    pub const QUALITY: PositionProfile = PositionProfile {
        suffix: "qualitiespos",
        column: "mean",
    };
    pub const AMBIGUOUS: PositionProfile = PositionProfile {
        suffix: "ambiguous",
        column: "ambiguous",
    };

    async fn positions(
        &self,
        source: &dyn StatsSource,
        conf: &Configuration,
    ) -> Result<Vec<Row>, StatsError> {
        let query = Query::pipeline(self.suffix, &["position", self.column])
            .filter_eq("LaneName", conf.id(Level::Read)?)
            .order_by("position", Direction::Ascending);
        source.fetch(&query, conf).await
    }
}

#[async_trait]
impl Statistic for PositionProfile {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let partitions = context.partitions()?;
        let mut table = Table::new(profile_columns("Number", partitions.keys()));
        let mut points = vec![];
        for (index, configurations) in partitions.values().enumerate() {
            points.extend(
                collect(
                    configurations,
                    move |conf| self.positions(source, conf),
                    move |_, row| profile_point(index, row),
                )
                .await,
            );
        }
        table.extend(fill_profile(partitions.len(), points))?;
        Ok(table)
    }
}
