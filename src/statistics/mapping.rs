//! Mapping statistics, stored per read.

use crate::aggregate::aggregate;
use crate::error::StatsError;
use crate::models::Context;
use crate::source::StatsSource;
use crate::statistic::Statistic;
use crate::statistics::{partition_column, percent, read_counts, sum, whole};
use crate::table::{Cell, Column, Row, Table};

use async_trait::async_trait;

const MERGED_MAPPING: &str = "merged_mapping";
const TOTAL_READS: &str = "totalReads";
const MAPPED_READS: &str = "mappedReads";
const UNIQUE_READS: &str = "uniqueReads";
const ONE_ZERO_ZERO: &str = "100uniqueReads";

/// Averaged uniquely mapped, multi-mapped and unmapped reads.
pub struct MappingSummary {}

#[async_trait]
impl Statistic for MappingSummary {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let columns = [TOTAL_READS, UNIQUE_READS, MAPPED_READS];
        let columns = &columns;
        let stats = aggregate(
            context.flat()?,
            move |conf| read_counts(source, MERGED_MAPPING, columns, conf),
            sum,
        )
        .await;
        let mut table = Table::new(vec![
            Column::string(context.average_label(stats.average_by())),
            Column::number("Total"),
            Column::number("Percent"),
        ]);
        let averages = (
            stats.average(&TOTAL_READS),
            stats.average(&UNIQUE_READS),
            stats.average(&MAPPED_READS),
        );
        let rows: Vec<Row> = match averages {
            (Some(total), Some(unique), Some(mapped)) => [
                ("Uniquely Mapped Reads", unique),
                ("Multi-Mapped Reads", mapped - unique),
                ("Unmapped Reads", total - mapped),
            ]
            .into_iter()
            .map(|(label, value)| vec![label.into(), whole(value), percent(value, total)])
            .collect(),
            _ => ["Uniquely Mapped Reads", "Multi-Mapped Reads", "Unmapped Reads"]
                .into_iter()
                .map(|label| vec![label.into(), Cell::Null, Cell::Null])
                .collect(),
        };
        table.extend(rows)?;
        Ok(table)
    }
}

/// Averaged mapping counts per partition from one of the mapping tables
pub struct MappedReads {
    suffix: &'static str,
}

impl MappedReads {
    /// # Arguments
    ///
    /// * `suffix`: Suffix of the per-replicate mapping table
    pub fn new(suffix: &'static str) -> Self {
        MappedReads { suffix }
    }
}

#[async_trait]
impl Statistic for MappedReads {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![
            partition_column(context),
            Column::number("Total Reads"),
            Column::number("Mapped Reads"),
            Column::number("Unique Reads"),
            Column::number("1:0:0 Reads"),
        ]);
        let columns = [TOTAL_READS, MAPPED_READS, UNIQUE_READS, ONE_ZERO_ZERO];
        let columns = &columns;
        let suffix = self.suffix;
        for (partition, configurations) in context.partitions()? {
            let stats = aggregate(
                configurations,
                move |conf| read_counts(source, suffix, columns, conf),
                sum,
            )
            .await;
            let mut row: Row = vec![partition.as_str().into()];
            row.extend(columns.iter().map(|column| Cell::from(stats.average(column))));
            table.push(row)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Configuration, Configurations, Level};
    use crate::test_utils::{self, FakeSource};

    use std::collections::BTreeMap;

    fn source() -> FakeSource {
        FakeSource::new(|query, _| {
            let row = |values: [i64; 4]| -> Row {
                query
                    .columns
                    .iter()
                    .map(|column| match column.as_str() {
                        TOTAL_READS => Cell::Int(values[0]),
                        MAPPED_READS => Cell::Int(values[1]),
                        UNIQUE_READS => Cell::Int(values[2]),
                        ONE_ZERO_ZERO => Cell::Int(values[3]),
                        _ => Cell::Null,
                    })
                    .collect()
            };
            match (query.relation.name(), query.filter_value("LaneName")) {
                (MERGED_MAPPING, Some("a")) => Ok(vec![row([100, 80, 60, 40])]),
                (MERGED_MAPPING, Some("b")) => Ok(vec![row([200, 120, 100, 80])]),
                ("genome_mapping", Some("a")) => Ok(vec![row([10, 8, 6, 4])]),
                (MERGED_MAPPING, Some("empty")) => Ok(vec![]),
                _ => Err(test_utils::empty_result(query)),
            }
        })
    }

    fn reads(lane: &str, reads: &[&str]) -> Vec<Configuration> {
        reads
            .iter()
            .map(|read| test_utils::read("R1", lane, read))
            .collect()
    }

    #[tokio::test]
    async fn summary_splits_mapped_reads() {
        let context = test_utils::context(
            Level::Lane,
            Level::Read,
            Configurations::Flat(reads("L1", &["a", "b", "empty"])),
        );
        let table = MappingSummary {}.compute(&source(), &context).await.unwrap();
        assert_eq!("Average over 2 sets of reads", table.table_description[0].label());
        assert_eq!(
            vec![
                vec!["Uniquely Mapped Reads".into(), 80.into(), Cell::Float(80.0 / 150.0 * 100.0)],
                vec!["Multi-Mapped Reads".into(), 20.into(), Cell::Float(20.0 / 150.0 * 100.0)],
                vec!["Unmapped Reads".into(), 50.into(), Cell::Float(50.0 / 150.0 * 100.0)],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn summary_without_data() {
        let context = test_utils::context(
            Level::Read,
            Level::Read,
            Configurations::Flat(reads("L1", &["empty"])),
        );
        let table = MappingSummary {}.compute(&source(), &context).await.unwrap();
        assert_eq!("", table.table_description[0].label());
        assert_eq!(
            vec![
                vec!["Uniquely Mapped Reads".into(), Cell::Null, Cell::Null],
                vec!["Multi-Mapped Reads".into(), Cell::Null, Cell::Null],
                vec!["Unmapped Reads".into(), Cell::Null, Cell::Null],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn mapped_reads_per_partition() {
        let mut partitions = BTreeMap::new();
        partitions.insert("L1".to_string(), reads("L1", &["a", "b"]));
        partitions.insert("L2".to_string(), reads("L2", &["missing"]));
        let context = test_utils::context(
            Level::Replicate,
            Level::Read,
            Configurations::Partitioned(partitions),
        );
        let table = MappedReads::new(MERGED_MAPPING)
            .compute(&source(), &context)
            .await
            .unwrap();
        assert_eq!("Replicate Id", table.table_description[0].label());
        assert_eq!(
            vec![
                vec![
                    "L1".into(),
                    Cell::Float(150.0),
                    Cell::Float(100.0),
                    Cell::Float(80.0),
                    Cell::Float(60.0),
                ],
                vec!["L2".into(), Cell::Null, Cell::Null, Cell::Null, Cell::Null],
            ],
            table.table_data
        );

        let table = MappedReads::new("genome_mapping")
            .compute(&source(), &context)
            .await
            .unwrap();
        assert_eq!(Cell::Float(10.0), table.table_data[0][1]);
    }
}
