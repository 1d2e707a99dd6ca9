//! Splicing statistics, stored per replicate or per lane.

use crate::aggregate::{aggregate, collect};
use crate::error::StatsError;
use crate::models::{Configuration, Context};
use crate::source::{Direction, Query, StatsSource};
use crate::statistic::Statistic;
use crate::statistics::{
    fill_profile, insert_replicate, lane_query, percent, profile_columns, profile_point, whole,
};
use crate::table::{top_rows, Cell, Column, Row, Table};

use async_trait::async_trait;
use hashbrown::HashMap;

const TOP_LIMIT: usize = 20;

const DETECTED: &str = "detected";
const TOTAL: &str = "total";

/// Junction counts keyed by junction type and count. Totals may be missing.
type JunctionCounts = HashMap<(String, &'static str), Option<f64>>;

/// Averaged detected junctions by type.
pub struct SplicingSummary {}

async fn junction_counts(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<JunctionCounts, StatsError> {
    let query = Query::pipeline("splicing_summary", &["junc_type", DETECTED, TOTAL]);
    let rows = source.fetch(&query, conf).await?;
    let mut counts = HashMap::new();
    for row in rows {
        if let [junction, detected, total] = row.as_slice() {
            counts.insert((junction.to_string(), DETECTED), detected.as_f64());
            counts.insert((junction.to_string(), TOTAL), total.as_f64());
        }
    }
    Ok(counts)
}

/// Add counts, keeping a missing value missing.
fn add_counts(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    Some(left? + right?)
}

#[async_trait]
impl Statistic for SplicingSummary {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let stats = aggregate(
            context.flat()?,
            move |conf| junction_counts(source, conf),
            add_counts,
        )
        .await;
        let average_by = stats.average_by();
        let mut table = Table::new(vec![
            Column::string(context.average_label(average_by)),
            Column::number("Total"),
            Column::number("Percent"),
        ]);
        let average = |junction: &str, count: &'static str| -> Option<f64> {
            let value = stats.stats.as_ref()?.get(&(junction.to_string(), count))?;
            Some((*value)? / average_by as f64)
        };
        for (label, junction) in [
            ("Known Junctions", "Known"),
            ("Novel Junctions from Annotated Exons", "Novel"),
            ("Novel Junctions from Unannotated Exons", "Unannotated"),
        ] {
            let detected = average(junction, DETECTED);
            let share = match (detected, average(junction, TOTAL)) {
                (Some(detected), Some(total)) => percent(detected, total),
                _ => Cell::Null,
            };
            table.push(vec![label.into(), detected.map_or(Cell::Null, whole), share])?;
        }
        Ok(table)
    }
}

/// Distribution of exon inclusion percentages, one column per partition.
pub struct ExonInclusionProfile {}

async fn inclusion_distribution(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<Row>, StatsError> {
    let query = lane_query("inclusion_dist", &["incl_percent", "support"], conf)?;
    source.fetch(&query, conf).await
}

#[async_trait]
impl Statistic for ExonInclusionProfile {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let partitions = context.partitions()?;
        let mut table = Table::new(profile_columns("Percent", partitions.keys()));
        let mut points = vec![];
        for (index, configurations) in partitions.values().enumerate() {
            points.extend(
                collect(
                    configurations,
                    move |conf| inclusion_distribution(source, conf),
                    move |_, row| profile_point(index, row),
                )
                .await,
            );
        }
        table.extend(fill_profile(partitions.len(), points))?;
        Ok(table.or_null_row())
    }
}

/// Exons with the most reads supporting their inclusion.
pub struct ExonInclusionReads {}

/// Index of the inclusion rate in the selected columns.
const INCLUSION_RATE: usize = 6;

async fn inclusion_reads(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<Row>, StatsError> {
    let query = Query::pipeline(
        "exon_inclusion_reads",
        &[
            "chr",
            "start",
            "end",
            "ExIncl",
            "JuncInc",
            "JuncExc",
            "inc_rate",
            "sample_id",
        ],
    )
    .order_by("JuncInc", Direction::Descending)
    .limit(TOP_LIMIT as u32);
    let mut rows = source.fetch(&query, conf).await?;
    for row in rows.iter_mut() {
        if let Some(cell) = row.get_mut(INCLUSION_RATE) {
            *cell = cell.as_f64().map_or(Cell::Null, |rate| Cell::Float(rate * 100.0));
        }
    }
    Ok(rows)
}

#[async_trait]
impl Statistic for ExonInclusionReads {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![
            Column::string("chr"),
            Column::number("start"),
            Column::number("end"),
            Column::number("Exonic"),
            Column::number("Inclusion Junctions"),
            Column::number("Exclusion Junctions"),
            Column::number("Inclusion Percentage"),
            Column::string("Replicate Id"),
            Column::string("Lane Id"),
        ]);
        let rows = collect(
            context.flat()?,
            move |conf| inclusion_reads(source, conf),
            insert_replicate,
        )
        .await;
        table.extend(top_rows(rows, 4, TOP_LIMIT))?;
        Ok(table.or_null_row())
    }
}
