//! Statistics served by the API.
//!
//! Each submodule holds the statistics of one category. [register_all] adds every statistic to a
//! registry together with the resolution it is stored at and whether it is partitioned.

use crate::error::StatsError;
use crate::models::{Configuration, Context, Level};
use crate::registry::{Registry, RegistryBuilder};
use crate::sampling::Selector;
use crate::source::{first_row, Query, StatsSource};
use crate::table::{Cell, Column, Row};

use hashbrown::HashMap;

pub mod discovery;
pub mod expression;
pub mod mapping;
pub mod project;
pub mod read;
pub mod splicing;

/// Numeric values of one result row, keyed by column.
pub(crate) type Counts = HashMap<&'static str, f64>;

/// Merge strategy adding values.
pub(crate) fn sum(left: f64, right: f64) -> f64 {
    left + right
}

/// Percentage of `part` in `total`, or null if the total is zero.
pub(crate) fn percent(part: f64, total: f64) -> Cell {
    if total == 0.0 {
        Cell::Null
    } else {
        Cell::Float(part / total * 100.0)
    }
}

/// Whole number part of an averaged count.
pub(crate) fn whole(value: f64) -> Cell {
    Cell::Int(value.trunc() as i64)
}

/// First column of partitioned tables, titled after the level of the request.
pub(crate) fn partition_column(context: &Context) -> Column {
    Column::string(context.level.title())
}

/// Run `query` and return the cells of its first row as numbers keyed by `columns`.
///
/// Fails if the query returns no rows.
pub(crate) async fn fetch_counts(
    source: &dyn StatsSource,
    query: &Query,
    columns: &[&'static str],
    conf: &Configuration,
) -> Result<Counts, StatsError> {
    let row = first_row(source.fetch(query, conf).await?, query)?;
    Ok(columns
        .iter()
        .zip(row.iter())
        .map(|(column, cell)| (*column, cell.to_f64_or_zero()))
        .collect())
}

/// Query of a per-read pipeline table, restricted to the configuration's read.
pub(crate) fn read_query(
    suffix: &'static str,
    columns: &[&'static str],
    conf: &Configuration,
) -> Result<Query, StatsError> {
    Ok(Query::pipeline(suffix, columns).filter_eq("LaneName", conf.id(Level::Read)?))
}

/// Fetch `columns` of the configuration's read from a per-read pipeline table.
pub(crate) async fn read_counts(
    source: &dyn StatsSource,
    suffix: &'static str,
    columns: &[&'static str],
    conf: &Configuration,
) -> Result<Counts, StatsError> {
    let query = read_query(suffix, columns, conf)?;
    fetch_counts(source, &query, columns, conf).await
}

/// Query of a per-lane pipeline table, restricted to the configuration's lane.
pub(crate) fn lane_query(
    suffix: &'static str,
    columns: &[&'static str],
    conf: &Configuration,
) -> Result<Query, StatsError> {
    Ok(Query::pipeline(suffix, columns).filter_eq("LaneName", conf.id(Level::Lane)?))
}

/// Lay out profile points as rows of `[x, partition 1, ..., partition n]`.
///
/// Points are `(partition index, x, y)`. A point fills the first row with the same `x` whose
/// cell for its partition is still empty, otherwise it starts a new row. Rows keep the order in
/// which they were started.
pub(crate) fn fill_profile<I>(partitions: usize, points: I) -> Vec<Row>
where
    I: IntoIterator<Item = (usize, Cell, Cell)>,
{
    let mut rows: Vec<Row> = vec![];
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (partition, x, y) in points {
        let slot = partition + 1;
        let candidates = index.entry(x.to_string()).or_default();
        let free = candidates
            .iter()
            .copied()
            .find(|row| rows[*row][slot].is_null());
        match free {
            Some(row) => rows[row][slot] = y,
            None => {
                let mut row = vec![Cell::Null; partitions + 1];
                row[0] = x;
                row[slot] = y;
                candidates.push(rows.len());
                rows.push(row);
            }
        }
    }
    rows
}

/// Split a two column row into a profile point of a partition.
pub(crate) fn profile_point(partition: usize, row: Row) -> (usize, Cell, Cell) {
    let mut cells = row.into_iter();
    let x = cells.next().unwrap_or(Cell::Null);
    let y = cells.next().unwrap_or(Cell::Null);
    (partition, x, y)
}

/// Insert the configuration's replicate identifier before the last cell of a row.
///
/// The last cell of per-replicate listings names the lane the row was found in.
pub(crate) fn insert_replicate(conf: &Configuration, mut row: Row) -> Row {
    let position = row.len().saturating_sub(1);
    row.insert(position, conf.get("replicateid").into());
    row
}

/// Profile table columns: the x axis followed by one column per partition.
pub(crate) fn profile_columns<'a, I>(x: &str, partitions: I) -> Vec<Column>
where
    I: IntoIterator<Item = &'a String>,
{
    std::iter::once(Column::number(x))
        .chain(partitions.into_iter().map(|key| Column::number(key.as_str())))
        .collect()
}

/// Build the registry of every statistic.
///
/// # Arguments
///
/// * `selector`: Strategy used to choose genes for expression level charts
pub fn register_all(selector: Selector) -> Result<Registry, StatsError> {
    use Level::*;

    let builder = RegistryBuilder::new()
        .register("projects", Root, false, project::Projects {})?
        .register("info", Project, false, project::Info {})?
        .register("experimentstable", Project, false, project::ExperimentsTable {})?
        .register(
            "project_experiments",
            Root,
            false,
            project::ReplicateListing::EXPERIMENTS,
        )?
        .register(
            "project_replicates",
            Root,
            false,
            project::ReplicateListing::REPLICATES,
        )?
        .register("replicate_info", Root, false, project::ReplicateInfo {})?
        .register("experiment_info", Root, false, project::ExperimentInfo {})?
        .register(
            "experiment_replicates",
            Root,
            false,
            project::ExperimentReplicates {},
        )?
        .register("read_summary", Read, false, read::ReadSummary {})?
        .register(
            "reads_containing_ambiguous_nucleotides",
            Read,
            true,
            read::ReadPercentage::AMBIGUOUS,
        )?
        .register(
            "reads_containing_only_unambiguous_nucleotides",
            Read,
            true,
            read::ReadPercentage::UNAMBIGUOUS,
        )?
        .register(
            "average_percentage_of_unique_reads",
            Read,
            true,
            read::ReadPercentage::UNIQUE,
        )?
        .register(
            "total_ambiguous_and_unambiguous_reads",
            Read,
            true,
            read::TotalAmbiguousReads {},
        )?
        .register(
            "average_and_average_unique_reads",
            Read,
            true,
            read::AverageUniqueReads {},
        )?
        .register(
            "quality_score_by_position",
            Read,
            true,
            read::PositionProfile::QUALITY,
        )?
        .register(
            "ambiguous_bases_per_position",
            Read,
            true,
            read::PositionProfile::AMBIGUOUS,
        )?
        .register("mapping_summary", Read, false, mapping::MappingSummary {})?
        .register(
            "merged_mapped_reads",
            Read,
            true,
            mapping::MappedReads::new("merged_mapping"),
        )?
        .register(
            "genome_mapped_reads",
            Read,
            true,
            mapping::MappedReads::new("genome_mapping"),
        )?
        .register(
            "junction_mapped_reads",
            Read,
            true,
            mapping::MappedReads::new("junctions_mapping"),
        )?
        .register(
            "split_mapped_reads",
            Read,
            true,
            mapping::MappedReads::new("split_mapping"),
        )?
        .register(
            "expression_summary",
            Replicate,
            false,
            expression::ExpressionSummary {},
        )?
        .register("detected_genes", Replicate, false, expression::DetectedGenes {})?
        .register(
            "gene_expression_profile",
            Lane,
            true,
            expression::GeneExpressionProfile {},
        )?
        .register(
            "gene_expression_levels",
            Lane,
            false,
            expression::GeneExpressionLevels::new(selector),
        )?
        .register("top_genes", Lane, false, expression::TopFeatures::GENES)?
        .register(
            "top_transcripts",
            Lane,
            false,
            expression::TopFeatures::TRANSCRIPTS,
        )?
        .register("top_exons", Lane, false, expression::TopFeatures::EXONS)?
        .register("splicing_summary", Replicate, false, splicing::SplicingSummary {})?
        .register(
            "exon_inclusion_profile",
            Lane,
            true,
            splicing::ExonInclusionProfile {},
        )?
        .register(
            "reads_supporting_exon_inclusions",
            Replicate,
            false,
            splicing::ExonInclusionReads {},
        )?
        .register(
            "novel_junctions_from_annotated_exons",
            Replicate,
            false,
            discovery::NovelJunctions::ANNOTATED,
        )?
        .register(
            "novel_junctions_from_unannotated_exons",
            Replicate,
            false,
            discovery::NovelJunctions::UNANNOTATED,
        )?;
    Ok(builder.build())
}
