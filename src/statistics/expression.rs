//! Expression statistics, stored per replicate or per lane.

use crate::aggregate::{aggregate, attempt, collect};
use crate::error::StatsError;
use crate::models::{Configuration, Context, Level};
use crate::sampling::{
    log_sample, seeded_rng, LaneCandidates, Selector, EXPRESSION_TARGET,
    PROFILE_SAMPLING_THRESHOLD,
};
use crate::source::{Direction, Query, StatsSource};
use crate::statistic::Statistic;
use crate::statistics::{
    fill_profile, lane_query, percent, profile_columns, profile_point, sum, whole,
};
use crate::table::{top_rows, Cell, Column, ColumnType, Row, Table};

use async_trait::async_trait;
use hashbrown::HashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Number of rows shown in top feature tables.
const TOP_LIMIT: usize = 20;

const TOTAL: &str = "total";
const DETECTED: &str = "detected";

/// Averaged total and detected genes, transcripts and exons.
pub struct ExpressionSummary {}

type FeatureCounts = HashMap<(String, &'static str), f64>;

async fn expression_counts(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<FeatureCounts, StatsError> {
    let query = Query::pipeline("expression_summary", &["type", TOTAL, DETECTED]);
    let rows = source.fetch(&query, conf).await?;
    let mut counts = HashMap::new();
    for row in rows {
        if let [feature, total, detected] = row.as_slice() {
            counts.insert((feature.to_string(), TOTAL), total.to_f64_or_zero());
            counts.insert((feature.to_string(), DETECTED), detected.to_f64_or_zero());
        }
    }
    Ok(counts)
}

#[async_trait]
impl Statistic for ExpressionSummary {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let stats = aggregate(
            context.flat()?,
            move |conf| expression_counts(source, conf),
            sum,
        )
        .await;
        let mut table = Table::new(vec![
            Column::string(context.average_label(stats.average_by())),
            Column::number("Total"),
            Column::number("Detected"),
            Column::number("Percent"),
        ]);
        for feature in ["Genes", "Transcripts", "Exons"] {
            let total = stats.average(&(feature.to_string(), TOTAL));
            let detected = stats.average(&(feature.to_string(), DETECTED));
            let row = match (total, detected) {
                (Some(total), Some(detected)) => vec![
                    feature.into(),
                    whole(total),
                    whole(detected),
                    percent(detected, total),
                ],
                _ => vec![feature.into(), Cell::Null, Cell::Null, Cell::Null],
            };
            table.push(row)?;
        }
        Ok(table)
    }
}

/// Detected genes by biotype and reliability, one row per replicate and biotype.
pub struct DetectedGenes {}

type DetectedCounts = HashMap<(String, String, String), f64>;

async fn detected_counts(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<DetectedCounts, StatsError> {
    let replicateid = conf.id(Level::Replicate)?;
    let query = Query::pipeline("detected_genes", &["type", "reliability", DETECTED]);
    let rows = source.fetch(&query, conf).await?;
    let mut counts: DetectedCounts = HashMap::new();
    for row in rows {
        if let [biotype, reliability, detected] = row.as_slice() {
            let key = (
                replicateid.to_string(),
                biotype.to_string(),
                reliability.to_string(),
            );
            *counts.entry(key).or_default() += detected.to_f64_or_zero();
        }
    }
    Ok(counts)
}

#[async_trait]
impl Statistic for DetectedGenes {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let stats = aggregate(
            context.flat()?,
            move |conf| detected_counts(source, conf),
            sum,
        )
        .await;
        let Some(stats) = stats.stats else {
            let mut table = Table::new(vec![Column::string("Type")]);
            table.push_null_row();
            return Ok(table);
        };
        let mut replicates = BTreeSet::new();
        let mut biotypes = BTreeSet::new();
        let mut reliabilities = BTreeSet::new();
        for (replicateid, biotype, reliability) in stats.keys() {
            replicates.insert(replicateid.as_str());
            biotypes.insert(biotype.as_str());
            reliabilities.insert(reliability.as_str());
        }
        let mut description = vec![Column::string("Type")];
        description.extend(reliabilities.iter().map(|reliability| Column::number(*reliability)));
        description.push(Column::string(context.resolution.resolution_title()));
        let mut table = Table::new(description);

        let mut rows = vec![];
        for replicateid in &replicates {
            for biotype in &biotypes {
                let values: Vec<Cell> = reliabilities
                    .iter()
                    .map(|reliability| {
                        let key = (
                            replicateid.to_string(),
                            biotype.to_string(),
                            reliability.to_string(),
                        );
                        stats.get(&key).map_or(Cell::Null, |value| whole(*value))
                    })
                    .collect();
                if !values.iter().any(Cell::is_truthy) {
                    continue;
                }
                let mut row: Row = vec![(*biotype).into()];
                row.extend(values);
                row.push((*replicateid).into());
                rows.push(row);
            }
        }
        rows.sort_by(|a, b| {
            a.iter()
                .zip(b.iter())
                .map(|(a, b)| a.total_cmp(b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        table.extend(rows)?;
        Ok(table)
    }
}

/// Distribution of gene expression values, one column per partition.
///
/// Large distributions requested above the replicate level are thinned out by [log_sample].
pub struct GeneExpressionProfile {}

#[async_trait]
impl Statistic for GeneExpressionProfile {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let partitions = context.partitions()?;
        let mut table = Table::new(profile_columns("Number", partitions.keys()));

        // Points grouped by support, in order of first appearance.
        let mut groups: Vec<Vec<(usize, Cell, Cell)>> = vec![];
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut count = 0;
        for (index, configurations) in partitions.values().enumerate() {
            let points = collect(
                configurations,
                move |conf| expression_distribution(source, conf),
                move |_, row| profile_point(index, row),
            )
            .await;
            for (index, x, y) in points {
                count += 1;
                let group = *group_index.entry(y.to_string()).or_insert_with(|| {
                    groups.push(vec![]);
                    groups.len() - 1
                });
                groups[group].push((index, x, y));
            }
        }

        let sample = if matches!(context.level, Level::Lane | Level::Replicate)
            || count < PROFILE_SAMPLING_THRESHOLD
        {
            groups
        } else {
            let mut rng = seeded_rng(partitions.keys().map(String::as_str));
            let sample = log_sample(groups, &mut rng);
            debug!(
                points = count,
                sampled = sample.iter().map(Vec::len).sum::<usize>(),
                "sampled expression profile"
            );
            sample
        };
        let points = sample.into_iter().flatten().map(|(index, x, y)| {
            let y = y.as_f64().map_or(Cell::Null, whole);
            (index, x, y)
        });
        table.extend(fill_profile(partitions.len(), points))?;
        Ok(table.or_null_row())
    }
}

async fn expression_distribution(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<Row>, StatsError> {
    let query = lane_query("gene_RPKM_dist", &["rpkm", "support"], conf)?;
    source.fetch(&query, conf).await
}

/// Expression values of the top genes across lanes, one row per lane.
pub struct GeneExpressionLevels {
    selector: Selector,
}

impl GeneExpressionLevels {
    /// # Arguments
    ///
    /// * `selector`: Strategy for choosing genes across lanes
    pub fn new(selector: Selector) -> Self {
        GeneExpressionLevels { selector }
    }
}

/// Most highly expressed genes of a lane, best first.
async fn top_lane_genes(
    source: &dyn StatsSource,
    conf: &Configuration,
) -> Result<Vec<String>, StatsError> {
    let query = lane_query("gene_RPKM", &["gene_id"], conf)?
        .order_by("RPKM", Direction::Descending)
        .limit(EXPRESSION_TARGET as u32);
    let rows = source.fetch(&query, conf).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|cell| cell.to_string())
        .collect())
}

/// Expression values of `genes` in a lane.
async fn lane_gene_levels(
    source: &dyn StatsSource,
    conf: &Configuration,
    genes: &[String],
) -> Result<HashMap<String, Cell>, StatsError> {
    let query = lane_query("gene_RPKM", &["gene_id", "RPKM"], conf)?
        .filter_in("gene_id", genes.to_vec());
    let rows = source.fetch(&query, conf).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let mut cells = row.into_iter();
            let gene = cells.next()?.to_string();
            Some((gene, cells.next().unwrap_or(Cell::Null)))
        })
        .collect())
}

#[async_trait]
impl Statistic for GeneExpressionLevels {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let configurations = context.flat()?;
        let mut lanes = vec![];
        for conf in configurations {
            let genes = attempt(conf, top_lane_genes(source, conf))
                .await
                .unwrap_or_default();
            lanes.push(LaneCandidates::new(conf.id(Level::Lane)?, genes));
        }
        let genes = self.selector.select(lanes, EXPRESSION_TARGET);
        debug!(selector = ?self.selector, genes = genes.len(), "selected genes");

        let mut description = vec![Column::string("Gene Name")];
        description.extend(genes.iter().map(|gene| Column::number(gene.as_str())));
        let mut table = Table::new(description);
        for conf in configurations {
            let levels = if genes.is_empty() {
                HashMap::new()
            } else {
                attempt(conf, lane_gene_levels(source, conf, &genes))
                    .await
                    .unwrap_or_default()
            };
            let mut row: Row = vec![format!(
                "{} {}",
                conf.id(Level::Replicate)?,
                conf.id(Level::Lane)?
            )
            .into()];
            row.extend(
                genes
                    .iter()
                    .map(|gene| levels.get(gene).cloned().unwrap_or(Cell::Null)),
            );
            table.push(row)?;
        }
        Ok(table)
    }
}

/// The most highly expressed genes, transcripts or exons across lanes
pub struct TopFeatures {
    suffix: &'static str,
    /// Columns selected before the expression value
    columns: &'static [&'static str],
    /// Descriptors of the selected columns, including the expression value
    description: &'static [(&'static str, ColumnType)],
}

impl TopFeatures {
    pub const GENES: TopFeatures = TopFeatures {
        suffix: "top_genes_expressed",
        columns: &[
            "gene_id",
            "length",
            "strand",
            "locus",
            "no_exons",
            "no_transcripts",
        ],
        description: &[
            ("Gene Id", ColumnType::String),
            ("Length", ColumnType::Number),
            ("Strand (+/-)", ColumnType::String),
            ("Locus", ColumnType::String),
            ("# Exons", ColumnType::Number),
            ("# Transcripts", ColumnType::Number),
            ("Expression Value", ColumnType::Number),
        ],
    };
    pub const TRANSCRIPTS: TopFeatures = TopFeatures {
        suffix: "top_transcripts_expressed",
        columns: &["transcript_id", "length", "strand", "locus", "no_exons"],
        description: &[
            ("Transcript Id", ColumnType::String),
            ("Length", ColumnType::Number),
            ("Strand (+/-)", ColumnType::String),
            ("Locus", ColumnType::String),
            ("# Exons", ColumnType::Number),
            ("Expression Value", ColumnType::Number),
        ],
    };
    pub const EXONS: TopFeatures = TopFeatures {
        suffix: "top_exons_expressed",
        columns: &["exon_id", "length", "strand", "locus"],
        description: &[
            ("Exon Id", ColumnType::String),
            ("Length", ColumnType::Number),
            ("Strand (+/-)", ColumnType::String),
            ("Locus", ColumnType::String),
            ("Expression Value", ColumnType::Number),
        ],
    };

    /// Top rows of a lane. Expression values are stored in a column named after the lane.
    async fn lane_rows(
        &self,
        source: &dyn StatsSource,
        conf: &Configuration,
    ) -> Result<Vec<Row>, StatsError> {
        let laneid = conf.id(Level::Lane)?;
        let mut columns = self.columns.to_vec();
        columns.push(laneid);
        let query = Query::pipeline(self.suffix, &columns)
            .order_by(laneid, Direction::Descending)
            .limit(TOP_LIMIT as u32);
        source.fetch(&query, conf).await
    }
}

/// Append the replicate and lane identifiers to a row.
fn with_lane(conf: &Configuration, mut row: Row) -> Row {
    row.push(conf.get("replicateid").into());
    row.push(conf.get("laneid").into());
    row
}

#[async_trait]
impl Statistic for TopFeatures {
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
        description.push(Column::string(Level::Replicate.title()));
        description.push(Column::string(Level::Lane.title()));
        let mut table = Table::new(description);
        let rows = collect(
            context.flat()?,
            move |conf| self.lane_rows(source, conf),
            with_lane,
        )
        .await;
        table.extend(top_rows(rows, self.columns.len(), TOP_LIMIT))?;
        Ok(table.or_null_row())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Configurations;
    use crate::test_utils::{self, FakeSource};

    use std::collections::BTreeMap;

    fn flat(level: Level, configurations: Vec<Configuration>) -> Context {
        test_utils::context(level, Level::Lane, Configurations::Flat(configurations))
    }

    fn replicate(replicateid: &str) -> Configuration {
        Configuration::new()
            .with("projectid", "P")
            .with("replicateid", replicateid)
    }

    #[tokio::test]
    async fn expression_summary_averages() {
        let source = FakeSource::new(|query, conf| match conf.get("replicateid") {
            Some("R1") => Ok(vec![
                vec!["Genes".into(), 100.into(), 40.into()],
                vec!["Transcripts".into(), 200.into(), 50.into()],
                vec!["Exons".into(), 0.into(), 0.into()],
            ]),
            Some("R2") => Ok(vec![
                vec!["Genes".into(), 100.into(), 60.into()],
                vec!["Transcripts".into(), 200.into(), 150.into()],
                vec!["Exons".into(), 0.into(), 0.into()],
            ]),
            _ => Err(test_utils::empty_result(query)),
        });
        let context = test_utils::context(
            Level::Experiment,
            Level::Replicate,
            Configurations::Flat(vec![replicate("R1"), replicate("R2"), replicate("R3")]),
        );
        let table = ExpressionSummary {}.compute(&source, &context).await.unwrap();
        assert_eq!(
            "Average over 2 sets of replicates",
            table.table_description[0].label()
        );
        assert_eq!(
            vec![
                vec!["Genes".into(), 100.into(), 50.into(), Cell::Float(50.0)],
                vec!["Transcripts".into(), 200.into(), 100.into(), Cell::Float(50.0)],
                vec!["Exons".into(), 0.into(), 0.into(), Cell::Null],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn expression_summary_without_data() {
        let context = test_utils::context(
            Level::Replicate,
            Level::Replicate,
            Configurations::Flat(vec![replicate("R1")]),
        );
        let table = ExpressionSummary {}
            .compute(&FakeSource::empty(), &context)
            .await
            .unwrap();
        assert_eq!(3, table.table_data.len());
        assert!(table.table_data.iter().all(|row| row.len() == 4 && row[1].is_null()));
    }

    #[tokio::test]
    async fn detected_genes_by_reliability() {
        let source = FakeSource::new(|_, conf| match conf.get("replicateid") {
            Some("R1") => Ok(vec![
                vec!["protein_coding".into(), "KNOWN".into(), 10.into()],
                vec!["protein_coding".into(), "KNOWN".into(), 5.into()],
                vec!["miRNA".into(), "NOVEL".into(), 0.into()],
            ]),
            _ => Ok(vec![vec!["lincRNA".into(), "NOVEL".into(), 3.into()]]),
        });
        let context = test_utils::context(
            Level::Experiment,
            Level::Replicate,
            Configurations::Flat(vec![replicate("R1"), replicate("R2")]),
        );
        let table = DetectedGenes {}.compute(&source, &context).await.unwrap();
        assert_eq!(
            vec![
                Column::string("Type"),
                Column::number("KNOWN"),
                Column::number("NOVEL"),
                Column::string("Replicate Level"),
            ],
            table.table_description
        );
        assert_eq!(
            vec![
                vec!["lincRNA".into(), Cell::Null, 3.into(), "R2".into()],
                vec!["protein_coding".into(), 15.into(), Cell::Null, "R1".into()],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn detected_genes_without_data() {
        let context = test_utils::context(
            Level::Replicate,
            Level::Replicate,
            Configurations::Flat(vec![replicate("R1")]),
        );
        let table = DetectedGenes {}
            .compute(&FakeSource::empty(), &context)
            .await
            .unwrap();
        assert_eq!(vec![Column::string("Type")], table.table_description);
        assert_eq!(vec![vec![Cell::Null]], table.table_data);
    }

    fn profile_source(points_per_lane: usize) -> FakeSource {
        FakeSource::new(move |query, _| {
            let lane = query.filter_value("LaneName").unwrap_or_default();
            if lane == "L3" {
                return Err(test_utils::empty_result(query));
            }
            Ok((0..points_per_lane)
                .map(|i| vec![Cell::Float(i as f64 / 10.0), Cell::Float((i % 3) as f64)])
                .collect())
        })
    }

    fn profile_context(level: Level) -> Context {
        let mut partitions = BTreeMap::new();
        partitions.insert("L1".to_string(), vec![test_utils::lane("R1", "L1")]);
        partitions.insert("L2".to_string(), vec![test_utils::lane("R1", "L2")]);
        test_utils::context(level, Level::Lane, Configurations::Partitioned(partitions))
    }

    #[tokio::test]
    async fn profile_keeps_small_distributions() {
        let table = GeneExpressionProfile {}
            .compute(&profile_source(4), &profile_context(Level::Experiment))
            .await
            .unwrap();
        assert_eq!(
            vec![
                Column::number("Number"),
                Column::number("L1"),
                Column::number("L2"),
            ],
            table.table_description
        );
        // Grouped by support: 0 (x = 0, 0.3), 1 (x = 0.1), 2 (x = 0.2).
        assert_eq!(
            vec![
                vec![Cell::Float(0.0), 0.into(), 0.into()],
                vec![Cell::Float(0.3), 0.into(), 0.into()],
                vec![Cell::Float(0.1), 1.into(), 1.into()],
                vec![Cell::Float(0.2), 2.into(), 2.into()],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn profile_samples_large_distributions() {
        let experiment = GeneExpressionProfile {}
            .compute(&profile_source(3000), &profile_context(Level::Experiment))
            .await
            .unwrap();
        let replicate = GeneExpressionProfile {}
            .compute(&profile_source(3000), &profile_context(Level::Replicate))
            .await
            .unwrap();
        assert_eq!(3000, replicate.table_data.len());
        assert!(experiment.table_data.len() < 3000);
        let again = GeneExpressionProfile {}
            .compute(&profile_source(3000), &profile_context(Level::Experiment))
            .await
            .unwrap();
        assert_eq!(experiment, again);
    }

    #[tokio::test]
    async fn profile_without_data() {
        let table = GeneExpressionProfile {}
            .compute(&FakeSource::empty(), &profile_context(Level::Replicate))
            .await
            .unwrap();
        assert_eq!(vec![vec![Cell::Null; 3]], table.table_data);
    }

    fn levels_source() -> FakeSource {
        FakeSource::new(|query, conf| {
            let lane = conf.get("laneid").unwrap_or_default().to_string();
            match query.columns.len() {
                1 => Ok((0..3)
                    .map(|i| vec![Cell::from(format!("{}g{}", lane, i))])
                    .collect()),
                _ => Ok(vec![
                    vec![format!("{}g0", lane).into(), Cell::Float(9.5)],
                    vec!["unrelated".into(), Cell::Float(1.0)],
                ]),
            }
        })
    }

    #[tokio::test]
    async fn expression_levels_round_robin() {
        let context = flat(
            Level::Replicate,
            vec![test_utils::lane("R1", "L1"), test_utils::lane("R1", "L2")],
        );
        let table = GeneExpressionLevels::new(Selector::RoundRobin)
            .compute(&levels_source(), &context)
            .await
            .unwrap();
        let labels: Vec<&str> = table.table_description.iter().map(Column::label).collect();
        assert_eq!(
            vec!["Gene Name", "L1g0", "L2g0", "L1g1", "L2g1", "L1g2", "L2g2"],
            labels
        );
        assert_eq!(2, table.table_data.len());
        assert_eq!(Cell::from("R1 L1"), table.table_data[0][0]);
        assert_eq!(Cell::Float(9.5), table.table_data[0][1]);
        assert_eq!(Cell::Null, table.table_data[0][2]);
        assert_eq!(Cell::Float(9.5), table.table_data[1][2]);
    }

    #[tokio::test]
    async fn expression_levels_random_is_repeatable() {
        let context = flat(
            Level::Replicate,
            vec![test_utils::lane("R1", "L1"), test_utils::lane("R1", "L2")],
        );
        let statistic = GeneExpressionLevels::new(Selector::Random);
        let first = statistic.compute(&levels_source(), &context).await.unwrap();
        let second = statistic.compute(&levels_source(), &context).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(7, first.width());
    }

    #[tokio::test]
    async fn expression_levels_without_genes() {
        let context = flat(Level::Lane, vec![test_utils::lane("R1", "L1")]);
        let source = FakeSource::empty();
        let table = GeneExpressionLevels::new(Selector::Random)
            .compute(&source, &context)
            .await
            .unwrap();
        assert_eq!(vec![Column::string("Gene Name")], table.table_description);
        assert_eq!(vec![vec![Cell::from("R1 L1")]], table.table_data);
        assert_eq!(1, source.calls());
    }

    #[tokio::test]
    async fn top_genes_across_lanes() {
        let source = FakeSource::new(|query, conf| {
            let lane = conf.get("laneid").unwrap_or_default();
            assert_eq!(Some(&lane.to_string()), query.columns.last());
            let value = if lane == "L1" { 10 } else { 20 };
            Ok((0..15)
                .map(|i| {
                    vec![
                        format!("{}gene{}", lane, i).into(),
                        100.into(),
                        "+".into(),
                        "chr1:1-100".into(),
                        2.into(),
                        1.into(),
                        Cell::Int(value - i),
                    ]
                })
                .collect())
        });
        let context = flat(
            Level::Replicate,
            vec![test_utils::lane("R1", "L1"), test_utils::lane("R1", "L2")],
        );
        let table = TopFeatures::GENES.compute(&source, &context).await.unwrap();
        assert_eq!(9, table.width());
        assert_eq!(TOP_LIMIT, table.table_data.len());
        assert_eq!(Cell::from("L2gene0"), table.table_data[0][0]);
        assert_eq!(Cell::from("R1"), table.table_data[0][7]);
        assert_eq!(Cell::from("L2"), table.table_data[0][8]);
        assert_eq!(Cell::Int(20), table.table_data[0][6]);
    }

    #[tokio::test]
    async fn top_exons_without_data() {
        let context = flat(Level::Lane, vec![test_utils::lane("R1", "L1")]);
        let table = TopFeatures::EXONS
            .compute(&FakeSource::empty(), &context)
            .await
            .unwrap();
        assert_eq!("Exon Id", table.table_description[0].label());
        assert_eq!(vec![vec![Cell::Null; 7]], table.table_data);
    }
}
