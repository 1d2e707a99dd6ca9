//! Project, experiment and replicate listings.
//!
//! Replicates are described from the `experiments` table of the common database. Their species,
//! genome and annotation are looked up by identifier in `species_info`, `genome_files` and
//! `annotation_files`.

use crate::aggregate::attempt;
use crate::error::StatsError;
use crate::hierarchy::{self, PARAMETER_SEPARATOR};
use crate::models::{Configuration, Context, Level};
use crate::settings::Settings;
use crate::source::{first_row, Query, StatsSource};
use crate::statistic::Statistic;
use crate::table::{Cell, Column, Row, Table};

use async_trait::async_trait;
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Names of the project's parameters joined into a path segment, e.g. `cell-rnaExtract`.
fn parameter_list(settings: &Settings, projectid: &str) -> Result<String, StatsError> {
    Ok(settings
        .project_parameters(projectid)?
        .iter()
        .map(|parameter| parameter.name.as_str())
        .collect::<Vec<_>>()
        .join(&PARAMETER_SEPARATOR.to_string()))
}

/// Rows of a common table looked up by identifier, each fetched at most once.
struct Lookup {
    table: &'static str,
    key_column: &'static str,
    columns: &'static [&'static str],
    rows: HashMap<String, Row>,
}

impl Lookup {
    fn new(
        table: &'static str,
        key_column: &'static str,
        columns: &'static [&'static str],
    ) -> Self {
        Lookup {
            table,
            key_column,
            columns,
            rows: HashMap::new(),
        }
    }

    fn species() -> Self {
        Self::new("species_info", "species_id", &["species"])
    }

    /// Fetch the row whose key column is `key`.
    async fn get(
        &mut self,
        source: &dyn StatsSource,
        conf: &Configuration,
        key: &Cell,
    ) -> Result<Row, StatsError> {
        let key = key.to_string();
        if let Some(row) = self.rows.get(&key) {
            return Ok(row.clone());
        }
        let query = Query::common(self.table, self.columns).filter_eq(self.key_column, key.as_str());
        let row = first_row(source.fetch(&query, conf).await?, &query)?;
        self.rows.insert(key, row.clone());
        Ok(row)
    }
}

/// Columns of `experiments` describing a single replicate.
const REPLICATE_COLUMNS: &[&str] = &[
    "species_id",
    "genome_id",
    "annotation_id",
    "read_length",
    "mismatches",
    "exp_description",
    "expDate",
    "CellType",
    "RNAType",
    "Compartment",
    "Bioreplicate",
    "partition",
    "paired",
];

fn replicate_description() -> Vec<Column> {
    vec![
        Column::number("Read Length"),
        Column::number("Mismatches"),
        Column::string("Description"),
        Column::string("Date"),
        Column::string("Cell Type"),
        Column::string("RNA Type"),
        Column::string("Localization"),
        Column::string("Bio Replicate"),
        Column::string("Partition"),
        Column::number("Paired"),
        Column::string("Species"),
        Column::string("Annotation Version"),
        Column::string("Annotation Source"),
        Column::string("Genome Assembly"),
        Column::string("Genome Source"),
        Column::string("Genome Gender"),
    ]
}

/// Turn a row of [REPLICATE_COLUMNS] into a row of [replicate_description].
async fn describe_replicate(
    source: &dyn StatsSource,
    conf: &Configuration,
    row: Row,
) -> Result<Row, StatsError> {
    let mut cells = row.into_iter();
    let species_id = cells.next().unwrap_or(Cell::Null);
    let genome_id = cells.next().unwrap_or(Cell::Null);
    let annotation_id = cells.next().unwrap_or(Cell::Null);
    let mut described: Row = cells.collect();
    described.extend(Lookup::species().get(source, conf, &species_id).await?);
    described.extend(
        Lookup::new("annotation_files", "annotation_id", &["version", "source"])
            .get(source, conf, &annotation_id)
            .await?,
    );
    described.extend(
        Lookup::new("genome_files", "genome_id", &["assembly", "source", "gender"])
            .get(source, conf, &genome_id)
            .await?,
    );
    Ok(described)
}

/// Configured projects with the address of their experiments page.
pub struct Projects {}

#[async_trait]
impl Statistic for Projects {
    async fn compute(
        &self,
        _source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let mut table = Table::new(vec![Column::string("Project Id"), Column::string("URL")]);
        for projectid in context.settings.projects.keys() {
            table.push(vec![
                projectid.as_str().into(),
                format!("/project/{}/tab/experiments/", projectid).into(),
            ])?;
        }
        Ok(table)
    }
}

/// Description and species of a project.
pub struct Info {}

#[async_trait]
impl Statistic for Info {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let query = Query::common("projects", &["proj_description", "species"])
            .filter_eq("project_id", conf.id(Level::Project)?);
        let row = first_row(source.fetch(&query, conf).await?, &query)?;
        let mut table = Table::new(vec![
            Column::string("Project Description"),
            Column::string("Species"),
        ]);
        table.push(row)?;
        Ok(table)
    }
}

/// Experiments of a project with their parameter values and number of replicates.
pub struct ExperimentsTable {}

#[async_trait]
impl Statistic for ExperimentsTable {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let projectid = conf.id(Level::Project)?;
        let parameters = context.settings.project_parameters(projectid)?;
        let mut description = vec![
            Column::string("Project id"),
            Column::string("Parameter List"),
            Column::string("Parameter Values"),
            Column::string("# Replicates"),
        ];
        description.extend(
            parameters
                .iter()
                .map(|parameter| Column::string(parameter.label.as_str())),
        );
        let mut table = Table::new(description);

        let parameter_list = parameter_list(&context.settings, projectid)?;
        let mut experiments = BTreeMap::new();
        for replicate in hierarchy::project_replicates(source, &context.settings, conf).await? {
            experiments
                .entry(replicate.experimentid())
                .or_insert_with(Vec::new)
                .push(replicate);
        }
        for (experimentid, replicates) in experiments {
            let mut row: Row = vec![
                projectid.into(),
                parameter_list.as_str().into(),
                experimentid.into(),
                replicates.len().to_string().into(),
            ];
            if let Some(first) = replicates.first() {
                row.extend(first.values.iter().map(|value| Cell::from(value.as_str())));
            }
            table.push(row)?;
        }
        Ok(table.or_null_row())
    }
}

/// Description of a replicate.
pub struct ReplicateInfo {}

#[async_trait]
impl Statistic for ReplicateInfo {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let query = Query::common("experiments", REPLICATE_COLUMNS)
            .filter_eq("project_id", conf.id(Level::Project)?)
            .filter_eq("experiment_id", conf.id(Level::Replicate)?);
        let row = first_row(source.fetch(&query, conf).await?, &query)?;
        let mut table = Table::new(replicate_description());
        table.push(describe_replicate(source, conf, row).await?)?;
        Ok(table)
    }
}

/// Description of an experiment, taken from its first replicate.
pub struct ExperimentInfo {}

#[async_trait]
impl Statistic for ExperimentInfo {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let query = hierarchy::experiment_query(&context.settings, conf, REPLICATE_COLUMNS)?;
        let mut table = Table::new(replicate_description());
        match source.fetch(&query, conf).await?.into_iter().next() {
            Some(row) => table.push(describe_replicate(source, conf, row).await?)?,
            None => table.push_null_row(),
        }
        Ok(table)
    }
}

/// Replicates of an experiment with the address of their pages.
pub struct ExperimentReplicates {}

#[async_trait]
impl Statistic for ExperimentReplicates {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let projectid = conf.id(Level::Project)?;
        let parameter_list = conf.require("parameter_list")?;
        let parameter_values = conf.require("parameter_values")?;
        let mut table = Table::new(vec![
            Column::string("Project Id"),
            Column::string("Parameter List"),
            Column::string("Parameter Values"),
            Column::string("Replicate Id"),
            Column::string("Replicate Url"),
        ]);
        for replicateid in hierarchy::experiment_replicates(source, &context.settings, conf).await? {
            let url = format!(
                "/project/{}/{}/{}/replicate/{}",
                projectid, parameter_list, parameter_values, replicateid
            );
            table.push(vec![
                projectid.into(),
                parameter_list.into(),
                parameter_values.into(),
                replicateid.into(),
                url.into(),
            ])?;
        }
        Ok(table)
    }
}

/// Columns of `experiments` listed for every replicate of a project.
const LISTING_COLUMNS: &[&str] = &[
    "project_id",
    "experiment_id",
    "species_id",
    "genome_id",
    "annotation_id",
    "template_file",
    "read_length",
    "mismatches",
    "exp_description",
    "expDate",
    "CellType",
    "RNAType",
    "Compartment",
    "Bioreplicate",
    "partition",
    "annotation_version",
    "lab",
    "paired",
];

/// Every replicate of a project with its species, genome and annotation files.
///
/// Each row links either to the replicate's experiment or to the replicate itself. Replicates
/// whose species, genome or annotation cannot be found are left out.
pub struct ReplicateListing {
    link_replicates: bool,
}

impl ReplicateListing {
    pub const EXPERIMENTS: ReplicateListing = ReplicateListing {
        link_replicates: false,
    };
    pub const REPLICATES: ReplicateListing = ReplicateListing {
        link_replicates: true,
    };

    fn description() -> Vec<Column> {
        vec![
            Column::string("Project Id"),
            Column::string("Replicate Id"),
            Column::string("Species"),
            Column::string("Genome file name"),
            Column::string("Genome file location"),
            Column::string("Genome assembly"),
            Column::string("Genome gender"),
            Column::string("Annotation file name"),
            Column::string("Annotation file location"),
            Column::string("Annotation version"),
            Column::string("Template File"),
            Column::number("Read Length"),
            Column::number("Mismatches"),
            Column::string("Replicate Description"),
            Column::string("Replicate Date"),
            Column::string("Cell Type"),
            Column::string("RNA Type"),
            Column::string("Localization"),
            Column::string("Bioreplicate"),
            Column::string("Partition"),
            Column::string("Annotation Version"),
            Column::string("Lab"),
            Column::number("Paired"),
            Column::string("URL"),
        ]
    }
}

/// Lookups shared by the rows of a [ReplicateListing].
struct ListingLookups {
    species: Lookup,
    genomes: Lookup,
    annotations: Lookup,
}

impl ListingLookups {
    fn new() -> Self {
        ListingLookups {
            species: Lookup::species(),
            genomes: Lookup::new(
                "genome_files",
                "genome_id",
                &["genome", "location", "assembly", "gender"],
            ),
            annotations: Lookup::new(
                "annotation_files",
                "annotation_id",
                &["annotation", "location", "version"],
            ),
        }
    }

    /// Replace the species, genome and annotation identifiers of a [LISTING_COLUMNS] row by
    /// their descriptions.
    async fn describe(
        &mut self,
        source: &dyn StatsSource,
        conf: &Configuration,
        row: Row,
    ) -> Result<Row, StatsError> {
        let mut cells = row.into_iter();
        let mut described: Row = cells.by_ref().take(2).collect();
        let species_id = cells.next().unwrap_or(Cell::Null);
        let genome_id = cells.next().unwrap_or(Cell::Null);
        let annotation_id = cells.next().unwrap_or(Cell::Null);
        described.extend(self.species.get(source, conf, &species_id).await?);
        described.extend(self.genomes.get(source, conf, &genome_id).await?);
        described.extend(self.annotations.get(source, conf, &annotation_id).await?);
        described.extend(cells);
        Ok(described)
    }
}

#[async_trait]
impl Statistic for ReplicateListing {
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError> {
        let conf = &context.params;
        let projectid = conf.id(Level::Project)?;
        let parameter_list = parameter_list(&context.settings, projectid)?;
        let experiments: HashMap<String, String> =
            hierarchy::project_replicates(source, &context.settings, conf)
                .await?
                .into_iter()
                .map(|replicate| {
                    let experimentid = replicate.experimentid();
                    (replicate.replicateid, experimentid)
                })
                .collect();

        let query = Query::common("experiments", LISTING_COLUMNS).filter_eq("project_id", projectid);
        let mut lookups = ListingLookups::new();
        let mut table = Table::new(Self::description());
        for row in source.fetch(&query, conf).await? {
            let replicateid = row.get(1).map(Cell::to_string).unwrap_or_default();
            let Some(mut row) = attempt(conf, lookups.describe(source, conf, row)).await else {
                continue;
            };
            let experimentid = experiments.get(&replicateid).cloned().unwrap_or_default();
            let mut url = format!("/project/{}/{}/{}", projectid, parameter_list, experimentid);
            if self.link_replicates {
                url.push_str(&format!("/replicate/{}", replicateid));
            }
            row.push(url.into());
            table.push(row)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Configuration, Configurations};
    use crate::test_utils::{self, FakeSource};

    fn context(projectid: &str) -> Context {
        let params = Configuration::new().with("projectid", projectid);
        let mut context = test_utils::context(
            Level::Project,
            Level::Project,
            Configurations::Flat(vec![params.clone()]),
        );
        context.params = params;
        context
    }

    #[tokio::test]
    async fn projects_from_settings() {
        let source = FakeSource::new(|_, _| panic!("unexpected query"));
        let table = Projects {}.compute(&source, &context("P")).await.unwrap();
        assert_eq!(
            vec![
                vec![Cell::from("P"), Cell::from("/project/P/tab/experiments/")],
                vec![Cell::from("Q"), Cell::from("/project/Q/tab/experiments/")],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn project_info() {
        let source = FakeSource::new(|query, _| {
            assert_eq!(Some("P"), query.filter_value("project_id"));
            Ok(vec![vec!["ENCODE cell lines".into(), "Homo sapiens".into()]])
        });
        let table = Info {}.compute(&source, &context("P")).await.unwrap();
        assert_eq!(
            vec![vec![
                Cell::from("ENCODE cell lines"),
                Cell::from("Homo sapiens")
            ]],
            table.table_data
        );
    }

    #[tokio::test]
    async fn project_info_missing() {
        let source = FakeSource::new(|_, _| Ok(vec![]));
        assert!(matches!(
            Info {}.compute(&source, &context("P")).await,
            Err(StatsError::EmptyResult { .. })
        ));
    }

    #[tokio::test]
    async fn experiments_grouped_by_parameters() {
        let source = FakeSource::new(|_, _| {
            Ok(vec![
                vec!["R1".into(), "K562".into(), "LONGPOLYA".into()],
                vec!["R2".into(), "K562".into(), "LONGPOLYA".into()],
                vec!["R3".into(), "GM12878".into(), Cell::Null],
            ])
        });
        let table = ExperimentsTable {}
            .compute(&source, &context("P"))
            .await
            .unwrap();
        let labels: Vec<&str> = table.table_description.iter().map(Column::label).collect();
        assert_eq!(
            vec![
                "Project id",
                "Parameter List",
                "Parameter Values",
                "# Replicates",
                "Cell Type",
                "RNA Type",
            ],
            labels
        );
        assert_eq!(
            vec![
                vec![
                    Cell::from("P"),
                    "cell-rnaExtract".into(),
                    "GM12878-@".into(),
                    "1".into(),
                    "GM12878".into(),
                    "@".into(),
                ],
                vec![
                    Cell::from("P"),
                    "cell-rnaExtract".into(),
                    "K562-LONGPOLYA".into(),
                    "2".into(),
                    "K562".into(),
                    "LONGPOLYA".into(),
                ],
            ],
            table.table_data
        );
    }

    #[tokio::test]
    async fn project_without_experiments() {
        let source = FakeSource::new(|_, _| Ok(vec![]));
        let table = ExperimentsTable {}
            .compute(&source, &context("Q"))
            .await
            .unwrap();
        assert_eq!(7, table.width());
        assert_eq!(vec![vec![Cell::Null; 7]], table.table_data);
    }

    fn replicate_context() -> Context {
        let mut context = context("P");
        context.params = context.params.clone().with("replicateid", "R1");
        context
    }

    /// Species 1, genome 2 and annotation 3 exist.
    fn lookup_rows(query: &Query) -> Option<Result<Vec<Row>, StatsError>> {
        let rows = match query.relation.name() {
            "species_info" if query.filter_value("species_id") == Some("1") => {
                vec![vec![Cell::from("Homo sapiens")]]
            }
            "annotation_files" if query.columns.len() == 2 => {
                vec![vec![Cell::from("v3c"), Cell::from("GENCODE")]]
            }
            "annotation_files" => vec![vec![
                Cell::from("gencode.gtf"),
                Cell::from("/annotations"),
                Cell::from("v3c"),
            ]],
            "genome_files" if query.filter_value("genome_id") != Some("2") => vec![],
            "genome_files" if query.columns.len() == 3 => vec![vec![
                Cell::from("hg19"),
                Cell::from("UCSC"),
                Cell::from("female"),
            ]],
            "genome_files" => vec![vec![
                Cell::from("hg19.fa"),
                Cell::from("/genomes"),
                Cell::from("hg19"),
                Cell::from("female"),
            ]],
            _ => return None,
        };
        Some(Ok(rows))
    }

    fn replicate_row() -> Row {
        vec![
            Cell::Int(1),
            Cell::Int(2),
            Cell::Int(3),
            Cell::Int(76),
            Cell::Int(2),
            Cell::from("K562 long polyA"),
            Cell::from("2010-01-01"),
            Cell::from("K562"),
            Cell::from("LONGPOLYA"),
            Cell::from("CELL"),
            Cell::from("1"),
            Cell::from("@"),
            Cell::Int(1),
        ]
    }

    #[tokio::test]
    async fn replicate_info() {
        let source = FakeSource::new(|query, _| {
            if let Some(rows) = lookup_rows(query) {
                return rows;
            }
            assert_eq!(Some("R1"), query.filter_value("experiment_id"));
            assert_eq!(Some("P"), query.filter_value("project_id"));
            Ok(vec![replicate_row()])
        });
        let table = ReplicateInfo {}
            .compute(&source, &replicate_context())
            .await
            .unwrap();
        assert_eq!(16, table.width());
        assert_eq!(
            vec![vec![
                Cell::Int(76),
                Cell::Int(2),
                Cell::from("K562 long polyA"),
                Cell::from("2010-01-01"),
                Cell::from("K562"),
                Cell::from("LONGPOLYA"),
                Cell::from("CELL"),
                Cell::from("1"),
                Cell::from("@"),
                Cell::Int(1),
                Cell::from("Homo sapiens"),
                Cell::from("v3c"),
                Cell::from("GENCODE"),
                Cell::from("hg19"),
                Cell::from("UCSC"),
                Cell::from("female"),
            ]],
            table.table_data
        );
    }

    #[tokio::test]
    async fn replicate_info_missing() {
        let source = FakeSource::new(|_, _| Ok(vec![]));
        assert!(matches!(
            ReplicateInfo {}.compute(&source, &replicate_context()).await,
            Err(StatsError::EmptyResult { .. })
        ));
    }

    fn experiment_context() -> Context {
        let mut context = context("P");
        context.params = context
            .params
            .clone()
            .with("parameter_list", "cell")
            .with("parameter_values", "K562");
        context
    }

    #[tokio::test]
    async fn experiment_info_from_first_replicate() {
        let source = FakeSource::new(|query, _| {
            if let Some(rows) = lookup_rows(query) {
                return rows;
            }
            assert_eq!(Some("K562"), query.filter_value("CellType"));
            Ok(vec![replicate_row(), vec![Cell::Null; 13]])
        });
        let table = ExperimentInfo {}
            .compute(&source, &experiment_context())
            .await
            .unwrap();
        assert_eq!(1, table.table_data.len());
        assert_eq!(Cell::Int(76), table.table_data[0][0]);
        assert_eq!(Cell::from("female"), table.table_data[0][15]);
    }

    #[tokio::test]
    async fn experiment_info_without_replicates() {
        let source = FakeSource::new(|_, _| Ok(vec![]));
        let table = ExperimentInfo {}
            .compute(&source, &experiment_context())
            .await
            .unwrap();
        assert_eq!(vec![vec![Cell::Null; 16]], table.table_data);
    }

    #[tokio::test]
    async fn experiment_replicates_with_links() {
        let source = FakeSource::new(|query, _| {
            assert_eq!(Some("K562"), query.filter_value("CellType"));
            Ok(vec![vec![Cell::from("R1")], vec![Cell::from("R2")]])
        });
        let table = ExperimentReplicates {}
            .compute(&source, &experiment_context())
            .await
            .unwrap();
        assert_eq!(
            vec![
                vec![
                    Cell::from("P"),
                    Cell::from("cell"),
                    Cell::from("K562"),
                    Cell::from("R1"),
                    Cell::from("/project/P/cell/K562/replicate/R1"),
                ],
                vec![
                    Cell::from("P"),
                    Cell::from("cell"),
                    Cell::from("K562"),
                    Cell::from("R2"),
                    Cell::from("/project/P/cell/K562/replicate/R2"),
                ],
            ],
            table.table_data
        );
    }

    fn listing_row(replicateid: &str, genome_id: i64) -> Row {
        vec![
            Cell::from("P"),
            Cell::from(replicateid),
            Cell::Int(1),
            Cell::Int(genome_id),
            Cell::Int(3),
            Cell::from("template.txt"),
            Cell::Int(76),
            Cell::Int(2),
            Cell::from("description"),
            Cell::from("2010-01-01"),
            Cell::from("K562"),
            Cell::from("LONGPOLYA"),
            Cell::from("CELL"),
            Cell::from("1"),
            Cell::from("@"),
            Cell::from("v3c"),
            Cell::from("CRG"),
            Cell::Int(1),
        ]
    }

    fn listing_source() -> FakeSource {
        FakeSource::new(|query, _| {
            if let Some(rows) = lookup_rows(query) {
                return rows;
            }
            if query.columns.len() == LISTING_COLUMNS.len() {
                return Ok(vec![
                    listing_row("R1", 2),
                    listing_row("R2", 2),
                    listing_row("R3", 9),
                ]);
            }
            Ok(vec![
                vec![Cell::from("R1"), Cell::from("K562"), Cell::from("LONGPOLYA")],
                vec![Cell::from("R2"), Cell::from("K562"), Cell::Null],
                vec![Cell::from("R3"), Cell::from("K562"), Cell::Null],
            ])
        })
    }

    #[tokio::test]
    async fn replicates_linked_to_experiments() {
        let source = listing_source();
        let table = ReplicateListing::EXPERIMENTS
            .compute(&source, &context("P"))
            .await
            .unwrap();
        assert_eq!(24, table.width());
        // R3 has no genome.
        assert_eq!(2, table.table_data.len());
        assert_eq!(
            vec![
                Cell::from("P"),
                Cell::from("R1"),
                Cell::from("Homo sapiens"),
                Cell::from("hg19.fa"),
                Cell::from("/genomes"),
                Cell::from("hg19"),
                Cell::from("female"),
                Cell::from("gencode.gtf"),
                Cell::from("/annotations"),
                Cell::from("v3c"),
                Cell::from("template.txt"),
                Cell::Int(76),
                Cell::Int(2),
                Cell::from("description"),
                Cell::from("2010-01-01"),
                Cell::from("K562"),
                Cell::from("LONGPOLYA"),
                Cell::from("CELL"),
                Cell::from("1"),
                Cell::from("@"),
                Cell::from("v3c"),
                Cell::from("CRG"),
                Cell::Int(1),
                Cell::from("/project/P/cell-rnaExtract/K562-LONGPOLYA"),
            ],
            table.table_data[0]
        );
        // Two listings, one lookup per species, genome and annotation, and the missing genome.
        assert_eq!(6, source.calls());
    }

    #[tokio::test]
    async fn replicates_linked_to_themselves() {
        let table = ReplicateListing::REPLICATES
            .compute(&listing_source(), &context("P"))
            .await
            .unwrap();
        assert_eq!(
            Cell::from("/project/P/cell-rnaExtract/K562-@/replicate/R2"),
            table.table_data[1][23]
        );
    }
}
