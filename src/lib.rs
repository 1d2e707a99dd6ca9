//! This crate provides a statistics server for the results of an RNA-seq pipeline. It serves chart
//! data about reads, mappings, expression, splicing and junction discovery, computed from
//! per-replicate pipeline tables held in MySQL.
//!
//! Every request names a unit of the experiment hierarchy: a project, an experiment, a replicate
//! or a lane. Statistics are stored at a finer resolution, so a request is expanded into one
//! configuration per stored unit. The statistic then queries each configuration in turn and
//! merges the results, either into a single aggregate or into one group per partition. Queries
//! that fail are logged, counted and left out.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of settings and response data.
//! * [SQLx](sqlx) queries the pipeline databases.
//! * [rand] and [rand_chacha] provide reproducible sampling of genes and profile points.

pub mod aggregate;
pub mod app;
pub mod app_state;
pub mod cli;
pub mod configurations;
pub mod error;
pub mod hierarchy;
pub mod metrics;
pub mod models;
pub mod mysql;
pub mod registry;
pub mod sampling;
pub mod server;
pub mod settings;
pub mod source;
pub mod statistic;
pub mod statistics;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_path;
