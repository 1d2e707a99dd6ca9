use crate::error::StatsError;
use crate::models::Context;
use crate::source::StatsSource;
use crate::table::Table;

use async_trait::async_trait;

/// Trait for statistics resources.
///
/// This forms the contract between the API layer and statistics.
#[async_trait]
pub trait Statistic: Send + Sync {
    /// Compute the statistic.
    ///
    /// Returns a [Table](crate::table::Table) with the chart data.
    ///
    /// # Arguments
    ///
    /// * `source`: Source of the statistics data
    /// * `context`: Expanded configurations and request parameters
    async fn compute(
        &self,
        source: &dyn StatsSource,
        context: &Context,
    ) -> Result<Table, StatsError>;
}
