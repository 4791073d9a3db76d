use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AggregateState, EnrichedIndex, EntryGroup};

// ---------------------------------------------------------------------------
// Individual store traits
// ---------------------------------------------------------------------------

/// Persistence for the orchestrator's aggregate and the enriched entry index.
///
/// The two are stored separately because the index grows with the journal
/// while the aggregate stays small.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// `None` when nothing has been saved yet.
    async fn load_state(&self) -> Result<Option<AggregateState>>;
    async fn save_state(&self, state: &AggregateState) -> Result<()>;
    /// Empty when nothing has been saved yet.
    async fn load_enriched(&self) -> Result<EnrichedIndex>;
    async fn save_enriched(&self, enriched: &EnrichedIndex) -> Result<()>;
}

/// Persistence for the grouping service's clusters.
#[async_trait]
pub trait GroupingStore: Send + Sync {
    async fn load_groups(&self) -> Result<Vec<EntryGroup>>;
    async fn save_groups(&self, groups: &[EntryGroup]) -> Result<()>;
}
