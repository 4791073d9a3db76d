use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::traits::{GroupingStore, StateStore};
use crate::error::Result;
use crate::models::{AggregateState, EnrichedIndex, EntryGroup};

/// Process-local store, mostly for tests and embedding callers that persist
/// elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<Option<AggregateState>>,
    enriched: RwLock<EnrichedIndex>,
    groups: RwLock<Vec<EntryGroup>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn load_state(&self) -> Result<Option<AggregateState>> {
        Ok(self.state.read().await.clone())
    }
    async fn save_state(&self, state: &AggregateState) -> Result<()> {
        *self.state.write().await = Some(state.clone());
        Ok(())
    }
    async fn load_enriched(&self) -> Result<EnrichedIndex> {
        Ok(self.enriched.read().await.clone())
    }
    async fn save_enriched(&self, enriched: &EnrichedIndex) -> Result<()> {
        *self.enriched.write().await = enriched.clone();
        Ok(())
    }
}

#[async_trait]
impl GroupingStore for InMemoryStore {
    async fn load_groups(&self) -> Result<Vec<EntryGroup>> {
        Ok(self.groups.read().await.clone())
    }
    async fn save_groups(&self, groups: &[EntryGroup]) -> Result<()> {
        *self.groups.write().await = groups.to_vec();
        Ok(())
    }
}
