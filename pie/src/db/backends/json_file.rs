use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::config::StorageConfig;
use crate::db::traits::{GroupingStore, StateStore};
use crate::error::Result;
use crate::models::{AggregateState, EnrichedIndex, EntryGroup};

const STATE_FILE: &str = "pie_state.json";
const ENRICHED_FILE: &str = "pie_enriched.json";
const GROUPS_FILE: &str = "groupings.json";

/// Stores each document as a pretty-printed JSON file under one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} yet, starting empty", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value)?;

        // Write to .tmp then rename so readers never see a partial file
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).await?;
        fs::rename(&tmp_path, &path).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_state(&self) -> Result<Option<AggregateState>> {
        self.read_json(STATE_FILE).await
    }
    async fn save_state(&self, state: &AggregateState) -> Result<()> {
        self.write_json(STATE_FILE, state).await
    }
    async fn load_enriched(&self) -> Result<EnrichedIndex> {
        Ok(self.read_json(ENRICHED_FILE).await?.unwrap_or_default())
    }
    async fn save_enriched(&self, enriched: &EnrichedIndex) -> Result<()> {
        self.write_json(ENRICHED_FILE, enriched).await
    }
}

#[async_trait]
impl GroupingStore for JsonFileStore {
    async fn load_groups(&self) -> Result<Vec<EntryGroup>> {
        Ok(self.read_json(GROUPS_FILE).await?.unwrap_or_default())
    }
    async fn save_groups(&self, groups: &[EntryGroup]) -> Result<()> {
        self.write_json(GROUPS_FILE, groups).await
    }
}
