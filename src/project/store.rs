use super::document::ProjectDocument;
use crate::error::ProjectError;
use ahash::AHashMap;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Where project documents live.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<ProjectDocument, ProjectError>;
    async fn save(&self, id: &str, document: &ProjectDocument) -> Result<(), ProjectError>;
}

/// Keeps serialized documents in memory. Documents pass through JSON on every save and
/// load, exactly as they would with a remote store.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    documents: Mutex<AHashMap<String, String>>,
    saves: Mutex<usize>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn load(&self, id: &str) -> Result<ProjectDocument, ProjectError> {
        let documents = self.documents.lock().await;
        let json = documents
            .get(id)
            .ok_or_else(|| ProjectError::Store(format!("Unknown project '{id}'")))?;
        ProjectDocument::from_json(json)
    }

    async fn save(&self, id: &str, document: &ProjectDocument) -> Result<(), ProjectError> {
        let json =
            serde_json::to_string(document).map_err(|e| ProjectError::Encode(e.to_string()))?;
        self.documents.lock().await.insert(id.to_string(), json);
        *self.saves.lock().await += 1;
        Ok(())
    }
}
