use super::document::ProjectDocument;
use super::store::ProjectStore;
use crate::notification::{Notification, NotificationSender};
use crate::regen::Debouncer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1200);

/// Saves a project in the background once edits settle.
///
/// The first document observed is the baseline and is never saved. After that a settled
/// document is saved only when its serialized form differs from the last successful save.
pub struct Autosave {
    documents: mpsc::UnboundedSender<ProjectDocument>,
    task: JoinHandle<()>,
}

impl Autosave {
    pub fn spawn<S>(
        store: Arc<S>,
        project_id: impl Into<String>,
        delay: Duration,
        notifications: Option<NotificationSender>,
    ) -> Self
    where
        S: ProjectStore + 'static,
    {
        let (documents, rx) = mpsc::unbounded_channel();
        let project_id = project_id.into();
        let task = tokio::spawn(run(store, project_id, rx, delay, notifications));
        Self { documents, task }
    }

    pub fn observe(&self, document: ProjectDocument) {
        if self.documents.send(document).is_err() {
            debug!("Autosave has stopped; document dropped");
        }
    }

    /// Flushes the pending document, if any, and waits for the last save.
    pub async fn finish(self) {
        drop(self.documents);
        if let Err(error) = self.task.await {
            warn!(%error, "Autosave task ended abnormally");
        }
    }
}

async fn run<S: ProjectStore>(
    store: Arc<S>,
    project_id: String,
    mut rx: mpsc::UnboundedReceiver<ProjectDocument>,
    delay: Duration,
    notifications: Option<NotificationSender>,
) {
    let Some(baseline) = rx.recv().await else {
        return;
    };
    let mut last_saved = serde_json::to_string(&baseline).unwrap_or_default();

    let mut debouncer = Debouncer::new(rx, delay);
    while let Some(document) = debouncer.next().await {
        let snapshot = match serde_json::to_string(&document) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(%error, "Could not serialize project for autosave");
                continue;
            }
        };
        if snapshot == last_saved {
            debug!(project = %project_id, "Project unchanged since last save");
            continue;
        }
        match store.save(&project_id, &document).await {
            Ok(()) => {
                info!(project = %project_id, "Project autosaved");
                last_saved = snapshot;
            }
            Err(error) => {
                warn!(project = %project_id, %error, "Autosave failed");
                if let Some(notifications) = &notifications {
                    let _ = notifications.send(Notification::warning(&error));
                }
            }
        }
    }
}
