use super::debounce::Debouncer;
use super::service::{GenerationRequest, GenerationService, ManifestDialect};
use crate::error::{GenerationError, ImportError};
use crate::interaction::Snapshot;
use crate::manifest::export;
use crate::notification::{Notification, NotificationSender};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub debounce: Duration,
    pub dialect: ManifestDialect,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            dialect: ManifestDialect::default(),
        }
    }
}

impl PipelineOptions {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_dialect(mut self, dialect: ManifestDialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// The manifest text currently shown, tagged with the request that produced it.
/// Sequence `0` means nothing has been rendered yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub sequence: u64,
    pub text: String,
}

impl Rendered {
    /// A read-only JSON view of the rendered YAML. Multi-document output (Kubernetes)
    /// becomes an array of documents; nothing rendered yet is `null`.
    pub fn as_json(&self) -> Result<Value, ImportError> {
        let mut documents = Vec::new();
        if !self.text.trim().is_empty() {
            for document in serde_yaml::Deserializer::from_str(&self.text) {
                let value =
                    Value::deserialize(document).map_err(|e| ImportError::Parse(e.to_string()))?;
                if !value.is_null() {
                    documents.push(value);
                }
            }
        }
        Ok(match documents.len() {
            0 => Value::Null,
            1 => documents.remove(0),
            _ => Value::Array(documents),
        })
    }
}

type Outcome = (u64, Result<String, GenerationError>);

/// Debounced export + generate loop running on its own tokio task.
///
/// Snapshots go in through [`notify`](Self::notify) (or a cloned [`sender`](Self::sender)
/// handed to a [`Canvas`](crate::interaction::Canvas) as its observer). Every settled
/// snapshot gets the next sequence number; a response older than the newest settled one
/// (rendered or failed) is dropped, so a slow request can never overwrite a newer manifest.
pub struct RegenerationPipeline {
    snapshots: mpsc::UnboundedSender<Snapshot>,
    rendered: watch::Receiver<Rendered>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RegenerationPipeline {
    pub fn spawn<S>(
        service: Arc<S>,
        options: PipelineOptions,
        notifications: Option<NotificationSender>,
    ) -> Self
    where
        S: GenerationService + 'static,
    {
        let (snapshots, snapshot_rx) = mpsc::unbounded_channel();
        let (rendered_tx, rendered) = watch::channel(Rendered::default());
        let (shutdown, shutdown_rx) = oneshot::channel();

        let worker = Worker {
            service,
            dialect: options.dialect,
            rendered: rendered_tx,
            notifications,
            next_sequence: 0,
            settled: 0,
        };
        let debouncer = Debouncer::new(snapshot_rx, options.debounce);
        let task = tokio::spawn(worker.run(debouncer, shutdown_rx));

        Self {
            snapshots,
            rendered,
            shutdown: Some(shutdown),
            task,
        }
    }

    pub fn notify(&self, snapshot: Snapshot) {
        if self.snapshots.send(snapshot).is_err() {
            debug!("Regeneration pipeline has stopped; snapshot dropped");
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Snapshot> {
        self.snapshots.clone()
    }

    pub fn rendered(&self) -> watch::Receiver<Rendered> {
        self.rendered.clone()
    }

    pub fn current_text(&self) -> String {
        self.rendered.borrow().text.clone()
    }

    /// Stops accepting snapshots, generates the one still waiting out the debounce (if
    /// any), lets in-flight requests finish and waits for the task.
    pub async fn shutdown(mut self) -> Rendered {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(error) = (&mut self.task).await {
            warn!(%error, "Regeneration task ended abnormally");
        }
        self.rendered.borrow().clone()
    }
}

struct Worker<S> {
    service: Arc<S>,
    dialect: ManifestDialect,
    rendered: watch::Sender<Rendered>,
    notifications: Option<NotificationSender>,
    next_sequence: u64,
    /// Highest sequence whose request has answered, successfully or not.
    settled: u64,
}

impl<S: GenerationService + 'static> Worker<S> {
    async fn run(
        mut self,
        mut debouncer: Debouncer<Snapshot>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut requests: JoinSet<Outcome> = JoinSet::new();
        let mut accepting = true;
        let mut stopping = false;
        loop {
            tokio::select! {
                snapshot = debouncer.next(), if accepting => match snapshot {
                    Some(snapshot) => self.start_cycle(snapshot, &mut requests),
                    None => accepting = false,
                },
                _ = &mut shutdown, if !stopping => {
                    debug!("Regeneration pipeline shutting down");
                    stopping = true;
                    debouncer.close();
                }
                Some(joined) = requests.join_next(), if !requests.is_empty() => match joined {
                    Ok((sequence, result)) => self.finish_cycle(sequence, result),
                    Err(error) => self.abandon_cycle(error),
                }
            }
            if !accepting && requests.is_empty() {
                break;
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(sequence = self.next_sequence + 1))]
    fn start_cycle(&mut self, snapshot: Snapshot, requests: &mut JoinSet<Outcome>) {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let request = GenerationRequest {
            dialect: self.dialect,
            payload: export(&snapshot.graph, snapshot.version),
        };
        let service = Arc::clone(&self.service);
        requests.spawn(async move { (sequence, service.generate(&request).await) });
    }

    fn finish_cycle(&mut self, sequence: u64, result: Result<String, GenerationError>) {
        if sequence <= self.settled {
            debug!(sequence, settled = self.settled, "Discarding stale generation result");
            return;
        }
        self.settled = sequence;
        match result {
            Ok(text) => {
                info!(sequence, bytes = text.len(), "Manifest rendered");
                self.rendered.send_replace(Rendered { sequence, text });
            }
            Err(error) => {
                warn!(sequence, %error, "Manifest generation failed");
                self.notify(Notification::error(&error));
            }
        }
    }

    /// A request task that panicked or was cancelled counts as a failed cycle. Its
    /// sequence is unknown, so the stale guard is left where it is.
    fn abandon_cycle(&self, error: JoinError) {
        warn!(%error, "Manifest generation task did not complete");
        self.notify(Notification::error(format!(
            "Manifest generation did not complete: {error}"
        )));
    }

    fn notify(&self, notification: Notification) {
        if let Some(notifications) = &self.notifications {
            let _ = notifications.send(notification);
        }
    }
}
