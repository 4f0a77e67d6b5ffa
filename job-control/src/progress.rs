use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// How long a stream waits for the next event before giving up on an idle
/// job and closing.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Progress,
    Done,
    Error,
    Timeout,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Progress => "progress",
            EventKind::Done => "done",
            EventKind::Error => "error",
            EventKind::Timeout => "timeout",
        }
    }
}

/// One entry in a job's ordered progress sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub payload: Map<String, Value>,
}

impl ProgressEvent {
    pub fn progress(payload: Value) -> Self {
        Self {
            kind: EventKind::Progress,
            payload: payload_fields(payload),
        }
    }

    pub fn done(payload: Value) -> Self {
        Self {
            kind: EventKind::Done,
            payload: payload_fields(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("message".to_string(), Value::String(message.into()));
        Self {
            kind: EventKind::Error,
            payload,
        }
    }

    pub fn timeout() -> Self {
        let mut payload = Map::new();
        payload.insert(
            "message".to_string(),
            Value::String("stream idle timeout exceeded".to_string()),
        );
        Self {
            kind: EventKind::Timeout,
            payload,
        }
    }

    /// Event JSON: the `event` discriminator plus the payload fields.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "event".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        for (key, value) in &self.payload {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    pub fn to_frame(&self) -> String {
        self.to_json().to_string()
    }
}

/// Payloads are JSON objects; anything else is tucked under a `data` key
/// so producers cannot break the frame shape.
fn payload_fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

enum QueueItem {
    Event(ProgressEvent),
    /// Stream-end sentinel enqueued after a terminal event.
    Close,
}

struct JobQueue {
    tx: UnboundedSender<QueueItem>,
    /// Taken by the first (only) consumer; `None` afterwards.
    rx: Option<UnboundedReceiver<QueueItem>>,
}

/// Per-job ordered event queues exposed as live, finite streams.
///
/// Producers push through `send`/`finalize`/`error`; one consumer drains
/// the queue via [`stream`]. Queues are unbounded: a producer that runs
/// far ahead of its consumer grows memory without cap, which is accepted
/// here in exchange for never blocking a pipeline stage on a slow client.
///
/// [`stream`]: ProgressBus::stream
pub struct ProgressBus {
    idle_timeout: Duration,
    jobs: Mutex<HashMap<String, JobQueue>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<String, JobQueue>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh job id with its queue.
    pub fn new_job(&self) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.ensure_queue(&job_id);
        job_id
    }

    /// Idempotently make sure a queue exists for the job. Concurrent
    /// callers converge on one queue; the registry lock covers only the
    /// map access, not queue operations.
    pub fn ensure_queue(&self, job_id: &str) {
        let mut guard = self.jobs();
        guard.entry(job_id.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            JobQueue { tx, rx: Some(rx) }
        });
    }

    pub fn is_tracked(&self, job_id: &str) -> bool {
        self.jobs().contains_key(job_id)
    }

    fn sender(&self, job_id: &str) -> Option<UnboundedSender<QueueItem>> {
        self.jobs().get(job_id).map(|queue| queue.tx.clone())
    }

    fn push(&self, job_id: &str, item: QueueItem) {
        match self.sender(job_id) {
            // The receiver is owned by the registry entry until the stream
            // takes it, so send only fails once the job was evicted.
            Some(tx) => {
                let _ = tx.send(item);
            }
            None => {
                tracing::trace!(job_id = %job_id, "dropping event for untracked job");
            }
        }
    }

    /// Enqueue a `progress` event. A send for an unknown or already-closed
    /// job is silently dropped.
    pub fn send(&self, job_id: &str, payload: Value) {
        self.push(job_id, QueueItem::Event(ProgressEvent::progress(payload)));
    }

    /// Enqueue the terminal `done` event and close the stream.
    pub fn finalize(&self, job_id: &str, payload: Value) {
        self.push(job_id, QueueItem::Event(ProgressEvent::done(payload)));
        self.push(job_id, QueueItem::Close);
    }

    /// Enqueue the terminal `error` event and close the stream.
    pub fn error(&self, job_id: &str, message: impl Into<String>) {
        self.push(job_id, QueueItem::Event(ProgressEvent::error(message)));
        self.push(job_id, QueueItem::Close);
    }

    /// Drop a job's queue. Later sends for the id are silently dropped.
    pub fn cleanup(&self, job_id: &str) {
        self.jobs().remove(job_id);
    }

    /// Single-consumer, finite stream of serialized event frames for one
    /// job, in exact send order.
    ///
    /// A job with no queue, or whose queue already has a consumer, yields
    /// one `error` frame and ends. Waiting is bounded by the idle timeout:
    /// an idle job yields one `timeout` frame and ends rather than
    /// blocking forever. Whatever ends the stream also evicts the queue.
    pub fn stream(self: Arc<Self>, job_id: String) -> impl Stream<Item = String> {
        let receiver = {
            let mut guard = self.jobs();
            guard.get_mut(&job_id).and_then(|queue| queue.rx.take())
        };

        stream! {
            let Some(mut receiver) = receiver else {
                yield ProgressEvent::error("unknown job: no active progress stream").to_frame();
                return;
            };

            loop {
                match tokio::time::timeout(self.idle_timeout, receiver.recv()).await {
                    Ok(Some(QueueItem::Event(event))) => yield event.to_frame(),
                    Ok(Some(QueueItem::Close)) | Ok(None) => break,
                    Err(_elapsed) => {
                        tracing::debug!(job_id = %job_id, "progress stream idle timeout");
                        yield ProgressEvent::timeout().to_frame();
                        break;
                    }
                }
            }

            self.cleanup(&job_id);
        }
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}
