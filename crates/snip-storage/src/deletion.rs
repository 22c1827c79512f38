use async_trait::async_trait;
use parking_lot::Mutex;
use snip_core::error::{Result, StorageError};
use snip_core::DeletionRequest;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default number of requests that may wait in the queue before
/// [`DeletionQueue::enqueue`] starts applying backpressure.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Applies one deletion request to the underlying store.
#[async_trait]
pub trait DeletionHandler: Send + Sync + 'static {
    /// Marks the request's links as deleted and returns how many were marked.
    async fn apply(&self, request: &DeletionRequest) -> Result<u64>;
}

/// A bounded queue of soft-delete requests served by a single background worker.
///
/// Requests are applied one at a time in FIFO order. A failing request is
/// logged and dropped; it is never retried. When the queue is full,
/// [`enqueue`](Self::enqueue) waits for room instead of dropping the request.
#[derive(Debug)]
pub struct DeletionQueue {
    sender: mpsc::Sender<DeletionRequest>,
    shutdown: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DeletionQueue {
    /// Starts the worker on the current Tokio runtime.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn spawn<H: DeletionHandler>(handler: H, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Notify::new());
        let worker = tokio::spawn(run_worker(handler, receiver, Arc::clone(&shutdown)));

        info!(capacity = capacity.max(1), "deletion worker started");

        Self {
            sender,
            shutdown,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Hands a request to the worker.
    ///
    /// Returns [`StorageError::Closed`] once the queue has been closed.
    pub async fn enqueue(&self, request: DeletionRequest) -> Result<()> {
        self.sender
            .send(request)
            .await
            .map_err(|_| StorageError::Closed)
    }

    /// Stops accepting requests, waits for the queued ones to be applied and
    /// then for the worker to exit. Calling it again is a no-op.
    pub async fn close(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        self.shutdown.notify_one();

        if let Err(err) = worker.await {
            error!(error = %err, "deletion worker terminated abnormally");
        }
    }
}

async fn run_worker<H: DeletionHandler>(
    handler: H,
    mut receiver: mpsc::Receiver<DeletionRequest>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            request = receiver.recv() => match request {
                Some(request) => apply(&handler, request).await,
                None => {
                    debug!("deletion queue dropped, worker exiting");
                    return;
                }
            },
        }
    }

    receiver.close();
    let mut drained = 0_usize;
    while let Some(request) = receiver.recv().await {
        apply(&handler, request).await;
        drained += 1;
    }

    info!(drained, "deletion worker stopped");
}

async fn apply<H: DeletionHandler>(handler: &H, request: DeletionRequest) {
    if request.codes.is_empty() {
        warn!(owner_id = %request.owner_id, "skipping deletion request without codes");
        return;
    }

    match handler.apply(&request).await {
        Ok(marked) => debug!(
            owner_id = %request.owner_id,
            requested = request.codes.len(),
            marked,
            "links marked as deleted"
        ),
        Err(err) => error!(
            owner_id = %request.owner_id,
            requested = request.codes.len(),
            error = %err,
            "failed to mark links as deleted"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snip_core::ShortCode;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    #[derive(Clone, Default)]
    struct RecordingHandler {
        applied: Arc<Mutex<Vec<DeletionRequest>>>,
        fail_owner: Option<String>,
        gate: Option<Arc<Semaphore>>,
        started: Arc<Notify>,
    }

    #[async_trait]
    impl DeletionHandler for RecordingHandler {
        async fn apply(&self, request: &DeletionRequest) -> Result<u64> {
            self.started.notify_one();

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }

            if self.fail_owner.as_deref() == Some(request.owner_id.as_str()) {
                return Err(StorageError::Query("boom".into()));
            }

            self.applied.lock().push(request.clone());
            Ok(request.codes.len() as u64)
        }
    }

    fn request(code: &str, owner: &str) -> DeletionRequest {
        DeletionRequest::new(vec![ShortCode::new_unchecked(code)], owner)
    }

    #[tokio::test]
    async fn applies_requests_in_fifo_order() {
        let handler = RecordingHandler::default();
        let queue = DeletionQueue::spawn(handler.clone(), 8);

        for code in ["aaa", "bbb", "ccc"] {
            queue.enqueue(request(code, "alice")).await.unwrap();
        }
        queue.close().await;

        let applied: Vec<_> = handler
            .applied
            .lock()
            .iter()
            .map(|r| r.codes[0].to_string())
            .collect();
        assert_eq!(applied, vec!["aaa", "bbb", "ccc"]);
    }

    #[tokio::test]
    async fn failed_request_does_not_stop_worker() {
        let handler = RecordingHandler {
            fail_owner: Some("mallory".into()),
            ..Default::default()
        };
        let queue = DeletionQueue::spawn(handler.clone(), 8);

        queue.enqueue(request("aaa", "mallory")).await.unwrap();
        queue.enqueue(request("bbb", "alice")).await.unwrap();
        queue.close().await;

        let applied = handler.applied.lock().clone();
        assert_eq!(applied, vec![request("bbb", "alice")]);
    }

    #[tokio::test]
    async fn close_drains_queued_requests() {
        let gate = Arc::new(Semaphore::new(0));
        let handler = RecordingHandler {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let queue = DeletionQueue::spawn(handler.clone(), 8);

        for i in 0..5 {
            queue
                .enqueue(request(&format!("code{i}"), "alice"))
                .await
                .unwrap();
        }
        gate.add_permits(5);
        queue.close().await;

        assert_eq!(handler.applied.lock().len(), 5);
    }

    #[tokio::test]
    async fn enqueue_after_close_fails() {
        let queue = DeletionQueue::spawn(RecordingHandler::default(), 8);
        queue.close().await;
        queue.close().await;

        let err = queue.enqueue(request("aaa", "alice")).await.unwrap_err();
        assert!(matches!(err, StorageError::Closed));
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let gate = Arc::new(Semaphore::new(0));
        let handler = RecordingHandler {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let queue = DeletionQueue::spawn(handler.clone(), 1);

        // The worker takes the first request and blocks on the gate.
        queue.enqueue(request("aaa", "alice")).await.unwrap();
        handler.started.notified().await;

        // The second fills the single slot, the third has to wait.
        queue.enqueue(request("bbb", "alice")).await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), queue.enqueue(request("ccc", "alice")))
                .await;
        assert!(blocked.is_err());

        gate.add_permits(3);
        queue.enqueue(request("ccc", "alice")).await.unwrap();
        queue.close().await;

        assert_eq!(handler.applied.lock().len(), 3);
    }

    #[tokio::test]
    async fn empty_request_is_skipped() {
        let handler = RecordingHandler::default();
        let queue = DeletionQueue::spawn(handler.clone(), 8);

        queue
            .enqueue(DeletionRequest::new(Vec::new(), "alice"))
            .await
            .unwrap();
        queue.close().await;

        assert!(handler.applied.lock().is_empty());
    }
}
