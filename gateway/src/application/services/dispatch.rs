//! Application service: bounded worker pool for device operations.
//!
//! Requests are queued on a bounded channel and picked up by a fixed set of
//! worker tasks, so a slow device only ever occupies one worker. Each job
//! gets a [`CancellationToken`] that fires when the job's deadline passes or
//! when the requester stops waiting; the job is still awaited afterwards so it
//! can release its session.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::domain::{DispatchError, ResultEnvelope};

type JobFn = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, ResultEnvelope> + Send>;

struct Job {
    device: String,
    run: JobFn,
    cancel: CancellationToken,
    reply: oneshot::Sender<ResultEnvelope>,
}

/// Fixed-size pool of worker tasks fed by a bounded queue.
///
/// Dropping the pool closes the queue; workers exit once it is drained.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
}

impl WorkerPool {
    /// Spawn `workers` tasks on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(workers: usize, queue_depth: usize, operation_timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        for id in 0..workers.max(1) {
            tokio::spawn(worker_loop(id, Arc::clone(&receiver), operation_timeout));
        }

        tracing::debug!(workers, queue_depth, "worker pool started");
        Self { sender }
    }

    /// Queue `work` and wait for its single result.
    ///
    /// Waits for queue capacity when all slots are taken. Dropping the
    /// returned future cancels the job's token.
    ///
    /// # Errors
    ///
    /// `PoolClosed` if the workers are gone, `WorkerLost` if the job was
    /// dropped without producing a result.
    pub async fn submit<F, Fut>(
        &self,
        device: impl Into<String>,
        work: F,
    ) -> Result<ResultEnvelope, DispatchError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ResultEnvelope> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let _cancel_on_drop = cancel.clone().drop_guard();
        let (reply, response) = oneshot::channel();

        let job = Job {
            device: device.into(),
            run: Box::new(move |token| work(token).boxed()),
            cancel: cancel.clone(),
            reply,
        };

        self.sender
            .send(job)
            .await
            .map_err(|_| DispatchError::PoolClosed)?;
        response.await.map_err(|_| DispatchError::WorkerLost)
    }
}

async fn worker_loop(
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    operation_timeout: Duration,
) {
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            tracing::debug!(worker = id, "queue closed, worker exiting");
            break;
        };

        let Job {
            device,
            run,
            cancel,
            reply,
        } = job;

        let envelope = run_job(id, &device, run, &cancel, operation_timeout).await;
        if reply.send(envelope).is_err() {
            tracing::debug!(worker = id, device = %device, "requester gone before result");
        }
    }
}

async fn run_job(
    worker: usize,
    device: &str,
    run: JobFn,
    cancel: &CancellationToken,
    operation_timeout: Duration,
) -> ResultEnvelope {
    let mut work = AssertUnwindSafe(run(cancel.clone())).catch_unwind();

    let outcome = tokio::select! {
        outcome = &mut work => outcome,
        () = tokio::time::sleep(operation_timeout) => {
            tracing::warn!(
                worker,
                device,
                timeout_secs = operation_timeout.as_secs(),
                "operation deadline passed, cancelling"
            );
            cancel.cancel();
            work.await
        }
    };

    outcome.unwrap_or_else(|_| {
        tracing::error!(worker, device, "operation panicked");
        ResultEnvelope::error(device, DispatchError::WorkerLost)
    })
}
