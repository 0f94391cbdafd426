//! Single-consumer operation queue and event dispatcher
//!
//! Foreign-thread callbacks (signalling notifications, media-engine
//! notifications) never run application logic where they fire. They wrap the
//! work in an [`Operation`] and push it onto an [`OperationQueue`]; a single
//! [`Dispatcher`] drains the queue in FIFO order and awaits each operation to
//! completion before starting the next. All conference state mutation and
//! every delegate invocation therefore happen on one cooperative execution
//! context.
//!
//! The queue is unbounded; back-pressure is deliberately not applied at this
//! layer (an offer storm that floods the queue is an overload condition the
//! signalling engine is expected to prevent).

use futures::future::BoxFuture;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::trace;

/// A deferred unit of work drained by the [`Dispatcher`]
pub type Operation = BoxFuture<'static, ()>;

/// Producer side of the dispatch queue
///
/// Cheap to clone; any thread may enqueue. Enqueueing never blocks.
#[derive(Clone)]
pub struct OperationQueue {
    tx: mpsc::UnboundedSender<Operation>,
}

/// Single consumer draining the dispatch queue in FIFO order
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Operation>,
}

/// Create a connected queue/dispatcher pair
pub fn channel() -> (OperationQueue, Dispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OperationQueue { tx }, Dispatcher { rx })
}

impl OperationQueue {
    /// Enqueue an operation for the dispatcher
    ///
    /// Returns `false` if the dispatcher has been dropped (the operation is
    /// discarded in that case).
    pub fn enqueue<F>(&self, op: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.send(Box::pin(op)).is_ok()
    }
}

impl Dispatcher {
    /// Process at most one queued operation
    ///
    /// Intended for hosts that pump the dispatcher from a per-frame or
    /// per-tick update: each call bounds the queue work done per tick.
    /// An operation that suspends on an asynchronous step suspends `tick`
    /// with it; the host thread is never blocked.
    ///
    /// Returns `true` if an operation was processed, `false` if the queue
    /// was empty.
    pub async fn tick(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(op) => {
                trace!("Running queued operation");
                op.await;
                true
            }
            Err(_) => false,
        }
    }

    /// Drain the queue continuously until every producer is dropped
    ///
    /// Suitable as a long-lived tokio task for hosts without their own tick
    /// loop. Operations still run strictly one at a time, in arrival order.
    pub async fn run(mut self) {
        while let Some(op) = self.rx.recv().await {
            trace!("Running queued operation");
            op.await;
        }
        trace!("Dispatcher terminated: all producers dropped");
    }
}
