//! Shared asynchronous error sink. Ingestion errors must not stall the
//! decode path, so pumps hand errors to this bus and move on; a single
//! drain task applies the sink function in FIFO order.

use chainlens_types::error::ListenerError;
use tokio::sync::{mpsc, watch};

/// Bounded buffer between producers and the drain task.
pub const ERROR_BUFFER: usize = 10;

/// A cloneable handle to the error bus. Dropping every handle, or
/// cancelling the owning scope, stops the drain.
#[derive(Clone)]
pub struct ErrorBus {
    tx: mpsc::Sender<ListenerError>,
}

impl ErrorBus {
    /// Spawns the drain task bound to `shutdown` and returns the sending
    /// handle. The sink runs on the drain task, one error at a time.
    pub fn new<F>(mut shutdown: watch::Receiver<bool>, mut sink: F) -> Self
    where
        F: FnMut(ListenerError) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(ERROR_BUFFER);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    maybe = rx.recv() => match maybe {
                        Some(err) => sink(err),
                        None => break,
                    },
                }
            }
        });
        Self { tx }
    }

    /// Queues an error for the sink, blocking only while the buffer is
    /// full. Once the owning scope is cancelled the sink is gone; the
    /// error is then dropped with a metric instead of deadlocking the
    /// caller.
    pub async fn send(&self, err: impl Into<ListenerError>) {
        let err = err.into();
        if let Err(undelivered) = self.tx.send(err).await {
            chainlens_telemetry::ingest_metrics().inc_bus_dropped();
            tracing::warn!(error = %undelivered.0, "error bus closed, dropping error");
        }
    }
}
