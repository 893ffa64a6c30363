//! Bounded fan-in channel from dispatched units to the batch writer
//!
//! Thin wrappers over `tokio::sync::mpsc` bounded channels. A full funnel
//! makes producers wait instead of buffering without bound, and a waiting
//! send gives up as soon as the run is cancelled.
//!
//! The funnel closes once every `FunnelSender` clone has been dropped. The
//! dispatcher holds the original sender and only drops it after joining all
//! units, so no record that was accepted by `send` can be lost.

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio_util::sync::CancellationToken;

use super::scrape_types::{ScrapeError, ScrapeResult};

/// Create a funnel holding at most `capacity` in-flight items
///
/// A capacity of 0 is raised to 1.
#[must_use]
pub fn result_funnel<T>(capacity: usize) -> (FunnelSender<T>, FunnelReceiver<T>) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    (FunnelSender { tx }, FunnelReceiver { rx, capacity })
}

/// Producer side; clone one per dispatched unit
#[derive(Debug)]
pub struct FunnelSender<T> {
    tx: Sender<T>,
}

impl<T> Clone for FunnelSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> FunnelSender<T> {
    /// Hand `value` to the consumer, waiting for room if the funnel is full
    ///
    /// # Errors
    /// `ScrapeError::Cancelled` if `cancel` fires first (an already-fired
    /// token wins even when there is room), `ScrapeError::Sink` if the
    /// consumer has gone away.
    pub async fn send(&self, value: T, cancel: &CancellationToken) -> ScrapeResult<()> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ScrapeError::Cancelled),
            result = self.tx.send(value) => result.map_err(|_| {
                ScrapeError::Sink("result funnel consumer has shut down".to_string())
            }),
        }
    }

    /// Number of items currently buffered
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the producer side held by this handle
    ///
    /// Consuming `self` makes the intent explicit at the call site; the
    /// funnel itself closes when the last clone is gone.
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer side; exactly one exists per funnel
#[derive(Debug)]
pub struct FunnelReceiver<T> {
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> FunnelReceiver<T> {
    /// Next item, or `None` once the funnel is closed and drained
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Blocking variant for a consumer running on a dedicated thread
    ///
    /// # Panics
    /// Panics if called from within an async execution context.
    pub fn blocking_recv(&mut self) -> Option<T> {
        self.rx.blocking_recv()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
