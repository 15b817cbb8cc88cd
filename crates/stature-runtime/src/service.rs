//! Observer service - one task owns the observer and its stores
//!
//! Every sensor event goes through a channel to a single blocking task, so
//! the store files have exactly one writer no matter how many producers hold
//! a handle.

use std::sync::Arc;

use parking_lot::RwLock;
use stature_core::{StatureError, StatureResult};
use stature_identity::RecordStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{Observer, ObserverOutput, RuntimeStats, SensorEvent};

enum Command {
    Event(SensorEvent),
    Shutdown,
}

/// Output receiver channel
pub type OutputReceiver = mpsc::Receiver<ObserverOutput>;

/// Cloneable producer side of the service
#[derive(Clone)]
pub struct ObserverHandle {
    tx: mpsc::Sender<Command>,
    stats: Arc<RwLock<RuntimeStats>>,
}

impl ObserverHandle {
    /// Send a sensor event, waiting for channel space
    pub async fn send(&self, event: SensorEvent) -> StatureResult<()> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| StatureError::ServiceClosed)
    }

    /// Send without waiting. A full channel drops the event and returns false.
    pub fn try_send(&self, event: SensorEvent) -> StatureResult<bool> {
        match self.tx.try_send(Command::Event(event)) {
            Ok(()) => Ok(true),
            Err(mpsc::error::TrySendError::Full(_)) => Ok(false),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(StatureError::ServiceClosed),
        }
    }

    /// Ask the task to stop after the events already sent
    pub async fn shutdown(&self) -> StatureResult<()> {
        self.tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| StatureError::ServiceClosed)
    }

    /// Stats as of the last processed event
    pub fn stats(&self) -> RuntimeStats {
        self.stats.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawns the task that owns an observer
pub struct ObserverService;

impl ObserverService {
    /// Start the service. The join handle yields the observer back once every
    /// handle is dropped or `shutdown` is called.
    pub fn spawn<S>(
        mut observer: Observer<S>,
        channel_capacity: usize,
    ) -> (ObserverHandle, OutputReceiver, JoinHandle<Observer<S>>)
    where
        S: RecordStore + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel(channel_capacity.max(1));
        let (out_tx, out_rx) = mpsc::channel(channel_capacity.max(1));
        let stats = Arc::new(RwLock::new(RuntimeStats::default()));
        let shared = Arc::clone(&stats);

        // Store access is blocking file I/O, so the loop runs on the
        // blocking pool rather than an async worker.
        let task = tokio::task::spawn_blocking(move || {
            let mut consumer_gone = false;
            while let Some(command) = rx.blocking_recv() {
                let event = match command {
                    Command::Event(event) => event,
                    Command::Shutdown => break,
                };

                observer.queue(event);
                observer.tick();
                *shared.write() = observer.stats().clone();

                for output in observer.drain_outputs() {
                    if consumer_gone {
                        break;
                    }
                    if out_tx.blocking_send(output).is_err() {
                        debug!("output receiver dropped, discarding outputs");
                        consumer_gone = true;
                    }
                }
            }
            observer
        });

        (ObserverHandle { tx, stats }, out_rx, task)
    }
}
