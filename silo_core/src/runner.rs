//! Background scheduler for accrual ticks and persistence flushes.
//!
//! Spawns two threads over a shared `BinManager`: a tick thread that drives
//! elapsed-time accrual, and a flush thread that writes state through the
//! `BinStore` whenever the manager's version has moved since the last save.
//!
//! Safety: each `Scheduler` spawns exactly two threads that are shut down
//! and joined when the `Scheduler` is dropped, preventing thread leaks.

use crossbeam_channel as xch;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::manager::BinManager;
use crate::store::BinStore;

pub struct Scheduler {
    shutdown_tx: Option<xch::Sender<()>>,
    tick_handle: Option<std::thread::JoinHandle<()>>,
    flush_handle: Option<std::thread::JoinHandle<()>>,
}

impl Scheduler {
    /// Start the tick and flush loops. Both observe one shutdown channel:
    /// dropping the `Scheduler` closes it and both loops exit at the next
    /// period boundary.
    pub fn spawn(
        manager: Arc<Mutex<BinManager>>,
        mut store: Box<dyn BinStore + Send>,
        tick_period: Duration,
        flush_period: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = xch::bounded::<()>(0);

        let tick_rx = shutdown_rx.clone();
        let tick_manager = Arc::clone(&manager);
        let tick_handle = std::thread::spawn(move || {
            loop {
                match tick_rx.recv_timeout(tick_period) {
                    Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => {
                        tracing::debug!("tick thread received shutdown signal");
                        break;
                    }
                    Err(xch::RecvTimeoutError::Timeout) => {}
                }
                match tick_manager.lock() {
                    Ok(mut mgr) => mgr.tick(),
                    Err(poisoned) => {
                        // A panicked mutator leaves state suspect; stop
                        // advancing it rather than compounding the damage.
                        tracing::error!("bin manager mutex poisoned, tick thread exiting");
                        drop(poisoned);
                        break;
                    }
                }
            }
            tracing::trace!("tick thread exiting cleanly");
        });

        let flush_rx = shutdown_rx;
        let flush_handle = std::thread::spawn(move || {
            let mut saved_version: u64 = 0;
            loop {
                let stop = match flush_rx.recv_timeout(flush_period) {
                    Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => {
                        tracing::debug!("flush thread received shutdown signal");
                        true
                    }
                    Err(xch::RecvTimeoutError::Timeout) => false,
                };

                // Final flush on shutdown, dirty-checked like any other.
                let snapshot = match manager.lock() {
                    Ok(mgr) => {
                        let version = mgr.version();
                        if version == saved_version {
                            None
                        } else {
                            Some((version, mgr.bins().to_vec(), *mgr.settings()))
                        }
                    }
                    Err(_) => {
                        tracing::error!("bin manager mutex poisoned, flush thread exiting");
                        break;
                    }
                };

                if let Some((version, bins, settings)) = snapshot {
                    // Save failures never stop the engine; unsaved state is
                    // retried on the next flush.
                    match store
                        .save_bins(&bins)
                        .and_then(|()| store.save_settings(&settings))
                    {
                        Ok(()) => {
                            saved_version = version;
                            tracing::trace!(version, "state flushed");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "state flush failed, will retry");
                        }
                    }
                }

                if stop {
                    break;
                }
            }
            tracing::trace!("flush thread exiting cleanly");
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            tick_handle: Some(tick_handle),
            flush_handle: Some(flush_handle),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Waking both receivers needs the sender gone, not a message: a
        // zero-capacity send would block until someone happened to listen.
        drop(self.shutdown_tx.take());

        for handle in [self.tick_handle.take(), self.flush_handle.take()]
            .into_iter()
            .flatten()
        {
            match handle.join() {
                Ok(()) => tracing::trace!("scheduler thread joined successfully"),
                Err(e) => tracing::warn!(?e, "scheduler thread panicked during shutdown"),
            }
        }
    }
}
