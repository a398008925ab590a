//! Wall-clock-aligned progress ticker.
//!
//! Produces one tick at each wall-clock boundary aligned to the interval
//! (for 30s: at :00 and :30 of every minute, not merely every 30s from start).
//! Ticks land in a depth-1 slot: when the consumer has not drained the
//! previous tick, the new one is dropped rather than queued. The consumer
//! side never blocks.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

/// Background ticker whose lifetime is bound to its owner.
///
/// Dropping the ticker signals the thread and joins it, so no tick is
/// produced after the owning run returns.
pub struct ProgressTicker {
    ticks: Receiver<()>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressTicker {
    /// Spawn the ticker thread for the given interval.
    pub fn start(interval: Duration) -> Self {
        let (tick_tx, tick_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("progress-ticker".into())
            .spawn(move || tick_loop(interval, tick_tx, stop_rx))
            .expect("failed to spawn progress ticker");

        Self {
            ticks: tick_rx,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Non-blocking check; consumes the pending tick if one is queued.
    pub fn tick_pending(&self) -> bool {
        self.ticks.try_recv().is_ok()
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the thread out of its wait.
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn tick_loop(interval: Duration, ticks: SyncSender<()>, stop: Receiver<()>) {
    loop {
        let wait = time_until_boundary(SystemTime::now(), interval);
        match stop.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => match ticks.try_send(()) {
                // Slot full: consumer is behind, drop this tick
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => return,
            },
        }
    }
}

/// Time remaining until the next wall-clock boundary aligned to `interval`.
///
/// A `now` exactly on a boundary waits a full interval for the next one.
pub fn time_until_boundary(now: SystemTime, interval: Duration) -> Duration {
    let since_epoch = now
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let interval_ns = interval.as_nanos().max(1);
    let gap = interval_ns - since_epoch.as_nanos() % interval_ns;
    Duration::from_nanos(gap as u64)
}
