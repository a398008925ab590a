//! Graceful shutdown via atomic flag, set by SIGINT/SIGTERM

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

fn flag() -> &'static Arc<AtomicBool> {
    static FLAG: LazyLock<Arc<AtomicBool>> = LazyLock::new(|| Arc::new(AtomicBool::new(false)));
    &FLAG
}

/// Check if shutdown was requested
pub fn is_shutdown_requested() -> bool {
    flag().load(Ordering::Relaxed)
}

/// Request shutdown (signal handlers, tests of the CLI layer)
pub fn request_shutdown() {
    flag().store(true, Ordering::Relaxed);
}

/// Install SIGINT/SIGTERM handlers that set the shutdown flag.
pub fn install_signal_handlers() -> std::io::Result<()> {
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(flag()))?;
    }
    Ok(())
}

/// Sleep for `total`, waking early when shutdown is requested.
///
/// Returns `false` if the sleep was cut short by a shutdown request.
pub fn interruptible_sleep(total: Duration) -> bool {
    const SLICE: Duration = Duration::from_millis(100);

    let deadline = Instant::now() + total;
    loop {
        if is_shutdown_requested() {
            return false;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return true;
        }
        std::thread::sleep(left.min(SLICE));
    }
}
