//! Shared HTTP plumbing: async reqwest behind a sync facade

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Overall per-request timeout, so a stalled endpoint cannot block a
/// pipeline indefinitely
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

pub(crate) fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Run an async request to completion on the shared runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> F::Output {
    SHARED_RUNTIME.handle().block_on(fut)
}
