//! Common infrastructure for the esferry transfer pipelines
//!
//! Logging, TTY-aware progress display, the wall-clock-aligned progress
//! ticker, and graceful shutdown support shared by both pipelines.

pub mod logging;
pub mod progress;
pub mod shutdown;
pub mod ticker;

// Re-exports for convenience
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_count, upgrade_to_count_bar};
pub use shutdown::{
    install_signal_handlers, interruptible_sleep, is_shutdown_requested, request_shutdown,
};
pub use ticker::ProgressTicker;
