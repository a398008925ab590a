//! Import pipeline — replay a document stream with bounded retry.
//!
//! Documents are indexed strictly sequentially, in input order. A write
//! failure puts the run into backoff and retries forward from the failing
//! position; retries never reorder and never re-index earlier positions.

use std::time::Duration;

use esferry_client::{ClientError, EsClient};
use esferry_core::progress::{ProgressContext, fmt_count};
use esferry_core::shutdown::{interruptible_sleep, is_shutdown_requested};
use esferry_core::ticker::ProgressTicker;

use crate::error::TransferError;

/// Seam over the single-document write, so the retry machine can be driven
/// without a live endpoint.
pub trait DocumentWriter {
    fn write_document(&mut self, document: &str) -> Result<(), ClientError>;
}

/// Writes documents into one index/type through a connected client.
pub struct IndexWriter<'a> {
    client: &'a EsClient,
    index: String,
    doctype: String,
}

impl<'a> IndexWriter<'a> {
    pub fn new(client: &'a EsClient, index: &str, doctype: &str) -> Self {
        Self {
            client,
            index: index.to_string(),
            doctype: doctype.to_string(),
        }
    }
}

impl DocumentWriter for IndexWriter<'_> {
    fn write_document(&mut self, document: &str) -> Result<(), ClientError> {
        self.client
            .index_document(&self.index, &self.doctype, document)
    }
}

/// Retry tuning for one import run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Backoff grows linearly: `backoff_unit × consecutive_failures`
    pub backoff_unit: Duration,
    /// Consecutive failures at one position before giving up
    pub max_consecutive_failures: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            backoff_unit: Duration::from_secs(5),
            max_consecutive_failures: 10,
        }
    }
}

/// How an import run ended (fatal errors are the `Err` side of the result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Every document was indexed.
    Completed { indexed: usize },
    /// Retry budget exhausted: documents from `resume_offset` on were never
    /// indexed.
    PartiallyCompleted { indexed: usize, resume_offset: usize },
}

/// Per-run retry state. Created at run start, discarded at run end.
#[derive(Debug, Default)]
struct RetryState {
    consecutive_failures: u32,
    resume_offset: usize,
    total_succeeded: usize,
}

enum RetryDecision {
    Backoff(Duration),
    GiveUp,
}

impl RetryState {
    fn record_success(&mut self) {
        self.resume_offset += 1;
        self.total_succeeded += 1;
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self, opts: &ImportOptions) -> RetryDecision {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= opts.max_consecutive_failures {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Backoff(self.consecutive_failures * opts.backoff_unit)
        }
    }
}

/// Replay `documents` through `writer` in order, with linear-backoff retry.
///
/// The ticker is checked non-blockingly after every success; a pending tick
/// produces one cumulative progress line. The shutdown flag is honored at
/// every document boundary and during backoff.
pub fn import_documents(
    writer: &mut impl DocumentWriter,
    documents: &[String],
    ticker: &ProgressTicker,
    opts: &ImportOptions,
    progress: &ProgressContext,
) -> Result<ImportOutcome, TransferError> {
    let total = documents.len();
    let mut state = RetryState::default();
    let pb = progress.transfer_bar("import", Some(total as u64));

    log::info!("importing {} documents", fmt_count(total));

    while state.resume_offset < total {
        if is_shutdown_requested() {
            pb.finish_and_clear();
            log::warn!(
                "import interrupted: {} of {} indexed, next unindexed offset {}",
                fmt_count(state.total_succeeded),
                fmt_count(total),
                state.resume_offset
            );
            return Err(TransferError::Interrupted);
        }

        match writer.write_document(&documents[state.resume_offset]) {
            Ok(()) => {
                state.record_success();
                pb.inc(1);
                if ticker.tick_pending() {
                    log::info!(
                        "indexed {} of {} documents",
                        fmt_count(state.total_succeeded),
                        fmt_count(total)
                    );
                }
            }
            Err(e) => {
                log::error!(
                    "failed to index document at offset {}: {e}",
                    state.resume_offset
                );
                match state.record_failure(opts) {
                    RetryDecision::GiveUp => {
                        pb.finish_and_clear();
                        log::error!(
                            "giving up after {} consecutive failures; documents {}..{} were never indexed",
                            state.consecutive_failures,
                            state.resume_offset,
                            total
                        );
                        return Ok(ImportOutcome::PartiallyCompleted {
                            indexed: state.total_succeeded,
                            resume_offset: state.resume_offset,
                        });
                    }
                    RetryDecision::Backoff(delay) => {
                        log::warn!(
                            "retry {}/{} in {:?}, resuming from offset {}",
                            state.consecutive_failures,
                            opts.max_consecutive_failures,
                            delay,
                            state.resume_offset
                        );
                        pb.set_message(format!(
                            "retry {}/{}...",
                            state.consecutive_failures, opts.max_consecutive_failures
                        ));
                        if !interruptible_sleep(delay) {
                            pb.finish_and_clear();
                            log::warn!(
                                "import interrupted during backoff, next unindexed offset {}",
                                state.resume_offset
                            );
                            return Err(TransferError::Interrupted);
                        }
                        pb.set_message("");
                    }
                }
            }
        }
    }

    pb.finish_and_clear();
    log::info!(
        "import complete: {} documents indexed",
        fmt_count(state.total_succeeded)
    );
    Ok(ImportOutcome::Completed {
        indexed: state.total_succeeded,
    })
}
