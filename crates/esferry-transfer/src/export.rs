//! Export pipeline — drain an index into newline-delimited JSON

use std::io::Write;
use std::time::{Duration, Instant};

use esferry_client::{ClientError, Hit, Scroll};
use esferry_core::progress::{ProgressContext, fmt_count, upgrade_to_count_bar};
use esferry_core::shutdown::is_shutdown_requested;

use crate::error::TransferError;

/// Seam over the pagination cursor, so the pipeline can be driven without a
/// live endpoint.
pub trait PageSource {
    /// Next page of hits; `None` once the source is drained.
    fn next_page(&mut self) -> Result<Option<Vec<Hit>>, ClientError>;

    /// Total matching documents, when the server reported one.
    fn total_hits(&self) -> Option<u64> {
        None
    }
}

impl PageSource for Scroll<'_> {
    fn next_page(&mut self) -> Result<Option<Vec<Hit>>, ClientError> {
        Scroll::next_page(self)
    }

    fn total_hits(&self) -> Option<u64> {
        Scroll::total_hits(self)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    pub pages: usize,
    pub docs_written: usize,
    pub docs_skipped: usize,
    pub elapsed: Duration,
}

/// Drain `source` into `out`, one JSON line per document, in arrival order.
///
/// A document whose payload is missing or fails to serialize is skipped and
/// counted, never the rest of its page. Transport errors abort the run;
/// pages flushed before the abort stay in the output.
pub fn export_index(
    source: &mut impl PageSource,
    out: &mut impl Write,
    progress: &ProgressContext,
) -> Result<ExportStats, TransferError> {
    let start = Instant::now();
    let mut stats = ExportStats::default();
    let pb = progress.transfer_bar("export", None);
    let is_tty = progress.is_tty();

    loop {
        if is_shutdown_requested() {
            pb.finish_and_clear();
            log::warn!(
                "export interrupted after {} documents ({} pages)",
                fmt_count(stats.docs_written),
                stats.pages
            );
            return Err(TransferError::Interrupted);
        }

        let Some(page) = source.next_page()? else {
            break;
        };

        if stats.pages == 0 {
            if let Some(total) = source.total_hits() {
                upgrade_to_count_bar(&pb, total);
                log::info!("index reports {} matching documents", fmt_count(total as usize));
            }
        }
        stats.pages += 1;

        for hit in &page {
            let Some(payload) = &hit.source else {
                log::warn!(
                    "document {} has no source payload, skipping",
                    hit.id.as_deref().unwrap_or("<unknown>")
                );
                stats.docs_skipped += 1;
                continue;
            };
            let line = match serde_json::to_string(payload) {
                Ok(line) => line,
                Err(e) => {
                    log::warn!(
                        "document {} failed to serialize, skipping: {e}",
                        hit.id.as_deref().unwrap_or("<unknown>")
                    );
                    stats.docs_skipped += 1;
                    continue;
                }
            };
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            stats.docs_written += 1;
            pb.inc(1);
        }

        // Completed pages survive a later abort
        out.flush()?;
        if !is_tty {
            log::info!(
                "exported {} documents ({} pages)",
                fmt_count(stats.docs_written),
                stats.pages
            );
        }
    }

    pb.finish_and_clear();
    stats.elapsed = start.elapsed();

    if stats.docs_skipped > 0 {
        log::warn!(
            "{} documents were skipped and are missing from the output",
            fmt_count(stats.docs_skipped)
        );
    }
    if let Some(total) = source.total_hits() {
        let fetched = stats.docs_written + stats.docs_skipped;
        if fetched as u64 != total {
            log::warn!(
                "index reported {} documents but {} were fetched (index mutated during export?)",
                fmt_count(total as usize),
                fmt_count(fetched)
            );
        }
    }
    log::info!(
        "export complete: {} documents in {:.1}s",
        fmt_count(stats.docs_written),
        stats.elapsed.as_secs_f64()
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Pages served from memory, with an optional error injected at a page index
    struct FakePages {
        pages: Vec<Vec<Hit>>,
        served: usize,
        total: Option<u64>,
        fail_at_page: Option<usize>,
    }

    impl FakePages {
        fn of_docs(docs: &[serde_json::Value], page_size: usize) -> Self {
            let pages = docs
                .chunks(page_size.max(1))
                .map(|chunk| {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(i, v)| Hit {
                            id: Some(format!("{i}")),
                            source: Some(v.clone()),
                        })
                        .collect()
                })
                .collect();
            Self {
                pages,
                served: 0,
                total: Some(docs.len() as u64),
                fail_at_page: None,
            }
        }
    }

    impl PageSource for FakePages {
        fn next_page(&mut self) -> Result<Option<Vec<Hit>>, ClientError> {
            if self.fail_at_page == Some(self.served) {
                return Err(ClientError::Http {
                    status: Some(500),
                    message: "search failed".to_string(),
                });
            }
            let page = self.pages.get(self.served).cloned();
            self.served += 1;
            Ok(page)
        }

        fn total_hits(&self) -> Option<u64> {
            self.total
        }
    }

    fn docs(n: usize) -> Vec<serde_json::Value> {
        (0..n).map(|i| json!({ "seq": i })).collect()
    }

    fn export_to_string(source: &mut impl PageSource) -> (String, ExportStats) {
        let progress = ProgressContext::default();
        let mut buf = Vec::new();
        let stats = export_index(source, &mut buf, &progress).unwrap();
        (String::from_utf8(buf).unwrap(), stats)
    }

    #[test]
    fn line_count_independent_of_page_size() {
        let all = docs(17);
        for page_size in [1, 3, 5, 17, 100] {
            let mut source = FakePages::of_docs(&all, page_size);
            let (text, stats) = export_to_string(&mut source);
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 17, "page_size={page_size}");
            assert_eq!(stats.docs_written, 17);
            assert_eq!(stats.docs_skipped, 0);
        }
    }

    #[test]
    fn preserves_server_order() {
        let all = docs(10);
        let mut source = FakePages::of_docs(&all, 4);
        let (text, _) = export_to_string(&mut source);
        for (i, line) in text.lines().enumerate() {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(v["seq"], i);
        }
    }

    #[test]
    fn rerun_is_byte_identical() {
        let all = docs(9);
        let (first, _) = export_to_string(&mut FakePages::of_docs(&all, 4));
        let (second, _) = export_to_string(&mut FakePages::of_docs(&all, 4));
        assert_eq!(first, second);

        // ...and for a different page size as well
        let (third, _) = export_to_string(&mut FakePages::of_docs(&all, 2));
        assert_eq!(first, third);
    }

    #[test]
    fn missing_payload_skips_document_not_page() {
        let mut source = FakePages::of_docs(&docs(3), 3);
        // Knock out the middle document's payload
        source.pages[0][1].source = None;

        let (text, stats) = export_to_string(&mut source);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(stats.docs_written, 2);
        assert_eq!(stats.docs_skipped, 1);
        // The document after the bad one still made it out
        assert!(lines[1].contains("\"seq\":2"));
    }

    #[test]
    fn transport_error_aborts_but_keeps_earlier_pages() {
        let mut source = FakePages::of_docs(&docs(8), 4);
        source.fail_at_page = Some(1);

        let progress = ProgressContext::default();
        let mut buf = Vec::new();
        let err = export_index(&mut source, &mut buf, &progress).unwrap_err();
        assert!(matches!(err, TransferError::Client(_)));

        // First page was flushed before the failure
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn empty_index_writes_nothing() {
        let mut source = FakePages::of_docs(&[], 10);
        let (text, stats) = export_to_string(&mut source);
        assert!(text.is_empty());
        assert_eq!(stats.docs_written, 0);
        assert_eq!(stats.pages, 0);
    }
}
