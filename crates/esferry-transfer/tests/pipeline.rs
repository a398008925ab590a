//! End-to-end pipeline tests: export into a real file, read it back, import
//! it through the retry machine.

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use esferry_client::{ClientError, Hit};
use esferry_core::{ProgressContext, ProgressTicker};
use esferry_transfer::{
    DocumentWriter, ImportOptions, ImportOutcome, PageSource, create_output, export_index,
    import_documents, read_documents,
};

struct FakePages {
    pages: Vec<Vec<Hit>>,
    served: usize,
}

impl FakePages {
    fn of_docs(docs: &[serde_json::Value], page_size: usize) -> Self {
        let pages = docs
            .chunks(page_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|v| Hit {
                        id: None,
                        source: Some(v.clone()),
                    })
                    .collect()
            })
            .collect();
        Self { pages, served: 0 }
    }
}

impl PageSource for FakePages {
    fn next_page(&mut self) -> Result<Option<Vec<Hit>>, ClientError> {
        let page = self.pages.get(self.served).cloned();
        self.served += 1;
        Ok(page)
    }
}

#[derive(Default)]
struct FakeIndex {
    indexed: Vec<String>,
    failures_left: u32,
    fail_at_offset: usize,
}

impl DocumentWriter for FakeIndex {
    fn write_document(&mut self, document: &str) -> Result<(), ClientError> {
        if self.failures_left > 0 && self.indexed.len() == self.fail_at_offset {
            self.failures_left -= 1;
            return Err(ClientError::Http {
                status: Some(503),
                message: "temporarily rejected".to_string(),
            });
        }
        self.indexed.push(document.to_string());
        Ok(())
    }
}

fn fast_opts() -> ImportOptions {
    ImportOptions {
        backoff_unit: Duration::from_millis(1),
        max_consecutive_failures: 10,
    }
}

#[test]
fn export_file_import_round_trip() {
    let docs: Vec<serde_json::Value> = (0..13).map(|i| json!({ "seq": i, "tag": "t" })).collect();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.json");
    let progress = ProgressContext::default();

    // Export through a real file
    let mut out = create_output(&path).unwrap();
    let mut source = FakePages::of_docs(&docs, 5);
    let stats = export_index(&mut source, &mut out, &progress).unwrap();
    drop(out);
    assert_eq!(stats.docs_written, 13);
    assert_eq!(stats.pages, 3);

    // Read it back
    let lines = read_documents(&path).unwrap();
    assert_eq!(lines.len(), 13);

    // Replay into a fake index; a transient failure mid-stream must not
    // lose or duplicate anything
    let mut index = FakeIndex {
        failures_left: 1,
        fail_at_offset: 7,
        ..Default::default()
    };
    let ticker = ProgressTicker::start(Duration::from_secs(3600));
    let outcome = import_documents(&mut index, &lines, &ticker, &fast_opts(), &progress).unwrap();

    assert_eq!(outcome, ImportOutcome::Completed { indexed: 13 });
    assert_eq!(index.indexed, lines);
    for (i, line) in index.indexed.iter().enumerate() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["seq"], i);
    }
}

#[test]
fn exhausted_retries_name_the_unindexed_suffix() {
    let lines: Vec<String> = (0..6).map(|i| format!("{{\"n\":{i}}}")).collect();
    let mut index = FakeIndex {
        failures_left: u32::MAX,
        fail_at_offset: 4,
        ..Default::default()
    };
    let ticker = ProgressTicker::start(Duration::from_secs(3600));
    let progress = ProgressContext::default();

    let outcome = import_documents(&mut index, &lines, &ticker, &fast_opts(), &progress).unwrap();

    assert_eq!(
        outcome,
        ImportOutcome::PartiallyCompleted {
            indexed: 4,
            resume_offset: 4
        }
    );
    // Everything before the dead position made it in, in order
    assert_eq!(index.indexed.len(), 4);
}
