//! Transfer engine: bulk export and import between a search index and
//! newline-delimited JSON files.
//!
//! Export drains an index page by page through a pagination cursor; import
//! replays a document stream sequentially with bounded linear-backoff retry
//! and periodic progress reporting.

pub mod error;
pub mod export;
pub mod import;
pub mod source;

pub use error::TransferError;
pub use export::{ExportStats, PageSource, export_index};
pub use import::{
    DocumentWriter, ImportOptions, ImportOutcome, IndexWriter, import_documents,
};
pub use source::{create_output, read_documents};
