//! Newline-delimited JSON file access.
//!
//! The import side reads the whole file into memory before starting; fine
//! for the intended file sizes, a known limit for very large streams.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::Path;

/// Read every document line from `path`, in file order. Blank lines are
/// dropped; they carry no document and would otherwise be sent to the index
/// as empty bodies.
pub fn read_documents(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut documents = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        documents.push(line);
    }
    Ok(documents)
}

/// Open (create or truncate) the export output file.
///
/// Truncation keeps re-runs byte-identical; appending would accumulate
/// duplicates across runs.
pub fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
