//! Import subcommand - replay a newline-delimited JSON file into an index

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use esferry_client::EsClient;
use esferry_core::{ProgressTicker, SharedProgress, fmt_count};
use esferry_transfer::{
    ImportOutcome, IndexWriter, TransferError, import_documents, read_documents,
};

use crate::config::Config;

/// Progress is reported at each wall-clock boundary of this interval
const PROGRESS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Endpoint URL, e.g. http://localhost:9200
    #[arg(long)]
    pub url: Option<String>,

    /// Basic auth user name (required when X-Pack security is enabled)
    #[arg(long)]
    pub user: Option<String>,

    /// Basic auth password
    #[arg(long)]
    pub password: Option<String>,

    /// Index to import into
    #[arg(short, long)]
    pub index: String,

    /// Document type written on import
    #[arg(short = 't', long)]
    pub doc_type: Option<String>,

    /// Input file
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn run(
    args: ImportArgs,
    config: &Config,
    progress: &SharedProgress,
    debug: bool,
) -> Result<ExitCode> {
    let conn = config.connection(args.url, args.user, args.password, debug)?;
    let doctype = args
        .doc_type
        .unwrap_or_else(|| config.import.doc_type.clone());
    let input_path = args.input.unwrap_or_else(|| config.transfer.output.clone());

    let client = EsClient::connect(&conn).context("cannot connect to the endpoint")?;

    let documents = read_documents(&input_path)
        .with_context(|| format!("cannot read input file {}", input_path.display()))?;
    log::info!(
        "importing {} documents from {} into {}/{doctype}",
        fmt_count(documents.len()),
        input_path.display(),
        args.index
    );
    let mut writer = IndexWriter::new(&client, &args.index, &doctype);
    let ticker = ProgressTicker::start(PROGRESS_INTERVAL);

    let outcome = match import_documents(
        &mut writer,
        &documents,
        &ticker,
        &config.import_options(),
        progress,
    ) {
        Ok(outcome) => outcome,
        Err(TransferError::Interrupted) => return Ok(ExitCode::from(130)),
        Err(e) => return Err(e).context("import failed"),
    };

    match outcome {
        ImportOutcome::Completed { indexed } => {
            crate::cmd::print_summary(
                "Import",
                &[
                    ("Documents", fmt_count(indexed)),
                    ("Index", format!("{}/{doctype}", args.index)),
                    ("Input", input_path.display().to_string()),
                ],
            );
            Ok(ExitCode::SUCCESS)
        }
        ImportOutcome::PartiallyCompleted {
            indexed,
            resume_offset,
        } => {
            log::error!(
                "import incomplete: {} of {} documents indexed; lines {}..{} of {} were never indexed",
                fmt_count(indexed),
                fmt_count(documents.len()),
                resume_offset + 1,
                documents.len(),
                input_path.display()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
