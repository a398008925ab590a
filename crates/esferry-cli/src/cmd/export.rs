//! Export subcommand - drain an index into a newline-delimited JSON file

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use esferry_client::EsClient;
use esferry_core::{SharedProgress, fmt_count};
use esferry_transfer::{TransferError, create_output, export_index};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Endpoint URL, e.g. http://localhost:9200
    #[arg(long)]
    pub url: Option<String>,

    /// Basic auth user name (required when X-Pack security is enabled)
    #[arg(long)]
    pub user: Option<String>,

    /// Basic auth password
    #[arg(long)]
    pub password: Option<String>,

    /// Index to export
    #[arg(short, long)]
    pub index: String,

    /// Scroll page size
    #[arg(short, long)]
    pub size: Option<usize>,

    /// Output file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(
    args: ExportArgs,
    config: &Config,
    progress: &SharedProgress,
    debug: bool,
) -> Result<ExitCode> {
    let conn = config.connection(args.url, args.user, args.password, debug)?;
    let page_size = args.size.unwrap_or(config.transfer.page_size);
    let out_path = args.out.unwrap_or_else(|| config.transfer.output.clone());

    log::info!(
        "exporting index {} from {} (page size {page_size})",
        args.index,
        conn.url
    );

    let client = EsClient::connect(&conn).context("cannot connect to the endpoint")?;
    let mut out = create_output(&out_path)
        .with_context(|| format!("cannot open output file {}", out_path.display()))?;
    let mut scroll = client.open_scroll(&args.index, page_size);

    let stats = match export_index(&mut scroll, &mut out, progress) {
        Ok(stats) => stats,
        Err(TransferError::Interrupted) => return Ok(ExitCode::from(130)),
        Err(e) => return Err(e).context("export failed"),
    };

    crate::cmd::print_summary(
        "Export",
        &[
            ("Documents", fmt_count(stats.docs_written)),
            ("Skipped", fmt_count(stats.docs_skipped)),
            ("Pages", stats.pages.to_string()),
            ("Output", out_path.display().to_string()),
            ("Time", format!("{:.1}s", stats.elapsed.as_secs_f64())),
        ],
    );

    Ok(ExitCode::SUCCESS)
}
