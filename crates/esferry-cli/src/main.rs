//! esferry - bulk transfer between an Elasticsearch index and
//! newline-delimited JSON files
//!
//! `export` drains an index into a file through a scroll cursor; `import`
//! replays a file into an index with bounded retry.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "esferry")]
#[command(about = "Bulk export/import between a search index and newline-delimited JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging, including request/response traces
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./esferry.toml or ~/.config/esferry/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Export an index into a newline-delimited JSON file
    Export(cmd::export::ExportArgs),
    /// Import a newline-delimited JSON file into an index
    Import(cmd::import::ImportArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(esferry_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — progress bars show activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    esferry_core::init_logging(quiet, cli.debug, multi);

    if let Err(e) = esferry_core::install_signal_handlers() {
        log::warn!("could not install signal handlers: {e}");
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Command::Export(args) => cmd::export::run(args, &config, &progress, cli.debug),
        Command::Import(args) => cmd::import::run(args, &config, &progress, cli.debug),
        Command::Config => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_config(config: &Config) {
    use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Setting").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec![
        "Endpoint URL",
        config.connection.url.as_deref().unwrap_or("not set"),
    ]);
    table.add_row(vec![
        "Username",
        config.connection.username.as_deref().unwrap_or("not set"),
    ]);
    table.add_row(vec![
        "Password",
        if config.connection.password.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec!["Page size", &config.transfer.page_size.to_string()]);
    table.add_row(vec![
        "Transfer file",
        &config.transfer.output.display().to_string(),
    ]);
    table.add_row(vec!["Document type", &config.import.doc_type]);
    table.add_row(vec![
        "Backoff unit",
        &format!("{}s", config.import.backoff_secs),
    ]);
    table.add_row(vec![
        "Max consecutive failures",
        &config.import.max_consecutive_failures.to_string(),
    ]);

    eprintln!("\n{table}");
}
