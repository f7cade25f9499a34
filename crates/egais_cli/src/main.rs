//! EGAIS sync CLI
//!
//! Mirrors the `out` queue of an EGAIS transport module into a local
//! directory and deletes old entries from the `out` and `in` queues.
//!
//! # Stages
//!
//! - sync out - download `/opt/out` documents (`--get-xml`, on by default)
//! - prune out - delete `/opt/out` entries below `--max-id-out` (`--delete`)
//! - prune in - delete `/opt/in` entries below `--max-id-in` (`--delete`)

use clap::{ArgAction, Parser};
use egais_sync::{
    FileStore, ReqwestClient, RunReport, StageOutcome, SyncConfig, SyncEngine, DEFAULT_DEST_DIR,
    DEFAULT_SERVER_BASE,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Mirror and prune EGAIS transport module queues.
#[derive(Parser, Debug)]
#[command(name = "egais-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Destination directory for stored XML files
    #[arg(long, alias = "destdir", default_value = DEFAULT_DEST_DIR)]
    dest_dir: PathBuf,

    /// Get XML files for the out block
    #[arg(
        long,
        alias = "get_xml",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    get_xml: bool,

    /// Delete queries and replies
    #[arg(
        long,
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    delete: bool,

    /// Work with /opt/out
    #[arg(
        long,
        alias = "out_block",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    out_block: bool,

    /// Work with /opt/in
    #[arg(
        long,
        alias = "in_block",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    in_block: bool,

    /// Full server path of the transport module
    #[arg(long, alias = "server_name", default_value = DEFAULT_SERVER_BASE)]
    server_name: String,

    /// Out entries with a lower id are deleted
    #[arg(long, alias = "max_id_out", default_value_t = 0, allow_negative_numbers = true)]
    max_id_out: i64,

    /// In entries with a lower id are deleted
    #[arg(long, alias = "max_id_in", default_value_t = 0, allow_negative_numbers = true)]
    max_id_in: i64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> SyncConfig {
        SyncConfig::new(self.server_name.as_str(), self.dest_dir.as_path())
            .with_fetch(self.get_xml)
            .with_delete(self.delete)
            .with_out_block(self.out_block)
            .with_in_block(self.in_block)
            .with_max_id_out(self.max_id_out)
            .with_max_id_in(self.max_id_in)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "egais-sync v{} using {} -> {:?}",
        env!("CARGO_PKG_VERSION"),
        cli.server_name,
        cli.dest_dir
    );
    let engine = SyncEngine::new(cli.config(), ReqwestClient::new(), FileStore::new());
    let report = engine.run();
    print_summary(&report);

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summary(report: &RunReport) {
    if report.outcomes.is_empty() {
        println!("Nothing to do: every stage is disabled");
        return;
    }

    for outcome in &report.outcomes {
        match outcome {
            StageOutcome::Completed(stage) => {
                println!("✓ {}", stage);
                for skipped in &stage.skipped {
                    println!("  skipped {}: {}", skipped.remote_path, skipped.reason);
                }
            }
            StageOutcome::Aborted { stage, error } => {
                println!("✗ {}: {}", stage, error);
            }
        }
    }
}
