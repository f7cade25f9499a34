//! Sync orchestrator and pruner.

use crate::config::{Block, SyncConfig};
use crate::envelope::Entry;
use crate::error::{SyncError, SyncResult};
use crate::http::LedgerClient;
use crate::path::decompose_path;
use crate::store::{write_document, DocumentStore};
use crate::transport::HttpClient;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mirror the `out` block into the destination directory.
    SyncOut,
    /// Delete remote entries of a block below its cutoff.
    Prune(Block),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::SyncOut => f.write_str("sync out"),
            Stage::Prune(block) => write!(f, "prune {block}"),
        }
    }
}

/// An entry that was skipped because of a per-entry failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Remote path of the entry.
    pub remote_path: String,
    /// Why the entry was skipped.
    pub reason: String,
}

/// Outcome of a stage that ran to the end of its entry list.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// The stage.
    pub stage: Stage,
    /// Number of entries returned by the list endpoint.
    pub listed: usize,
    /// Documents written to the destination directory.
    pub stored: usize,
    /// Extra copies written under reply directories.
    pub reply_copies: usize,
    /// Remote entries deleted.
    pub deleted: usize,
    /// Entries at or above the cutoff.
    pub retained: usize,
    /// Entries skipped after a failure.
    pub skipped: Vec<SkippedEntry>,
    /// Duration of the stage.
    pub duration: Duration,
}

impl StageReport {
    fn new(stage: Stage, listed: usize) -> Self {
        Self {
            stage,
            listed,
            stored: 0,
            reply_copies: 0,
            deleted: 0,
            retained: 0,
            skipped: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    fn skip(&mut self, entry: &Entry, err: &SyncError) {
        warn!(stage = %self.stage, path = %entry.remote_path, "skipping entry: {}", err);
        self.skipped.push(SkippedEntry {
            remote_path: entry.remote_path.clone(),
            reason: err.to_string(),
        });
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} listed", self.stage, self.listed)?;
        match self.stage {
            Stage::SyncOut => write!(
                f,
                ", {} stored, {} reply copies",
                self.stored, self.reply_copies
            )?,
            Stage::Prune(_) => write!(f, ", {} deleted, {} retained", self.deleted, self.retained)?,
        }
        write!(f, ", {} skipped", self.skipped.len())
    }
}

/// Result of one stage of a run.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage processed its whole entry list.
    Completed(StageReport),
    /// The stage could not start processing entries.
    Aborted {
        /// The stage.
        stage: Stage,
        /// The stage-level failure.
        error: SyncError,
    },
}

impl StageOutcome {
    /// Returns the stage this outcome belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            StageOutcome::Completed(report) => report.stage,
            StageOutcome::Aborted { stage, .. } => *stage,
        }
    }
}

/// Result of a full run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Outcomes of the executed stages, in execution order.
    pub outcomes: Vec<StageOutcome>,
}

impl RunReport {
    /// Returns true if every executed stage completed.
    ///
    /// Skipped entries do not make a run unsuccessful.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o, StageOutcome::Completed(_)))
    }

    /// Returns the total number of skipped entries.
    pub fn skipped_count(&self) -> usize {
        self.completed().map(|r| r.skipped.len()).sum()
    }

    /// Returns the reports of completed stages.
    pub fn completed(&self) -> impl Iterator<Item = &StageReport> {
        self.outcomes.iter().filter_map(|o| match o {
            StageOutcome::Completed(report) => Some(report),
            StageOutcome::Aborted { .. } => None,
        })
    }

    fn record(&mut self, stage: Stage, result: SyncResult<StageReport>) {
        let outcome = match result {
            Ok(report) => {
                info!("{}", report);
                StageOutcome::Completed(report)
            }
            Err(error) => {
                error!(%stage, "stage aborted: {}", error);
                StageOutcome::Aborted { stage, error }
            }
        };
        self.outcomes.push(outcome);
    }
}

/// Runs mirror and prune stages against a transport module.
///
/// The engine is single-threaded: every request and write blocks until it
/// finishes, and entries are processed in list order.
pub struct SyncEngine<C: HttpClient, S: DocumentStore> {
    config: SyncConfig,
    client: LedgerClient<C>,
    store: S,
}

impl<C: HttpClient, S: DocumentStore> SyncEngine<C, S> {
    /// Creates a new engine.
    pub fn new(config: SyncConfig, http: C, store: S) -> Self {
        let client = LedgerClient::new(&config.server_base, http);
        Self {
            config,
            client,
            store,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs the configured stages: sync out, prune out, prune in.
    ///
    /// A stage that aborts is recorded and the next stage still runs.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        if self.config.should_sync_out() {
            report.record(Stage::SyncOut, self.sync_out());
        }
        for block in [Block::Out, Block::In] {
            if self.config.should_prune(block) {
                report.record(Stage::Prune(block), self.prune(block));
            }
        }

        info!(
            stages = report.outcomes.len(),
            skipped = report.skipped_count(),
            success = report.is_success(),
            "run finished"
        );
        report
    }

    /// Mirrors the `out` block into the destination directory.
    ///
    /// Every entry is stored as `<dest>/<name>_<id>.xml`; entries with a reply
    /// identifier are also stored as `<dest>/<reply id>/<name>_<id>.xml`.
    ///
    /// # Errors
    ///
    /// Fails only if the list cannot be fetched or the destination directory
    /// cannot be created. Per-entry failures are recorded in the report.
    pub fn sync_out(&self) -> SyncResult<StageReport> {
        let start = Instant::now();
        let entries = self.client.fetch_list(Block::Out)?;
        info!("Syncing {} entries into {:?}", entries.len(), self.config.dest_dir);

        self.store.create_dir_all(&self.config.dest_dir)?;

        let mut report = StageReport::new(Stage::SyncOut, entries.len());
        for entry in &entries {
            if let Err(e) = self.sync_entry(entry, &mut report) {
                report.skip(entry, &e);
            }
        }

        report.duration = start.elapsed();
        Ok(report)
    }

    fn sync_entry(&self, entry: &Entry, report: &mut StageReport) -> SyncResult<()> {
        let decomposed = decompose_path(&entry.remote_path)?;
        let reply_id = entry.reply_id.as_deref().map(validate_reply_id).transpose()?;

        let bytes = self.client.fetch_document(&entry.remote_path)?;

        let dest_dir = &self.config.dest_dir;
        let written = write_document(&self.store, dest_dir, &decomposed.filename, &bytes)?;
        debug!(path = %written.display(), bytes = bytes.len(), "stored document");
        report.stored += 1;

        if let Some(reply_id) = reply_id {
            let reply_dir = dest_dir.join(reply_id);
            let written = write_document(&self.store, &reply_dir, &decomposed.filename, &bytes)?;
            debug!(path = %written.display(), "stored reply copy");
            report.reply_copies += 1;
        }

        Ok(())
    }

    /// Deletes remote entries of `block` whose sequence ID is strictly below
    /// the configured cutoff.
    ///
    /// # Errors
    ///
    /// Fails only if the list cannot be fetched. Malformed paths and failed
    /// deletes are recorded in the report.
    pub fn prune(&self, block: Block) -> SyncResult<StageReport> {
        let start = Instant::now();
        let cutoff = self.config.cutoff(block);
        info!("Path: {}", self.client.list_url(block));

        let entries = self.client.fetch_list(block)?;
        let mut report = StageReport::new(Stage::Prune(block), entries.len());

        for entry in &entries {
            let sequence_id = match decompose_path(&entry.remote_path) {
                Ok(decomposed) => decomposed.sequence_id,
                Err(e) => {
                    report.skip(entry, &e);
                    continue;
                }
            };

            if sequence_id >= cutoff {
                report.retained += 1;
                continue;
            }

            match self.client.delete_entry(&entry.remote_path) {
                Ok(()) => {
                    debug!(path = %entry.remote_path, sequence_id, cutoff, "deleted entry");
                    report.deleted += 1;
                }
                Err(e) => report.skip(entry, &e),
            }
        }

        report.duration = start.elapsed();
        Ok(report)
    }
}

/// Checks that a reply identifier is usable as a single directory name.
fn validate_reply_id(reply_id: &str) -> SyncResult<&str> {
    let mut components = Path::new(reply_id).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    );

    if single_normal && !reply_id.contains(['/', '\\']) {
        Ok(reply_id)
    } else {
        Err(SyncError::InvalidReplyId {
            reply_id: reply_id.to_string(),
        })
    }
}
