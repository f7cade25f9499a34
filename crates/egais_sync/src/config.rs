//! Configuration for mirror and prune runs.

use std::fmt;
use std::path::PathBuf;

/// Default local directory for mirrored documents.
pub const DEFAULT_DEST_DIR: &str = "egais_data";

/// Default address of the transport module.
pub const DEFAULT_SERVER_BASE: &str = "http://192.168.1.26:8080";

/// One of the two remote document queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Outgoing documents awaiting acknowledgment (`/opt/out`).
    Out,
    /// Incoming documents (`/opt/in`).
    In,
}

impl Block {
    /// Returns the path segment used by the list endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Block::Out => "out",
            Block::In => "in",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single run.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Base URL of the transport module.
    pub server_base: String,
    /// Directory that receives mirrored documents.
    pub dest_dir: PathBuf,
    /// Work with the `out` block.
    pub out_block_enabled: bool,
    /// Work with the `in` block.
    pub in_block_enabled: bool,
    /// Download documents of the `out` block.
    pub fetch_enabled: bool,
    /// Delete remote entries below the cutoffs.
    pub delete_enabled: bool,
    /// Cutoff for the `out` block; IDs strictly below it are deleted.
    pub max_id_out: i64,
    /// Cutoff for the `in` block; IDs strictly below it are deleted.
    pub max_id_in: i64,
}

impl SyncConfig {
    /// Creates a configuration with default flags and cutoffs.
    pub fn new(server_base: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_base: server_base.into(),
            dest_dir: dest_dir.into(),
            out_block_enabled: true,
            in_block_enabled: true,
            fetch_enabled: true,
            delete_enabled: false,
            max_id_out: 0,
            max_id_in: 0,
        }
    }

    /// Enables or disables the `out` block.
    pub fn with_out_block(mut self, enabled: bool) -> Self {
        self.out_block_enabled = enabled;
        self
    }

    /// Enables or disables the `in` block.
    pub fn with_in_block(mut self, enabled: bool) -> Self {
        self.in_block_enabled = enabled;
        self
    }

    /// Enables or disables document download.
    pub fn with_fetch(mut self, enabled: bool) -> Self {
        self.fetch_enabled = enabled;
        self
    }

    /// Enables or disables remote deletion.
    pub fn with_delete(mut self, enabled: bool) -> Self {
        self.delete_enabled = enabled;
        self
    }

    /// Sets the cutoff for the `out` block.
    pub fn with_max_id_out(mut self, max_id: i64) -> Self {
        self.max_id_out = max_id;
        self
    }

    /// Sets the cutoff for the `in` block.
    pub fn with_max_id_in(mut self, max_id: i64) -> Self {
        self.max_id_in = max_id;
        self
    }

    /// Returns the deletion cutoff for `block`.
    pub fn cutoff(&self, block: Block) -> i64 {
        match block {
            Block::Out => self.max_id_out,
            Block::In => self.max_id_in,
        }
    }

    /// Returns true if the `out` block should be mirrored locally.
    pub fn should_sync_out(&self) -> bool {
        self.out_block_enabled && self.fetch_enabled
    }

    /// Returns true if `block` should be pruned remotely.
    pub fn should_prune(&self, block: Block) -> bool {
        let block_enabled = match block {
            Block::Out => self.out_block_enabled,
            Block::In => self.in_block_enabled,
        };
        block_enabled && self.delete_enabled
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_BASE, DEFAULT_DEST_DIR)
    }
}
