//! # EGAIS Sync
//!
//! Mirrors the document queues of an EGAIS transport module (UTM) into a
//! local directory and prunes old entries remotely.
//!
//! This crate provides:
//! - Path decomposition (`<name>/<id>` → sequence ID and local filename)
//! - List envelope decoding
//! - HTTP transport abstraction with a blocking `reqwest` implementation
//! - Local document store abstraction
//! - The sync engine: mirror the `out` block, prune `out` and `in`
//!
//! ## Run sequence
//!
//! A run is a fixed linear sequence, each stage switched by configuration:
//! 1. Mirror `/opt/out` into the destination directory
//! 2. Delete `/opt/out` entries below the `out` cutoff
//! 3. Delete `/opt/in` entries below the `in` cutoff
//!
//! ## Failure handling
//!
//! - A failing entry (download, write, delete, malformed path) is logged and
//!   skipped
//! - A failing list fetch aborts only its own stage
//! - The run report lists every skipped entry and aborted stage
//!
//! ## Example
//!
//! ```rust
//! use egais_sync::{InMemoryStore, MockHttpClient, SyncConfig, SyncEngine};
//!
//! let http = MockHttpClient::new();
//! http.set_response(
//!     "http://utm:8080/opt/out",
//!     "<A><url>http://utm:8080/opt/out/Ticket/7</url></A>",
//! );
//! http.set_response("http://utm:8080/opt/out/Ticket/7", "<Ticket/>");
//! let store = InMemoryStore::new();
//!
//! let engine = SyncEngine::new(SyncConfig::new("http://utm:8080", "egais_data"), &http, &store);
//! let report = engine.run();
//! assert!(report.is_success());
//! assert!(store.file("egais_data/Ticket_7.xml".as_ref()).is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod envelope;
mod error;
mod http;
mod path;
mod store;
mod transport;

pub use config::{Block, SyncConfig, DEFAULT_DEST_DIR, DEFAULT_SERVER_BASE};
pub use engine::{RunReport, SkippedEntry, Stage, StageOutcome, StageReport, SyncEngine};
pub use envelope::{decode_envelope, Entry, EntryList};
pub use error::{SyncError, SyncResult};
pub use http::{LedgerClient, ReqwestClient};
pub use path::{decompose_path, trim_trailing_separator, DecomposedPath, DOCUMENT_EXTENSION};
pub use store::{write_document, DocumentStore, FileStore, InMemoryStore};
pub use transport::{HttpClient, MockHttpClient};
