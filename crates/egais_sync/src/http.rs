//! HTTP access to the transport module.
//!
//! [`LedgerClient`] knows the endpoint layout (`/opt/<block>` lists, document
//! URLs, deletes) and works over any [`HttpClient`]. [`ReqwestClient`] is the
//! blocking implementation used by the command-line tool.

use crate::config::Block;
use crate::envelope::{decode_envelope, EntryList};
use crate::error::{SyncError, SyncResult};
use crate::path::trim_trailing_separator;
use crate::transport::HttpClient;
use tracing::debug;

/// Client for the list, document and delete endpoints.
pub struct LedgerClient<C: HttpClient> {
    /// Base URL without trailing separator (e.g. "http://192.168.1.26:8080").
    base_url: String,
    /// HTTP client implementation.
    client: C,
}

impl<C: HttpClient> LedgerClient<C> {
    /// Creates a new ledger client.
    ///
    /// A single trailing `/` or `\` on `base_url` is dropped.
    pub fn new(base_url: &str, client: C) -> Self {
        Self {
            base_url: trim_trailing_separator(base_url).to_string(),
            client,
        }
    }

    /// Returns the normalised base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the list endpoint URL for `block`.
    pub fn list_url(&self, block: Block) -> String {
        format!("{}/opt/{}", self.base_url, block)
    }

    /// Retrieves and decodes the entry list of `block`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] if the list cannot be retrieved and
    /// [`SyncError::Decode`] if the envelope is malformed.
    pub fn fetch_list(&self, block: Block) -> SyncResult<EntryList> {
        let url = self.list_url(block);
        let body = self
            .client
            .get(&url)
            .map_err(|e| SyncError::transport(&url, e))?;

        let entries = decode_envelope(&body)?;
        debug!(%url, entries = entries.len(), "fetched entry list");
        Ok(entries)
    }

    /// Downloads the raw bytes of a document.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] on failure. There is no retry.
    pub fn fetch_document(&self, url: &str) -> SyncResult<Vec<u8>> {
        self.client
            .get(url)
            .map_err(|e| SyncError::transport(url, e))
    }

    /// Deletes a remote entry.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] on failure.
    pub fn delete_entry(&self, url: &str) -> SyncResult<()> {
        self.client
            .delete(url)
            .map_err(|e| SyncError::transport(url, e))
    }
}

/// Blocking [`HttpClient`] backed by `reqwest`.
///
/// Non-2xx responses are reported as errors.
#[derive(Debug, Clone, Default)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with reqwest's default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a preconfigured blocking client.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string())
    }

    fn delete(&self, url: &str) -> Result<(), String> {
        self.client
            .delete(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
