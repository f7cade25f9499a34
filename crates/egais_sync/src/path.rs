//! Remote path decomposition.
//!
//! Every document URL handed out by the list endpoint ends in
//! `<name>/<sequence id>`, for example
//! `http://utm:8080/opt/out/ReplyNATTN/1523`. The sequence ID is the key used
//! for pruning, and together with the name it forms the local filename
//! (`ReplyNATTN_1523.xml`).

use crate::error::{SyncError, SyncResult};

/// Extension given to every mirrored document.
pub const DOCUMENT_EXTENSION: &str = "xml";

/// A remote path split into its sequence ID and local filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecomposedPath {
    /// Integer suffix of the remote path.
    pub sequence_id: i64,
    /// Local filename, `<name>_<id>.xml`.
    pub filename: String,
}

/// Strips a single trailing `/` or `\` from `s`.
pub fn trim_trailing_separator(s: &str) -> &str {
    s.strip_suffix('/')
        .or_else(|| s.strip_suffix('\\'))
        .unwrap_or(s)
}

/// Decomposes a remote document path.
///
/// One trailing separator is ignored. The last `/`-delimited segment must
/// parse as a base-10 integer and is kept verbatim in the filename.
///
/// # Errors
///
/// Returns [`SyncError::MalformedPath`] if the path has fewer than two
/// segments, the name contains a `\`, or the last segment is not an integer.
pub fn decompose_path(path: &str) -> SyncResult<DecomposedPath> {
    let mut segments = trim_trailing_separator(path).rsplit('/');

    let (id_text, name) = match (segments.next(), segments.next()) {
        (Some(id_text), Some(name)) => (id_text, name),
        _ => return Err(SyncError::malformed_path(path, "expected <name>/<id>")),
    };

    if name.contains('\\') {
        return Err(SyncError::malformed_path(path, format!("name {name:?} contains '\\'")));
    }

    let sequence_id = id_text.parse::<i64>().map_err(|e| {
        SyncError::malformed_path(path, format!("sequence id {id_text:?}: {e}"))
    })?;

    Ok(DecomposedPath {
        sequence_id,
        filename: format!("{name}_{id_text}.{DOCUMENT_EXTENSION}"),
    })
}
