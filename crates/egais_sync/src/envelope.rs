//! List envelope decoding.
//!
//! The list endpoint answers with a small XML document:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8" standalone="no"?>
//! <A>
//!   <url replyId="2a4d...">http://utm:8080/opt/out/ReplyNATTN/1523</url>
//!   <url>http://utm:8080/opt/out/Ticket/1524</url>
//!   <ver>2</ver>
//! </A>
//! ```
//!
//! Decoding is kept apart from the transport so it can be exercised against
//! literal fixtures.

use crate::error::{SyncError, SyncResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

/// Name of the envelope root element.
const ROOT_ELEMENT: &str = "A";

/// One document reference returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute URL of the document.
    pub remote_path: String,
    /// Reply identifier; the document is also stored under this directory.
    pub reply_id: Option<String>,
}

impl Entry {
    /// Creates an entry without a reply identifier.
    pub fn new(remote_path: impl Into<String>) -> Self {
        Self {
            remote_path: remote_path.into(),
            reply_id: None,
        }
    }

    /// Sets the reply identifier.
    pub fn with_reply_id(mut self, reply_id: impl Into<String>) -> Self {
        self.reply_id = Some(reply_id.into());
        self
    }
}

/// Entries in server response order.
pub type EntryList = Vec<Entry>;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "url", default)]
    urls: Vec<UrlElement>,
}

#[derive(Debug, Deserialize)]
struct UrlElement {
    #[serde(rename = "@replyId", default)]
    reply_id: Option<String>,
    #[serde(rename = "$text", default)]
    path: String,
}

impl From<UrlElement> for Entry {
    fn from(url: UrlElement) -> Self {
        let reply_id = url
            .reply_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        Self {
            remote_path: url.path.trim().to_string(),
            reply_id,
        }
    }
}

/// Decodes a list envelope body.
///
/// The root element must be `<A>`. Elements other than `<url>` are ignored.
///
/// # Errors
///
/// Returns [`SyncError::Decode`] if the body is not UTF-8, has a different
/// root element, or is not a well-formed envelope.
pub fn decode_envelope(body: &[u8]) -> SyncResult<EntryList> {
    let text = std::str::from_utf8(body)
        .map_err(|e| SyncError::Decode(format!("envelope is not UTF-8: {e}")))?;

    check_root(text)?;

    let envelope: Envelope = quick_xml::de::from_str(text)
        .map_err(|e| SyncError::Decode(format!("invalid envelope: {e}")))?;

    Ok(envelope.urls.into_iter().map(Entry::from).collect())
}

/// Fails unless the first element of `text` is the envelope root.
fn check_root(text: &str) -> SyncResult<()> {
    let mut reader = Reader::from_str(text);
    loop {
        let event = reader
            .read_event()
            .map_err(|e| SyncError::Decode(format!("invalid envelope: {e}")))?;

        match event {
            Event::Start(element) | Event::Empty(element) => {
                let name = element.name();
                if name.as_ref() == ROOT_ELEMENT.as_bytes() {
                    return Ok(());
                }
                return Err(SyncError::Decode(format!(
                    "unexpected root element <{}>, expected <{ROOT_ELEMENT}>",
                    String::from_utf8_lossy(name.as_ref())
                )));
            }
            Event::Eof => return Err(SyncError::Decode("envelope has no root element".into())),
            _ => {}
        }
    }
}
