//! Transport layer abstraction.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. The engine only
/// needs blocking `GET` and `DELETE`; errors are plain messages that the
/// caller wraps into [`crate::SyncError::Transport`].
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    fn get(&self, url: &str) -> Result<Vec<u8>, String>;

    /// Sends a DELETE request. The response body is ignored.
    fn delete(&self, url: &str) -> Result<(), String>;
}

/// A scripted HTTP client for testing.
///
/// GET answers are looked up by exact URL; unknown URLs fail like an
/// unreachable host. Every request is recorded.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<HashMap<String, Result<Vec<u8>, String>>>,
    failing_deletes: Mutex<HashSet<String>>,
    gets: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

impl MockHttpClient {
    /// Creates a new mock client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body returned for `url`.
    pub fn set_response(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.responses.lock().insert(url.into(), Ok(body.into()));
    }

    /// Makes GET requests for `url` fail with `message`.
    pub fn set_failure(&self, url: impl Into<String>, message: impl Into<String>) {
        self.responses
            .lock()
            .insert(url.into(), Err(message.into()));
    }

    /// Makes DELETE requests for `url` fail.
    pub fn fail_delete(&self, url: impl Into<String>) {
        self.failing_deletes.lock().insert(url.into());
    }

    /// Returns every URL requested with GET, in order.
    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().clone()
    }

    /// Returns every URL requested with DELETE, in order, including failed
    /// attempts.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        self.gets.lock().push(url.to_string());
        self.responses
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(format!("connection refused: {url}")))
    }

    fn delete(&self, url: &str) -> Result<(), String> {
        self.deletes.lock().push(url.to_string());
        if self.failing_deletes.lock().contains(url) {
            return Err("HTTP status 500 Internal Server Error".into());
        }
        Ok(())
    }
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        (**self).get(url)
    }

    fn delete(&self, url: &str) -> Result<(), String> {
        (**self).delete(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_responses() {
        let client = MockHttpClient::new();
        client.set_response("http://utm/opt/out", "<A/>");
        client.set_failure("http://utm/opt/in", "timed out");

        assert_eq!(client.get("http://utm/opt/out").unwrap(), b"<A/>");
        assert_eq!(client.get("http://utm/opt/in").unwrap_err(), "timed out");
        assert!(client.get("http://utm/unknown").is_err());
        assert_eq!(
            client.gets(),
            vec!["http://utm/opt/out", "http://utm/opt/in", "http://utm/unknown"]
        );
    }

    #[test]
    fn recorded_deletes() {
        let client = MockHttpClient::new();
        client.fail_delete("http://utm/opt/out/Ticket/2");

        assert!(client.delete("http://utm/opt/out/Ticket/1").is_ok());
        assert!(client.delete("http://utm/opt/out/Ticket/2").is_err());
        assert_eq!(client.deletes().len(), 2);
    }

    #[test]
    fn borrowed_client() {
        let client = MockHttpClient::new();
        client.set_response("http://utm/doc", vec![1u8, 2, 3]);

        let borrowed = &client;
        assert_eq!(HttpClient::get(&borrowed, "http://utm/doc").unwrap(), vec![1, 2, 3]);
        assert_eq!(client.gets().len(), 1);
    }
}
