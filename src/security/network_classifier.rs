//! Detects environment-level network failures in command output
//!
//! npm reports connectivity problems with Node's system error codes. When one
//! of them shows up, further versions would fail the same way, so the driver
//! stops the run instead of churning through the rest.

use aho_corasick::{AhoCorasick, BuildError};

/// Error codes treated as network-class: host unreachable, connection timed
/// out, connection refused
pub const NETWORK_ERROR_CODES: &[&str] = &["ENOTFOUND", "ETIMEDOUT", "ECONNREFUSED"];

/// Multi-pattern matcher over [`NETWORK_ERROR_CODES`]
#[derive(Debug, Clone)]
pub struct NetworkClassifier {
    matcher: AhoCorasick,
}

impl NetworkClassifier {
    pub fn new() -> Result<Self, BuildError> {
        Ok(Self {
            matcher: AhoCorasick::new(NETWORK_ERROR_CODES)?,
        })
    }

    /// First network error code found in `message`
    pub fn matched_code(&self, message: &str) -> Option<&'static str> {
        self.matcher
            .find(message)
            .map(|m| NETWORK_ERROR_CODES[m.pattern().as_usize()])
    }
}
