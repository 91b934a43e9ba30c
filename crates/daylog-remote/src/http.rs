//! Shared HTTP plumbing: agent construction, error mapping, body parsing

use std::time::Duration;

use daylog_core::SyncError;
use serde::de::DeserializeOwned;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("daylog/", env!("CARGO_PKG_VERSION"));

/// Longest response excerpt kept in an error message
const MAX_ERROR_EXCERPT: usize = 300;

/// Blocking agent shared by every request of a client
pub fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .timeout_write(WRITE_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Map a ureq failure onto the error taxonomy.
///
/// Status errors keep their code so [`SyncError::kind`] can classify them;
/// transport errors (DNS, refused connections, timeouts) are transient.
pub(crate) fn map_error(err: ureq::Error) -> SyncError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            SyncError::http(status, error_message(&body))
        }
        ureq::Error::Transport(transport) => SyncError::Transport(transport.to_string()),
    }
}

pub(crate) fn read_body(response: ureq::Response) -> Result<String, SyncError> {
    response
        .into_string()
        .map_err(|e| SyncError::Transport(format!("reading response body: {e}")))
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, SyncError> {
    serde_json::from_str(body).map_err(|e| SyncError::InvalidResponse(e.to_string()))
}

/// Human-readable message from an error response body.
///
/// Understands Google's `{"error": {"message": ...}}`, OAuth's
/// `{"error_description": ...}` and plain `{"error": "..."}` bodies; anything
/// else is truncated verbatim.
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let structured = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("error_description"))
            .or_else(|| v.get("error"))
            .and_then(|m| m.as_str())
            .map(String::from)
    });

    structured.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            trimmed.chars().take(MAX_ERROR_EXCERPT).collect()
        }
    })
}
