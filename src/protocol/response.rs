use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::ServiceError;

/// Status codes carried in every response
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const ACCEPTED: u16 = 202;
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const UNPROCESSABLE: u16 = 422;
    pub const INTERNAL: u16 = 500;
}

const ENCODE_FAILURE: &[u8] = b"{\"status\":500,\"error\":\"failed to encode response\"}\n";

/// One reply line: a status plus either a body or an error message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Create a 200 response carrying `body`
    pub fn ok(body: impl Serialize) -> Self {
        Self::with_status(status::OK, body)
    }

    /// Create a success response with an explicit status
    pub fn with_status(status: u16, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status,
                body: Some(body),
                error: None,
            },
            Err(e) => Self::error(status::INTERNAL, format!("failed to encode body: {}", e)),
        }
    }

    /// Create a 200 response with no body
    pub fn empty() -> Self {
        Self {
            status: status::OK,
            body: None,
            error: None,
        }
    }

    /// Create an error response
    pub fn error(status: u16, msg: impl Into<String>) -> Self {
        Self {
            status,
            body: None,
            error: Some(msg.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Encode as a single `\n`-terminated JSON line
    pub fn encode(&self) -> Vec<u8> {
        match serde_json::to_vec(self) {
            Ok(mut buf) => {
                buf.push(b'\n');
                buf
            }
            Err(_) => ENCODE_FAILURE.to_vec(),
        }
    }
}

impl From<ServiceError> for Response {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UnknownUser(user_id) => Self::error(
                status::NOT_FOUND,
                format!(
                    "could not create new score for user {}, user does not exist",
                    user_id
                ),
            ),
            ServiceError::DanglingUser { .. } => Self::error(status::CONFLICT, err.to_string()),
        }
    }
}
