use thiserror::Error;

use super::TickInput;

/// What the transport collaborator surfaces to the feed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// One raw text frame, not decoded yet.
    Message(String),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wire decoder seam: turns one raw frame into a trade tick.
///
/// `Ok(None)` means the frame is not a trade, or is a trade with a null
/// price, quantity or timestamp. Both are dropped without complaint.
pub trait TickDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Option<TickInput>, DecodeError>;
}
