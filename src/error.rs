use thiserror::Error;

/// Errors surfaced by the crate.
///
/// Transport-level failures inside a running connection are logged by the
/// adapter tasks and never reach map callers; only connection setup and the
/// login flow return the transport variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Keys must be non-empty strings.
    #[error("key must be a non-empty string")]
    InvalidKey,

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("stream request error: {0}")]
    Stream(#[from] reqwest::Error),

    #[error("malformed wire message: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server did not acknowledge the login request in time.
    #[error("login timed out waiting for server response")]
    LoginTimeout,

    /// The connection closed before the flow completed.
    #[error("connection closed")]
    ConnectionClosed,
}
