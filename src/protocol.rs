//! Wire messages.
//!
//! The collection protocol is a JSON object tagged by `event`, identical in
//! both directions and on both transports. The login flow speaks a separate
//! colon-delimited string format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A single synchronization operation for the mirrored collection.
///
/// Wire shape: `{ "event": "init"|"put"|"remove"|"clear", "map"?, "key"?, "value"? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SyncOperation {
    /// Full snapshot, replacing the local cache wholesale.
    Init { map: HashMap<String, String> },
    /// Upsert of a single entry.
    Put { key: String, value: String },
    /// Removal of a single entry. Removing an absent key is not an error.
    Remove { key: String },
    /// Empty the collection.
    Clear,
    /// Any event tag this client does not understand. Never serialized;
    /// dispatch leaves the cache untouched but still notifies the listener.
    #[serde(other)]
    Unknown,
}

impl SyncOperation {
    pub fn encode(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(Error::from)
    }

    pub fn decode(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(Error::from)
    }

    /// The wire tag, for log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            SyncOperation::Init { .. } => "init",
            SyncOperation::Put { .. } => "put",
            SyncOperation::Remove { .. } => "remove",
            SyncOperation::Clear => "clear",
            SyncOperation::Unknown => "unknown",
        }
    }
}

const LOGIN_SEPARATOR: char = ':';

pub const LOGIN_REQUEST_TAG: &str = "lreq";
pub const LOGIN_RESPONSE_TAG: &str = "lres";

/// Login request: `"lreq" + ":" + id + ":" + user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// Communication id, monotonic per client.
    pub id: u64,
    pub user: String,
}

impl LoginRequest {
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            LOGIN_REQUEST_TAG,
            self.id,
            self.user,
            sep = LOGIN_SEPARATOR
        )
    }
}

/// Login response: `"lres" + ":" + id + ...`. Fields past the echoed
/// communication id are opaque to this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub id: String,
}

impl LoginResponse {
    /// Returns `None` for messages that are not login responses.
    pub fn parse(text: &str) -> Option<Self> {
        let mut fields = text.splitn(3, LOGIN_SEPARATOR);
        if fields.next()? != LOGIN_RESPONSE_TAG {
            return None;
        }
        let id = fields.next()?.to_owned();
        Some(Self { id })
    }
}
