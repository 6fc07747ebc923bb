//! Client-side mirrored collection over WebSocket or server-sent events.
//!
//! Maintains a local cache of a server-owned key-value map, synchronized
//! through a stream of `init`/`put`/`remove`/`clear` operations. Local
//! mutations apply optimistically and are pushed to the server; remote
//! mutations arrive asynchronously and land in the same cache. A
//! caller-supplied listener fires after every mutation so a UI layer can
//! re-render without caring where the change came from.
//!
//! Also ships the delimited-string login flow used by the same server
//! family.

mod config;
mod error;
mod login;
mod map;
mod protocol;
mod transport;

pub use config::ServerConfig;
pub use error::Error;
pub use login::{LoginClient, LoginState};
pub use map::SharedMap;
pub use protocol::{LoginRequest, LoginResponse, SyncOperation};
pub use transport::{SocketTransport, SseTransport, Transport};
