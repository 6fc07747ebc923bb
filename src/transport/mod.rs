//! Transport adapters for the mirrored collection.
//!
//! Two adapters share the cache/event contract: a duplex WebSocket
//! connection, and a one-way server-push stream paired with a companion
//! write endpoint. Inbound operations are dispatched into the shared map
//! state by each adapter's reader task; outbound operations go through the
//! [`Transport`] seam.

mod socket;
mod sse;

pub use socket::SocketTransport;
pub use sse::SseTransport;

use crate::protocol::SyncOperation;

/// Outbound half of the transport contract.
pub trait Transport: Send + Sync {
    /// Transmit a locally-applied operation to the server.
    ///
    /// Transmission failures never propagate to map callers; adapters log
    /// and move on.
    fn send(&self, operation: &SyncOperation);
}
