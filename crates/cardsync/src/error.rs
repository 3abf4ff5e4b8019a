//! Error types for the client facade.
//!
//! Almost nothing here can fail from the caller's point of view: wire
//! sends are fire-and-forget (encode and transport failures are logged
//! and dropped inside the driver) and transport faults surface only as
//! [`ConnectionState`](crate::ConnectionState) transitions.

/// Errors that can occur on the client facade surface.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The driver task has exited (after [`shutdown`](crate::SyncClient::shutdown)),
    /// so commands and control requests have nowhere to go.
    #[error("client is shut down")]
    Closed,
}
