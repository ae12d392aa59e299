//! Host-facing status callbacks.

use serde::{Deserialize, Serialize};

use crate::error::StreamErrorCode;

/// Execution context a status callback arrives on, so the sink can
/// marshal to its preferred thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadContext {
    /// A caller thread (session façade operations).
    Main,

    /// The publisher's writer thread.
    Worker,
}

/// Receives publish lifecycle events.
///
/// Implemented by the host. Callbacks may arrive on the writer thread;
/// implementations must not call back into `stop()` from inside a
/// callback, which would self-join the writer.
pub trait StatusSink: Send + Sync {
    /// The publisher is starting its connect sequence.
    fn on_connecting(&self, ctx: ThreadContext);

    /// Connect and publish-stream establishment succeeded.
    fn on_connected(&self);

    /// A fatal connect-phase error occurred; the session is over.
    fn on_error(&self, code: StreamErrorCode);

    /// The session was closed by the controller.
    fn on_closed(&self, ctx: ThreadContext);

    /// Periodic throughput readout (optional).
    fn on_stats(&self, _bitrate_kbps: u32, _fps: u32) {}
}
