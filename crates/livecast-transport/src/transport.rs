//! Opaque RTMP wire-library boundary.

use crate::packet::RtmpPacket;

/// One RTMP connection handle.
///
/// The publisher drives these operations in a fixed order on its writer
/// thread: `init`, `setup_url`, `set_timeout`, `enable_write`,
/// `connect`, `connect_stream`, then `send_packet` until teardown and
/// `close`. Dropping the handle releases it. The core never inspects
/// wire bytes beyond the tag bodies it built.
pub trait RtmpTransport: Send {
    /// Initialize the freshly allocated handle.
    fn init(&mut self);

    /// Parse and store the target URL. False on rejection.
    fn setup_url(&mut self, url: &str) -> bool;

    /// Bound blocking socket operations, in seconds.
    fn set_timeout(&mut self, seconds: u32);

    /// Switch the link into publish (write) mode.
    fn enable_write(&mut self);

    /// TCP connect plus RTMP handshake. False on failure.
    fn connect(&mut self) -> bool;

    /// Create the publish stream. False on failure.
    fn connect_stream(&mut self, index: u32) -> bool;

    /// Send one packet; false signals an individual send failure.
    fn send_packet(&mut self, packet: &RtmpPacket, queued: bool) -> bool;

    /// Message stream id assigned by the server.
    fn stream_id(&self) -> u32;

    /// Tear down the connection.
    fn close(&mut self);
}

/// Allocates transport handles and supplies the transport clock.
pub trait TransportFactory: Send + Sync {
    /// Allocate a connection handle; `None` means the wire library
    /// could not provide one.
    fn alloc(&self) -> Option<Box<dyn RtmpTransport>>;

    /// Monotonic milliseconds since an arbitrary epoch. Wraps; callers
    /// difference values with u32 arithmetic.
    fn now_ms(&self) -> u32;
}
