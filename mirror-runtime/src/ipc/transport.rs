// Transport seams. A transport moves whole `Message` records, in order, per
// connection; the server and client own all protocol logic.

use std::time::Duration;

use crate::error::MirrorResult;
use crate::ipc::message::Message;

/// Identifies one client connection on a server transport.
pub type ConnectionId = u64;

/// Listening side of a transport.
pub trait ServerTransport: Send {
    /// Start listening on `endpoint`.
    fn open(&mut self, endpoint: &str) -> MirrorResult<()>;

    /// Stop listening and drop every connection.
    fn close(&mut self);

    /// Drain everything received since the last call without blocking.
    fn poll(&mut self) -> Vec<(ConnectionId, Message)>;

    /// Send to one connection.
    fn send(&mut self, connection: ConnectionId, message: Message) -> MirrorResult<()>;

    /// Send to every live connection, dropping the ones that are gone.
    fn broadcast(&mut self, message: Message);

    fn connection_count(&self) -> usize;
}

/// Connecting side of a transport.
pub trait ClientTransport: Send {
    fn connect(&mut self, endpoint: &str) -> MirrorResult<()>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn send(&mut self, message: Message) -> MirrorResult<()>;

    /// Wait up to `timeout` for the next message. `Ok(None)` on timeout.
    fn recv_timeout(&mut self, timeout: Duration) -> MirrorResult<Option<Message>>;

    /// Next already-delivered message, if any.
    fn try_recv(&mut self) -> MirrorResult<Option<Message>>;
}
