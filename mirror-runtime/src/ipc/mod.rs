// Editor query protocol: message envelope, transports, server and client.

pub mod client;
pub mod loopback;
pub mod message;
pub mod objects;
pub mod server;
pub mod transport;

pub use client::Client;
pub use loopback::{LoopbackClientTransport, LoopbackHub, LoopbackServerTransport};
pub use message::Message;
pub use objects::{ObjectId, ObjectTable, SharedObjects, lock_objects};
pub use server::{Handler, Server};
pub use transport::{ClientTransport, ConnectionId, ServerTransport};
