// In-process transport: servers and clients meet on a `LoopbackHub` by
// endpoint name and exchange messages over crossbeam channels.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

use crate::error::{MirrorError, MirrorResult};
use crate::ipc::message::Message;
use crate::ipc::transport::{ClientTransport, ConnectionId, ServerTransport};

/// Per-direction queue capacity.
const CHANNEL_CAPACITY: usize = 1024;

/// What a client pushes to the server side of an endpoint.
enum Inbound {
    Connect { id: ConnectionId, reply: Sender<Message> },
    Message { id: ConnectionId, message: Message },
    Disconnect { id: ConnectionId },
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<String, Sender<Inbound>>,
}

/// Rendezvous point for loopback servers and clients. Cheap to clone.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
    next_connection: Arc<AtomicU64>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn server_transport(&self) -> LoopbackServerTransport {
        LoopbackServerTransport {
            hub: self.clone(),
            endpoint: None,
            inbound: None,
            clients: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn client_transport(&self) -> LoopbackClientTransport {
        LoopbackClientTransport {
            hub: self.clone(),
            id: 0,
            server: None,
            replies: None,
        }
    }

    /// Whether a server is listening on `endpoint`.
    pub fn is_listening(&self, endpoint: &str) -> bool {
        self.lock().endpoints.contains_key(endpoint)
    }
}

fn queue_error<T>(err: TrySendError<T>) -> MirrorError {
    match err {
        TrySendError::Full(_) => MirrorError::Transport("loopback queue full".into()),
        TrySendError::Disconnected(_) => MirrorError::NotConnected,
    }
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

pub struct LoopbackServerTransport {
    hub: LoopbackHub,
    endpoint: Option<String>,
    inbound: Option<Receiver<Inbound>>,
    clients: HashMap<ConnectionId, Sender<Message>>,
    /// Messages taken off the inbound queue but not yet returned by `poll`.
    pending: VecDeque<(ConnectionId, Message)>,
}

impl LoopbackServerTransport {
    /// Apply queued connects and disconnects and buffer client messages.
    fn drain_inbound(&mut self) {
        let Some(inbound) = &self.inbound else {
            return;
        };
        loop {
            match inbound.try_recv() {
                Ok(Inbound::Connect { id, reply }) => {
                    self.clients.insert(id, reply);
                }
                Ok(Inbound::Message { id, message }) => self.pending.push_back((id, message)),
                Ok(Inbound::Disconnect { id }) => {
                    self.clients.remove(&id);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl ServerTransport for LoopbackServerTransport {
    fn open(&mut self, endpoint: &str) -> MirrorResult<()> {
        if self.endpoint.is_some() {
            return Ok(());
        }
        let mut state = self.hub.lock();
        if state.endpoints.contains_key(endpoint) {
            return Err(MirrorError::Transport(format!("endpoint '{endpoint}' already in use")));
        }
        let (tx, rx) = channel::bounded(CHANNEL_CAPACITY);
        state.endpoints.insert(endpoint.to_string(), tx);
        drop(state);

        self.endpoint = Some(endpoint.to_string());
        self.inbound = Some(rx);
        log::debug!("loopback server listening on '{endpoint}'");
        Ok(())
    }

    fn close(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            self.hub.lock().endpoints.remove(&endpoint);
            log::debug!("loopback server on '{endpoint}' closed");
        }
        self.inbound = None;
        self.clients.clear();
        self.pending.clear();
    }

    fn poll(&mut self) -> Vec<(ConnectionId, Message)> {
        self.drain_inbound();
        self.pending.drain(..).collect()
    }

    fn send(&mut self, connection: ConnectionId, message: Message) -> MirrorResult<()> {
        let client = self.clients.get(&connection).ok_or(MirrorError::NotConnected)?;
        client.try_send(message).map_err(queue_error)
    }

    fn broadcast(&mut self, message: Message) {
        // Clients whose connect has returned must see the event.
        self.drain_inbound();
        self.clients.retain(|id, client| match client.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("loopback client {id} is not draining events, dropping one");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    fn connection_count(&self) -> usize {
        self.clients.len()
    }
}

impl Drop for LoopbackServerTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

pub struct LoopbackClientTransport {
    hub: LoopbackHub,
    id: ConnectionId,
    server: Option<Sender<Inbound>>,
    replies: Option<Receiver<Message>>,
}

impl ClientTransport for LoopbackClientTransport {
    fn connect(&mut self, endpoint: &str) -> MirrorResult<()> {
        if self.server.is_some() {
            return Ok(());
        }
        let server = self
            .hub
            .lock()
            .endpoints
            .get(endpoint)
            .cloned()
            .ok_or_else(|| MirrorError::Transport(format!("no server listening on '{endpoint}'")))?;

        let id = self.hub.next_connection.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = channel::bounded(CHANNEL_CAPACITY);
        server.try_send(Inbound::Connect { id, reply: tx }).map_err(queue_error)?;

        self.id = id;
        self.server = Some(server);
        self.replies = Some(rx);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(server) = self.server.take() {
            let _ = server.try_send(Inbound::Disconnect { id: self.id });
        }
        self.replies = None;
    }

    fn is_connected(&self) -> bool {
        self.server.is_some()
    }

    fn send(&mut self, message: Message) -> MirrorResult<()> {
        let server = self.server.as_ref().ok_or(MirrorError::NotConnected)?;
        server.try_send(Inbound::Message { id: self.id, message }).map_err(queue_error)
    }

    fn recv_timeout(&mut self, timeout: Duration) -> MirrorResult<Option<Message>> {
        let replies = self.replies.as_ref().ok_or(MirrorError::NotConnected)?;
        match replies.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(MirrorError::NotConnected),
        }
    }

    fn try_recv(&mut self) -> MirrorResult<Option<Message>> {
        let replies = self.replies.as_ref().ok_or(MirrorError::NotConnected)?;
        match replies.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(MirrorError::NotConnected),
        }
    }
}

impl Drop for LoopbackClientTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
