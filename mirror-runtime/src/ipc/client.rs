// Protocol client: blocking request/response plus a queue of pushed events.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use mirror_ffi::MessageType;

use crate::error::{MirrorError, MirrorResult};
use crate::ipc::message::Message;
use crate::ipc::transport::ClientTransport;

/// Default time a `send_command` waits for its response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

pub struct Client {
    transport: Box<dyn ClientTransport>,
    next_request_id: u32,
    timeout: Duration,
    events: VecDeque<Message>,
}

impl Client {
    pub fn new(transport: Box<dyn ClientTransport>) -> Self {
        Client {
            transport,
            next_request_id: 1,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            events: VecDeque::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect to `endpoint`. Connecting while connected is a no-op.
    pub fn connect(&mut self, endpoint: &str) -> MirrorResult<()> {
        if self.transport.is_connected() {
            return Ok(());
        }
        self.transport.connect(endpoint)?;
        log::debug!("client connected to '{endpoint}'");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.transport.is_connected() {
            self.transport.disconnect();
            self.events.clear();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Send a request and block until its response arrives or the timeout
    /// expires. Events received meanwhile are queued for `poll_events`.
    pub fn request(&mut self, message_type: MessageType, payload: &str) -> MirrorResult<String> {
        if !self.transport.is_connected() {
            return Err(MirrorError::NotConnected);
        }
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        self.transport.send(Message::new(message_type, payload, request_id))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(MirrorError::Transport(format!(
                    "request {request_id} ({}) timed out",
                    message_type.name()
                )));
            }
            match self.transport.recv_timeout(remaining)? {
                Some(message) if message.is_event() => self.events.push_back(message),
                Some(message) if message.request_id == request_id => return Ok(message.payload),
                Some(message) => {
                    log::trace!("dropping stale response to request {}", message.request_id);
                }
                None => {}
            }
        }
    }

    /// Like [`request`](Self::request), with failures folded into an
    /// `{"error": ...}` payload.
    pub fn send_command(&mut self, message_type: MessageType, payload: &str) -> String {
        self.request(message_type, payload).unwrap_or_else(|err| {
            log::debug!("{} failed: {err}", message_type.name());
            err.to_payload()
        })
    }

    /// Drain pushed events without blocking. Empty while disconnected.
    pub fn poll_events(&mut self) -> Vec<Message> {
        if !self.transport.is_connected() {
            return Vec::new();
        }
        loop {
            match self.transport.try_recv() {
                Ok(Some(message)) if message.is_event() => self.events.push_back(message),
                Ok(Some(message)) => {
                    log::trace!("dropping stale response to request {}", message.request_id);
                }
                Ok(None) => break,
                Err(err) => {
                    log::debug!("event poll stopped: {err}");
                    break;
                }
            }
        }
        self.events.drain(..).collect()
    }
}
