// Protocol server: handler table keyed by message type, polled by the host.
//
// Lifecycle: Stopped -> Started -> Stopped. `update()` drains the transport
// and answers every message with a `Response` carrying the same request id.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use mirror_ffi::MessageType;
use serde_json::{Value, json};

use crate::error::{MirrorError, MirrorResult, error_payload};
use crate::ffi_guard::panic_message;
use crate::ipc::message::Message;
use crate::ipc::objects::{ObjectId, SharedObjects, lock_objects};
use crate::ipc::transport::ServerTransport;
use crate::registry::Registry;

/// Computes a response payload from a request payload.
pub type Handler = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Events raised by handlers, flushed to clients after each dispatch.
type Outbox = Arc<Mutex<Vec<Message>>>;

pub struct Server {
    registry: Arc<Registry>,
    transport: Box<dyn ServerTransport>,
    handlers: HashMap<MessageType, Handler>,
    outbox: Outbox,
    endpoint: Option<String>,
}

impl Server {
    /// A stopped server with the `GetTypes` and `GetTypeInfo` handlers installed.
    pub fn new(registry: Arc<Registry>, transport: Box<dyn ServerTransport>) -> Self {
        let mut server = Server {
            registry,
            transport,
            handlers: HashMap::new(),
            outbox: Arc::default(),
            endpoint: None,
        };
        server.install_default_handlers();
        server
    }

    fn install_default_handlers(&mut self) {
        let registry = Arc::clone(&self.registry);
        self.register_handler(MessageType::GetTypes, move |_| get_types(&registry));
        let registry = Arc::clone(&self.registry);
        self.register_handler(MessageType::GetTypeInfo, move |payload| get_type_info(&registry, payload));
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Bind `handler` to `message_type`, replacing any previous one.
    pub fn register_handler<F>(&mut self, message_type: MessageType, handler: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        if self.handlers.insert(message_type, Arc::new(handler)).is_some() {
            log::debug!("handler for {} replaced", message_type.name());
        }
    }

    pub fn unregister_handler(&mut self, message_type: MessageType) -> bool {
        self.handlers.remove(&message_type).is_some()
    }

    pub fn has_handler(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Serve `GetSceneObjects`, `GetObjectProperties`, `SetProperty` and
    /// `DeleteObject` from `objects`.
    pub fn attach_objects(&mut self, objects: SharedObjects) {
        let table = Arc::clone(&objects);
        self.register_handler(MessageType::GetSceneObjects, move |_| {
            let table = lock_objects(&table);
            let list: Vec<Value> = table
                .list()
                .into_iter()
                .map(|(id, type_name)| json!({ "id": id, "type": type_name }))
                .collect();
            Value::Array(list).to_string()
        });

        let table = Arc::clone(&objects);
        self.register_handler(MessageType::GetObjectProperties, move |payload| {
            let Some(id) = object_id(payload) else {
                return error_payload("Invalid request");
            };
            lock_objects(&table).properties(id).unwrap_or_else(|err| err.to_payload())
        });

        let table = Arc::clone(&objects);
        let outbox = Arc::clone(&self.outbox);
        self.register_handler(MessageType::SetProperty, move |payload| {
            let Ok(request) = serde_json::from_str::<Value>(payload) else {
                return error_payload("Invalid request");
            };
            let (Some(id), Some(field), Some(value)) = (
                request.get("objectId").and_then(Value::as_u64).and_then(|id| ObjectId::try_from(id).ok()),
                request.get("field").and_then(Value::as_str),
                request.get("value"),
            ) else {
                return error_payload("Invalid request");
            };
            match lock_objects(&table).set_property(id, field, value) {
                Ok(()) => {
                    push_event(&outbox, MessageType::ObjectModified, json!({ "objectId": id, "field": field }));
                    json!({ "ok": true }).to_string()
                }
                Err(err) => err.to_payload(),
            }
        });

        let table = objects;
        let outbox = Arc::clone(&self.outbox);
        self.register_handler(MessageType::DeleteObject, move |payload| {
            let Some(id) = object_id(payload) else {
                return error_payload("Invalid request");
            };
            if lock_objects(&table).remove(id) {
                push_event(&outbox, MessageType::SceneChanged, json!({ "deleted": id }));
                json!({ "ok": true }).to_string()
            } else {
                MirrorError::ObjectNotFound(id).to_payload()
            }
        });
    }

    /// Start listening on `endpoint`. Starting a running server is a no-op.
    pub fn start(&mut self, endpoint: &str) -> MirrorResult<()> {
        if self.endpoint.is_some() {
            return Ok(());
        }
        self.transport.open(endpoint)?;
        self.endpoint = Some(endpoint.to_string());
        log::info!("mirror server started on '{endpoint}'");
        Ok(())
    }

    /// Stop listening. Stopping a stopped server is a no-op.
    pub fn stop(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            self.transport.close();
            log::info!("mirror server on '{endpoint}' stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn connection_count(&self) -> usize {
        self.transport.connection_count()
    }

    /// Drain pending messages and answer each one, whatever its type.
    /// Returns how many were handled; always 0 while stopped.
    pub fn update(&mut self) -> usize {
        if !self.is_running() {
            return 0;
        }
        let mut handled = 0;
        for (connection, message) in self.transport.poll() {
            let response = self.respond(&message);
            if let Err(err) = self.transport.send(connection, response) {
                log::warn!("reply to connection {connection} failed: {err}");
            }
            handled += 1;
            self.flush_events();
        }
        handled
    }

    fn respond(&self, message: &Message) -> Message {
        log::debug!("dispatch {} (request {})", message.message_type.name(), message.request_id);
        Message::response(self.run_handler(message.message_type, &message.payload), message.request_id)
    }

    /// Run the handler bound to `message_type` on `payload` and push any
    /// events it raised.
    pub fn dispatch(&mut self, message_type: MessageType, payload: &str) -> String {
        let response = self.run_handler(message_type, payload);
        self.flush_events();
        response
    }

    fn run_handler(&self, message_type: MessageType, payload: &str) -> String {
        let Some(handler) = self.handlers.get(&message_type) else {
            return error_payload("Unknown message type");
        };
        match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
            Ok(response) => response,
            Err(payload) => {
                log::warn!("handler for {} panicked: {}", message_type.name(), panic_message(payload.as_ref()));
                error_payload("Handler failed")
            }
        }
    }

    /// Push an unsolicited message to every client. Ignored while stopped.
    pub fn send_event(&mut self, message_type: MessageType, payload: &str) {
        if !self.is_running() {
            return;
        }
        self.transport.broadcast(Message::event(message_type, payload));
    }

    /// Broadcast queued handler events. Dropped while stopped.
    fn flush_events(&mut self) {
        let events = std::mem::take(&mut *self.outbox.lock().unwrap_or_else(PoisonError::into_inner));
        if !self.is_running() {
            return;
        }
        for event in events {
            self.transport.broadcast(event);
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

fn push_event(outbox: &Outbox, message_type: MessageType, payload: Value) {
    outbox
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(Message::event(message_type, payload.to_string()));
}

fn object_id(payload: &str) -> Option<ObjectId> {
    let request: Value = serde_json::from_str(payload).ok()?;
    let id = request.get("objectId")?.as_u64()?;
    ObjectId::try_from(id).ok()
}

fn get_types(registry: &Registry) -> String {
    Value::from(registry.list_type_names()).to_string()
}

fn get_type_info(registry: &Registry, payload: &str) -> String {
    let type_name = serde_json::from_str::<Value>(payload)
        .ok()
        .and_then(|v| v.get("typeName").and_then(Value::as_str).map(str::to_owned));
    let Some(type_name) = type_name else {
        return error_payload("Invalid request");
    };
    let Some(desc) = registry.get_type(&type_name) else {
        return error_payload("Type not found");
    };
    let fields: Vec<Value> = desc
        .fields()
        .iter()
        .map(|f| json!({ "name": f.name(), "type": f.kind() as u32 }))
        .collect();
    json!({ "name": desc.name(), "size": desc.size_bytes(), "fields": fields }).to_string()
}
