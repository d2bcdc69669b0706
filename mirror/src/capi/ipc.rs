// Protocol servers and clients owned by the host through opaque handles.
// Both sides use the in-process loopback hub; servers serve the
// process-wide registry.
//
// # Safety
// Handles must come from the matching `*_create` function and must not be
// used after `*_destroy`. String arguments follow `capi::reflection`.

use std::ffi::{c_char, c_void};
use std::panic::AssertUnwindSafe;

use mirror_ffi::{ClientHandle, MessageFamily, MessageType, ServerHandle};
use mirror_runtime::ipc::{Client, Server};
use mirror_runtime::{error_payload, ffi_boundary, registry, MirrorConfig};

use super::{hub, read_str, write_str};

fn default_endpoint() -> String {
    MirrorConfig::default().ipc.endpoint
}

/// # Safety
/// See module docs.
unsafe fn server<'a>(handle: ServerHandle) -> Option<&'a mut Server> {
    // SAFETY: handles wrap a `Box<Server>` leaked by `mirror_ipc_server_create`.
    unsafe { (handle.0 as *mut Server).as_mut() }
}

/// # Safety
/// See module docs.
unsafe fn client<'a>(handle: ClientHandle) -> Option<&'a mut Client> {
    // SAFETY: handles wrap a `Box<Client>` leaked by `mirror_ipc_client_create`.
    unsafe { (handle.0 as *mut Client).as_mut() }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Create a stopped server over the process-wide registry.
#[unsafe(no_mangle)]
pub extern "C" fn mirror_ipc_server_create() -> ServerHandle {
    ffi_boundary(ServerHandle::null(), || {
        let server = Server::new(registry::global(), Box::new(hub().server_transport()));
        ServerHandle(Box::into_raw(Box::new(server)) as *mut c_void)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_destroy(handle: ServerHandle) {
    ffi_boundary((), || {
        if !handle.is_null() {
            // SAFETY: see module docs; ownership returns to Rust here.
            drop(unsafe { Box::from_raw(handle.0 as *mut Server) });
        }
    })
}

/// Start listening on `endpoint` (null for the default). True if running
/// afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_start(handle: ServerHandle, endpoint: *const c_char) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        let Some(server) = (unsafe { server(handle) }) else {
            return false;
        };
        // SAFETY: see module docs.
        let endpoint = unsafe { read_str(endpoint) }.map_or_else(default_endpoint, str::to_owned);
        match server.start(&endpoint) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("server start on '{endpoint}': {err}");
                false
            }
        }
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_stop(handle: ServerHandle) {
    ffi_boundary((), AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        if let Some(server) = unsafe { server(handle) } {
            server.stop();
        }
    }))
}

/// Answer pending requests. Returns how many were handled.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_update(handle: ServerHandle) -> u32 {
    ffi_boundary(0, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        unsafe { server(handle) }.map_or(0, |s| s.update() as u32)
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_is_running(handle: ServerHandle) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        unsafe { server(handle) }.is_some_and(|s| s.is_running())
    }))
}

/// Push an event to every client. False for unknown or non-event tags, or
/// while stopped.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_server_send_event(
    handle: ServerHandle,
    message_type: u32,
    payload: *const c_char,
) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        let Some(server) = (unsafe { server(handle) }) else {
            return false;
        };
        let Some(message_type) = MessageType::from_raw(message_type) else {
            return false;
        };
        if message_type.family() != MessageFamily::Event || !server.is_running() {
            return false;
        }
        // SAFETY: see module docs.
        let payload = unsafe { read_str(payload) }.unwrap_or("{}");
        server.send_event(message_type, payload);
        true
    }))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[unsafe(no_mangle)]
pub extern "C" fn mirror_ipc_client_create() -> ClientHandle {
    ffi_boundary(ClientHandle::null(), || {
        let client = Client::new(Box::new(hub().client_transport()));
        ClientHandle(Box::into_raw(Box::new(client)) as *mut c_void)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_client_destroy(handle: ClientHandle) {
    ffi_boundary((), || {
        if !handle.is_null() {
            // SAFETY: see module docs; ownership returns to Rust here.
            drop(unsafe { Box::from_raw(handle.0 as *mut Client) });
        }
    })
}

/// Connect to `endpoint` (null for the default).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_client_connect(handle: ClientHandle, endpoint: *const c_char) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        let Some(client) = (unsafe { client(handle) }) else {
            return false;
        };
        // SAFETY: see module docs.
        let endpoint = unsafe { read_str(endpoint) }.map_or_else(default_endpoint, str::to_owned);
        match client.connect(&endpoint) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("client connect to '{endpoint}': {err}");
                false
            }
        }
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_client_disconnect(handle: ClientHandle) {
    ffi_boundary((), AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        if let Some(client) = unsafe { client(handle) } {
            client.disconnect();
        }
    }))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_client_is_connected(handle: ClientHandle) -> bool {
    ffi_boundary(false, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        unsafe { client(handle) }.is_some_and(|c| c.is_connected())
    }))
}

/// Send a request and write the response payload into `buf`. Returns the full
/// response length. Failures are written as `{"error": ...}` payloads.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mirror_ipc_client_send_command(
    handle: ClientHandle,
    message_type: u32,
    payload: *const c_char,
    buf: *mut c_char,
    buf_len: u32,
) -> u32 {
    ffi_boundary(0, AssertUnwindSafe(|| {
        // SAFETY: see module docs.
        let response = match (unsafe { client(handle) }, MessageType::from_raw(message_type)) {
            (Some(client), Some(message_type)) => {
                // SAFETY: see module docs.
                let payload = unsafe { read_str(payload) }.unwrap_or("");
                client.send_command(message_type, payload)
            }
            (None, _) => error_payload("Invalid client"),
            (_, None) => error_payload("Unknown message type"),
        };
        // SAFETY: see module docs.
        unsafe { write_str(&response, buf, buf_len) }
    }))
}
