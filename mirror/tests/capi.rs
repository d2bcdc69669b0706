// Flat C API driven the way a host would: C strings, raw instance pointers
// and opaque protocol handles.

use std::ffi::{CStr, CString, c_char, c_void};
use std::mem::offset_of;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use mirror::capi::ipc::*;
use mirror::capi::reflection::*;
use mirror::capi::serialization::*;
use mirror::capi::{mirror_init, mirror_last_error, mirror_set_log_callback};
use mirror::ffi::{InstanceHandle, MirrorErrorCode};
use mirror::prelude::*;

#[derive(Reflect, Default)]
struct Sprite {
    name: String,
    layer: i32,
    alpha: f32,
    visible: bool,
    weight: f64,
}

fn handle(sprite: &mut Sprite) -> InstanceHandle {
    InstanceHandle(sprite as *mut Sprite as *mut c_void)
}

fn text(buf: &[c_char]) -> &str {
    unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap()
}

#[test]
fn registry_queries() {
    mirror::init();
    assert!(mirror_init() >= 3);
    let count = mirror_type_count();

    let mut names = Vec::new();
    let mut buf = [0 as c_char; 64];
    for index in 0..count {
        let len = unsafe { mirror_type_name(index, buf.as_mut_ptr(), 64) };
        assert_eq!(len as usize, text(&buf).len());
        names.push(text(&buf).to_string());
    }
    for expected in ["Sprite", "Transform", "GameObject"] {
        assert!(names.iter().any(|n| n == expected), "{expected} missing from {names:?}");
    }
    assert_eq!(unsafe { mirror_type_name(count, buf.as_mut_ptr(), 64) }, 0);

    unsafe {
        assert_eq!(mirror_type_size(c"Sprite".as_ptr()) as usize, size_of::<Sprite>());
        assert_eq!(mirror_type_size(c"Nope".as_ptr()), 0);
        assert_eq!(mirror_field_count(c"Sprite".as_ptr()), 5);

        mirror_field_name(c"Sprite".as_ptr(), 2, buf.as_mut_ptr(), 64);
        assert_eq!(text(&buf), "alpha");
        assert_eq!(mirror_field_type(c"Sprite".as_ptr(), c"layer".as_ptr()), FieldKind::Int as i32);
        assert_eq!(mirror_field_type(c"Sprite".as_ptr(), c"missing".as_ptr()), -1);
        assert_eq!(mirror_field_offset(c"Sprite".as_ptr(), c"weight".as_ptr()) as usize, offset_of!(Sprite, weight));
    }
    assert!(!mirror_set_log_callback(None));
}

#[test]
fn field_access_through_raw_pointers() {
    mirror::init();
    let mut sprite = Sprite::default();
    let inst = handle(&mut sprite);
    let ty = c"Sprite".as_ptr();

    unsafe {
        assert!(mirror_set_int(ty, c"layer".as_ptr(), inst, 7));
        assert!(mirror_set_float(ty, c"alpha".as_ptr(), inst, 0.5));
        assert!(mirror_set_bool(ty, c"visible".as_ptr(), inst, true));
        assert!(mirror_set_double(ty, c"weight".as_ptr(), inst, 2.25));
        assert!(mirror_set_string(ty, c"name".as_ptr(), inst, c"knight".as_ptr()));

        assert_eq!(mirror_get_int(ty, c"layer".as_ptr(), inst), 7);
        assert_eq!(mirror_get_float(ty, c"alpha".as_ptr(), inst), 0.5);
        assert!(mirror_get_bool(ty, c"visible".as_ptr(), inst));
        assert_eq!(mirror_get_double(ty, c"weight".as_ptr(), inst), 2.25);

        let mut small = [0 as c_char; 4];
        assert_eq!(mirror_get_string(ty, c"name".as_ptr(), inst, small.as_mut_ptr(), 4), 6);
        assert_eq!(text(&small), "kni");

        assert_eq!(mirror_last_error(), MirrorErrorCode::Ok as u32);

        // Kind mismatch, unknown field, null instance, unknown type.
        assert!(!mirror_set_float(ty, c"layer".as_ptr(), inst, 1.0));
        assert_eq!(mirror_last_error(), MirrorErrorCode::TypeMismatch as u32);
        assert!(!mirror_set_int(ty, c"nope".as_ptr(), inst, 1));
        assert_eq!(mirror_last_error(), MirrorErrorCode::FieldNotFound as u32);
        assert_eq!(mirror_get_int(ty, c"layer".as_ptr(), InstanceHandle::null()), 0);
        assert_eq!(mirror_last_error(), MirrorErrorCode::NullArgument as u32);
        assert!(!mirror_get_bool(c"Nope".as_ptr(), c"visible".as_ptr(), inst));
        assert_eq!(mirror_last_error(), MirrorErrorCode::TypeNotFound as u32);

        assert_eq!(mirror_get_int(ty, c"layer".as_ptr(), inst), 7);
        assert_eq!(mirror_last_error(), MirrorErrorCode::Ok as u32);
    }
    assert_eq!(sprite.name, "knight");
    assert_eq!(sprite.layer, 7);
}

#[test]
fn json_through_raw_pointers() {
    mirror::init();
    let mut sprite = Sprite {
        name: "hero".into(),
        layer: 3,
        alpha: 0.5,
        visible: true,
        weight: 2.0,
    };
    let ty = c"Sprite".as_ptr();
    let expected = "{\n  \"name\": \"hero\",\n  \"layer\": 3,\n  \"alpha\": 0.500000,\n  \"visible\": true,\n  \"weight\": 2.000000\n}";

    let mut buf = [0 as c_char; 256];
    unsafe {
        let len = mirror_serialize_to_json(ty, handle(&mut sprite), buf.as_mut_ptr(), 256);
        assert_eq!(len as usize, expected.len());
        assert_eq!(text(&buf), expected);

        let mut small = [0 as c_char; 8];
        assert_eq!(mirror_serialize_to_json(ty, handle(&mut sprite), small.as_mut_ptr(), 8), -1);
        assert_eq!(mirror_last_error(), MirrorErrorCode::BufferTooSmall as u32);

        assert_eq!(mirror_serialize_to_json(c"Nope".as_ptr(), handle(&mut sprite), buf.as_mut_ptr(), 256), 2);
        assert_eq!(text(&buf), "{}");

        let mut copy = Sprite::default();
        assert!(mirror_deserialize_from_json(ty, handle(&mut copy), c"{\"layer\": 9, \"name\": \"copy\"}".as_ptr()));
        assert_eq!((copy.layer, copy.name.as_str()), (9, "copy"));
        assert!(!mirror_deserialize_from_json(ty, handle(&mut copy), c"{\"layer\": true}".as_ptr()));
        assert_eq!(mirror_last_error(), MirrorErrorCode::TypeMismatch as u32);
        assert_eq!(copy.layer, 9);
        assert!(!mirror_deserialize_from_json(ty, handle(&mut copy), c"{\"layer\":".as_ptr()));
        assert_eq!(mirror_last_error(), MirrorErrorCode::InvalidJson as u32);

        let dir = tempfile::tempdir().unwrap();
        let path = CString::new(dir.path().join("sprite.json").to_str().unwrap()).unwrap();
        assert!(mirror_save_to_file(ty, handle(&mut sprite), path.as_ptr()));
        let mut loaded = Sprite::default();
        assert!(mirror_load_from_file(ty, handle(&mut loaded), path.as_ptr()));
        assert_eq!(loaded.name, "hero");
        assert_eq!(loaded.weight, 2.0);

        let missing = CString::new(dir.path().join("missing.json").to_str().unwrap()).unwrap();
        assert!(!mirror_load_from_file(ty, handle(&mut loaded), missing.as_ptr()));
        assert_eq!(mirror_last_error(), MirrorErrorCode::IoError as u32);
    }
}

#[test]
fn protocol_through_handles() {
    mirror::init();
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let (ready_tx, ready_rx) = mpsc::channel();

    let server_thread = thread::spawn(move || unsafe {
        let server = mirror_ipc_server_create();
        assert!(!mirror_ipc_server_is_running(server));
        assert!(mirror_ipc_server_start(server, c"capi-protocol".as_ptr()));
        assert!(mirror_ipc_server_is_running(server));
        ready_tx.send(()).unwrap();

        while !flag.load(Ordering::Relaxed) {
            mirror_ipc_server_update(server);
            thread::sleep(Duration::from_millis(1));
        }
        let event_sent = mirror_ipc_server_send_event(server, MessageType::SceneChanged as u32, c"{}".as_ptr());
        let query_sent = mirror_ipc_server_send_event(server, MessageType::GetTypes as u32, ptr::null());
        mirror_ipc_server_stop(server);
        let running = mirror_ipc_server_is_running(server);
        mirror_ipc_server_destroy(server);
        (event_sent, query_sent, running)
    });
    ready_rx.recv().unwrap();

    unsafe {
        let client = mirror_ipc_client_create();
        assert!(!mirror_ipc_client_is_connected(client));
        assert!(!mirror_ipc_client_connect(client, c"capi-nowhere".as_ptr()));
        assert!(mirror_ipc_client_connect(client, c"capi-protocol".as_ptr()));
        assert!(mirror_ipc_client_is_connected(client));

        let mut buf = [0 as c_char; 512];
        let len = mirror_ipc_client_send_command(
            client,
            MessageType::GetTypeInfo as u32,
            c"{\"typeName\":\"Transform\"}".as_ptr(),
            buf.as_mut_ptr(),
            512,
        );
        assert_eq!(len as usize, text(&buf).len());
        assert!(text(&buf).starts_with(r#"{"name":"Transform","size":16,"fields":[{"name":"x","type":2},"#), "{}", text(&buf));
        assert!(text(&buf).ends_with(r#"{"name":"scale","type":2}]}"#));

        mirror_ipc_client_send_command(client, 99, ptr::null(), buf.as_mut_ptr(), 512);
        assert_eq!(text(&buf), r#"{"error":"Unknown message type"}"#);

        mirror_ipc_client_disconnect(client);
        assert!(!mirror_ipc_client_is_connected(client));
        mirror_ipc_client_send_command(client, MessageType::GetTypes as u32, ptr::null(), buf.as_mut_ptr(), 512);
        assert_eq!(text(&buf), r#"{"error":"Not connected"}"#);
        mirror_ipc_client_destroy(client);
    }

    stop.store(true, Ordering::Relaxed);
    let (event_sent, query_sent, running) = server_thread.join().unwrap();
    assert!(event_sent);
    assert!(!query_sent);
    assert!(!running);
}
