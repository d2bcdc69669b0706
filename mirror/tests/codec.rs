// JSON codec through derived types.

use mirror::demo::{GameObject, Transform};
use mirror::json;
use mirror::prelude::*;

#[derive(Reflect, Default)]
struct Point {
    x: f32,
    y: f32,
}

#[derive(Reflect, Default, Debug, PartialEq)]
struct Settings {
    title: String,
    volume: f64,
    fullscreen: bool,
    fps_cap: i32,
    gamma: f32,
}

fn registry() -> Registry {
    let mut builder = Registry::builder();
    builder
        .register::<Point>()
        .register::<Settings>()
        .register::<Transform>()
        .register::<GameObject>();
    builder.build()
}

#[test]
fn point_serializes_exactly() {
    let registry = registry();
    let point = Point { x: 10.0, y: 20.0 };
    assert_eq!(
        json::serialize(&registry, "Point", Some(&point)),
        "{\n  \"x\": 10.000000,\n  \"y\": 20.000000\n}"
    );
}

#[test]
fn unknown_type_serializes_as_empty_object() {
    let registry = registry();
    assert_eq!(json::serialize(&registry, "DoesNotExist", Some(&Point::default())), "{}");
    assert_eq!(json::serialize(&registry, "Point", None), "{}");
}

#[test]
fn keys_match_fields_in_declaration_order() {
    let registry = registry();
    let settings = Settings {
        title: "Main\tMenu \"1\"".into(),
        volume: 0.8,
        fullscreen: true,
        fps_cap: 144,
        gamma: 2.2,
    };
    let text = json::serialize(&registry, "Settings", Some(&settings));
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    let object = parsed.as_object().unwrap();
    assert_eq!(object.len(), 5);
    assert_eq!(object["title"], "Main\tMenu \"1\"");
    assert_eq!(object["fps_cap"], 144);

    let order: Vec<usize> = ["title", "volume", "fullscreen", "fps_cap", "gamma"]
        .iter()
        .map(|k| text.find(&format!("\"{k}\":")).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
    assert!(text.contains("\"gamma\": 2.200000\n}"));
}

#[test]
fn vector_fields_are_skipped_without_trailing_comma() {
    let registry = registry();
    let object = GameObject::default();
    assert_eq!(
        json::serialize(&registry, "GameObject", Some(&object)),
        "{\n  \"name\": \"GameObject\",\n  \"id\": 0,\n  \"active\": true\n}"
    );
}

#[test]
fn deserialize_round_trip_and_atomicity() {
    let registry = registry();
    let original = Settings {
        title: "Options".into(),
        volume: 0.25,
        fullscreen: true,
        fps_cap: 60,
        gamma: 1.5,
    };
    let text = json::serialize(&registry, "Settings", Some(&original));
    let mut restored = Settings::default();
    json::deserialize(&registry, "Settings", &mut restored, &text).unwrap();
    assert_eq!(restored, original);

    let before = restored.clone_fields();
    let err = json::deserialize(&registry, "Settings", &mut restored, r#"{"volume": 1.0, "fullscreen": "yes"}"#);
    assert!(matches!(err, Err(MirrorError::TypeMismatch { .. })));
    assert_eq!(restored.clone_fields(), before);

    json::deserialize(&registry, "Settings", &mut restored, r#"{"volume": 1, "unknown": {"a": 1}}"#).unwrap();
    assert_eq!(restored.volume, 1.0);
}

#[test]
fn files_round_trip() {
    let registry = registry();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transform.json");

    let transform = Transform { x: 1.5, y: -2.0, rotation: 90.0, scale: 2.0 };
    json::save_to_file(&registry, "Transform", &transform, &path).unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        json::serialize(&registry, "Transform", Some(&transform))
    );

    let mut loaded = Transform::default();
    json::load_from_file(&registry, "Transform", &mut loaded, &path).unwrap();
    assert_eq!(loaded, transform);

    assert!(json::load_from_file(&registry, "Transform", &mut loaded, dir.path().join("nope.json")).is_err());
    assert!(json::save_to_file(&registry, "Nope", &transform, &path).is_err());
}

impl Settings {
    fn clone_fields(&self) -> (String, f64, bool, i32, f32) {
        (self.title.clone(), self.volume, self.fullscreen, self.fps_cap, self.gamma)
    }
}
