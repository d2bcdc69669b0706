// Registry and typed field access through derived types.

use mirror::prelude::*;

#[derive(Reflect, Default, Debug, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

#[derive(Reflect, Default)]
#[reflect(name = "Enemy")]
struct EnemyState {
    health: f32,
    level: i32,
    #[reflect(rename = "displayName")]
    display_name: String,
    boss: bool,
    accuracy: f64,
    heading: Vec3,
    tint: Color,
    #[reflect(skip)]
    path_cache: Vec<u32>,
    #[reflect(custom)]
    loot: Vec<String>,
}

fn registry() -> Registry {
    let mut builder = Registry::builder();
    builder.register::<Point>().register::<EnemyState>();
    builder.build()
}

#[test]
fn point_descriptor_matches_layout() {
    let registry = registry();
    let desc = registry.get_type("Point").unwrap();
    assert_eq!(desc.size_bytes(), 8);
    let fields: Vec<(&str, FieldKind, usize)> =
        desc.fields().iter().map(|f| (f.name(), f.kind(), f.byte_offset())).collect();
    assert_eq!(fields, [("x", FieldKind::Float, 0), ("y", FieldKind::Float, 4)]);
}

#[test]
fn registration_round_trips() {
    let registry = registry();
    assert_eq!(registry.get_type("Enemy"), Some(&EnemyState::describe()));
    assert!(registry.get_type("EnemyState").is_none());
}

#[test]
fn two_types_are_counted_and_indexed() {
    let registry = registry();
    assert_eq!(registry.type_count(), 2);
    let mut names = vec![
        registry.type_name(0).unwrap().to_string(),
        registry.type_name(1).unwrap().to_string(),
    ];
    names.sort();
    assert_eq!(names, ["Enemy", "Point"]);
    assert_eq!(registry.list_type_names().len(), 2);
}

#[test]
fn attributes_shape_the_descriptor() {
    let desc = EnemyState::describe();
    let names: Vec<&str> = desc.fields().iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        ["health", "level", "displayName", "boss", "accuracy", "heading", "tint", "loot"]
    );
    let loot = desc.field("loot").unwrap();
    assert_eq!(loot.kind(), FieldKind::Custom);
    assert!(!loot.has_accessor());
    assert!(desc.field("path_cache").is_none());
}

#[test]
fn read_after_write_for_every_field() {
    let registry = registry();
    let mut enemy = EnemyState::default();

    registry.set_field("Enemy", "health", &mut enemy, 75.5f32).unwrap();
    registry.set_field("Enemy", "level", &mut enemy, 12).unwrap();
    registry.set_field("Enemy", "displayName", &mut enemy, "Goblin".to_string()).unwrap();
    registry.set_field("Enemy", "boss", &mut enemy, true).unwrap();
    registry.set_field("Enemy", "accuracy", &mut enemy, 0.125f64).unwrap();
    registry.set_field("Enemy", "heading", &mut enemy, Vec3::X).unwrap();
    registry.set_field("Enemy", "tint", &mut enemy, Color::GREEN).unwrap();

    assert_eq!(registry.get_field::<f32>("Enemy", "health", &enemy).unwrap(), 75.5);
    assert_eq!(registry.get_field::<i32>("Enemy", "level", &enemy).unwrap(), 12);
    assert_eq!(registry.get_field::<String>("Enemy", "displayName", &enemy).unwrap(), "Goblin");
    assert!(registry.get_field::<bool>("Enemy", "boss", &enemy).unwrap());
    assert_eq!(registry.get_field::<f64>("Enemy", "accuracy", &enemy).unwrap(), 0.125);
    assert_eq!(registry.get_field::<Vec3>("Enemy", "heading", &enemy).unwrap(), Vec3::X);
    assert_eq!(registry.get_field::<Color>("Enemy", "tint", &enemy).unwrap(), Color::GREEN);
    assert_eq!(enemy.display_name, "Goblin");
}

#[test]
fn access_errors() {
    let registry = registry();
    let mut point = Point::default();
    let mut enemy = EnemyState::default();

    assert!(matches!(
        registry.get_field::<f32>("Point", "z", &point),
        Err(MirrorError::FieldNotFound { .. })
    ));
    assert!(matches!(
        registry.set_field("Point", "x", &mut point, 1i32),
        Err(MirrorError::TypeMismatch { .. })
    ));
    assert!(matches!(
        registry.set_field("Point", "x", &mut enemy, 1.0f32),
        Err(MirrorError::InstanceMismatch(_))
    ));
    assert!(matches!(
        registry.get_value("Enemy", "loot", &enemy),
        Err(MirrorError::NoAccessor(_))
    ));
    assert_eq!(point, Point::default());
}

#[test]
fn link_time_registration_includes_derived_types() {
    let registry = Registry::from_inventory();
    for name in ["Point", "Enemy", "Transform", "GameObject"] {
        assert!(registry.get_type(name).is_some(), "{name} missing");
    }
}
