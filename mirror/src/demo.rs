// Demo reflected types used by the CLI and the integration tests.

use std::sync::Arc;

use glam::Vec2;

use crate::Reflect;
use mirror_runtime::ipc::{ObjectTable, SharedObjects};
use mirror_runtime::{mlog, MirrorResult, Registry, LOG_DISPLAY};

/// 2D placement of a scene object.
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Transform { x: 0.0, y: 0.0, rotation: 0.0, scale: 1.0 }
    }
}

#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct GameObject {
    pub name: String,
    pub id: i32,
    pub active: bool,
    /// Reflected as Vector2: visible to tooling, skipped by the JSON codec.
    pub position: Vec2,
}

impl Default for GameObject {
    fn default() -> Self {
        GameObject {
            name: "GameObject".to_string(),
            id: 0,
            active: true,
            position: Vec2::ZERO,
        }
    }
}

/// Registry holding exactly the demo types.
pub fn demo_registry() -> Registry {
    let mut builder = Registry::builder();
    builder.register::<Transform>().register::<GameObject>();
    builder.build()
}

/// A small scene: one transform and two game objects.
pub fn demo_scene(registry: Arc<Registry>) -> MirrorResult<SharedObjects> {
    let mut table = ObjectTable::new(registry);
    table.insert(Transform { x: 10.0, y: 20.0, rotation: 45.0, scale: 1.0 })?;
    table.insert(GameObject { name: "Player".into(), id: 1, ..GameObject::default() })?;
    table.insert(GameObject {
        name: "Crate".into(),
        id: 2,
        active: false,
        position: Vec2::new(3.0, -1.5),
    })?;
    mlog!(LOG_DISPLAY, "demo scene ready with {} objects", table.len());
    Ok(table.into_shared())
}

/// Default-constructed instance of a demo type, by registry name.
pub fn default_instance(type_name: &str) -> Option<Box<dyn std::any::Any + Send>> {
    match type_name {
        Transform::REFLECT_NAME => Some(Box::new(Transform::default())),
        GameObject::REFLECT_NAME => Some(Box::new(GameObject::default())),
        _ => None,
    }
}
