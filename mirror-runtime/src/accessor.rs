// Typed field access by type and field name.
//
// Resolution order: type, field, declared kind, instance type, accessor.
// The first failing step decides the error.

use std::any::Any;

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::{MirrorError, MirrorResult};
use crate::registry::Registry;
use crate::traits::FieldType;
use crate::value::FieldValue;

impl Registry {
    /// Look up a type and one of its fields.
    pub fn resolve(
        &self,
        type_name: &str,
        field_name: &str,
    ) -> MirrorResult<(&TypeDescriptor, &FieldDescriptor)> {
        let desc = self
            .get_type(type_name)
            .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
        let field = desc.require_field(field_name)?;
        Ok((desc, field))
    }

    /// Read a field as its storage type `V`.
    pub fn get_field<V: FieldType>(
        &self,
        type_name: &str,
        field_name: &str,
        instance: &dyn Any,
    ) -> MirrorResult<V> {
        let (desc, field) = self.resolve(type_name, field_name)?;
        expect_kind::<V>(field)?;
        desc.check_instance(instance)?;
        let value = field.read(instance)?;
        let found = value.kind();
        V::from_value(value).ok_or(MirrorError::TypeMismatch {
            expected: V::KIND,
            found,
        })
    }

    /// Write a field from its storage type `V`.
    pub fn set_field<V: FieldType>(
        &self,
        type_name: &str,
        field_name: &str,
        instance: &mut dyn Any,
        value: V,
    ) -> MirrorResult<()> {
        let (desc, field) = self.resolve(type_name, field_name)?;
        expect_kind::<V>(field)?;
        desc.check_instance(instance)?;
        field.write(instance, value.into_value())
    }

    /// Read a field without naming its storage type.
    pub fn get_value(
        &self,
        type_name: &str,
        field_name: &str,
        instance: &dyn Any,
    ) -> MirrorResult<FieldValue> {
        let (desc, field) = self.resolve(type_name, field_name)?;
        desc.check_instance(instance)?;
        field.read(instance)
    }

    /// Write a dynamically typed value; its kind must match the field's.
    pub fn set_value(
        &self,
        type_name: &str,
        field_name: &str,
        instance: &mut dyn Any,
        value: FieldValue,
    ) -> MirrorResult<()> {
        let (desc, field) = self.resolve(type_name, field_name)?;
        desc.check_instance(instance)?;
        field.write(instance, value)
    }
}

fn expect_kind<V: FieldType>(field: &FieldDescriptor) -> MirrorResult<()> {
    if field.kind() == V::KIND {
        Ok(())
    } else {
        Err(MirrorError::TypeMismatch {
            expected: field.kind(),
            found: V::KIND,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    use glam::Vec2;
    use mirror_ffi::FieldKind;

    use crate::math::Color;

    #[derive(Default)]
    struct Actor {
        name: String,
        hp: i32,
        alive: bool,
        pos: Vec2,
        tint: Color,
    }

    fn registry() -> Registry {
        let desc = TypeDescriptor::of::<Actor>("Actor")
            .with_field(FieldDescriptor::bound(
                "name",
                offset_of!(Actor, name),
                |a: &Actor| &a.name,
                |a: &mut Actor| &mut a.name,
            ))
            .with_field(FieldDescriptor::bound(
                "hp",
                offset_of!(Actor, hp),
                |a: &Actor| &a.hp,
                |a: &mut Actor| &mut a.hp,
            ))
            .with_field(FieldDescriptor::bound(
                "alive",
                offset_of!(Actor, alive),
                |a: &Actor| &a.alive,
                |a: &mut Actor| &mut a.alive,
            ))
            .with_field(FieldDescriptor::bound(
                "pos",
                offset_of!(Actor, pos),
                |a: &Actor| &a.pos,
                |a: &mut Actor| &mut a.pos,
            ))
            .with_field(FieldDescriptor::bound(
                "tint",
                offset_of!(Actor, tint),
                |a: &Actor| &a.tint,
                |a: &mut Actor| &mut a.tint,
            ))
            .with_field(FieldDescriptor::opaque("blob", FieldKind::Custom, 0));
        let mut builder = Registry::builder();
        builder.register_descriptor(desc);
        builder.build()
    }

    #[test]
    fn read_after_write_for_every_kind() {
        let reg = registry();
        let mut actor = Actor::default();

        reg.set_field("Actor", "name", &mut actor, "hero".to_string()).unwrap();
        reg.set_field("Actor", "hp", &mut actor, 42).unwrap();
        reg.set_field("Actor", "alive", &mut actor, true).unwrap();
        reg.set_field("Actor", "pos", &mut actor, Vec2::new(1.0, 2.0)).unwrap();
        reg.set_field("Actor", "tint", &mut actor, Color::RED).unwrap();

        assert_eq!(reg.get_field::<String>("Actor", "name", &actor).unwrap(), "hero");
        assert_eq!(reg.get_field::<i32>("Actor", "hp", &actor).unwrap(), 42);
        assert!(reg.get_field::<bool>("Actor", "alive", &actor).unwrap());
        assert_eq!(reg.get_field::<Vec2>("Actor", "pos", &actor).unwrap(), Vec2::new(1.0, 2.0));
        assert_eq!(reg.get_field::<Color>("Actor", "tint", &actor).unwrap(), Color::RED);
        assert_eq!(actor.hp, 42);
    }

    #[test]
    fn failures_are_typed() {
        let reg = registry();
        let mut actor = Actor::default();

        assert!(matches!(
            reg.get_field::<i32>("Nope", "hp", &actor),
            Err(MirrorError::TypeNotFound(_))
        ));
        assert!(matches!(
            reg.get_field::<i32>("Actor", "mana", &actor),
            Err(MirrorError::FieldNotFound { .. })
        ));
        assert!(matches!(
            reg.get_field::<f32>("Actor", "hp", &actor),
            Err(MirrorError::TypeMismatch { expected: FieldKind::Int, found: FieldKind::Float })
        ));
        assert!(matches!(
            reg.set_field("Actor", "hp", &mut 0u8, 1),
            Err(MirrorError::InstanceMismatch(_))
        ));
        assert!(matches!(
            reg.get_value("Actor", "blob", &actor),
            Err(MirrorError::NoAccessor(_))
        ));
        assert!(reg.set_value("Actor", "hp", &mut actor, FieldValue::Bool(true)).is_err());
        assert_eq!(actor.hp, 0);
    }

    #[test]
    fn dynamic_values_follow_the_same_rules() {
        let reg = registry();
        let mut actor = Actor::default();
        reg.set_value("Actor", "hp", &mut actor, FieldValue::Int(7)).unwrap();
        assert_eq!(reg.get_value("Actor", "hp", &actor).unwrap(), FieldValue::Int(7));
    }
}
