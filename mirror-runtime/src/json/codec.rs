// Registry-driven JSON codec.
//
// Only scalar fields (Bool, Int, Float, Double, String) with a bound accessor
// take part. Serialization never fails: unknown types and wrong instances
// yield `{}`. Deserialization is all-or-nothing.

use std::any::Any;
use std::fs;
use std::path::Path;

use mirror_ffi::FieldKind;
use serde_json::Value;

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::{MirrorError, MirrorResult};
use crate::json::writer::{Layout, ObjectWriter};
use crate::registry::Registry;
use crate::value::FieldValue;

const EMPTY: &str = "{}";

fn takes_part(field: &FieldDescriptor) -> bool {
    field.kind().is_scalar() && field.has_accessor()
}

fn write_members(desc: &TypeDescriptor, instance: &dyn Any, layout: Layout) -> MirrorResult<String> {
    desc.check_instance(instance)?;
    let mut w = ObjectWriter::new(layout);
    for field in desc.fields().iter().filter(|f| takes_part(f)) {
        match field.read(instance)? {
            FieldValue::Bool(v) => w.bool(field.name(), v),
            FieldValue::Int(v) => w.int(field.name(), v),
            FieldValue::Float(v) => w.number(field.name(), f64::from(v)),
            FieldValue::Double(v) => w.number(field.name(), v),
            FieldValue::String(v) => w.string(field.name(), &v),
            other => {
                log::trace!("{}.{}: skipping {:?} value", desc.name(), field.name(), other.kind());
            }
        }
    }
    Ok(w.finish())
}

/// Serialize `instance` as a multi-line JSON object of its scalar fields.
///
/// Returns exactly `{}` when the type is unknown, the instance is absent or
/// the instance is not of the registered type.
pub fn serialize(registry: &Registry, type_name: &str, instance: Option<&dyn Any>) -> String {
    let (Some(desc), Some(instance)) = (registry.get_type(type_name), instance) else {
        return EMPTY.to_string();
    };
    match write_members(desc, instance, Layout::Pretty) {
        Ok(json) => json,
        Err(err) => {
            log::debug!("serialize {type_name}: {err}");
            EMPTY.to_string()
        }
    }
}

/// Single-line variant of [`serialize`] used in protocol payloads. Unlike
/// `serialize`, failures are reported.
pub fn serialize_compact(registry: &Registry, type_name: &str, instance: &dyn Any) -> MirrorResult<String> {
    let desc = registry
        .get_type(type_name)
        .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
    write_members(desc, instance, Layout::Compact)
}

/// Convert one JSON value to the value of a scalar field.
///
/// Numbers are accepted for every numeric kind. Integral numbers outside the
/// `i32` range do not fit an Int field; fractional numbers are truncated.
pub fn value_from_json(field: &FieldDescriptor, json: &Value) -> MirrorResult<FieldValue> {
    let mismatch = || MirrorError::TypeMismatch {
        expected: field.kind(),
        found: json_kind(json),
    };
    let value = match field.kind() {
        FieldKind::Bool => json.as_bool().map(FieldValue::Bool),
        FieldKind::Int => match (json.as_i64(), json.as_f64()) {
            (Some(i), _) => i32::try_from(i).ok().map(FieldValue::Int),
            (None, Some(f)) if f.is_finite() && f >= i32::MIN as f64 && f <= i32::MAX as f64 => {
                Some(FieldValue::Int(f.trunc() as i32))
            }
            _ => None,
        },
        FieldKind::Float => json.as_f64().map(|f| FieldValue::Float(f as f32)),
        FieldKind::Double => json.as_f64().map(FieldValue::Double),
        FieldKind::String => json.as_str().map(|s| FieldValue::String(s.to_string())),
        _ => None,
    };
    value.ok_or_else(mismatch)
}

/// Closest field kind for a JSON value, used in mismatch errors.
fn json_kind(json: &Value) -> FieldKind {
    match json {
        Value::Bool(_) => FieldKind::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldKind::Int,
        Value::Number(_) => FieldKind::Double,
        Value::String(_) => FieldKind::String,
        _ => FieldKind::Custom,
    }
}

/// Apply a JSON object to `instance`.
///
/// Every matched member is validated before any field is written, so a
/// failure leaves the instance untouched. Keys without a matching scalar
/// field are ignored.
pub fn deserialize(registry: &Registry, type_name: &str, instance: &mut dyn Any, json: &str) -> MirrorResult<()> {
    let desc = registry
        .get_type(type_name)
        .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
    desc.check_instance(instance)?;

    let parsed: Value = serde_json::from_str(json)?;
    let Value::Object(members) = parsed else {
        return Err(MirrorError::InvalidJson("expected a JSON object".into()));
    };

    let mut staged = Vec::new();
    for field in desc.fields().iter().filter(|f| takes_part(f)) {
        if let Some(json_value) = members.get(field.name()) {
            staged.push((field, value_from_json(field, json_value)?));
        }
    }
    for (field, value) in staged {
        field.write(instance, value)?;
    }
    Ok(())
}

/// Serialize to `path`, overwriting the whole file.
pub fn save_to_file(registry: &Registry, type_name: &str, instance: &dyn Any, path: impl AsRef<Path>) -> MirrorResult<()> {
    let desc = registry
        .get_type(type_name)
        .ok_or_else(|| MirrorError::TypeNotFound(type_name.to_string()))?;
    let json = write_members(desc, instance, Layout::Pretty)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read the whole file at `path` and [`deserialize`] it.
pub fn load_from_file(registry: &Registry, type_name: &str, instance: &mut dyn Any, path: impl AsRef<Path>) -> MirrorResult<()> {
    if registry.get_type(type_name).is_none() {
        return Err(MirrorError::TypeNotFound(type_name.to_string()));
    }
    let json = fs::read_to_string(path)?;
    deserialize(registry, type_name, instance, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    use glam::Vec2;

    use crate::descriptor::FieldDescriptor;

    #[derive(Default, Debug, PartialEq)]
    struct Sample {
        flag: bool,
        count: i32,
        ratio: f32,
        precise: f64,
        label: String,
        at: Vec2,
    }

    fn registry() -> Registry {
        let desc = TypeDescriptor::of::<Sample>("Sample")
            .with_field(FieldDescriptor::bound("flag", offset_of!(Sample, flag), |s: &Sample| &s.flag, |s: &mut Sample| &mut s.flag))
            .with_field(FieldDescriptor::bound("count", offset_of!(Sample, count), |s: &Sample| &s.count, |s: &mut Sample| &mut s.count))
            .with_field(FieldDescriptor::bound("ratio", offset_of!(Sample, ratio), |s: &Sample| &s.ratio, |s: &mut Sample| &mut s.ratio))
            .with_field(FieldDescriptor::bound("precise", offset_of!(Sample, precise), |s: &Sample| &s.precise, |s: &mut Sample| &mut s.precise))
            .with_field(FieldDescriptor::bound("label", offset_of!(Sample, label), |s: &Sample| &s.label, |s: &mut Sample| &mut s.label))
            .with_field(FieldDescriptor::bound("at", offset_of!(Sample, at), |s: &Sample| &s.at, |s: &mut Sample| &mut s.at));
        let mut builder = Registry::builder();
        builder.register_descriptor(desc);
        builder.build()
    }

    fn sample() -> Sample {
        Sample {
            flag: true,
            count: -4,
            ratio: 0.5,
            precise: 2.25,
            label: "say \"hi\"".into(),
            at: Vec2::new(1.0, 2.0),
        }
    }

    #[test]
    fn serialize_skips_vectors_without_trailing_comma() {
        let reg = registry();
        let json = serialize(&reg, "Sample", Some(&sample()));
        assert_eq!(
            json,
            "{\n  \"flag\": true,\n  \"count\": -4,\n  \"ratio\": 0.500000,\n  \"precise\": 2.250000,\n  \"label\": \"say \\\"hi\\\"\"\n}"
        );
    }

    #[test]
    fn serialize_fails_soft() {
        let reg = registry();
        assert_eq!(serialize(&reg, "Nope", Some(&sample())), "{}");
        assert_eq!(serialize(&reg, "Sample", None), "{}");
        assert_eq!(serialize(&reg, "Sample", Some(&5u32)), "{}");
    }

    #[test]
    fn serialized_keys_follow_declaration_order() {
        let reg = registry();
        let json = serialize(&reg, "Sample", Some(&sample()));
        let parsed: Value = serde_json::from_str(&json).unwrap();
        let object = parsed.as_object().unwrap();
        assert_eq!(object.len(), 5);
        let positions: Vec<usize> = ["flag", "count", "ratio", "precise", "label"]
            .iter()
            .map(|k| json.find(&format!("\"{k}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn compact_form() {
        let reg = registry();
        let mut s = sample();
        s.label = "x".into();
        assert_eq!(
            serialize_compact(&reg, "Sample", &s).unwrap(),
            r#"{"flag":true,"count":-4,"ratio":0.500000,"precise":2.250000,"label":"x"}"#
        );
        assert!(serialize_compact(&reg, "Nope", &s).is_err());
    }

    #[test]
    fn deserialize_restores_serialized_values() {
        let reg = registry();
        let original = sample();
        let json = serialize(&reg, "Sample", Some(&original));

        let mut restored = Sample::default();
        deserialize(&reg, "Sample", &mut restored, &json).unwrap();
        assert_eq!(restored.flag, original.flag);
        assert_eq!(restored.count, original.count);
        assert_eq!(restored.ratio, original.ratio);
        assert_eq!(restored.precise, original.precise);
        assert_eq!(restored.label, original.label);
        assert_eq!(restored.at, Vec2::ZERO);
    }

    #[test]
    fn deserialize_is_all_or_nothing() {
        let reg = registry();
        let mut s = Sample::default();
        let err = deserialize(&reg, "Sample", &mut s, r#"{"count": 3, "label": 7}"#).unwrap_err();
        assert!(matches!(err, MirrorError::TypeMismatch { expected: FieldKind::String, .. }));
        assert_eq!(s, Sample::default());
    }

    #[test]
    fn deserialize_number_rules() {
        let reg = registry();
        let mut s = Sample::default();
        deserialize(&reg, "Sample", &mut s, r#"{"count": 7.9, "ratio": 3, "precise": 1, "extra": [1, 2]}"#).unwrap();
        assert_eq!(s.count, 7);
        assert_eq!(s.ratio, 3.0);
        assert_eq!(s.precise, 1.0);

        assert!(deserialize(&reg, "Sample", &mut s, r#"{"count": 3000000000}"#).is_err());
        assert!(deserialize(&reg, "Sample", &mut s, r#"{"flag": 1}"#).is_err());
        assert!(deserialize(&reg, "Sample", &mut s, r#"{"count": null}"#).is_err());
        assert_eq!(s.count, 7);
    }

    #[test]
    fn deserialize_rejects_bad_input() {
        let reg = registry();
        let mut s = Sample::default();
        assert!(matches!(deserialize(&reg, "Sample", &mut s, "[1]"), Err(MirrorError::InvalidJson(_))));
        assert!(matches!(deserialize(&reg, "Sample", &mut s, "{"), Err(MirrorError::InvalidJson(_))));
        assert!(matches!(deserialize(&reg, "Nope", &mut s, "{}"), Err(MirrorError::TypeNotFound(_))));
        assert!(matches!(deserialize(&reg, "Sample", &mut 1u8, "{}"), Err(MirrorError::InstanceMismatch(_))));
    }

    #[test]
    fn file_round_trip() {
        let reg = registry();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");

        save_to_file(&reg, "Sample", &sample(), &path).unwrap();
        let mut loaded = Sample::default();
        load_from_file(&reg, "Sample", &mut loaded, &path).unwrap();
        assert_eq!(loaded.label, sample().label);
        assert_eq!(loaded.count, -4);

        assert!(matches!(
            save_to_file(&reg, "Nope", &sample(), dir.path().join("x.json")),
            Err(MirrorError::TypeNotFound(_))
        ));
        assert!(matches!(
            load_from_file(&reg, "Sample", &mut loaded, dir.path().join("missing.json")),
            Err(MirrorError::Io(_))
        ));
    }
}
