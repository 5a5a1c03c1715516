//! JSON representation of instances for the `encode` and `decode` commands.
//!
//! Scalars map to JSON numbers, byte strings to JSON strings, vectors to
//! arrays, and sparse values to `{"values": [...], "indices": [...]}`. Byte
//! strings that are not valid UTF-8 are written as `{"base64": "..."}`, which
//! is accepted again on input.

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Map, Value};
use tft_coders::{FeatureSpec, FeatureValue, Instance, Scalar, Schema, Sequence};

/// Key of the object that carries a non-UTF-8 byte string.
const BASE64_KEY: &str = "base64";

/// Converts a decoded instance to a JSON object.
pub fn instance_to_json(instance: &Instance) -> Value {
    let object: Map<String, Value> = instance
        .iter()
        .map(|(name, value)| (name.to_string(), value_to_json(value)))
        .collect();
    Value::Object(object)
}

fn value_to_json(value: &FeatureValue) -> Value {
    match value {
        FeatureValue::Scalar(scalar) => scalar_to_json(scalar),
        FeatureValue::Sequence(sequence) => sequence_to_json(sequence),
        FeatureValue::Sparse { values, indices } => json!({
            "values": sequence_to_json(values),
            "indices": sequence_to_json(indices),
        }),
    }
}

fn sequence_to_json(sequence: &Sequence) -> Value {
    Value::Array(
        (0..sequence.len())
            .filter_map(|i| sequence.get(i))
            .map(|scalar| scalar_to_json(&scalar))
            .collect(),
    )
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Int(v) => json!(v),
        // Non-finite floats have no JSON form.
        Scalar::Float(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Scalar::Bytes(v) => match std::str::from_utf8(v) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => json!({ BASE64_KEY: STANDARD.encode(v) }),
        },
    }
}

/// Builds an instance from a JSON object, shaping each entry by its spec.
///
/// Keys the schema does not name are ignored, as are `null` entries; the
/// codec reports any feature that is required but missing.
pub fn instance_from_json(schema: &Schema, value: &Value) -> Result<Instance> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("expected a JSON object, got {}", json_kind(value)))?;

    let mut instance = Instance::new();
    for (name, spec) in schema.iter() {
        let Some(entry) = object.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        let value = match spec {
            FeatureSpec::Sparse { .. } => sparse_from_json(entry),
            _ => dense_from_json(entry),
        }
        .with_context(|| format!("Invalid value for feature {name}"))?;
        instance.insert(name, value);
    }
    Ok(instance)
}

fn dense_from_json(value: &Value) -> Result<FeatureValue> {
    match value {
        Value::Array(_) => Ok(FeatureValue::Sequence(list_from_json(value)?)),
        _ => Ok(FeatureValue::Scalar(scalar_from_json(value)?)),
    }
}

fn sparse_from_json(value: &Value) -> Result<FeatureValue> {
    let field = |key: &str| {
        value
            .get(key)
            .ok_or_else(|| anyhow!("sparse value needs \"values\" and \"indices\" arrays"))
            .and_then(list_from_json)
    };
    Ok(FeatureValue::Sparse {
        values: field("values")?,
        indices: field("indices")?,
    })
}

/// Flattens nested arrays in row-major order.
fn list_from_json(value: &Value) -> Result<Sequence> {
    fn flatten(value: &Value, out: &mut Vec<Scalar>) -> Result<()> {
        match value {
            Value::Array(items) => items.iter().try_for_each(|item| flatten(item, out)),
            other => {
                out.push(scalar_from_json(other)?);
                Ok(())
            }
        }
    }

    if !value.is_array() {
        bail!("expected an array, got {}", json_kind(value));
    }
    let mut items = Vec::new();
    flatten(value, &mut items)?;
    Ok(Sequence::List(items))
}

fn scalar_from_json(value: &Value) -> Result<Scalar> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float))
            .ok_or_else(|| anyhow!("unrepresentable number {n}")),
        Value::String(s) => Ok(Scalar::Bytes(s.as_bytes().to_vec())),
        Value::Object(map) if map.len() == 1 => match map.get(BASE64_KEY) {
            Some(Value::String(encoded)) => STANDARD
                .decode(encoded)
                .map(Scalar::Bytes)
                .context("Invalid base64 byte string"),
            _ => bail!("expected a number, string or {{\"{BASE64_KEY}\": ...}} object"),
        },
        other => bail!("expected a number or string, got {}", json_kind(other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
