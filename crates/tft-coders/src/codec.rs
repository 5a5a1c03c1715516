//! The schema-driven `tf.Example` codec.
//!
//! ```
//! use tft_coders::{Dtype, ExampleCodec, FeatureSpec, FeatureValue, Instance, Scalar, Schema};
//!
//! let schema = Schema::new([
//!     ("a", FeatureSpec::scalar(Dtype::Int)),
//!     ("b", FeatureSpec::var_len(Dtype::Float)),
//!     ("s", FeatureSpec::sparse("idx", "val", Dtype::Float, 10)),
//! ])
//! .unwrap();
//! let mut codec = ExampleCodec::new(schema);
//!
//! let instance = Instance::new()
//!     .with("a", Scalar::Int(12))
//!     .with("b", vec![89.0f32])
//!     .with("s", FeatureValue::sparse(vec![12.0f32, 20.0], vec![1i64, 4]));
//!
//! let bytes = codec.encode(&instance).unwrap();
//! assert_eq!(codec.decode(&bytes).unwrap(), instance);
//! ```

use std::fmt;
use std::sync::Arc;

use prost::Message;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tft_proto::{Example, Features};

use crate::coerce::kind_matches;
use crate::error::{CoderError, Result};
use crate::handler::{compile, FeatureHandler, WireFields};
use crate::schema::{FeatureSpec, Schema};
use crate::value::Instance;

/// Encodes [`Instance`]s to serialized `tf.Example` bytes and back.
///
/// Strategies for every feature are compiled once, in [`ExampleCodec::new`].
/// Encode refills one scratch record, reusing its list allocations, and
/// therefore takes `&mut self`; give each thread its own codec built from the
/// same shared [`Schema`]. Decode parses into a fresh record and only needs
/// `&self`.
pub struct ExampleCodec {
    schema: Arc<Schema>,
    handlers: Vec<Box<dyn FeatureHandler>>,
    /// Never part of the codec's identity: clones and relocated codecs
    /// start empty.
    scratch: Example,
}

impl ExampleCodec {
    /// Compiles a codec for `schema`.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        let schema = schema.into();
        let handlers: Vec<Box<dyn FeatureHandler>> =
            schema.iter().map(|(name, spec)| compile(name, spec)).collect();
        tracing::debug!(
            features = schema.len(),
            wire_fields = schema.wire_fields().count(),
            "Compiled example codec"
        );
        Self {
            schema,
            handlers,
            scratch: Example::default(),
        }
    }

    /// Validates `(name, spec)` pairs and compiles a codec for them.
    pub fn from_specs<I, K>(features: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FeatureSpec)>,
        K: Into<String>,
    {
        Ok(Self::new(Schema::new(features)?))
    }

    /// The schema this codec was built from.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A shared handle to the schema, for building sibling codecs.
    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Decodes serialized `tf.Example` bytes into an instance holding every
    /// schema feature.
    ///
    /// # Errors
    ///
    /// Returns [`CoderError::MalformedRecord`] if the bytes do not parse, a
    /// wire field holds the wrong list variant, a FixedLen feature has the
    /// wrong number of values, or a sparse feature is inconsistent.
    pub fn decode(&self, bytes: &[u8]) -> Result<Instance> {
        let record = Example::decode(bytes)?;
        let mut fields = record.features.unwrap_or_default().feature;

        check_wire_kinds(&self.schema, &fields)?;

        let mut instance = Instance::new();
        for handler in &self.handlers {
            let value = handler.decode(&mut fields)?;
            instance.insert(handler.name(), value);
        }
        Ok(instance)
    }

    /// Encodes an instance into serialized `tf.Example` bytes.
    ///
    /// Every wire field of the schema is written, including empty ones.
    /// Instance entries the schema does not name are ignored.
    ///
    /// # Errors
    ///
    /// - [`CoderError::MissingFeature`] if a non-VarLen feature is absent.
    /// - [`CoderError::FeatureShape`] if a FixedLen length or sparse pairing
    ///   is violated.
    /// - [`CoderError::InvalidValue`] if values cannot be coerced to the
    ///   feature's dtype.
    pub fn encode(&mut self, instance: &Instance) -> Result<Vec<u8>> {
        let fields = &mut self
            .scratch
            .features
            .get_or_insert_with(Features::default)
            .feature;
        for handler in &self.handlers {
            handler.encode(instance.get(handler.name()), fields)?;
        }
        Ok(self.scratch.encode_to_vec())
    }
}

/// Rejects wire fields whose list variant disagrees with the schema.
/// Fields the schema does not name are left alone.
fn check_wire_kinds(schema: &Schema, fields: &WireFields) -> Result<()> {
    for (wire_name, feature) in fields {
        let (Some(field), Some(kind)) = (schema.wire_field(wire_name), feature.kind.as_ref())
        else {
            continue;
        };
        if !kind_matches(kind, field.dtype) {
            return Err(CoderError::malformed(format!(
                "wire field {wire_name} of feature {} holds a {}, expected a {}",
                schema.feature_name(field.feature).unwrap_or_default(),
                kind.name(),
                field.dtype.wire_kind()
            )));
        }
    }
    Ok(())
}

impl Clone for ExampleCodec {
    /// Recompiles from the shared schema; scratch state is not copied.
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.schema))
    }
}

impl fmt::Debug for ExampleCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExampleCodec")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ExampleCodec {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
    }
}

impl Serialize for ExampleCodec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.schema.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExampleCodec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Schema::deserialize(deserializer).map(Self::new)
    }
}
