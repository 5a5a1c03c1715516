//! Schema model: the per-feature shape and dtype contract.
//!
//! A [`Schema`] is an ordered list of named [`FeatureSpec`]s plus a derived
//! index from wire-field name to the feature that owns it. Dense features
//! (FixedLen, VarLen) own one wire field named after the feature; a sparse
//! feature owns two, its `index_key` and its `value_key`. Wire-field names
//! are unique across the whole schema.
//!
//! Schemas are usually loaded from JSON. Document order is schema order:
//!
//! ```
//! use tft_coders::schema::{Dtype, FeatureSpec, Schema};
//!
//! let schema = Schema::from_json_str(r#"{
//!     "a": {"fixed_len": {"shape": [], "dtype": "int"}},
//!     "b": {"var_len": {"dtype": "float"}},
//!     "s": {"sparse": {"index_key": "idx", "value_key": "val", "dtype": "float", "size": 10}}
//! }"#).unwrap();
//!
//! assert_eq!(schema.len(), 3);
//! assert_eq!(schema.get("b"), Some(&FeatureSpec::var_len(Dtype::Float)));
//! assert!(schema.wire_field("idx").is_some());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoderError, Result};

/// Element type of a feature, and the wire list variant that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    /// 64-bit integers, carried in an `int64_list`.
    #[serde(alias = "int64")]
    Int,
    /// 32-bit floats, carried in a `float_list`.
    #[serde(alias = "float32")]
    Float,
    /// Byte strings, carried in a `bytes_list`.
    #[serde(alias = "string")]
    Bytes,
}

impl Dtype {
    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Dtype::Int => "int",
            Dtype::Float => "float",
            Dtype::Bytes => "bytes",
        }
    }

    /// Proto field name of the wire list variant for this dtype.
    pub fn wire_kind(self) -> &'static str {
        match self {
            Dtype::Int => "int64_list",
            Dtype::Float => "float_list",
            Dtype::Bytes => "bytes_list",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape and type contract of one logical feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSpec {
    /// Exactly `product(shape)` values. An empty shape is a scalar.
    FixedLen {
        /// Dimensions; all must be non-negative.
        shape: Vec<i64>,
        /// Element type.
        dtype: Dtype,
    },
    /// Zero or more values. An absent wire field decodes to an empty list.
    VarLen {
        /// Element type.
        dtype: Dtype,
    },
    /// Parallel `(values, indices)` sequences stored as two wire fields.
    #[serde(alias = "sparse_feature")]
    Sparse {
        /// Wire field holding the int64 indices.
        index_key: String,
        /// Wire field holding the values.
        value_key: String,
        /// Element type of the values.
        dtype: Dtype,
        /// Dense size; every index must be in `[0, size)`.
        size: i64,
    },
}

impl FeatureSpec {
    /// A zero-dimensional FixedLen feature.
    pub fn scalar(dtype: Dtype) -> Self {
        Self::FixedLen {
            shape: Vec::new(),
            dtype,
        }
    }

    /// A FixedLen feature with the given shape.
    pub fn fixed_len(shape: impl Into<Vec<i64>>, dtype: Dtype) -> Self {
        Self::FixedLen {
            shape: shape.into(),
            dtype,
        }
    }

    /// A VarLen feature.
    pub fn var_len(dtype: Dtype) -> Self {
        Self::VarLen { dtype }
    }

    /// A sparse feature stored under `index_key` and `value_key`.
    pub fn sparse(
        index_key: impl Into<String>,
        value_key: impl Into<String>,
        dtype: Dtype,
        size: i64,
    ) -> Self {
        Self::Sparse {
            index_key: index_key.into(),
            value_key: value_key.into(),
            dtype,
            size,
        }
    }

    /// Element type of the feature's values.
    pub fn dtype(&self) -> Dtype {
        match self {
            FeatureSpec::FixedLen { dtype, .. }
            | FeatureSpec::VarLen { dtype }
            | FeatureSpec::Sparse { dtype, .. } => *dtype,
        }
    }

    /// Kind name used in logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FeatureSpec::FixedLen { .. } => "fixed_len",
            FeatureSpec::VarLen { .. } => "var_len",
            FeatureSpec::Sparse { .. } => "sparse",
        }
    }

    /// Number of values a FixedLen feature holds, `None` for other kinds.
    ///
    /// Only meaningful on a validated spec; negative dimensions yield `None`.
    pub fn num_elements(&self) -> Option<usize> {
        match self {
            FeatureSpec::FixedLen { shape, .. } => shape.iter().try_fold(1usize, |acc, &dim| {
                usize::try_from(dim).ok().and_then(|d| acc.checked_mul(d))
            }),
            _ => None,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self {
            FeatureSpec::FixedLen { shape, .. } => {
                if let Some(dim) = shape.iter().find(|&&d| d < 0) {
                    return Err(CoderError::Schema(format!(
                        "feature {name}: negative dimension {dim} in shape {shape:?}"
                    )));
                }
                if self.num_elements().is_none() {
                    return Err(CoderError::Schema(format!(
                        "feature {name}: shape {shape:?} is too large"
                    )));
                }
            }
            FeatureSpec::VarLen { .. } => {}
            FeatureSpec::Sparse {
                index_key,
                value_key,
                size,
                ..
            } => {
                if *size < 0 {
                    return Err(CoderError::Schema(format!(
                        "feature {name}: negative sparse size {size}"
                    )));
                }
                if index_key.is_empty() || value_key.is_empty() {
                    return Err(CoderError::Schema(format!(
                        "feature {name}: sparse index_key and value_key must be non-empty"
                    )));
                }
                if index_key == value_key {
                    return Err(CoderError::Schema(format!(
                        "feature {name}: index_key and value_key are both {index_key:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// What a wire field carries for its owning feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireRole {
    /// The whole value of a FixedLen or VarLen feature.
    Dense,
    /// Indices of a sparse feature.
    SparseIndex,
    /// Values of a sparse feature.
    SparseValue,
}

/// Derived entry: which feature produces and consumes a wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireField {
    /// Position of the owning feature in schema order.
    pub feature: usize,
    /// Role of this field within the feature.
    pub role: WireRole,
    /// List variant expected on the wire.
    pub dtype: Dtype,
}

/// Ordered, validated mapping from feature name to [`FeatureSpec`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    features: Vec<(String, FeatureSpec)>,
    wire_fields: BTreeMap<String, WireField>,
}

impl Schema {
    /// Validates and builds a schema from `(name, spec)` pairs, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CoderError::Schema`] on duplicate or empty feature names,
    /// negative dimensions or sizes, or colliding wire-field names.
    pub fn new<I, K>(features: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FeatureSpec)>,
        K: Into<String>,
    {
        let features: Vec<(String, FeatureSpec)> =
            features.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let mut wire_fields = BTreeMap::new();

        for (index, (name, spec)) in features.iter().enumerate() {
            if name.is_empty() {
                return Err(CoderError::Schema(
                    "feature names must be non-empty".to_string(),
                ));
            }
            if features[..index].iter().any(|(other, _)| other == name) {
                return Err(CoderError::Schema(format!("duplicate feature {name}")));
            }
            spec.validate(name)?;

            let owned: Vec<(&str, WireRole, Dtype)> = match spec {
                FeatureSpec::FixedLen { dtype, .. } | FeatureSpec::VarLen { dtype } => {
                    vec![(name.as_str(), WireRole::Dense, *dtype)]
                }
                FeatureSpec::Sparse {
                    index_key,
                    value_key,
                    dtype,
                    ..
                } => vec![
                    (index_key.as_str(), WireRole::SparseIndex, Dtype::Int),
                    (value_key.as_str(), WireRole::SparseValue, *dtype),
                ],
            };

            for (wire_name, role, dtype) in owned {
                let field = WireField {
                    feature: index,
                    role,
                    dtype,
                };
                if let Some(existing) = wire_fields.insert(wire_name.to_string(), field) {
                    let other = &features[existing.feature].0;
                    return Err(CoderError::Schema(format!(
                        "wire field {wire_name:?} of feature {name} collides with feature {other}"
                    )));
                }
            }
        }

        Ok(Self {
            features,
            wire_fields,
        })
    }

    /// A schema with no features. Its codec maps empty records to empty
    /// instances.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses and validates a schema from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoderError::Schema(e.to_string()))
    }

    /// Reads a JSON schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| CoderError::Schema(format!("{}: {e}", path.display())))
    }

    /// Serializes the schema back to a pretty-printed JSON object.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoderError::Serialization(e.to_string()))
    }

    /// Number of logical features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if the schema has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Looks up a feature spec by logical name.
    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Features in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureSpec)> {
        self.features.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Feature names in schema order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Looks up the owner of a wire field.
    pub fn wire_field(&self, wire_name: &str) -> Option<&WireField> {
        self.wire_fields.get(wire_name)
    }

    /// All wire fields, sorted by name.
    pub fn wire_fields(&self) -> impl Iterator<Item = (&str, &WireField)> {
        self.wire_fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Name of the feature at `index` in schema order.
    pub fn feature_name(&self, index: usize) -> Option<&str> {
        self.features.get(index).map(|(n, _)| n.as_str())
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.features.len()))?;
        for (name, spec) in &self.features {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from feature name to feature spec")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Schema, A::Error> {
                let mut features: Vec<(String, FeatureSpec)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, spec)) = access.next_entry()? {
                    features.push((name, spec));
                }
                Schema::new(features).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
