//! In-memory representation of one record: the [`Instance`].
//!
//! A feature's value can be supplied in two equivalent representations:
//! plain scalars ([`Scalar`], [`Sequence::List`]) or fixed-width typed arrays
//! ([`Array`], [`Sequence::Array`]). The codec produces identical bytes for
//! both. Decoding always yields the canonical form: a bare [`Scalar`] for
//! zero-dimensional features, and `Int64`/`Float32`/`Bytes` arrays otherwise.

use std::collections::BTreeMap;

/// A single loosely typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Any integer.
    Int(i64),
    /// Any floating-point number.
    Float(f64),
    /// A byte string.
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bytes(_) => "bytes",
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v.into())
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Bytes(v.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bytes(v)
    }
}

/// A homogeneous fixed-width array.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Array {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bytes(Vec<Vec<u8>>),
}

impl Array {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Array::Int32(v) => v.len(),
            Array::Int64(v) => v.len(),
            Array::Float32(v) => v.len(),
            Array::Float64(v) => v.len(),
            Array::Bytes(v) => v.len(),
        }
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Array::Int32(_) => "int32",
            Array::Int64(_) => "int64",
            Array::Float32(_) => "float32",
            Array::Float64(_) => "float64",
            Array::Bytes(_) => "bytes",
        }
    }

    /// Element at `index` as a plain scalar.
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Array::Int32(v) => v.get(index).map(|&x| Scalar::Int(x.into())),
            Array::Int64(v) => v.get(index).map(|&x| Scalar::Int(x)),
            Array::Float32(v) => v.get(index).map(|&x| Scalar::Float(x.into())),
            Array::Float64(v) => v.get(index).map(|&x| Scalar::Float(x)),
            Array::Bytes(v) => v.get(index).map(|x| Scalar::Bytes(x.clone())),
        }
    }
}

/// An ordered sequence of values in either representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Sequence {
    /// Plain scalars, possibly of mixed numeric kinds.
    List(Vec<Scalar>),
    /// A typed array.
    Array(Array),
}

impl Sequence {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Sequence::List(v) => v.len(),
            Sequence::Array(a) => a.len(),
        }
    }

    /// Returns true if the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` as a plain scalar.
    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            Sequence::List(v) => v.get(index).cloned(),
            Sequence::Array(a) => a.get(index),
        }
    }
}

impl From<Array> for Sequence {
    fn from(a: Array) -> Self {
        Sequence::Array(a)
    }
}

impl From<Vec<Scalar>> for Sequence {
    fn from(v: Vec<Scalar>) -> Self {
        Sequence::List(v)
    }
}

impl From<Vec<i64>> for Sequence {
    fn from(v: Vec<i64>) -> Self {
        Sequence::Array(Array::Int64(v))
    }
}

impl From<Vec<i32>> for Sequence {
    fn from(v: Vec<i32>) -> Self {
        Sequence::Array(Array::Int32(v))
    }
}

impl From<Vec<f32>> for Sequence {
    fn from(v: Vec<f32>) -> Self {
        Sequence::Array(Array::Float32(v))
    }
}

impl From<Vec<f64>> for Sequence {
    fn from(v: Vec<f64>) -> Self {
        Sequence::Array(Array::Float64(v))
    }
}

impl From<Vec<Vec<u8>>> for Sequence {
    fn from(v: Vec<Vec<u8>>) -> Self {
        Sequence::Array(Array::Bytes(v))
    }
}

/// The value of one logical feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// A zero-dimensional value.
    Scalar(Scalar),
    /// A fixed-length or variable-length vector.
    Sequence(Sequence),
    /// Parallel values and indices of a sparse feature.
    Sparse {
        /// Values, one per index.
        values: Sequence,
        /// Integer indices into the dense dimension.
        indices: Sequence,
    },
}

impl FeatureValue {
    /// Builds a sparse value from any sequence representations.
    pub fn sparse(values: impl Into<Sequence>, indices: impl Into<Sequence>) -> Self {
        FeatureValue::Sparse {
            values: values.into(),
            indices: indices.into(),
        }
    }

    /// Builds a plain-list sequence value.
    pub fn list<T: Into<Scalar>>(items: impl IntoIterator<Item = T>) -> Self {
        FeatureValue::Sequence(Sequence::List(items.into_iter().map(Into::into).collect()))
    }

    /// Returns the scalar, if this is a scalar value.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FeatureValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the sequence, if this is a vector value.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            FeatureValue::Sequence(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for FeatureValue {
    fn from(s: Scalar) -> Self {
        FeatureValue::Scalar(s)
    }
}

impl From<Sequence> for FeatureValue {
    fn from(s: Sequence) -> Self {
        FeatureValue::Sequence(s)
    }
}

impl From<Array> for FeatureValue {
    fn from(a: Array) -> Self {
        FeatureValue::Sequence(Sequence::Array(a))
    }
}

macro_rules! feature_value_from_vec {
    ($($elem:ty),*) => {
        $(
            impl From<Vec<$elem>> for FeatureValue {
                fn from(v: Vec<$elem>) -> Self {
                    FeatureValue::Sequence(v.into())
                }
            }
        )*
    };
}

feature_value_from_vec!(Scalar, i32, i64, f32, f64, Vec<u8>);

/// One record's named feature values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instance {
    features: BTreeMap<String, FeatureValue>,
}

impl Instance {
    /// Creates an empty instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a feature value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FeatureValue>,
    ) -> Option<FeatureValue> {
        self.features.insert(name.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Looks up a feature value.
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }

    /// Removes a feature value.
    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.features.remove(name)
    }

    /// Returns true if the feature is present.
    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Number of features present.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if no features are present.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.features.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for Instance {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            features: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Instance {
    type Item = (String, FeatureValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, FeatureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
