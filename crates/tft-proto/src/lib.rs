//! Protobuf messages for the `tf.Example` record format.
//!
//! The message and field numbers match `tensorflow/core/example/example.proto`
//! and `feature.proto`, so bytes produced here parse with the TensorFlow
//! tooling and vice versa:
//!
//! ```text
//! message Example  { Features features = 1; }
//! message Features { map<string, Feature> feature = 1; }
//! message Feature  { oneof kind { BytesList bytes_list = 1;
//!                                 FloatList float_list = 2;
//!                                 Int64List int64_list = 3; } }
//! ```
//!
//! The types are declared with the `prost` derive macros instead of being
//! generated by a build script, since the schema is tiny and stable. The
//! feature map is a `BTreeMap` so that encoding an [`Example`] is
//! deterministic: two logically equal examples serialize to identical bytes.

#![allow(clippy::derive_partial_eq_without_eq)]

use std::collections::BTreeMap;

/// A single record: a bag of named features.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: ::core::option::Option<Features>,
}

/// Map from wire-field name to its typed list.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

/// One wire field. Exactly one list variant is set on a well-formed record.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: ::core::option::Option<feature::Kind>,
}

/// Nested types for [`Feature`].
pub mod feature {
    /// The list variant carried by a [`Feature`](super::Feature).
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(super::BytesList),
        #[prost(message, tag = "2")]
        FloatList(super::FloatList),
        #[prost(message, tag = "3")]
        Int64List(super::Int64List),
    }

    impl Kind {
        /// Proto field name of the list variant, for error messages.
        pub fn name(&self) -> &'static str {
            match self {
                Kind::BytesList(_) => "bytes_list",
                Kind::FloatList(_) => "float_list",
                Kind::Int64List(_) => "int64_list",
            }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

/// Packed on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, tag = "1")]
    pub value: Vec<f32>,
}

/// Packed on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, tag = "1")]
    pub value: Vec<i64>,
}

impl Feature {
    /// Builds an `int64_list` feature.
    pub fn int64_list(value: Vec<i64>) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value })),
        }
    }

    /// Builds a `float_list` feature.
    pub fn float_list(value: Vec<f32>) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value })),
        }
    }

    /// Builds a `bytes_list` feature.
    pub fn bytes_list(value: Vec<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList { value })),
        }
    }
}

impl Example {
    /// Builds an example from `(name, feature)` pairs.
    pub fn from_features<I, K>(features: I) -> Self
    where
        I: IntoIterator<Item = (K, Feature)>,
        K: Into<String>,
    {
        Self {
            features: Some(Features {
                feature: features.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            }),
        }
    }

    /// Looks up a wire field by name.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.as_ref().and_then(|f| f.feature.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_example_roundtrip_prost() {
        let ex = Example::from_features([
            ("a", Feature::int64_list(vec![12])),
            ("b", Feature::float_list(vec![89.0])),
            ("c", Feature::bytes_list(vec![b"female".to_vec()])),
        ]);
        let bytes = ex.encode_to_vec();
        let decoded = Example::decode(bytes.as_slice()).unwrap();
        assert_eq!(ex, decoded);
        assert_eq!(
            decoded.get("c").and_then(|f| f.kind.as_ref()).map(|k| k.name()),
            Some("bytes_list")
        );
    }

    #[test]
    fn test_int64_list_wire_layout() {
        // features { feature { key: "a" value { int64_list { value: [1, 4] } } } }
        let ex = Example::from_features([("a", Feature::int64_list(vec![1, 4]))]);
        let expected: Vec<u8> = vec![
            0x0a, 0x0d, // Example.features, len 13
            0x0a, 0x0b, // Features.feature map entry, len 11
            0x0a, 0x01, b'a', // entry key
            0x12, 0x06, // entry value: Feature, len 6
            0x1a, 0x04, // Feature.int64_list, len 4
            0x0a, 0x02, 0x01, 0x04, // packed values
        ];
        assert_eq!(ex.encode_to_vec(), expected);
        assert_eq!(Example::decode(expected.as_slice()).unwrap(), ex);
    }

    #[test]
    fn test_unpacked_ints_decode() {
        // Int64List with two unpacked values (tag 1, varint): 0x08 0x01 0x08 0x04
        let list = Int64List::decode(&[0x08u8, 0x01, 0x08, 0x04][..]).unwrap();
        assert_eq!(list.value, vec![1, 4]);
    }

    #[test]
    fn test_deterministic_encoding() {
        let a = Example::from_features([
            ("z", Feature::int64_list(vec![1])),
            ("a", Feature::float_list(vec![2.0])),
        ]);
        let b = Example::from_features([
            ("a", Feature::float_list(vec![2.0])),
            ("z", Feature::int64_list(vec![1])),
        ]);
        assert_eq!(a.encode_to_vec(), b.encode_to_vec());
    }

    #[test]
    fn test_empty_feature_has_no_kind() {
        let decoded = Feature::decode(Feature::default().encode_to_vec().as_slice()).unwrap();
        assert!(decoded.kind.is_none());
    }
}
