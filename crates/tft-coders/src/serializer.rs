//! Relocation of codecs between processes.
//!
//! A codec's serialized form is its schema and nothing else; deserializing
//! recompiles the feature strategies and starts with empty scratch state, so
//! a relocated codec behaves exactly like a freshly built one no matter how
//! many records the original processed.
//!
//! ```
//! use tft_coders::serializer::{BincodeSerializer, CodecSerializer};
//! use tft_coders::{Dtype, ExampleCodec, FeatureSpec};
//!
//! let codec = ExampleCodec::from_specs([("a", FeatureSpec::scalar(Dtype::Int))]).unwrap();
//! let blob = BincodeSerializer::new().serialize(&codec).unwrap();
//! let relocated = BincodeSerializer::new().deserialize(&blob).unwrap();
//! assert_eq!(relocated.schema(), codec.schema());
//! ```

use crate::codec::ExampleCodec;
use crate::error::{CoderError, Result};

/// Serializes codecs to bytes and back.
pub trait CodecSerializer: Send + Sync {
    /// Serializes a codec.
    fn serialize(&self, codec: &ExampleCodec) -> Result<Vec<u8>>;

    /// Reconstructs a codec. The schema is validated again.
    fn deserialize(&self, data: &[u8]) -> Result<ExampleCodec>;
}

/// Compact binary format.
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    /// Create a new bincode serializer.
    pub fn new() -> Self {
        Self
    }
}

impl CodecSerializer for BincodeSerializer {
    fn serialize(&self, codec: &ExampleCodec) -> Result<Vec<u8>> {
        bincode::serialize(codec).map_err(|e| {
            CoderError::Serialization(format!("Bincode serialization failed: {}", e))
        })
    }

    fn deserialize(&self, data: &[u8]) -> Result<ExampleCodec> {
        bincode::deserialize(data).map_err(|e| {
            CoderError::Serialization(format!("Bincode deserialization failed: {}", e))
        })
    }
}

/// Human-readable JSON format; the payload is the schema document itself.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Create a new JSON serializer.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a JSON serializer with pretty-printing enabled.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl CodecSerializer for JsonSerializer {
    fn serialize(&self, codec: &ExampleCodec) -> Result<Vec<u8>> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(codec)
        } else {
            serde_json::to_vec(codec)
        };
        result.map_err(|e| CoderError::Serialization(format!("JSON serialization failed: {}", e)))
    }

    fn deserialize(&self, data: &[u8]) -> Result<ExampleCodec> {
        serde_json::from_slice(data)
            .map_err(|e| CoderError::Serialization(format!("JSON deserialization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Dtype, FeatureSpec};

    fn codec() -> ExampleCodec {
        ExampleCodec::from_specs([
            ("scalar_feature_1", FeatureSpec::scalar(Dtype::Int)),
            ("varlen_feature_1", FeatureSpec::var_len(Dtype::Float)),
            ("1d_vector_feature", FeatureSpec::fixed_len([1], Dtype::Bytes)),
            ("sparse_feature", FeatureSpec::sparse("idx", "value", Dtype::Float, 10)),
        ])
        .unwrap()
    }

    #[test]
    fn test_bincode_roundtrip() {
        let serializer = BincodeSerializer::new();
        let original = codec();
        let data = serializer.serialize(&original).unwrap();
        let restored = serializer.deserialize(&data).unwrap();
        assert_eq!(restored, original);
        assert_eq!(
            restored.schema().feature_names(),
            original.schema().feature_names()
        );
    }

    #[test]
    fn test_json_roundtrip() {
        for serializer in [JsonSerializer::new(), JsonSerializer::pretty()] {
            let original = codec();
            let data = serializer.serialize(&original).unwrap();
            let restored = serializer.deserialize(&data).unwrap();
            assert_eq!(restored, original);
        }
    }

    #[test]
    fn test_json_payload_is_schema_document() {
        let data = JsonSerializer::new().serialize(&codec()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(
            value["sparse_feature"]["sparse"]["index_key"],
            serde_json::json!("idx")
        );
    }

    #[test]
    fn test_corrupt_blob_rejected() {
        assert!(matches!(
            BincodeSerializer::new().deserialize(&[0xff; 3]),
            Err(CoderError::Serialization(_))
        ));
        assert!(matches!(
            JsonSerializer::new().deserialize(b"{\"a\": {\"var_len\": {\"dtype\": \"int\"}}, \"a\": {\"var_len\": {\"dtype\": \"int\"}}}"),
            Err(CoderError::Serialization(_))
        ));
    }
}
