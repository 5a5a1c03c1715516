//! Schema-driven coders for `tf.Example` records.
//!
//! An [`ExampleCodec`] converts between an in-memory [`Instance`] (a map from
//! feature name to value) and the serialized bytes of a `tf.Example`. The
//! conversion is driven by a [`Schema`] that declares, per feature, one of
//! three contracts:
//!
//! - **FixedLen**: exactly `product(shape)` values; zero-dimensional
//!   features decode to a bare scalar.
//! - **VarLen**: any number of values, including none.
//! - **Sparse**: parallel values and indices, carried on the wire as two
//!   separate lists.
//!
//! ```
//! use tft_coders::{Dtype, ExampleCodec, FeatureSpec, FeatureValue, Instance, Scalar, Schema};
//!
//! let schema = Schema::new([
//!     ("id", FeatureSpec::scalar(Dtype::Int)),
//!     ("embedding", FeatureSpec::fixed_len([3], Dtype::Float)),
//!     ("tags", FeatureSpec::var_len(Dtype::Bytes)),
//! ])
//! .unwrap();
//! let mut codec = ExampleCodec::new(schema);
//!
//! let instance = Instance::new()
//!     .with("id", Scalar::Int(42))
//!     .with("embedding", vec![0.5f32, 1.0, 1.5])
//!     .with("tags", FeatureValue::list(["a", "b"]));
//!
//! let bytes = codec.encode(&instance).unwrap();
//! let decoded = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded.get("id"), Some(&FeatureValue::Scalar(Scalar::Int(42))));
//! ```
//!
//! # Modules
//!
//! - [`schema`] - Feature specs and the validated [`Schema`]
//! - [`value`] - The [`Instance`] value model
//! - [`codec`] - The [`ExampleCodec`] itself
//! - [`serializer`] - Relocating codecs between processes
//! - [`assets`] - Coder assets stored with a transform function
//! - [`tfrecord`] - TFRecord framing for streams of records
//! - [`error`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod codec;
mod coerce;
pub mod error;
mod handler;
pub mod schema;
pub mod serializer;
pub mod tfrecord;
pub mod value;

// Re-export main types for convenience
pub use assets::{append_coder_assets, read_coder_assets, CoderAssets};
pub use codec::ExampleCodec;
pub use error::{CoderError, Result};
pub use schema::{Dtype, FeatureSpec, Schema, WireField, WireRole};
pub use serializer::{BincodeSerializer, CodecSerializer, JsonSerializer};
pub use tfrecord::{TFRecordError, TFRecordReader, TFRecordWriter};
pub use value::{Array, FeatureValue, Instance, Scalar, Sequence};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::codec::ExampleCodec;
    pub use crate::error::{CoderError, Result};
    pub use crate::schema::{Dtype, FeatureSpec, Schema};
    pub use crate::value::{Array, FeatureValue, Instance, Scalar, Sequence};
}
