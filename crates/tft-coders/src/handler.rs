//! Per-feature encode/decode strategies.
//!
//! [`compile`] turns one `(name, FeatureSpec)` entry into a boxed
//! [`FeatureHandler`]. The feature kind and dtype are resolved there, once;
//! the handlers themselves are monomorphized over the wire element type and
//! never inspect the spec again.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use tft_proto::Feature;

use crate::coerce::{extend_sequence, push_scalar, refill, WireElement};
use crate::error::{CoderError, Result};
use crate::schema::{Dtype, FeatureSpec};
use crate::value::{Array, FeatureValue, Sequence};

/// Wire fields of one record, keyed by name.
pub(crate) type WireFields = BTreeMap<String, Feature>;

/// Precompiled encode/decode behavior for one logical feature.
pub(crate) trait FeatureHandler: Send + Sync {
    /// Logical feature name.
    fn name(&self) -> &str;

    /// Moves this feature's wire field(s) out of `fields` and shapes them
    /// into an instance value. Absent fields read as empty lists.
    fn decode(&self, fields: &mut WireFields) -> Result<FeatureValue>;

    /// Writes `value` into this feature's wire field slot(s), overwriting
    /// whatever the slots held before.
    fn encode(&self, value: Option<&FeatureValue>, fields: &mut WireFields) -> Result<()>;
}

/// Builds the handler for a validated spec.
pub(crate) fn compile(name: &str, spec: &FeatureSpec) -> Box<dyn FeatureHandler> {
    match spec.dtype() {
        Dtype::Int => compile_typed::<i64>(name, spec),
        Dtype::Float => compile_typed::<f32>(name, spec),
        Dtype::Bytes => compile_typed::<Vec<u8>>(name, spec),
    }
}

fn compile_typed<T: WireElement + Send + Sync>(
    name: &str,
    spec: &FeatureSpec,
) -> Box<dyn FeatureHandler> {
    let name = name.to_string();
    match spec {
        FeatureSpec::FixedLen { shape, .. } if shape.is_empty() => Box::new(ScalarHandler::<T> {
            name,
            _element: PhantomData,
        }),
        FeatureSpec::FixedLen { .. } => Box::new(FixedLenHandler::<T> {
            name,
            len: spec.num_elements().unwrap_or_default(),
            _element: PhantomData,
        }),
        FeatureSpec::VarLen { .. } => Box::new(VarLenHandler::<T> {
            name,
            _element: PhantomData,
        }),
        FeatureSpec::Sparse {
            index_key,
            value_key,
            size,
            ..
        } => Box::new(SparseHandler::<T> {
            name,
            index_key: index_key.clone(),
            value_key: value_key.clone(),
            size: u64::try_from(*size).unwrap_or_default(),
            _element: PhantomData,
        }),
    }
}

fn take<T: WireElement>(fields: &mut WireFields, key: &str) -> Result<Vec<T>> {
    let kind = fields.remove(key).and_then(|f| f.kind);
    T::take_list(kind).map_err(|found| {
        CoderError::malformed(format!(
            "wire field {key} holds a {found}, expected a {}",
            T::DTYPE.wire_kind()
        ))
    })
}

fn slot<'a>(fields: &'a mut WireFields, key: &str) -> &'a mut Feature {
    fields.entry(key.to_string()).or_default()
}

/// Flattens a dense value (scalar or vector) into `out`.
fn flatten_dense<T: WireElement>(
    feature: &str,
    value: &FeatureValue,
    out: &mut Vec<T>,
) -> Result<()> {
    match value {
        FeatureValue::Scalar(scalar) => push_scalar(feature, scalar, out),
        FeatureValue::Sequence(sequence) => extend_sequence(feature, sequence, out),
        FeatureValue::Sparse { .. } => Err(CoderError::shape(
            feature,
            "got a sparse (values, indices) pair for a dense feature",
        )),
    }
}

fn check_encoded_len(feature: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CoderError::shape(
            feature,
            format!("expected {expected} values, got {actual}"),
        ))
    }
}

fn length_mismatch(feature: &str, expected: usize, actual: usize) -> CoderError {
    CoderError::malformed(format!(
        "feature length mismatch: {feature} expected {expected} values, got {actual}"
    ))
}

fn check_decoded_len(feature: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(length_mismatch(feature, expected, actual))
    }
}

/// `FixedLen` with `shape = []`: one wire value, a bare scalar in memory.
struct ScalarHandler<T> {
    name: String,
    _element: PhantomData<T>,
}

impl<T: WireElement + Send + Sync> FeatureHandler for ScalarHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, fields: &mut WireFields) -> Result<FeatureValue> {
        let mut values = take::<T>(fields, &self.name)?;
        let count = values.len();
        match values.pop() {
            Some(value) if count == 1 => Ok(FeatureValue::Scalar(T::into_scalar(value))),
            _ => Err(length_mismatch(&self.name, 1, count)),
        }
    }

    fn encode(&self, value: Option<&FeatureValue>, fields: &mut WireFields) -> Result<()> {
        let value = value.ok_or_else(|| CoderError::MissingFeature {
            feature: self.name.clone(),
        })?;
        refill::<T, _>(slot(fields, &self.name), |out| {
            flatten_dense(&self.name, value, out)?;
            check_encoded_len(&self.name, 1, out.len())
        })
    }
}

/// `FixedLen` with a non-empty shape: exactly `product(shape)` values.
struct FixedLenHandler<T> {
    name: String,
    len: usize,
    _element: PhantomData<T>,
}

impl<T: WireElement + Send + Sync> FeatureHandler for FixedLenHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, fields: &mut WireFields) -> Result<FeatureValue> {
        let values = take::<T>(fields, &self.name)?;
        check_decoded_len(&self.name, self.len, values.len())?;
        Ok(FeatureValue::Sequence(Sequence::Array(T::into_array(values))))
    }

    fn encode(&self, value: Option<&FeatureValue>, fields: &mut WireFields) -> Result<()> {
        let value = value.ok_or_else(|| CoderError::MissingFeature {
            feature: self.name.clone(),
        })?;
        refill::<T, _>(slot(fields, &self.name), |out| {
            flatten_dense(&self.name, value, out)?;
            check_encoded_len(&self.name, self.len, out.len())
        })
    }
}

/// `VarLen`: any number of values, absent means empty.
struct VarLenHandler<T> {
    name: String,
    _element: PhantomData<T>,
}

impl<T: WireElement + Send + Sync> FeatureHandler for VarLenHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, fields: &mut WireFields) -> Result<FeatureValue> {
        let values = take::<T>(fields, &self.name)?;
        Ok(FeatureValue::Sequence(Sequence::Array(T::into_array(values))))
    }

    fn encode(&self, value: Option<&FeatureValue>, fields: &mut WireFields) -> Result<()> {
        refill::<T, _>(slot(fields, &self.name), |out| match value {
            Some(value) => flatten_dense(&self.name, value, out),
            None => Ok(()),
        })
    }
}

/// Sparse feature fanned out to an index field and a value field.
struct SparseHandler<T> {
    name: String,
    index_key: String,
    value_key: String,
    size: u64,
    _element: PhantomData<T>,
}

impl<T> SparseHandler<T> {
    fn out_of_range(&self, indices: &[i64]) -> Option<i64> {
        indices
            .iter()
            .copied()
            .find(|&i| u64::try_from(i).map_or(true, |i| i >= self.size))
    }
}

impl<T: WireElement + Send + Sync> FeatureHandler for SparseHandler<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, fields: &mut WireFields) -> Result<FeatureValue> {
        let indices = take::<i64>(fields, &self.index_key)?;
        let values = take::<T>(fields, &self.value_key)?;
        if indices.len() != values.len() {
            return Err(CoderError::malformed(format!(
                "sparse feature {}: {} has {} indices but {} has {} values",
                self.name,
                self.index_key,
                indices.len(),
                self.value_key,
                values.len()
            )));
        }
        if let Some(index) = self.out_of_range(&indices) {
            return Err(CoderError::malformed(format!(
                "sparse feature {}: index {index} out of range [0, {})",
                self.name, self.size
            )));
        }
        Ok(FeatureValue::Sparse {
            values: Sequence::Array(T::into_array(values)),
            indices: Sequence::Array(Array::Int64(indices)),
        })
    }

    fn encode(&self, value: Option<&FeatureValue>, fields: &mut WireFields) -> Result<()> {
        let (values, indices) = match value {
            Some(FeatureValue::Sparse { values, indices }) => (values, indices),
            Some(_) => {
                return Err(CoderError::shape(
                    &self.name,
                    "expected a (values, indices) pair",
                ))
            }
            None => {
                return Err(CoderError::MissingFeature {
                    feature: self.name.clone(),
                })
            }
        };

        let mut index_count = 0;
        refill::<i64, _>(slot(fields, &self.index_key), |out| {
            extend_sequence(&self.name, indices, out)?;
            index_count = out.len();
            match self.out_of_range(out) {
                Some(index) => Err(CoderError::shape(
                    &self.name,
                    format!("index {index} out of range [0, {})", self.size),
                )),
                None => Ok(()),
            }
        })?;
        refill::<T, _>(slot(fields, &self.value_key), |out| {
            extend_sequence(&self.name, values, out)?;
            if out.len() == index_count {
                Ok(())
            } else {
                Err(CoderError::shape(
                    &self.name,
                    format!("{} values but {index_count} indices", out.len()),
                ))
            }
        })
    }
}
