//! Normalization between instance values and wire lists.
//!
//! [`WireElement`] is implemented for the three wire element types (`i64`,
//! `f32`, `Vec<u8>`). Feature handlers are generic over it, so the choice of
//! list variant is made once when a handler is compiled and every value is
//! coerced straight into the canonical wire vector.

use tft_proto::feature::Kind;
use tft_proto::{BytesList, Feature, FloatList, Int64List};

use crate::error::{CoderError, Result};
use crate::schema::Dtype;
use crate::value::{Array, Scalar, Sequence};

/// An element type of one of the three wire list variants.
pub(crate) trait WireElement: Sized + Clone + 'static {
    /// The dtype whose list variant carries this element.
    const DTYPE: Dtype;

    /// Coerces a plain scalar, or `None` if its kind is not accepted.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;

    /// Appends a typed array, or returns `false` if its kind is not accepted.
    fn extend_from_array(array: &Array, out: &mut Vec<Self>) -> bool;

    /// Moves the wire list out of `kind`. `Err` carries the variant found
    /// when it is not this element's variant.
    fn take_list(kind: Option<Kind>) -> std::result::Result<Vec<Self>, &'static str>;

    /// Stores `values` as the feature's list.
    fn put_list(feature: &mut Feature, values: Vec<Self>);

    /// Canonical decoded array form.
    fn into_array(values: Vec<Self>) -> Array;

    /// Canonical decoded scalar form.
    fn into_scalar(value: Self) -> Scalar;
}

impl WireElement for i64 {
    const DTYPE: Dtype = Dtype::Int;

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn extend_from_array(array: &Array, out: &mut Vec<Self>) -> bool {
        match array {
            Array::Int64(v) => out.extend_from_slice(v),
            Array::Int32(v) => out.extend(v.iter().map(|&x| i64::from(x))),
            _ => return false,
        }
        true
    }

    fn take_list(kind: Option<Kind>) -> std::result::Result<Vec<Self>, &'static str> {
        match kind {
            Some(Kind::Int64List(list)) => Ok(list.value),
            None => Ok(Vec::new()),
            Some(other) => Err(other.name()),
        }
    }

    fn put_list(feature: &mut Feature, value: Vec<Self>) {
        feature.kind = Some(Kind::Int64List(Int64List { value }));
    }

    fn into_array(values: Vec<Self>) -> Array {
        Array::Int64(values)
    }

    fn into_scalar(value: Self) -> Scalar {
        Scalar::Int(value)
    }
}

impl WireElement for f32 {
    const DTYPE: Dtype = Dtype::Float;

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float(v) => Some(*v as f32),
            Scalar::Int(v) => Some(*v as f32),
            Scalar::Bytes(_) => None,
        }
    }

    fn extend_from_array(array: &Array, out: &mut Vec<Self>) -> bool {
        match array {
            Array::Float32(v) => out.extend_from_slice(v),
            Array::Float64(v) => out.extend(v.iter().map(|&x| x as f32)),
            Array::Int32(v) => out.extend(v.iter().map(|&x| x as f32)),
            Array::Int64(v) => out.extend(v.iter().map(|&x| x as f32)),
            Array::Bytes(_) => return false,
        }
        true
    }

    fn take_list(kind: Option<Kind>) -> std::result::Result<Vec<Self>, &'static str> {
        match kind {
            Some(Kind::FloatList(list)) => Ok(list.value),
            None => Ok(Vec::new()),
            Some(other) => Err(other.name()),
        }
    }

    fn put_list(feature: &mut Feature, value: Vec<Self>) {
        feature.kind = Some(Kind::FloatList(FloatList { value }));
    }

    fn into_array(values: Vec<Self>) -> Array {
        Array::Float32(values)
    }

    fn into_scalar(value: Self) -> Scalar {
        Scalar::Float(value.into())
    }
}

impl WireElement for Vec<u8> {
    const DTYPE: Dtype = Dtype::Bytes;

    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bytes(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn extend_from_array(array: &Array, out: &mut Vec<Self>) -> bool {
        match array {
            Array::Bytes(v) => out.extend(v.iter().cloned()),
            _ => return false,
        }
        true
    }

    fn take_list(kind: Option<Kind>) -> std::result::Result<Vec<Self>, &'static str> {
        match kind {
            Some(Kind::BytesList(list)) => Ok(list.value),
            None => Ok(Vec::new()),
            Some(other) => Err(other.name()),
        }
    }

    fn put_list(feature: &mut Feature, value: Vec<Self>) {
        feature.kind = Some(Kind::BytesList(BytesList { value }));
    }

    fn into_array(values: Vec<Self>) -> Array {
        Array::Bytes(values)
    }

    fn into_scalar(value: Self) -> Scalar {
        Scalar::Bytes(value)
    }
}

/// Returns true if `kind` is the list variant of `dtype`.
pub(crate) fn kind_matches(kind: &Kind, dtype: Dtype) -> bool {
    matches!(
        (kind, dtype),
        (Kind::Int64List(_), Dtype::Int)
            | (Kind::FloatList(_), Dtype::Float)
            | (Kind::BytesList(_), Dtype::Bytes)
    )
}

fn invalid<T: WireElement>(feature: &str, actual: &'static str) -> CoderError {
    CoderError::InvalidValue {
        feature: feature.to_string(),
        expected: T::DTYPE.name(),
        actual,
    }
}

/// Appends one plain scalar to `out`.
pub(crate) fn push_scalar<T: WireElement>(
    feature: &str,
    scalar: &Scalar,
    out: &mut Vec<T>,
) -> Result<()> {
    let value = T::from_scalar(scalar).ok_or_else(|| invalid::<T>(feature, scalar.kind_name()))?;
    out.push(value);
    Ok(())
}

/// Appends every element of a sequence to `out`, in either representation.
pub(crate) fn extend_sequence<T: WireElement>(
    feature: &str,
    sequence: &Sequence,
    out: &mut Vec<T>,
) -> Result<()> {
    match sequence {
        Sequence::List(items) => {
            out.reserve(items.len());
            items
                .iter()
                .try_for_each(|scalar| push_scalar(feature, scalar, out))
        }
        Sequence::Array(array) => {
            if T::extend_from_array(array, out) {
                Ok(())
            } else {
                Err(invalid::<T>(feature, array.kind_name()))
            }
        }
    }
}

/// Refills the list stored in `slot`, reusing its allocation when the slot
/// already holds this element's variant. The slot always ends up holding
/// exactly what `fill` wrote, even when `fill` fails.
pub(crate) fn refill<T, F>(slot: &mut Feature, fill: F) -> Result<()>
where
    T: WireElement,
    F: FnOnce(&mut Vec<T>) -> Result<()>,
{
    let mut values = T::take_list(slot.kind.take()).unwrap_or_default();
    values.clear();
    let result = fill(&mut values);
    T::put_list(slot, values);
    result
}
