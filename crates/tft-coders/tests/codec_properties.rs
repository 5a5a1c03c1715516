//! Property-based tests for `ExampleCodec` over generated schemas.

#![allow(clippy::expect_used, clippy::float_cmp)]

use prost::Message;
use proptest::prelude::*;
use tft_coders::{
    Array, Dtype, ExampleCodec, FeatureSpec, FeatureValue, Instance, Scalar, Schema,
};
use tft_proto::{Example, Feature};

/// The values of one feature, in wire element types.
#[derive(Debug, Clone)]
enum Column {
    Int(Vec<i64>),
    Float(Vec<f32>),
    Bytes(Vec<Vec<u8>>),
}

impl Column {
    fn dtype(&self) -> Dtype {
        match self {
            Column::Int(_) => Dtype::Int,
            Column::Float(_) => Dtype::Float,
            Column::Bytes(_) => Dtype::Bytes,
        }
    }

    fn feature(&self) -> Feature {
        match self {
            Column::Int(v) => Feature::int64_list(v.clone()),
            Column::Float(v) => Feature::float_list(v.clone()),
            Column::Bytes(v) => Feature::bytes_list(v.clone()),
        }
    }

    fn scalars(&self) -> Vec<Scalar> {
        match self {
            Column::Int(v) => v.iter().map(|&x| Scalar::Int(x)).collect(),
            Column::Float(v) => v.iter().map(|&x| Scalar::Float(x.into())).collect(),
            Column::Bytes(v) => v.iter().cloned().map(Scalar::Bytes).collect(),
        }
    }

    /// A typed array wider than the wire type where a wider one exists.
    fn wide_array(&self) -> Array {
        match self {
            Column::Int(v) => Array::Int64(v.clone()),
            Column::Float(v) => Array::Float64(v.iter().map(|&x| x.into()).collect()),
            Column::Bytes(v) => Array::Bytes(v.clone()),
        }
    }

    fn canonical_array(&self) -> Array {
        match self {
            Column::Int(v) => Array::Int64(v.clone()),
            Column::Float(v) => Array::Float32(v.clone()),
            Column::Bytes(v) => Array::Bytes(v.clone()),
        }
    }
}

#[derive(Debug, Clone)]
enum Layout {
    FixedLen(Vec<i64>),
    VarLen,
    Sparse { size: i64, indices: Vec<i64> },
}

#[derive(Debug, Clone)]
struct GeneratedFeature {
    layout: Layout,
    column: Column,
}

impl GeneratedFeature {
    fn spec(&self, name: &str) -> FeatureSpec {
        let dtype = self.column.dtype();
        match &self.layout {
            Layout::FixedLen(shape) => FeatureSpec::fixed_len(shape.clone(), dtype),
            Layout::VarLen => FeatureSpec::var_len(dtype),
            Layout::Sparse { size, .. } => {
                FeatureSpec::sparse(format!("{name}_idx"), format!("{name}_val"), dtype, *size)
            }
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(&self.layout, Layout::FixedLen(shape) if shape.is_empty())
    }

    fn plain(&self) -> FeatureValue {
        let mut scalars = self.column.scalars();
        match &self.layout {
            Layout::Sparse { indices, .. } => FeatureValue::sparse(
                scalars,
                indices.iter().map(|&i| Scalar::Int(i)).collect::<Vec<_>>(),
            ),
            _ if self.is_scalar() => {
                FeatureValue::Scalar(scalars.pop().expect("scalar feature has one value"))
            }
            _ => FeatureValue::list(scalars),
        }
    }

    fn arrays(&self) -> FeatureValue {
        match &self.layout {
            Layout::Sparse { indices, .. } => FeatureValue::sparse(
                self.column.wide_array(),
                Array::Int32(indices.iter().map(|&i| i as i32).collect()),
            ),
            _ => self.column.wide_array().into(),
        }
    }

    fn canonical(&self) -> FeatureValue {
        match &self.layout {
            Layout::Sparse { indices, .. } => {
                FeatureValue::sparse(self.column.canonical_array(), Array::Int64(indices.clone()))
            }
            _ if self.is_scalar() => {
                let mut scalars = self.column.scalars();
                FeatureValue::Scalar(scalars.pop().expect("scalar feature has one value"))
            }
            _ => self.column.canonical_array().into(),
        }
    }

    fn wire(&self, name: &str) -> Vec<(String, Feature)> {
        match &self.layout {
            Layout::Sparse { indices, .. } => vec![
                (format!("{name}_idx"), Feature::int64_list(indices.clone())),
                (format!("{name}_val"), self.column.feature()),
            ],
            _ => vec![(name.to_string(), self.column.feature())],
        }
    }
}

/// A schema with one matching instance, in every representation.
#[derive(Debug, Clone)]
struct Case {
    features: Vec<GeneratedFeature>,
}

impl Case {
    fn names(&self) -> impl Iterator<Item = (String, &GeneratedFeature)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, feature)| (format!("f{i}"), feature))
    }

    fn schema(&self) -> Schema {
        Schema::new(self.names().map(|(name, f)| {
            let spec = f.spec(&name);
            (name, spec)
        }))
        .expect("generated schema is valid")
    }

    fn instance(&self, form: fn(&GeneratedFeature) -> FeatureValue) -> Instance {
        self.names().map(|(name, f)| (name, form(f))).collect()
    }

    fn example(&self) -> Example {
        Example::from_features(self.names().flat_map(|(name, f)| f.wire(&name)))
    }
}

fn arb_column(len: usize) -> impl Strategy<Value = Column> {
    prop_oneof![
        prop::collection::vec(any::<i64>(), len).prop_map(Column::Int),
        // Filter out NaN since NaN != NaN
        prop::collection::vec(any::<f32>().prop_filter("not NaN", |f| !f.is_nan()), len)
            .prop_map(Column::Float),
        prop::collection::vec(prop::collection::vec(any::<u8>(), 0..8), len)
            .prop_map(Column::Bytes),
    ]
}

fn arb_feature() -> impl Strategy<Value = GeneratedFeature> {
    let fixed_len = prop::collection::vec(0i64..4, 0..3)
        .prop_flat_map(|shape| {
            let len = shape.iter().product::<i64>() as usize;
            (Just(shape), arb_column(len))
        })
        .prop_map(|(shape, column)| GeneratedFeature {
            layout: Layout::FixedLen(shape),
            column,
        });

    let var_len = (0usize..6)
        .prop_flat_map(arb_column)
        .prop_map(|column| GeneratedFeature {
            layout: Layout::VarLen,
            column,
        });

    let sparse = (1i64..50)
        .prop_flat_map(|size| (Just(size), prop::collection::vec(0..size, 0..6)))
        .prop_flat_map(|(size, indices)| {
            let len = indices.len();
            (Just(size), Just(indices), arb_column(len))
        })
        .prop_map(|(size, indices, column)| GeneratedFeature {
            layout: Layout::Sparse { size, indices },
            column,
        });

    prop_oneof![fixed_len, var_len, sparse]
}

fn arb_case() -> impl Strategy<Value = Case> {
    prop::collection::vec(arb_feature(), 0..6).prop_map(|features| Case { features })
}

proptest! {
    #[test]
    fn encode_then_decode_is_canonical(case in arb_case()) {
        let mut codec = ExampleCodec::new(case.schema());
        let canonical = case.instance(GeneratedFeature::canonical);

        for form in [GeneratedFeature::plain, GeneratedFeature::arrays] {
            let encoded = codec.encode(&case.instance(form)).expect("encoding should succeed");
            let decoded = codec.decode(&encoded).expect("decoding should succeed");
            prop_assert_eq!(&decoded, &canonical);
        }
    }

    #[test]
    fn decode_then_encode_reparses_to_input(case in arb_case()) {
        let mut codec = ExampleCodec::new(case.schema());
        let example = case.example();

        let decoded = codec
            .decode(&example.encode_to_vec())
            .expect("decoding should succeed");
        let encoded = codec.encode(&decoded).expect("encoding should succeed");
        prop_assert_eq!(Example::decode(encoded.as_slice()).expect("valid record"), example);
    }

    #[test]
    fn representations_encode_to_same_bytes(case in arb_case()) {
        let mut codec = ExampleCodec::new(case.schema());
        let plain = codec
            .encode(&case.instance(GeneratedFeature::plain))
            .expect("encoding should succeed");
        let arrays = codec
            .encode(&case.instance(GeneratedFeature::arrays))
            .expect("encoding should succeed");
        let canonical = codec
            .encode(&case.instance(GeneratedFeature::canonical))
            .expect("encoding should succeed");
        prop_assert_eq!(&plain, &arrays);
        prop_assert_eq!(&plain, &canonical);
    }

    /// Arbitrary bytes should not crash, only return errors.
    #[test]
    fn arbitrary_bytes_dont_crash(
        case in arb_case(),
        bytes in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let codec = ExampleCodec::new(case.schema());
        let _ = codec.decode(&bytes);
    }
}
