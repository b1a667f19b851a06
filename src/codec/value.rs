//! Argument Value Module
//!
//! Canonical representation of call arguments prior to hashing.

use std::collections::BTreeMap;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::codec::serializer::ArgSerializer;
use crate::error::{CacheError, Result};

// == Arg Value ==
/// A call argument lowered to the shapes the key codec understands.
///
/// Mappings use a `BTreeMap` so iteration is always in lexicographic key
/// order, whatever order the caller inserted them in.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// `None`
    Null,
    /// `()` and unit structs
    Unit,
    /// `Some(..)`, kept distinct from the bare inner value
    Present(Box<ArgValue>),
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Seq(Vec<ArgValue>),
    Map(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    /// Lowers any `Serialize` value. Fails with `UnencodableArgument` for
    /// shapes without a canonical form, such as maps keyed by non-strings.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        value.serialize(ArgSerializer)
    }

    // == Canonical Encoding ==
    /// Appends the canonical byte form of this value.
    ///
    /// Every variant starts with a distinct tag byte and every
    /// variable-length payload is either length-prefixed or terminated, so
    /// two different values can never produce the same bytes.
    pub(crate) fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            ArgValue::Null => out.push(b'n'),
            ArgValue::Unit => out.push(b'u'),
            ArgValue::Present(inner) => {
                out.push(b'o');
                inner.write_canonical(out);
            }
            ArgValue::Bool(true) => out.push(b't'),
            ArgValue::Bool(false) => out.push(b'f'),
            ArgValue::Int(v) => {
                out.push(b'i');
                out.extend_from_slice(v.to_string().as_bytes());
                out.push(b';');
            }
            ArgValue::Float(v) => {
                out.push(b'd');
                out.extend_from_slice(float_repr(*v).as_bytes());
                out.push(b';');
            }
            ArgValue::Str(s) => write_str(s, out),
            ArgValue::Seq(items) => write_seq(items, out),
            ArgValue::Map(entries) => write_map(entries, out),
        }
    }
}

/// NaN and the infinities get their own spellings instead of collapsing
/// into a generic null. All NaN payloads share one spelling.
fn float_repr(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{:?}", v)
    }
}

pub(crate) fn write_str(s: &str, out: &mut Vec<u8>) {
    out.push(b's');
    out.extend_from_slice(s.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(s.as_bytes());
}

pub(crate) fn write_seq(items: &[ArgValue], out: &mut Vec<u8>) {
    out.push(b'l');
    for item in items {
        item.write_canonical(out);
    }
    out.push(b'e');
}

pub(crate) fn write_map(entries: &BTreeMap<String, ArgValue>, out: &mut Vec<u8>) {
    out.push(b'm');
    for (key, value) in entries {
        write_str(key, out);
        value.write_canonical(out);
    }
    out.push(b'e');
}

// == Numeric Array ==
/// Homogeneous numeric array of arbitrary rank, stored row-major.
///
/// Serializes as nested sequences of its scalar elements, so the key depends
/// only on shape and contents.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray<T = f64> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> NumericArray<T> {
    /// Creates an array, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                CacheError::UnencodableArgument(format!(
                    "array shape {:?} has more elements than fit in memory",
                    shape
                ))
            })?;
        if expected != data.len() {
            return Err(CacheError::UnencodableArgument(format!(
                "array shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Creates a rank-1 array.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

impl<T: Serialize> Serialize for NumericArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Nested {
            shape: &self.shape,
            data: &self.data,
        }
        .serialize(serializer)
    }
}

/// Row-major view of one sub-array.
struct Nested<'a, T> {
    shape: &'a [usize],
    data: &'a [T],
}

impl<T: Serialize> Serialize for Nested<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let Some((&len, rest)) = self.shape.split_first() else {
            // Rank 0: a single scalar
            return match self.data.first() {
                Some(scalar) => scalar.serialize(serializer),
                None => serializer.serialize_unit(),
            };
        };

        let stride = if len == 0 { 0 } else { self.data.len() / len };
        let mut seq = serializer.serialize_seq(Some(len))?;
        for i in 0..len {
            seq.serialize_element(&Nested {
                shape: rest,
                data: &self.data[i * stride..(i + 1) * stride],
            })?;
        }
        seq.end()
    }
}

// == Call Args ==
/// Positional and keyword arguments of one call.
///
/// Builder methods never fail; the first lowering error is kept and
/// reported when the key is generated.
#[derive(Debug, Default)]
pub struct CallArgs {
    positional: Vec<ArgValue>,
    keyword: BTreeMap<String, ArgValue>,
    error: Option<CacheError>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a single `Serialize` value into call arguments.
    ///
    /// Tuples and sequences become positional arguments, structs and maps
    /// become keyword arguments, `()` means no arguments and any other value,
    /// `None` and `Some(..)` included, is a single positional argument.
    ///
    /// The split is injective for the values of any one type with a fixed
    /// top-level shape. Across types the key only sees the lowered shape, so
    /// these are intentionally equal:
    /// - a struct and the same fields passed with [`CallArgs::kwarg`]
    /// - a tuple, a `Vec` and a fixed-size array with equal elements, e.g.
    ///   `vec![vec![1.0, 2.0]]` and `(vec![1.0, 2.0],)`
    /// - `()`, an empty tuple/`Vec` and an empty struct or map (no arguments)
    /// - a `NumericArray` and the nested `Vec`s holding the same rows
    pub fn from_serialize<A: Serialize + ?Sized>(args: &A) -> Result<Self> {
        let mut call = Self::new();
        match ArgValue::from_serialize(args)? {
            ArgValue::Unit => {}
            ArgValue::Seq(items) => call.positional = items,
            ArgValue::Map(entries) => call.keyword = entries,
            scalar => call.positional.push(scalar),
        }
        Ok(call)
    }

    /// Appends a positional argument.
    pub fn arg<V: Serialize + ?Sized>(mut self, value: &V) -> Self {
        match ArgValue::from_serialize(value) {
            Ok(v) => self.positional.push(v),
            Err(e) => self.record(e),
        }
        self
    }

    /// Sets a keyword argument.
    pub fn kwarg<V: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &V) -> Self {
        match ArgValue::from_serialize(value) {
            Ok(v) => {
                self.keyword.insert(name.into(), v);
            }
            Err(e) => self.record(e),
        }
        self
    }

    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, ArgValue> {
        &self.keyword
    }

    pub(crate) fn take_error(&mut self) -> Option<CacheError> {
        self.error.take()
    }

    fn record(&mut self, err: CacheError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
