//! Argument Serializer
//!
//! A `serde::Serializer` that lowers any serializable argument into an
//! [`ArgValue`] tree.

use std::collections::BTreeMap;

use serde::ser::{self, Serialize};

use crate::codec::value::ArgValue;
use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

/// Lowers a value to [`ArgValue`].
pub(crate) struct ArgSerializer;

impl ser::Serializer for ArgSerializer {
    type Ok = ArgValue;
    type Error = CacheError;

    type SerializeSeq = SeqCollector;
    type SerializeTuple = SeqCollector;
    type SerializeTupleStruct = SeqCollector;
    type SerializeTupleVariant = VariantSeqCollector;
    type SerializeMap = MapCollector;
    type SerializeStruct = MapCollector;
    type SerializeStructVariant = VariantMapCollector;

    fn serialize_bool(self, v: bool) -> Result<ArgValue> {
        Ok(ArgValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<ArgValue> {
        Ok(ArgValue::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<ArgValue> {
        Ok(ArgValue::Int(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<ArgValue> {
        i128::try_from(v).map(ArgValue::Int).map_err(|_| {
            CacheError::UnencodableArgument(format!("integer {} out of range", v))
        })
    }

    fn serialize_f32(self, v: f32) -> Result<ArgValue> {
        Ok(ArgValue::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<ArgValue> {
        Ok(ArgValue::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<ArgValue> {
        Ok(ArgValue::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<ArgValue> {
        Ok(ArgValue::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ArgValue> {
        Ok(ArgValue::Seq(
            v.iter().map(|b| ArgValue::Int((*b).into())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<ArgValue> {
        Ok(ArgValue::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<ArgValue> {
        Ok(ArgValue::Present(Box::new(value.serialize(self)?)))
    }

    fn serialize_unit(self) -> Result<ArgValue> {
        Ok(ArgValue::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ArgValue> {
        Ok(ArgValue::Unit)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<ArgValue> {
        Ok(ArgValue::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<ArgValue> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ArgValue> {
        let mut entries = BTreeMap::new();
        entries.insert(variant.to_string(), value.serialize(ArgSerializer)?);
        Ok(ArgValue::Map(entries))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCollector> {
        Ok(SeqCollector {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCollector> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqCollector> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqCollector> {
        Ok(VariantSeqCollector {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCollector> {
        Ok(MapCollector::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<MapCollector> {
        Ok(MapCollector::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantMapCollector> {
        Ok(VariantMapCollector {
            variant,
            entries: BTreeMap::new(),
        })
    }
}

// == Collectors ==

pub(crate) struct SeqCollector {
    items: Vec<ArgValue>,
}

impl ser::SerializeSeq for SeqCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(ArgSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<ArgValue> {
        Ok(ArgValue::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ArgValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<ArgValue> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct VariantSeqCollector {
    variant: &'static str,
    items: Vec<ArgValue>,
}

impl ser::SerializeTupleVariant for VariantSeqCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(ArgSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<ArgValue> {
        let mut entries = BTreeMap::new();
        entries.insert(self.variant.to_string(), ArgValue::Seq(self.items));
        Ok(ArgValue::Map(entries))
    }
}

#[derive(Default)]
pub(crate) struct MapCollector {
    entries: BTreeMap<String, ArgValue>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        match key.serialize(ArgSerializer)? {
            ArgValue::Str(key) => {
                self.pending_key = Some(key);
                Ok(())
            }
            other => Err(CacheError::UnencodableArgument(format!(
                "map keys must be strings, got {:?}",
                other
            ))),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.pending_key.take().ok_or_else(|| {
            CacheError::UnencodableArgument("map value without a key".to_string())
        })?;
        self.entries.insert(key, value.serialize(ArgSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<ArgValue> {
        Ok(ArgValue::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .insert(key.to_string(), value.serialize(ArgSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<ArgValue> {
        Ok(ArgValue::Map(self.entries))
    }
}

pub(crate) struct VariantMapCollector {
    variant: &'static str,
    entries: BTreeMap<String, ArgValue>,
}

impl ser::SerializeStructVariant for VariantMapCollector {
    type Ok = ArgValue;
    type Error = CacheError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.entries
            .insert(key.to_string(), value.serialize(ArgSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<ArgValue> {
        let mut outer = BTreeMap::new();
        outer.insert(self.variant.to_string(), ArgValue::Map(self.entries));
        Ok(ArgValue::Map(outer))
    }
}
