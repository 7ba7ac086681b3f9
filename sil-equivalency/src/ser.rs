//! Serializer serde → [`Value`]
//!
//! Structs viram registros (membros do tipo `Field`), mapas viram
//! dicionários, sequências e tuplas viram `Seq`, `serialize_bytes` vira
//! `Bytes`. Uma sequência não vazia em que todo elemento passou por
//! `serialize_u8` (`Vec<u8>`, `[u8; N]`) também vira `Bytes`, que é
//! sempre comparado em ordem. Variantes unitárias viram o nome da variante; variantes com
//! dados viram um registro `Enum::Variant`.
//!
//! Falhas de serialização dentro de um campo ficam confinadas ao campo
//! ([`Value::Inaccessible`]).

use std::fmt::Display;

use serde::ser::{self, Impossible, Serialize};
use thiserror::Error;

use crate::value::{MemberKind, Record, Value};

/// Erro de serialização para o modelo dinâmico
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SerializeError(String);

impl ser::Error for SerializeError {
    fn custom<T: Display>(msg: T) -> Self {
        SerializeError(msg.to_string())
    }
}

/// Converte `T` para [`Value`], propagando erros de topo
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, SerializeError> {
    value.serialize(ValueSerializer)
}

fn tolerant<T: Serialize + ?Sized>(value: &T) -> Value {
    value
        .serialize(ValueSerializer)
        .unwrap_or_else(|e| Value::Inaccessible(e.to_string()))
}

pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = SerializeError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = RecordBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = RecordBuilder;
    type SerializeStructVariant = RecordBuilder;

    fn serialize_bool(self, v: bool) -> Result<Value, SerializeError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, SerializeError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, SerializeError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, SerializeError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, SerializeError> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, SerializeError> {
        if let Ok(i) = i64::try_from(v) {
            Ok(Value::Int(i))
        } else if let Ok(u) = u64::try_from(v) {
            Ok(Value::UInt(u))
        } else {
            Ok(Value::Float(v as f64))
        }
    }

    fn serialize_u8(self, v: u8) -> Result<Value, SerializeError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, SerializeError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, SerializeError> {
        Ok(Value::UInt(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, SerializeError> {
        Ok(Value::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, SerializeError> {
        match u64::try_from(v) {
            Ok(u) => Ok(Value::UInt(u)),
            Err(_) => Ok(Value::Float(v as f64)),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Value, SerializeError> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, SerializeError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, SerializeError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, SerializeError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, SerializeError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, SerializeError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, SerializeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, SerializeError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, SerializeError> {
        Ok(Value::object(Record::new(name)))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, SerializeError> {
        Ok(Value::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, SerializeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, SerializeError> {
        let record = Record::new(format!("{name}::{variant}")).with_field("0", tolerant(value));
        Ok(Value::object(record))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder, SerializeError> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
            all_bytes: true,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder, SerializeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder, SerializeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<RecordBuilder, SerializeError> {
        Ok(RecordBuilder::new(format!("{name}::{variant}")))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder, SerializeError> {
        Ok(MapBuilder {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<RecordBuilder, SerializeError> {
        Ok(RecordBuilder::new(name.to_string()))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<RecordBuilder, SerializeError> {
        Ok(RecordBuilder::new(format!("{name}::{variant}")))
    }
}

pub struct SeqBuilder {
    items: Vec<Value>,
    /// Todo elemento até aqui veio de `serialize_u8`
    all_bytes: bool,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializeError> {
        if self.all_bytes {
            if let Ok(byte) = value.serialize(ByteProbe) {
                self.items.push(Value::UInt(u64::from(byte)));
                return Ok(());
            }
            self.all_bytes = false;
        }
        self.items.push(tolerant(value));
        Ok(())
    }

    fn end(self) -> Result<Value, SerializeError> {
        if self.all_bytes && !self.items.is_empty() {
            let bytes = self
                .items
                .iter()
                .filter_map(|item| match item {
                    Value::UInt(b) => u8::try_from(*b).ok(),
                    _ => None,
                })
                .collect();
            return Ok(Value::Bytes(bytes));
        }
        Ok(Value::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, SerializeError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, SerializeError> {
        ser::SerializeSeq::end(self)
    }
}

/// Aceita apenas `serialize_u8`; qualquer outra forma é rejeitada
struct ByteProbe;

macro_rules! reject {
    ($($method:ident($($arg:ty),*);)*) => {
        $(fn $method(self, $(_: $arg),*) -> Result<u8, SerializeError> {
            Err(SerializeError("not a byte".into()))
        })*
    };
}

impl ser::Serializer for ByteProbe {
    type Ok = u8;
    type Error = SerializeError;

    type SerializeSeq = Impossible<u8, SerializeError>;
    type SerializeTuple = Impossible<u8, SerializeError>;
    type SerializeTupleStruct = Impossible<u8, SerializeError>;
    type SerializeTupleVariant = Impossible<u8, SerializeError>;
    type SerializeMap = Impossible<u8, SerializeError>;
    type SerializeStruct = Impossible<u8, SerializeError>;
    type SerializeStructVariant = Impossible<u8, SerializeError>;

    fn serialize_u8(self, v: u8) -> Result<u8, SerializeError> {
        Ok(v)
    }

    reject! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
        serialize_bytes(&[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(&'static str);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<u8, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<u8, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<u8, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, SerializeError> {
        Err(SerializeError("not a byte".into()))
    }
}

pub struct MapBuilder {
    entries: Vec<(Value, Value)>,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for MapBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), SerializeError> {
        // Chave ilegível invalida o mapa inteiro: não há onde confiná-la
        self.pending_key = Some(key.serialize(ValueSerializer)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| SerializeError("map value serialized before its key".into()))?;
        self.entries.push((key, tolerant(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, SerializeError> {
        Ok(Value::Map(self.entries))
    }
}

pub struct RecordBuilder {
    record: Record,
    next_index: usize,
}

impl RecordBuilder {
    fn new(type_name: String) -> Self {
        Self {
            record: Record::new(type_name),
            next_index: 0,
        }
    }
}

impl ser::SerializeStruct for RecordBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SerializeError> {
        self.record.set_member(key, MemberKind::Field, tolerant(value));
        Ok(())
    }

    fn end(self) -> Result<Value, SerializeError> {
        Ok(Value::object(self.record))
    }
}

impl ser::SerializeStructVariant for RecordBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SerializeError> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value, SerializeError> {
        ser::SerializeStruct::end(self)
    }
}

impl ser::SerializeTupleVariant for RecordBuilder {
    type Ok = Value;
    type Error = SerializeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializeError> {
        let name = self.next_index.to_string();
        self.next_index += 1;
        self.record.set_member(name, MemberKind::Field, tolerant(value));
        Ok(())
    }

    fn end(self) -> Result<Value, SerializeError> {
        ser::SerializeStruct::end(self)
    }
}
