//! # 🧩 Modelo de valores
//!
//! Rust não tem reflexão em tempo de execução. A capacidade
//! "enumerar membros de um valor" é expressa por um modelo dinâmico:
//!
//! - folhas ([`Value::Bool`], [`Value::Int`], [`Value::Str`], ...);
//! - coleções ([`Value::Seq`], [`Value::Bytes`]) e dicionários ([`Value::Map`]);
//! - objetos compostos ([`Value::Object`]), que têm identidade e podem
//!   formar ciclos via [`ObjectRef`].
//!
//! Tipos que implementam `serde::Serialize` entram no modelo por
//! [`Value::from_serialize`]; grafos cíclicos são construídos à mão.

use std::cell::{BorrowError, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ser::ValueSerializer;

/// Tipo de membro de um registro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Membro exposto por acessor
    Property,
    /// Campo de dados (o que o serde produz)
    Field,
}

/// Membro nomeado de um registro
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub value: Value,
}

/// Objeto composto: nome de tipo + membros em ordem de declaração
#[derive(Debug, Clone, Default)]
pub struct Record {
    type_name: String,
    members: Vec<Member>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Adiciona (ou substitui) uma propriedade
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_member(name, MemberKind::Property, value);
        self
    }

    /// Adiciona (ou substitui) um campo
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_member(name, MemberKind::Field, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set_member(name, MemberKind::Property, value);
    }

    /// Define um membro. Um nome já existente é substituído no lugar:
    /// a declaração mais derivada esconde a anterior.
    pub fn set_member(&mut self, name: impl Into<String>, kind: MemberKind, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.members.iter_mut().find(|m| m.name == name) {
            Some(existing) => {
                existing.kind = kind;
                existing.value = value;
            }
            None => self.members.push(Member { name, kind, value }),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.member(name).map(|m| &m.value)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Referência compartilhada a um [`Record`], com identidade
///
/// Dois `ObjectRef` criados separadamente nunca têm a mesma identidade,
/// mesmo com conteúdo igual; clones compartilham a identidade.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Record>>);

impl ObjectRef {
    pub fn new(record: Record) -> Self {
        Self(Rc::new(RefCell::new(record)))
    }

    pub fn borrow(&self) -> Ref<'_, Record> {
        self.0.borrow()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, Record>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Record> {
        self.0.borrow_mut()
    }

    /// Define uma propriedade depois da criação (usado para fechar ciclos)
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().set(name, value);
    }

    /// Endereço estável do registro compartilhado
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn type_name(&self) -> String {
        self.0.borrow().type_name().to_string()
    }
}

impl fmt::Debug for ObjectRef {
    // Nunca desce nos membros: o grafo pode ser cíclico
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(record) => write!(f, "ObjectRef({}@{:#x})", record.type_name(), self.identity()),
            Err(_) => write!(f, "ObjectRef(<borrowed>@{:#x})", self.identity()),
        }
    }
}

/// Valor dinâmico comparável
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    DateTime(NaiveDateTime),
    /// Sequência de bytes: sempre comparada em ordem
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    /// Dicionário em ordem de inserção
    Map(Vec<(Value, Value)>),
    Object(ObjectRef),
    /// Membro cujo valor não pôde ser lido
    Inaccessible(String),
}

impl Value {
    /// Converte qualquer `Serialize` para o modelo dinâmico.
    ///
    /// Um campo cuja serialização falha vira [`Value::Inaccessible`] em vez
    /// de abortar a conversão inteira.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
        value
            .serialize(ValueSerializer)
            .unwrap_or_else(|e| Value::Inaccessible(e.to_string()))
    }

    pub fn seq<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(bytes.into())
    }

    pub fn object(record: Record) -> Value {
        Value::Object(ObjectRef::new(record))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Sequência enumerável (inclui bytes, exclui dicionários)
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Bytes(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_) | Value::Float(_))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Número de elementos de uma coleção ou dicionário
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Seq(items) => Some(items.len()),
            Value::Bytes(bytes) => Some(bytes.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Tipo em tempo de execução, usado como "tipo declarado" em predicados
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "i64".into(),
            Value::UInt(_) => "u64".into(),
            Value::Float(_) => "f64".into(),
            Value::Str(_) => "string".into(),
            Value::DateTime(_) => "datetime".into(),
            Value::Bytes(_) => "bytes".into(),
            Value::Seq(_) => "sequence".into(),
            Value::Map(_) => "dictionary".into(),
            Value::Object(obj) => obj.type_name(),
            Value::Inaccessible(_) => "inaccessible".into(),
        }
    }

    /// Igualdade estrita profunda.
    ///
    /// Números de tipos diferentes são comparados pelo valor numérico.
    /// Objetos são comparados membro a membro; pares já em comparação são
    /// assumidos iguais, o que termina em grafos cíclicos.
    pub fn strict_eq(&self, other: &Value) -> bool {
        let mut visiting = HashSet::new();
        strict_eq_inner(self, other, &mut visiting)
    }
}

fn numbers_equal(a: &Value, b: &Value) -> Option<bool> {
    let eq = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::UInt(x), Value::UInt(y)) => x == y,
        (Value::Int(x), Value::UInt(y)) | (Value::UInt(y), Value::Int(x)) => {
            i128::from(*x) == i128::from(*y)
        }
        // NaN == NaN
        (Value::Float(x), Value::Float(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::Float(f), other) | (other, Value::Float(f)) => match other {
            Value::Int(i) => *f == *i as f64,
            Value::UInt(u) => *f == *u as f64,
            _ => return None,
        },
        _ => return None,
    };
    Some(eq)
}

fn strict_eq_inner(a: &Value, b: &Value, visiting: &mut HashSet<(usize, usize)>) -> bool {
    if let Some(eq) = numbers_equal(a, b) {
        return eq;
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::DateTime(x), Value::DateTime(y)) => x == y,
        (Value::Bytes(x), Value::Bytes(y)) => x == y,
        (Value::Seq(x), Value::Seq(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| strict_eq_inner(l, r, visiting))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter().all(|(key, value)| {
                    y.iter()
                        .find(|(other_key, _)| strict_eq_inner(key, other_key, visiting))
                        .is_some_and(|(_, other)| strict_eq_inner(value, other, visiting))
                })
        }
        (Value::Object(x), Value::Object(y)) => {
            if x.ptr_eq(y) {
                return true;
            }
            let pair = (x.identity(), y.identity());
            if !visiting.insert(pair) {
                return true;
            }
            let (left, right) = (x.borrow(), y.borrow());
            let equal = left.type_name() == right.type_name()
                && left.len() == right.len()
                && left.members().iter().all(|member| {
                    right
                        .get(&member.name)
                        .is_some_and(|other| strict_eq_inner(&member.value, other, visiting))
                });
            visiting.remove(&pair);
            equal
        }
        (Value::Inaccessible(x), Value::Inaccessible(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

// =============================================================================
// Conversões
// =============================================================================

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::object(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<&ObjectRef> for Value {
    fn from(v: &ObjectRef) -> Self {
        Value::Object(v.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::seq(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::seq(items),
            serde_json::Value::Object(fields) => {
                let mut record = Record::new("object");
                for (name, value) in fields {
                    record.set(name, Value::from(value));
                }
                Value::object(record)
            }
        }
    }
}
