use crate::error::LexError;
use crate::frame::Frame;
use crate::number::Number;
use function_name::named;
use itertools::Itertools;
use std::any::Any;
use std::convert::TryFrom;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

pub const NIL: &str = "nil";
pub const TRUE: &str = "true";

/// Host value stored as is in a frame. Compared by identity.
#[derive(Clone)]
pub struct Opaque {
    inner: Arc<dyn Any + Send + Sync>,
    label: Arc<String>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            label: Arc::new(std::any::type_name::<T>().to_string()),
        }
    }

    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }
}

impl Debug for Opaque {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<{}>", self.label)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Values bound to names in a frame.
/// The frame never inspects them; they are shared by reference when cloned.
#[derive(Clone, Debug)]
pub enum Value {
    Symbol(Arc<String>),
    String(Arc<String>),
    Number(Number),
    List(Arc<Vec<Value>>),
    /// A captured environment.
    Frame(Frame),
    Opaque(Opaque),
    True,
    Nil,
}

/// Kinds of Value, used in error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KindValue {
    Symbol,
    String,
    Number,
    List,
    Frame,
    Opaque,
    True,
    Nil,
    Bool,
    Int,
}

impl Display for KindValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            KindValue::Symbol => "symbol",
            KindValue::String => "string",
            KindValue::Number => "number",
            KindValue::List => "list",
            KindValue::Frame => "frame",
            KindValue::Opaque => "opaque",
            KindValue::True => TRUE,
            KindValue::Nil => NIL,
            KindValue::Bool => "bool",
            KindValue::Int => "int",
        };
        write!(f, "{}", str)
    }
}

impl Value {
    pub fn get_kind(&self) -> KindValue {
        match self {
            Value::Symbol(_) => KindValue::Symbol,
            Value::String(_) => KindValue::String,
            Value::Number(_) => KindValue::Number,
            Value::List(_) => KindValue::List,
            Value::Frame(_) => KindValue::Frame,
            Value::Opaque(_) => KindValue::Opaque,
            Value::True => KindValue::True,
            Value::Nil => KindValue::Nil,
        }
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Value::Symbol(Arc::new(s.into()))
    }

    /// Adds two numbers, used by counters in scopes.
    #[named]
    pub fn try_add(&self, other: &Value) -> Result<Value, LexError> {
        match (self, other) {
            (Value::Number(n1), Value::Number(n2)) => Ok(Value::Number(n1 + n2)),
            (Value::Number(_), lv) | (lv, _) => Err(LexError::wrong_type(
                function_name!(),
                lv,
                KindValue::Number,
            )),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Symbol(s) => write!(f, "{}", s),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::List(list) => write!(f, "({})", list.iter().join(" ")),
            Value::Frame(frame) => write!(f, "#<frame {}>", frame.id()),
            Value::Opaque(o) => write!(f, "{:?}", o),
            Value::True => write!(f, "{}", TRUE),
            Value::Nil => write!(f, "{}", NIL),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(n1), Value::Number(n2)) => n1 == n2,
            (Value::Symbol(s1), Value::Symbol(s2)) => s1 == s2,
            (Value::String(s1), Value::String(s2)) => s1 == s2,
            (Value::List(l1), Value::List(l2)) => l1 == l2,
            (Value::Frame(f1), Value::Frame(f2)) => f1.ptr_eq(f2),
            (Value::Opaque(o1), Value::Opaque(o2)) => o1 == o2,
            (Value::True, Value::True) => true,
            (Value::Nil, Value::Nil) => true,
            (_, _) => false,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::True
        } else {
            Value::Nil
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(i.into())
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(i.into())
    }
}

impl From<usize> for Value {
    fn from(u: usize) -> Self {
        Value::Number(u.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::new(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::new(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(vec: Vec<Value>) -> Self {
        if vec.is_empty() {
            Value::Nil
        } else {
            Value::List(Arc::new(vec))
        }
    }
}

impl From<Frame> for Value {
    fn from(frame: Frame) -> Self {
        Value::Frame(frame)
    }
}

impl From<&Frame> for Value {
    fn from(frame: &Frame) -> Self {
        Value::Frame(frame.clone())
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

impl TryFrom<&Value> for i64 {
    type Error = LexError;

    #[named]
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => i64::try_from(n).map_err(|e| e.chain(function_name!())),
            lv => Err(LexError::wrong_type(function_name!(), lv, KindValue::Number)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = LexError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&Value> for bool {
    type Error = LexError;

    #[named]
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::True => Ok(true),
            Value::Nil => Ok(false),
            lv => Err(LexError::wrong_type(function_name!(), lv, KindValue::Bool)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;

    #[test]
    fn test_display() {
        let list: Value = vec![Value::from(1), Value::from("a"), Value::symbol("b")].into();
        assert_eq!(list.to_string(), "(1 \"a\" b)");
        assert_eq!(Value::from(false).to_string(), NIL);
    }

    #[test]
    fn test_try_add() {
        let sum = Value::from(1).try_add(&Value::from(2.5)).unwrap();
        assert_eq!(sum, Value::from(3.5));
        let err = Value::from(1).try_add(&Value::from("x")).unwrap_err();
        assert!(err.get_message().contains("string"));
    }

    #[test]
    fn test_opaque_identity() {
        let o = Opaque::new(vec![1u8, 2, 3]);
        let same: Value = o.clone().into();
        let other: Value = Opaque::new(vec![1u8, 2, 3]).into();
        assert_eq!(same, Value::Opaque(o.clone()));
        assert_ne!(same, other);
        assert_eq!(o.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
    }

    #[test]
    fn test_conversions() {
        let i: i64 = Value::from(7).try_into().unwrap();
        assert_eq!(i, 7);
        let b: bool = (&Value::True).try_into().unwrap();
        assert!(b);
        assert!(i64::try_from(&Value::Nil).is_err());
        assert!(i64::try_from(&Value::from(0.5)).is_err());
    }
}
