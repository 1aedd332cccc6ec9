use crate::error::LexError;
use crate::value::{KindValue, Value};
use function_name::named;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::ops::{Add, Mul, Neg, Sub};

/// Representation of numbers bound in a frame:
/// - Int(i64)
/// - Float(f64)
///
/// Integer arithmetic that would overflow falls back to floats.
#[derive(Copy, Debug, Clone)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn is_integer(&self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(i1), Number::Int(i2)) => i1 == i2,
            (n1, n2) => f64::from(n1) == f64::from(n2),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(i1), Number::Int(i2)) => i1.partial_cmp(i2),
            (n1, n2) => f64::from(n1).partial_cmp(&f64::from(n2)),
        }
    }
}

impl From<&Number> for f64 {
    fn from(n: &Number) -> Self {
        match n {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

/// Floats convert only when integral and within the range of `i64`.
impl TryFrom<&Number> for i64 {
    type Error = LexError;

    #[named]
    fn try_from(n: &Number) -> Result<Self, Self::Error> {
        match n {
            Number::Int(i) => Ok(*i),
            Number::Float(f)
                if n.is_integer() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Ok(*f as i64)
            }
            n => Err(LexError::wrong_type(
                function_name!(),
                &Value::Number(*n),
                KindValue::Int,
            )),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i)
    }
}

impl From<i32> for Number {
    fn from(i: i32) -> Self {
        Number::Int(i as i64)
    }
}

impl From<usize> for Number {
    fn from(u: usize) -> Self {
        Number::Int(u as i64)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::Float(f)
    }
}

impl TryFrom<&Value> for Number {
    type Error = LexError;

    #[named]
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => Ok(*n),
            lv => Err(LexError::wrong_type(function_name!(), lv, KindValue::Number)),
        }
    }
}

impl Add for &Number {
    type Output = Number;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(i1), Number::Int(i2)) => i1
                .checked_add(*i2)
                .map(Number::Int)
                .unwrap_or_else(|| Number::Float(*i1 as f64 + *i2 as f64)),
            (n1, n2) => Number::Float(f64::from(n1) + f64::from(n2)),
        }
    }
}

impl Sub for &Number {
    type Output = Number;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(i1), Number::Int(i2)) => i1
                .checked_sub(*i2)
                .map(Number::Int)
                .unwrap_or_else(|| Number::Float(*i1 as f64 - *i2 as f64)),
            (n1, n2) => Number::Float(f64::from(n1) - f64::from(n2)),
        }
    }
}

impl Mul for &Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Int(i1), Number::Int(i2)) => i1
                .checked_mul(*i2)
                .map(Number::Int)
                .unwrap_or_else(|| Number::Float(*i1 as f64 * *i2 as f64)),
            (n1, n2) => Number::Float(f64::from(n1) * f64::from(n2)),
        }
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        match self {
            Number::Int(i) => i
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(i as f64))),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}
