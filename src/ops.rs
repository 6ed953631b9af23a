//! Binary operators on values and tables.
//!
//! Each operator is an uninhabited enum named after its [`std::ops`] trait,
//! e.g. [`Add`], implementing [`Binary`] over [`Value`]s. Passing one as a
//! type parameter to [`NTable::binary()`] applies it elementwise.
//!
//! Operators on a [`NTable`] contain failures, so `&table + 1` returns a
//! `Result<NTable>` whose elements may be [`Failure`]s.
//!
//! [`Failure`]: super::Failure

use super::{ElementError, Func, Handler, NTable, Result, Value};

/// A binary operator on [`Value`]s.
///
/// Implementors only supply [`op()`] for plain values. `Null` absorption,
/// recursion into nested tables, and the tabularized [`Func`] come from the
/// provided methods.
///
/// [`op()`]: Self::op()
pub trait Binary: Sized + 'static {
    /// The operator symbol, for error messages.
    const SYMBOL: &'static str;

    /// The name of the [`Func`] returned by [`func()`].
    ///
    /// [`func()`]: Self::func()
    const NAME: &'static str;

    /// The operator on two values that are neither `Null` nor tables.
    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError>;

    /// The operator on any two values. `Null` absorbs, and tables apply
    /// elementwise.
    fn call(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (a, b) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Table(t), _) => Ok(Value::Table(t.binary::<Self>(b.clone())?)),
            (_, Value::Table(t)) => Ok(Value::Table(t.rbinary::<Self>(a.clone())?)),
            _ => Self::op(a, b),
        }
    }

    fn func() -> Func {
        Func::new(Self::NAME, |args| match args {
            [a, b] => Self::call(a, b),
            _ => Err(ElementError::type_error(format!(
                "{}() expected 2 arguments, got {}", Self::NAME, args.len(),
            ))),
        })
    }
}

fn unsupported(symbol: &str, a: &Value, b: &Value) -> ElementError {
    ElementError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'", symbol, a.type_name(), b.type_name(),
    ))
}

fn overflow() -> ElementError { ElementError::value("integer overflow") }

#[derive(Copy, Clone)]
enum Num {
    I(i64),
    F(f64),
}

fn num(v: &Value) -> Option<Num> {
    match v {
        Value::Bool(b) => Some(Num::I(i64::from(*b))),
        Value::Int(i) => Some(Num::I(*i)),
        Value::Float(x) => Some(Num::F(*x)),
        _ => None,
    }
}

fn to_f64(n: Num) -> f64 {
    match n {
        Num::I(i) => i as f64,
        Num::F(x) => x,
    }
}

fn arith(
    a: Num,
    b: Num,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> std::result::Result<Value, ElementError> {
    match (a, b) {
        (Num::I(x), Num::I(y)) => int(x, y).map(Value::Int).ok_or_else(overflow),
        _ => Ok(Value::Float(float(to_f64(a), to_f64(b)))),
    }
}

fn repeat<T: Clone>(items: &[T], n: i64) -> Vec<T> {
    let n = usize::try_from(n).unwrap_or(0);
    let mut out = Vec::with_capacity(items.len() * n);
    for _ in 0..n { out.extend_from_slice(items); }
    out
}

// ----------------------------------------------------------------------------

pub enum Add {}

impl Binary for Add {
    const SYMBOL: &'static str = "+";
    const NAME: &'static str = "add";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        if let (Some(x), Some(y)) = (num(a), num(b)) { return arith(x, y, i64::checked_add, |x, y| x + y); }
        match (a, b) {
            (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{}{}", x, y))),
            (Value::List(x), Value::List(y)) => Ok(Value::List([x.as_slice(), y].concat())),
            (Value::Tuple(x), Value::Tuple(y)) => Ok(Value::Tuple([x.as_slice(), y].concat())),
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

pub enum Sub {}

impl Binary for Sub {
    const SYMBOL: &'static str = "-";
    const NAME: &'static str = "sub";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (num(a), num(b)) {
            (Some(x), Some(y)) => arith(x, y, i64::checked_sub, |x, y| x - y),
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

pub enum Mul {}

impl Binary for Mul {
    const SYMBOL: &'static str = "*";
    const NAME: &'static str = "mul";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        if let (Some(x), Some(y)) = (num(a), num(b)) { return arith(x, y, i64::checked_mul, |x, y| x * y); }
        match (a, b) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                Ok(Value::Str(s.repeat(usize::try_from(*n).unwrap_or(0))))
            },
            (Value::List(v), Value::Int(n)) | (Value::Int(n), Value::List(v)) => Ok(Value::List(repeat(v, *n))),
            (Value::Tuple(v), Value::Int(n)) | (Value::Int(n), Value::Tuple(v)) => Ok(Value::Tuple(repeat(v, *n))),
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

pub enum Div {}

impl Binary for Div {
    const SYMBOL: &'static str = "/";
    const NAME: &'static str = "truediv";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (num(a), num(b)) {
            (Some(x), Some(y)) => {
                let y = to_f64(y);
                if y == 0.0 { return Err(ElementError::zero_division("division by zero")); }
                Ok(Value::Float(to_f64(x) / y))
            },
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

/// Modulo with the sign of the divisor.
pub enum Rem {}

impl Binary for Rem {
    const SYMBOL: &'static str = "%";
    const NAME: &'static str = "mod";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (num(a), num(b)) {
            (Some(Num::I(x)), Some(Num::I(y))) => {
                if y == 0 { return Err(ElementError::zero_division("integer modulo by zero")); }
                let r = x.wrapping_rem(y);
                Ok(Value::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r }))
            },
            (Some(x), Some(y)) => {
                let (x, y) = (to_f64(x), to_f64(y));
                if y == 0.0 { return Err(ElementError::zero_division("float modulo")); }
                let r = x % y;
                Ok(Value::Float(if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }))
            },
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

fn bitwise(
    symbol: &str,
    a: &Value,
    b: &Value,
    f: fn(i64, i64) -> i64,
) -> std::result::Result<Value, ElementError> {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(f(i64::from(*x), i64::from(*y)) != 0)),
        _ => match (num(a), num(b)) {
            (Some(Num::I(x)), Some(Num::I(y))) => Ok(Value::Int(f(x, y))),
            _ => Err(unsupported(symbol, a, b)),
        },
    }
}

pub enum BitAnd {}

impl Binary for BitAnd {
    const SYMBOL: &'static str = "&";
    const NAME: &'static str = "and_";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        bitwise(Self::SYMBOL, a, b, |x, y| x & y)
    }
}

// ----------------------------------------------------------------------------

pub enum BitOr {}

impl Binary for BitOr {
    const SYMBOL: &'static str = "|";
    const NAME: &'static str = "or_";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        bitwise(Self::SYMBOL, a, b, |x, y| x | y)
    }
}

// ----------------------------------------------------------------------------

pub enum BitXor {}

impl Binary for BitXor {
    const SYMBOL: &'static str = "^";
    const NAME: &'static str = "xor";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        bitwise(Self::SYMBOL, a, b, |x, y| x ^ y)
    }
}

// ----------------------------------------------------------------------------

fn shift_count(n: i64) -> std::result::Result<u32, ElementError> {
    if n < 0 { return Err(ElementError::value("negative shift count")); }
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

pub enum Shl {}

impl Binary for Shl {
    const SYMBOL: &'static str = "<<";
    const NAME: &'static str = "lshift";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (num(a), num(b)) {
            (Some(Num::I(x)), Some(Num::I(n))) => {
                let n = shift_count(n)?;
                if x == 0 { return Ok(Value::Int(0)); }
                if n >= 64 { return Err(overflow()); }
                i64::try_from(i128::from(x) << n).map(Value::Int).map_err(|_| overflow())
            },
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

pub enum Shr {}

impl Binary for Shr {
    const SYMBOL: &'static str = ">>";
    const NAME: &'static str = "rshift";

    fn op(a: &Value, b: &Value) -> std::result::Result<Value, ElementError> {
        match (num(a), num(b)) {
            (Some(Num::I(x)), Some(Num::I(n))) => {
                let n = shift_count(n)?.min(63);
                Ok(Value::Int(x >> n))
            },
            _ => Err(unsupported(Self::SYMBOL, a, b)),
        }
    }
}

// ----------------------------------------------------------------------------

impl NTable {
    /// `self <op> other`, elementwise, with failures contained.
    pub fn binary<O: Binary>(&self, other: impl Into<Value>) -> Result<NTable> {
        self.run(O::func().handled(Handler::Silent), vec![self.into(), other.into()])
    }

    /// `other <op> self`, elementwise, with failures contained.
    pub fn rbinary<O: Binary>(&self, other: impl Into<Value>) -> Result<NTable> {
        self.run(O::func().handled(Handler::Silent), vec![other.into(), self.into()])
    }
}

/// Implement one of the [`std::ops`] traits for [`NTable`] and `&NTable`,
/// with any right-hand side that converts into a [`Value`].
///
/// You perhaps want to use `impl_ops_for_table` instead, which calls this.
macro_rules! impl_op_for_table {
    ($op:ident { $method:ident }) => {
        impl<R: Into<$crate::Value>> std::ops::$op<R> for &$crate::NTable {
            type Output = $crate::Result<$crate::NTable>;
            fn $method(self, other: R) -> Self::Output { self.binary::<$crate::ops::$op>(other) }
        }

        impl<R: Into<$crate::Value>> std::ops::$op<R> for $crate::NTable {
            type Output = $crate::Result<$crate::NTable>;
            fn $method(self, other: R) -> Self::Output { self.binary::<$crate::ops::$op>(other) }
        }
    };
}

/// Implement all of the [`std::ops`] binary operator traits for [`NTable`].
/// The implementations call [`NTable::binary()`].
macro_rules! impl_ops_for_table {
    () => {
        impl_op_for_table! { Add { add } }
        impl_op_for_table! { Sub { sub } }
        impl_op_for_table! { Mul { mul } }
        impl_op_for_table! { Div { div } }
        impl_op_for_table! { Rem { rem } }
        impl_op_for_table! { BitAnd { bitand } }
        impl_op_for_table! { BitOr { bitor } }
        impl_op_for_table! { BitXor { bitxor } }
        impl_op_for_table! { Shl { shl } }
        impl_op_for_table! { Shr { shr } }
    };
}

impl_ops_for_table!();

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{Coords, ErrorKind};

    fn nums() -> NTable {
        NTable::from_vec(Coords::one("k", ["a", "b", "c"]).unwrap(), vec![1.into(), 2.5.into(), "x".into()]).unwrap()
    }

    #[test]
    fn scalar_ops() {
        assert_eq!(Add::call(&Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(Add::call(&Value::from("a"), &Value::from("b")).unwrap(), Value::from("ab"));
        assert_eq!(Mul::call(&Value::from("ab"), &Value::Int(2)).unwrap(), Value::from("abab"));
        assert_eq!(Div::call(&Value::Int(1), &Value::Int(2)).unwrap(), Value::Float(0.5));
        assert_eq!(Rem::call(&Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(Shr::call(&Value::Int(-8), &Value::Int(100)).unwrap(), Value::Int(-1));
        assert_eq!(BitXor::call(&Value::Bool(true), &Value::Bool(true)).unwrap(), Value::Bool(false));
        assert!(Sub::call(&Value::Null, &Value::Int(1)).unwrap().is_null());
        assert_eq!(Div::call(&Value::Int(1), &Value::Int(0)).unwrap_err().kind, ErrorKind::ZeroDivision);
        assert_eq!(Add::call(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err().kind, ErrorKind::Value);
        assert_eq!(Shl::call(&Value::Int(1), &Value::Int(-1)).unwrap_err().kind, ErrorKind::Value);
        assert_eq!(Sub::call(&Value::from("a"), &Value::Int(1)).unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn table_ops() {
        let t = nums();
        let sum = (&t + 1).unwrap();
        let values = sum.values();
        assert_eq!(values[0], Value::Int(2));
        assert_eq!(values[1], Value::Float(3.5));
        assert!(values[2].is_failure());
        let doubled = (&t + &t).unwrap();
        assert_eq!(doubled.values()[2], Value::from("xx"));
        let r = t.rbinary::<Sub>(10).unwrap();
        assert_eq!(r.values()[0], Value::Int(9));
    }

    #[test]
    fn nested_tables() {
        let inner = NTable::from_vec(Coords::one("i", [0, 1]).unwrap(), vec![1.into(), 2.into()]).unwrap();
        let outer = NTable::from_vec(Coords::one("o", [0]).unwrap(), vec![inner.into()]).unwrap();
        let out = (outer * 3).unwrap();
        let nested = out.values()[0].as_table().cloned().unwrap();
        assert_eq!(nested.values(), vec![Value::Int(3), Value::Int(6)]);
    }
}
