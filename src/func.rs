//! Named callables, per-element failure containment, and the element
//! operations that tabularized entry points are built from.

use std::fmt::{self, Debug};
use std::sync::{Arc};

use super::{ElementError, Value};

/// The signature of a [`Func`].
pub type FuncImpl = dyn Fn(&[Value]) -> Result<Value, ElementError> + Send + Sync;

/// A named function of [`Value`]s.
///
/// Two `Func`s are equal if they have the same name. Cloning a `Func` is
/// cheap and shares the implementation.
///
/// ```
/// use ntable::{Func, Value};
/// let twice = Func::new("twice", |args| Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2)));
/// assert_eq!(twice.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
/// ```
#[derive(Clone)]
pub struct Func {
    name: Arc<str>,
    imp: Arc<FuncImpl>,
}

impl Func {
    pub fn new(
        name: impl AsRef<str>,
        f: impl Fn(&[Value]) -> Result<Value, ElementError> + Send + Sync + 'static,
    ) -> Self {
        Self {name: Arc::from(name.as_ref()), imp: Arc::new(f)}
    }

    pub fn name(&self) -> &str { &self.name }

    #[inline(always)]
    pub fn call(&self, args: &[Value]) -> Result<Value, ElementError> { (self.imp)(args) }

    /// Returns a `Func` that never fails: an error raised by `self` is
    /// returned as a [`Value::Failure`] capturing the error, `self`, and the
    /// arguments.
    pub fn handled(&self, handler: Handler) -> Func {
        let inner = self.clone();
        Func::new(self.name(), move |args| match inner.call(args) {
            Ok(v) => Ok(v),
            Err(error) => {
                if handler == Handler::Warn {
                    tracing::warn!(func = inner.name(), %error, "element operation failed");
                }
                Ok(Value::from(Failure {error, func: inner.clone(), args: args.to_vec()}))
            },
        })
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool { self.name == other.name }
}

impl Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Func({})", self.name) }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name) }
}

/// How [`Func::handled()`] reports a contained failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Convert the error to a [`Failure`] without further notice.
    Silent,
    /// Emit a `tracing` warning, then convert the error to a [`Failure`].
    Warn,
}

// ----------------------------------------------------------------------------

/// A failed call, captured as data.
///
/// Failures are falsy. Two failures are equal if their errors (kind and
/// message), functions, and arguments are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: ElementError,
    pub func: Func,
    pub args: Vec<Value>,
}

impl Failure {
    /// Call the function again with the same arguments.
    pub fn retry(&self) -> Result<Value, ElementError> { self.func.call(&self.args) }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure({}: {})", self.func, self.error)
    }
}

// ----------------------------------------------------------------------------

fn arity<'a>(name: &str, args: &'a [Value], min: usize) -> Result<&'a [Value], ElementError> {
    if args.len() < min {
        return Err(ElementError::type_error(format!(
            "{}() expected at least {} arguments, got {}", name, min, args.len(),
        )));
    }
    Ok(args)
}

fn name_arg<'a>(name: &str, v: &'a Value) -> Result<&'a str, ElementError> {
    v.as_str().ok_or_else(|| ElementError::type_error(format!(
        "{}(): attribute name must be str, not '{}'", name, v.type_name(),
    )))
}

/// `obj[index]`.
pub fn getitem() -> Func {
    Func::new("getitem", |args| {
        let args = arity("getitem", args, 2)?;
        args[0].get_item(&args[1])
    })
}

/// `obj[index] = value`, returning the updated `obj`.
pub fn setitem() -> Func {
    Func::new("setitem", |args| {
        let args = arity("setitem", args, 3)?;
        args[0].set_item(&args[1], args[2].clone())
    })
}

/// `f(args...)`.
pub fn call() -> Func {
    Func::new("call", |args| {
        let args = arity("call", args, 1)?;
        args[0].call(&args[1..])
    })
}

/// `obj.name`.
pub fn getattr() -> Func {
    Func::new("getattr", |args| {
        let args = arity("getattr", args, 2)?;
        args[0].get_attr(name_arg("getattr", &args[1])?)
    })
}

/// `obj.name = value`.
pub fn setattr() -> Func {
    Func::new("setattr", |args| {
        let args = arity("setattr", args, 3)?;
        args[0].set_attr(name_arg("setattr", &args[1])?, args[2].clone())
    })
}

/// `obj.name(args...)`.
pub fn call_method() -> Func {
    Func::new("call_method", |args| {
        let args = arity("call_method", args, 2)?;
        args[0].call_method(name_arg("call_method", &args[1])?, &args[2..])
    })
}
