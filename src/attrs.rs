//! Attribute resolution for elements.
//!
//! Every element type exposes a fixed set of attributes. An [`AttrTable`]
//! collects the attributes of all types in a [`TypeSet`], so that a table can
//! decide whether `name` is callable without inspecting its elements.

use std::collections::{BTreeMap};
use std::sync::{Arc};

use super::{Class, ClassRef, ElementError, ElementType, Func, Method, TypeSet, Value};

/// A built-in attribute of a non-object type.
#[derive(Copy, Clone)]
pub enum Builtin {
    /// Computed from the receiver alone.
    Property(fn(&Value) -> Result<Value, ElementError>),
    /// Called with the receiver and further arguments.
    Method(fn(&Value, &[Value]) -> Result<Value, ElementError>),
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self { Self::Property(_) => "Property", Self::Method(_) => "Method" })
    }
}

/// How an attribute is implemented by the first type that declares it.
#[derive(Debug, Clone)]
pub enum Implementation {
    Builtin(Builtin),
    Field(Arc<Class>),
    Method(Method),
}

/// One row of an [`AttrTable`].
#[derive(Debug, Clone)]
pub struct AttrEntry {
    pub callable: bool,
    pub implementation: Implementation,
}

/// Attribute name to [`AttrEntry`], for the union of a set of types.
///
/// When several types declare the same name, the first in [`TypeSet`] order
/// provides the representative implementation.
#[derive(Debug, Clone, Default)]
pub struct AttrTable {
    entries: BTreeMap<String, AttrEntry>,
}

impl AttrTable {
    pub fn from_types(types: &TypeSet) -> Self {
        let mut entries = BTreeMap::new();
        for ty in types {
            if let ElementType::Object(ClassRef(class)) = ty {
                for field in class.fields() {
                    entries.entry(field.to_string()).or_insert_with(|| AttrEntry {
                        callable: false,
                        implementation: Implementation::Field(class.clone()),
                    });
                }
                for (name, method) in class.methods() {
                    entries.entry(name.to_string()).or_insert_with(|| AttrEntry {
                        callable: true,
                        implementation: Implementation::Method(method.clone()),
                    });
                }
            } else {
                for &(name, builtin) in builtins(ty) {
                    entries.entry(name.to_string()).or_insert_with(|| AttrEntry {
                        callable: matches!(builtin, Builtin::Method(_)),
                        implementation: Implementation::Builtin(builtin),
                    });
                }
            }
        }
        Self {entries}
    }

    pub fn get(&self, name: &str) -> Option<&AttrEntry> { self.entries.get(name) }

    /// `Some(callable)` if some type declares `name`.
    pub fn is_callable(&self, name: &str) -> Option<bool> { self.get(name).map(|e| e.callable) }

    pub fn names(&self) -> impl Iterator<Item=&str> { self.entries.keys().map(String::as_str) }
}

// ----------------------------------------------------------------------------

fn no_attribute(v: &Value, name: &str) -> ElementError {
    ElementError::attribute(format!("'{}' object has no attribute '{}'", v.type_name(), name))
}

fn find(ty: &ElementType, name: &str) -> Option<Builtin> {
    builtins(ty).iter().find(|(n, _)| *n == name).map(|&(_, b)| b)
}

impl Value {
    /// `self.name`. A method is returned as a bound [`Func`].
    pub fn get_attr(&self, name: &str) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::Object(o) => {
                if let Some(v) = o.field(name) { return Ok(v); }
                match o.class().method_named(name) {
                    Some(m) => Ok(bind(self, name, m.clone())),
                    None => Err(no_attribute(self, name)),
                }
            },
            Self::Table(t) => Ok(Self::Table(t.tattr().get(name)?)),
            _ => match find(&self.element_type(), name) {
                Some(Builtin::Property(p)) => p(self),
                Some(Builtin::Method(m)) => {
                    let receiver = self.clone();
                    Ok(Self::Func(Func::new(name, move |args| m(&receiver, args))))
                },
                None => Err(no_attribute(self, name)),
            },
        }
    }

    /// `self.name = value`. Only objects and tables have assignable
    /// attributes.
    pub fn set_attr(&self, name: &str, value: Value) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::Object(o) => { o.set_field(name, value)?; Ok(Self::Unit) },
            Self::Table(t) => { t.tattr().set(name, value)?; Ok(Self::Unit) },
            _ => Err(no_attribute(self, name)),
        }
    }

    /// `self.name(args...)`, without materializing a bound method.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::Object(o) => match o.class().method_named(name) {
                Some(m) => m.invoke(self, args),
                None => self.get_attr(name)?.call(args),
            },
            Self::Table(t) => Ok(Self::Table(t.call_method(name, args.to_vec())?)),
            _ => match find(&self.element_type(), name) {
                Some(Builtin::Method(m)) => m(self, args),
                Some(Builtin::Property(p)) => p(self)?.call(args),
                None => Err(no_attribute(self, name)),
            },
        }
    }
}

fn bind(receiver: &Value, name: &str, method: Method) -> Value {
    let receiver = receiver.clone();
    Value::Func(Func::new(name, move |args| method.invoke(&receiver, args)))
}

// ----------------------------------------------------------------------------

fn expect_args<'a>(name: &str, args: &'a [Value], n: usize) -> Result<&'a [Value], ElementError> {
    if args.len() != n {
        return Err(ElementError::type_error(format!(
            "{}() takes {} arguments but {} were given", name, n, args.len(),
        )));
    }
    Ok(args)
}

fn too_many(name: &str, max: usize, got: usize) -> ElementError {
    ElementError::type_error(format!("{}() takes at most {} arguments but {} were given", name, max, got))
}

fn str_arg<'a>(name: &str, v: &'a Value) -> Result<&'a str, ElementError> {
    v.as_str().ok_or_else(|| ElementError::type_error(format!(
        "{}() argument must be str, not '{}'", name, v.type_name(),
    )))
}

fn s(v: &Value) -> &str { v.as_str().unwrap_or_default() }

fn items(v: &Value) -> &[Value] {
    match v {
        Value::List(items) | Value::Tuple(items) => items,
        _ => &[],
    }
}

fn entries(v: &Value) -> &[(super::Label, Value)] {
    match v {
        Value::Map(m) => m,
        _ => &[],
    }
}

fn float(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

const STR: &[(&str, Builtin)] = &[
    ("len", Builtin::Property(|v| Ok(Value::from(s(v).chars().count())))),
    ("upper", Builtin::Method(|v, a| { expect_args("upper", a, 0)?; Ok(s(v).to_uppercase().into()) })),
    ("lower", Builtin::Method(|v, a| { expect_args("lower", a, 0)?; Ok(s(v).to_lowercase().into()) })),
    ("trim", Builtin::Method(|v, a| { expect_args("trim", a, 0)?; Ok(s(v).trim().into()) })),
    ("starts_with", Builtin::Method(|v, a| {
        let a = expect_args("starts_with", a, 1)?;
        Ok(Value::Bool(s(v).starts_with(str_arg("starts_with", &a[0])?)))
    })),
    ("ends_with", Builtin::Method(|v, a| {
        let a = expect_args("ends_with", a, 1)?;
        Ok(Value::Bool(s(v).ends_with(str_arg("ends_with", &a[0])?)))
    })),
    ("contains", Builtin::Method(|v, a| {
        let a = expect_args("contains", a, 1)?;
        Ok(Value::Bool(s(v).contains(str_arg("contains", &a[0])?)))
    })),
    ("split", Builtin::Method(|v, a| {
        let parts: Vec<Value> = match a {
            [] => s(v).split_whitespace().map(Value::from).collect(),
            [sep] => {
                let sep = str_arg("split", sep)?;
                if sep.is_empty() { return Err(ElementError::value("empty separator")); }
                s(v).split(sep).map(Value::from).collect()
            },
            _ => return Err(too_many("split", 1, a.len())),
        };
        Ok(Value::List(parts))
    })),
    ("replace", Builtin::Method(|v, a| {
        let a = expect_args("replace", a, 2)?;
        Ok(s(v).replace(str_arg("replace", &a[0])?, str_arg("replace", &a[1])?).into())
    })),
    ("chars", Builtin::Method(|v, a| { expect_args("chars", a, 0)?; v.iterate().map(Value::List) })),
];

const SEQ: &[(&str, Builtin)] = &[
    ("len", Builtin::Property(|v| Ok(Value::from(items(v).len())))),
    ("contains", Builtin::Method(|v, a| {
        let a = expect_args("contains", a, 1)?;
        Ok(Value::Bool(items(v).contains(&a[0])))
    })),
    ("first", Builtin::Method(|v, a| {
        expect_args("first", a, 0)?;
        items(v).first().cloned().ok_or_else(|| ElementError::index("first() of empty sequence"))
    })),
    ("last", Builtin::Method(|v, a| {
        expect_args("last", a, 0)?;
        items(v).last().cloned().ok_or_else(|| ElementError::index("last() of empty sequence"))
    })),
    ("reversed", Builtin::Method(|v, a| {
        expect_args("reversed", a, 0)?;
        let r: Vec<Value> = items(v).iter().rev().cloned().collect();
        Ok(if matches!(v, Value::Tuple(_)) { Value::Tuple(r) } else { Value::List(r) })
    })),
];

const MAP: &[(&str, Builtin)] = &[
    ("len", Builtin::Property(|v| Ok(Value::from(entries(v).len())))),
    ("keys", Builtin::Method(|v, a| {
        expect_args("keys", a, 0)?;
        Ok(Value::List(entries(v).iter().map(|(k, _)| k.clone().into()).collect()))
    })),
    ("values", Builtin::Method(|v, a| {
        expect_args("values", a, 0)?;
        Ok(Value::List(entries(v).iter().map(|(_, x)| x.clone()).collect()))
    })),
    ("get", Builtin::Method(|v, a| {
        let (key, default) = match a {
            [key] => (key, Value::Null),
            [key, default] => (key, default.clone()),
            _ => return Err(too_many("get", 2, a.len())),
        };
        let key = super::Label::try_from(key)?;
        Ok(entries(v).iter().find(|(k, _)| *k == key).map_or(default, |(_, x)| x.clone()))
    })),
    ("contains_key", Builtin::Method(|v, a| {
        let a = expect_args("contains_key", a, 1)?;
        let key = super::Label::try_from(&a[0])?;
        Ok(Value::Bool(entries(v).iter().any(|(k, _)| *k == key)))
    })),
];

const NUM: &[(&str, Builtin)] = &[
    ("abs", Builtin::Method(|v, a| {
        expect_args("abs", a, 0)?;
        match v {
            Value::Int(i) => i.checked_abs().map(Value::Int)
                .ok_or_else(|| ElementError::value("integer overflow in abs()")),
            _ => Ok(Value::Float(float(v).unwrap_or(f64::NAN).abs())),
        }
    })),
    ("pow", Builtin::Method(|v, a| {
        let a = expect_args("pow", a, 1)?;
        match (v, &a[0]) {
            (Value::Int(b), Value::Int(e)) if *e >= 0 => u32::try_from(*e).ok()
                .and_then(|e| b.checked_pow(e))
                .map(Value::Int)
                .ok_or_else(|| ElementError::value("integer overflow in pow()")),
            (_, e) => {
                let e = float(e).ok_or_else(|| ElementError::type_error(format!(
                    "pow() exponent must be a number, not '{}'", e.type_name(),
                )))?;
                Ok(Value::Float(float(v).unwrap_or(f64::NAN).powf(e)))
            },
        }
    })),
    ("to_float", Builtin::Method(|v, a| {
        expect_args("to_float", a, 0)?;
        Ok(Value::Float(float(v).unwrap_or(f64::NAN)))
    })),
    ("to_int", Builtin::Method(|v, a| {
        expect_args("to_int", a, 0)?;
        match v {
            Value::Int(i) => Ok(Value::Int(*i)),
            _ => {
                let x = float(v).unwrap_or(f64::NAN);
                if !x.is_finite() {
                    return Err(ElementError::value(format!("cannot convert float {} to integer", x)));
                }
                Ok(Value::Int(x.trunc() as i64))
            },
        }
    })),
];

/// The built-in attributes of `ty`.
pub fn builtins(ty: &ElementType) -> &'static [(&'static str, Builtin)] {
    match ty {
        ElementType::Str => STR,
        ElementType::List | ElementType::Tuple => SEQ,
        ElementType::Map => MAP,
        ElementType::Int | ElementType::Float => NUM,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{types_of, ErrorKind};

    #[test]
    fn properties_and_methods() {
        let v = Value::from("Hello World");
        assert_eq!(v.get_attr("len").unwrap(), Value::Int(11));
        assert_eq!(v.call_method("lower", &[]).unwrap(), Value::from("hello world"));
        let split = v.call_method("split", &[]).unwrap();
        assert_eq!(split, Value::list(["Hello", "World"]));
        let bound = v.get_attr("starts_with").unwrap();
        assert_eq!(bound.call(&["Hell".into()]).unwrap(), Value::Bool(true));
        assert_eq!(v.get_attr("nope").unwrap_err().kind, ErrorKind::Attribute);
        assert_eq!(v.set_attr("len", Value::Int(1)).unwrap_err().kind, ErrorKind::Attribute);
    }

    #[test]
    fn numbers() {
        assert_eq!(Value::Int(-3).call_method("abs", &[]).unwrap(), Value::Int(3));
        assert_eq!(Value::Int(2).call_method("pow", &[Value::Int(10)]).unwrap(), Value::Int(1024));
        assert_eq!(Value::Float(2.7).call_method("to_int", &[]).unwrap(), Value::Int(2));
        let e = Value::Float(f64::NAN).call_method("to_int", &[]).unwrap_err();
        assert_eq!(e.kind, ErrorKind::Value);
    }

    #[test]
    fn maps() {
        let m = Value::map([("a", 1)]);
        assert_eq!(m.call_method("get", &["a".into()]).unwrap(), Value::Int(1));
        assert!(m.call_method("get", &["b".into()]).unwrap().is_null());
        assert_eq!(m.call_method("keys", &[]).unwrap(), Value::list(["a"]));
    }

    #[test]
    fn objects() {
        let class = Class::new("Counter")
            .field("n")
            .method("bump", |this, args| {
                let by = args.first().and_then(Value::as_int).unwrap_or(1);
                let n = this.get_attr("n")?.as_int().unwrap_or(0);
                this.set_attr("n", Value::Int(n + by))?;
                Ok(Value::Unit)
            })
            .build();
        let c = class.instantiate([Value::Int(0)]).unwrap();
        c.call_method("bump", &[Value::Int(5)]).unwrap();
        c.get_attr("bump").unwrap().call(&[]).unwrap();
        assert_eq!(c.get_attr("n").unwrap(), Value::Int(6));
    }

    #[test]
    fn table_from_types() {
        let class = Class::new("Thing").field("len").method("go", |_, _| Ok(Value::Unit)).build();
        let thing = class.instantiate([Value::Int(0)]).unwrap();
        let types = types_of(&[Value::from("s"), thing, Value::Null]);
        let table = AttrTable::from_types(&types);
        assert_eq!(table.is_callable("upper"), Some(true));
        assert_eq!(table.is_callable("go"), Some(true));
        assert_eq!(table.is_callable("len"), Some(false));
        assert_eq!(table.is_callable("missing"), None);
    }
}
