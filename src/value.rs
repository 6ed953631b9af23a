//! The element model: a closed set of dynamically typed values.

use std::collections::{BTreeSet};
use std::fmt::{self, Debug};
use std::sync::{Arc};

use parking_lot::{RwLock};

use super::{ElementError, Failure, Func, Label, NTable};

/// One element of a table.
///
/// `Value` is what the element list of an [`NTable`] holds, what a tabularized
/// [`Func`] receives and what it returns. Composite variants (`List`,
/// `Tuple`, `Map`, `Slice`) may themselves contain tables; tabularization
/// restructures those into a single table of composites.
#[derive(Debug, Clone)]
pub enum Value {
    /// The missing-value sentinel. Every operation on it yields itself.
    Null,
    /// The result of an operation performed only for its side effects. Also
    /// an open bound of a [`Slice`].
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Ordered label-keyed mapping. Equality ignores the order.
    Map(Vec<(Label, Value)>),
    Slice(Box<Slice>),
    Func(Func),
    Object(Object),
    Table(NTable),
    Failure(Box<Failure>),
}

/// A paired range `start:stop:step` whose bounds are values, so that they can
/// be tables before tabularization.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub start: Value,
    pub stop: Value,
    pub step: Value,
}

impl Value {
    /// Build a [`Value::List`].
    pub fn list<V: Into<Value>>(items: impl IntoIterator<Item=V>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`Value::Tuple`].
    pub fn tuple<V: Into<Value>>(items: impl IntoIterator<Item=V>) -> Self {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`Value::Map`], keeping the order of `entries`. A repeated key
    /// overwrites the earlier entry.
    ///
    /// ```
    /// use ntable::Value;
    /// let m = Value::map([("a", 1), ("b", 2)]);
    /// assert_eq!(m, Value::map([("b", 2), ("a", 1)]));
    /// ```
    pub fn map<K: Into<Label>, V: Into<Value>>(entries: impl IntoIterator<Item=(K, V)>) -> Self {
        let mut map: Vec<(Label, Value)> = Vec::new();
        for (k, v) in entries {
            let k = k.into();
            let v = v.into();
            match map.iter_mut().find(|(key, _)| *key == k) {
                Some(entry) => entry.1 = v,
                None => map.push((k, v)),
            }
        }
        Self::Map(map)
    }

    /// Build a [`Value::Slice`] with integer bounds.
    pub fn slice(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        let bound = |b: Option<i64>| b.map_or(Value::Unit, Value::Int);
        Self::Slice(Box::new(Slice {start: bound(start), stop: bound(stop), step: bound(step)}))
    }

    pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

    pub fn is_failure(&self) -> bool { matches!(self, Self::Failure(_)) }

    pub fn as_table(&self) -> Option<&NTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(f) => Some(f),
            _ => None,
        }
    }

    /// Truthiness. Missing values and failures are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null | Self::Unit | Self::Failure(_) => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(x) => *x != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(v) | Self::Tuple(v) => !v.is_empty(),
            Self::Map(m) => !m.is_empty(),
            Self::Slice(_) | Self::Func(_) | Self::Object(_) | Self::Table(_) => true,
        }
    }

    /// The concrete type of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Null => ElementType::Null,
            Self::Unit => ElementType::Unit,
            Self::Bool(_) => ElementType::Bool,
            Self::Int(_) => ElementType::Int,
            Self::Float(_) => ElementType::Float,
            Self::Str(_) => ElementType::Str,
            Self::List(_) => ElementType::List,
            Self::Tuple(_) => ElementType::Tuple,
            Self::Map(_) => ElementType::Map,
            Self::Slice(_) => ElementType::Slice,
            Self::Func(_) => ElementType::Func,
            Self::Object(o) => ElementType::Object(ClassRef(o.class.clone())),
            Self::Table(_) => ElementType::Table,
            Self::Failure(_) => ElementType::Failure,
        }
    }

    /// The name of the type, for error messages.
    pub fn type_name(&self) -> String { self.element_type().to_string() }

    /// Deep copy that shares nothing with `self`, except functions and
    /// classes, which are code.
    pub fn detached(&self) -> Self {
        match self {
            Self::List(v) => Self::List(v.iter().map(Self::detached).collect()),
            Self::Tuple(v) => Self::Tuple(v.iter().map(Self::detached).collect()),
            Self::Map(m) => Self::Map(m.iter().map(|(k, v)| (k.clone(), v.detached())).collect()),
            Self::Slice(s) => Self::Slice(Box::new(Slice {
                start: s.start.detached(),
                stop: s.stop.detached(),
                step: s.step.detached(),
            })),
            Self::Object(o) => Self::Object(o.detached()),
            Self::Table(t) => Self::Table(t.detached()),
            Self::Failure(f) => Self::Failure(Box::new(Failure {
                error: f.error.clone(),
                func: f.func.clone(),
                args: f.args.iter().map(Self::detached).collect(),
            })),
            other => other.clone(),
        }
    }

    // ------------------------------------------------------------------------

    /// `self[index]`.
    pub fn get_item(&self, index: &Value) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                match index {
                    Self::Int(i) => {
                        let i = normalize(*i, chars.len())
                            .ok_or_else(|| ElementError::index("string index out of range"))?;
                        Ok(Self::Str(chars[i].to_string()))
                    },
                    Self::Slice(slice) => {
                        let positions = slice.positions(chars.len())?;
                        Ok(Self::Str(positions.into_iter().map(|i| chars[i]).collect()))
                    },
                    other => Err(ElementError::type_error(format!(
                        "string indices must be integers, not '{}'", other.type_name(),
                    ))),
                }
            },
            Self::List(items) | Self::Tuple(items) => {
                let kind = if matches!(self, Self::List(_)) { "list" } else { "tuple" };
                match index {
                    Self::Int(i) => {
                        let i = normalize(*i, items.len())
                            .ok_or_else(|| ElementError::index(format!("{} index out of range", kind)))?;
                        Ok(items[i].clone())
                    },
                    Self::Slice(slice) => {
                        let picked = slice.positions(items.len())?.into_iter().map(|i| items[i].clone()).collect();
                        Ok(if matches!(self, Self::List(_)) { Self::List(picked) } else { Self::Tuple(picked) })
                    },
                    other => Err(ElementError::type_error(format!(
                        "{} indices must be integers or slices, not '{}'", kind, other.type_name(),
                    ))),
                }
            },
            Self::Map(map) => {
                let key = Label::try_from(index)?;
                map.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| ElementError::key(format!("'{}'", key)))
            },
            Self::Table(t) => Ok(Self::Table(t.get_item(index.clone())?)),
            other => Err(ElementError::type_error(format!(
                "'{}' object is not subscriptable", other.type_name(),
            ))),
        }
    }

    /// `self[index] = value`, returning the updated value.
    ///
    /// Values are owned, so the update is made on a copy; nested tables and
    /// objects are shared and are therefore updated in place as well.
    pub fn set_item(&self, index: &Value, value: Value) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::List(items) => {
                let i = match index {
                    Self::Int(i) => normalize(*i, items.len())
                        .ok_or_else(|| ElementError::index("list assignment index out of range"))?,
                    other => return Err(ElementError::type_error(format!(
                        "list indices must be integers, not '{}'", other.type_name(),
                    ))),
                };
                let mut items = items.clone();
                items[i] = value;
                Ok(Self::List(items))
            },
            Self::Map(map) => {
                let key = Label::try_from(index)?;
                let mut map = map.clone();
                match map.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = value,
                    None => map.push((key, value)),
                }
                Ok(Self::Map(map))
            },
            Self::Table(t) => {
                t.set_item(index.clone(), value)?;
                Ok(self.clone())
            },
            other => Err(ElementError::type_error(format!(
                "'{}' object does not support item assignment", other.type_name(),
            ))),
        }
    }

    /// `self(args...)`.
    pub fn call(&self, args: &[Value]) -> Result<Value, ElementError> {
        match self {
            Self::Null => Ok(Self::Null),
            Self::Func(f) => f.call(args),
            Self::Table(t) => Ok(Self::Table(t.call(args.to_vec())?)),
            Self::Object(o) if o.class.method_named("call").is_some() => self.call_method("call", args),
            other => Err(ElementError::type_error(format!(
                "'{}' object is not callable", other.type_name(),
            ))),
        }
    }

    /// The items produced by iterating over `self`.
    pub fn iterate(&self) -> Result<Vec<Value>, ElementError> {
        match self {
            Self::Str(s) => Ok(s.chars().map(|c| Self::Str(c.to_string())).collect()),
            Self::List(items) | Self::Tuple(items) => Ok(items.clone()),
            Self::Map(map) => Ok(map.iter().map(|(k, _)| k.clone().into()).collect()),
            other => Err(ElementError::type_error(format!(
                "'{}' object is not iterable", other.type_name(),
            ))),
        }
    }
}

/// Resolve a possibly negative index against `len`.
pub(crate) fn normalize(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if i < 0 { i + len } else { i };
    if 0 <= i && i < len { Some(i as usize) } else { None }
}

impl Slice {
    fn bound(v: &Value, what: &str) -> Result<Option<i64>, ElementError> {
        match v {
            Value::Unit => Ok(None),
            Value::Int(i) => Ok(Some(*i)),
            other => Err(ElementError::type_error(format!(
                "slice {} must be an integer, not '{}'", what, other.type_name(),
            ))),
        }
    }

    /// The positions selected from a sequence of length `len`, following the
    /// usual clamping rules of half-open slices with an optional step.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, ElementError> {
        let step = Self::bound(&self.step, "step")?.unwrap_or(1);
        if step == 0 { return Err(ElementError::value("slice step cannot be zero")); }
        let n = len as i64;
        let clamp = |b: i64, lo: i64, hi: i64| {
            let b = if b < 0 { b + n } else { b };
            b.max(lo).min(hi)
        };
        let mut out = Vec::new();
        if step > 0 {
            let start = Self::bound(&self.start, "start")?.map_or(0, |b| clamp(b, 0, n));
            let stop = Self::bound(&self.stop, "stop")?.map_or(n, |b| clamp(b, 0, n));
            let mut i = start;
            while i < stop {
                out.push(i as usize);
                match i.checked_add(step) { Some(next) => i = next, None => break }
            }
        } else {
            let start = Self::bound(&self.start, "start")?.map_or(n - 1, |b| clamp(b, -1, n - 1));
            let stop = Self::bound(&self.stop, "stop")?.map_or(-1, |b| clamp(b, -1, n - 1));
            let mut i = start;
            while i > stop {
                out.push(i as usize);
                match i.checked_add(step) { Some(next) => i = next, None => break }
            }
        }
        Ok(out)
    }
}

// ----------------------------------------------------------------------------

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) | (Unit, Unit) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Str(a), Str(b)) => a == b,
            (List(a), List(b)) | (Tuple(a), Tuple(b)) => a == b,
            (Map(a), Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| {
                    b.iter().any(|(k2, v2)| k == k2 && v == v2)
                })
            },
            (Slice(a), Slice(b)) => a == b,
            (Func(a), Func(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            (Table(a), Table(b)) => a == b,
            (Failure(a), Failure(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Self::Int(i64::from(i)) }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self { Self::Int(i as i64) }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Self::Float(x) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Self::Str(s) }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self { Self::List(v) }
}

impl From<NTable> for Value {
    fn from(t: NTable) -> Self { Self::Table(t) }
}

impl From<&NTable> for Value {
    fn from(t: &NTable) -> Self { Self::Table(t.clone()) }
}

impl From<Func> for Value {
    fn from(f: Func) -> Self { Self::Func(f) }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self { Self::Object(o) }
}

impl From<Failure> for Value {
    fn from(f: Failure) -> Self { Self::Failure(Box::new(f)) }
}

impl From<()> for Value {
    fn from((): ()) -> Self { Self::Unit }
}

// ----------------------------------------------------------------------------

/// The signature of a method declared on a [`Class`]. The first argument is
/// the receiver.
pub type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value, ElementError> + Send + Sync;

/// A method of a [`Class`].
#[derive(Clone)]
pub struct Method(pub(crate) Arc<MethodFn>);

impl Method {
    pub fn new(f: impl Fn(&Value, &[Value]) -> Result<Value, ElementError> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, ElementError> {
        (self.0)(receiver, args)
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Method") }
}

/// A user-declared record type with named fields and methods.
///
/// ```
/// use ntable::{Class, Value};
/// let point = Class::new("Point").field("x").field("y").build();
/// let p = point.instantiate([Value::Int(1), Value::Int(2)]).unwrap();
/// assert_eq!(p.get_attr("y").unwrap(), Value::Int(2));
/// ```
#[derive(Debug)]
pub struct Class {
    name: String,
    fields: Vec<String>,
    methods: Vec<(String, Method)>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {name: name.into(), fields: Vec::new(), methods: Vec::new()}
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value, &[Value]) -> Result<Value, ElementError> + Send + Sync + 'static,
    ) -> Self {
        self.methods.push((name.into(), Method::new(f)));
        self
    }

    pub fn build(self) -> Arc<Self> { Arc::new(self) }

    pub fn name(&self) -> &str { &self.name }

    pub fn fields(&self) -> impl Iterator<Item=&str> { self.fields.iter().map(String::as_str) }

    pub fn methods(&self) -> impl Iterator<Item=(&str, &Method)> {
        self.methods.iter().map(|(n, m)| (n.as_str(), m))
    }

    pub fn method_named(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Construct an instance, assigning `values` to the fields in declaration
    /// order.
    pub fn instantiate(
        self: &Arc<Self>,
        values: impl IntoIterator<Item=Value>,
    ) -> Result<Value, ElementError> {
        let values: Vec<Value> = values.into_iter().collect();
        if values.len() != self.fields.len() {
            return Err(ElementError::type_error(format!(
                "{}() takes {} arguments but {} were given", self.name, self.fields.len(), values.len(),
            )));
        }
        let fields = self.fields.iter().cloned().zip(values).collect();
        Ok(Value::Object(Object {class: self.clone(), fields: Arc::new(RwLock::new(fields))}))
    }
}

/// An instance of a [`Class`]. Cloning an `Object` shares its fields, so an
/// attribute set through one clone is visible through all of them.
#[derive(Clone)]
pub struct Object {
    class: Arc<Class>,
    fields: Arc<RwLock<Vec<(String, Value)>>>,
}

impl Object {
    pub fn class(&self) -> &Arc<Class> { &self.class }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    pub fn set_field(&self, name: &str, value: Value) -> Result<(), ElementError> {
        let mut fields = self.fields.write();
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => { entry.1 = value; Ok(()) },
            None => Err(ElementError::attribute(format!(
                "'{}' object has no attribute '{}'", self.class.name, name,
            ))),
        }
    }

    fn detached(&self) -> Self {
        let fields = self.fields.read().iter().map(|(n, v)| (n.clone(), v.detached())).collect();
        Self {class: self.class.clone(), fields: Arc::new(RwLock::new(fields))}
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.fields, &other.fields) { return true; }
        self.class.name == other.class.name && *self.fields.read() == *other.fields.read()
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.class.name);
        for (name, value) in self.fields.read().iter() { s.field(name, value); }
        s.finish()
    }
}

// ----------------------------------------------------------------------------

/// A [`Class`] compared by name, so that it can live in a [`TypeSet`].
#[derive(Debug, Clone)]
pub struct ClassRef(pub Arc<Class>);

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool { self.0.name == other.0.name }
}

impl Eq for ClassRef {}

impl PartialOrd for ClassRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}

impl Ord for ClassRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering { self.0.name.cmp(&other.0.name) }
}

/// The concrete type of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementType {
    Null,
    Unit,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Map,
    Slice,
    Func,
    Object(ClassRef),
    Table,
    Failure,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "NULL",
            Self::Unit => "unit",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Map => "map",
            Self::Slice => "slice",
            Self::Func => "function",
            Self::Object(c) => c.0.name(),
            Self::Table => "NTable",
            Self::Failure => "Failure",
        })
    }
}

/// The set of element types a table might contain.
pub type TypeSet = BTreeSet<ElementType>;

/// The types of `values`.
pub fn types_of<'a>(values: impl IntoIterator<Item=&'a Value>) -> TypeSet {
    values.into_iter().map(Value::element_type).collect()
}
