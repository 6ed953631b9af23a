//! The table type and its tabularized entry points.

use std::fmt::{self, Debug};
use std::sync::{Arc};

use parking_lot::{RwLock};

use super::{
    default_engine, func, types_of, validate_engine, AttrTable,
    Coords, Dim, DimMap, EngineKind, EngineRef, Error, Fill, Func, Handler, IndexMap,
    MapFn, Result, Tabularized, TypeSet, Value,
};
use super::tabularize::{align, tabulate_arg};

/// A label-indexed n-dimensional table of heterogeneous values.
///
/// A table is an element list plus an [`IndexMap`] of positions into it.
/// Several positions may refer to the same element, and several tables may
/// share one element list: cloning a table, or selecting from it, yields a
/// view of the same elements. Assigning through any view is visible through
/// all of them. Use [`detached()`] or [`compact()`] for an independent copy.
///
/// [`detached()`]: Self::detached()
/// [`compact()`]: Self::compact()
///
/// ```
/// use ntable::{Coords, Dim, NTable, Value};
/// let coords = Coords::from_dims([Dim::new("k", ["a", "b"])]).unwrap();
/// let t = NTable::from_vec(coords, vec!["hello".into(), "world".into()]).unwrap();
/// let first = t.get_item(0).unwrap();
/// assert_eq!(first.values(), vec![Value::from("h"), Value::from("w")]);
/// ```
#[derive(Clone)]
pub struct NTable {
    elements: Arc<RwLock<Vec<Value>>>,
    index: IndexMap,
    engine: EngineRef,
    types: TypeSet,
}

impl NTable {
    /// Validate and construct.
    ///
    /// Every position of `index` must be a valid index into `elements`. A
    /// custom `engine` must pass [`validate_engine()`]. If `types` is `None`
    /// it is computed from the referenced elements.
    pub fn new(
        elements: Vec<Value>,
        index: IndexMap,
        engine: Option<EngineRef>,
        types: Option<TypeSet>,
    ) -> Result<Self> {
        index.validate(elements.len())?;
        let engine = match engine {
            Some(engine) => {
                if engine.kind() == EngineKind::Custom { validate_engine(engine.as_ref())?; }
                engine
            },
            None => default_engine(),
        };
        let types = types.unwrap_or_else(|| types_of(index.iter().map(|r| &elements[r])));
        Ok(Self {elements: Arc::new(RwLock::new(elements)), index, engine, types})
    }

    /// A table with one value per coordinate, in row-major order.
    pub fn from_vec(coords: Coords, values: Vec<Value>) -> Result<Self> {
        if values.len() != coords.len() {
            return Err(Error::shape(format!(
                "{} values do not fit shape {:?}", values.len(), coords.shape(),
            )));
        }
        Self::new(values, IndexMap::basic(coords), None, None)
    }

    pub(crate) fn from_parts(
        elements: Arc<RwLock<Vec<Value>>>,
        index: IndexMap,
        engine: EngineRef,
        types: TypeSet,
    ) -> Self {
        Self {elements, index, engine, types}
    }

    /// A table over `coords` whose element list is `values`, in row-major
    /// order. `values.len()` must equal `coords.len()`.
    pub(crate) fn from_results(coords: Coords, values: Vec<Value>, engine: EngineRef) -> Self {
        let types = types_of(&values);
        Self::from_parts(Arc::new(RwLock::new(values)), IndexMap::basic(coords), engine, types)
    }

    /// The shared element list.
    pub fn element_list(&self) -> &Arc<RwLock<Vec<Value>>> { &self.elements }

    /// A copy of the element list, including unreferenced elements.
    pub fn elements(&self) -> Vec<Value> { self.elements.read().clone() }

    pub fn index(&self) -> &IndexMap { &self.index }

    pub fn coords(&self) -> &Coords { self.index.coords() }

    pub fn dims(&self) -> &[Dim] { self.coords().dims() }

    pub fn shape(&self) -> Vec<usize> { self.index.shape() }

    pub fn ndim(&self) -> usize { self.coords().ndim() }

    /// The number of positions.
    pub fn len(&self) -> usize { self.index.len() }

    pub fn is_empty(&self) -> bool { self.index.is_empty() }

    pub fn engine(&self) -> &EngineRef { &self.engine }

    /// Replace the engine, validating a custom one.
    pub fn set_engine(&mut self, engine: EngineRef) -> Result<()> {
        if engine.kind() == EngineKind::Custom { validate_engine(engine.as_ref())?; }
        self.engine = engine;
        Ok(())
    }

    /// The element types this table might contain.
    pub fn types(&self) -> &TypeSet { &self.types }

    pub fn set_types(&mut self, types: TypeSet) { self.types = types; }

    /// The referenced values, in row-major order.
    pub fn values(&self) -> Vec<Value> {
        let elements = self.elements.read();
        self.index.iter().map(|r| elements[r].clone()).collect()
    }

    /// The value at multi-index `index`.
    pub fn value_at(&self, index: &[usize]) -> Value {
        self.elements.read()[self.index.get(index)].clone()
    }

    /// Whether `self` and `other` share an element list.
    pub fn shares_elements(&self, other: &NTable) -> bool { Arc::ptr_eq(&self.elements, &other.elements) }

    /// Append `value` to the element list, returning its position.
    pub(crate) fn push_element(&self, value: Value) -> usize {
        let mut elements = self.elements.write();
        elements.push(value);
        elements.len() - 1
    }

    /// A view of the same elements through a different index map.
    pub(crate) fn with_index(&self, index: IndexMap, types: TypeSet) -> Result<Self> {
        index.validate(self.elements.read().len())?;
        Ok(Self::from_parts(self.elements.clone(), index, self.engine.clone(), types))
    }

    pub(crate) fn reindexed(&self, index: IndexMap) -> Result<Self> { self.with_index(index, self.types.clone()) }

    // ------------------------------------------------------------------------

    /// Apply `func` to the rows of `tables` using the engine of the first
    /// table. See [`tabular_map_with()`].
    ///
    /// [`tabular_map_with()`]: Self::tabular_map_with()
    pub fn tabular_map(tables: &[NTable], func: &MapFn<'_>) -> Result<NTable> {
        let first = tables.first().ok_or_else(|| Error::value("tabular_map needs at least one table"))?;
        Self::tabular_map_with(&first.engine.clone(), tables, func)
    }

    /// Apply `func` position by position to tables of identical coordinates.
    /// Row `i` holds the value of every table at position `i`. The result has
    /// a basic index map over the coordinates of the first table, and that
    /// table's engine.
    ///
    /// Returns [`Error::Shape`] if the coordinates differ.
    pub fn tabular_map_with(engine: &EngineRef, tables: &[NTable], func: &MapFn<'_>) -> Result<NTable> {
        let first = tables.first().ok_or_else(|| Error::value("tabular_map needs at least one table"))?;
        if let Some(t) = tables.iter().find(|t| t.coords().dims() != first.coords().dims()) {
            return Err(Error::shape(format!(
                "tables of shape {:?} and {:?} cannot be mapped together", first.shape(), t.shape(),
            )));
        }
        let columns: Vec<Vec<Value>> = tables.iter().map(NTable::values).collect();
        let results = engine.map(func, &columns)?;
        Ok(Self::from_results(first.coords().clone(), results, first.engine.clone()))
    }

    // ------------------------------------------------------------------------

    /// A deep copy that shares nothing with `self`.
    pub fn detached(&self) -> Self {
        let elements = self.elements.read().iter().map(Value::detached).collect();
        Self::from_parts(Arc::new(RwLock::new(elements)), self.index.clone(), self.engine.clone(), self.types.clone())
    }

    /// A copy with a fresh element list holding exactly one element per
    /// position, so that positions no longer alias each other or `self`.
    /// Elements are cloned, not deep-copied.
    pub fn compact(&self) -> Self {
        Self::from_results(self.coords().clone(), self.values(), self.engine.clone())
    }

    // ------------------------------------------------------------------------

    /// Call `func` tabularized over `args`, with the engine of `self`.
    pub(crate) fn run(&self, func: Func, args: Vec<Value>) -> Result<NTable> {
        let out = Tabularized::new(func).with_engine(self.engine.clone()).call(&args)?;
        match out {
            Value::Table(t) => Ok(t),
            other => Err(Error::type_error(format!("expected a table, got '{}'", other.type_name()))),
        }
    }

    /// `self[index]`, elementwise. Failures are contained.
    pub fn get_item(&self, index: impl Into<Value>) -> Result<NTable> {
        self.run(func::getitem().handled(Handler::Silent), vec![self.into(), index.into()])
    }

    /// `self(args...)`, elementwise. Failures are contained.
    pub fn call(&self, args: Vec<Value>) -> Result<NTable> {
        let mut all = vec![Value::from(self)];
        all.extend(args);
        self.run(func::call().handled(Handler::Silent), all)
    }

    /// `self.name(args...)`, elementwise. Failures are contained.
    pub fn call_method(&self, name: &str, args: Vec<Value>) -> Result<NTable> {
        let mut all = vec![Value::from(self), Value::from(name)];
        all.extend(args);
        self.run(func::call_method().handled(Handler::Silent), all)
    }

    /// Apply `func` to every element.
    pub fn apply(&self, func: Func) -> Result<NTable> { self.run(func, vec![self.into()]) }

    /// Elementwise equality with `other`.
    pub fn eq_elements(&self, other: impl Into<Value>) -> Result<NTable> {
        let eq = Func::new("eq", |args| Ok(Value::Bool(args.first() == args.get(1))));
        self.run(eq, vec![self.into(), other.into()])
    }

    /// Elementwise attribute access.
    pub fn tattr(&self) -> TabularAttrs<'_> { TabularAttrs {table: self} }

    /// Resolve `name`: a dimension, else a method of the element types, else
    /// an attribute of the element types.
    pub fn attr(&self, name: &str) -> Result<Attribute> {
        if self.coords().axis(name).is_some() {
            return Ok(Attribute::Dim(DimMap::new(self.clone(), name)?));
        }
        match AttrTable::from_types(&self.types).is_callable(name) {
            Some(true) => Ok(Attribute::Method(TabularizedMethod {table: self.clone(), name: name.to_string()})),
            Some(false) => Ok(Attribute::Values(self.tattr().get(name)?)),
            None => Err(Error::attribute(format!("'{}' is not an attribute of NTable", name))),
        }
    }

    /// `self[index] = value`, elementwise.
    ///
    /// Each element is replaced by the result of assigning into it. Failures
    /// are contained, with a warning, and leave the element unchanged. The
    /// returned table holds the result at each position.
    pub fn set_item(&self, index: impl Into<Value>, value: impl Into<Value>) -> Result<NTable> {
        if self.index.has_duplicates() {
            tracing::warn!(shape = ?self.shape(), "assigning through a table whose positions share elements");
        }
        let before = self.elements.read().len();
        let func = func::setitem().handled(Handler::Warn);
        let args = [Value::from(self), tabulate_arg(&index.into())?, tabulate_arg(&value.into())?];
        let tables = align(&func, &args, Fill::Lite)?
            .ok_or_else(|| Error::broadcast("nothing to assign into"))?;
        let call = |row: &[Value]| row[0].call(&row[1..]).map_err(Error::from);
        let results = NTable::tabular_map_with(&self.engine, &tables, &call)?;
        let target = tables[1].index();
        let mut elements = self.elements.write();
        for (i, result) in results.values().into_iter().enumerate() {
            let slot = target.at(i);
            if slot >= before || result.is_failure() { continue; }
            elements[slot] = result;
        }
        Ok(results)
    }

    /// Iterate over the elements in lockstep. See [`TableIter`].
    pub fn iter(&self) -> Result<TableIter> {
        let cursors = self.values().iter().map(|v| match v {
            Value::Null => Ok(Cursor::Null),
            v => Ok(Cursor::Items(v.iterate()?.into_iter())),
        }).collect::<Result<Vec<_>>>()?;
        let done = cursors.iter().all(|c| matches!(c, Cursor::Null));
        Ok(TableIter {coords: self.coords().clone(), engine: self.engine.clone(), cursors, done})
    }
}

impl PartialEq for NTable {
    fn eq(&self, other: &Self) -> bool {
        if self.coords() != other.coords() { return false; }
        if self.shares_elements(other) && self.index == other.index { return true; }
        self.values() == other.values()
    }
}

impl Debug for NTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NTable")
            .field("coords", self.coords())
            .field("values", &self.values())
            .finish()
    }
}

// ----------------------------------------------------------------------------

/// Tabularized attribute access. See [`NTable::tattr()`].
pub struct TabularAttrs<'a> {
    table: &'a NTable,
}

impl<'a> TabularAttrs<'a> {
    /// `element.name` for every element.
    pub fn get(&self, name: &str) -> Result<NTable> {
        self.table.run(func::getattr().handled(Handler::Silent), vec![self.table.into(), name.into()])
    }

    /// `element.name = value` for every element. Values that are tables are
    /// broadcast.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<NTable> {
        let args = vec![self.table.into(), name.into(), value.into()];
        self.table.run(func::setattr().handled(Handler::Silent), args)
    }
}

/// The result of [`NTable::attr()`].
#[derive(Debug)]
pub enum Attribute {
    Dim(DimMap),
    Method(TabularizedMethod),
    Values(NTable),
}

impl Attribute {
    pub fn into_dim(self) -> Option<DimMap> {
        match self { Self::Dim(d) => Some(d), _ => None }
    }

    pub fn into_method(self) -> Option<TabularizedMethod> {
        match self { Self::Method(m) => Some(m), _ => None }
    }

    pub fn into_values(self) -> Option<NTable> {
        match self { Self::Values(t) => Some(t), _ => None }
    }
}

/// A method of the elements of a table, to be called elementwise.
#[derive(Debug, Clone)]
pub struct TabularizedMethod {
    table: NTable,
    name: String,
}

impl TabularizedMethod {
    pub fn name(&self) -> &str { &self.name }

    pub fn call(&self, args: Vec<Value>) -> Result<NTable> { self.table.call_method(&self.name, args) }
}

// ----------------------------------------------------------------------------

enum Cursor {
    Items(std::vec::IntoIter<Value>),
    Null,
}

/// Iterates over every element of a table at once.
///
/// Each step yields a table of the same coordinates holding the next item of
/// each element. Iteration ends as soon as any element is exhausted. A `Null`
/// element yields `Null` at every step; a table of only `Null`s yields
/// nothing.
pub struct TableIter {
    coords: Coords,
    engine: EngineRef,
    cursors: Vec<Cursor>,
    done: bool,
}

impl Iterator for TableIter {
    type Item = NTable;

    fn next(&mut self) -> Option<NTable> {
        if self.done || self.cursors.is_empty() { return None; }
        let mut step = Vec::with_capacity(self.cursors.len());
        for cursor in &mut self.cursors {
            let next = match cursor {
                Cursor::Items(items) => items.next(),
                Cursor::Null => Some(Value::Null),
            };
            match next {
                Some(v) => step.push(v),
                None => { self.done = true; return None; },
            }
        }
        Some(NTable::from_results(self.coords.clone(), step, self.engine.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{ErrorKind, ThreadEngine};

    fn words() -> NTable {
        let coords = Coords::one("k", ["a", "b", "c"]).unwrap();
        NTable::from_vec(coords, vec!["one".into(), "two".into(), "three".into()]).unwrap()
    }

    #[test]
    fn construction_checks_bounds() {
        let coords = Coords::one("k", [0, 1]).unwrap();
        let index = IndexMap::new(coords.clone(), vec![0, 2]).unwrap();
        assert!(matches!(NTable::new(vec![Value::Int(1), Value::Int(2)], index, None, None), Err(Error::Index(_))));
        let index = IndexMap::new(coords, vec![1, 1]).unwrap();
        let t = NTable::new(vec![Value::Int(1), Value::from("x")], index, None, None).unwrap();
        assert_eq!(t.types().len(), 1);
        assert_eq!(t.values(), vec![Value::from("x"), Value::from("x")]);
    }

    #[test]
    fn get_item_contains_failures() {
        let t = words().get_item(3).unwrap();
        let values = t.values();
        assert!(values[0].is_failure());
        assert!(values[1].is_failure());
        assert_eq!(values[2], Value::from("e"));
        let failure = values[0].as_failure().unwrap();
        assert_eq!(failure.error.kind, ErrorKind::Index);
        assert_eq!(failure.args, vec![Value::from("one"), Value::Int(3)]);
    }

    #[test]
    fn tabular_map_shapes() {
        let a = words();
        let b = NTable::from_vec(Coords::one("k", ["a", "b"]).unwrap(), vec![Value::Unit; 2]).unwrap();
        let id = |row: &[Value]| -> Result<Value> { Ok(row[0].clone()) };
        assert!(matches!(NTable::tabular_map(&[a.clone(), b], &id), Err(Error::Shape(_))));
        assert_eq!(NTable::tabular_map(&[a.clone()], &id).unwrap(), a);
    }

    #[test]
    fn set_item_writes_back() {
        let coords = Coords::one("k", ["a", "b"]).unwrap();
        let lists = NTable::from_vec(coords, vec![Value::list([1, 2]), Value::list([3])]).unwrap();
        let view = lists.clone();
        let results = lists.set_item(0, "x").unwrap();
        assert_eq!(view.values(), vec![Value::list(["x".into(), Value::Int(2)]), Value::list(["x"])]);
        assert_eq!(results.len(), 2);
        let results = lists.set_item(1, "y").unwrap();
        assert!(results.values()[1].is_failure());
        assert_eq!(lists.values()[1], Value::list(["x"]));
    }

    #[test]
    fn attribute_resolution() {
        let t = words();
        let upper = t.attr("upper").unwrap().into_method().unwrap();
        assert_eq!(upper.call(vec![]).unwrap().values()[0], Value::from("ONE"));
        let len = t.attr("len").unwrap().into_values().unwrap();
        assert_eq!(len.values(), vec![Value::Int(3), Value::Int(3), Value::Int(5)]);
        assert!(t.attr("k").unwrap().into_dim().is_some());
        assert!(matches!(t.attr("nope"), Err(Error::Attribute(_))));
    }

    #[test]
    fn lockstep_iteration() {
        let t = words();
        let steps: Vec<NTable> = t.iter().unwrap().collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].values(), vec![Value::from("e"), Value::from("o"), Value::from("r")]);
        let ints = NTable::from_vec(Coords::one("k", [0]).unwrap(), vec![Value::Int(1)]).unwrap();
        assert!(ints.iter().is_err());
    }

    #[test]
    fn iteration_with_null() {
        let coords = Coords::one("k", [0, 1]).unwrap();
        let t = NTable::from_vec(coords, vec![Value::Null, Value::list([1, 2])]).unwrap();
        let steps: Vec<NTable> = t.iter().unwrap().collect();
        assert_eq!(steps.len(), 2);
        assert!(steps[0].values()[0].is_null());
    }

    #[test]
    fn views_share_and_copies_do_not() {
        let coords = Coords::one("k", ["a", "b"]).unwrap();
        let mut t = NTable::from_vec(coords, vec![Value::list([1]), Value::list([2])]).unwrap();
        t.set_engine(Arc::new(ThreadEngine::new(2))).unwrap();
        let copy = t.detached();
        let view = t.clone();
        t.set_item(0, 5).unwrap();
        assert_eq!(view.values(), vec![Value::list([5]), Value::list([5])]);
        assert_eq!(copy.values(), vec![Value::list([1]), Value::list([2])]);
        assert!(!t.compact().shares_elements(&t));
        assert_eq!(t.eq_elements(Value::list([5])).unwrap().values(), vec![Value::Bool(true); 2]);
    }
}
