//! Convenience constructors.

use super::{default_engine, Coords, Dim, EngineRef, IndexMap, NTable, Result, Value};

/// A table over `coords` holding one copy of `value` per position.
///
/// ```
/// use ntable::{full, default_engine, Coords, Value};
/// let t = full(Coords::one("k", ["a", "b"]).unwrap(), Value::Int(0), default_engine()).unwrap();
/// assert_eq!(t.elements().len(), 2);
/// ```
pub fn full(coords: Coords, value: Value, engine: EngineRef) -> Result<NTable> {
    let elements = vec![value; coords.len()];
    NTable::new(elements, IndexMap::basic(coords), Some(engine), None)
}

/// A table over `coords` whose every position refers to a single stored
/// `value`.
pub fn full_lite(coords: Coords, value: Value, engine: EngineRef) -> Result<NTable> {
    let types = super::types_of([&value]);
    NTable::new(vec![value], IndexMap::constant(coords, 0), Some(engine), Some(types))
}

/// [`full()`] or [`full_lite()`] over the coordinates of `table`, with its
/// engine.
pub fn full_like(table: &NTable, value: Value, lite: bool) -> Result<NTable> {
    let coords = table.coords().clone();
    if lite { full_lite(coords, value, table.engine().clone()) } else { full(coords, value, table.engine().clone()) }
}

/// A table of `Null`s over `coords`.
pub fn blank(coords: Coords, engine: Option<EngineRef>) -> Result<NTable> {
    full(coords, Value::Null, engine.unwrap_or_else(default_engine))
}

/// A table of `Null`s of the given shape, with dimensions `dim0, dim1, ...`
/// labelled `coord0, coord1, ...`.
pub fn sblank(shape: &[usize], engine: Option<EngineRef>) -> Result<NTable> {
    blank(default_coords(shape)?, engine)
}

pub(crate) fn default_coords(shape: &[usize]) -> Result<Coords> {
    Coords::from_dims(shape.iter().enumerate().map(|(i, &n)| {
        Dim::new(format!("dim{}", i), (0..n).map(|j| format!("coord{}", j)))
    }))
}

/// A table over the coordinates of `table` whose elements are tuples of the
/// labels of their positions.
///
/// ```
/// use ntable::{cartograph, Value};
/// let t = ntable::sblank(&[2, 1], None).unwrap();
/// let c = cartograph(&t).unwrap();
/// assert_eq!(c.values()[1], Value::tuple(["coord1", "coord0"]));
/// ```
pub fn cartograph(table: &NTable) -> Result<NTable> {
    let coords = table.coords().clone();
    let mut elements = Vec::with_capacity(coords.len());
    coords.each(|index| {
        elements.push(Value::Tuple(coords.labels_at(index).into_iter().map(Value::from).collect()));
    });
    NTable::new(elements, IndexMap::basic(coords), Some(table.engine().clone()), None)
}

/// A table over the coordinates of `table` whose elements count its
/// positions in row-major order.
pub fn count(table: &NTable) -> Result<NTable> {
    let coords = table.coords().clone();
    let elements = (0..coords.len()).map(Value::from).collect();
    NTable::new(elements, IndexMap::basic(coords), Some(table.engine().clone()), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{ElementType, Label};

    #[test]
    fn lite_and_full() {
        let coords = Coords::one("k", ["a", "b", "c"]).unwrap();
        let lite = full_lite(coords.clone(), "x".into(), default_engine()).unwrap();
        let dense = full(coords, "x".into(), default_engine()).unwrap();
        assert_eq!(lite, dense);
        assert_eq!(lite.elements().len(), 1);
        assert_eq!(dense.elements().len(), 3);
        assert!(lite.types().contains(&ElementType::Str));
        assert!(full_like(&dense, Value::Null, true).unwrap().index().is_lite());
    }

    #[test]
    fn blanks() {
        let t = sblank(&[2, 3], None).unwrap();
        assert_eq!(t.shape(), vec![2, 3]);
        assert_eq!(t.dims()[1].name, "dim1");
        assert_eq!(t.dims()[1].labels[2], Label::from("coord2"));
        assert!(t.values().iter().all(Value::is_null));
        assert!(sblank(&[], None).is_err());
    }

    #[test]
    fn counting() {
        let t = sblank(&[2, 2], None).unwrap();
        assert_eq!(count(&t).unwrap().values(), [0, 1, 2, 3].map(Value::from).to_vec());
        let c = cartograph(&t).unwrap();
        assert_eq!(c.values()[2], Value::tuple(["coord1", "coord0"]));
    }
}
