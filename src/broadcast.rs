//! Aligning tables of different shapes.

use serde::{Deserialize, Serialize};

use super::{Coords, Dim, ElementType, EngineRef, Error, IndexMap, Label, NTable, Result, Value};

/// How a non-table argument is turned into a table when broadcasting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    /// Store the value once, with every position referring to it.
    #[default]
    Lite,
    /// Store one copy of the value per position.
    Full,
}

/// The outer join of `coords`.
///
/// Dimensions appear in the order they are first seen, and so do the labels
/// of each dimension. Nothing is sorted. A scalar coordinate survives if
/// every input that has it agrees on its label.
///
/// ```
/// use ntable::{broadcast::union, Coords, Label};
/// let a = Coords::one("k", ["a", "b"]).unwrap();
/// let b = Coords::one("k", ["b", "c"]).unwrap();
/// let u = union([&a, &b]);
/// assert_eq!(u.dims()[0].labels, ["a", "b", "c"].map(Label::from));
/// ```
pub fn union<'a>(coords: impl IntoIterator<Item=&'a Coords>) -> Coords {
    let coords: Vec<&Coords> = coords.into_iter().collect();
    let mut dims: Vec<Dim> = Vec::new();
    for c in &coords {
        for dim in c.dims() {
            match dims.iter_mut().find(|d| d.name == dim.name) {
                Some(d) => for label in &dim.labels {
                    if !d.labels.contains(label) { d.labels.push(label.clone()); }
                },
                None => dims.push(dim.clone()),
            }
        }
    }
    let mut scalars: Vec<(String, Label)> = Vec::new();
    let mut conflicts: Vec<String> = Vec::new();
    for c in &coords {
        for (name, label) in c.scalars() {
            if dims.iter().any(|d| d.name == *name) || conflicts.contains(name) { continue; }
            match scalars.iter().position(|(n, _)| n == name) {
                Some(i) if scalars[i].1 != *label => { scalars.remove(i); conflicts.push(name.clone()); },
                Some(_) => {},
                None => scalars.push((name.clone(), label.clone())),
            }
        }
    }
    if dims.is_empty() && scalars.is_empty() {
        if let Some(c) = coords.first() { scalars = c.scalars().to_vec(); }
    }
    Coords::new_unchecked(dims, scalars)
}

/// Re-express `table` over `coords`, which must include every dimension of
/// `table`.
///
/// Coordinates that `table` lacks are pointed at a `Null` appended to its
/// element list. The element list is shared with `table`, so the `Null` is
/// visible through `table` too, although no position of `table` refers to
/// it.
pub fn broadcast_table(table: &NTable, coords: &Coords) -> Result<NTable> {
    if table.coords().same_space(coords) && table.coords().scalars() == coords.scalars() {
        return Ok(table.clone());
    }
    let pairs = table.index().reindex(coords)?;
    let repaired = pairs.iter().any(Option::is_none);
    let refs: Vec<usize> = if repaired {
        let null = table.push_element(Value::Null);
        tracing::debug!(position = null, "broadcast repair: padding with NULL");
        pairs.into_iter().map(|p| p.unwrap_or(null)).collect()
    } else {
        pairs.into_iter().flatten().collect()
    };
    let index = IndexMap::new(coords.clone(), refs)?;
    let mut types = table.types().clone();
    if repaired { types.insert(ElementType::Null); }
    table.with_index(index, types)
}

/// A table over `coords` holding `value` at every position.
pub fn fill(coords: &Coords, value: &Value, fill: Fill, engine: EngineRef) -> Result<NTable> {
    match fill {
        Fill::Lite => super::full_lite(coords.clone(), value.clone(), engine),
        Fill::Full => super::full(coords.clone(), value.clone(), engine),
    }
}

/// Align `args` to the union of the shapes of their table arguments.
///
/// Table arguments are re-expressed with [`broadcast_table()`]; other
/// arguments become tables according to `fill`. The results are in argument
/// order and share one coordinate space. Non-table arguments take the engine
/// of the first table argument.
///
/// Returns [`Error::Broadcast`] if no argument is a table.
pub fn broadcast_tables(args: &[Value], fill_policy: Fill) -> Result<Vec<NTable>> {
    let tables: Vec<&NTable> = args.iter().filter_map(Value::as_table).collect();
    let first = tables.first().ok_or_else(|| Error::broadcast("broadcasting needs at least one table argument"))?;
    let engine = first.engine().clone();
    let coords = union(tables.iter().map(|t| t.coords()));
    args.iter().map(|arg| match arg {
        Value::Table(t) => broadcast_table(t, &coords),
        other => fill(&coords, other, fill_policy, engine.clone()),
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{NTable};

    fn grid(rows: &[&str]) -> NTable {
        let coords = Coords::from_dims([
            Dim::new("rows", rows.iter().copied()),
            Dim::new("cols", ["col1", "col2"]),
        ]).unwrap();
        let values = coords.dims()[0].labels.iter()
            .flat_map(|r| ["col1", "col2"].map(|c| Value::from(format!("{}{}", r, c))))
            .collect();
        NTable::from_vec(coords, values).unwrap()
    }

    #[test]
    fn pads_with_null() {
        let small = grid(&["row1", "row2"]);
        let big = grid(&["row1", "row2", "row3"]);
        let out = broadcast_tables(&[small.clone().into(), big.clone().into()], Fill::Lite).unwrap();
        assert_eq!(out[0].shape(), vec![3, 2]);
        assert_eq!(out[1], big);
        assert!(out[0].value_at(&[2, 0]).is_null());
        assert!(out[0].value_at(&[2, 1]).is_null());
        assert_eq!(out[0].value_at(&[1, 1]), Value::from("row2col2"));
        assert_eq!(small.element_list().read().len(), 5);
        assert_eq!(small.shape(), vec![2, 2]);
    }

    #[test]
    fn new_dims_expand() {
        let a = NTable::from_vec(Coords::one("x", [0, 1]).unwrap(), vec![1.into(), 2.into()]).unwrap();
        let b = NTable::from_vec(Coords::one("y", ["p", "q", "r"]).unwrap(), vec![0.into(); 3]).unwrap();
        let out = broadcast_tables(&[a.into(), Value::Int(7), b.into()], Fill::Full).unwrap();
        for t in &out { assert_eq!(t.shape(), vec![2, 3]); }
        assert_eq!(out[0].values(), [1, 1, 1, 2, 2, 2].map(Value::from).to_vec());
        assert_eq!(out[1].element_list().read().len(), 6);
        assert!(!out[1].index().is_lite());
    }

    #[test]
    fn lite_fill() {
        let a = NTable::from_vec(Coords::one("x", [0, 1]).unwrap(), vec![1.into(), 2.into()]).unwrap();
        let out = broadcast_tables(&["s".into(), a.into()], Fill::Lite).unwrap();
        assert!(out[0].index().is_lite());
        assert_eq!(out[0].element_list().read().len(), 1);
        assert_eq!(out[0].values(), vec![Value::from("s"), Value::from("s")]);
    }

    #[test]
    fn needs_a_table() {
        let e = broadcast_tables(&[Value::Int(1)], Fill::Lite).unwrap_err();
        assert!(matches!(e, Error::Broadcast(_)));
    }

    #[test]
    fn conflicting_scalars_dropped() {
        let a = Coords::new(vec![Dim::range("x", 1)], vec![("s".into(), Label::Int(0))]).unwrap();
        let b = Coords::new(vec![Dim::range("x", 1)], vec![("s".into(), Label::Int(1))]).unwrap();
        let c = Coords::new(vec![Dim::range("x", 2)], vec![("s".into(), Label::Int(0))]).unwrap();
        assert!(union([&a, &b, &c]).scalars().is_empty());
        assert_eq!(union([&a, &c]).scalars().len(), 1);
    }
}
