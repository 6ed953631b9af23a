//! Structural operations: selection, assignment, transposition,
//! concatenation, relabelling, and flattening.
//!
//! None of these copy elements unless they must. Selections and transposes
//! are views of the same element list.

use std::sync::{Arc};

use parking_lot::{RwLock};

use super::{
    broadcast::union, normalize, types_of, Coords, Dim, ElementType, Error, IndexMap, Label,
    NTable, Refs, Result, Slice, Take, TypeSet, Value,
};

/// Which coordinates of one dimension to select.
///
/// `K` is [`Label`] for [`NTable::loc()`] and `i64` for [`NTable::isel()`].
#[derive(Debug, Clone, PartialEq)]
pub enum Selector<K> {
    /// The whole dimension.
    All,
    /// A single coordinate. The dimension is dropped and recorded as a scalar
    /// coordinate.
    One(K),
    /// The given coordinates, in the given order.
    Many(Vec<K>),
    /// A range of coordinates. Label ranges include both ends; positional
    /// ranges are half-open, with negative positions counting from the end.
    Span(Option<K>, Option<K>),
}

impl NTable {
    fn label_takes(&self, selection: &[(&str, Selector<Label>)]) -> Result<Vec<Take>> {
        let coords = self.coords();
        let mut takes: Vec<Take> = coords.dims().iter().map(|d| Take::Keep((0..d.len()).collect())).collect();
        for (name, selector) in selection {
            let axis = coords.require_axis(name)?;
            let dim = &coords.dims()[axis];
            takes[axis] = match selector {
                Selector::All => Take::Keep((0..dim.len()).collect()),
                Selector::One(label) => Take::Drop(dim.require(label)?),
                Selector::Many(labels) => Take::Keep(labels.iter().map(|l| dim.require(l)).collect::<Result<_>>()?),
                Selector::Span(from, to) => {
                    let from = from.as_ref().map_or(Ok(0), |l| dim.require(l))?;
                    let to = to.as_ref().map_or(Ok(dim.len()), |l| dim.require(l).map(|p| p + 1))?;
                    Take::Keep((from..to.max(from)).collect())
                },
            };
        }
        Ok(takes)
    }

    fn position_takes(&self, selection: &[Selector<i64>]) -> Result<Vec<Take>> {
        let dims = self.dims();
        if selection.len() > dims.len() {
            return Err(Error::index(format!(
                "too many indices: table is {}-dimensional, but {} were given", dims.len(), selection.len(),
            )));
        }
        let position = |dim: &Dim, i: i64| normalize(i, dim.len()).ok_or_else(|| Error::index(format!(
            "index {} is out of bounds for dimension '{}' of length {}", i, dim.name, dim.len(),
        )));
        dims.iter().enumerate().map(|(axis, dim)| -> Result<Take> { Ok(match selection.get(axis) {
            None | Some(Selector::All) => Take::Keep((0..dim.len()).collect()),
            Some(Selector::One(i)) => Take::Drop(position(dim, *i)?),
            Some(Selector::Many(is)) => Take::Keep(is.iter().map(|i| position(dim, *i)).collect::<Result<_>>()?),
            Some(Selector::Span(start, stop)) => {
                let bound = |b: &Option<i64>| b.map_or(Value::Unit, Value::Int);
                let slice = Slice {start: bound(start), stop: bound(stop), step: Value::Unit};
                Take::Keep(slice.positions(dim.len())?)
            },
        }) }).collect()
    }

    fn selected(&self, takes: &[Take]) -> Result<NTable> {
        let index = self.index().take(takes);
        if index.has_duplicates() && !index.is_lite() {
            tracing::warn!(shape = ?index.shape(), "selection refers to some elements more than once");
        }
        self.reindexed(index)
    }

    /// Select by label. Dimensions not named in `selection` are kept whole.
    ///
    /// The result is a view: it shares the element list of `self`.
    ///
    /// ```
    /// use ntable::{Coords, Dim, Label, NTable, Selector, Value};
    /// let coords = Coords::from_dims([Dim::new("r", ["a", "b"]), Dim::new("c", ["x", "y"])]).unwrap();
    /// let t = NTable::from_vec(coords, (0..4).map(Value::from).collect()).unwrap();
    /// let row = t.loc(&[("r", Selector::One(Label::from("b")))]).unwrap();
    /// assert_eq!(row.values(), vec![Value::Int(2), Value::Int(3)]);
    /// assert_eq!(row.coords().scalar("r"), Some(&Label::from("b")));
    /// ```
    pub fn loc(&self, selection: &[(&str, Selector<Label>)]) -> Result<NTable> {
        self.selected(&self.label_takes(selection)?)
    }

    /// Select by position, one selector per leading dimension.
    pub fn isel(&self, selection: &[Selector<i64>]) -> Result<NTable> {
        self.selected(&self.position_takes(selection)?)
    }

    /// Assign `value` to the positions selected by label.
    ///
    /// A plain value overwrites every selected element. A table value is
    /// aligned with the selection by label, and must cover exactly the
    /// selected coordinates; otherwise this returns [`Error::Shape`].
    pub fn set_loc(&mut self, selection: &[(&str, Selector<Label>)], value: impl Into<Value>) -> Result<()> {
        let takes = self.label_takes(selection)?;
        self.assign(self.index().take(&takes), value.into())
    }

    /// Assign `value` to the positions selected by position. See
    /// [`set_loc()`].
    ///
    /// [`set_loc()`]: Self::set_loc()
    pub fn set_isel(&mut self, selection: &[Selector<i64>], value: impl Into<Value>) -> Result<()> {
        let takes = self.position_takes(selection)?;
        self.assign(self.index().take(&takes), value.into())
    }

    fn assign(&mut self, target: IndexMap, value: Value) -> Result<()> {
        if target.has_duplicates() {
            tracing::warn!(shape = ?target.shape(), "assigning to positions that share elements");
        }
        let writes: Vec<(usize, Value)> = match value {
            Value::Table(source) => {
                let coords = union([target.coords(), source.coords()]);
                let slots = target.reindex(&coords)?;
                let from = source.index().reindex(&coords)?;
                if slots.iter().chain(&from).any(Option::is_none) {
                    return Err(Error::shape(format!(
                        "unable to assign a table of shape {:?} to a selection of shape {:?}",
                        source.shape(), target.shape(),
                    )));
                }
                let elements = source.element_list().read();
                slots.into_iter().flatten().zip(from.into_iter().flatten())
                    .map(|(slot, r)| (slot, elements[r].clone()))
                    .collect()
            },
            value => target.iter().map(|slot| (slot, value.clone())).collect(),
        };
        let mut types = self.types().clone();
        types.extend(types_of(writes.iter().map(|(_, v)| v)));
        self.set_types(types);
        let mut elements = self.element_list().write();
        for (slot, v) in writes { elements[slot] = v; }
        Ok(())
    }

    // ------------------------------------------------------------------------

    /// Reorder the dimensions. `names` must name every dimension once. An
    /// empty `names` reverses the order.
    pub fn transpose(&self, names: &[&str]) -> Result<NTable> {
        let ndim = self.ndim();
        let axes: Vec<usize> = if names.is_empty() {
            (0..ndim).rev().collect()
        } else {
            names.iter().map(|n| self.coords().require_axis(n)).collect::<Result<_>>()?
        };
        let mut seen = vec![false; ndim];
        for &a in &axes { seen[a] = true; }
        if axes.len() != ndim || seen.contains(&false) {
            return Err(Error::value(format!(
                "{:?} is not a permutation of the dimensions {:?}",
                names, self.coords().names().collect::<Vec<_>>(),
            )));
        }
        self.reindexed(self.index().transpose(&axes))
    }

    /// The dimensions in reverse order.
    pub fn t(&self) -> Result<NTable> { self.transpose(&[]) }

    /// Rename labels of `dim`. Labels not mentioned keep their names.
    pub fn relabel(&self, dim: &str, pairs: &[(Label, Label)]) -> Result<NTable> {
        let axis = self.coords().require_axis(dim)?;
        let mut dims = self.dims().to_vec();
        for label in &mut dims[axis].labels {
            if let Some((_, new)) = pairs.iter().find(|(old, _)| old == label) { *label = new.clone(); }
        }
        let coords = Coords::new(dims, self.coords().scalars().to_vec())?;
        self.reindexed(self.index().with_coords(coords)?)
    }

    /// Join `tables` along `dim`.
    ///
    /// If every table has `dim` as a dimension, their labels along `dim` are
    /// concatenated and must stay unique. If none has it, a new last
    /// dimension is created with `labels`, or else the tables' scalar
    /// coordinates called `dim`, or else `0, 1, ...`. Other dimensions are
    /// joined by label; coordinates a table lacks hold `Null`.
    ///
    /// The element list of the result is the element lists of `tables`
    /// concatenated in order. The engine is that of the first table.
    pub fn concat(tables: &[NTable], dim: &str, labels: Option<Vec<Label>>) -> Result<NTable> {
        let first = tables.first().ok_or_else(|| Error::value("need at least one table to concatenate"))?;
        let present = tables.iter().filter(|t| t.coords().axis(dim).is_some()).count();
        let (coords, parts) = if present == 0 {
            concat_new(tables, dim, labels)?
        } else if present == tables.len() {
            concat_existing(tables, dim)?
        } else {
            return Err(Error::value(format!("dimension '{}' is missing from some of the tables", dim)));
        };
        let mut elements: Vec<Value> = Vec::new();
        let mut offsets = Vec::with_capacity(tables.len());
        let mut types = TypeSet::new();
        for t in tables {
            offsets.push(elements.len());
            elements.extend(t.element_list().read().iter().cloned());
            types.extend(t.types().iter().cloned());
        }
        let mut null = None;
        let refs: Vec<usize> = parts.into_iter().map(|(k, r)| match r {
            Some(r) => offsets[k] + r,
            None => *null.get_or_insert_with(|| {
                elements.push(Value::Null);
                types.insert(ElementType::Null);
                elements.len() - 1
            }),
        }).collect();
        if null.is_some() { tracing::debug!(dim, "concatenation padded with NULL"); }
        let index = IndexMap::from_parts(coords, Refs::Dense(refs.into()));
        Ok(NTable::from_parts(Arc::new(RwLock::new(elements)), index, first.engine().clone(), types))
    }

    /// `self` followed by `other` along the first dimension of `self`.
    pub fn append(&self, other: &NTable) -> Result<NTable> {
        let dim = self.dims().first().ok_or_else(|| Error::value("cannot append to a table with no dimensions"))?;
        NTable::concat(&[self.clone(), other.clone()], &dim.name, None)
    }

    // ------------------------------------------------------------------------

    /// One view per combination of labels of the dimensions not in `keep`.
    /// Each view holds the dimensions in `keep`, with the others recorded as
    /// scalar coordinates.
    pub fn flatter(&self, keep: &[&str]) -> Result<Vec<NTable>> {
        for name in keep {
            if self.coords().axis(name).is_none() {
                return Err(Error::value(format!("dim {} not found", name)));
            }
        }
        let outer = Coords::new_unchecked(
            self.dims().iter().filter(|d| !keep.contains(&d.name.as_str())).cloned().collect(),
            Vec::new(),
        );
        let mut selections = Vec::with_capacity(outer.len());
        outer.each(|index| selections.push(outer.labels_at(index)));
        selections.into_iter().map(|labels| {
            let selection: Vec<(&str, Selector<Label>)> = outer.dims().iter().zip(labels)
                .map(|(d, l)| (d.name.as_str(), Selector::One(l)))
                .collect();
            self.loc(&selection)
        }).collect()
    }

    /// A table over the dimensions not in `keep` whose elements are the
    /// views returned by [`flatter()`].
    ///
    /// [`flatter()`]: Self::flatter()
    pub fn compress(&self, keep: &[&str]) -> Result<NTable> {
        let elements: Vec<Value> = self.flatter(keep)?.into_iter().map(Value::Table).collect();
        let dims: Vec<Dim> = self.dims().iter().filter(|d| !keep.contains(&d.name.as_str())).cloned().collect();
        let coords = Coords::new(dims, self.coords().scalars().to_vec())?;
        NTable::new(elements, IndexMap::basic(coords), Some(self.engine().clone()), None)
    }

    /// The only value of a table with one position.
    pub fn item(&self) -> Result<Value> {
        if self.len() != 1 {
            return Err(Error::value(format!(
                "cannot return a single item of a table of size {}", self.len(),
            )));
        }
        Ok(self.values().swap_remove(0))
    }

    /// The values in row-major order.
    pub fn flat(&self) -> impl Iterator<Item=Value> { self.values().into_iter() }
}

type Parts = Vec<(usize, Option<usize>)>;

fn concat_new(tables: &[NTable], dim: &str, labels: Option<Vec<Label>>) -> Result<(Coords, Parts)> {
    let scalars: Option<Vec<Label>> = tables.iter().map(|t| t.coords().scalar(dim).cloned()).collect();
    let labels = match (labels, scalars) {
        (Some(labels), _) => labels,
        (None, Some(scalars)) if scalars.iter().enumerate().all(|(i, l)| !scalars[..i].contains(l)) => scalars,
        _ => (0..tables.len()).map(Label::from).collect(),
    };
    if labels.len() != tables.len() {
        return Err(Error::value(format!(
            "{} labels given for {} tables", labels.len(), tables.len(),
        )));
    }
    let others = union(tables.iter().map(|t| t.coords()));
    let mut dims = others.dims().to_vec();
    dims.push(Dim::new(dim, labels));
    let scalars = others.scalars().iter().filter(|(n, _)| n != dim).cloned().collect();
    let coords = Coords::new(dims, scalars)?;
    let lookups = tables.iter().map(|t| t.index().reindex(&others)).collect::<Result<Vec<_>>>()?;
    let mut parts = Vec::with_capacity(coords.len());
    for p in 0..others.len() {
        for (k, lookup) in lookups.iter().enumerate() { parts.push((k, lookup[p])); }
    }
    Ok((coords, parts))
}

fn concat_existing(tables: &[NTable], dim: &str) -> Result<(Coords, Parts)> {
    let joined = union(tables.iter().map(|t| t.coords()));
    let axis = joined.require_axis(dim)?;
    let mut dims = joined.dims().to_vec();
    dims[axis].labels = tables.iter()
        .flat_map(|t| t.coords().dim(dim).map(|d| d.labels.clone()).unwrap_or_default())
        .collect();
    let coords = Coords::new(dims, joined.scalars().to_vec())?;
    let mut lookups = Vec::with_capacity(tables.len());
    let mut starts = Vec::with_capacity(tables.len());
    let mut start = 0;
    for t in tables {
        let mut own = coords.dims().to_vec();
        let n = t.coords().dim(dim).map_or(0, Dim::len);
        own[axis].labels = coords.dims()[axis].labels[start..start + n].to_vec();
        let own = Coords::new_unchecked(own, Vec::new());
        lookups.push((t.index().reindex(&own)?, own));
        starts.push(start);
        start += n;
    }
    let mut parts = Vec::with_capacity(coords.len());
    let mut local = vec![0; coords.ndim()];
    coords.each(|index| {
        let k = starts.iter().rposition(|&s| s <= index[axis]).unwrap_or(0);
        local.copy_from_slice(index);
        local[axis] -= starts[k];
        let (lookup, own) = &lookups[k];
        parts.push((k, lookup[own.to_usize(&local)]));
    });
    Ok((coords, parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str], cols: &[&str]) -> NTable {
        let coords = Coords::from_dims([Dim::new("rows", rows.iter().copied()), Dim::new("cols", cols.iter().copied())]).unwrap();
        let mut values = Vec::new();
        for r in rows { for c in cols { values.push(Value::from(format!("{}{}", r, c))); } }
        NTable::from_vec(coords, values).unwrap()
    }

    fn l(s: &str) -> Label { Label::from(s) }

    #[test]
    fn label_selection() {
        let t = grid(&["r1", "r2", "r3"], &["c1", "c2"]);
        let span = t.loc(&[("rows", Selector::Span(Some(l("r2")), None))]).unwrap();
        assert_eq!(span.shape(), vec![2, 2]);
        assert!(span.shares_elements(&t));
        let many = t.loc(&[("cols", Selector::Many(vec![l("c2"), l("c1")]))]).unwrap();
        assert_eq!(many.value_at(&[0, 0]), Value::from("r1c2"));
        assert!(matches!(t.loc(&[("rows", Selector::One(l("r9")))]), Err(Error::Key(_))));
        assert!(matches!(t.loc(&[("nope", Selector::All)]), Err(Error::Key(_))));
    }

    #[test]
    fn positional_selection() {
        let t = grid(&["r1", "r2", "r3"], &["c1", "c2"]);
        let last = t.isel(&[Selector::One(-1)]).unwrap();
        assert_eq!(last.values(), vec![Value::from("r3c1"), Value::from("r3c2")]);
        let head = t.isel(&[Selector::Span(None, Some(2)), Selector::One(1)]).unwrap();
        assert_eq!(head.values(), vec![Value::from("r1c2"), Value::from("r2c2")]);
        assert!(matches!(t.isel(&[Selector::One(3)]), Err(Error::Index(_))));
    }

    #[test]
    fn assignment() {
        let mut t = grid(&["r1", "r2"], &["c1", "c2"]);
        let view = t.clone();
        t.set_loc(&[("rows", Selector::One(l("r1")))], 7).unwrap();
        assert_eq!(view.value_at(&[0, 1]), Value::Int(7));
        assert!(t.types().contains(&ElementType::Int));

        let source = grid(&["r2"], &["c2", "c1"]);
        t.set_loc(&[("rows", Selector::Many(vec![l("r2")]))], source).unwrap();
        assert_eq!(t.value_at(&[1, 0]), Value::from("r2c1"));

        let wrong = grid(&["r2"], &["c3"]);
        let e = t.set_loc(&[("rows", Selector::Many(vec![l("r2")]))], wrong).unwrap_err();
        assert!(matches!(e, Error::Shape(_)));

        t.set_isel(&[Selector::All, Selector::One(0)], "z").unwrap();
        assert_eq!(t.values()[2], Value::from("z"));
    }

    #[test]
    fn transposition() {
        let t = grid(&["r1", "r2", "r3"], &["c1", "c2"]);
        let tt = t.t().unwrap();
        assert_eq!(tt.shape(), vec![2, 3]);
        assert_eq!(tt.value_at(&[1, 2]), Value::from("r3c2"));
        assert_eq!(t.transpose(&["cols", "rows"]).unwrap(), tt);
        assert!(t.transpose(&["cols"]).is_err());
        assert!(t.transpose(&["cols", "cols"]).is_err());
    }

    #[test]
    fn concatenate_existing() {
        let a = grid(&["r1", "r2"], &["c1", "c2"]);
        let b = grid(&["r3"], &["c1", "c2"]);
        let c = NTable::concat(&[a.clone(), b.clone()], "rows", None).unwrap();
        assert_eq!(c.shape(), vec![3, 2]);
        assert_eq!(c.dims()[1], a.dims()[1]);
        assert_eq!(c.elements(), [a.elements(), b.elements()].concat());
        assert_eq!(c.value_at(&[2, 1]), Value::from("r3c2"));
        assert_eq!(a.append(&b).unwrap(), c);
        assert!(NTable::concat(&[a.clone(), a.clone()], "rows", None).is_err());
    }

    #[test]
    fn concatenate_ragged() {
        let a = grid(&["r1"], &["c1", "c2"]);
        let b = grid(&["r2"], &["c2", "c3"]);
        let c = NTable::concat(&[a, b], "rows", None).unwrap();
        assert_eq!(c.shape(), vec![2, 3]);
        assert!(c.value_at(&[0, 2]).is_null());
        assert!(c.value_at(&[1, 0]).is_null());
        assert_eq!(c.value_at(&[1, 1]), Value::from("r2c2"));
        assert_eq!(c.elements().len(), 5);
    }

    #[test]
    fn concatenate_new() {
        let a = grid(&["r1"], &["c1"]);
        let b = grid(&["r1"], &["c1"]);
        let c = NTable::concat(&[a.clone(), b.clone()], "run", None).unwrap();
        assert_eq!(c.shape(), vec![1, 1, 2]);
        assert_eq!(c.dims()[2].labels, vec![Label::Int(0), Label::Int(1)]);
        let named = NTable::concat(&[a, b], "run", Some(vec![l("x"), l("y")])).unwrap();
        assert_eq!(named.dims()[2].labels, vec![l("x"), l("y")]);
    }

    #[test]
    fn flatten_and_compress() {
        let t = grid(&["r1", "r2"], &["c1", "c2", "c3"]);
        let rows = t.flatter(&["cols"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].shape(), vec![3]);
        assert_eq!(rows[1].coords().scalar("rows"), Some(&l("r2")));
        let compressed = t.compress(&["cols"]).unwrap();
        assert_eq!(compressed.shape(), vec![2]);
        assert_eq!(compressed.values()[0], Value::Table(rows[0].clone()));
        let back = NTable::concat(
            &compressed.values().iter().filter_map(|v| v.as_table().cloned()).collect::<Vec<_>>(),
            "rows",
            None,
        ).unwrap();
        assert_eq!(back.t().unwrap(), t);
        assert!(t.flatter(&["nope"]).is_err());
    }

    #[test]
    fn relabelling_and_items() {
        let t = grid(&["r1", "r2"], &["c1"]);
        let r = t.relabel("rows", &[(l("r1"), l("first"))]).unwrap();
        assert_eq!(r.dims()[0].labels, vec![l("first"), l("r2")]);
        assert!(t.relabel("rows", &[(l("r1"), l("r2"))]).is_err());
        assert!(t.item().is_err());
        let one = t.isel(&[Selector::One(0), Selector::One(0)]).unwrap();
        assert_eq!(one.item().unwrap(), Value::from("r1c1"));
        assert_eq!(t.flat().count(), 2);
    }
}
