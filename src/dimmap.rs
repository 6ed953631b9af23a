//! A dictionary-like view of a table along one dimension.

use super::{filter, full, Error, Label, NTable, Result, Selector, Value};

/// The labels of one dimension of a table, each mapped to the slice of the
/// table at that label.
///
/// Slices drop the dimension, recording the label as a scalar coordinate.
///
/// ```
/// use ntable::{Coords, Dim, DimMap, Label, NTable, Value};
/// let coords = Coords::from_dims([Dim::new("r", ["a", "b"]), Dim::new("c", ["x", "y"])]).unwrap();
/// let t = NTable::from_vec(coords, (0..4).map(Value::from).collect()).unwrap();
/// let rows = DimMap::new(t, "r").unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows.get(&Label::from("b")).unwrap().values(), vec![Value::Int(2), Value::Int(3)]);
/// ```
#[derive(Debug, Clone)]
pub struct DimMap {
    table: NTable,
    dim: String,
    axis: usize,
}

impl DimMap {
    /// Returns [`Error::Value`] if `table` has no dimension `dim`.
    pub fn new(table: NTable, dim: &str) -> Result<Self> {
        let axis = table.coords().axis(dim)
            .ok_or_else(|| Error::value(format!("{} dimension does not exist", dim)))?;
        Ok(Self {table, dim: dim.to_string(), axis})
    }

    pub fn table(&self) -> &NTable { &self.table }

    pub fn dim(&self) -> &str { &self.dim }

    pub fn labels(&self) -> &[Label] { &self.table.dims()[self.axis].labels }

    pub fn len(&self) -> usize { self.labels().len() }

    pub fn is_empty(&self) -> bool { self.labels().is_empty() }

    /// The slice at `label`, or [`Error::Key`].
    pub fn get(&self, label: &Label) -> Result<NTable> {
        self.table.loc(&[(self.dim.as_str(), Selector::One(label.clone()))])
    }

    /// The slices at `labels`, keeping the dimension.
    pub fn get_many(&self, labels: &[Label]) -> Result<NTable> {
        self.table.loc(&[(self.dim.as_str(), Selector::Many(labels.to_vec()))])
    }

    pub fn values(&self) -> Result<Vec<NTable>> { self.labels().iter().map(|l| self.get(l)).collect() }

    pub fn items(&self) -> Result<Vec<(Label, NTable)>> {
        self.labels().iter().map(|l| Ok((l.clone(), self.get(l)?))).collect()
    }

    /// Keep the labels containing `text`.
    pub fn contains(&self, text: &str) -> Result<NTable> {
        self.table.filter(&[(self.dim.as_str(), filter::contains(text))])
    }

    /// Keep the labels matching `pattern` at their start.
    pub fn matches(&self, pattern: &str) -> Result<NTable> {
        self.table.filter(&[(self.dim.as_str(), filter::matches(pattern)?)])
    }

    pub fn relabel(&self, pairs: &[(Label, Label)]) -> Result<NTable> { self.table.relabel(self.dim.as_str(), pairs) }

    pub fn alchemy_get(&self, pattern: &str) -> Result<NTable> { self.table.alchemy_get(self.dim.as_str(), pattern) }
}

// ----------------------------------------------------------------------------

impl NTable {
    /// A [`DimMap`] of `dim`.
    pub fn dim_map(&self, dim: &str) -> Result<DimMap> { DimMap::new(self.clone(), dim) }

    /// Assign `value` to the slice at `label` of `dim`.
    ///
    /// If `dim` has no such label, `self` is first extended by a slab of
    /// `Null`s at `label`. The extension gives `self` a new element list, so
    /// other views of the old one do not see it.
    ///
    /// ```
    /// use ntable::{sblank, Label, Value};
    /// let mut t = sblank(&[1, 2], None).unwrap();
    /// t.set_dim("dim0", "new", Value::Int(1)).unwrap();
    /// assert_eq!(t.shape(), vec![2, 2]);
    /// assert_eq!(t.values()[2..], [Value::Int(1), Value::Int(1)]);
    /// ```
    pub fn set_dim(&mut self, dim: &str, label: impl Into<Label>, value: impl Into<Value>) -> Result<()> {
        let label = label.into();
        let axis = self.coords().require_axis(dim)?;
        if self.dims()[axis].position(&label).is_none() {
            let mut dims = self.dims().to_vec();
            dims[axis].labels = vec![label.clone()];
            let coords = super::Coords::new(dims, self.coords().scalars().to_vec())?;
            let slab = full(coords, Value::Null, self.engine().clone())?;
            tracing::debug!(dim, %label, "extending table with a NULL slab");
            *self = NTable::concat(&[self.clone(), slab], dim, None)?;
        }
        self.set_loc(&[(dim, Selector::One(label))], value)
    }

    /// Assign to several labels of `dim`.
    ///
    /// A table `value` must have `dim` with as many labels as `labels`; its
    /// slices are assigned in order. Any other value is assigned to every
    /// label.
    pub fn set_dim_many(&mut self, dim: &str, labels: &[Label], value: impl Into<Value>) -> Result<()> {
        match value.into() {
            Value::Table(t) => {
                let slices = DimMap::new(t, dim)?;
                if slices.len() != labels.len() {
                    return Err(Error::value(format!(
                        "value.{} must have the same length as the labels ({} != {})", dim, slices.len(), labels.len(),
                    )));
                }
                for (label, slice) in labels.iter().zip(slices.values()?) {
                    self.set_dim(dim, label.clone(), slice)?;
                }
            },
            value => for label in labels { self.set_dim(dim, label.clone(), value.clone())?; },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{Coords, Dim};

    fn grid() -> NTable {
        let coords = Coords::from_dims([Dim::new("r", ["a", "b"]), Dim::new("c", ["x", "y"])]).unwrap();
        NTable::from_vec(coords, (0..4).map(Value::from).collect()).unwrap()
    }

    fn l(s: &str) -> Label { Label::from(s) }

    #[test]
    fn mapping_view() {
        let cols = grid().dim_map("c").unwrap();
        assert_eq!(cols.labels(), [l("x"), l("y")]);
        let items = cols.items().unwrap();
        assert_eq!(items[1].0, l("y"));
        assert_eq!(items[1].1.values(), vec![Value::Int(1), Value::Int(3)]);
        assert!(matches!(cols.get(&l("z")), Err(Error::Key(_))));
        assert!(matches!(grid().dim_map("z"), Err(Error::Value(_))));
        assert_eq!(cols.contains("y").unwrap().shape(), vec![2, 1]);
        assert_eq!(cols.matches("[xy]").unwrap().shape(), vec![2, 2]);
        assert_eq!(cols.relabel(&[(l("x"), l("w"))]).unwrap().dims()[1].labels[0], l("w"));
        assert_eq!(cols.get_many(&[l("y")]).unwrap().values(), vec![Value::Int(1), Value::Int(3)]);
    }

    #[test]
    fn assign_existing_and_new() {
        let mut t = grid();
        t.set_dim("c", "x", "s").unwrap();
        assert_eq!(t.values(), vec!["s".into(), Value::Int(1), "s".into(), Value::Int(3)]);
        t.set_dim("r", "c", 9).unwrap();
        assert_eq!(t.shape(), vec![3, 2]);
        assert_eq!(t.value_at(&[2, 1]), Value::Int(9));
        assert_eq!(t.elements().len(), 6);
    }

    #[test]
    fn assign_many() {
        let mut t = grid();
        let source = grid();
        t.set_dim_many("r", &[l("b"), l("z")], source.clone()).unwrap();
        assert_eq!(t.shape(), vec![3, 2]);
        assert_eq!(t.value_at(&[1, 0]), Value::Int(0));
        assert_eq!(t.value_at(&[2, 1]), Value::Int(3));
        let e = t.set_dim_many("r", &[l("a")], source).unwrap_err();
        assert!(matches!(e, Error::Value(_)));
        t.set_dim_many("c", &[l("x"), l("y")], Value::Null).unwrap();
        assert!(t.values().iter().all(Value::is_null));
    }
}
