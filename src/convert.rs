//! Conversions between tables and other shapes of data.

use super::{
    default_coords, tabulate, Coords, Dim, EngineRef, Error, IndexMap, Label, NTable, Result, Value,
};

/// A dense labelled array of values in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    pub coords: Coords,
    pub values: Vec<Value>,
}

/// A one- or two-dimensional labelled table.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Series {
        index: Vec<Label>,
        values: Vec<Value>,
    },
    Table {
        index: Vec<Label>,
        columns: Vec<Label>,
        /// One row per label of `index`.
        rows: Vec<Vec<Value>>,
    },
}

fn depth(value: &Value) -> usize {
    match value {
        Value::Map(entries) => 1 + entries.iter().map(|(_, v)| depth(v)).max().unwrap_or(0),
        _ => 0,
    }
}

fn collect_labels(value: &Value, level: usize, out: &mut [Vec<Label>]) {
    if let Value::Map(entries) = value {
        for (k, v) in entries {
            if !out[level].contains(k) { out[level].push(k.clone()); }
            collect_labels(v, level + 1, out);
        }
    }
}

fn lookup(value: &Value, path: &[Label]) -> Value {
    let mut current = value;
    for key in path {
        current = match current {
            Value::Map(entries) => match entries.iter().find(|(k, _)| k == key) {
                Some((_, v)) => v,
                None => return Value::Null,
            },
            _ => return Value::Null,
        };
    }
    current.clone()
}

fn names(dims: Option<&[&str]>, n: usize, default: impl Fn(usize) -> String) -> Result<Vec<String>> {
    match dims {
        Some(dims) if dims.len() != n => Err(Error::value(format!(
            "{} dimension names given for {} dimensions", dims.len(), n,
        ))),
        Some(dims) => Ok(dims.iter().map(|d| d.to_string()).collect()),
        None => Ok((0..n).map(default).collect()),
    }
}

impl NTable {
    /// A table from a nested label-keyed mapping.
    ///
    /// Level `i` of the nesting becomes dimension `i`, called `dims[i]` or
    /// `dim{i}`, whose labels are the keys seen at that level in the order
    /// they are first seen. Combinations of keys that the mapping lacks hold
    /// `Null`.
    ///
    /// ```
    /// use ntable::{NTable, Value};
    /// let m = Value::map([("a", Value::map([("x", 1)])), ("b", Value::map([("y", 2)]))]);
    /// let t = NTable::from_mapping(&m, None, None).unwrap();
    /// assert_eq!(t.shape(), vec![2, 2]);
    /// assert!(t.value_at(&[0, 1]).is_null());
    /// ```
    pub fn from_mapping(mapping: &Value, dims: Option<&[&str]>, engine: Option<EngineRef>) -> Result<NTable> {
        if !matches!(mapping, Value::Map(_)) {
            return Err(Error::type_error(format!("expected a map, not '{}'", mapping.type_name())));
        }
        let d = depth(mapping);
        let mut labels = vec![Vec::new(); d];
        collect_labels(mapping, 0, &mut labels);
        let names = names(dims, d, |i| format!("dim{}", i))?;
        let coords = Coords::from_dims(names.into_iter().zip(labels).map(|(name, labels)| Dim {name, labels}))?;
        let mut elements = Vec::with_capacity(coords.len());
        coords.each(|index| elements.push(lookup(mapping, &coords.labels_at(index))));
        NTable::new(elements, IndexMap::basic(coords), engine, None)
    }

    /// A table from a labelled array.
    pub fn from_array(array: LabeledArray, engine: Option<EngineRef>) -> Result<NTable> {
        if array.values.len() != array.coords.len() {
            return Err(Error::shape(format!(
                "{} values do not fit shape {:?}", array.values.len(), array.coords.shape(),
            )));
        }
        NTable::new(array.values, IndexMap::basic(array.coords), engine, None)
    }

    /// A table from a frame, with dimensions `dims` or `rows` and `cols`.
    pub fn from_frame(frame: Frame, dims: Option<&[&str]>, engine: Option<EngineRef>) -> Result<NTable> {
        let (dims, values) = match frame {
            Frame::Series {index, values} => {
                let names = names(dims, 1, |_| "rows".to_string())?;
                (vec![Dim {name: names[0].clone(), labels: index}], values)
            },
            Frame::Table {index, columns, rows} => {
                if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
                    return Err(Error::shape(format!(
                        "a row of {} values does not fit {} columns", row.len(), columns.len(),
                    )));
                }
                let names = names(dims, 2, |i| ["rows", "cols"][i].to_string())?;
                let dims = vec![
                    Dim {name: names[0].clone(), labels: index},
                    Dim {name: names[1].clone(), labels: columns},
                ];
                (dims, rows.into_iter().flatten().collect())
            },
        };
        NTable::from_array(LabeledArray {coords: Coords::from_dims(dims)?, values}, engine)
    }

    /// A nested mapping with one level per dimension. The inverse of
    /// [`from_mapping()`] for mappings with no gaps.
    ///
    /// [`from_mapping()`]: Self::from_mapping()
    pub fn to_dictionary(&self) -> Result<Value> {
        let dim = self.dims().first()
            .ok_or_else(|| Error::value("cannot convert a table with no dimensions to a dictionary"))?;
        let mut entries = Vec::with_capacity(dim.len());
        for (label, slice) in self.dim_map(&dim.name)?.items()? {
            let value = if slice.ndim() > 0 { slice.to_dictionary()? } else { slice.item()? };
            entries.push((label, value));
        }
        Ok(Value::Map(entries))
    }

    pub fn to_array(&self) -> LabeledArray {
        LabeledArray {coords: self.coords().clone(), values: self.values()}
    }

    /// A [`Frame::Series`] or [`Frame::Table`]. Other ranks are an
    /// [`Error::Value`].
    pub fn to_frame(&self) -> Result<Frame> {
        let values = self.values();
        match self.dims() {
            [index] => Ok(Frame::Series {index: index.labels.clone(), values}),
            [index, columns] => Ok(Frame::Table {
                index: index.labels.clone(),
                columns: columns.labels.clone(),
                rows: (0..index.len()).map(|i| values[i * columns.len()..(i + 1) * columns.len()].to_vec()).collect(),
            }),
            dims => Err(Error::value(format!(
                "unable to convert a {}-dimensional table to a frame", dims.len(),
            ))),
        }
    }
}

/// Make a table from `value`.
///
/// A mapping is converted with [`NTable::from_mapping()`]. A table is viewed
/// with `engine`, or keeps its own. A list, tuple, or slice containing tables
/// is restructured with [`tabulate()`]. Anything else is an
/// [`Error::Type`].
pub fn ntable(value: &Value, dims: Option<&[&str]>, engine: Option<EngineRef>) -> Result<NTable> {
    if let Value::Map(_) = value { return NTable::from_mapping(value, dims, engine); }
    let mut table = tabulate(value)?
        .ok_or_else(|| Error::type_error(format!("unable to convert '{}' to NTable", value.type_name())))?;
    if let Some(engine) = engine { table.set_engine(engine)?; }
    Ok(table)
}

/// A table of the given shape from row-major `values`, with dimensions
/// `dim0, dim1, ...` labelled `coord0, coord1, ...`.
pub fn from_shape(shape: &[usize], values: Vec<Value>) -> Result<NTable> {
    NTable::from_array(LabeledArray {coords: default_coords(shape)?, values}, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> Value {
        Value::map([
            ("row1", Value::map([("col1", "r1c1"), ("col2", "r1c2")])),
            ("row2", Value::map([("col1", "r2c1"), ("col2", "r2c2")])),
        ])
    }

    #[test]
    fn mapping_round_trip() {
        let t = NTable::from_mapping(&nested(), None, None).unwrap();
        assert_eq!(t.dims()[0].name, "dim0");
        assert_eq!(t.value_at(&[1, 0]), Value::from("r2c1"));
        assert_eq!(t.to_dictionary().unwrap(), nested());
        let named = NTable::from_mapping(&nested(), Some(&["rows", "cols"][..]), None).unwrap();
        assert_eq!(named.dims()[1].name, "cols");
        assert!(NTable::from_mapping(&nested(), Some(&["rows"][..]), None).is_err());
        assert!(matches!(NTable::from_mapping(&Value::Int(1), None, None), Err(Error::Type(_))));
    }

    #[test]
    fn ragged_mapping() {
        let m = Value::map([("a", Value::map([("x", 1)])), ("b", Value::Int(2))]);
        let t = NTable::from_mapping(&m, None, None).unwrap();
        assert_eq!(t.shape(), vec![2, 1]);
        assert!(t.value_at(&[1, 0]).is_null());
    }

    #[test]
    fn frames() {
        let frame = Frame::Table {
            index: vec!["a".into(), "b".into()],
            columns: vec!["x".into()],
            rows: vec![vec![1.into()], vec![2.into()]],
        };
        let t = NTable::from_frame(frame.clone(), None, None).unwrap();
        assert_eq!(t.dims()[1].name, "cols");
        assert_eq!(t.to_frame().unwrap(), frame);
        let series = t.dim_map("cols").unwrap().get(&"x".into()).unwrap().to_frame().unwrap();
        assert_eq!(series, Frame::Series {index: vec!["a".into(), "b".into()], values: vec![1.into(), 2.into()]});
        let cube = from_shape(&[1, 1, 1], vec![Value::Unit]).unwrap();
        assert!(matches!(cube.to_frame(), Err(Error::Value(_))));
        let bad = Frame::Table {index: vec!["a".into()], columns: vec!["x".into(), "y".into()], rows: vec![vec![1.into()]]};
        assert!(matches!(NTable::from_frame(bad, None, None), Err(Error::Shape(_))));
    }

    #[test]
    fn arrays_and_dispatch() {
        let t = from_shape(&[2], vec![1.into(), 2.into()]).unwrap();
        assert_eq!(NTable::from_array(t.to_array(), None).unwrap(), t);
        assert_eq!(ntable(&nested(), None, None).unwrap().shape(), vec![2, 2]);
        let tupled = ntable(&Value::tuple([Value::from(t.clone()), Value::Int(0)]), None, None).unwrap();
        assert_eq!(tupled.values()[1], Value::tuple([2, 0]));
        assert!(matches!(ntable(&Value::Int(3), None, None), Err(Error::Type(_))));
        assert_eq!(ntable(&t.clone().into(), None, None).unwrap(), t);
    }
}
