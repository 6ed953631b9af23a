use serde::{Deserialize, Serialize};

use super::{Error, Label, Result};

/// A named dimension with an ordered list of unique labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dim {
    pub name: String,
    pub labels: Vec<Label>,
}

impl Dim {
    pub fn new<L: Into<Label>>(name: impl Into<String>, labels: impl IntoIterator<Item=L>) -> Self {
        Self {name: name.into(), labels: labels.into_iter().map(Into::into).collect()}
    }

    /// A dimension labelled `0..len`.
    pub fn range(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, (0..len).map(Label::from))
    }

    #[inline(always)]
    pub fn len(&self) -> usize { self.labels.len() }

    pub fn is_empty(&self) -> bool { self.labels.is_empty() }

    /// The position of `label`.
    pub fn position(&self, label: &Label) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Like [`position()`] but returns [`Error::Key`] if `label` is absent.
    ///
    /// [`position()`]: Self::position()
    pub fn require(&self, label: &Label) -> Result<usize> {
        self.position(label).ok_or_else(|| Error::key(format!(
            "'{}' is not a label of dimension '{}'", label, self.name,
        )))
    }
}

// ----------------------------------------------------------------------------

/// The coordinate space of a table.
///
/// `dims` define the shape, in row-major order: the last dimension varies
/// fastest. `scalars` are coordinates of size one that have been dropped from
/// the shape, for example by selecting a single label.
///
/// A `Coords` has at least one dimension or scalar coordinate. All names are
/// unique, and so are the labels within each dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coords {
    dims: Vec<Dim>,
    scalars: Vec<(String, Label)>,
}

impl Coords {
    /// Validate and construct.
    ///
    /// ```
    /// use ntable::{Coords, Dim};
    /// let c = Coords::new(vec![Dim::new("rows", ["a", "b"]), Dim::range("cols", 3)], vec![]).unwrap();
    /// assert_eq!(c.shape(), vec![2, 3]);
    /// assert_eq!(c.to_usize(&[1, 2]), 5);
    /// assert!(Coords::new(vec![], vec![]).is_err());
    /// ```
    pub fn new(dims: Vec<Dim>, scalars: Vec<(String, Label)>) -> Result<Self> {
        if dims.is_empty() && scalars.is_empty() {
            return Err(Error::value("an index map needs at least one coordinate"));
        }
        let names: Vec<&str> = dims.iter().map(|d| d.name.as_str())
            .chain(scalars.iter().map(|(n, _)| n.as_str()))
            .collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::value(format!("duplicate dimension name '{}'", name)));
            }
        }
        for dim in &dims {
            for (i, label) in dim.labels.iter().enumerate() {
                if dim.labels[..i].contains(label) {
                    return Err(Error::value(format!(
                        "duplicate label '{}' in dimension '{}'", label, dim.name,
                    )));
                }
            }
        }
        Ok(Self {dims, scalars})
    }

    /// Construct from dimensions only.
    pub fn from_dims(dims: impl IntoIterator<Item=Dim>) -> Result<Self> {
        Self::new(dims.into_iter().collect(), Vec::new())
    }

    /// A one-dimensional coordinate space.
    pub fn one<L: Into<Label>>(name: impl Into<String>, labels: impl IntoIterator<Item=L>) -> Result<Self> {
        Self::from_dims([Dim::new(name, labels)])
    }

    pub(crate) fn new_unchecked(dims: Vec<Dim>, scalars: Vec<(String, Label)>) -> Self {
        Self {dims, scalars}
    }

    pub fn dims(&self) -> &[Dim] { &self.dims }

    pub fn scalars(&self) -> &[(String, Label)] { &self.scalars }

    pub fn names(&self) -> impl Iterator<Item=&str> { self.dims.iter().map(|d| d.name.as_str()) }

    pub fn ndim(&self) -> usize { self.dims.len() }

    pub fn shape(&self) -> Vec<usize> { self.dims.iter().map(Dim::len).collect() }

    /// The number of positions.
    #[inline(always)]
    pub fn len(&self) -> usize { self.dims.iter().map(Dim::len).product() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// The axis number of the dimension called `name`.
    pub fn axis(&self, name: &str) -> Option<usize> { self.dims.iter().position(|d| d.name == name) }

    /// Like [`axis()`] but returns [`Error::Key`] if there is no such
    /// dimension.
    ///
    /// [`axis()`]: Self::axis()
    pub fn require_axis(&self, name: &str) -> Result<usize> {
        self.axis(name).ok_or_else(|| Error::key(format!("no dimension named '{}'", name)))
    }

    pub fn dim(&self, name: &str) -> Option<&Dim> { self.dims.iter().find(|d| d.name == name) }

    pub fn scalar(&self, name: &str) -> Option<&Label> {
        self.scalars.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    /// Whether `name` is a dimension or a scalar coordinate.
    pub fn contains(&self, name: &str) -> bool { self.axis(name).is_some() || self.scalar(name).is_some() }

    /// Returns the position (in `0..len()`) of the multi-index `index`.
    ///
    /// Panics if `index` is out of bounds.
    pub fn to_usize(&self, index: &[usize]) -> usize {
        assert_eq!(index.len(), self.dims.len());
        let mut position = 0;
        for (i, dim) in index.iter().zip(&self.dims) {
            assert!(*i < dim.len());
            position = position * dim.len() + i;
        }
        position
    }

    /// The inverse of [`to_usize()`].
    ///
    /// [`to_usize()`]: Self::to_usize()
    pub fn from_usize(&self, mut position: usize) -> Vec<usize> {
        let mut index = vec![0; self.dims.len()];
        for (i, dim) in self.dims.iter().enumerate().rev() {
            index[i] = position % dim.len();
            position /= dim.len();
        }
        index
    }

    /// Equivalent to, but more efficient than,
    /// ```text
    /// for i in 0..self.len() { f(&self.from_usize(i)); }
    /// ```
    pub fn each(&self, mut f: impl FnMut(&[usize])) {
        if self.is_empty() { return; }
        let mut index = vec![0; self.dims.len()];
        'outer: loop {
            f(&index);
            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < self.dims[axis].len() { continue 'outer; }
                index[axis] = 0;
            }
            break;
        }
    }

    /// The labels of the multi-index `index`.
    pub fn labels_at(&self, index: &[usize]) -> Vec<Label> {
        index.iter().zip(&self.dims).map(|(&i, d)| d.labels[i].clone()).collect()
    }

    /// Returns `self` with the dimensions in the order given by `axes`.
    pub(crate) fn permuted(&self, axes: &[usize]) -> Self {
        Self {
            dims: axes.iter().map(|&a| self.dims[a].clone()).collect(),
            scalars: self.scalars.clone(),
        }
    }

    /// Coordinates with the same dimension names, shape, and labels.
    pub fn same_space(&self, other: &Self) -> bool { self.dims == other.dims }
}
