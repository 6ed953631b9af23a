use std::collections::{HashSet};

use serde::{Deserialize, Serialize};

use super::{Coords, Dim, Error, Label, Result};

/// The positions stored in an [`IndexMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Refs {
    /// One position per coordinate, in row-major order.
    Dense(Box<[usize]>),
    /// The same position everywhere. This is a "lite" map: it covers any
    /// shape without allocating one entry per coordinate.
    Constant(usize),
}

/// How [`IndexMap::take()`] treats one axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Take {
    /// Keep the axis, with the given positions in the given order.
    Keep(Vec<usize>),
    /// Remove the axis, recording the label at the given position as a scalar
    /// coordinate.
    Drop(usize),
}

/// A labelled multi-dimensional array of positions into an element list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexMap {
    coords: Coords,
    refs: Refs,
}

impl IndexMap {
    /// Constructs an `IndexMap` given its positions in row-major order.
    ///
    /// ```
    /// use ntable::{Coords, Dim, IndexMap};
    /// let coords = Coords::from_dims([Dim::new("x", ["a", "b"])]).unwrap();
    /// let map = IndexMap::new(coords, vec![1, 0]).unwrap();
    /// assert_eq!(map.get(&[0]), 1);
    /// ```
    pub fn new(coords: Coords, refs: Vec<usize>) -> Result<Self> {
        if refs.len() != coords.len() {
            return Err(Error::shape(format!(
                "{} positions do not fit shape {:?}", refs.len(), coords.shape(),
            )));
        }
        Ok(Self {coords, refs: Refs::Dense(refs.into())})
    }

    /// The map `0, 1, 2, ...` over `coords`.
    pub fn basic(coords: Coords) -> Self {
        let refs = (0..coords.len()).collect();
        Self {coords, refs: Refs::Dense(refs)}
    }

    /// A lite map with `position` everywhere.
    pub fn constant(coords: Coords, position: usize) -> Self {
        Self {coords, refs: Refs::Constant(position)}
    }

    pub(crate) fn from_parts(coords: Coords, refs: Refs) -> Self { Self {coords, refs} }

    pub fn coords(&self) -> &Coords { &self.coords }

    pub fn refs(&self) -> &Refs { &self.refs }

    pub fn is_lite(&self) -> bool { matches!(self.refs, Refs::Constant(_)) }

    #[inline(always)]
    pub fn len(&self) -> usize { self.coords.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn shape(&self) -> Vec<usize> { self.coords.shape() }

    /// The position stored at row-major offset `i`.
    #[inline(always)]
    pub fn at(&self, i: usize) -> usize {
        match &self.refs {
            Refs::Dense(refs) => refs[i],
            Refs::Constant(r) => *r,
        }
    }

    /// The position stored at multi-index `index`.
    #[inline(always)]
    pub fn get(&self, index: &[usize]) -> usize { self.at(self.coords.to_usize(index)) }

    /// The stored positions, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item=usize> + '_ { (0..self.len()).map(|i| self.at(i)) }

    pub fn to_vec(&self) -> Vec<usize> { self.iter().collect() }

    /// Check that every position is in `0..bound`.
    pub fn validate(&self, bound: usize) -> Result<()> {
        if self.is_empty() { return Ok(()); }
        let max = match &self.refs {
            Refs::Dense(refs) => refs.iter().copied().max().unwrap_or(0),
            Refs::Constant(r) => *r,
        };
        if max >= bound {
            return Err(Error::index(format!(
                "index map refers to position {} of an element list of length {}", max, bound,
            )));
        }
        Ok(())
    }

    /// Whether some position is stored more than once.
    pub fn has_duplicates(&self) -> bool {
        match &self.refs {
            Refs::Dense(refs) => {
                let mut seen = HashSet::with_capacity(refs.len());
                refs.iter().any(|r| !seen.insert(*r))
            },
            Refs::Constant(_) => self.len() > 1,
        }
    }

    /// Add `n` to every position.
    pub fn offset(&self, n: usize) -> Self {
        let refs = match &self.refs {
            Refs::Dense(refs) => Refs::Dense(refs.iter().map(|r| r + n).collect()),
            Refs::Constant(r) => Refs::Constant(r + n),
        };
        Self {coords: self.coords.clone(), refs}
    }

    /// Expand a lite map to one entry per coordinate.
    pub fn dense(&self) -> Self {
        Self {coords: self.coords.clone(), refs: Refs::Dense(self.iter().collect())}
    }

    /// Select along each axis. `takes` has one entry per dimension.
    pub fn take(&self, takes: &[Take]) -> Self {
        assert_eq!(takes.len(), self.coords.ndim());
        let mut dims = Vec::new();
        let mut scalars = self.coords.scalars().to_vec();
        for (dim, take) in self.coords.dims().iter().zip(takes) {
            match take {
                Take::Keep(positions) => dims.push(Dim {
                    name: dim.name.clone(),
                    labels: positions.iter().map(|&p| dim.labels[p].clone()).collect(),
                }),
                Take::Drop(p) => scalars.push((dim.name.clone(), dim.labels[*p].clone())),
            }
        }
        let coords = Coords::new_unchecked(dims, scalars);
        let refs = match &self.refs {
            Refs::Constant(r) => Refs::Constant(*r),
            Refs::Dense(_) => {
                let mut refs = Vec::with_capacity(coords.len());
                let mut old = vec![0; takes.len()];
                coords.each(|new| {
                    let mut k = 0;
                    for (axis, take) in takes.iter().enumerate() {
                        old[axis] = match take {
                            Take::Keep(positions) => { k += 1; positions[new[k - 1]] },
                            Take::Drop(p) => *p,
                        };
                    }
                    refs.push(self.get(&old));
                });
                Refs::Dense(refs.into())
            },
        };
        Self {coords, refs}
    }

    /// Reorder the dimensions. `axes[i]` is the old axis of new axis `i`.
    pub fn transpose(&self, axes: &[usize]) -> Self {
        let coords = self.coords.permuted(axes);
        let refs = match &self.refs {
            Refs::Constant(r) => Refs::Constant(*r),
            Refs::Dense(_) => {
                let mut refs = Vec::with_capacity(coords.len());
                let mut old = vec![0; axes.len()];
                coords.each(|new| {
                    for (i, &a) in axes.iter().enumerate() { old[a] = new[i]; }
                    refs.push(self.get(&old));
                });
                Refs::Dense(refs.into())
            },
        };
        Self {coords, refs}
    }

    /// For every coordinate of `target`, the position that `self` stores at
    /// the same labels, or `None` if `self` has no such coordinate.
    ///
    /// Dimensions of `target` that `self` lacks are broadcast: `self` is
    /// treated as constant along them. Every dimension of `self` must be a
    /// dimension of `target`.
    pub fn reindex(&self, target: &Coords) -> Result<Vec<Option<usize>>> {
        let mut lookup: Vec<(usize, Vec<Option<usize>>)> = Vec::new();
        for dim in self.coords.dims() {
            let axis = target.axis(&dim.name).ok_or_else(|| Error::broadcast(format!(
                "dimension '{}' is missing from the broadcast shape", dim.name,
            )))?;
            let table = target.dims()[axis].labels.iter().map(|l| dim.position(l)).collect();
            lookup.push((axis, table));
        }
        let mut out = Vec::with_capacity(target.len());
        let mut old = vec![0; lookup.len()];
        target.each(|index| {
            let mut found = true;
            for (k, (axis, table)) in lookup.iter().enumerate() {
                match table[index[*axis]] {
                    Some(p) => old[k] = p,
                    None => { found = false; break; },
                }
            }
            out.push(if found { Some(self.get(&old)) } else { None });
        });
        Ok(out)
    }

    /// Replace the coordinates, keeping the positions. The shapes must match.
    pub fn with_coords(&self, coords: Coords) -> Result<Self> {
        if coords.shape() != self.coords.shape() {
            return Err(Error::shape(format!(
                "cannot relabel shape {:?} as {:?}", self.coords.shape(), coords.shape(),
            )));
        }
        Ok(Self {coords, refs: self.refs.clone()})
    }

    /// Where the label `label` of dimension `dim` would select.
    pub(crate) fn label_position(&self, dim: &str, label: &Label) -> Result<(usize, usize)> {
        let axis = self.coords.require_axis(dim)?;
        let p = self.coords.dims()[axis].require(label)?;
        Ok((axis, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> IndexMap {
        IndexMap::basic(Coords::from_dims([Dim::new("r", ["a", "b"]), Dim::new("c", ["x", "y", "z"])]).unwrap())
    }

    #[test]
    fn take_and_drop() {
        let m = grid();
        let t = m.take(&[Take::Drop(1), Take::Keep(vec![2, 0])]);
        assert_eq!(t.coords().shape(), vec![2]);
        assert_eq!(t.coords().scalar("r"), Some(&Label::from("b")));
        assert_eq!(t.to_vec(), vec![5, 3]);
    }

    #[test]
    fn transpose() {
        let m = grid().transpose(&[1, 0]);
        assert_eq!(m.shape(), vec![3, 2]);
        assert_eq!(m.to_vec(), vec![0, 3, 1, 4, 2, 5]);
        assert_eq!(m.coords().dims()[0].name, "c");
    }

    #[test]
    fn reindex_outer() {
        let small = IndexMap::basic(Coords::one("r", ["a", "b"]).unwrap());
        let target = Coords::from_dims([Dim::new("r", ["a", "b", "c"]), Dim::range("k", 2)]).unwrap();
        let pairs = small.reindex(&target).unwrap();
        assert_eq!(pairs, vec![Some(0), Some(0), Some(1), Some(1), None, None]);
        let missing = Coords::one("q", [0]).unwrap();
        assert!(small.reindex(&missing).is_err());
    }

    #[test]
    fn lite() {
        let m = IndexMap::constant(grid().coords().clone(), 0);
        assert!(m.is_lite());
        assert!(m.has_duplicates());
        assert_eq!(m.dense().to_vec(), vec![0; 6]);
        assert_eq!(m.offset(3).at(5), 3);
        assert!(m.validate(1).is_ok());
        assert!(m.validate(0).is_err());
    }

    #[test]
    fn bounds() {
        let m = grid();
        assert!(m.validate(6).is_ok());
        assert!(m.validate(5).is_err());
        assert!(!m.has_duplicates());
        assert!(IndexMap::new(m.coords().clone(), vec![0; 5]).is_err());
    }
}
