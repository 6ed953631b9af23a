//! Selecting labels by predicate, and pattern-based relabelling.

use std::fmt::{self, Debug};
use std::sync::{Arc};

use regex::{Regex};

use super::{Label, NTable, Result, Selector, Value};

/// The marker that [`NTable::alchemy_get()`] puts in place of the matched
/// parts of a label.
pub const ALCHEMY: &str = "__ALCHEMY__";

/// A test on the labels of a dimension.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Label) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Label) -> bool + Send + Sync + 'static) -> Self { Self(Arc::new(f)) }

    pub fn test(&self, label: &Label) -> bool { (self.0)(label) }
}

impl Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Predicate") }
}

/// Accepts labels whose text contains `text`.
pub fn contains(text: impl Into<String>) -> Predicate {
    let text = text.into();
    Predicate::new(move |label| label.text().contains(&text))
}

/// Accepts labels whose text matches `pattern` at its start.
pub fn matches(pattern: &str) -> Result<Predicate> {
    let re = anchored(pattern)?;
    Ok(Predicate::new(move |label| re.is_match(&label.text())))
}

/// Accepts the given labels.
pub fn isin(labels: impl IntoIterator<Item=Label>) -> Predicate {
    let labels: Vec<Label> = labels.into_iter().collect();
    Predicate::new(move |label| labels.contains(label))
}

fn anchored(pattern: &str) -> Result<Regex> { Ok(Regex::new(&format!("^(?:{})", pattern))?) }

impl NTable {
    /// Keep the labels accepted by each predicate, dimension by dimension.
    ///
    /// ```
    /// use ntable::{filter, Coords, NTable, Value};
    /// let t = NTable::from_vec(Coords::one("k", ["apple", "avocado", "banana"]).unwrap(), vec![Value::Unit; 3]).unwrap();
    /// let a = t.filter(&[("k", filter::matches("a").unwrap())]).unwrap();
    /// assert_eq!(a.shape(), vec![2]);
    /// ```
    pub fn filter(&self, predicates: &[(&str, Predicate)]) -> Result<NTable> {
        let mut table = self.clone();
        for (dim, predicate) in predicates {
            let axis = table.coords().require_axis(dim)?;
            let keep: Vec<Label> = table.dims()[axis].labels.iter().filter(|l| predicate.test(l)).cloned().collect();
            table = table.loc(&[(*dim, Selector::Many(keep))])?;
        }
        Ok(table)
    }

    /// Keep the labels of `dim` that match `pattern`, and relabel them with
    /// the captured groups replaced by [`ALCHEMY`]. A pattern without groups
    /// replaces the whole label.
    ///
    /// The result can be renamed into another table with [`alchemy_set()`].
    ///
    /// [`alchemy_set()`]: Self::alchemy_set()
    pub fn alchemy_get(&self, dim: &str, pattern: &str) -> Result<NTable> {
        let re = anchored(pattern)?;
        let table = self.filter(&[(dim, matches(pattern)?)])?;
        let axis = table.coords().require_axis(dim)?;
        let mut pairs = Vec::new();
        for label in &table.dims()[axis].labels {
            let text = label.text();
            let Some(captures) = re.captures(&text) else { continue };
            let new = if captures.len() == 1 {
                ALCHEMY.to_string()
            } else {
                captures.iter().skip(1).flatten()
                    .fold(text.clone(), |acc, m| acc.replace(m.as_str(), ALCHEMY))
            };
            pairs.push((label.clone(), Label::from(new)));
        }
        table.relabel(dim, &pairs)
    }

    /// For every label of `dim` in `value` that contains [`ALCHEMY`], assign
    /// that slice of `value` to `self` under the label with the marker
    /// replaced by `replacement`. Labels that `self` lacks are added.
    pub fn alchemy_set(&mut self, dim: &str, replacement: &str, value: &NTable) -> Result<()> {
        let source = value.filter(&[(dim, contains(ALCHEMY))])?;
        let axis = source.coords().require_axis(dim)?;
        for label in source.dims()[axis].labels.clone() {
            let slice = source.loc(&[(dim, Selector::One(label.clone()))])?;
            let new = Label::from(label.text().replace(ALCHEMY, replacement));
            self.set_dim(dim, new, Value::Table(slice))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{Coords, Dim, Error};

    fn runs() -> NTable {
        let coords = Coords::from_dims([
            Dim::new("run", ["exp1_a", "exp2_a", "exp1_b", "ctl"]),
            Dim::new("stat", ["mean", "max"]),
        ]).unwrap();
        NTable::from_vec(coords, (0..8).map(Value::from).collect()).unwrap()
    }

    fn labels(t: &NTable, axis: usize) -> Vec<String> {
        t.dims()[axis].labels.iter().map(Label::text).collect()
    }

    #[test]
    fn predicates() {
        let t = runs();
        assert_eq!(labels(&t.filter(&[("run", contains("_a"))]).unwrap(), 0), ["exp1_a", "exp2_a"]);
        assert_eq!(labels(&t.filter(&[("run", matches("exp1").unwrap())]).unwrap(), 0), ["exp1_a", "exp1_b"]);
        assert!(t.filter(&[("run", matches("_a").unwrap())]).unwrap().is_empty());
        let both = t.filter(&[("run", isin([Label::from("ctl")])), ("stat", contains("ma"))]).unwrap();
        assert_eq!(both.values(), vec![Value::Int(7)]);
        assert!(matches!(matches("("), Err(Error::Regex(_))));
    }

    #[test]
    fn alchemy_round_trip() {
        let t = runs();
        let got = t.alchemy_get("run", r"exp\d_(a)").unwrap();
        assert_eq!(labels(&got, 0), ["exp1___ALCHEMY__", "exp2___ALCHEMY__"]);
        assert_eq!(labels(&t.alchemy_get("run", "ctl").unwrap(), 0), [ALCHEMY]);

        let mut target = runs();
        target.alchemy_set("run", "b", &got).unwrap();
        assert_eq!(labels(&target, 0), ["exp1_a", "exp2_a", "exp1_b", "ctl", "exp2_b"]);
        let at = |label: &str| target.loc(&[("run", Selector::One(Label::from(label)))]).unwrap().values();
        assert_eq!(at("exp1_b"), vec![Value::Int(0), Value::Int(1)]);
        assert_eq!(at("exp2_b"), vec![Value::Int(2), Value::Int(3)]);
        assert_eq!(at("ctl"), vec![Value::Int(6), Value::Int(7)]);
    }
}
