//! Rendering tables as text.

use std::fmt::{self, Display};

use super::{DisplayConfig, Label, NTable, Result, Selector, Take, Value};

/// A short description of `value` for display in a table cell.
///
/// ```
/// use ntable::{describe, DisplayConfig, Value};
/// let config = DisplayConfig::default();
/// assert_eq!(describe(&Value::from("short"), &config), "\"short\"");
/// assert_eq!(describe(&Value::from("a rather long string"), &config), "a rat...tring");
/// assert_eq!(describe(&Value::list([1, 2, 3, 4, 5]), &config), "[1, 2]...[4, 5]");
/// assert_eq!(describe(&Value::Null, &config), "NULL");
/// ```
pub fn describe(value: &Value, config: &DisplayConfig) -> String {
    match value {
        Value::Str(s) => {
            let n = s.chars().count();
            if n < config.max_str { return format!("\"{}\"", s); }
            let head: String = s.chars().take(config.str_edge).collect();
            let tail: String = s.chars().skip(n.saturating_sub(config.str_edge)).collect();
            format!("{}...{}", head, tail)
        },
        Value::List(items) => sequence(items, ("[", "]"), config),
        Value::Tuple(items) => sequence(items, ("(", ")"), config),
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Table(_) | Value::Failure(_) => repr(value),
        other => other.type_name(),
    }
}

fn sequence(items: &[Value], brackets: (&str, &str), config: &DisplayConfig) -> String {
    if items.len() < config.max_seq { return bracketed(items, brackets); }
    let edge = config.seq_edge.min(items.len());
    format!("{}...{}", bracketed(&items[..edge], brackets), bracketed(&items[items.len() - edge..], brackets))
}

fn bracketed(items: &[Value], (open, close): (&str, &str)) -> String {
    let inner: Vec<String> = items.iter().map(repr).collect();
    let trailing = if open == "(" && items.len() == 1 { "," } else { "" };
    format!("{}{}{}{}", open, inner.join(", "), trailing, close)
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format!("{:?}", x),
        Value::Str(s) => format!("'{}'", s),
        Value::List(items) => bracketed(items, ("[", "]")),
        Value::Tuple(items) => bracketed(items, ("(", ")")),
        Value::Table(t) => format!("NTable<{:?}>", t.shape()),
        Value::Failure(_) => "Failure".to_string(),
        other => other.type_name(),
    }
}

// ----------------------------------------------------------------------------

fn edges(len: usize, edge: usize) -> Vec<usize> { (0..edge).chain(len - edge..len).collect() }

/// Cut long dimensions down to their ends. Returns the cut table and, for
/// each axis, whether it was cut.
fn reduce(table: &NTable, config: &DisplayConfig) -> (NTable, Vec<bool>) {
    let mut cuts = Vec::with_capacity(table.ndim());
    let takes: Vec<Take> = table.dims().iter().enumerate().map(|(axis, dim)| {
        let (max, edge) = match axis {
            0 => (config.max_rows, config.row_edge),
            1 => (config.max_cols, config.col_edge),
            _ => (config.max_other, config.other_edge),
        };
        let cut = dim.len() > max && dim.len() >= 2 * edge;
        cuts.push(cut);
        Take::Keep(if cut { edges(dim.len(), edge) } else { (0..dim.len()).collect() })
    }).collect();
    if !cuts.contains(&true) { return (table.clone(), cuts); }
    match table.reindexed(table.index().take(&takes)) {
        Ok(t) => (t, cuts),
        Err(error) => {
            tracing::debug!(%error, shape = ?table.shape(), "rendering without pagination");
            (table.clone(), vec![false; cuts.len()])
        },
    }
}

fn layout(table: &NTable, cuts: &[bool], config: &DisplayConfig) -> Result<String> {
    let cells: Vec<String> = table.values().iter().map(|v| describe(v, config)).collect();
    let dims = table.dims();
    Ok(match dims {
        [] => cells.into_iter().next().unwrap_or_default(),
        [rows] => {
            let labels: Vec<String> = rows.labels.iter().map(Label::text).collect();
            let width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).max(rows.name.len());
            let mut lines = vec![rows.name.clone()];
            for (i, (label, cell)) in labels.iter().zip(&cells).enumerate() {
                if cuts[0] && i == config.row_edge { lines.push("...".to_string()); }
                lines.push(format!("{:<width$}  {}", label, cell, width = width));
            }
            lines.join("\n")
        },
        [rows, cols] => grid(rows.labels.iter().map(Label::text).collect(), cols.labels.iter().map(Label::text).collect(), &format!("{}\\{}", rows.name, cols.name), &cells, cuts, config),
        [.., last] => {
            let sep = "#".repeat(79);
            let mut out = String::new();
            for (i, label) in last.labels.iter().enumerate() {
                let page = table.loc(&[(last.name.as_str(), Selector::One(label.clone()))])?;
                out += &format!("{}:\n\n{}\n\n{}\n\n", label, layout(&page, &cuts[..cuts.len() - 1], config)?, sep);
                if cuts[cuts.len() - 1] && i + 1 == config.other_edge { out += &format!(". . .\n\n{}\n\n", sep); }
            }
            out
        },
    })
}

fn grid(
    rows: Vec<String>,
    cols: Vec<String>,
    corner: &str,
    cells: &[String],
    cuts: &[bool],
    config: &DisplayConfig,
) -> String {
    let width = |s: &String| s.chars().count();
    let first = rows.iter().map(width).chain([corner.chars().count()]).max().unwrap_or(0);
    let widths: Vec<usize> = cols.iter().enumerate().map(|(j, c)| {
        (0..rows.len()).map(|i| width(&cells[i * cols.len() + j])).chain([width(c)]).max().unwrap_or(0)
    }).collect();
    let line = |head: &str, row: &[String]| {
        let mut s = format!("{:<first$}", head, first = first);
        for (j, cell) in row.iter().enumerate() {
            if cuts[1] && j == config.col_edge { s += "  ..."; }
            s += &format!("  {:>w$}", cell, w = widths[j]);
        }
        s
    };
    let mut lines = vec![line(corner, &cols)];
    for (i, label) in rows.iter().enumerate() {
        if cuts[0] && i == config.row_edge { lines.push("...".to_string()); }
        lines.push(line(label, &cells[i * cols.len()..(i + 1) * cols.len()]));
    }
    lines.join("\n")
}

fn label_list(labels: &[Label], config: &DisplayConfig) -> String {
    let text = |ls: &[Label]| ls.iter().map(Label::text).collect::<Vec<_>>().join(", ");
    let edge = config.other_edge;
    if labels.len() > 2 * edge {
        format!("{}, ..., {}", text(&labels[..edge]), text(&labels[labels.len() - edge..]))
    } else {
        text(labels)
    }
}

impl NTable {
    /// The body of the rendering: the values laid out by dimension.
    pub fn render(&self, config: &DisplayConfig) -> Result<String> {
        let (table, cuts) = reduce(self, config);
        layout(&table, &cuts, config)
    }

    /// The body followed by the coordinates, the engine, and the type set.
    pub fn render_full(&self, config: &DisplayConfig) -> Result<String> {
        let mut out = self.render(config)?;
        out += "\nCoordinates:";
        for dim in self.dims() {
            out += &format!("\n  * {} ({}): {}", dim.name, dim.len(), label_list(&dim.labels, config));
        }
        for (name, label) in self.coords().scalars() {
            out += &format!("\n    {}: {}", name, label);
        }
        let mut types: Vec<String> = self.types().iter().map(ToString::to_string).collect();
        types.sort();
        out += &format!("\nEngine:\n{}\nTypes:\n{}", self.engine(), types.join("|"));
        Ok(out)
    }
}

impl Display for NTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.render_full(&DisplayConfig::default()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::{sblank, Coords, Dim, Func, Handler};

    #[test]
    fn cells() {
        let config = DisplayConfig::default();
        assert_eq!(describe(&Value::tuple([1]), &config), "(1,)");
        assert_eq!(describe(&Value::list(["a", "b"]), &config), "['a', 'b']");
        assert_eq!(describe(&Value::Float(1.0), &config), "1.0");
        assert_eq!(describe(&Value::map([("k", 1)]), &config), "map");
        assert_eq!(describe(&sblank(&[2, 3], None).unwrap().into(), &config), "NTable<[2, 3]>");
        let failed = Func::new("boom", |_| Err(super::super::ElementError::custom("no"))).handled(Handler::Silent);
        assert_eq!(describe(&failed.call(&[]).unwrap(), &config), "Failure");
    }

    #[test]
    fn grid_layout() {
        let coords = Coords::from_dims([Dim::new("rows", ["row1", "row2"]), Dim::new("cols", ["a", "b"])]).unwrap();
        let t = NTable::from_vec(coords, vec!["x".into(), 1.into(), Value::Null, 2.5.into()]).unwrap();
        let body = t.render(&DisplayConfig::default()).unwrap();
        assert_eq!(body, [
            "rows\\cols     a    b",
            "row1        \"x\"    1",
            "row2       NULL  2.5",
        ].join("\n"));
        let full = t.to_string();
        assert!(full.starts_with(&body));
        assert!(full.contains("  * rows (2): row1, row2"));
        assert!(full.ends_with("Engine:\nStandard (serial) Engine\nTypes:\nNULL|float|int|str"));
    }

    #[test]
    fn pages_and_cuts() {
        let t = sblank(&[2, 2, 20], None).unwrap();
        let body = t.render(&DisplayConfig::default()).unwrap();
        assert_eq!(body.matches(&"#".repeat(79)).count(), 11);
        assert!(body.contains(". . ."));
        assert!(body.starts_with("coord0:\n\n"));
        let long = sblank(&[200], None).unwrap();
        let body = long.render(&DisplayConfig::default()).unwrap();
        assert_eq!(body.lines().count(), 1 + 100 + 1);
        assert_eq!(sblank(&[1], None).unwrap().isel(&[Selector::One(0)]).unwrap().render(&DisplayConfig::default()).unwrap(), "NULL");
    }
}
