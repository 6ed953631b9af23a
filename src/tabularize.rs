//! Turning functions of values into functions of tables.

use super::{broadcast_tables, Config, EngineRef, Error, Fill, Func, NTable, Result, SerialEngine, Slice, Value};

/// A [`Func`] that applies elementwise when any argument is a table.
///
/// Calling it with no table arguments (directly or nested in lists, tuples,
/// maps, or slices) calls the function directly. Otherwise the arguments are
/// broadcast together with the function itself, and the function is mapped
/// over the aligned positions by the engine.
///
/// ```
/// use ntable::{tabularize, Coords, Func, NTable, Value};
/// let len = tabularize(Func::new("len", |a| Ok(Value::from(a[0].as_str().map_or(0, str::len)))));
/// assert_eq!(len.call(&["abc".into()]).unwrap(), Value::Int(3));
///
/// let t = NTable::from_vec(Coords::one("k", [0, 1]).unwrap(), vec!["a".into(), "bb".into()]).unwrap();
/// let out = len.call(&[t.into()]).unwrap();
/// assert_eq!(out.as_table().unwrap().values(), vec![Value::Int(1), Value::Int(2)]);
/// ```
#[derive(Debug, Clone)]
pub struct Tabularized {
    func: Func,
    engine: Option<EngineRef>,
    fill: Fill,
}

impl Tabularized {
    /// Map with the engine of the first table argument, filling non-table
    /// arguments [`Fill::Lite`].
    pub fn new(func: Func) -> Self { Self {func, engine: None, fill: Fill::Lite} }

    /// Take the engine and fill policy from `config`.
    pub fn configured(func: Func, config: &Config) -> Result<Self> {
        Ok(Self {func, engine: Some(config.engine.build()?), fill: config.broadcast.fill})
    }

    pub fn with_engine(mut self, engine: EngineRef) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn func(&self) -> &Func { &self.func }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let targs = args.iter().map(tabulate_arg).collect::<Result<Vec<_>>>()?;
        let tables = match align(&self.func, &targs, self.fill)? {
            Some(tables) => tables,
            None => return self.func.call(args).map_err(Error::from),
        };
        let engine = self.engine.clone().unwrap_or_else(|| tables[0].engine().clone());
        tracing::trace!(func = self.func.name(), shape = ?tables[0].shape(), engine = %engine, "tabularized call");
        let call = |row: &[Value]| row[0].call(&row[1..]).map_err(Error::from);
        Ok(Value::Table(NTable::tabular_map_with(&engine, &tables, &call)?))
    }
}

/// Wrap `func` in a [`Tabularized`].
pub fn tabularize(func: Func) -> Tabularized { Tabularized::new(func) }

/// Broadcast `func` (as a lite table) together with `args`. Returns `None`
/// if no argument is a table.
pub(crate) fn align(func: &Func, args: &[Value], fill: Fill) -> Result<Option<Vec<NTable>>> {
    if !args.iter().any(|a| matches!(a, Value::Table(_))) { return Ok(None); }
    let mut operands = Vec::with_capacity(args.len() + 1);
    operands.push(Value::Func(func.clone()));
    operands.extend(args.iter().cloned());
    Ok(Some(broadcast_tables(&operands, fill)?))
}

/// `arg` as a table if it is one or contains one, else `arg` itself.
pub(crate) fn tabulate_arg(arg: &Value) -> Result<Value> {
    Ok(match tabulate(arg)? {
        Some(t) => Value::Table(t),
        None => arg.clone(),
    })
}

/// Restructure a composite that contains tables into a table of composites.
///
/// Tables are returned as they are. Lists, tuples, maps, and slices are
/// searched recursively; if any part is a table, the parts are broadcast
/// [`Fill::Full`] and reassembled position by position, so that the result
/// holds a composite of the same kind at every position. Anything else
/// returns `None`.
pub fn tabulate(arg: &Value) -> Result<Option<NTable>> {
    match arg {
        Value::Table(t) => Ok(Some(t.clone())),
        Value::List(items) => assemble(items, |row| Value::List(row.to_vec())),
        Value::Tuple(items) => assemble(items, |row| Value::Tuple(row.to_vec())),
        Value::Map(entries) => {
            let keys: Vec<_> = entries.iter().map(|(k, _)| k.clone()).collect();
            let values: Vec<Value> = entries.iter().map(|(_, v)| v.clone()).collect();
            assemble(&values, |row| Value::Map(keys.iter().cloned().zip(row.iter().cloned()).collect()))
        },
        Value::Slice(s) => {
            let parts = [s.start.clone(), s.stop.clone(), s.step.clone()];
            assemble(&parts, |row| Value::Slice(Box::new(Slice {
                start: row[0].clone(),
                stop: row[1].clone(),
                step: row[2].clone(),
            })))
        },
        _ => Ok(None),
    }
}

fn assemble(parts: &[Value], build: impl Fn(&[Value]) -> Value + Sync) -> Result<Option<NTable>> {
    let parts = parts.iter().map(tabulate_arg).collect::<Result<Vec<_>>>()?;
    if !parts.iter().any(|p| matches!(p, Value::Table(_))) { return Ok(None); }
    let tables = broadcast_tables(&parts, Fill::Full)?;
    let serial: EngineRef = std::sync::Arc::new(SerialEngine);
    let row = |row: &[Value]| -> Result<Value> { Ok(build(row)) };
    Ok(Some(NTable::tabular_map_with(&serial, &tables, &row)?))
}
