//! Execution engines: strategies for mapping a function over parallel
//! columns of values.

use std::fmt::{self, Debug, Display};
use std::sync::{Arc};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{Error, Result, Value};

/// The function an [`Engine`] maps. It receives one row: the values of every
/// column at one position.
pub type MapFn<'a> = dyn Fn(&[Value]) -> Result<Value> + Sync + 'a;

/// A shared engine, as stored in every table.
pub type EngineRef = Arc<dyn Engine>;

/// Which kind of engine this is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Serial,
    Thread,
    Process,
    /// A user-provided engine. Tables check these with [`validate_engine()`].
    Custom,
}

/// Maps a function over equal-length columns, returning one result per
/// position in input order.
///
/// Implementations block until every position has been computed. An error
/// at any position is returned once all work has finished.
pub trait Engine: Send + Sync + Debug + Display {
    /// `columns` must be non-empty and of equal length.
    fn map(&self, func: &MapFn<'_>, columns: &[Vec<Value>]) -> Result<Vec<Value>>;

    fn kind(&self) -> EngineKind { EngineKind::Custom }

    /// The number of workers.
    fn workers(&self) -> usize { 1 }
}

/// Transpose `columns` into rows, checking the lengths.
pub fn rows(columns: &[Vec<Value>]) -> Result<Vec<Vec<Value>>> {
    let first = columns.first().ok_or_else(|| Error::engine("map() needs at least one column"))?;
    let n = first.len();
    if let Some(c) = columns.iter().find(|c| c.len() != n) {
        return Err(Error::engine(format!("map() columns have unequal lengths {} and {}", n, c.len())));
    }
    Ok((0..n).map(|i| columns.iter().map(|c| c[i].clone()).collect()).collect())
}

/// Run the minimal map contract against `engine`.
pub fn validate_engine(engine: &dyn Engine) -> Result<()> {
    let add = |row: &[Value]| match row {
        [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
        _ => Err(Error::type_error("expected two integers")),
    };
    let columns = [
        vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        vec![Value::Int(4), Value::Int(5), Value::Int(6)],
    ];
    let out = engine.map(&add, &columns)
        .map_err(|e| Error::engine(format!("engine {:?} failed the map smoke test: {}", engine, e)))?;
    if out != [Value::Int(5), Value::Int(7), Value::Int(9)] {
        return Err(Error::engine(format!("engine {:?} returned {:?} from the map smoke test", engine, out)));
    }
    Ok(())
}

/// The engine used when none is given.
pub fn default_engine() -> EngineRef { Arc::new(SerialEngine) }

// ----------------------------------------------------------------------------

/// Applies the function on the calling thread, position by position.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct SerialEngine;

impl Engine for SerialEngine {
    fn map(&self, func: &MapFn<'_>, columns: &[Vec<Value>]) -> Result<Vec<Value>> {
        rows(columns)?.iter().map(|row| func(row)).collect()
    }

    fn kind(&self) -> EngineKind { EngineKind::Serial }
}

impl Display for SerialEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Standard (serial) Engine") }
}

// ----------------------------------------------------------------------------

fn pool(workers: usize, prefix: &'static str) -> Result<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(move |i| format!("ntable-{}-{}", prefix, i))
        .build()
        .map_err(|e| Error::engine(e.to_string()))?;
    tracing::debug!(workers, prefix, "started worker pool");
    Ok(pool)
}

/// Dispatches positions across a pool of threads that share memory with the
/// caller. The pool lives for one call to [`map()`].
///
/// [`map()`]: Engine::map()
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ThreadEngine {
    pub threads: usize,
}

impl ThreadEngine {
    pub fn new(threads: usize) -> Self { Self {threads} }
}

impl Engine for ThreadEngine {
    fn map(&self, func: &MapFn<'_>, columns: &[Vec<Value>]) -> Result<Vec<Value>> {
        let rows = rows(columns)?;
        let pool = pool(self.threads, "thread")?;
        let out = pool.install(|| rows.par_iter().map(|row| func(row)).collect());
        tracing::debug!(threads = self.threads, "worker pool finished");
        out
    }

    fn kind(&self) -> EngineKind { EngineKind::Thread }

    fn workers(&self) -> usize { self.threads }
}

impl Display for ThreadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread Engine\nThreads: {}", self.threads)
    }
}

// ----------------------------------------------------------------------------

/// Dispatches positions across a dedicated pool of workers that do not share
/// values with the caller.
///
/// Every row is deep-copied with [`Value::detached()`] before the function
/// sees it, and every result is deep-copied before it is returned, so a
/// worker cannot mutate the caller's elements except through its return
/// value. Functions themselves are shared.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProcessEngine {
    pub processes: usize,
}

impl ProcessEngine {
    pub fn new(processes: usize) -> Self { Self {processes} }
}

impl Engine for ProcessEngine {
    fn map(&self, func: &MapFn<'_>, columns: &[Vec<Value>]) -> Result<Vec<Value>> {
        let rows = rows(columns)?;
        let pool = pool(self.processes, "process")?;
        let out = pool.install(|| {
            rows.par_iter()
                .map(|row| {
                    let row: Vec<Value> = row.iter().map(Value::detached).collect();
                    func(&row).map(|v| v.detached())
                })
                .collect()
        });
        tracing::debug!(processes = self.processes, "worker pool finished");
        out
    }

    fn kind(&self) -> EngineKind { EngineKind::Process }

    fn workers(&self) -> usize { self.processes }
}

impl Display for ProcessEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process Engine\nProcesses: {}", self.processes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engines() -> Vec<EngineRef> {
        vec![Arc::new(SerialEngine), Arc::new(ThreadEngine::new(3)), Arc::new(ProcessEngine::new(2))]
    }

    #[test]
    fn order_preserved() {
        let column: Vec<Value> = (0..200i64).map(Value::Int).collect();
        let square = |row: &[Value]| -> Result<Value> { Ok(Value::Int(row[0].as_int().unwrap_or(0).pow(2))) };
        for engine in engines() {
            let out = engine.map(&square, &[column.clone()]).unwrap();
            let expected: Vec<Value> = (0..200i64).map(|i| Value::Int(i * i)).collect();
            assert_eq!(out, expected, "{}", engine);
        }
    }

    #[test]
    fn smoke_test() {
        for engine in engines() { validate_engine(engine.as_ref()).unwrap(); }
    }

    #[derive(Debug)]
    struct Broken;

    impl Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Broken") }
    }

    impl Engine for Broken {
        fn map(&self, _: &MapFn<'_>, _: &[Vec<Value>]) -> Result<Vec<Value>> { Ok(vec![]) }
    }

    #[test]
    fn broken_engine_rejected() {
        assert!(matches!(validate_engine(&Broken), Err(Error::Engine(_))));
    }

    #[test]
    fn unequal_columns() {
        let id = |row: &[Value]| -> Result<Value> { Ok(row[0].clone()) };
        let e = SerialEngine.map(&id, &[vec![Value::Int(1)], vec![]]).unwrap_err();
        assert!(matches!(e, Error::Engine(_)));
        assert!(SerialEngine.map(&id, &[]).is_err());
    }

    #[test]
    fn process_isolation() {
        let class = super::super::Class::new("Box").field("v").build();
        let obj = class.instantiate([Value::Int(1)]).unwrap();
        let mutate = |row: &[Value]| { row[0].set_attr("v", Value::Int(99)).map_err(Error::from) };
        ProcessEngine::new(2).map(&mutate, &[vec![obj.clone()]]).unwrap();
        assert_eq!(obj.get_attr("v").unwrap(), Value::Int(1));
        ThreadEngine::new(2).map(&mutate, &[vec![obj.clone()]]).unwrap();
        assert_eq!(obj.get_attr("v").unwrap(), Value::Int(99));
    }

    #[test]
    fn display() {
        assert_eq!(SerialEngine.to_string(), "Standard (serial) Engine");
        assert_eq!(ThreadEngine::new(4).to_string(), "Thread Engine\nThreads: 4");
        assert_eq!(ProcessEngine::new(2).to_string(), "Process Engine\nProcesses: 2");
    }
}
