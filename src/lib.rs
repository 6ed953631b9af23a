//! A pure-Rust library of labelled n-dimensional tables of heterogeneous
//! values.
//!
//! [`NTable`] represents a table of [`Value`]s indexed by named dimensions,
//! each with an ordered list of [`Label`]s. The values are internally stored
//! in a shared element list, and an [`IndexMap`] says which element is at
//! each coordinate. Several tables can therefore be views of the same
//! elements, and a mutation through one view is visible through the others.
//!
//! The main way to compute with tables is [`tabularize()`]. It wraps a
//! [`Func`] of plain values so that, when any argument is a table, the
//! arguments are broadcast to a common set of coordinates and the function
//! is mapped over them by an [`Engine`]. Broadcasting takes the union of the
//! coordinates of the arguments, in the order they are first seen, and fills
//! the gaps with [`Value::Null`]. A call that fails at one position does not
//! abort the others: the error is captured as a [`Failure`] at that position.
//!
//! Selection ([`NTable::loc()`], [`NTable::isel()`]), restructuring
//! ([`NTable::concat()`], [`NTable::flatter()`], [`NTable::transpose()`]),
//! and per-dimension views ([`DimMap`]) are built on top of [`IndexMap`]s and
//! never copy elements. The binary operators in [`ops`] apply elementwise.

mod error;
pub use error::{Error, ElementError, ErrorKind, Result};

mod label;
pub use label::{Label};

mod value;
pub use value::{Value, Slice, Class, ClassRef, Method, MethodFn, Object, ElementType, TypeSet, types_of};
pub(crate) use value::{normalize};

pub mod func;
pub use func::{Func, FuncImpl, Handler, Failure};

mod attrs;
pub use attrs::{AttrTable, AttrEntry, Builtin, Implementation, builtins};

mod index;
pub use index::{Dim, Coords};

mod array;
pub use array::{IndexMap, Refs, Take};

mod engine;
pub use engine::{Engine, EngineRef, EngineKind, MapFn, SerialEngine, ThreadEngine, ProcessEngine, default_engine, validate_engine};

pub mod broadcast;
pub use broadcast::{Fill, broadcast_tables};

mod table;
pub use table::{NTable, Attribute, TabularAttrs, TabularizedMethod, TableIter};

mod tabularize;
pub use tabularize::{Tabularized, tabularize, tabulate};

mod config;
pub use config::{Config, EngineConfig, BroadcastConfig, DisplayConfig};

mod qol;
pub use qol::{full, full_lite, full_like, blank, sblank, cartograph, count};
pub(crate) use qol::{default_coords};

mod structure;
pub use structure::{Selector};

pub mod filter;
pub use filter::{Predicate, ALCHEMY};

mod dimmap;
pub use dimmap::{DimMap};

mod convert;
pub use convert::{LabeledArray, Frame, ntable, from_shape};

mod display;
pub use display::{describe};

pub mod ops;
pub use ops::{Binary};
