mod db;
mod name;
mod symbol;
pub mod types;

pub use db::Db;
pub use name::Name;
pub use symbol::{Declaration, DeclarationKind, Symbol, SymbolFlags, SymbolTable};

use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;

pub(crate) type FxOrderMap<K, V> = ordermap::map::OrderMap<K, V, BuildHasherDefault<FxHasher>>;
