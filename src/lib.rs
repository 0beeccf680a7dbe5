//! Build named context-free grammars, normalize them to Chomsky Normal
//! Form, and decide membership of a word in a named grammar's language.
//!
//! See [`Parser`] for the public entry point.

mod derive;
mod error;
mod grammar;
mod normalize;
mod print;
mod registry;
mod rule;
mod symbol;
mod traverse;

pub use error::{Error, Result};
pub use registry::Parser;
pub use rule::Rule;
pub use symbol::{GrammarId, Symbol, Terminal};
