//! The error taxonomy surfaced by this crate (spec §7).

use std::fmt;
use std::io;

/// Everything that can go wrong while building, normalizing, or parsing
/// with a [`crate::registry::Parser`].
///
/// No operation leaves a [`crate::registry::Parser`] partially mutated: a
/// rejected mutation is rejected before any state changes.
#[derive(Debug)]
pub enum Error {
    /// A character outside the printable ASCII range `[0x20, 0x7E]` was used
    /// to build a [`crate::symbol::Terminal`].
    InvalidTerminal(char),
    /// An empty string was passed as a grammar name.
    EmptyName,
    /// The name is already registered.
    DuplicateName(String),
    /// The name isn't registered.
    UnknownName(String),
    /// The rule is the redundant self-unit rule `G -> G`.
    RedundantRule,
    /// The rule references a nonterminal that isn't owned by this parser.
    ForeignNonterminal,
    /// A nonterminal reachable from the normalization root has no rules at
    /// all, so it can never derive anything.
    EmptyReachableNonterminal(String),
    /// The batch file interface couldn't open or read its input.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidTerminal(ch) => {
                write!(f, "{ch:?} is not a printable ASCII character in [0x20, 0x7E]")
            }
            Error::EmptyName => write!(f, "a grammar name can't be empty"),
            Error::DuplicateName(name) => write!(f, "{name} already exists"),
            Error::UnknownName(name) => write!(f, "{name} doesn't exist"),
            Error::RedundantRule => write!(f, "a grammar can't contain the redundant rule G -> G"),
            Error::ForeignNonterminal => {
                write!(f, "a rule can't reference a nonterminal foreign to this parser")
            }
            Error::EmptyReachableNonterminal(name) => write!(f, "{name} is empty"),
            Error::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
