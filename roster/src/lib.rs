//! Roster: targeting model for the muster shell.
//!
//! Accumulates host-targeting clauses, compiles them into the backend's
//! compound query syntax, and classifies shell input lines.

pub mod backend;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod mutate;

pub use backend::{Backend, SaltCli};
pub use catalog::PillarCatalog;
pub use classify::{classify, LineKind};
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{compile, Clause, FilterEntry, FilterSet, PillarOp, Sign};
pub use mutate::Mutation;
