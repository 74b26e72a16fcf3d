//! Targeting filter model.
//!
//! A [`FilterSet`] is the ordered sequence of targeting clauses built up
//! over a session, one clause per accepted `+`/`-`/`=` directive. The set
//! is a pure container: validation happens in [`crate::mutate`] before a
//! clause is appended, and translation to the backend's compound query
//! syntax happens in [`compile`].

mod compile;

pub use compile::compile;


/// Whether a clause includes or excludes the hosts it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Include,
    Exclude,
}

impl std::fmt::Display for Sign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sign::Include => write!(f, "+"),
            Sign::Exclude => write!(f, "-"),
        }
    }
}

/// Comparison operator for pillar clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PillarOp {
    Equal,
    NotEqual,
}

impl std::fmt::Display for PillarOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PillarOp::Equal => write!(f, "=="),
            PillarOp::NotEqual => write!(f, "!="),
        }
    }
}

/// One targeting predicate. Immutable once appended to a [`FilterSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A regex that must match an entire hostname.
    HostPattern { sign: Sign, pattern: String },
    /// A comparison against a pillar key.
    PillarComparison {
        sign: Sign,
        key: String,
        op: PillarOp,
        value: String,
    },
}

/// A clause together with the normalized directive tokens it came from.
///
/// The tokens (sign, aliased key, unquoted value) are kept so the summary
/// view can show the directive a human typed, not the compiled term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub clause: Clause,
    pub raw: Vec<String>,
}

impl std::fmt::Display for FilterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw.join(" "))
    }
}

/// Ordered, append-only sequence of targeting clauses.
///
/// Empty at session start and after `clear`/`reset`; grows only through the
/// mutation handler and never shrinks except by full reset. Clause order
/// affects display only - compilation is a pure AND of independently signed
/// terms.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: Vec<FilterEntry>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: FilterEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order, for display.
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.entries.iter().map(|e| &e.clause)
    }
}
