//! Translation of a [`FilterSet`] into the backend's compound query syntax.

use super::{Clause, FilterSet, PillarOp, Sign};

/// Compile the filter set into a compound query expression.
///
/// Each clause becomes one term; terms are joined with `" and "`. An empty
/// set compiles to the empty string, which callers must treat as "no
/// targets". Pure function, no side effects.
pub fn compile(filters: &FilterSet) -> String {
    let terms: Vec<String> = filters.clauses().map(term).collect();
    terms.join(" and ")
}

/// Backend term for a single clause.
///
/// Host patterns map directly: include is `E@pattern`, exclude is the
/// negation. Pillar comparisons are trickier: an Exclude sign inverts the
/// stated comparison ("don't include where this holds"), so Exclude+Equal
/// negates and Exclude+NotEqual comes back around to the positive term:
///
/// ```text
/// + k == v  ->      I@k:v
/// + k != v  ->  not I@k:v
/// - k == v  ->  not I@k:v
/// - k != v  ->      I@k:v
/// ```
///
/// Downstream query semantics depend on this table exactly as written.
fn term(clause: &Clause) -> String {
    match clause {
        Clause::HostPattern { sign, pattern } => match sign {
            Sign::Include => format!("E@{}", pattern),
            Sign::Exclude => format!("not E@{}", pattern),
        },
        Clause::PillarComparison {
            sign,
            key,
            op,
            value,
        } => {
            let negated = match (sign, op) {
                (Sign::Include, PillarOp::Equal) => false,
                (Sign::Include, PillarOp::NotEqual) => true,
                (Sign::Exclude, PillarOp::Equal) => true,
                (Sign::Exclude, PillarOp::NotEqual) => false,
            };
            if negated {
                format!("not I@{}:{}", key, value)
            } else {
                format!("I@{}:{}", key, value)
            }
        }
    }
}
