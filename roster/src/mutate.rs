//! Validation and normalization of `+`/`-`/`=` targeting directives.
//!
//! This is the only path that grows a [`FilterSet`]. Every directive is
//! fully validated here; on any error the filter set is left untouched.

use std::collections::BTreeMap;

use regex::Regex;

use crate::catalog::PillarCatalog;
use crate::filter::{Clause, FilterEntry, PillarOp, Sign};
use crate::{Error, Result};

/// The outcome of a successful mutation directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub entry: FilterEntry,
    /// `=` directives replace: clear the filter set before appending.
    pub replace: bool,
    /// The pattern was `.*` - the caller should show the match-everything
    /// warning banner before recording the clause.
    pub match_all: bool,
    /// A pillar clause was recorded without catalog validation because the
    /// catalog is disabled or empty; the caller should say so.
    pub unvalidated: bool,
}

/// Validate a tokenized directive and build the clause to append.
///
/// `tokens` is the whitespace-split line with the sign as token 0. Exactly
/// two tokens form a host-pattern clause, exactly four a pillar comparison;
/// anything else is a format error. `=` normalizes to `+` plus replace
/// semantics (discouraged: the backend accepts but silently never executes
/// compiled queries past roughly 1,000-2,000 host terms, so huge explicit
/// host lists appear to work and then do nothing).
pub fn apply(
    tokens: &[String],
    catalog: &PillarCatalog,
    aliases: &BTreeMap<String, String>,
) -> Result<Mutation> {
    let sign_token = tokens.first().map(String::as_str);
    let (sign, replace) = match sign_token {
        Some("+") => (Sign::Include, false),
        Some("-") => (Sign::Exclude, false),
        Some("=") => (Sign::Include, true),
        _ => {
            return Err(Error::UserInput(format!(
                "unrecognized directive: {}",
                tokens.join(" ")
            )))
        }
    };

    match tokens.len() {
        2 => host_pattern(sign, replace, &tokens[1]),
        4 => pillar_comparison(sign, replace, &tokens[1..], catalog, aliases),
        _ => Err(Error::UserInput(format!(
            "unrecognized command format: {}",
            tokens.join(" ")
        ))),
    }
}

fn host_pattern(sign: Sign, replace: bool, pattern: &str) -> Result<Mutation> {
    // Patterns go to the backend as full-hostname regexes; catch the ones
    // that would never compile before they leave the shell.
    Regex::new(pattern)
        .map_err(|e| Error::UserInput(format!("invalid host pattern '{}': {}", pattern, e)))?;

    let match_all = pattern == ".*";
    let entry = FilterEntry {
        clause: Clause::HostPattern {
            sign,
            pattern: pattern.to_string(),
        },
        raw: vec![sign.to_string(), pattern.to_string()],
    };
    Ok(Mutation {
        entry,
        replace,
        match_all,
        unvalidated: false,
    })
}

fn pillar_comparison(
    sign: Sign,
    replace: bool,
    args: &[String],
    catalog: &PillarCatalog,
    aliases: &BTreeMap<String, String>,
) -> Result<Mutation> {
    let mut key = args[0].to_lowercase();
    if let Some(mapped) = aliases.get(&key) {
        key = mapped.clone();
    }

    let op = match args[1].as_str() {
        "==" => PillarOp::Equal,
        "!=" => PillarOp::NotEqual,
        other => {
            return Err(Error::UserInput(format!(
                "'{}' is not a valid comparison operator (use == or !=)",
                other
            )))
        }
    };

    let value = unquote(&args[2]);

    // Existence validation runs only against a usable catalog; with pillar
    // support disabled or an empty catalog the clause is recorded as-is.
    let unvalidated = catalog.is_empty();
    if !unvalidated && !catalog.contains(&key) {
        return Err(Error::Validation(format!(
            "'{}' is not a valid pillar to filter by",
            key
        )));
    }

    let entry = FilterEntry {
        clause: Clause::PillarComparison {
            sign,
            key: key.clone(),
            op,
            value: value.clone(),
        },
        raw: vec![sign.to_string(), key, op.to_string(), value],
    };
    Ok(Mutation {
        entry,
        replace,
        match_all: false,
        unvalidated,
    })
}

/// Strip exactly one outer matching quote pair (`'` or `"`), if present.
fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded_catalog() -> PillarCatalog {
        let mut map = std::collections::BTreeMap::new();
        map.insert("env".to_string(), json!("staging"));
        map.insert("environment".to_string(), json!("staging"));
        map.insert("state".to_string(), json!("live"));
        PillarCatalog::from_map(map, None)
    }

    fn no_aliases() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_host_pattern_include() {
        let m = apply(&toks("+ web.*"), &loaded_catalog(), &no_aliases()).unwrap();
        assert_eq!(
            m.entry.clause,
            Clause::HostPattern {
                sign: Sign::Include,
                pattern: "web.*".to_string()
            }
        );
        assert!(!m.replace);
        assert!(!m.match_all);
    }

    #[test]
    fn test_equals_sign_normalizes_to_include_with_replace() {
        let m = apply(&toks("= db01"), &loaded_catalog(), &no_aliases()).unwrap();
        assert!(m.replace);
        assert_eq!(m.entry.raw[0], "+");
        assert!(matches!(
            m.entry.clause,
            Clause::HostPattern {
                sign: Sign::Include,
                ..
            }
        ));
    }

    #[test]
    fn test_match_all_pattern_flagged() {
        let m = apply(&toks("+ .*"), &loaded_catalog(), &no_aliases()).unwrap();
        assert!(m.match_all);
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = apply(&toks("+ web[0-"), &loaded_catalog(), &no_aliases()).unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
    }

    #[test]
    fn test_wrong_token_counts_rejected() {
        for line in ["+", "+ a b", "+ env == staging extra"] {
            let err = apply(&toks(line), &loaded_catalog(), &no_aliases()).unwrap_err();
            assert!(matches!(err, Error::UserInput(_)), "line: {}", line);
        }
    }

    #[test]
    fn test_sign_must_be_its_own_token() {
        let err = apply(&toks("+web.* extra"), &loaded_catalog(), &no_aliases()).unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
    }

    #[test]
    fn test_pillar_comparison_exclude() {
        let m = apply(&toks("- env == staging"), &loaded_catalog(), &no_aliases()).unwrap();
        assert_eq!(
            m.entry.clause,
            Clause::PillarComparison {
                sign: Sign::Exclude,
                key: "env".to_string(),
                op: PillarOp::Equal,
                value: "staging".to_string(),
            }
        );
    }

    #[test]
    fn test_key_lowercased_and_aliased() {
        let mut aliases = BTreeMap::new();
        aliases.insert("env".to_string(), "environment".to_string());
        let m = apply(&toks("+ ENV == staging"), &loaded_catalog(), &aliases).unwrap();
        assert_eq!(
            m.entry.clause,
            Clause::PillarComparison {
                sign: Sign::Include,
                key: "environment".to_string(),
                op: PillarOp::Equal,
                value: "staging".to_string(),
            }
        );
        assert_eq!(m.entry.raw, vec!["+", "environment", "==", "staging"]);
    }

    #[test]
    fn test_invalid_operator_rejected_without_mutation() {
        let err = apply(&toks("+ env = staging"), &loaded_catalog(), &no_aliases()).unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
        let err = apply(&toks("+ env >= staging"), &loaded_catalog(), &no_aliases()).unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
    }

    #[test]
    fn test_unknown_pillar_rejected_against_loaded_catalog() {
        let err = apply(&toks("+ nosuch == x"), &loaded_catalog(), &no_aliases()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_validation_skipped_when_catalog_disabled() {
        let m = apply(
            &toks("+ nosuch == x"),
            &PillarCatalog::disabled(),
            &no_aliases(),
        )
        .unwrap();
        assert!(m.unvalidated);
    }

    #[test]
    fn test_validation_skipped_when_catalog_empty() {
        let m = apply(&toks("+ nosuch == x"), &PillarCatalog::empty(), &no_aliases()).unwrap();
        assert!(m.unvalidated);
    }

    #[test]
    fn test_quote_stripping_outer_matching_pair_only() {
        let m = apply(
            &toks("+ env == '\"value\"'"),
            &loaded_catalog(),
            &no_aliases(),
        )
        .unwrap();
        match m.entry.clause {
            Clause::PillarComparison { value, .. } => assert_eq!(value, "\"value\""),
            other => panic!("unexpected clause: {:?}", other),
        }
    }

    #[test]
    fn test_unquoted_and_mismatched_values_unchanged() {
        assert_eq!(unquote("value"), "value");
        assert_eq!(unquote("'value"), "'value");
        assert_eq!(unquote("\"value'"), "\"value'");
        assert_eq!(unquote("'"), "'");
    }

    #[test]
    fn test_raw_tokens_reconstruct_directive() {
        let m = apply(&toks("- state != live"), &loaded_catalog(), &no_aliases()).unwrap();
        assert_eq!(m.entry.to_string(), "- state != live");
    }
}
