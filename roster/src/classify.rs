//! Line classification for the session loop.
//!
//! One trimmed input line maps to exactly one [`LineKind`]; the dispatcher
//! consumes the enum with an exhaustive match. The caller guarantees the
//! line is non-empty and not a comment (blank/comment skipping happens in
//! the session's read step).

use std::path::PathBuf;

use crate::{Error, Result};

/// What one input line asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `.path` - include the file at `path` as a new input source.
    Source(PathBuf),
    /// `help`
    Help,
    /// `clear` / `reset` - drop all filters and the current job handle.
    Reset,
    /// `exit` / `quit`
    Exit,
    /// `meow`
    Meow,
    /// `??` - look up results for the current job handle.
    CurrentJob,
    /// `?` - show the filter summary and compiled-query preview.
    Summary,
    /// `? <digits>` - adopt the given job id and look it up.
    JobLookup(String),
    /// `+`/`-`/`=` directive, split into whitespace tokens (sign first).
    Mutation(Vec<String>),
    /// Anything else: a literal command to run on the current targets.
    Task(String),
}

/// Classify one trimmed, non-empty, non-comment line.
///
/// Rules are checked in priority order; `??` is tested before `?`. A `?`
/// followed by a single non-numeric token, or by more than one token, is a
/// user-input error with no classification.
pub fn classify(line: &str) -> Result<LineKind> {
    if let Some(rest) = line.strip_prefix('.') {
        let path = rest.trim();
        if path.is_empty() {
            return Err(Error::UserInput(
                "source directive needs a file path".to_string(),
            ));
        }
        return Ok(LineKind::Source(PathBuf::from(path)));
    }

    match line {
        "help" => return Ok(LineKind::Help),
        "clear" | "reset" => return Ok(LineKind::Reset),
        "exit" | "quit" => return Ok(LineKind::Exit),
        "meow" => return Ok(LineKind::Meow),
        _ => {}
    }

    if line.starts_with("??") {
        return Ok(LineKind::CurrentJob);
    }

    if let Some(rest) = line.strip_prefix('?') {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        return match tokens.as_slice() {
            [] => Ok(LineKind::Summary),
            [id] if id.chars().all(|c| c.is_ascii_digit()) => {
                Ok(LineKind::JobLookup(id.to_string()))
            }
            [other] => Err(Error::UserInput(format!(
                "not a job number: {}",
                other
            ))),
            _ => Err(Error::UserInput("invalid query command".to_string())),
        };
    }

    if matches!(line.chars().next(), Some('+' | '-' | '=')) {
        let tokens = line.split_whitespace().map(String::from).collect();
        return Ok(LineKind::Mutation(tokens));
    }

    Ok(LineKind::Task(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_directive() {
        assert_eq!(
            classify(". /etc/hosts.muster").unwrap(),
            LineKind::Source(PathBuf::from("/etc/hosts.muster"))
        );
        assert_eq!(
            classify(".scripts/deploy.msh").unwrap(),
            LineKind::Source(PathBuf::from("scripts/deploy.msh"))
        );
    }

    #[test]
    fn test_source_without_path_is_an_error() {
        assert!(matches!(classify("."), Err(Error::UserInput(_))));
    }

    #[test]
    fn test_exact_keywords() {
        assert_eq!(classify("help").unwrap(), LineKind::Help);
        assert_eq!(classify("clear").unwrap(), LineKind::Reset);
        assert_eq!(classify("reset").unwrap(), LineKind::Reset);
        assert_eq!(classify("exit").unwrap(), LineKind::Exit);
        assert_eq!(classify("quit").unwrap(), LineKind::Exit);
        assert_eq!(classify("meow").unwrap(), LineKind::Meow);
    }

    #[test]
    fn test_keywords_with_arguments_are_tasks() {
        // Only exact matches are control commands.
        assert_eq!(
            classify("help me").unwrap(),
            LineKind::Task("help me".to_string())
        );
        assert_eq!(
            classify("exit 1").unwrap(),
            LineKind::Task("exit 1".to_string())
        );
    }

    #[test]
    fn test_double_question_before_single() {
        assert_eq!(classify("??").unwrap(), LineKind::CurrentJob);
    }

    #[test]
    fn test_summary_query() {
        assert_eq!(classify("?").unwrap(), LineKind::Summary);
    }

    #[test]
    fn test_job_lookup_query() {
        assert_eq!(
            classify("? 20240117123456").unwrap(),
            LineKind::JobLookup("20240117123456".to_string())
        );
        // Whitespace between ? and the id is optional.
        assert_eq!(
            classify("?42").unwrap(),
            LineKind::JobLookup("42".to_string())
        );
    }

    #[test]
    fn test_non_numeric_job_id_rejected() {
        assert!(matches!(classify("? abc"), Err(Error::UserInput(_))));
        assert!(matches!(classify("? 12a4"), Err(Error::UserInput(_))));
    }

    #[test]
    fn test_too_many_query_tokens_rejected() {
        assert!(matches!(classify("? 1 2"), Err(Error::UserInput(_))));
    }

    #[test]
    fn test_mutation_tokens() {
        assert_eq!(
            classify("+ web.*").unwrap(),
            LineKind::Mutation(vec!["+".to_string(), "web.*".to_string()])
        );
        assert_eq!(
            classify("- env == staging").unwrap(),
            LineKind::Mutation(vec![
                "-".to_string(),
                "env".to_string(),
                "==".to_string(),
                "staging".to_string(),
            ])
        );
        assert_eq!(
            classify("= db-[0-9]+").unwrap(),
            LineKind::Mutation(vec!["=".to_string(), "db-[0-9]+".to_string()])
        );
    }

    #[test]
    fn test_everything_else_is_a_task() {
        assert_eq!(
            classify("uptime").unwrap(),
            LineKind::Task("uptime".to_string())
        );
        assert_eq!(
            classify("systemctl restart nginx").unwrap(),
            LineKind::Task("systemctl restart nginx".to_string())
        );
    }
}
