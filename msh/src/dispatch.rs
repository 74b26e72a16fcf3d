//! Task execution and job queries against the injected backend.

use roster::{compile, Backend, Error, FilterSet, Result};

use crate::render;
use crate::session::Options;

/// Run `command` remotely against the current targets.
///
/// Rejections, in order: an empty filter set (nothing to run on, no
/// backend call), then dry-run (print the equivalent invocation, no
/// backend call, no privilege needed), then the privilege check - live
/// submission is root-only and failing that is fatal. A `None` handle from
/// the backend is a reported submission failure; a real handle is returned
/// so the session can adopt it as the current job.
pub fn execute(
    backend: &dyn Backend,
    filters: &FilterSet,
    command: &str,
    opts: &Options,
) -> Result<Option<String>> {
    if filters.is_empty() {
        return Err(Error::Targeting(
            "cannot run a command on 0 hosts. Add some filters!".to_string(),
        ));
    }

    let query = compile(filters);

    if opts.noop {
        println!("- In noop mode. Here's what I would be doing -");
        render::cli_equivalent(&query, command);
        return Ok(None);
    }

    if !opts.privileged {
        return Err(Error::Permission(format!(
            "cannot run commands as {} (run under sudo)",
            opts.user
        )));
    }

    match backend.submit_async(&query, command)? {
        Some(job) => {
            if opts.verbose {
                render::cli_equivalent(&query, command);
                println!("Job status: {}", job);
                render::padder("");
            }
            println!("Job submitted successfully: {}", job);
            Ok(Some(job))
        }
        None => {
            eprintln!("There was an error executing your job!");
            Ok(None)
        }
    }
}

/// Look up and print results for a job handle. Always permitted; needs no
/// filters.
pub fn lookup(backend: &dyn Backend, job: &str) -> Result<()> {
    let blob = backend.lookup_job(job)?;
    println!("{}", blob.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster::{Clause, FilterEntry, Sign};
    use std::cell::Cell;
    use std::collections::BTreeMap;

    /// Counting double: records how often each backend call happens.
    struct CountingBackend {
        submits: Cell<usize>,
        lookups: Cell<usize>,
        handle: Option<String>,
    }

    impl CountingBackend {
        fn returning(handle: Option<&str>) -> Self {
            Self {
                submits: Cell::new(0),
                lookups: Cell::new(0),
                handle: handle.map(String::from),
            }
        }
    }

    impl Backend for CountingBackend {
        fn submit_async(&self, _query: &str, _command: &str) -> Result<Option<String>> {
            self.submits.set(self.submits.get() + 1);
            Ok(self.handle.clone())
        }

        fn lookup_job(&self, _job: &str) -> Result<String> {
            self.lookups.set(self.lookups.get() + 1);
            Ok("blob".to_string())
        }

        fn fetch_pillars(&self, _host: &str) -> Result<BTreeMap<String, serde_json::Value>> {
            Ok(BTreeMap::new())
        }
    }

    fn one_host_filter() -> FilterSet {
        let mut filters = FilterSet::new();
        filters.append(FilterEntry {
            clause: Clause::HostPattern {
                sign: Sign::Include,
                pattern: "web.*".to_string(),
            },
            raw: vec!["+".to_string(), "web.*".to_string()],
        });
        filters
    }

    fn opts(noop: bool, privileged: bool) -> Options {
        Options {
            verbose: false,
            noop,
            use_pillars: false,
            privileged,
            user: "tester".to_string(),
        }
    }

    #[test]
    fn test_empty_filters_rejected_without_backend_call() {
        let backend = CountingBackend::returning(Some("1"));
        let err = execute(&backend, &FilterSet::new(), "uptime", &opts(false, true)).unwrap_err();
        assert!(matches!(err, Error::Targeting(_)));
        assert_eq!(backend.submits.get(), 0);
    }

    #[test]
    fn test_noop_mode_makes_no_backend_call() {
        let backend = CountingBackend::returning(Some("1"));
        let job = execute(&backend, &one_host_filter(), "uptime", &opts(true, false)).unwrap();
        assert_eq!(job, None);
        assert_eq!(backend.submits.get(), 0);
    }

    #[test]
    fn test_unprivileged_live_execution_is_fatal() {
        let backend = CountingBackend::returning(Some("1"));
        let err = execute(&backend, &one_host_filter(), "uptime", &opts(false, false)).unwrap_err();
        assert!(matches!(err, Error::Permission(_)));
        assert!(err.is_fatal());
        assert_eq!(backend.submits.get(), 0);
    }

    #[test]
    fn test_successful_submission_returns_handle() {
        let backend = CountingBackend::returning(Some("20240117000000000000"));
        let job = execute(&backend, &one_host_filter(), "uptime", &opts(false, true)).unwrap();
        assert_eq!(job.as_deref(), Some("20240117000000000000"));
        assert_eq!(backend.submits.get(), 1);
    }

    #[test]
    fn test_refused_submission_is_reported_not_fatal() {
        let backend = CountingBackend::returning(None);
        let job = execute(&backend, &one_host_filter(), "uptime", &opts(false, true)).unwrap();
        assert_eq!(job, None);
        assert_eq!(backend.submits.get(), 1);
    }

    #[test]
    fn test_lookup_never_requires_filters() {
        let backend = CountingBackend::returning(Some("1"));
        lookup(&backend, "42").unwrap();
        assert_eq!(backend.lookups.get(), 1);
    }
}
