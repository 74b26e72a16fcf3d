//! Execution-backend contract and the Salt CLI adapter.
//!
//! The session talks to the fleet through this trait only, so tests can
//! substitute a counting double and the shell never links against backend
//! libraries directly.

use std::collections::BTreeMap;
use std::process::{Command, Output};

use serde_json::Value;

use crate::{Error, Result};

/// Narrow contract with the remote-execution service.
pub trait Backend {
    /// Submit `command` asynchronously against the compound `query`.
    /// `Ok(None)` means the backend refused the submission (its zero-handle
    /// failure sentinel); `Ok(Some(id))` is the job handle to remember.
    fn submit_async(&self, query: &str, command: &str) -> Result<Option<String>>;

    /// Look up results for a previously submitted job. Returns the raw
    /// result blob for display.
    fn lookup_job(&self, job: &str) -> Result<String>;

    /// One-shot pillar fetch for a single host, used to seed the catalog.
    fn fetch_pillars(&self, host: &str) -> Result<BTreeMap<String, Value>>;
}

/// Backend implementation that shells out to the Salt command-line tools.
#[derive(Debug, Clone)]
pub struct SaltCli {
    salt_bin: String,
    runner_bin: String,
}

impl Default for SaltCli {
    fn default() -> Self {
        Self {
            salt_bin: "salt".to_string(),
            runner_bin: "salt-run".to_string(),
        }
    }
}

impl SaltCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, bin: &str, args: &[&str]) -> Result<Output> {
        let output = Command::new(bin)
            .args(args)
            .output()
            .map_err(|e| Error::Backend(format!("failed to run {}: {}", bin, e)))?;

        // A child killed by a signal usually means the user hit Ctrl-C
        // while the call was in flight; report it as an abandoned call.
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = output.status.signal() {
                return Err(Error::Backend(format!(
                    "{} interrupted by signal {}",
                    bin, sig
                )));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Backend(format!(
                "{} exited with {}: {}",
                bin,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

impl Backend for SaltCli {
    fn submit_async(&self, query: &str, command: &str) -> Result<Option<String>> {
        let output = self.run(
            &self.salt_bin,
            &["--async", "-C", query, "cmd.shell", command],
        )?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_jid(&stdout).filter(|jid| jid != "0"))
    }

    fn lookup_job(&self, job: &str) -> Result<String> {
        let output = self.run(&self.runner_bin, &["jobs.lookup_jid", job])?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn fetch_pillars(&self, host: &str) -> Result<BTreeMap<String, Value>> {
        let output = self.run(
            &self.salt_bin,
            &["--out=json", "--static", host, "pillar.items"],
        )?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let parsed: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| Error::Backend(format!("bad pillar payload: {}", e)))?;

        // Payload shape: { "<host>": { "key": value, ... } }
        let pillars = parsed
            .get(host)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Backend(format!("no pillar data returned for {}", host)))?;

        Ok(pillars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Pull the job id out of `salt --async` human output, e.g.
/// `Executed command with job ID: 20240117123456789012`.
fn parse_jid(stdout: &str) -> Option<String> {
    stdout.lines().rev().find_map(|line| {
        let (_, rest) = line.rsplit_once(':')?;
        let candidate = rest.trim();
        if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_digit()) {
            Some(candidate.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jid_from_salt_output() {
        let out = "Executed command with job ID: 20240117123456789012\n";
        assert_eq!(parse_jid(out), Some("20240117123456789012".to_string()));
    }

    #[test]
    fn test_parse_jid_ignores_noise_lines() {
        let out = "Warning: something\nExecuted command with job ID: 42\n";
        assert_eq!(parse_jid(out), Some("42".to_string()));
    }

    #[test]
    fn test_parse_jid_missing() {
        assert_eq!(parse_jid("nothing useful here\n"), None);
        assert_eq!(parse_jid(""), None);
    }

    #[test]
    fn test_zero_jid_is_submission_failure() {
        // submit_async filters the zero sentinel down to None.
        let out = "Executed command with job ID: 0\n";
        assert_eq!(parse_jid(out).filter(|j| j != "0"), None);
    }
}
