//! Configuration for muster.
//!
//! Config file resolution order:
//! 1. Explicit path passed on the command line (`-c`)
//! 2. MUSTER_CONFIG environment variable
//! 3. /etc/muster.toml
//! 4. XDG config dir (via the directories crate), e.g. ~/.config/muster/muster.toml
//!
//! A missing file is not an error; defaults apply and the alias table is
//! empty. A present-but-unparseable file is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Muster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Readline history file for the interactive shell.
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Host whose pillars seed the catalog. Defaults to the local hostname.
    #[serde(default = "default_pillar_host")]
    pub pillar_host: String,

    /// Pillar keys matching this regex are dropped from the catalog.
    #[serde(default = "default_pillar_exclude")]
    pub pillar_exclude: Option<String>,

    /// Shorthand-to-real pillar key substitutions, applied to lower-cased
    /// keys before validation.
    #[serde(default)]
    pub pillar_map: BTreeMap<String, String>,
}

fn default_history_file() -> String {
    "~/.msh_history".to_string()
}

fn default_pillar_host() -> String {
    gethostname::gethostname().to_string_lossy().to_string()
}

fn default_pillar_exclude() -> Option<String> {
    // Synthetic diffing pillars are never useful targeting keys.
    Some("^graindiff".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            pillar_host: default_pillar_host(),
            pillar_exclude: default_pillar_exclude(),
            pillar_map: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config using the standard resolution order. `explicit` wins
    /// when given; a missing file at any location yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => resolve_config_path(),
        };
        match path {
            Some(p) if p.is_file() => Ok((Self::load_from(&p)?, Some(p))),
            _ => Ok((Self::default(), None)),
        }
    }

    /// Load config from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Save config to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// History file path with a leading `~/` expanded against $HOME.
    pub fn history_path(&self) -> PathBuf {
        expand_home(&self.history_file)
    }

    /// Compiled pillar-key exclusion pattern, if configured.
    pub fn pillar_exclude_regex(&self) -> Result<Option<Regex>> {
        match &self.pillar_exclude {
            None => Ok(None),
            Some(src) => Regex::new(src)
                .map(Some)
                .map_err(|e| Error::Config(format!("bad pillar_exclude pattern: {}", e))),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Find the first config file location that applies (the file itself may
/// not exist; the caller checks).
fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MUSTER_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let etc = PathBuf::from("/etc/muster.toml");
    if etc.is_file() {
        return Some(etc);
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "muster") {
        return Some(proj_dirs.config_dir().join("muster.toml"));
    }

    None
}
