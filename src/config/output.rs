//! Output placement configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::io::{DirResolver, OutputResolver, TempFileResolver};

fn default_prefix() -> String {
    "customerOutput".into()
}

fn default_suffix() -> String {
    ".out".into()
}

/// Where destination files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    /// A fresh uniquely named temporary file per destination per run
    Temp {
        /// Directory for the files; the system temp directory if absent
        #[serde(default)]
        dir: Option<PathBuf>,
        #[serde(default = "default_prefix")]
        prefix: String,
        #[serde(default = "default_suffix")]
        suffix: String,
    },
    /// A fixed file per destination inside `dir`, replaced on every run
    Dir {
        dir: PathBuf,
        #[serde(default = "default_prefix")]
        prefix: String,
        #[serde(default = "default_suffix")]
        suffix: String,
    },
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Temp {
            dir: None,
            prefix: default_prefix(),
            suffix: default_suffix(),
        }
    }
}

impl OutputConfig {
    /// Build the resolver described by this configuration.
    pub fn resolver(&self) -> Arc<dyn OutputResolver> {
        match self {
            OutputConfig::Temp { dir, prefix, suffix } => {
                let resolver = TempFileResolver::new(prefix.clone(), suffix.clone());
                match dir {
                    Some(dir) => Arc::new(resolver.in_dir(dir.clone())),
                    None => Arc::new(resolver),
                }
            }
            OutputConfig::Dir { dir, prefix, suffix } => Arc::new(DirResolver::new(
                dir.clone(),
                prefix.clone(),
                suffix.clone(),
            )),
        }
    }
}
