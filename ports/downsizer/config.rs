/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Configuration for a single run of the downsizer tool, read from a JSON
//! file.
//!
//! ```json
//! {
//!     "project_directory": "/srv/shop",
//!     "apps": ["store", "accounts"],
//!     "input_css_files": ["static/css/app.css"],
//!     "output_directory": "static/css/dist",
//!     "exclude_dirs": ["node_modules"],
//!     "safelist_file": "safelist.txt"
//! }
//! ```

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// The configuration file contents.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the project tree to scan for markup documents.
    pub project_directory: PathBuf,
    /// Only directories whose path contains one of these names contribute
    /// markup. Empty means the whole project tree.
    #[serde(default)]
    pub apps: Vec<String>,
    /// The stylesheets to prune.
    pub input_css_files: Vec<PathBuf>,
    /// Where pruned (and compressed) stylesheets are written.
    pub output_directory: PathBuf,
    /// Directories whose path contains one of these names never contribute
    /// markup.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Optional safelist document; see the `purge::safelist` module docs for
    /// the format.
    #[serde(default)]
    pub safelist_file: Option<PathBuf>,
    /// Whether to also write gzip-compressed copies of the output.
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_compress() -> bool {
    true
}

/// A missing, unreadable, or invalid configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, io::Error),
    Json(PathBuf, serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::Io(ref path, ref error) => {
                write!(f, "cannot read config file {}: {}", path.display(), error)
            },
            ConfigError::Json(ref path, ref error) => {
                write!(f, "config file {} is not valid JSON: {}", path.display(), error)
            },
            ConfigError::Invalid(ref message) => {
                write!(f, "config file set incorrectly: {}", message)
            },
        }
    }
}

impl Error for ConfigError {}

/// Load and validate the configuration file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text =
        fs::read_to_string(path).map_err(|error| ConfigError::Io(path.to_owned(), error))?;
    let config: Config = serde_json::from_str(&text)
        .map_err(|error| ConfigError::Json(path.to_owned(), error))?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.project_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "missing or empty key project_directory".to_owned(),
            ));
        }
        if self.input_css_files.is_empty() {
            return Err(ConfigError::Invalid(
                "missing or empty key input_css_files".to_owned(),
            ));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "missing or empty key output_directory".to_owned(),
            ));
        }
        Ok(())
    }
}
