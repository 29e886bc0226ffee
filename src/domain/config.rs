use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::LinkKind;

/// Configuration for one traceability run.
///
/// The same schema is accepted on the command line and in a configuration
/// file (TOML, JSON, or YAML, selected by file extension). The schema is
/// typed and closed: unknown keys and ill-typed values are rejected at load
/// time with a [`ConfigError`] rather than silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Names of the requirement modules to load. Each module is read from
    /// `<module_dir>/<name>.csv`.
    pub modules: Vec<String>,

    /// Directory containing the module exports. Defaults to the current
    /// working directory.
    pub module_dir: Option<PathBuf>,

    /// Documentation output roots scanned for source-code links.
    pub src_dirs: Vec<PathBuf>,

    /// Documentation output roots scanned for test-code links.
    pub test_dirs: Vec<PathBuf>,

    /// Require every requirement to be linked to source code.
    pub check_src_links: bool,

    /// Require every requirement to be linked to test code.
    pub check_test_links: bool,
}

impl Config {
    /// Loads a configuration file, selecting the format by extension.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, has an
    /// unsupported extension, or does not deserialize against the schema
    /// (including unknown keys and ill-typed values).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }),
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Overlays another configuration on top of this one.
    ///
    /// List values append, boolean checks combine with OR, and a set
    /// `module_dir` in the overlay wins. Used to apply command-line arguments
    /// over a configuration file.
    pub fn merge(&mut self, overlay: Self) {
        self.modules.extend(overlay.modules);
        self.src_dirs.extend(overlay.src_dirs);
        self.test_dirs.extend(overlay.test_dirs);
        self.check_src_links |= overlay.check_src_links;
        self.check_test_links |= overlay.check_test_links;
        if overlay.module_dir.is_some() {
            self.module_dir = overlay.module_dir;
        }
    }

    /// The link kinds coverage is checked against.
    ///
    /// Explicit check flags win. With no flags set, the checked kinds follow
    /// the scanned directories, and a run with no directories at all checks
    /// both kinds.
    #[must_use]
    pub fn checked_kinds(&self) -> Vec<LinkKind> {
        let mut kinds = Vec::new();
        if self.check_src_links {
            kinds.push(LinkKind::Source);
        }
        if self.check_test_links {
            kinds.push(LinkKind::Test);
        }
        if kinds.is_empty() {
            if !self.src_dirs.is_empty() {
                kinds.push(LinkKind::Source);
            }
            if !self.test_dirs.is_empty() {
                kinds.push(LinkKind::Test);
            }
        }
        if kinds.is_empty() {
            kinds = vec![LinkKind::Source, LinkKind::Test];
        }
        kinds
    }

    /// The directory module exports are read from.
    #[must_use]
    pub fn module_dir(&self) -> PathBuf {
        self.module_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The file extension is not one of `.toml`, `.json`, `.yaml`, `.yml`.
    #[error("unsupported configuration file type: {0}")]
    UnsupportedFormat(PathBuf),

    /// The file is not valid TOML for the configuration schema.
    #[error("invalid TOML configuration in {path}: {source}")]
    Toml {
        /// The configuration file.
        path: PathBuf,
        /// The underlying deserialization error.
        source: toml::de::Error,
    },

    /// The file is not valid JSON for the configuration schema.
    #[error("invalid JSON configuration in {path}: {source}")]
    Json {
        /// The configuration file.
        path: PathBuf,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// The file is not valid YAML for the configuration schema.
    #[error("invalid YAML configuration in {path}: {source}")]
    Yaml {
        /// The configuration file.
        path: PathBuf,
        /// The underlying deserialization error.
        source: serde_yaml::Error,
    },
}
