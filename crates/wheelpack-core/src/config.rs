//! Bundle configuration.
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the user config file, `<config_dir>/wheelpack/config.toml`
//! 3. `wheelpack.toml` in the application directory
//! 4. `WHEELPACK_*` environment variables
//! 5. command-line flags (applied by the caller with [`BundleConfig::apply`])
//!
//! An explicit config file replaces layers 2 and 3.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::index::{IndexError, PipIndex};
use crate::manifest::ManifestError;

/// Default output subdirectory inside the application path.
pub const DEFAULT_PACKAGES_DIR: &str = ".python_packages";

/// Default manifest file name inside the application path.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// App-local config file name.
pub const APP_CONFIG_FILE: &str = "wheelpack.toml";

/// Configuration errors. All of them map to the general exit code.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("config file not found: {}", .0.display())]
    Missing(PathBuf),

    /// A config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML or has unknown keys.
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// `packages_dir_name` is not a single plain path component.
    #[error("packages directory name must be a single directory name, got '{0}'")]
    InvalidPackagesDir(String),

    /// A target selector was not given.
    #[error("missing required argument: --{0}")]
    MissingSelector(&'static str),

    /// The application path is not a directory.
    #[error("application path {} is not a directory", .0.display())]
    AppPathNotFound(PathBuf),

    /// The requirements manifest is missing or malformed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// No usable interpreter to drive the index.
    #[error(transparent)]
    Interpreter(IndexError),
}

/// Effective configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleConfig {
    /// Interpreter that drives pip. Located on `PATH` when unset.
    pub python: Option<PathBuf>,
    /// Output subdirectory inside the application path.
    pub packages_dir_name: String,
    /// Manifest file name inside the application path.
    pub requirements_file: String,
    /// Primary index URL passed to pip.
    pub index_url: Option<String>,
    /// Secondary index URLs passed to pip.
    pub extra_index_urls: Vec<String>,
    /// Stream pip output instead of capturing it.
    pub verbose: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            python: None,
            packages_dir_name: DEFAULT_PACKAGES_DIR.to_string(),
            requirements_file: DEFAULT_REQUIREMENTS_FILE.to_string(),
            index_url: None,
            extra_index_urls: Vec::new(),
            verbose: false,
        }
    }
}

/// One partial source of configuration. Unset fields leave the value below
/// them untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// See [`BundleConfig::python`].
    pub python: Option<PathBuf>,
    /// See [`BundleConfig::packages_dir_name`].
    pub packages_dir_name: Option<String>,
    /// See [`BundleConfig::requirements_file`].
    pub requirements_file: Option<String>,
    /// See [`BundleConfig::index_url`].
    pub index_url: Option<String>,
    /// See [`BundleConfig::extra_index_urls`].
    pub extra_index_urls: Option<Vec<String>>,
    /// See [`BundleConfig::verbose`].
    pub verbose: Option<bool>,
}

impl ConfigLayer {
    /// Read a layer from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read the `WHEELPACK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a layer from an arbitrary variable lookup. Empty values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            python: var("WHEELPACK_PYTHON").map(PathBuf::from),
            packages_dir_name: var("WHEELPACK_PACKAGES_DIR"),
            index_url: var("WHEELPACK_INDEX_URL"),
            ..Self::default()
        }
    }
}

/// Location of the per-user config file.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wheelpack").join("config.toml"))
}

impl BundleConfig {
    /// Load configuration for the application at `app_path`.
    ///
    /// When `explicit` is given it is the only file read, and it must exist.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load(app_path: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::Missing(path.to_path_buf()));
            }
            config.apply(ConfigLayer::read(path)?);
        } else {
            let files = user_config_path()
                .into_iter()
                .chain(std::iter::once(app_path.join(APP_CONFIG_FILE)));
            for path in files {
                if path.is_file() {
                    tracing::debug!("Loading config from {}", path.display());
                    config.apply(ConfigLayer::read(&path)?);
                }
            }
        }

        config.apply(ConfigLayer::from_env());
        config.validate()?;
        Ok(config)
    }

    /// Overlay `layer` on top of the current values.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.python {
            self.python = Some(v);
        }
        if let Some(v) = layer.packages_dir_name {
            self.packages_dir_name = v;
        }
        if let Some(v) = layer.requirements_file {
            self.requirements_file = v;
        }
        if let Some(v) = layer.index_url {
            self.index_url = Some(v);
        }
        if let Some(v) = layer.extra_index_urls {
            self.extra_index_urls = v;
        }
        if let Some(v) = layer.verbose {
            self.verbose = v;
        }
    }

    /// Check invariants that layering cannot enforce.
    ///
    /// The packages directory must be one plain directory name so the output
    /// never lands outside the application's package subtree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPackagesDir`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut components = Path::new(&self.packages_dir_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(ConfigError::InvalidPackagesDir(
                self.packages_dir_name.clone(),
            )),
        }
    }

    /// Manifest location for an application.
    pub fn manifest_path(&self, app_path: &Path) -> PathBuf {
        app_path.join(&self.requirements_file)
    }

    /// Output directory for an application.
    pub fn output_dir(&self, app_path: &Path) -> PathBuf {
        app_path.join(&self.packages_dir_name)
    }

    /// Build the pip-backed index this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Interpreter`] if no interpreter can be found.
    pub fn pip_index(&self) -> Result<PipIndex, ConfigError> {
        let index = PipIndex::locate(self.python.as_deref()).map_err(ConfigError::Interpreter)?;
        tracing::debug!("Using interpreter {}", index.python().display());
        Ok(index
            .with_index_url(self.index_url.clone())
            .with_extra_index_urls(self.extra_index_urls.clone())
            .with_verbose(self.verbose))
    }
}
