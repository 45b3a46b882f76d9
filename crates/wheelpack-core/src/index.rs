//! Package index collaborator.
//!
//! The engine never talks to a registry directly. It needs three things from
//! an index: a dry-run download of a manifest's full closure into a scratch
//! directory, a prebuilt artifact for an exact version and target, and a
//! source build of an exact version. [`PipIndex`] provides all three by
//! driving `python -m pip` as a subprocess.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use wheelpack_schema::{ArtifactDescriptor, ResolvedDependency, Target, WHEEL_EXTENSION};

/// Errors raised while driving the package index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No interpreter could be located.
    #[error("no python interpreter found (tried {0}); set `python` in the config or pass --python")]
    InterpreterNotFound(String),

    /// The interpreter could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        /// The program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The index command ran and exited unsuccessfully.
    #[error("`{command}` failed with exit code {}:\n{stderr}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed {
        /// The rendered command line.
        command: String,
        /// Exit status, if the process exited normally.
        code: Option<i32>,
        /// Captured standard error; empty when output was streamed.
        stderr: String,
    },

    /// An output directory could not be created or listed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registry operations consumed by the engine.
///
/// `Ok(None)` from the per-dependency operations means the index could not
/// produce an artifact; it is a normal outcome that lets the caller fall
/// through to its next strategy. `Err` is reserved for conditions that make
/// the index itself unusable.
pub trait PackageIndex {
    /// Download every artifact in the transitive closure of `manifest` into
    /// `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::CommandFailed`] if the closure cannot be resolved.
    fn download_closure(&self, manifest: &Path, dest: &Path) -> Result<(), IndexError>;

    /// Fetch a prebuilt artifact of `dep` for `target` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the index cannot be used at all.
    fn fetch_prebuilt(
        &self,
        dep: &ResolvedDependency,
        target: &Target,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError>;

    /// Build `dep` from its source distribution into `dest`, without using any
    /// prebuilt binaries.
    ///
    /// # Errors
    ///
    /// Returns an error only if the index cannot be used at all.
    fn build_from_source(
        &self,
        dep: &ResolvedDependency,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError>;
}

impl<T: PackageIndex + ?Sized> PackageIndex for &T {
    fn download_closure(&self, manifest: &Path, dest: &Path) -> Result<(), IndexError> {
        (**self).download_closure(manifest, dest)
    }
    fn fetch_prebuilt(
        &self,
        dep: &ResolvedDependency,
        target: &Target,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError> {
        (**self).fetch_prebuilt(dep, target, dest)
    }
    fn build_from_source(
        &self,
        dep: &ResolvedDependency,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError> {
        (**self).build_from_source(dep, dest)
    }
}

/// Interpreter names probed on `PATH` when none is configured.
const DEFAULT_INTERPRETERS: [&str; 2] = ["python3", "python"];

/// [`PackageIndex`] backed by `python -m pip`.
#[derive(Debug, Clone)]
pub struct PipIndex {
    python: PathBuf,
    index_url: Option<String>,
    extra_index_urls: Vec<String>,
    verbose: bool,
}

/// What a finished pip invocation reported.
struct RunOutcome {
    success: bool,
    code: Option<i32>,
    stderr: String,
}

impl PipIndex {
    /// Use the given interpreter as-is.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            index_url: None,
            extra_index_urls: Vec::new(),
            verbose: false,
        }
    }

    /// Locate an interpreter: `python` if given (a name on `PATH` or a
    /// path), otherwise the first of `python3`/`python` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InterpreterNotFound`] if nothing usable is found.
    pub fn locate(python: Option<&Path>) -> Result<Self, IndexError> {
        if let Some(python) = python {
            return which::which(python)
                .map(Self::new)
                .map_err(|_| IndexError::InterpreterNotFound(python.display().to_string()));
        }

        DEFAULT_INTERPRETERS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or_else(|| IndexError::InterpreterNotFound(DEFAULT_INTERPRETERS.join(", ")))
    }

    /// Use `url` as the primary index instead of pip's default.
    #[must_use]
    pub fn with_index_url(mut self, url: Option<String>) -> Self {
        self.index_url = url;
        self
    }

    /// Add secondary indexes.
    #[must_use]
    pub fn with_extra_index_urls(mut self, urls: Vec<String>) -> Self {
        self.extra_index_urls = urls;
        self
    }

    /// Stream pip's output to the terminal instead of capturing it.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// The interpreter driving pip.
    pub fn python(&self) -> &Path {
        &self.python
    }

    fn pip(&self, subcommand: &str) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "pip", subcommand])
            .args(["--disable-pip-version-check", "--no-input"]);
        if let Some(url) = &self.index_url {
            cmd.args(["--index-url", url]);
        }
        for url in &self.extra_index_urls {
            cmd.args(["--extra-index-url", url]);
        }
        cmd
    }

    fn closure_command(&self, manifest: &Path, dest: &Path) -> Command {
        let mut cmd = self.pip("download");
        cmd.arg("-r").arg(manifest).arg("--dest").arg(dest);
        cmd
    }

    fn prebuilt_command(&self, dep: &ResolvedDependency, target: &Target, dest: &Path) -> Command {
        let mut cmd = self.pip("download");
        cmd.args(["--no-deps", "--only-binary", ":all:"])
            .args(["--python-version", &target.python.nodot()])
            .args(["--implementation", "cp"])
            .args(["--abi", &target.python.abi_tag()]);
        for tag in target.platform.platform_tags() {
            cmd.args(["--platform", tag]);
        }
        cmd.arg("--dest").arg(dest).arg(dep.pinned());
        cmd
    }

    fn source_build_command(&self, dep: &ResolvedDependency, dest: &Path) -> Command {
        let mut cmd = self.pip("wheel");
        cmd.args(["--no-deps", "--no-binary", ":all:"])
            .arg("--wheel-dir")
            .arg(dest)
            .arg(dep.pinned());
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<RunOutcome, IndexError> {
        let rendered = render(&cmd);
        tracing::debug!("Running {rendered}");

        let launch_err = |source| IndexError::Launch {
            program: self.python.display().to_string(),
            source,
        };

        if self.verbose {
            let status = cmd.status().map_err(launch_err)?;
            return Ok(RunOutcome {
                success: status.success(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(launch_err)?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            tracing::debug!("{rendered} exited with {:?}: {stderr}", output.status.code());
        }
        Ok(RunOutcome {
            success: output.status.success(),
            code: output.status.code(),
            stderr,
        })
    }
}

impl PackageIndex for PipIndex {
    fn download_closure(&self, manifest: &Path, dest: &Path) -> Result<(), IndexError> {
        let cmd = self.closure_command(manifest, dest);
        let command = render(&cmd);
        let outcome = self.run(cmd)?;
        if outcome.success {
            Ok(())
        } else {
            Err(IndexError::CommandFailed {
                command,
                code: outcome.code,
                stderr: outcome.stderr,
            })
        }
    }

    fn fetch_prebuilt(
        &self,
        dep: &ResolvedDependency,
        target: &Target,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError> {
        let outcome = self.run(self.prebuilt_command(dep, target, dest))?;
        if !outcome.success {
            return Ok(None);
        }
        Ok(find_wheel(dest, dep)?)
    }

    fn build_from_source(
        &self,
        dep: &ResolvedDependency,
        dest: &Path,
    ) -> Result<Option<PathBuf>, IndexError> {
        let outcome = self.run(self.source_build_command(dep, dest))?;
        if !outcome.success {
            return Ok(None);
        }
        Ok(find_wheel(dest, dep)?)
    }
}

fn render(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pick the wheel pip left in `dir` for `dep`. Falls back to any wheel when
/// none carries the dependency's name.
fn find_wheel(dir: &Path, dep: &ResolvedDependency) -> std::io::Result<Option<PathBuf>> {
    let mut wheels: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_ascii_lowercase())
                .is_some_and(|n| n.ends_with(WHEEL_EXTENSION))
        })
        .collect();
    wheels.sort();

    let matching = wheels.iter().position(|p| {
        p.file_name()
            .and_then(|n| ArtifactDescriptor::parse(&n.to_string_lossy()).ok())
            .is_some_and(|d| d.package_name() == dep.name)
    });

    Ok(match matching {
        Some(i) => Some(wheels.swap_remove(i)),
        None => wheels.into_iter().next(),
    })
}
