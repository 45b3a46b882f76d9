//! Run-level error classification.
//!
//! Every fatal condition of a bundle run ends up as a [`BundleError`], whose
//! [`exit_code`](BundleError::exit_code) lets automation tell a missing
//! native dependency apart from everything else.

use thiserror::Error;
use wheelpack_schema::{ResolvedDependency, TargetError};

use crate::acquire::AcquireError;
use crate::config::ConfigError;
use crate::enumerate::ResolveError;
use crate::index::IndexError;
use crate::install::InstallError;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// Any failure other than a missing native dependency.
    GeneralError = 1,
    /// A native dependency has no artifact usable on the target.
    NativeDepsError = 4,
}

impl ExitCode {
    /// The numeric process exit status.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.code())
    }
}

/// The fatal condition that ended a bundle run.
#[derive(Error, Debug)]
pub enum BundleError {
    /// Missing or unusable operator input.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The target selectors name no supported layout.
    #[error(transparent)]
    UnsupportedTarget(#[from] TargetError),

    /// The dependency closure could not be enumerated.
    #[error(transparent)]
    Resolution(ResolveError),

    /// A dependency has no artifact usable on the target.
    #[error(transparent)]
    NativeDependency(AcquireError),

    /// An acquired artifact could not be installed.
    #[error("failed to install {dependency}: {source}")]
    ArtifactCorrupt {
        /// The dependency whose artifact is broken.
        dependency: ResolvedDependency,
        /// What the installer reported.
        #[source]
        source: InstallError,
    },

    /// The index failed outside of resolution.
    #[error(transparent)]
    Index(IndexError),

    /// Staging or copying failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BundleError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::NativeDependency(_) => ExitCode::NativeDepsError,
            _ => ExitCode::GeneralError,
        }
    }

    /// Classify an installer failure for `dependency`.
    pub fn install(dependency: &ResolvedDependency, err: InstallError) -> Self {
        match err {
            InstallError::Io(e) => Self::Io(e),
            source @ InstallError::ArtifactCorrupt { .. } => Self::ArtifactCorrupt {
                dependency: dependency.clone(),
                source,
            },
        }
    }
}

impl From<IndexError> for BundleError {
    fn from(err: IndexError) -> Self {
        match err {
            e @ (IndexError::InterpreterNotFound(_) | IndexError::Launch { .. }) => {
                Self::Config(ConfigError::Interpreter(e))
            }
            IndexError::Io(e) => Self::Io(e),
            e @ IndexError::CommandFailed { .. } => Self::Index(e),
        }
    }
}

impl From<ResolveError> for BundleError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Manifest(e) => Self::Config(ConfigError::Manifest(e)),
            ResolveError::Index(
                e @ (IndexError::InterpreterNotFound(_) | IndexError::Launch { .. }),
            ) => Self::from(e),
            ResolveError::Io(e) => Self::Io(e),
            e => Self::Resolution(e),
        }
    }
}

impl From<AcquireError> for BundleError {
    fn from(err: AcquireError) -> Self {
        match err {
            e @ AcquireError::NativeUnavailable { .. } => Self::NativeDependency(e),
            AcquireError::Index(e) => Self::from(e),
            AcquireError::Io(e) => Self::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestError;
    use std::path::PathBuf;
    use wheelpack_schema::{Platform, PythonVersion, Target};

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::GeneralError.code(), 1);
        assert_eq!(ExitCode::NativeDepsError.code(), 4);
    }

    #[test]
    fn test_native_dependency_exit_code() {
        let err = BundleError::from(AcquireError::NativeUnavailable {
            dependency: ResolvedDependency::new("examplepkg", "1.2.3"),
            target: Target::new(Platform::Linux, PythonVersion::new(3, 9)),
        });
        assert!(matches!(err, BundleError::NativeDependency(_)));
        assert_eq!(err.exit_code(), ExitCode::NativeDepsError);
    }

    #[test]
    fn test_missing_manifest_is_config_error() {
        let err = BundleError::from(ResolveError::Manifest(ManifestError::Missing(
            PathBuf::from("/app/requirements.txt"),
        )));
        assert!(matches!(err, BundleError::Config(ConfigError::Manifest(_))));
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
        assert!(err.to_string().contains("--no-deps"));
    }

    #[test]
    fn test_launch_failure_during_resolution_is_config_error() {
        let err = BundleError::from(ResolveError::Index(IndexError::InterpreterNotFound(
            "python3".to_string(),
        )));
        assert!(matches!(err, BundleError::Config(ConfigError::Interpreter(_))));
    }

    #[test]
    fn test_resolution_failure_is_general_error() {
        let err = BundleError::from(ResolveError::Index(IndexError::CommandFailed {
            command: "pip download".to_string(),
            code: Some(1),
            stderr: "boom".to_string(),
        }));
        assert!(matches!(err, BundleError::Resolution(_)));
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
    }

    #[test]
    fn test_unsupported_target() {
        let err = BundleError::from(TargetError::UnsupportedPlatform("macos".to_string()));
        assert_eq!(err.exit_code(), ExitCode::GeneralError);
        assert!(err.to_string().contains("macos"));
    }
}
