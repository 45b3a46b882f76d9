//! Bundling engine for wheelpack.
//!
//! Resolves a requirements manifest, acquires a target-correct wheel for
//! every dependency, installs each into a staging layout for the target
//! platform and interpreter, and consolidates the result into one output
//! directory.

pub mod acquire;
pub mod artifact;
pub mod assemble;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod index;
pub mod install;
pub mod layout;
pub mod manifest;
pub mod reporter;

// Re-exports
pub use acquire::{AcquireError, AcquireState, Acquired, AcquiredVia, Acquirer};
pub use artifact::Artifact;
pub use assemble::{Assembler, copy_tree};
pub use config::{BundleConfig, ConfigError, ConfigLayer};
pub use enumerate::{DependencyResolver, ResolveError, ScratchDirResolver, enumerate};
pub use error::{BundleError, ExitCode};
pub use index::{IndexError, PackageIndex, PipIndex};
pub use install::{InstallError, install};
pub use layout::{TargetLayout, resolve_layout};
pub use manifest::{Manifest, ManifestError};
pub use reporter::{NullReporter, Reporter};
