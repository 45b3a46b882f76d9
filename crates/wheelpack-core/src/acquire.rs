//! Artifact acquisition.
//!
//! Each dependency is obtained through a fixed fallback sequence, modelled
//! as [`AcquireState`]:
//!
//! ```text
//! NotAttempted --prebuilt found--> Resolved(Prebuilt)
//!      |
//!      v
//! PrebuiltTried --universal build--> Resolved(SourceBuild)
//!      |
//!      v
//! SourceBuildTried --> Failed
//! ```
//!
//! A source build only counts if the wheel it produces is universal
//! (`abi` = `none`, `platform` = `any`). A platform-specific wheel from the
//! build host would be wrong for the target, so it is rejected.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use wheelpack_schema::{ResolvedDependency, Target};

use crate::artifact::Artifact;
use crate::index::{IndexError, PackageIndex};

/// Errors raised while obtaining an installable artifact.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// Neither tier produced an artifact usable on the target.
    #[error(
        "cannot bundle native dependency {dependency} for {target}: no prebuilt artifact \
         exists for this target and it does not build as a universal wheel. Build the \
         application remotely, or build native dependencies inside a container that \
         matches the target."
    )]
    NativeUnavailable {
        /// The dependency that could not be bundled.
        dependency: ResolvedDependency,
        /// The target it was requested for.
        target: Target,
    },

    /// The index could not be driven at all.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A tier directory could not be created or read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an artifact was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcquiredVia {
    /// Downloaded as a prebuilt artifact for the target.
    Prebuilt,
    /// Built locally from source as a universal wheel.
    SourceBuild,
}

impl std::fmt::Display for AcquiredVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prebuilt => write!(f, "prebuilt"),
            Self::SourceBuild => write!(f, "source build"),
        }
    }
}

/// Progress of one dependency through the fallback sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireState {
    /// Nothing tried yet.
    NotAttempted,
    /// The prebuilt fetch found nothing usable.
    PrebuiltTried,
    /// The source build found nothing usable either.
    SourceBuildTried,
    /// An installable artifact was obtained.
    Resolved {
        /// The artifact to install.
        artifact: Artifact,
        /// Which tier produced it.
        via: AcquiredVia,
    },
    /// Every tier was exhausted.
    Failed,
}

impl AcquireState {
    /// Returns `true` for `Resolved` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Failed)
    }
}

/// Outcome of a successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    /// The artifact to install.
    pub artifact: Artifact,
    /// Which tier produced it.
    pub via: AcquiredVia,
}

/// Drives [`AcquireState`] for one target against a [`PackageIndex`].
#[derive(Debug)]
pub struct Acquirer<I> {
    index: I,
    target: Target,
}

impl<I: PackageIndex> Acquirer<I> {
    /// Create an acquirer for `target`.
    pub fn new(index: I, target: Target) -> Self {
        Self { index, target }
    }

    /// The target artifacts are acquired for.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Obtain an installable artifact for `dep` below `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::NativeUnavailable`] when every tier has been
    /// exhausted, and index or filesystem errors as they occur.
    pub fn acquire(&self, dep: &ResolvedDependency, dest: &Path) -> Result<Acquired, AcquireError> {
        let mut state = AcquireState::NotAttempted;
        while !state.is_terminal() {
            state = self.advance(state, dep, dest)?;
        }

        match state {
            AcquireState::Resolved { artifact, via } => Ok(Acquired { artifact, via }),
            _ => Err(AcquireError::NativeUnavailable {
                dependency: dep.clone(),
                target: self.target,
            }),
        }
    }

    /// Perform the single transition out of `state`. Terminal states map to
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns index or filesystem errors raised while attempting a tier.
    pub fn advance(
        &self,
        state: AcquireState,
        dep: &ResolvedDependency,
        dest: &Path,
    ) -> Result<AcquireState, AcquireError> {
        let next = match state {
            AcquireState::NotAttempted => match self.try_prebuilt(dep, dest)? {
                Some(artifact) => AcquireState::Resolved {
                    artifact,
                    via: AcquiredVia::Prebuilt,
                },
                None => AcquireState::PrebuiltTried,
            },
            AcquireState::PrebuiltTried => match self.try_source_build(dep, dest)? {
                Some(artifact) => AcquireState::Resolved {
                    artifact,
                    via: AcquiredVia::SourceBuild,
                },
                None => AcquireState::SourceBuildTried,
            },
            AcquireState::SourceBuildTried => AcquireState::Failed,
            terminal => terminal,
        };
        Ok(next)
    }

    fn try_prebuilt(&self, dep: &ResolvedDependency, dest: &Path) -> Result<Option<Artifact>, AcquireError> {
        let dir = tier_dir(dest, "prebuilt")?;
        let Some(path) = self.index.fetch_prebuilt(dep, &self.target, &dir)? else {
            tracing::info!("No prebuilt artifact of {dep} for {}", self.target);
            return Ok(None);
        };

        match Artifact::from_path(&path) {
            Ok(artifact) if artifact.descriptor.is_prebuilt() => Ok(Some(artifact)),
            Ok(_) => {
                tracing::warn!("Index returned a source archive for {dep}: {}", path.display());
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Index returned an unrecognized file for {dep}: {e}");
                Ok(None)
            }
        }
    }

    fn try_source_build(&self, dep: &ResolvedDependency, dest: &Path) -> Result<Option<Artifact>, AcquireError> {
        let dir = tier_dir(dest, "source")?;
        let Some(path) = self.index.build_from_source(dep, &dir)? else {
            tracing::info!("Source build of {dep} failed");
            return Ok(None);
        };

        let artifact = match Artifact::from_path(&path) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!("Source build of {dep} produced an unrecognized file: {e}");
                return Ok(None);
            }
        };

        if artifact.descriptor.package_name() != dep.name {
            tracing::warn!(
                "Source build of {dep} produced a wheel for another package: {}",
                artifact.filename()
            );
            return Ok(None);
        }

        if !artifact.descriptor.is_universal() {
            tracing::warn!(
                "Source build of {dep} produced platform-specific {}; rejecting",
                artifact.filename()
            );
            return Ok(None);
        }

        Ok(Some(artifact))
    }
}

fn tier_dir(dest: &Path, tier: &str) -> std::io::Result<PathBuf> {
    let dir = dest.join(tier);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
