//! Dependency enumeration.
//!
//! Transitive resolution is delegated. [`ScratchDirResolver`] asks a
//! [`PackageIndex`] to download a manifest's whole closure into a scratch
//! directory and reads the resolved `(name, version)` pairs back out of the
//! filenames that land there.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;
use wheelpack_schema::{ArtifactDescriptor, PackageName, ResolvedDependency, Version};

use crate::index::{IndexError, PackageIndex};
use crate::manifest::{Manifest, ManifestError};

/// Errors raised while enumerating dependencies.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The manifest is missing or malformed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The index failed to resolve the closure.
    #[error("dependency resolution failed: {0}")]
    Index(#[from] IndexError),

    /// The resolver reported one name at two versions.
    #[error("resolver reported conflicting versions of {name}: {first} and {second}")]
    ConflictingVersions {
        /// Normalized package name.
        name: PackageName,
        /// Version seen first.
        first: Version,
        /// The other version.
        second: Version,
    },

    /// The scratch directory could not be created or read.
    #[error("failed to prepare resolver scratch directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a manifest into the exact set of packages to bundle.
pub trait DependencyResolver {
    /// Resolve the manifest's full transitive closure.
    ///
    /// The result holds at most one entry per normalized name, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the closure cannot be computed. No
    /// partial result is ever returned.
    fn resolve(&self, manifest: &Manifest) -> Result<Vec<ResolvedDependency>, ResolveError>;
}

/// [`DependencyResolver`] that reads the closure from a dry-run download.
#[derive(Debug)]
pub struct ScratchDirResolver<I> {
    index: I,
}

impl<I: PackageIndex> ScratchDirResolver<I> {
    /// Resolve through `index`.
    pub fn new(index: I) -> Self {
        Self { index }
    }
}

impl<I: PackageIndex> DependencyResolver for ScratchDirResolver<I> {
    fn resolve(&self, manifest: &Manifest) -> Result<Vec<ResolvedDependency>, ResolveError> {
        let scratch = tempfile::Builder::new()
            .prefix("wheelpack-resolve-")
            .tempdir()?;

        self.index.download_closure(&manifest.path, scratch.path())?;

        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(scratch.path())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                filenames.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        collect_dependencies(filenames)
    }
}

/// Extract `(name, version)` pairs from resolver output filenames.
///
/// Names that parse as neither a wheel nor a source archive are skipped with
/// a warning. Identical pairs collapse into one entry; the same name with
/// two versions is a [`ResolveError::ConflictingVersions`].
///
/// # Errors
///
/// Returns [`ResolveError::ConflictingVersions`] as described above.
pub fn collect_dependencies<S: AsRef<str>>(
    filenames: impl IntoIterator<Item = S>,
) -> Result<Vec<ResolvedDependency>, ResolveError> {
    let mut resolved: BTreeMap<PackageName, ResolvedDependency> = BTreeMap::new();

    for filename in filenames {
        let filename = filename.as_ref();
        let descriptor = match ArtifactDescriptor::parse(filename) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Skipping unrecognized resolver output: {e}");
                continue;
            }
        };

        let dep = ResolvedDependency::new(descriptor.package_name(), descriptor.version);
        match resolved.get(&dep.name) {
            Some(existing) if existing.version != dep.version => {
                return Err(ResolveError::ConflictingVersions {
                    name: dep.name,
                    first: existing.version.clone(),
                    second: dep.version,
                });
            }
            Some(_) => {
                tracing::debug!("Ignoring duplicate resolver output {filename}");
            }
            None => {
                tracing::debug!("Resolved {dep} from {filename}");
                resolved.insert(dep.name.clone(), dep);
            }
        }
    }

    Ok(resolved.into_values().collect())
}

/// Load the manifest at `manifest_path` and resolve it.
///
/// A manifest with no requirement, direct reference or option lines
/// resolves to nothing without consulting the resolver.
///
/// # Errors
///
/// Returns [`ResolveError::Manifest`] if the manifest is missing or invalid,
/// and any error of the resolver.
pub fn enumerate(
    manifest_path: &Path,
    resolver: &impl DependencyResolver,
) -> Result<Vec<ResolvedDependency>, ResolveError> {
    let manifest = Manifest::load(manifest_path)?;
    if manifest.is_empty() && manifest.options.is_empty() {
        tracing::info!("{} declares no requirements", manifest_path.display());
        return Ok(Vec::new());
    }

    let deps = resolver.resolve(&manifest)?;
    tracing::info!("Resolved {} dependencies", deps.len());
    Ok(deps)
}
