//! Bundle assembly.
//!
//! Ties the pipeline together: enumerate the manifest's closure, install
//! every dependency into a fresh staging prefix, then copy the staging tree
//! into the output directory. The output directory is written only after
//! every dependency has been installed, so a failed run leaves it as it was.

use std::path::Path;
use std::time::Instant;

use walkdir::WalkDir;
use wheelpack_schema::Target;

use crate::acquire::Acquirer;
use crate::enumerate::{ScratchDirResolver, enumerate};
use crate::error::BundleError;
use crate::index::PackageIndex;
use crate::install::install;
use crate::layout::TargetLayout;
use crate::reporter::Reporter;

/// Orchestrates one bundle run against a [`PackageIndex`].
#[derive(Debug)]
pub struct Assembler<I, R> {
    index: I,
    reporter: R,
}

impl<I: PackageIndex, R: Reporter> Assembler<I, R> {
    /// Create an assembler that reports progress to `reporter`.
    pub fn new(index: I, reporter: R) -> Self {
        Self { index, reporter }
    }

    /// Bundle the dependencies of `manifest_path` for the given target
    /// selectors into `output_dir`, returning the number of files copied.
    ///
    /// The selectors are validated before anything touches the network.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleError`] classifying the first fatal condition.
    pub fn assemble(
        &self,
        manifest_path: &Path,
        platform: &str,
        python_version: &str,
        output_dir: &Path,
    ) -> Result<usize, BundleError> {
        let target = Target::new(platform.parse()?, python_version.parse()?);
        self.assemble_for(manifest_path, target, output_dir)
    }

    /// Like [`assemble`](Self::assemble), with an already validated target.
    ///
    /// # Errors
    ///
    /// Returns a [`BundleError`] classifying the first fatal condition.
    pub fn assemble_for(
        &self,
        manifest_path: &Path,
        target: Target,
        output_dir: &Path,
    ) -> Result<usize, BundleError> {
        let started = Instant::now();

        self.reporter.section("Resolving");
        let deps = enumerate(manifest_path, &ScratchDirResolver::new(&self.index))?;
        if deps.is_empty() {
            self.reporter
                .warning(&format!("{} lists no dependencies", manifest_path.display()));
        }

        let staging = tempfile::Builder::new()
            .prefix("wheelpack-stage-")
            .tempdir()?;
        let layout = TargetLayout::resolve(target, staging.path());
        tracing::debug!("Staging {target} into {}", layout.prefix.display());

        self.reporter.section("Installing");
        let acquirer = Acquirer::new(&self.index, target);
        for dep in &deps {
            self.reporter.acquiring(dep);

            // Dropping the scratch dir discards the artifact once installed.
            let scratch = tempfile::Builder::new()
                .prefix("wheelpack-artifact-")
                .tempdir()?;

            let acquired = acquirer.acquire(dep, scratch.path()).map_err(|e| {
                self.reporter.failed(dep, &e.to_string());
                BundleError::from(e)
            })?;
            self.reporter.acquired(dep, acquired.via);

            let files = install(&acquired.artifact, &layout).map_err(|e| {
                self.reporter.failed(dep, &e.to_string());
                BundleError::install(dep, e)
            })?;
            tracing::info!("Installed {dep} ({files} files, {})", acquired.via);
            self.reporter.installed(dep, files);
        }

        self.reporter.section("Copying");
        let copied = copy_tree(&layout.prefix, output_dir)?;
        self.reporter
            .summary(deps.len(), copied, started.elapsed().as_secs_f64());

        Ok(copied)
    }
}

/// Copy every regular file below `src` to the same relative path below
/// `dst`, overwriting existing files. Returns the number of files copied.
///
/// The copy is not atomic: if it fails partway, files already copied stay
/// in `dst`. The assembler only calls this once every dependency has been
/// installed into the staging tree.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked or a file cannot be copied,
/// for example when a directory occupies a destination file path.
pub fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<usize> {
    std::fs::create_dir_all(dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let dest = dst.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(entry.path(), &dest)?;
        copied += 1;
    }

    tracing::debug!("Copied {copied} files into {}", dst.display());
    Ok(copied)
}
