//! Wheel installation.
//!
//! Extracts a wheel into a [`TargetLayout`], routing each archive entry by
//! its path prefix:
//!
//! - `{name}-{version}.dist-info/…` is skipped;
//! - `{name}-{version}.data/scripts/…` goes to the scripts root;
//! - `{name}-{version}.data/headers/…` goes to `headers/{name}/`;
//! - anything else under `{name}-{version}.data/` goes to the data root;
//! - everything else goes to purelib, path unchanged.
//!
//! Nothing from the archive is ever executed.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use crate::artifact::Artifact;
use crate::layout::TargetLayout;

/// Errors raised while extracting a wheel.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The artifact could not be opened or a file could not be written.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is unreadable or contains an unsafe entry.
    #[error("corrupt artifact {}: {reason}", path.display())]
    ArtifactCorrupt {
        /// The artifact file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

impl InstallError {
    fn corrupt(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Where one archive entry ends up, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Skip,
    Purelib(PathBuf),
    Scripts(PathBuf),
    Headers(PathBuf),
    Data(PathBuf),
}

/// Install `artifact` into `layout`, returning the number of files written.
///
/// # Errors
///
/// Returns [`InstallError::ArtifactCorrupt`] if the archive cannot be read or
/// contains an entry that would escape its destination root, and
/// [`InstallError::Io`] if a destination cannot be written.
pub fn install(artifact: &Artifact, layout: &TargetLayout) -> Result<usize, InstallError> {
    let file = File::open(&artifact.path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| InstallError::corrupt(&artifact.path, e))?;

    let dist_info = artifact.descriptor.dist_info_dir();
    let data_dir = artifact.descriptor.data_dir();
    let headers_root = layout.headers_for(&artifact.descriptor.name);
    let mark_executable = layout.target.platform.marks_scripts_executable();

    let mut installed = 0;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| InstallError::corrupt(&artifact.path, e))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if entry.enclosed_name().is_none() {
            return Err(InstallError::corrupt(
                &artifact.path,
                format!("entry '{name}' escapes the install root"),
            ));
        }

        let (dest, executable) = match route(&name, &dist_info, &data_dir) {
            Some(Destination::Skip) => continue,
            Some(Destination::Purelib(rel)) => (layout.purelib.join(rel), false),
            Some(Destination::Scripts(rel)) => (layout.scripts.join(rel), mark_executable),
            Some(Destination::Headers(rel)) => (headers_root.join(rel), false),
            Some(Destination::Data(rel)) => (layout.data.join(rel), false),
            None => {
                return Err(InstallError::corrupt(
                    &artifact.path,
                    format!("entry '{name}' escapes the install root"),
                ));
            }
        };

        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut contents)
            .map_err(|e| InstallError::corrupt(&artifact.path, format!("{name}: {e}")))?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &contents)?;

        if executable {
            make_executable(&dest)?;
        }

        tracing::trace!("{name} -> {}", dest.display());
        installed += 1;
    }

    tracing::debug!(
        "Installed {installed} files from {}",
        artifact.path.display()
    );
    Ok(installed)
}

/// Classify an archive entry. Returns `None` for paths that are not plain
/// relative paths.
fn route(entry: &str, dist_info: &str, data_dir: &str) -> Option<Destination> {
    let (top, rest) = entry.split_once('/').unwrap_or((entry, ""));

    if same_dir(top, dist_info) {
        return Some(Destination::Skip);
    }

    if !same_dir(top, data_dir) {
        return safe_relative(entry).map(Destination::Purelib);
    }

    if rest.is_empty() {
        return Some(Destination::Skip);
    }

    if let Some(script) = rest.strip_prefix("scripts/") {
        safe_relative(script).map(Destination::Scripts)
    } else if let Some(header) = rest.strip_prefix("headers/") {
        safe_relative(header).map(Destination::Headers)
    } else {
        safe_relative(rest).map(Destination::Data)
    }
}

/// Wheel tools disagree on the case and separator of the metadata
/// directories, so compare them loosely.
fn same_dir(actual: &str, expected: &str) -> bool {
    let norm = |s: &str| s.to_ascii_lowercase().replace('-', "_");
    norm(actual) == norm(expected)
}

fn safe_relative(rel: &str) -> Option<PathBuf> {
    let path = Path::new(rel);
    let mut components = path.components().peekable();
    components.peek()?;
    components
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| path.to_path_buf())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o100);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use wheelpack_schema::{Platform, PythonVersion, Target};
    use zip::write::SimpleFileOptions;

    fn write_wheel(dir: &Path, filename: &str, entries: &[(&str, &[u8])]) -> Artifact {
        let path = dir.join(filename);
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
        Artifact::from_path(&path).unwrap()
    }

    fn linux_layout(root: &Path) -> TargetLayout {
        TargetLayout::resolve(Target::new(Platform::Linux, PythonVersion::new(3, 9)), root)
    }

    #[test]
    fn test_route_partitions() {
        let info = "pkg-1.0.dist-info";
        let data = "pkg-1.0.data";
        assert_eq!(route("pkg-1.0.dist-info/METADATA", info, data), Some(Destination::Skip));
        assert_eq!(
            route("pkg/__init__.py", info, data),
            Some(Destination::Purelib(PathBuf::from("pkg/__init__.py")))
        );
        assert_eq!(
            route("pkg-1.0.data/scripts/tool", info, data),
            Some(Destination::Scripts(PathBuf::from("tool")))
        );
        assert_eq!(
            route("pkg-1.0.data/headers/pkg.h", info, data),
            Some(Destination::Headers(PathBuf::from("pkg.h")))
        );
        assert_eq!(
            route("pkg-1.0.data/data/share/doc.txt", info, data),
            Some(Destination::Data(PathBuf::from("data/share/doc.txt")))
        );
    }

    #[test]
    fn test_route_rejects_traversal() {
        let info = "pkg-1.0.dist-info";
        let data = "pkg-1.0.data";
        assert_eq!(route("pkg-1.0.data/scripts/../../evil", info, data), None);
        assert_eq!(route("pkg/../../evil.py", info, data), None);
        assert_eq!(route("pkg-1.0.data/scripts/", info, data), None);
    }

    #[test]
    fn test_metadata_dir_matches_loosely() {
        assert_eq!(
            route("My_Pkg-1.0.dist-info/RECORD", "my-pkg-1.0.dist-info", "my-pkg-1.0.data"),
            Some(Destination::Skip)
        );
    }

    #[test]
    fn test_install_metadata_only_installs_nothing() {
        let dir = tempdir().unwrap();
        let artifact = write_wheel(
            dir.path(),
            "pkg-1.0-py3-none-any.whl",
            &[
                ("pkg-1.0.dist-info/METADATA", b"Name: pkg\n"),
                ("pkg-1.0.dist-info/WHEEL", b"Wheel-Version: 1.0\n"),
                ("pkg-1.0.dist-info/RECORD", b""),
            ],
        );
        let stage = dir.path().join("stage");
        let count = install(&artifact, &linux_layout(&stage)).unwrap();
        assert_eq!(count, 0);
        assert!(!stage.exists());
    }

    #[test]
    fn test_install_routes_every_partition() {
        let dir = tempdir().unwrap();
        let artifact = write_wheel(
            dir.path(),
            "pkg-1.0-py3-none-any.whl",
            &[
                ("pkg/", b""),
                ("pkg/__init__.py", b"VALUE = 1\n"),
                ("pkg/sub/mod.py", b""),
                ("pkg-1.0.data/scripts/pkg-tool", b"#!/bin/sh\n"),
                ("pkg-1.0.data/headers/pkg.h", b"int x;\n"),
                ("pkg-1.0.data/data/share/pkg/readme.txt", b"hi"),
                ("pkg-1.0.dist-info/METADATA", b""),
            ],
        );
        let stage = dir.path().join("stage");
        let layout = linux_layout(&stage);
        let count = install(&artifact, &layout).unwrap();

        assert_eq!(count, 5);
        assert_eq!(
            fs::read_to_string(stage.join("lib/site-packages/pkg/__init__.py")).unwrap(),
            "VALUE = 1\n"
        );
        assert!(stage.join("lib/site-packages/pkg/sub/mod.py").is_file());
        assert!(stage.join("bin/pkg-tool").is_file());
        assert!(stage.join("include/site/python3.9/pkg/pkg.h").is_file());
        assert!(stage.join("data/share/pkg/readme.txt").is_file());
        assert!(!stage.join("lib/site-packages/pkg-1.0.dist-info").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_script_is_executable_on_linux() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let artifact = write_wheel(
            dir.path(),
            "pkg-1.0-py3-none-any.whl",
            &[("pkg-1.0.data/scripts/run-pkg", b"#!/usr/bin/env python\n")],
        );
        let stage = dir.path().join("stage");
        let layout = linux_layout(&stage);
        assert_eq!(install(&artifact, &layout).unwrap(), 1);

        let installed: Vec<_> = fs::read_dir(&layout.scripts).unwrap().collect();
        assert_eq!(installed.len(), 1);

        let mode = fs::metadata(layout.scripts.join("run-pkg"))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o100, 0, "owner execute bit should be set");
    }

    #[cfg(unix)]
    #[test]
    fn test_install_script_not_marked_for_windows_target() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let artifact = write_wheel(
            dir.path(),
            "pkg-1.0-py3-none-any.whl",
            &[("pkg-1.0.data/scripts/run-pkg.py", b"print('hi')\n")],
        );
        let stage = dir.path().join("stage");
        let layout = TargetLayout::resolve(
            Target::new(Platform::Windows, PythonVersion::new(3, 9)),
            &stage,
        );
        install(&artifact, &layout).unwrap();

        let mode = fs::metadata(stage.join("Scripts/run-pkg.py"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn test_install_corrupt_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pkg-1.0-py3-none-any.whl");
        fs::write(&path, b"this is not a zip file").unwrap();
        let artifact = Artifact::from_path(&path).unwrap();

        let err = install(&artifact, &linux_layout(&dir.path().join("stage"))).unwrap_err();
        assert!(matches!(err, InstallError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn test_install_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let artifact = Artifact::from_path(&dir.path().join("pkg-1.0-py3-none-any.whl")).unwrap();
        let err = install(&artifact, &linux_layout(&dir.path().join("stage"))).unwrap_err();
        assert!(matches!(err, InstallError::Io(_)));
    }
}
