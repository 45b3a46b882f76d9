//! Target installation layouts.
//!
//! Each target platform/interpreter pair installs wheels into a fixed set of
//! directories below a prefix. The table is exhaustive:
//!
//! | platform | interpreter | purelib / platlib | headers | scripts | data |
//! |---|---|---|---|---|---|
//! | windows | any | `Lib/site-packages` | `Include` | `Scripts` | prefix |
//! | linux | 3.6 | `lib/python3.6/site-packages` | `include/site/python3.6` | `bin` | prefix |
//! | linux | newer | `lib/site-packages` | `include/site/pythonX.Y` | `bin` | prefix |

use serde::Serialize;
use std::path::{Path, PathBuf};
use wheelpack_schema::{Platform, Target, TargetError};

/// Destination roots for one installation prefix.
///
/// Computed once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetLayout {
    /// Target this layout was computed for.
    pub target: Target,
    /// Installation prefix; every other root lives below it.
    pub prefix: PathBuf,
    /// Root for pure-Python modules.
    pub purelib: PathBuf,
    /// Root for platform-specific modules (same as `purelib` for bundles).
    pub platlib: PathBuf,
    /// Root for C headers; each package gets its own subdirectory.
    pub headers: PathBuf,
    /// Root for executable scripts.
    pub scripts: PathBuf,
    /// Root for data files.
    pub data: PathBuf,
}

impl TargetLayout {
    /// Compute the layout for `target` below `root`.
    ///
    /// This is a pure function of its arguments. Unsupported platforms are
    /// rejected earlier, when the [`Platform`] is parsed.
    pub fn resolve(target: Target, root: &Path) -> Self {
        let python = target.python.executable_name();

        let (site_packages, headers, scripts) = match target.platform {
            Platform::Windows => (
                root.join("Lib").join("site-packages"),
                root.join("Include"),
                root.join("Scripts"),
            ),
            Platform::Linux => {
                let site_packages = if target.python.is_oldest_supported() {
                    root.join("lib").join(&python).join("site-packages")
                } else {
                    root.join("lib").join("site-packages")
                };
                (
                    site_packages,
                    root.join("include").join("site").join(&python),
                    root.join("bin"),
                )
            }
        };

        Self {
            target,
            prefix: root.to_path_buf(),
            purelib: site_packages.clone(),
            platlib: site_packages,
            headers,
            scripts,
            data: root.to_path_buf(),
        }
    }

    /// Header directory for one distribution.
    pub fn headers_for(&self, distribution: &str) -> PathBuf {
        self.headers.join(distribution)
    }

    /// Create every root directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        for dir in [
            &self.prefix,
            &self.purelib,
            &self.platlib,
            &self.headers,
            &self.scripts,
            &self.data,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Parse textual target selectors and compute the layout below `root`.
///
/// # Errors
///
/// Returns [`TargetError::UnsupportedPlatform`] for platforms outside the
/// layout table and the interpreter parse errors of [`PythonVersion`].
///
/// [`PythonVersion`]: wheelpack_schema::PythonVersion
pub fn resolve_layout(
    platform: &str,
    python_version: &str,
    root: &Path,
) -> Result<TargetLayout, TargetError> {
    let target = Target::new(platform.parse()?, python_version.parse()?);
    Ok(TargetLayout::resolve(target, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelpack_schema::PythonVersion;

    #[test]
    fn test_resolve_layout_from_selectors() {
        let l = resolve_layout("linux", "36", Path::new("/stage")).unwrap();
        assert_eq!(l.purelib, Path::new("/stage/lib/python3.6/site-packages"));

        assert_eq!(
            resolve_layout("macos", "3.9", Path::new("/stage")),
            Err(TargetError::UnsupportedPlatform("macos".to_string()))
        );
    }

    fn layout(platform: Platform, minor: u8) -> TargetLayout {
        TargetLayout::resolve(
            Target::new(platform, PythonVersion::new(3, minor)),
            Path::new("/stage"),
        )
    }

    #[test]
    fn test_windows_layout() {
        let l = layout(Platform::Windows, 9);
        assert_eq!(l.purelib, Path::new("/stage/Lib/site-packages"));
        assert_eq!(l.platlib, l.purelib);
        assert_eq!(l.headers, Path::new("/stage/Include"));
        assert_eq!(l.scripts, Path::new("/stage/Scripts"));
        assert_eq!(l.data, Path::new("/stage"));
        assert_eq!(l.prefix, Path::new("/stage"));
    }

    #[test]
    fn test_windows_layout_ignores_interpreter() {
        let old = layout(Platform::Windows, 6);
        let new = layout(Platform::Windows, 11);
        assert_eq!(old.purelib, new.purelib);
        assert_eq!(old.headers, new.headers);
    }

    #[test]
    fn test_linux_oldest_interpreter_is_qualified() {
        let l = layout(Platform::Linux, 6);
        assert_eq!(l.purelib, Path::new("/stage/lib/python3.6/site-packages"));
        assert_eq!(l.headers, Path::new("/stage/include/site/python3.6"));
        assert_eq!(l.scripts, Path::new("/stage/bin"));
        assert_eq!(l.data, Path::new("/stage"));
    }

    #[test]
    fn test_linux_newer_interpreter_is_unqualified() {
        let l = layout(Platform::Linux, 9);
        assert_eq!(l.purelib, Path::new("/stage/lib/site-packages"));
        assert_eq!(l.platlib, l.purelib);
        assert_eq!(l.headers, Path::new("/stage/include/site/python3.9"));
        assert_eq!(l.scripts, Path::new("/stage/bin"));
    }

    #[test]
    fn test_resolve_is_pure() {
        assert_eq!(layout(Platform::Linux, 10), layout(Platform::Linux, 10));
        assert_eq!(layout(Platform::Windows, 7), layout(Platform::Windows, 7));
    }

    #[test]
    fn test_headers_for_package() {
        let l = layout(Platform::Linux, 9);
        assert_eq!(
            l.headers_for("greenlet"),
            Path::new("/stage/include/site/python3.9/greenlet")
        );
    }

    #[test]
    fn test_create_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let l = TargetLayout::resolve(
            Target::new(Platform::Linux, PythonVersion::new(3, 9)),
            dir.path(),
        );
        l.create_dirs().unwrap();
        assert!(l.purelib.is_dir());
        assert!(l.headers.is_dir());
        assert!(l.scripts.is_dir());
    }
}
