//! Deployment target selectors.
//!
//! A bundle is built for a [`Target`]: an operating system family plus a
//! `CPython` minor version. Neither has to match the build host.
//!
//! # Example
//!
//! ```
//! use wheelpack_schema::{Platform, PythonVersion, Target};
//!
//! let target = Target::new(Platform::Linux, "3.9".parse().unwrap());
//! assert_eq!(target.python.abi_tag(), "cp39");
//! assert_eq!(target.to_string(), "linux/3.9");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing target selectors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The platform is not one of the known layouts.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The interpreter version string could not be parsed.
    #[error("invalid python version '{0}': expected MAJOR.MINOR (e.g. 3.9) or MAJORMINOR (e.g. 39)")]
    InvalidPythonVersion(String),

    /// The interpreter version parsed but is outside the supported range.
    #[error("unsupported python version {0}: the oldest supported version is {oldest}", oldest = PythonVersion::OLDEST_SUPPORTED)]
    UnsupportedPythonVersion(PythonVersion),
}

/// Operating system family the bundle is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux (manylinux wheels).
    Linux,
    /// Windows (`win_amd64` wheels).
    Windows,
}

impl Platform {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Wheel platform tags accepted for this target, most specific first.
    pub fn platform_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Linux => &[
                "manylinux2014_x86_64",
                "manylinux2010_x86_64",
                "manylinux1_x86_64",
            ],
            Self::Windows => &["win_amd64"],
        }
    }

    /// Whether installed scripts need the executable permission bit.
    pub fn marks_scripts_executable(&self) -> bool {
        !matches!(self, Self::Windows)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            _ => Err(TargetError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// A `CPython` `major.minor` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PythonVersion {
    /// Major version (always 3 for supported targets).
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl PythonVersion {
    /// Oldest interpreter a bundle can target. Its Linux layout is
    /// interpreter-qualified (`lib/python3.6/site-packages`).
    pub const OLDEST_SUPPORTED: Self = Self { major: 3, minor: 6 };

    /// Create a version without range checks.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// `3.9`
    pub fn dotted(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// `39`, the form pip's `--python-version` and tag names use.
    pub fn nodot(&self) -> String {
        format!("{}{}", self.major, self.minor)
    }

    /// ABI tag of the stock `CPython` build, e.g. `cp39`.
    pub fn abi_tag(&self) -> String {
        format!("cp{}", self.nodot())
    }

    /// Interpreter executable name as laid out on POSIX, e.g. `python3.9`.
    pub fn executable_name(&self) -> String {
        format!("python{}", self.dotted())
    }

    /// Whether this is the oldest supported minor version.
    pub fn is_oldest_supported(&self) -> bool {
        *self == Self::OLDEST_SUPPORTED
    }
}

impl std::fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl std::str::FromStr for PythonVersion {
    type Err = TargetError;

    /// Accepts `3.9`, `3.10`, `39` and `310`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TargetError::InvalidPythonVersion(s.to_string());
        let trimmed = s.trim();

        let (major, minor) = if let Some((major, minor)) = trimmed.split_once('.') {
            (major, minor)
        } else if trimmed.len() >= 2 && trimmed.is_ascii() {
            trimmed.split_at(1)
        } else {
            return Err(invalid());
        };

        if major.is_empty()
            || minor.is_empty()
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let version = Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        };

        if version.major != Self::OLDEST_SUPPORTED.major || version < Self::OLDEST_SUPPORTED {
            return Err(TargetError::UnsupportedPythonVersion(version));
        }
        Ok(version)
    }
}

/// The platform/interpreter pair a bundle is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Deployment operating system.
    pub platform: Platform,
    /// Deployment interpreter version.
    pub python: PythonVersion,
}

impl Target {
    /// Create a new target.
    pub fn new(platform: Platform, python: PythonVersion) -> Self {
        Self { platform, python }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.platform, self.python)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!("linux".parse::<Platform>(), Ok(Platform::Linux));
        assert_eq!("Windows".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!(
            "darwin".parse::<Platform>(),
            Err(TargetError::UnsupportedPlatform("darwin".to_string()))
        );
    }

    #[test]
    fn test_python_version_forms() {
        assert_eq!("3.9".parse::<PythonVersion>(), Ok(PythonVersion::new(3, 9)));
        assert_eq!("39".parse::<PythonVersion>(), Ok(PythonVersion::new(3, 9)));
        assert_eq!("3.10".parse::<PythonVersion>(), Ok(PythonVersion::new(3, 10)));
        assert_eq!("310".parse::<PythonVersion>(), Ok(PythonVersion::new(3, 10)));
        assert_eq!("36".parse::<PythonVersion>(), Ok(PythonVersion::OLDEST_SUPPORTED));
    }

    #[test]
    fn test_python_version_rejects_garbage() {
        for input in ["", "3", "3.", ".9", "three.nine", "3.9.1", "3-9"] {
            assert!(
                matches!(
                    input.parse::<PythonVersion>(),
                    Err(TargetError::InvalidPythonVersion(_))
                ),
                "{input} should be invalid"
            );
        }
    }

    #[test]
    fn test_python_version_rejects_unsupported() {
        assert_eq!(
            "3.5".parse::<PythonVersion>(),
            Err(TargetError::UnsupportedPythonVersion(PythonVersion::new(3, 5)))
        );
        assert_eq!(
            "2.7".parse::<PythonVersion>(),
            Err(TargetError::UnsupportedPythonVersion(PythonVersion::new(2, 7)))
        );
    }

    #[test]
    fn test_derived_tags() {
        let v = PythonVersion::new(3, 11);
        assert_eq!(v.nodot(), "311");
        assert_eq!(v.abi_tag(), "cp311");
        assert_eq!(v.executable_name(), "python3.11");
        assert!(!v.is_oldest_supported());
        assert!(PythonVersion::new(3, 6).is_oldest_supported());
    }

    #[test]
    fn test_scripts_executable_only_off_windows() {
        assert!(Platform::Linux.marks_scripts_executable());
        assert!(!Platform::Windows.marks_scripts_executable());
    }
}
