//! Artifact filename parsing.
//!
//! Installable artifacts carry their identity in their filename. Wheels
//! follow `{name}-{version}[-{build}]-{interpreter}-{abi}-{platform}.whl`;
//! source distributions are `{name}-{version}` plus an archive extension and
//! carry no interpreter, ABI or platform identity.
//!
//! # Example
//!
//! ```
//! use wheelpack_schema::ArtifactDescriptor;
//!
//! let wheel = ArtifactDescriptor::parse("six-1.16.0-py2.py3-none-any.whl").unwrap();
//! assert!(wheel.is_universal());
//!
//! let sdist = ArtifactDescriptor::parse("PyYAML-6.0.1.tar.gz").unwrap();
//! assert!(sdist.is_source());
//! assert_eq!(sdist.version.as_str(), "6.0.1");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PackageName, Version};
use crate::{SOURCE_EXTENSIONS, WHEEL_EXTENSION};

/// Errors returned by [`ArtifactDescriptor::parse`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The filename has neither a wheel nor a source-archive extension.
    #[error("unrecognized artifact extension: {0}")]
    UnknownExtension(String),

    /// The filename has a known extension but does not fit its naming shape.
    #[error("malformed artifact filename '{filename}': {reason}")]
    Malformed {
        /// The offending filename.
        filename: String,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// Compatibility tags of a prebuilt wheel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WheelTags {
    /// Interpreter tag, e.g. `cp39` or `py2.py3`.
    pub interpreter: String,
    /// ABI tag, e.g. `cp39`, `abi3` or `none`.
    pub abi: String,
    /// Platform tag, e.g. `manylinux1_x86_64` or `any`.
    pub platform: String,
}

impl WheelTags {
    /// A universal wheel is interpreter-ABI independent and runs on any platform.
    pub fn is_universal(&self) -> bool {
        self.abi == "none" && self.platform == "any"
    }
}

impl std::fmt::Display for WheelTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// Which shape an artifact filename had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum ArtifactForm {
    /// A wheel: directly installable, tagged for a platform/interpreter.
    Prebuilt {
        /// Optional build number segment.
        #[serde(skip_serializing_if = "Option::is_none")]
        build_tag: Option<String>,
        /// Compatibility tags.
        #[serde(flatten)]
        tags: WheelTags,
    },
    /// A source archive: needs building before it can be installed.
    Source,
}

/// Identity parsed from an artifact filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Distribution name exactly as it appears in the filename.
    pub name: String,
    /// Version segment.
    pub version: Version,
    /// Wheel tags, or the source-form marker.
    #[serde(flatten)]
    pub form: ArtifactForm,
}

impl ArtifactDescriptor {
    /// Parse an artifact filename. Directory components are not accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownExtension`] for anything that is neither a
    /// wheel nor a `.tar.gz`/`.tgz`/`.zip` archive, and [`ParseError::Malformed`]
    /// when the segments do not fit the expected shape.
    pub fn parse(filename: &str) -> Result<Self, ParseError> {
        if let Some(stem) = strip_suffix_ignore_case(filename, WHEEL_EXTENSION) {
            return parse_wheel(filename, stem);
        }

        for ext in SOURCE_EXTENSIONS {
            if let Some(stem) = strip_suffix_ignore_case(filename, ext) {
                return parse_source(filename, stem);
            }
        }

        Err(ParseError::UnknownExtension(filename.to_string()))
    }

    /// Normalized package name for comparisons.
    pub fn package_name(&self) -> PackageName {
        PackageName::new(&self.name)
    }

    /// Wheel tags, if this is a prebuilt artifact.
    pub fn tags(&self) -> Option<&WheelTags> {
        match &self.form {
            ArtifactForm::Prebuilt { tags, .. } => Some(tags),
            ArtifactForm::Source => None,
        }
    }

    /// Returns `true` for wheels.
    pub fn is_prebuilt(&self) -> bool {
        matches!(self.form, ArtifactForm::Prebuilt { .. })
    }

    /// Returns `true` for source archives.
    pub fn is_source(&self) -> bool {
        matches!(self.form, ArtifactForm::Source)
    }

    /// Returns `true` for wheels whose tags are the universal markers.
    pub fn is_universal(&self) -> bool {
        self.tags().is_some_and(WheelTags::is_universal)
    }

    /// Re-derive the wheel filename from the parsed fields.
    ///
    /// Returns `None` for source-form descriptors.
    pub fn wheel_filename(&self) -> Option<String> {
        match &self.form {
            ArtifactForm::Prebuilt { build_tag, tags } => {
                let build = build_tag
                    .as_deref()
                    .map(|b| format!("-{b}"))
                    .unwrap_or_default();
                Some(format!(
                    "{}-{}{build}-{tags}{WHEEL_EXTENSION}",
                    self.name, self.version
                ))
            }
            ArtifactForm::Source => None,
        }
    }

    /// Archive directory holding installed-package metadata: `{name}-{version}.dist-info`.
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.name, self.version)
    }

    /// Archive directory holding scripts, headers and data: `{name}-{version}.data`.
    pub fn data_dir(&self) -> String {
        format!("{}-{}.data", self.name, self.version)
    }
}

impl std::str::FromStr for ArtifactDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

fn starts_with_digit(segment: &str) -> bool {
    segment.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

fn parse_wheel(filename: &str, stem: &str) -> Result<ArtifactDescriptor, ParseError> {
    let malformed = |reason| ParseError::Malformed {
        filename: filename.to_string(),
        reason,
    };

    let parts: Vec<&str> = stem.split('-').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(malformed("empty segment"));
    }

    // The build tag is the only optional segment and always starts with a digit;
    // interpreter tags never do.
    let (build_tag, tag_start) = match parts.len() {
        5 if !starts_with_digit(parts[2]) => (None, 2),
        6 if starts_with_digit(parts[2]) => (Some(parts[2].to_string()), 3),
        5 => return Err(malformed("interpreter tag cannot start with a digit")),
        6 => return Err(malformed("build tag must start with a digit")),
        _ => return Err(malformed("expected 5 or 6 dash-separated segments")),
    };

    Ok(ArtifactDescriptor {
        name: parts[0].to_string(),
        version: Version::new(parts[1]),
        form: ArtifactForm::Prebuilt {
            build_tag,
            tags: WheelTags {
                interpreter: parts[tag_start].to_string(),
                abi: parts[tag_start + 1].to_string(),
                platform: parts[tag_start + 2].to_string(),
            },
        },
    })
}

fn parse_source(filename: &str, stem: &str) -> Result<ArtifactDescriptor, ParseError> {
    // Names may contain dashes; the version never does.
    match stem.rsplit_once('-') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok(ArtifactDescriptor {
                name: name.to_string(),
                version: Version::new(version),
                form: ArtifactForm::Source,
            })
        }
        _ => Err(ParseError::Malformed {
            filename: filename.to_string(),
            reason: "expected {name}-{version} before the archive extension",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_five_segment_wheel() {
        let d = ArtifactDescriptor::parse("examplepkg-1.2.3-py3-none-any.whl").unwrap();
        assert_eq!(d.name, "examplepkg");
        assert_eq!(d.version, "1.2.3");
        let tags = d.tags().unwrap();
        assert_eq!(tags.interpreter, "py3");
        assert_eq!(tags.abi, "none");
        assert_eq!(tags.platform, "any");
        assert!(d.is_universal());
        assert!(d.is_prebuilt());
    }

    #[test]
    fn test_parse_wheel_with_build_tag() {
        let d = ArtifactDescriptor::parse("numpy-1.26.4-1build-cp39-cp39-manylinux1_x86_64.whl")
            .unwrap();
        match &d.form {
            ArtifactForm::Prebuilt { build_tag, tags } => {
                assert_eq!(build_tag.as_deref(), Some("1build"));
                assert_eq!(tags.interpreter, "cp39");
                assert_eq!(tags.abi, "cp39");
                assert_eq!(tags.platform, "manylinux1_x86_64");
            }
            ArtifactForm::Source => panic!("expected a wheel"),
        }
        assert!(!d.is_universal());
    }

    #[test]
    fn test_wheel_filename_round_trip() {
        for name in [
            "examplepkg-1.2.3-py3-none-any.whl",
            "cffi-1.16.0-cp39-cp39-win_amd64.whl",
            "six-1.16.0-py2.py3-none-any.whl",
            "pkg-0.1-2-cp310-abi3-manylinux2014_x86_64.whl",
        ] {
            let d = ArtifactDescriptor::parse(name).unwrap();
            assert_eq!(d.wheel_filename().as_deref(), Some(name));
        }
    }

    #[test]
    fn test_parse_source_archives() {
        for (file, name, version) in [
            ("PyYAML-6.0.1.tar.gz", "PyYAML", "6.0.1"),
            ("python-dateutil-2.8.2.tgz", "python-dateutil", "2.8.2"),
            ("azure-functions-1.0.0b1.zip", "azure-functions", "1.0.0b1"),
        ] {
            let d = ArtifactDescriptor::parse(file).unwrap();
            assert!(d.is_source(), "{file}");
            assert!(d.tags().is_none());
            assert_eq!(d.name, name);
            assert_eq!(d.version, version);
            assert!(d.wheel_filename().is_none());
        }
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert!(ArtifactDescriptor::parse("Foo-1.0.TAR.GZ").unwrap().is_source());
        assert!(ArtifactDescriptor::parse("foo-1.0-py3-none-any.WHL").unwrap().is_prebuilt());
    }

    #[test]
    fn test_malformed_names() {
        for bad in [
            "foo-1.0-any.whl",
            "foo-1.0-py3--any.whl",
            "foo-1.0-3py-none-any.whl",
            "foo-1.0-build-py3-none-any.whl",
            "a-b-c-d-e-f-g.whl",
            "foo.tar.gz",
            "-1.0.tar.gz",
            "foo-.zip",
        ] {
            assert!(
                matches!(
                    ArtifactDescriptor::parse(bad),
                    Err(ParseError::Malformed { .. })
                ),
                "{bad} should be malformed"
            );
        }
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            ArtifactDescriptor::parse("foo-1.0.egg"),
            Err(ParseError::UnknownExtension("foo-1.0.egg".to_string()))
        );
    }

    #[test]
    fn test_metadata_dirs() {
        let d = ArtifactDescriptor::parse("my_pkg-2.0-py3-none-any.whl").unwrap();
        assert_eq!(d.dist_info_dir(), "my_pkg-2.0.dist-info");
        assert_eq!(d.data_dir(), "my_pkg-2.0.data");
        assert_eq!(d.package_name().as_str(), "my-pkg");
    }
}
