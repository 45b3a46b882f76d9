//! Package identities: names, versions, requirements and resolved pins.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A normalized distribution name.
///
/// Names compare case-insensitively and treat runs of `-`, `_` and `.` as a
/// single `-`, so `Typing_Extensions` and `typing-extensions` are the same
/// package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input.
    pub fn new(name: &str) -> Self {
        let mut normalized = String::with_capacity(name.len());
        let mut in_separator = false;
        for c in name.trim().chars() {
            if matches!(c, '-' | '_' | '.') {
                if !in_separator {
                    normalized.push('-');
                }
                in_separator = true;
            } else {
                normalized.push(c.to_ascii_lowercase());
                in_separator = false;
            }
        }
        Self(normalized)
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        *self == Self::new(other)
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        *self == Self::new(other)
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A distribution version string, stored exactly as the index reported it.
///
/// Python versions are not semver, so no ordering is implied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One requirement line from a manifest: a name plus an optional constraint.
///
/// The constraint is kept verbatim (`==1.2.3`, `>=2,<3`, `; python_version < "3.8"`)
/// because range resolution belongs to the upstream resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Distribution name.
    pub name: PackageName,
    /// Extras requested in brackets, e.g. `requests[socks]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    /// Version constraint and environment marker text, if any.
    pub constraint: Option<String>,
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(constraint) = &self.constraint {
            write!(f, "{constraint}")?;
        }
        Ok(())
    }
}

/// An exact `(name, version)` pair produced by dependency enumeration.
///
/// Identifies exactly one artifact to acquire for the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolvedDependency {
    /// Distribution name.
    pub name: PackageName,
    /// Exact version chosen by the resolver.
    pub version: Version,
}

impl ResolvedDependency {
    /// Create a new resolved dependency.
    pub fn new(name: impl Into<PackageName>, version: impl Into<Version>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Pinned requirement string understood by pip, e.g. `requests==2.31.0`.
    pub fn pinned(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }
}

impl std::fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_normalization() {
        assert_eq!(PackageName::new("Typing_Extensions").as_str(), "typing-extensions");
        assert_eq!(PackageName::new("zope.interface").as_str(), "zope-interface");
        assert_eq!(PackageName::new("a__-.b").as_str(), "a-b");
        assert_eq!(PackageName::new("  Django ").as_str(), "django");
    }

    #[test]
    fn test_package_name_eq_str_normalizes() {
        let name = PackageName::new("typing-extensions");
        assert!(name == "typing_extensions");
        assert!(name == "Typing.Extensions");
        assert!(name != "typing");
    }

    #[test]
    fn test_pinned_requirement() {
        let dep = ResolvedDependency::new("Requests", "2.31.0");
        assert_eq!(dep.pinned(), "requests==2.31.0");
        assert_eq!(dep.to_string(), "requests-2.31.0");
    }

    #[test]
    fn test_requirement_display() {
        let req = Requirement {
            name: PackageName::new("requests"),
            extras: vec!["socks".to_string()],
            constraint: Some(">=2.0".to_string()),
        };
        assert_eq!(req.to_string(), "requests[socks]>=2.0");
    }
}
