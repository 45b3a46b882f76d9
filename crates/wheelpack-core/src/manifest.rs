//! Requirements manifest parsing.
//!
//! A manifest is a pip-style requirements file: one requirement per line,
//! `#` comments, backslash line continuations, and `-`-prefixed option lines
//! (`-r other.txt`, `--index-url …`) that are kept for the resolver but are
//! not requirements themselves.
//!
//! Direct references (local paths, archive files, URLs and VCS links such as
//! `git+https://…`) are passed through verbatim too; only the resolver knows
//! which package they name.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use wheelpack_schema::{PackageName, Requirement, SOURCE_EXTENSIONS, WHEEL_EXTENSION};

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[(?P<extras>[^\]]*)\])?\s*(?P<rest>.*)$",
    )
    .unwrap_or_else(|e| unreachable!("requirement pattern is valid: {e}"))
});

// `https://`, `git+ssh://`, `file:`, and Windows drive paths.
static DIRECT_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://|file:|[A-Za-z]:[\\/])")
        .unwrap_or_else(|e| unreachable!("direct reference pattern is valid: {e}"))
});

/// Errors raised while loading a manifest. All of them are configuration
/// errors: the input the operator supplied is missing or unusable.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("missing {}. If you do not have any requirements, please pass --no-deps.", .0.display())]
    Missing(PathBuf),

    /// The manifest exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line is neither a requirement, an option nor a direct reference.
    #[error("{}:{line}: invalid requirement '{content}'", path.display())]
    InvalidLine {
        /// Manifest path.
        path: PathBuf,
        /// 1-based line number of the first physical line.
        line: usize,
        /// The offending line, comments stripped.
        content: String,
    },
}

/// A parsed requirements manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Where the manifest was read from. The resolver reads the file itself.
    pub path: PathBuf,
    /// Requirement lines, in file order.
    pub requirements: Vec<Requirement>,
    /// Option lines (starting with `-`), kept verbatim.
    pub options: Vec<String>,
    /// Direct references (paths, archives, URLs, VCS links), kept verbatim.
    pub references: Vec<String>,
}

impl Manifest {
    /// Load and parse a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Missing`] if the file does not exist, and
    /// [`ManifestError::InvalidLine`] for the first line that is not a
    /// requirement, comment, option or direct reference.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::Missing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, &content)
    }

    /// Parse manifest text. `path` is only used for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidLine`] for malformed requirement lines.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let mut requirements = Vec::new();
        let mut options = Vec::new();
        let mut references = Vec::new();

        for (line_no, line) in logical_lines(content) {
            let line = strip_comment(&line).trim().to_string();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('-') {
                options.push(line);
                continue;
            }

            if is_direct_reference(&line) {
                references.push(line);
                continue;
            }

            let requirement =
                parse_requirement(&line).ok_or_else(|| ManifestError::InvalidLine {
                    path: path.to_path_buf(),
                    line: line_no,
                    content: line.clone(),
                })?;
            requirements.push(requirement);
        }

        tracing::debug!(
            "Parsed {} requirements ({} option lines, {} direct references) from {}",
            requirements.len(),
            options.len(),
            references.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            requirements,
            options,
            references,
        })
    }

    /// Returns `true` if the manifest declares no requirements and no
    /// direct references.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.references.is_empty()
    }
}

/// Join backslash continuations, yielding each logical line with the
/// 1-based number of its first physical line.
fn logical_lines(content: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (idx, raw) in content.lines().enumerate() {
        let (start, mut buf) = pending.take().unwrap_or((idx + 1, String::new()));
        if let Some(head) = raw.strip_suffix('\\') {
            buf.push_str(head);
            pending = Some((start, buf));
        } else {
            buf.push_str(raw);
            lines.push((start, buf));
        }
    }
    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

/// A `#` starts a comment at the beginning of a line or after whitespace.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    line.char_indices()
        .find(|&(i, c)| c == '#' && line[..i].ends_with(char::is_whitespace))
        .map_or(line, |(i, _)| &line[..i])
}

/// Paths, archive files and URLs. `name @ url` is a named requirement and
/// is handled by [`parse_requirement`].
fn is_direct_reference(line: &str) -> bool {
    if line.starts_with(['.', '/', '\\', '~']) || DIRECT_REFERENCE_RE.is_match(line) {
        return true;
    }

    // A bare archive filename relative to the working directory.
    let target = line.split(';').next().unwrap_or(line).trim_end();
    !target.contains(|c: char| c == '@' || c.is_whitespace())
        && (target.ends_with(WHEEL_EXTENSION)
            || SOURCE_EXTENSIONS.iter().any(|ext| target.ends_with(ext)))
}

fn parse_requirement(line: &str) -> Option<Requirement> {
    let caps = REQUIREMENT_RE.captures(line)?;
    let rest = caps.name("rest").map_or("", |m| m.as_str().trim());

    if !rest.is_empty() && !rest.starts_with(['=', '<', '>', '!', '~', ';', '@']) {
        return None;
    }

    let extras = caps
        .name("extras")
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Requirement {
        name: PackageName::new(&caps["name"]),
        extras,
        constraint: (!rest.is_empty()).then(|| rest.to_string()),
    })
}
