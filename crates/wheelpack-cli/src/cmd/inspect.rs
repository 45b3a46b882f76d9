//! Inspect command

use anyhow::Result;
use crossterm::style::Stylize;
use serde::Serialize;
use wheelpack_schema::{ArtifactDescriptor, ArtifactForm};

#[derive(Debug, Serialize)]
struct InspectRow<'a> {
    filename: &'a str,
    #[serde(flatten)]
    descriptor: Option<ArtifactDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Parse each filename and print its identity. Returns `false` if any name
/// could not be parsed.
pub fn inspect(filenames: &[String], json: bool) -> Result<bool> {
    let rows: Vec<InspectRow<'_>> = filenames
        .iter()
        .map(|filename| match ArtifactDescriptor::parse(filename) {
            Ok(d) => InspectRow {
                filename,
                descriptor: Some(d),
                error: None,
            },
            Err(e) => InspectRow {
                filename,
                descriptor: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    let all_ok = rows.iter().all(|r| r.error.is_none());

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(all_ok);
    }

    for row in &rows {
        match (&row.descriptor, &row.error) {
            (Some(d), _) => println!("{}", describe(d)),
            (None, Some(e)) => eprintln!("{} {e}", "ERROR:".red()),
            (None, None) => {}
        }
    }

    Ok(all_ok)
}

fn describe(d: &ArtifactDescriptor) -> String {
    let head = format!("{} {}", d.name.as_str().white().bold(), d.version.as_str().dark_grey());
    match &d.form {
        ArtifactForm::Prebuilt { build_tag, tags } => {
            let build = build_tag
                .as_deref()
                .map(|b| format!(" build {b}"))
                .unwrap_or_default();
            let universal = if tags.is_universal() { " (universal)" } else { "" };
            format!("{head}  {tags}{build}{universal}")
        }
        ArtifactForm::Source => format!("{head}  source"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_reports_failures() {
        let names = vec![
            "six-1.16.0-py2.py3-none-any.whl".to_string(),
            "README.md".to_string(),
        ];
        assert!(!inspect(&names, true).unwrap());
    }

    #[test]
    fn test_inspect_all_valid() {
        let names = vec![
            "numpy-1.26.4-cp39-cp39-manylinux2014_x86_64.whl".to_string(),
            "examplepkg-1.2.3.tar.gz".to_string(),
        ];
        assert!(inspect(&names, false).unwrap());
    }

    #[test]
    fn test_json_row_shape() {
        let d = ArtifactDescriptor::parse("examplepkg-1.2.3-1-py3-none-any.whl").unwrap();
        let row = InspectRow {
            filename: "examplepkg-1.2.3-1-py3-none-any.whl",
            descriptor: Some(d),
            error: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["name"], "examplepkg");
        assert_eq!(value["version"], "1.2.3");
        assert_eq!(value["form"], "prebuilt");
        assert_eq!(value["build_tag"], "1");
        assert_eq!(value["abi"], "none");
        assert!(value.get("error").is_none());
    }
}
