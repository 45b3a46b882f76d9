//! Layout command

use anyhow::Result;
use crossterm::style::Stylize;
use std::path::Path;
use wheelpack_core::{BundleError, resolve_layout};

/// Print the installation layout for a target below `root`.
pub fn layout(platform: &str, python_version: &str, root: &Path, json: bool) -> Result<()> {
    let layout = resolve_layout(platform, python_version, root).map_err(BundleError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    let lw = 10;
    println!();
    println!("  {}", layout.target.to_string().white().bold());
    println!();
    for (label, path) in [
        ("prefix", &layout.prefix),
        ("purelib", &layout.purelib),
        ("platlib", &layout.platlib),
        ("headers", &layout.headers),
        ("scripts", &layout.scripts),
        ("data", &layout.data),
    ] {
        println!("  {}{}", format!("{label:<lw$}").dark_grey(), path.display());
    }

    Ok(())
}
