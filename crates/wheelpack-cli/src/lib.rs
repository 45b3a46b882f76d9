//! wheelpack - bundle Python dependencies for a target platform
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Packs the third-party dependencies of a Python application into a
//! self-contained directory for a target platform and interpreter, which
//! may differ from the build host.
//!
//! # Output Layout
//!
//! ```text
//! <app>/.python_packages/
//! ├── lib/site-packages/           # importable modules (Linux, 3.7+)
//! ├── lib/python3.6/site-packages/ # importable modules (Linux, 3.6)
//! ├── Lib/site-packages/           # importable modules (Windows)
//! ├── bin/ or Scripts/             # console scripts
//! └── include/...                  # C headers, one directory per package
//! ```

pub mod cmd;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "wheelpack")]
#[command(
    author,
    version,
    about = "wheelpack - bundle Python dependencies for a target platform"
)]
pub struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bundle an application's dependencies into its packages directory
    Pack(PackArgs),
    /// Parse artifact filenames and print their identity
    Inspect {
        /// Wheel or source archive filenames
        #[arg(required = true)]
        filenames: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the installation layout for a target
    Layout {
        /// Target platform (linux, windows)
        #[arg(long)]
        platform: String,
        /// Target interpreter version (e.g. 3.9 or 39)
        #[arg(long)]
        python_version: String,
        /// Prefix the layout is computed below
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

// The target selectors are optional here so that a missing one is reported
// as a configuration error rather than a usage error.
#[derive(Debug, Args)]
pub struct PackArgs {
    /// Path to the application to pack
    pub app_path: PathBuf,
    /// Target platform (linux, windows)
    #[arg(long)]
    pub platform: Option<String>,
    /// Target interpreter version (e.g. 3.9 or 39)
    #[arg(long)]
    pub python_version: Option<String>,
    /// Directory inside the application to write packages to [default: .python_packages]
    #[arg(long)]
    pub packages_dir_name: Option<String>,
    /// Skip dependency bundling entirely
    #[arg(long)]
    pub no_deps: bool,
    /// Show pip output and debug logging
    #[arg(short, long)]
    pub verbose: bool,
    /// Python interpreter that drives pip
    #[arg(long)]
    pub python: Option<PathBuf>,
    /// Package index URL
    #[arg(long)]
    pub index_url: Option<String>,
    /// Read configuration from this file only
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pack_selectors_are_optional() {
        let cli = Cli::try_parse_from(["wheelpack", "pack", "app"]).unwrap();
        match cli.command {
            Commands::Pack(args) => {
                assert_eq!(args.app_path, PathBuf::from("app"));
                assert!(args.platform.is_none());
                assert!(args.python_version.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_pack_flags() {
        let cli = Cli::try_parse_from([
            "wheelpack",
            "pack",
            "app",
            "--platform",
            "linux",
            "--python-version",
            "39",
            "--packages-dir-name",
            "deps",
            "--no-deps",
            "-v",
        ])
        .unwrap();
        let Commands::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(args.platform.as_deref(), Some("linux"));
        assert_eq!(args.python_version.as_deref(), Some("39"));
        assert_eq!(args.packages_dir_name.as_deref(), Some("deps"));
        assert!(args.no_deps);
        assert!(args.verbose);
    }
}
