//! Terminal reporter
//!
//! Progress goes to stderr so that stdout stays free for command output.

use crossterm::style::Stylize;
use wheelpack_core::{AcquiredVia, Reporter};
use wheelpack_schema::ResolvedDependency;

/// Plain line-oriented reporter for interactive and CI use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{msg}");
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        self.line(&format!("{} {}", "==>".cyan().bold(), title.bold()));
    }

    fn acquiring(&self, dep: &ResolvedDependency) {
        self.line(&format!(
            "  {} {}",
            dep.name.as_str().white(),
            dep.version.as_str().dark_grey()
        ));
    }

    fn acquired(&self, _dep: &ResolvedDependency, via: AcquiredVia) {
        self.line(&format!("    {}", via.to_string().dark_grey()));
    }

    fn installed(&self, dep: &ResolvedDependency, files: usize) {
        self.line(&format!(
            "  {} {} {}",
            "✓".green(),
            dep.name.as_str(),
            format!("({files} files)").dark_grey()
        ));
    }

    fn failed(&self, dep: &ResolvedDependency, _reason: &str) {
        // The reason is printed once, by the top-level error handler.
        eprintln!("  {} {} {}", "✗".red(), dep.name.as_str(), dep.version.as_str());
    }

    fn warning(&self, msg: &str) {
        eprintln!("{} {msg}", "warning:".yellow().bold());
    }

    fn summary(&self, packages: usize, files: usize, elapsed_secs: f64) {
        self.line(&format!(
            "{} {packages} packages, {files} files in {elapsed_secs:.1}s",
            "Bundled".green().bold()
        ));
    }
}
