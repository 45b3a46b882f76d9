//! Reporter trait for dependency injection
//!
//! This trait allows the engine to report progress and status without
//! being coupled to a specific terminal implementation.

use wheelpack_schema::ResolvedDependency;

use crate::acquire::AcquiredVia;

/// Progress sink for a bundle run.
pub trait Reporter: Send + Sync {
    /// Indicates a new phase has started (e.g. "Resolving", "Installing").
    fn section(&self, title: &str);

    /// A dependency is about to be acquired.
    fn acquiring(&self, dep: &ResolvedDependency);

    /// A dependency's artifact was obtained.
    fn acquired(&self, dep: &ResolvedDependency, via: AcquiredVia);

    /// A dependency's artifact was installed into the staging tree.
    fn installed(&self, dep: &ResolvedDependency, files: usize);

    /// A dependency could not be acquired or installed.
    fn failed(&self, dep: &ResolvedDependency, reason: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Display a final summary.
    fn summary(&self, packages: usize, files: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for &T {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn acquiring(&self, dep: &ResolvedDependency) {
        (**self).acquiring(dep);
    }
    fn acquired(&self, dep: &ResolvedDependency, via: AcquiredVia) {
        (**self).acquired(dep, via);
    }
    fn installed(&self, dep: &ResolvedDependency, files: usize) {
        (**self).installed(dep, files);
    }
    fn failed(&self, dep: &ResolvedDependency, reason: &str) {
        (**self).failed(dep, reason);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn summary(&self, packages: usize, files: usize, elapsed_secs: f64) {
        (**self).summary(packages, files, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn acquiring(&self, _: &ResolvedDependency) {}
    fn acquired(&self, _: &ResolvedDependency, _: AcquiredVia) {}
    fn installed(&self, _: &ResolvedDependency, _: usize) {}
    fn failed(&self, _: &ResolvedDependency, _: &str) {}
    fn warning(&self, _: &str) {}
    fn summary(&self, _: usize, _: usize, _: f64) {}
}
