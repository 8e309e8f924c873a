//! Source tracking: file handles, dependency discovery and change detection.

mod changes;
mod discover;
mod file;

pub use changes::ChangeDetector;
pub use discover::{DEFAULT_EXTENSIONS, DependencyDiscoverer, DependencySet};
pub use file::{FileStamp, ROOT_MODULE, SourceFile};

#[cfg(test)]
pub(crate) use file::test_support;
