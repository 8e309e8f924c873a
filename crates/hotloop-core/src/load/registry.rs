//! In-process program registry.
//!
//! Hosts that link their programs statically register them by type name.
//! The loader still validates, discovers and locates from source, so edits
//! and broken files drive the reload loop exactly as with compiled units;
//! only the code that runs comes from the host binary.

use hotloop::{Entry, Program};
use rustc_hash::FxHashMap;

use super::backend::{BuildRequest, LoadedProgram, ProgramBackend};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone)]
pub struct ProgramRegistry {
    entries: FxHashMap<String, Entry>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `P` under `name`, the type name used in source.
    pub fn register<P: Program>(&mut self, name: &'static str) -> &mut Self {
        self.register_entry(Entry::of::<P>(name))
    }

    /// Builder form of [`ProgramRegistry::register`].
    pub fn with<P: Program>(mut self, name: &'static str) -> Self {
        self.register::<P>(name);
        self
    }

    /// Register a prebuilt entry table; replaces any entry of the same name.
    pub fn register_entry(&mut self, entry: Entry) -> &mut Self {
        if self.entries.insert(entry.name.to_string(), entry).is_some() {
            tracing::debug!("Replaced registered program `{}`", entry.name);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ProgramBackend for ProgramRegistry {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn build(&mut self, request: &BuildRequest<'_>) -> Result<LoadedProgram> {
        let name = &request.program.name;
        match self.entries.get(name) {
            Some(entry) => Ok(LoadedProgram {
                entry: *entry,
                unit: None,
            }),
            None => Err(Error::load_failure(
                name,
                format!("`{name}` is not registered (known: {})", self.names().join(", ")),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotloop::prelude::*;

    struct Pong;

    impl Program for Pong {
        fn new() -> Self {
            Pong
        }

        fn update(&mut self, _frame: &Frame<'_>) -> UpdateResult {
            Ok(None)
        }
    }

    #[test]
    fn test_register_and_names() {
        let registry = ProgramRegistry::new().with::<Pong>("Pong").with::<Pong>("Ping");
        assert!(registry.contains("Pong"));
        assert!(!registry.contains("Tetris"));
        assert_eq!(registry.names(), vec!["Ping", "Pong"]);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ProgramRegistry::new();
        registry.register::<Pong>("Pong").register::<Pong>("Pong");
        assert_eq!(registry.names().len(), 1);
    }
}
