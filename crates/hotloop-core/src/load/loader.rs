//! Program loader: from an entry path to a fresh program instance.

use std::path::{Path, PathBuf};

use hotloop::{Entry, Snapshot};

use super::backend::{BuildRequest, LoadedProgram, ProgramBackend};
use super::locate::{ProgramDecl, locate_program};
use crate::error::{Error, Result};
use crate::runtime::ProgramInstance;
use crate::source::{DependencyDiscoverer, DependencySet, ROOT_MODULE, SourceFile};

/// A successful load.
#[derive(Debug)]
pub struct Loaded {
    pub instance: ProgramInstance,
    pub deps: DependencySet,
}

/// Validates, discovers, locates, builds and instantiates programs.
///
/// Loading never touches the caller's state; the new instance and its
/// dependency set are only handed back on success.
pub struct ProgramLoader {
    backend: Box<dyn ProgramBackend>,
    discoverer: DependencyDiscoverer,
    attempted: Vec<PathBuf>,
}

impl ProgramLoader {
    pub fn new(backend: impl ProgramBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            discoverer: DependencyDiscoverer::default(),
            attempted: Vec::new(),
        }
    }

    pub fn with_discoverer(mut self, discoverer: DependencyDiscoverer) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Files discovered by the most recent load, successful or not.
    pub fn attempted_paths(&self) -> &[PathBuf] {
        &self.attempted
    }

    /// Load the program rooted at `entry_path`.
    ///
    /// `previous` is the instance being replaced; when the new program
    /// overrides `from_instance`, it is built from the previous instance's
    /// snapshot.
    pub fn load(&mut self, entry_path: &Path, previous: Option<&ProgramInstance>) -> Result<Loaded> {
        tracing::info!("Setting up program from {}", entry_path.display());
        self.attempted.clear();

        let Inspection {
            program,
            deps,
            source,
            ast,
        } = inspect_with(entry_path, &self.discoverer, &mut self.attempted)?;
        tracing::info!("Found program `{}` at line {}", program.name, program.line);
        if let Some(previous) = previous {
            tracing::debug!("Replacing program `{}`", previous.name());
        }

        let loaded = self.backend.build(&BuildRequest {
            deps: &deps,
            entry_source: &source,
            entry_ast: &ast,
            program: &program,
        })?;

        let instance = instantiate(&program, loaded, previous)?;
        Ok(Loaded { instance, deps })
    }
}

/// What a program looks like before anything is built.
pub struct Inspection {
    pub program: ProgramDecl,
    pub deps: DependencySet,
    source: String,
    ast: syn::File,
}

impl Inspection {
    /// The entry file's source text.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Validate and discover the program at `entry_path` and locate its type.
///
/// Runs every step of a load that needs no toolchain.
pub fn inspect(entry_path: &Path) -> Result<Inspection> {
    inspect_with(entry_path, &DependencyDiscoverer::default(), &mut Vec::new())
}

fn inspect_with(
    entry_path: &Path,
    discoverer: &DependencyDiscoverer,
    attempted: &mut Vec<PathBuf>,
) -> Result<Inspection> {
    let (entry, source, ast) = SourceFile::load_with_source(entry_path, ROOT_MODULE)?;

    let deps = discoverer.discover_parsed(entry, &ast)?;
    tracing::debug!("Tracking {} file(s)", deps.len());
    *attempted = deps.paths().map(Path::to_path_buf).collect();

    let program =
        locate_program(&ast).ok_or_else(|| Error::ProgramNotFound(deps.entry().path().to_path_buf()))?;
    Ok(Inspection {
        program,
        deps,
        source,
        ast,
    })
}

fn instantiate(
    program: &ProgramDecl,
    loaded: LoadedProgram,
    previous: Option<&ProgramInstance>,
) -> Result<ProgramInstance> {
    let LoadedProgram { entry, unit } = loaded;
    let name = program.name.as_str();

    if entry.abi_version != hotloop::ABI_VERSION {
        return Err(Error::load_failure(
            name,
            format!(
                "entry has ABI version {}, expected {}",
                entry.abi_version,
                hotloop::ABI_VERSION
            ),
        ));
    }

    let config = (entry.config)().map_err(|e| Error::load_failure(name, e))?;
    config.validate().map_err(|e| Error::load_failure(name, e))?;

    let snapshot = match previous {
        Some(previous) if program.continuation => previous.snapshot(),
        _ => None,
    };
    let object = construct(&entry, snapshot).map_err(|e| Error::load_failure(name, e))?;

    Ok(ProgramInstance::new(name, config, object, unit))
}

fn construct(
    entry: &Entry,
    snapshot: Option<Snapshot>,
) -> std::result::Result<Box<dyn hotloop::ProgramObject>, String> {
    match snapshot {
        Some(snapshot) => {
            tracing::debug!("Continuing `{}` from the previous instance", entry.name);
            (entry.resume)(snapshot)
        }
        None => (entry.construct)(),
    }
}
