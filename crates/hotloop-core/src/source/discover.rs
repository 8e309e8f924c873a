//! Dependency discovery through `mod` declarations.
//!
//! Starting from the entry file, every `mod name;` is resolved to a file the
//! way rustc resolves it, and every resolved file is opened, validated and
//! scanned in turn. The result is the set of files a change to which must
//! trigger a reload.
//!
//! Resolution rules:
//!
//! - Files that own their directory ("mod-rs" files: the entry, any
//!   `mod.rs`, and files reached through `#[path]`) look for children next
//!   to themselves. Other files look in a directory named after their stem.
//! - Inline `mod a { ... }` blocks extend that directory by `a`.
//! - `#[path = "..."]` is relative to the declaring file's directory, plus
//!   the directories of enclosing inline modules.
//! - Otherwise `name.rs` is tried before `name/mod.rs`.
//!
//! Declarations that resolve to nothing are skipped: they may be gated by
//! `cfg`, or the compiler will report them.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use syn::visit::{self, Visit};
use syn::{Expr, ExprLit, ItemMod, Lit, Meta};

use super::file::SourceFile;
use crate::error::Result;

/// Extensions tracked by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["rs"];

/// Files a program is built from, entry first.
#[derive(Debug, Clone)]
pub struct DependencySet {
    files: Vec<SourceFile>,
}

impl DependencySet {
    fn new(entry: SourceFile) -> Self {
        Self { files: vec![entry] }
    }

    pub fn entry(&self) -> &SourceFile {
        &self.files[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SourceFile> {
        self.files.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Always false: a set holds at least its entry.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(SourceFile::path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path() == path)
    }

    /// Deepest directory containing every file of the set.
    pub fn common_root(&self) -> PathBuf {
        let mut root = parent_dir(self.entry().path()).to_path_buf();
        for file in &self.files[1..] {
            let dir = parent_dir(file.path());
            while !dir.starts_with(&root) {
                if !root.pop() {
                    break;
                }
            }
        }
        root
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a SourceFile;
    type IntoIter = std::slice::Iter<'a, SourceFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("/"))
}

/// Expands an entry file into its [`DependencySet`].
#[derive(Debug, Clone)]
pub struct DependencyDiscoverer {
    extensions: Vec<String>,
}

impl Default for DependencyDiscoverer {
    fn default() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }
}

/// A file waiting in the discovery queue.
struct Queued {
    path: PathBuf,
    module: String,
    decls: Vec<ModDecl>,
    /// Children live next to this file rather than under its stem.
    owns_dir: bool,
}

impl DependencyDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track only files with one of `extensions` (without the dot).
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Build the dependency set of `entry`.
    ///
    /// # Errors
    /// Fails with `InvalidDependency` when any reachable module file does
    /// not parse, or with an IO error when one cannot be read.
    pub fn discover(&self, entry: SourceFile) -> Result<DependencySet> {
        let ast = entry.parse()?;
        self.discover_parsed(entry, &ast)
    }

    /// Build the dependency set of `entry` from its already parsed `ast`.
    pub fn discover_parsed(&self, entry: SourceFile, ast: &syn::File) -> Result<DependencySet> {
        let mut queue = VecDeque::from([Queued {
            path: entry.path().to_path_buf(),
            module: entry.module().to_string(),
            decls: mod_decls(ast),
            owns_dir: true,
        }]);
        let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
        seen.insert(entry.path().to_path_buf());
        let mut set = DependencySet::new(entry);

        while let Some(current) = queue.pop_front() {
            for decl in &current.decls {
                let module = decl.module_path(&current.module);
                let Some(resolved) = resolve(&current, decl) else {
                    tracing::debug!(
                        "Skipping unresolved module `{}` declared in {}",
                        module,
                        current.path.display()
                    );
                    continue;
                };
                if !self.is_trackable(&resolved) {
                    tracing::debug!("Not tracking {}", resolved.display());
                    continue;
                }

                let (file, ast) = SourceFile::load(&resolved, module)?;
                if !seen.insert(file.path().to_path_buf()) {
                    continue;
                }

                let owns_dir = decl.path_attr.is_some()
                    || file.path().file_name().is_some_and(|n| n == "mod.rs");
                tracing::debug!("Tracking {} as `{}`", file.path().display(), file.module());
                queue.push_back(Queued {
                    path: file.path().to_path_buf(),
                    module: file.module().to_string(),
                    decls: mod_decls(&ast),
                    owns_dir,
                });
                set.files.push(file);
            }
        }

        Ok(set)
    }

    fn is_trackable(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// A `mod name;` declaration found in a file.
#[derive(Debug)]
struct ModDecl {
    name: String,
    path_attr: Option<String>,
    /// Directory names of the enclosing inline modules.
    inline: Vec<String>,
    /// Names of the enclosing inline modules.
    inline_modules: Vec<String>,
}

impl ModDecl {
    fn module_path(&self, parent: &str) -> String {
        let mut path = parent.to_string();
        for segment in self.inline_modules.iter().chain(Some(&self.name)) {
            path.push_str("::");
            path.push_str(segment);
        }
        path
    }
}

#[derive(Default)]
struct ModCollector {
    inline: Vec<String>,
    inline_modules: Vec<String>,
    decls: Vec<ModDecl>,
}

impl<'ast> Visit<'ast> for ModCollector {
    fn visit_item_mod(&mut self, node: &'ast ItemMod) {
        let name = node.ident.to_string();
        let path_attr = path_attribute(node);

        if node.content.is_none() {
            self.decls.push(ModDecl {
                name,
                path_attr,
                inline: self.inline.clone(),
                inline_modules: self.inline_modules.clone(),
            });
            return;
        }

        self.inline.push(path_attr.unwrap_or_else(|| name.clone()));
        self.inline_modules.push(name);
        visit::visit_item_mod(self, node);
        self.inline.pop();
        self.inline_modules.pop();
    }

    // Function bodies cannot declare file modules.
    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}
}

fn mod_decls(ast: &syn::File) -> Vec<ModDecl> {
    let mut collector = ModCollector::default();
    collector.visit_file(ast);
    collector.decls
}

fn path_attribute(node: &ItemMod) -> Option<String> {
    node.attrs.iter().find_map(|attr| match &attr.meta {
        Meta::NameValue(nv) if nv.path.is_ident("path") => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(s), ..
            }) => Some(s.value()),
            _ => None,
        },
        _ => None,
    })
}

fn resolve(owner: &Queued, decl: &ModDecl) -> Option<PathBuf> {
    let dir = owner.path.parent()?;
    let children_dir = if owner.owns_dir {
        dir.to_path_buf()
    } else {
        dir.join(owner.path.file_stem()?)
    };

    if let Some(path) = &decl.path_attr {
        let base = if decl.inline.is_empty() {
            dir.to_path_buf()
        } else {
            decl.inline.iter().fold(children_dir, |d, m| d.join(m))
        };
        let candidate = base.join(path);
        return candidate.is_file().then_some(candidate);
    }

    let base = decl.inline.iter().fold(children_dir, |d, m| d.join(m));
    [
        base.join(format!("{}.rs", decl.name)),
        base.join(&decl.name).join("mod.rs"),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ROOT_MODULE;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    fn discover(entry: &Path) -> Result<DependencySet> {
        DependencyDiscoverer::new().discover(SourceFile::entry(entry)?)
    }

    fn relative(set: &DependencySet, root: &Path) -> Vec<String> {
        let root = root.canonicalize().unwrap();
        set.paths()
            .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_entry_only() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "struct Game;");

        let set = discover(&entry).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.entry().module(), "crate");
    }

    #[test]
    fn test_discover_parsed_uses_given_tree() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod player;");
        write(temp.path(), "player.rs", "pub struct Player;");
        write(temp.path(), "world.rs", "pub struct World;");

        // The tree is what was read; later edits are seen on the next load.
        let (file, ast) = SourceFile::load(&entry, ROOT_MODULE).unwrap();
        fs::write(&entry, "mod player;\nmod world;").unwrap();

        let set = DependencyDiscoverer::new().discover_parsed(file, &ast).unwrap();
        assert_eq!(relative(&set, temp.path()), ["game.rs", "player.rs"]);
        assert_eq!(discover(&entry).unwrap().len(), 3);
    }

    #[test]
    fn test_nested_modules() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod player;\nmod world;");
        write(temp.path(), "player.rs", "mod sprite;");
        write(temp.path(), "player/sprite.rs", "pub struct Sprite;");
        write(temp.path(), "world/mod.rs", "mod tiles;");
        write(temp.path(), "world/tiles.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(
            relative(&set, temp.path()),
            vec![
                "game.rs",
                "player.rs",
                "world/mod.rs",
                "player/sprite.rs",
                "world/tiles.rs"
            ]
        );

        let modules: Vec<&str> = set.iter().map(SourceFile::module).collect();
        assert_eq!(
            modules,
            vec![
                "crate",
                "crate::player",
                "crate::world",
                "crate::player::sprite",
                "crate::world::tiles"
            ]
        );
    }

    #[test]
    fn test_file_preferred_over_mod_rs() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod a;");
        write(temp.path(), "a.rs", "");
        write(temp.path(), "a/mod.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(relative(&set, temp.path()), vec!["game.rs", "a.rs"]);
    }

    #[test]
    fn test_path_attribute() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "src/game.rs",
            "#[path = \"../shared/util.rs\"]\nmod util;",
        );
        write(temp.path(), "shared/util.rs", "mod helpers;");
        write(temp.path(), "shared/helpers.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(
            relative(&set, temp.path()),
            vec!["src/game.rs", "shared/util.rs", "shared/helpers.rs"]
        );
        assert_eq!(set.common_root(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_inline_module_extends_directory() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod systems {\n    mod physics;\n}");
        write(temp.path(), "systems/physics.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(relative(&set, temp.path()), vec!["game.rs", "systems/physics.rs"]);
        assert_eq!(set.iter().nth(1).unwrap().module(), "crate::systems::physics");
    }

    #[test]
    fn test_unresolvable_is_skipped() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod missing;\nmod present;");
        write(temp.path(), "present.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(relative(&set, temp.path()), vec!["game.rs", "present.rs"]);
    }

    #[test]
    fn test_untracked_extension_is_skipped() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "#[path = \"data.txt\"]\nmod data;");
        write(temp.path(), "data.txt", "");

        let set = discover(&entry).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_invalid_dependency_fails() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod player;");
        write(temp.path(), "player.rs", "fn broken() { let = 1; }");

        let err = discover(&entry).unwrap_err();
        match err {
            Error::InvalidDependency { path, .. } => assert!(path.ends_with("player.rs")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_tracked_once() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "game.rs",
            "mod a;\n#[path = \"a.rs\"]\nmod again;",
        );
        write(temp.path(), "a.rs", "");

        let set = discover(&entry).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_deterministic() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "game.rs", "mod b;\nmod a;");
        write(temp.path(), "a.rs", "");
        write(temp.path(), "b.rs", "");

        let first = relative(&discover(&entry).unwrap(), temp.path());
        let second = relative(&discover(&entry).unwrap(), temp.path());
        assert_eq!(first, second);
        assert_eq!(first, vec!["game.rs", "b.rs", "a.rs"]);
    }
}
