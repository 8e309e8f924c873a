//! Locating the program type in an entry file.

use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{ImplItem, Item, ItemImpl, PathArguments, Type};

/// Trait a program type implements.
pub const PROGRAM_TRAIT: &str = "Program";

/// A top-level `impl Program for T` found in the entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDecl {
    /// Last segment of the type path; the name registries look up.
    pub name: String,

    /// The type path as written, usable in generated code.
    pub type_path: String,

    /// The impl overrides `from_instance`.
    pub continuation: bool,

    /// Line of the `impl` keyword (1-indexed).
    pub line: usize,
}

/// Every top-level program impl of `file`, in source order.
pub fn locate_all(file: &syn::File) -> Vec<ProgramDecl> {
    file.items
        .iter()
        .filter_map(|item| match item {
            Item::Impl(item_impl) => program_decl(item_impl),
            _ => None,
        })
        .collect()
}

/// The first top-level program impl of `file`.
pub fn locate_program(file: &syn::File) -> Option<ProgramDecl> {
    let mut found = locate_all(file).into_iter();
    let first = found.next()?;
    let others: Vec<String> = found.map(|d| d.name).collect();
    if !others.is_empty() {
        tracing::debug!(
            "Using `{}`; also found Program impls for {}",
            first.name,
            others.join(", ")
        );
    }
    Some(first)
}

fn program_decl(item: &ItemImpl) -> Option<ProgramDecl> {
    let (negative, trait_path, _) = item.trait_.as_ref()?;
    if negative.is_some() || trait_path.segments.last()?.ident != PROGRAM_TRAIT {
        return None;
    }
    // Generic impls cannot be instantiated without type arguments.
    if !item.generics.params.is_empty() {
        return None;
    }

    let Type::Path(type_path) = item.self_ty.as_ref() else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let last = type_path.path.segments.last()?;
    if !matches!(last.arguments, PathArguments::None) {
        return None;
    }

    let continuation = item.items.iter().any(|impl_item| {
        matches!(impl_item, ImplItem::Fn(f) if f.sig.ident == "from_instance")
    });

    Some(ProgramDecl {
        name: last.ident.to_string(),
        type_path: type_path.to_token_stream().to_string(),
        continuation,
        line: item.impl_token.span().start().line,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> syn::File {
        syn::parse_file(source).unwrap()
    }

    #[test]
    fn test_locate_simple() {
        let file = parse(
            r#"
use hotloop::prelude::*;

struct Game;

impl Program for Game {
    fn new() -> Self { Game }
    fn update(&mut self, _frame: &Frame<'_>) -> UpdateResult { Ok(None) }
}
"#,
        );

        let decl = locate_program(&file).unwrap();
        assert_eq!(decl.name, "Game");
        assert_eq!(decl.type_path, "Game");
        assert!(!decl.continuation);
        assert_eq!(decl.line, 6);
    }

    #[test]
    fn test_qualified_trait_and_continuation() {
        let file = parse(
            r#"
struct Game;
impl hotloop::Program for self::Game {
    fn new() -> Self { Game }
    fn update(&mut self, _frame: &hotloop::Frame<'_>) -> hotloop::UpdateResult { Ok(None) }
    fn from_instance(_previous: hotloop::Snapshot) -> Self { Game }
}
"#,
        );

        let decl = locate_program(&file).unwrap();
        assert_eq!(decl.name, "Game");
        assert_eq!(decl.type_path, "self :: Game");
        assert!(decl.continuation);
    }

    #[test]
    fn test_first_match_wins() {
        let file = parse(
            r#"
struct A;
struct B;
impl Program for B { }
impl Program for A { }
"#,
        );

        assert_eq!(locate_all(&file).len(), 2);
        assert_eq!(locate_program(&file).unwrap().name, "B");
    }

    #[test]
    fn test_ignores_other_impls() {
        let file = parse(
            r#"
struct Game;
struct Wrapper<T>(T);
impl Game { fn new() -> Self { Game } }
impl Default for Game { fn default() -> Self { Game } }
impl<T: 'static> Program for Wrapper<T> { }
impl Program for Wrapper<u8> { }
impl !Program for Game { }
mod nested {
    impl Program for super::Game { }
}
"#,
        );

        assert!(locate_program(&file).is_none());
    }
}
