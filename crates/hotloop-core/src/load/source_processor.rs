//! Source processing for compiled units.
//!
//! Turns the entry file into a unit crate root: any `fn main` is blanked
//! out, since the unit is a library, and the export block naming the program
//! type is appended. Blanking keeps every line in place, so rustc positions
//! in the unit are positions in the edited file.

use proc_macro2::LineColumn;
use syn::spanned::Spanned;
use syn::{File, Item};

use super::locate::ProgramDecl;
use hotloop::{ABI_VERSION_SYMBOL, ENTRY_SYMBOL};

/// Prepares entry sources for unit compilation.
pub struct UnitSourceProcessor;

impl UnitSourceProcessor {
    /// Build the unit crate root from the entry's text and syntax tree.
    pub fn process_root(source: &str, file: &File, program: &ProgramDecl) -> String {
        let mut root = Self::blank_main(source, file);
        if !root.ends_with('\n') {
            root.push('\n');
        }
        root.push_str(&Self::export_block(program));
        root
    }

    /// Replace top-level `fn main` items, attributes included, with spaces.
    pub fn blank_main(source: &str, file: &File) -> String {
        let ranges: Vec<(usize, usize)> = file
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Fn(func) if func.sig.ident == "main" => Some(item.span()),
                _ => None,
            })
            .filter_map(|span| {
                let start = byte_offset(source, span.start())?;
                let end = byte_offset(source, span.end())?;
                Some((start, end))
            })
            .collect();

        if ranges.is_empty() {
            return source.to_string();
        }

        source
            .char_indices()
            .map(|(offset, c)| {
                let blanked = ranges.iter().any(|(s, e)| (*s..*e).contains(&offset));
                if blanked && c != '\n' && c != '\r' { ' ' } else { c }
            })
            .collect()
    }

    /// Exported functions the loader looks up in a unit.
    pub fn export_block(program: &ProgramDecl) -> String {
        format!(
            r#"
#[doc(hidden)]
#[unsafe(no_mangle)]
pub fn {ABI_VERSION_SYMBOL}() -> u32 {{
    ::hotloop::ABI_VERSION
}}

#[doc(hidden)]
#[unsafe(no_mangle)]
pub fn {ENTRY_SYMBOL}() -> ::hotloop::Entry {{
    ::hotloop::Entry::of::<{ty}>("{name}")
}}
"#,
            ty = program.type_path,
            name = program.name,
        )
    }
}

/// Byte offset of a span position; lines are 1-indexed, columns count chars.
fn byte_offset(source: &str, position: LineColumn) -> Option<usize> {
    let line_start = if position.line <= 1 {
        0
    } else {
        source
            .match_indices('\n')
            .nth(position.line - 2)
            .map(|(i, _)| i + 1)?
    };
    let line = &source[line_start..];
    let column = line
        .char_indices()
        .nth(position.column)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    Some(line_start + column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl() -> ProgramDecl {
        ProgramDecl {
            name: "Game".to_string(),
            type_path: "Game".to_string(),
            continuation: false,
            line: 1,
        }
    }

    #[test]
    fn test_blank_main_keeps_lines() {
        let source = "struct Game;\n\n#[allow(unused)]\nfn main() {\n    hotloop_core::run(\"game.rs\");\n}\n\nfn helper() {}\n";
        let file = syn::parse_file(source).unwrap();

        let blanked = UnitSourceProcessor::blank_main(source, &file);
        assert_eq!(blanked.lines().count(), source.lines().count());
        assert!(!blanked.contains("main"));
        assert!(!blanked.contains("allow"));
        assert!(blanked.contains("fn helper() {}"));
        assert!(blanked.starts_with("struct Game;\n"));
        syn::parse_file(&blanked).unwrap();
    }

    #[test]
    fn test_blank_main_with_multibyte_chars() {
        let source = "const NAME: &str = \"café\";\nfn main() { println!(\"é\"); }\nstruct Ok;\n";
        let file = syn::parse_file(source).unwrap();

        let blanked = UnitSourceProcessor::blank_main(source, &file);
        let lines: Vec<&str> = blanked.lines().collect();
        assert_eq!(lines[0], "const NAME: &str = \"café\";");
        assert!(lines[1].trim().is_empty());
        assert_eq!(lines[2], "struct Ok;");
    }

    #[test]
    fn test_without_main_is_unchanged() {
        let source = "struct Game;\nfn mainly() {}\n";
        let file = syn::parse_file(source).unwrap();
        assert_eq!(UnitSourceProcessor::blank_main(source, &file), source);
    }

    #[test]
    fn test_nested_main_is_kept() {
        let source = "mod inner {\n    pub fn main() {}\n}\n";
        let file = syn::parse_file(source).unwrap();
        assert_eq!(UnitSourceProcessor::blank_main(source, &file), source);
    }

    #[test]
    fn test_export_block() {
        let block = UnitSourceProcessor::export_block(&decl());
        assert!(block.contains("pub fn hotloop_abi_version() -> u32"));
        assert!(block.contains("pub fn hotloop_entry() -> ::hotloop::Entry"));
        assert!(block.contains("::hotloop::Entry::of::<Game>(\"Game\")"));
        syn::parse_file(&block).unwrap();
    }

    #[test]
    fn test_process_root_appends_exports() {
        let source = "struct Game;\nfn main() {}";
        let file = syn::parse_file(source).unwrap();

        let root = UnitSourceProcessor::process_root(source, &file, &decl());
        assert!(root.starts_with("struct Game;\n"));
        assert!(root.contains("hotloop_entry"));
        syn::parse_file(&root).unwrap();
    }
}
