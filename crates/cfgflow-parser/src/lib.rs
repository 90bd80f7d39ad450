/*! Parse textual IR into `cfgflow_core` modules.
 *
 * Analyses are easiest to write tests for, and to run from the command line, when their input
 * is a small text file. This crate reads LLVM-flavoured text back into the core IR so it can be
 * analyzed, printed again, or checked for well-formedness.
 */

use cfgflow_core::Module;
use pest::Parser;
use pest_derive::Parser;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub mod error;
mod lower;

pub use error::{ParseError, Result};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct CfgflowParser;

/// File extension picked up by [`parse_dir`].
pub const EXTENSION: &str = "cfg";

pub type ParseResult<T> = std::result::Result<T, Box<pest::error::Error<Rule>>>;

/// Syntax-only parse. No names are resolved.
pub fn parse(input: &str) -> ParseResult<pest::iterators::Pairs<'_, Rule>> {
    CfgflowParser::parse(Rule::module, input).map_err(Box::new)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

pub fn parse_module(input: &str) -> Result<Module> {
    parse_named("module", input)
}

/// Parses `input` into a module called `name`.
pub fn parse_named(name: &str, input: &str) -> Result<Module> {
    let pairs = parse(input)?;
    lower::lower_module(name, pairs)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Module> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    debug!(path = %path.display(), "parsing file");
    parse_named(&name, &input)
}

/// Parses every `.cfg` file under `dir`, in path order. Stops at the first failure.
pub fn parse_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<(PathBuf, Module)>> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| ParseError::Io {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf()),
            source: e.into(),
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }

    paths
        .into_iter()
        .map(|path| parse_file(&path).map(|module| (path, module)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_module() {
        assert!(check(""));
        assert!(parse_module("; nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_simple_function() {
        let input = r"
define @f(%a) {
entry:
  %x = add %a, 1
  ret %x
}
";
        assert!(check(input));
    }

    #[test]
    fn test_missing_brace_is_syntax_error() {
        let input = "define @f() {\nentry:\n  ret\n";
        assert!(!check(input));
        assert!(matches!(parse_module(input), Err(ParseError::Syntax(_))));
    }

    #[test]
    fn test_labels_are_not_opcodes() {
        let input = r"
define @f() {
entry:
  unreachable
next:
  ret
}
";
        let module = parse_module(input).unwrap();
        let function = module.get_function("f").unwrap();
        assert_eq!(function.blocks.len(), 2);
        assert_eq!(function.instruction_count(), 2);
    }
}
