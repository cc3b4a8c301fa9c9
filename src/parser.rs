use crate::scanner::SourceFile;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

/// AST parser for Rust source files.
///
/// The `AstParser` uses `syn` to parse source files into syntax trees from which the
/// [`SourceCatalog`](crate::metadata::SourceCatalog) reads type definitions.
pub struct AstParser;

/// A parsed Rust file with the module path its items belong to.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// Module path of the file's top-level items, e.g. `crate::models`
    pub module_path: String,
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses a single source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid Rust.
    pub fn parse_file(source: &SourceFile) -> Result<ParsedFile> {
        debug!("Parsing file: {}", source.path.display());

        let content = fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read file: {}", source.path.display()))?;

        let syntax_tree = syn::parse_file(&content).with_context(|| {
            format!("Failed to parse Rust syntax in file: {}", source.path.display())
        })?;

        Ok(ParsedFile {
            path: source.path.clone(),
            module_path: source.module_path.clone(),
            syntax_tree,
        })
    }

    /// Parses source code held in memory, e.g. embedded fixtures
    pub fn parse_str(module_path: &str, code: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(code)
            .with_context(|| format!("Failed to parse Rust syntax for module {}", module_path))?;
        Ok(ParsedFile {
            path: PathBuf::from(format!("<{}>", module_path)),
            module_path: module_path.to_string(),
            syntax_tree,
        })
    }

    /// Parses multiple files, continuing past failures.
    ///
    /// Files that fail to parse are logged as warnings so a single broken file only
    /// removes its own types from the catalog.
    pub fn parse_files(sources: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", sources.len());

        let results: Vec<Result<ParsedFile>> = sources
            .iter()
            .map(|source| {
                Self::parse_file(source).inspect_err(|e| {
                    warn!("Failed to parse {}: {}", source.path.display(), e);
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> SourceFile {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        SourceFile {
            path,
            module_path: format!("crate::{}", name.trim_end_matches(".rs")),
        }
    }

    #[test]
    fn test_parse_valid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_temp_file(
            &temp_dir,
            "models.rs",
            r#"
            pub struct User {
                pub id: u32,
                pub name: String,
            }
            "#,
        );

        let parsed = AstParser::parse_file(&source).unwrap();
        assert_eq!(parsed.path, source.path);
        assert_eq!(parsed.module_path, "crate::models");
        assert_eq!(parsed.syntax_tree.items.len(), 1);
    }

    #[test]
    fn test_parse_invalid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = create_temp_file(&temp_dir, "broken.rs", "pub struct User { pub id: u32 pub x: u8 }");

        let err = AstParser::parse_file(&source).unwrap_err();
        assert!(err.to_string().contains("Failed to parse Rust syntax"));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let source = SourceFile {
            path: PathBuf::from("/nonexistent/file.rs"),
            module_path: "crate::file".to_string(),
        };

        let err = AstParser::parse_file(&source).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_parse_files_continues_past_failures() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_temp_file(&temp_dir, "good.rs", "pub struct World;");
        let bad = create_temp_file(&temp_dir, "bad.rs", "pub fn broken( {");

        let results = AstParser::parse_files(&[good, bad]);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_parse_str() {
        let parsed = AstParser::parse_str("crate::dto", "pub enum Status { Active }").unwrap();
        assert_eq!(parsed.module_path, "crate::dto");
        assert_eq!(parsed.syntax_tree.items.len(), 1);
    }
}
