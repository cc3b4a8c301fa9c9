use anyhow::Result;
use log::warn;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for collecting the Rust sources that declare an application's types.
///
/// The `FileScanner` recursively walks a project directory and records, for every `.rs`
/// file, the module path its items live under. It skips `target` and hidden directories
/// (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use openapi_introspect::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// A discovered source file and the module its items belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Module path, e.g. `crate::models::user`
    pub module_path: String,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// All discovered `.rs` files
    pub rust_files: Vec<SourceFile>,
    /// Warning messages for paths that could not be read
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be accessed.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        let relative = path.strip_prefix(&self.root_path).unwrap_or(path);
                        rust_files.push(SourceFile {
                            path: path.to_path_buf(),
                            module_path: module_path_for(relative),
                        });
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}

/// Derives the module path of a file from its path relative to the project root.
///
/// `src/models/user.rs` becomes `crate::models::user`, `src/lib.rs` and `mod.rs` files name
/// their directory, and files of a workspace member (`crates/billing/src/invoice.rs`) use
/// the member directory as their crate root (`billing::invoice`).
pub fn module_path_for(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let Some((file, dirs)) = parts.split_last() else {
        return "crate".to_string();
    };

    let (root, modules) = match dirs.iter().rposition(|d| d == "src") {
        Some(0) => ("crate".to_string(), &dirs[1..]),
        Some(index) => (dirs[index - 1].replace('-', "_"), &dirs[index + 1..]),
        None => ("crate".to_string(), dirs),
    };

    let mut segments = vec![root];
    segments.extend(modules.iter().map(|m| m.replace('-', "_")));

    let stem = file.trim_end_matches(".rs");
    if !matches!(stem, "lib" | "main" | "mod") {
        segments.push(stem.replace('-', "_"));
    }
    segments.join("::")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("lib.rs"), "pub fn test() {}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.rust_files.len(), 2);
        assert!(result.warnings.is_empty());
        assert!(result.rust_files.iter().all(|f| f.module_path == "crate"));
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();

        assert!(result.rust_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories_records_module_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/models")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod models;").unwrap();
        fs::write(root.join("src/models/mod.rs"), "pub mod user;").unwrap();
        fs::write(root.join("src/models/user.rs"), "pub struct User {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        let modules: Vec<&str> = result
            .rust_files
            .iter()
            .map(|f| f.module_path.as_str())
            .collect();
        assert_eq!(modules, vec!["crate", "crate::models", "crate::models::user"]);
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/build.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.rs"), "// config").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.rust_files.len(), 1);
        assert_eq!(
            result.rust_files[0].path.file_name().unwrap().to_string_lossy(),
            "main.rs"
        );
    }

    #[test]
    fn test_module_path_for_workspace_member() {
        assert_eq!(
            module_path_for(Path::new("crates/billing-core/src/invoice/line.rs")),
            "billing_core::invoice::line"
        );
        assert_eq!(module_path_for(Path::new("src/main.rs")), "crate");
        assert_eq!(module_path_for(Path::new("models.rs")), "crate::models");
    }
}
