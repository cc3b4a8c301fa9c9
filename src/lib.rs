//! OpenAPI Introspect - OpenAPI 3.1 schemas from Rust type metadata.
//!
//! The library walks the metadata of a project's types (field types, generics, enums,
//! `#[serde(flatten)]` supertypes, serde and schema attributes) and produces a graph of
//! OpenAPI schemas: inline schemas for primitives, arrays and maps, and one named,
//! referenced schema per object or enum instantiation.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Recursively scans project directories for Rust files
//! 2. [`parser`] - Parses Rust source files into syntax trees
//! 3. [`descriptor`] - Generic type descriptors ([`descriptor::TypeRef`])
//! 4. [`metadata`] - Type definitions, the metadata provider trait, and the catalogs that
//!    implement it (built by hand or from parsed sources)
//! 5. [`schema`] - Schema nodes and the factory that shapes them
//! 6. [`introspect`] - The introspection session: registry, resolvers, conflict detection
//! 7. [`operations`] - The operation manifest naming routes and their types
//! 8. [`openapi_builder`] - Composes the OpenAPI document
//! 9. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_introspect::{
//!     metadata::SourceCatalog,
//!     openapi_builder::OpenApiBuilder,
//!     operations::OperationManifest,
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//! };
//! use std::path::{Path, PathBuf};
//!
//! let scan_result = FileScanner::new(PathBuf::from("./my-project")).scan().unwrap();
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.rust_files)
//!     .into_iter()
//!     .filter_map(Result::ok)
//!     .collect();
//! let catalog = SourceCatalog::build(&parsed_files).unwrap();
//!
//! let manifest = OperationManifest::load(Path::new("./my-project/api.yaml")).unwrap();
//! let generated = OpenApiBuilder::new().generate(&manifest, &catalog).unwrap();
//! println!("{}", serialize_yaml(&generated.document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod metadata;
pub mod openapi_builder;
pub mod operations;
pub mod parser;
pub mod scanner;
pub mod schema;
pub mod serializer;
