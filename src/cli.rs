use crate::metadata::SourceCatalog;
use crate::openapi_builder::{GeneratedDocument, OpenApiBuilder, DEFAULT_TITLE, DEFAULT_VERSION};
use crate::operations::OperationManifest;
use crate::parser::{AstParser, ParsedFile};
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// OpenAPI Introspect - Generate OpenAPI 3.1 schemas from the types of a Rust project
#[derive(Parser, Debug)]
#[command(name = "openapi-introspect")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Operation manifest (YAML, or JSON with a .json extension)
    #[arg(long = "operations", value_name = "FILE")]
    pub operations: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// API title, overriding the manifest
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version, overriding the manifest
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Exit with an error when two types share a schema name
    #[arg(long = "fail-on-conflict")]
    pub fail_on_conflict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!("Project path does not exist: {}", args.project_path.display());
    }
    if !args.project_path.is_dir() {
        anyhow::bail!("Project path is not a directory: {}", args.project_path.display());
    }
    if !args.operations.is_file() {
        anyhow::bail!("Operation manifest not found: {}", args.operations.display());
    }

    info!("Project path: {}", args.project_path.display());
    info!("Operation manifest: {}", args.operations.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Scans, parses and catalogs the project, then composes the manifest's operations
pub fn generate(args: &CliArgs) -> Result<GeneratedDocument> {
    info!("Scanning project directory...");
    let scan_result = FileScanner::new(args.project_path.clone()).scan()?;
    info!("Found {} Rust files", scan_result.rust_files.len());
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.rust_files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    info!("Parsing Rust files...");
    let parsed_files: Vec<ParsedFile> = AstParser::parse_files(&scan_result.rust_files)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file due to parse error: {:#}", e);
                None
            }
        })
        .collect();
    info!("Successfully parsed {} files", parsed_files.len());
    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    info!("Building type catalog...");
    let catalog = SourceCatalog::build(&parsed_files).context("Failed to build type catalog")?;
    info!("Cataloged {} types", catalog.len());

    let manifest = OperationManifest::load(&args.operations).with_context(|| {
        format!("Failed to load operation manifest: {}", args.operations.display())
    })?;
    info!("Loaded {} operations", manifest.operations.len());

    let title = args
        .title
        .clone()
        .or_else(|| manifest.info.title.clone())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let version = args
        .api_version
        .clone()
        .or_else(|| manifest.info.version.clone())
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    info!("Building OpenAPI document...");
    let generated = OpenApiBuilder::new()
        .with_info(title, version, manifest.info.description.clone())
        .generate(&manifest, &catalog)
        .context("Failed to compose OpenAPI document")?;

    let schema_count = generated
        .document
        .components
        .as_ref()
        .map_or(0, |components| components.schemas.len());
    info!("OpenAPI document built with {} component schemas", schema_count);
    Ok(generated)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");
    let generated = generate(&args)?;

    if !generated.conflicts.is_empty() {
        for conflict in &generated.conflicts {
            warn!("Naming conflict: {}", conflict);
        }
        if args.fail_on_conflict {
            let names: Vec<&str> = generated.conflicts.iter().map(|c| c.name.as_str()).collect();
            anyhow::bail!("Schema names are shared by distinct types: {}", names.join(", "));
        }
    }

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&generated.document)?,
        OutputFormat::Json => serialize_json(&generated.document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("  - Paths: {}", generated.document.paths.len());
    info!("  - Naming conflicts: {}", generated.conflicts.len());
    Ok(())
}
