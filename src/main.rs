//! OpenAPI Introspect - command-line tool for generating OpenAPI 3.1 documents.
//!
//! Reads the types of a Rust project and an operation manifest naming the routes to
//! document, then writes a complete OpenAPI document.
//!
//! # Usage
//!
//! ```bash
//! openapi-introspect [OPTIONS] --operations <FILE> <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-introspect ./my-api-project --operations api.yaml -o openapi.yaml
//! ```
//!
//! Generate JSON documentation and fail on schema name clashes:
//! ```bash
//! openapi-introspect ./my-api-project --operations api.yaml -f json --fail-on-conflict
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_introspect::cli;

fn main() -> Result<()> {
    // parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI Introspect starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
