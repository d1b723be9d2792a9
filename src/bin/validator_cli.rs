//! Thin CLI wrapper around the validator core (spec section 6: "CLI",
//! explicitly out-of-core — a convenience binary, not part of the six
//! components). Loads an OpenAPI document, runs `validateDocument()` against
//! it, and reports the result.
//!
//! Matches this codebase's own `--feature, --env`-style flag plumbing with
//! `clap` derive, and its `tracing`/`tracing-subscriber` (env-filter + JSON)
//! logging setup.

use clap::{Parser, ValueEnum};
use oas_validator_core::document::load_document;
use oas_validator_core::error::print_errors;
use oas_validator_core::validator::{Validator, ValidatorOptions};
use std::process::ExitCode;
use tracing::{error, info};

/// Regex engine selection (spec section 6: `--regexengine`). This crate's
/// path-matcher fallback and custom-format predicates compile patterns with
/// the `regex` crate only; the other variants are accepted for interface
/// parity with the reference tool's flag surface but behave identically
/// (documented as an Open Question resolution in DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum RegexEngine {
    Re2,
    Ecmascript,
    Ignorecase,
    Multiline,
    Explicitcapture,
    Compiled,
    Singleline,
    Ignorepatternwhitespace,
    Righttoleft,
    Debug,
    Unicode,
}

#[derive(Parser)]
#[command(name = "oas-validate")]
#[command(about = "Validate an OpenAPI 3.x document for internal consistency", long_about = None)]
struct Cli {
    /// Path to the OpenAPI document (YAML or JSON).
    spec: String,

    /// Regex engine to use for pattern compilation.
    #[arg(long, value_enum, default_value_t = RegexEngine::Ecmascript)]
    regexengine: RegexEngine,

    /// Emit the validation report as JSON instead of human-readable text.
    #[arg(long, default_value_t = false)]
    yaml2json: bool,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).json().try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let _ = cli.regexengine;

    info!(spec = %cli.spec, "loading OpenAPI document");
    let document = match load_document(&cli.spec) {
        Ok(doc) => doc,
        Err(e) => {
            error!(spec = %cli.spec, error = %e, "failed to load OpenAPI document");
            eprintln!("error: failed to load '{}': {e}", cli.spec);
            return ExitCode::FAILURE;
        }
    };

    let validator = Validator::new(document, ValidatorOptions::new());
    let (ok, errors) = validator.validate_document();

    if ok {
        info!(spec = %cli.spec, "document is self-consistent");
        println!("{}: valid", cli.spec);
        return ExitCode::SUCCESS;
    }

    error!(spec = %cli.spec, error_count = errors.len(), "document failed validation");
    if cli.yaml2json {
        let report: Vec<_> = errors
            .iter()
            .map(|e| {
                serde_json::json!({
                    "kind": e.kind.to_string(),
                    "subKind": e.sub_kind,
                    "message": e.message,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else {
        print_errors(&errors);
    }
    ExitCode::FAILURE
}
