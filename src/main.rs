//! Komainu Authorizr - schema toolchain CLI
//!
//! Deploy-time companion to the authorizer library: merges tenant partials
//! onto the base schema, validates variable coverage on a superset, and
//! resolves sample events for debugging mappings.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use komainu_authorizr::event::{classify, EventKind};
use komainu_authorizr::extract::{extract_from_api_gateway, extract_from_appsync};
use komainu_authorizr::schema::{merge_schemas, validate_superset, SchemaDocument};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Komainu Authorizr - Verified Permissions schema toolchain
#[derive(Parser, Debug)]
#[command(name = "komainu-authorizr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a tenant partial schema onto the base schema and validate the
    /// result
    Merge {
        /// Base schema document (YAML or JSON)
        #[arg(long)]
        base: PathBuf,

        /// Partial schema document (YAML or JSON)
        #[arg(long)]
        partial: PathBuf,

        /// Where to write the merged superset JSON
        #[arg(long)]
        superset_out: Option<PathBuf>,

        /// Where to write the pruned Cedar JSON
        #[arg(long)]
        cedar_out: Option<PathBuf>,
    },

    /// Validate variable coverage on a merged superset document
    Validate {
        /// Superset schema document (YAML or JSON)
        #[arg(long)]
        schema: PathBuf,
    },

    /// Resolve an authorizer event against a superset document
    Resolve {
        /// Superset schema document (YAML or JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Authorizer event (JSON)
        #[arg(long)]
        event: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Merge {
            base,
            partial,
            superset_out,
            cedar_out,
        } => merge(base, partial, superset_out, cedar_out),
        Command::Validate { schema } => validate(schema),
        Command::Resolve { schema, event } => resolve(schema, event),
    }
}

fn merge(
    base: PathBuf,
    partial: PathBuf,
    superset_out: Option<PathBuf>,
    cedar_out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let base_text =
        std::fs::read_to_string(&base).with_context(|| format!("reading {}", base.display()))?;
    let partial_text = std::fs::read_to_string(&partial)
        .with_context(|| format!("reading {}", partial.display()))?;

    let result = merge_schemas(&base_text, &partial_text)?;
    info!(namespace = %result.namespace, "merged schema documents");

    // Refuse to publish a superset with coverage gaps.
    let superset = SchemaDocument::parse(&result.superset_json)?;
    let errors = validate_superset(&superset);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{error}");
        }
        bail!("merged schema failed validation with {} error(s)", errors.len());
    }

    match superset_out {
        Some(path) => {
            std::fs::write(&path, &result.superset_json)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote superset schema");
        }
        None => println!("{}", result.superset_json),
    }
    if let Some(path) = cedar_out {
        std::fs::write(&path, &result.cedar_json)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote Cedar schema");
    }
    Ok(())
}

fn validate(schema: PathBuf) -> anyhow::Result<()> {
    let doc = SchemaDocument::load(&schema)
        .with_context(|| format!("loading {}", schema.display()))?;
    let errors = validate_superset(&doc);
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("{error}");
        }
        bail!("schema validation failed with {} error(s)", errors.len());
    }
    info!(namespace = %doc.namespace(), "schema is valid");
    Ok(())
}

fn resolve(schema: PathBuf, event: PathBuf) -> anyhow::Result<()> {
    let doc = SchemaDocument::load(&schema)
        .with_context(|| format!("loading {}", schema.display()))?;
    let event_text = std::fs::read_to_string(&event)
        .with_context(|| format!("reading {}", event.display()))?;
    let event: serde_json::Value = serde_json::from_str(&event_text)?;

    let result = match classify(&event) {
        EventKind::ApiGateway => extract_from_api_gateway(&event, &doc),
        EventKind::AppSync => extract_from_appsync(&event, &doc),
        EventKind::Unknown => bail!("unrecognized authorizer event shape"),
    };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
