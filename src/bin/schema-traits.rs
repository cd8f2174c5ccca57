//! Schema Traits CLI
//!
//! Command-line interface for resolving schemas into named types and
//! inspecting how single fragments classify.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use schema_traits::{
    load_schema_auto, resolve_reference, resolve_schema, schema_hash, AdditionalProperties,
    Classifier, CompoundPolicy, ExtractorKind, ResolveError, ResolveOptions, ResolvedSchema,
    SchemaNode,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "schema-traits")]
#[command(about = "Resolve JSON Schema documents into named type definitions")]
#[command(version)]
struct Cli {
    /// Log filter for diagnostics on stderr (e.g. warn, debug, schema_traits=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a schema into its named types
    Resolve {
        /// Schema file (`-` reads standard input)
        schema: String,

        /// Top-level key holding named definitions (repeatable)
        #[arg(long = "definition-tag", value_name = "TAG")]
        definition_tags: Vec<String>,

        /// Classname of the document root
        #[arg(long)]
        root_name: Option<String>,

        /// Treat combinators that are objects as never also being traits
        #[arg(long)]
        exclusive_compounds: bool,

        /// Maximum length of field descriptions
        #[arg(long)]
        description_width: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show how a single fragment classifies
    Classify {
        /// Schema file (`-` reads standard input)
        schema: String,

        /// Internal pointer to the fragment (default: the root)
        #[arg(long)]
        pointer: Option<String>,

        /// Treat combinators that are objects as never also being traits
        #[arg(long)]
        exclusive_compounds: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Resolve {
            schema,
            definition_tags,
            root_name,
            exclusive_compounds,
            description_width,
            format,
            pretty,
            output,
        } => {
            let mut options =
                ResolveOptions::new().compound_policy(policy(exclusive_compounds));
            if !definition_tags.is_empty() {
                options = options.definition_tags(definition_tags);
            }
            if let Some(name) = root_name {
                options = options.root_name(name);
            }
            if let Some(width) = description_width {
                options = options.description_width(width);
            }
            run_resolve(&schema, &options, format, pretty, output)
        }

        Commands::Classify {
            schema,
            pointer,
            exclusive_compounds,
        } => run_classify(&schema, pointer.as_deref(), policy(exclusive_compounds)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn policy(exclusive: bool) -> CompoundPolicy {
    if exclusive {
        CompoundPolicy::Exclusive
    } else {
        CompoundPolicy::Inherited
    }
}

fn fail(e: ResolveError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

fn serialize_failed(e: serde_json::Error) -> u8 {
    eprintln!("Error serializing output: {}", e);
    2
}

fn run_resolve(
    schema_source: &str,
    options: &ResolveOptions,
    format: OutputFormat,
    pretty: bool,
    output: Option<PathBuf>,
) -> Result<(), u8> {
    let schema = load_schema_auto(schema_source).map_err(fail)?;
    let resolved = resolve_schema(&schema, options).map_err(fail)?;

    let rendered = if format == OutputFormat::Text {
        render_text(&resolved)
    } else if pretty {
        serde_json::to_string_pretty(&resolved).map_err(serialize_failed)?
    } else {
        serde_json::to_string(&resolved).map_err(serialize_failed)?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// One block per named type: header, fields, and what it depends on.
fn render_text(resolved: &ResolvedSchema) -> String {
    let mut out = String::new();
    for (i, named) in resolved.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let descriptor = &named.descriptor;
        let _ = writeln!(
            out,
            "{} ({}, {})",
            named.name,
            descriptor.base_type(),
            named.extractor.as_str()
        );
        if let Some(description) = &descriptor.description {
            let _ = writeln!(out, "  # {}", description);
        }
        for field in descriptor.fields() {
            let marker = if field.required() { "" } else { "?" };
            let _ = write!(out, "  {}{}: {}", field.name, marker, field.type_name());
            match field.description() {
                Some(description) => {
                    let _ = writeln!(out, "  # {}", description);
                }
                None => out.push('\n'),
            }
        }
        if let Some(AdditionalProperties::Trait(extra)) = descriptor.additional_properties() {
            let _ = writeln!(out, "  *: {}", extra.type_name());
        }
        if !descriptor.imports.is_empty() {
            let _ = writeln!(out, "  uses: {}", descriptor.imports.join(", "));
        }
    }
    out.trim_end().to_string()
}

fn run_classify(
    schema_source: &str,
    pointer: Option<&str>,
    policy: CompoundPolicy,
) -> Result<(), u8> {
    let schema = load_schema_auto(schema_source).map_err(fail)?;
    let root = SchemaNode::root(&schema).map_err(fail)?;
    let node = match pointer {
        Some(pointer) => resolve_reference(pointer, root.context()).map_err(fail)?,
        None => root,
    };

    let classifier = Classifier::new(policy);
    let classification = classifier.classify(&node).map_err(fail)?;
    let extractor = ExtractorKind::dispatch(&node, &classifier).map_err(fail)?;

    let report = serde_json::json!({
        "pointer": node.pointer(),
        "is_object": classification.is_object,
        "is_trait": classification.is_trait,
        "is_reference": classification.is_reference,
        "extractor": extractor,
        "hash": schema_hash(node.schema()),
    });
    let rendered = serde_json::to_string_pretty(&report).map_err(serialize_failed)?;
    println!("{}", rendered);
    Ok(())
}
