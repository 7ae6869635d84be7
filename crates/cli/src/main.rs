mod bindings;
mod config;
mod formatter;

use anyhow::{Context, Result};
use bindings::BindingsClient;
use clap::{Parser, Subcommand};
use config::BindingsSettings;
use formatter::{ColorMode, OutputFormat};
use repose_xsd::{Compilation, DirectorySchemaSource, FormCompiler, SchemaDocument, SchemaSource};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repose-forms")]
#[command(about = "Compile Repose filter configuration schemas into form descriptors", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a local XSD file
    Compile {
        /// Path to the filter's XSD
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch a filter's XSD from the bindings service and compile it
    Fetch {
        /// Gateway release, e.g. 9.1.0.0
        #[arg(long = "version", value_name = "VERSION")]
        release: String,

        /// Filter name, e.g. add-header
        #[arg(long)]
        filter: String,

        /// Read `<DIR>/<version>/<filter>.xsd` instead of calling the bindings service
        #[arg(long, env = "REPOSE_SCHEMA_DIR")]
        schema_dir: Option<PathBuf>,

        /// Config file (defaults to the per-user config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bindings service base URL
        #[arg(long, env = "REPOSE_BINDINGS_ENDPOINT")]
        endpoint: Option<String>,

        /// Path between the version and the filter name
        #[arg(long, env = "REPOSE_FILTERS_URI")]
        filters_uri: Option<String>,

        /// Path from the filter to its bindings document
        #[arg(long, env = "REPOSE_BINDINGS_LOCATION")]
        bindings_location: Option<String>,

        /// Path from the filter to its schema directory
        #[arg(long, env = "REPOSE_SCHEMA_LOCATION")]
        schema_location: Option<String>,

        /// Per-request timeout in seconds (default 30)
        #[arg(long, env = "REPOSE_FETCH_TIMEOUT")]
        timeout: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

impl Commands {
    fn output(&self) -> &OutputArgs {
        match self {
            Commands::Compile { output, .. } | Commands::Fetch { output, .. } => output,
        }
    }
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Print the descriptor on a single line
    #[arg(long)]
    compact: bool,

    /// Print compile diagnostics to stderr
    #[arg(long)]
    diagnostics: bool,

    /// Color output for diagnostics: auto (default), always, or never
    #[arg(long, default_value = "auto")]
    color: String,
}

fn run_compile(file: PathBuf, output: OutputArgs) -> Result<()> {
    info!("Compiling {}", file.display());
    let document = SchemaDocument::from_file(&file)
        .with_context(|| format!("Failed to read schema {:?}", file))?;
    let compilation = FormCompiler::new()
        .compile(&document)
        .with_context(|| format!("Failed to compile schema {:?}", file))?;
    emit(&compilation, &output)
}

async fn fetch_from_service(
    release: &str,
    filter: &str,
    config_path: Option<PathBuf>,
    overrides: BindingsSettings,
) -> Result<String> {
    let file_config = config::load_config(config_path.as_deref())?;
    let settings = overrides.or(file_config.bindings).resolve()?;
    debug!(?settings, "resolved bindings settings");

    let client = BindingsClient::new(settings)?;
    client.fetch_schema(release, filter).await
}

async fn run_fetch(
    release: String,
    filter: String,
    schema_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    overrides: BindingsSettings,
    output: OutputArgs,
) -> Result<()> {
    let xsd = match schema_dir {
        Some(dir) => DirectorySchemaSource::new(dir)
            .fetch_schema(&release, &filter)
            .map_err(anyhow::Error::from),
        None => fetch_from_service(&release, &filter, config_path, overrides).await,
    }
    .with_context(|| format!("Failed to fetch schema for filter '{}' {}", filter, release))?;

    let compilation = FormCompiler::new()
        .compile_str(&xsd)
        .with_context(|| format!("Failed to compile schema for filter '{}'", filter))?;
    emit(&compilation, &output)
}

/// Filter used when `RUST_LOG` is unset.
///
/// With `--diagnostics` the formatter prints each diagnostic, so the
/// library's own warnings for them are silenced.
fn default_log_filter(verbose: bool, diagnostics: bool) -> &'static str {
    match (verbose, diagnostics) {
        (true, _) => "debug",
        (false, true) => "warn,repose_xsd=error",
        (false, false) => "warn",
    }
}

/// Descriptor JSON to stdout, diagnostics to stderr.
fn emit(compilation: &Compilation, output: &OutputArgs) -> Result<()> {
    let format = OutputFormat::from_compact_flag(output.compact);
    println!(
        "{}",
        formatter::format_descriptor(&compilation.descriptor, format)?
    );

    if output.diagnostics {
        let colorize = ColorMode::from_str(&output.color).should_colorize();
        for diagnostic in &compilation.diagnostics {
            eprintln!("{}", formatter::format_diagnostic(diagnostic, colorize));
        }
        eprintln!(
            "{}",
            formatter::format_summary(compilation.diagnostics.len(), colorize)
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, keeping stdout clean for the descriptor
    let default_filter = default_log_filter(cli.verbose, cli.command.output().diagnostics);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    match cli.command {
        Commands::Compile { file, output } => run_compile(file, output),
        Commands::Fetch {
            release,
            filter,
            schema_dir,
            config,
            endpoint,
            filters_uri,
            bindings_location,
            schema_location,
            timeout,
            output,
        } => {
            let overrides = BindingsSettings {
                endpoint,
                filters_uri,
                bindings_location,
                schema_location,
                timeout_secs: timeout,
            };
            run_fetch(release, filter, schema_dir, config, overrides, output).await
        }
    }
}
