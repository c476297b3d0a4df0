use anyhow::Context;
use clap::{Parser, Subcommand};
use es_spec::config::Config;
use es_spec::render::{render_json, write_output};
use es_spec::source::{has_data_rows, read_fragment, read_load};
use es_spec::spec::{Extract, ExtractSpec};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "es-spec")]
#[command(about = "Compile event store load/extract specifications", long_about = None)]
struct Cli {
    /// JSON render configuration (pretty, with_date, deleted, timezone).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log resolution steps.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate load fragments and re-emit them as one load config.
    LoadConfig {
        #[arg(long, required = true, num_args = 1..)]
        load: Vec<PathBuf>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Render uploadTask documents for merged load entities.
    UploadTasks {
        #[arg(long, required = true, num_args = 1..)]
        load: Vec<PathBuf>,

        #[arg(long)]
        pid: String,

        /// Entities to render (every declaration when omitted).
        #[arg(long)]
        entity: Vec<String>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Resolve an extract spec against the load and render readTask documents.
    ReadTasks {
        #[arg(long, required = true, num_args = 1..)]
        load: Vec<PathBuf>,

        #[arg(long)]
        extract: PathBuf,

        #[arg(long)]
        pid: String,

        /// Render readMap as an inline JSON string.
        #[arg(long)]
        compact: bool,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Emit an extract spec skeleton for every merged load entity.
    ExtractConfig {
        #[arg(long, required = true, num_args = 1..)]
        load: Vec<PathBuf>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.cmd {
        Commands::LoadConfig { load, out } => {
            let load = read_load(&load)?;
            let text = render_json(&load.render_config(), true)?;
            write_output(out.as_deref(), &text)?;
        }
        Commands::UploadTasks {
            load,
            pid,
            entity,
            out,
        } => {
            let load = read_load(&load)?;
            for declaration in load.select(&entity)? {
                warn_if_empty(Path::new(declaration.file()));
            }
            let docs = load
                .render_upload_tasks(&pid, &entity)
                .with_context(|| format!("render upload tasks for {pid}"))?;
            info!(tasks = docs.len(), "rendered upload tasks");
            write_output(out.as_deref(), &render_json(&docs, true)?)?;
        }
        Commands::ReadTasks {
            load,
            extract,
            pid,
            compact,
            out,
        } => {
            let load = read_load(&load)?;
            let raw = read_fragment(&extract)?;
            let mut spec: ExtractSpec = serde_json::from_value(raw)
                .with_context(|| format!("parse extract spec {}", extract.display()))?;
            if spec.timezone.is_none() {
                spec.timezone = Some(config.timezone.clone());
            }
            let today = chrono::Local::now().date_naive();
            let resolved = Extract::from_spec(&spec, &load, today)
                .with_context(|| format!("invalid extract spec {}", extract.display()))?;

            let mut options = config.render_options();
            if compact {
                options.pretty = false;
            }
            let docs = resolved.render_fragment(&pid, &options)?;
            info!(entities = docs.len(), "rendered read tasks");
            let now = chrono::Local::now().naive_local();
            for entity in resolved.entities() {
                info!(
                    entity = entity.name(),
                    local = %config.destinations.local_file_name(entity.file(), now),
                    "extract result destination"
                );
            }
            write_output(out.as_deref(), &render_json(&docs, true)?)?;
        }
        Commands::ExtractConfig { load, out } => {
            let load = read_load(&load)?;
            let configs = load.render_extract_configs(&config.timezone);
            write_output(out.as_deref(), &render_json(&configs, true)?)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn warn_if_empty(source: &Path) {
    match has_data_rows(source) {
        Ok(true) => {}
        Ok(false) => warn!(file = %source.display(), "source file has no data rows"),
        Err(err) => warn!(
            file = %source.display(),
            error = %format!("{err:#}"),
            "cannot read source file"
        ),
    }
}
