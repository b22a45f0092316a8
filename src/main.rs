mod config;
mod docker;
mod error;
mod output;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{control, Colorize};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use config::{FileConfig, Overrides, Settings};
use docker::{ContainerEngine, DockerEngine};
use render::Format;

// ======================================================
// CLI
// ======================================================

#[derive(Parser)]
#[command(name = "docker-exporter")]
#[command(about = "Export the configuration of Docker containers")]
#[command(
    long_about = "docker-exporter reads the configuration of existing Docker containers and \
prints it back as docker run commands, compose files or raw JSON, so a container can be \
recreated without the command that originally started it."
)]
struct Cli {
    /// Config file (default is $HOME/.docker-exporter.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Docker daemon address (e.g. tcp://localhost:2375 or unix:///var/run/docker.sock)
    #[arg(short = 'H', long, env = "DOCKER_HOST", global = true)]
    docker_host: Option<String>,

    /// Docker API version to speak [default: 1.39]
    #[arg(short = 'V', long, env = "DOCKER_API_VERSION", global = true)]
    client_version: Option<String>,

    /// Log filter, e.g. info or debug [default: info]
    #[arg(long, env = "DOCKER_EXPORTER_LOG", global = true)]
    log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List Docker containers.
    ///
    /// Without arguments only running containers are shown (add -a for stopped
    /// ones). Given names or ID prefixes, matching containers are shown
    /// whatever their state.
    #[command(visible_aliases = ["l", "ps"])]
    List {
        /// Container name fragments or ID prefixes
        names: Vec<String>,

        /// Include stopped containers
        #[arg(short, long)]
        all: bool,

        /// Short IDs and aligned columns
        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the complete configuration of containers as JSON
    Inspect {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Export container configuration as run commands, compose files or JSON
    Export {
        /// Container name fragments or ID prefixes (all containers when empty)
        names: Vec<String>,

        /// Include stopped containers
        #[arg(short, long)]
        all: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        #[arg(short, long, value_enum, default_value_t = Format::Command)]
        format: Format,

        /// Also write the result into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List images, optionally filtered by repository tag
    #[command(visible_alias = "img")]
    Images {
        names: Vec<String>,

        #[arg(short, long)]
        pretty: bool,
    },
    /// Print the complete record of images as JSON
    InspectImage {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Version,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            docker_host: self.docker_host.clone(),
            client_version: self.client_version.clone(),
            log_level: if self.verbose {
                Some("debug".to_string())
            } else {
                self.log_level.clone()
            },
        }
    }
}

// ======================================================
// MAIN
// ======================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (file, config_error) = match config::load_file(cli.config.as_deref()) {
        Ok(file) => (file, None),
        Err(e) => (FileConfig::default(), Some(e)),
    };
    let settings = Settings::resolve(cli.overrides(), file);

    init_tracing(&settings.log_level);

    if let Some(e) = config_error {
        error!("{}", e);
        exit(1);
    }

    if let Err(e) = run(cli.command, &settings).await {
        error!("{:#}", e);
        exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(command: Commands, settings: &Settings) -> Result<()> {
    if let Commands::Version = command {
        println!("docker-exporter {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let engine = DockerEngine::connect(&settings.docker_host, &settings.client_version)
        .with_context(|| {
            format!(
                "Error creating Docker client (docker-host: {}, client-version: {})",
                settings.docker_host, settings.client_version
            )
        })?;

    control::set_override(std::io::stdout().is_terminal());

    match command {
        Commands::List { names, all, pretty } => list(&engine, &names, all, pretty).await,
        Commands::Inspect { names } => inspect(&engine, &names).await,
        Commands::Export {
            names,
            all,
            pretty,
            format,
            output_dir,
        } => export(&engine, &names, all, pretty, format, output_dir).await,
        Commands::Images { names, pretty } => images(&engine, &names, pretty).await,
        Commands::InspectImage { names } => inspect_images(&engine, &names).await,
        Commands::Version => Ok(()),
    }
}

// ======================================================
// COMMANDS
// ======================================================

async fn list(engine: &dyn ContainerEngine, names: &[String], all: bool, pretty: bool) -> Result<()> {
    let containers = docker::select(engine, names, all).await?;
    print_table(docker::format_containers(&containers, pretty));
    Ok(())
}

async fn inspect(engine: &dyn ContainerEngine, names: &[String]) -> Result<()> {
    let containers = docker::select(engine, names, true).await?;
    let records = docker::inspect_all(engine, &containers).await?;

    println!("{}", render::json::render_all(&records, true)?);
    Ok(())
}

async fn export(
    engine: &dyn ContainerEngine,
    names: &[String],
    all: bool,
    pretty: bool,
    format: Format,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let containers = docker::select(engine, names, all).await?;
    let records = docker::inspect_all(engine, &containers).await?;
    debug!(count = records.len(), ?format, "rendering containers");

    let rendered = render::render(&records, format, pretty)?;

    let today = chrono::Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();
    output::dispatch(&rendered, format, output_dir.as_deref(), today, &mut stdout)?;

    Ok(())
}

async fn images(engine: &dyn ContainerEngine, names: &[String], pretty: bool) -> Result<()> {
    let images = docker::find_images(engine, names).await?;
    print_table(docker::format_images(&images, pretty));
    Ok(())
}

async fn inspect_images(engine: &dyn ContainerEngine, names: &[String]) -> Result<()> {
    let mut records = Vec::with_capacity(names.len());
    for name in names {
        records.push(docker::inspect_image_by_name(engine, name).await?);
    }

    println!("{}", render::json::to_json(&records, true)?);
    Ok(())
}

fn print_table(lines: Vec<String>) {
    let mut lines = lines.into_iter();

    if let Some(header) = lines.next() {
        println!("{}", header.bold());
    }
    for line in lines {
        println!("{}", line);
    }
}
