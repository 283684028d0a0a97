use clap::Parser;
use meson2ide_build::{ToolConfig, ToolErrorPolicy};
use meson2ide_driver::{Driver, DriverError, ProjectLayout};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meson2ide")]
#[command(author, version, about = "Generate IDE projects from Meson")]
struct Cli {
    /// Source or build path; the current directory plays the other role
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Configuration file (default: <source>/meson2ide.toml if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project name to use instead of asking Meson
    #[arg(long)]
    name: Option<String>,

    /// Compiler to run for header discovery instead of the recorded one
    #[arg(long)]
    compiler: Option<String>,

    /// Number of parallel compiler invocations
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-invocation timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Abort when a compiler invocation fails instead of skipping its headers
    #[arg(long)]
    fail_fast: bool,

    /// More logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, config: &mut ToolConfig) {
        if let Some(name) = &self.name {
            config.project_name = Some(name.clone());
        }
        if let Some(compiler) = &self.compiler {
            config.discovery.compiler = Some(compiler.clone());
        }
        if let Some(jobs) = self.jobs {
            config.discovery.jobs = Some(jobs);
        }
        if let Some(timeout) = self.timeout {
            config.discovery.timeout_secs = timeout;
        }
        if self.fail_fast {
            config.discovery.errors = ToolErrorPolicy::Fail;
        }
    }
}

const LOG_TARGETS: &[&str] = &[
    "meson2ide",
    "meson2ide_build",
    "meson2ide_export",
    "meson2ide_driver",
];

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let layout = ProjectLayout::detect_from_current_dir(&cli.path)?;

    let mut config = ToolConfig::discover(cli.config.as_deref(), &layout.source_dir)
        .map_err(DriverError::Config)?;
    cli.apply(&mut config);

    let files = Driver::new(config).run(&layout)?;
    println!("Wrote {}", files.creator.display());

    Ok(())
}
