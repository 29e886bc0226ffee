use std::path::PathBuf;

mod coverage;
mod report;
mod summary;
mod terminal;

use clap::ArgAction;
use coverage::Coverage;
use report::Report;
use summary::Summary;
use terminal::Colorize;
use traceability::{Config, Engine, PassFailure};

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run()
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show requirement link coverage per module
    Coverage(Coverage),

    /// Write a report of every requirement lacking a checked link
    Report(Report),

    /// Write an XML summary table for the build server
    Summary(Summary),
}

impl Command {
    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Coverage(command) => command.run()?,
            Self::Report(command) => command.run()?,
            Self::Summary(command) => command.run()?,
        }
        Ok(())
    }
}

/// Run inputs shared by every subcommand.
///
/// Values from a configuration file and from the command line merge: lists
/// append, check flags combine, and an explicit `--module-dir` wins.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Configuration file (TOML, JSON, or YAML) providing run inputs
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Requirement module to load (repeatable, comma separated)
    #[arg(long = "module", value_name = "NAME", value_delimiter = ',')]
    modules: Vec<String>,

    /// Directory containing the module CSV exports
    #[arg(long, value_name = "DIR")]
    module_dir: Option<PathBuf>,

    /// Documentation output root holding source-code links (repeatable)
    #[arg(long = "src-dir", value_name = "DIR")]
    src_dirs: Vec<PathBuf>,

    /// Documentation output root holding test-code links (repeatable)
    #[arg(long = "test-dir", value_name = "DIR")]
    test_dirs: Vec<PathBuf>,

    /// Require every requirement to be linked to source code
    #[arg(long)]
    check_src_links: bool,

    /// Require every requirement to be linked to test code
    #[arg(long)]
    check_test_links: bool,
}

impl RunArgs {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        config.merge(Config {
            modules: self.modules,
            module_dir: self.module_dir,
            src_dirs: self.src_dirs,
            test_dirs: self.test_dirs,
            check_src_links: self.check_src_links,
            check_test_links: self.check_test_links,
        });

        Ok(config)
    }
}

/// Loads the repository, runs every linkage pass, and reports pass failures
/// on stderr. Pass failures do not abort the run.
fn run_engine(config: &Config) -> anyhow::Result<(Engine, Vec<PassFailure>)> {
    let mut engine = Engine::load(config)?;
    let failures = engine.scan(config);

    for failure in &failures {
        eprintln!(
            "{}",
            format!(
                "⚠️  linkage pass failed for {}: {}",
                failure.directory.display(),
                failure.error
            )
            .warning()
        );
    }

    Ok((engine, failures))
}
