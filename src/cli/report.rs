use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use tracing::instrument;
use traceability::render::write_gap_report;

use super::{run_engine, RunArgs};

#[derive(Debug, Parser)]
#[command(about = "Write a report of every requirement lacking a checked link")]
pub struct Report {
    #[command(flatten)]
    args: RunArgs,

    /// Write the report to this file instead of stdout
    #[arg(long, short, value_name = "FILE")]
    out: Option<PathBuf>,
}

impl Report {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let Self { args, out } = self;

        let config = args.into_config()?;
        let kinds = config.checked_kinds();

        let (engine, _failures) = run_engine(&config)?;

        match out {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("failed to create report file {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                write_gap_report(&mut writer, engine.repository(), &kinds)?;
                writer.flush()?;
                println!("Wrote gap report to {}", path.display());
            }
            None => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                write_gap_report(&mut lock, engine.repository(), &kinds)?;
            }
        }

        Ok(())
    }
}
