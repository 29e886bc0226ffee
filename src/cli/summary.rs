use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use tracing::instrument;
use traceability::render::write_summary;

use super::{run_engine, RunArgs};

#[derive(Debug, Parser)]
#[command(about = "Write an XML summary table for the build server")]
pub struct Summary {
    #[command(flatten)]
    args: RunArgs,

    /// Output file for the summary table
    #[arg(long, short, value_name = "FILE", default_value = "traceability_summary.xml")]
    out: PathBuf,
}

impl Summary {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let Self { args, out } = self;

        let config = args.into_config()?;
        let kinds = config.checked_kinds();

        let (engine, _failures) = run_engine(&config)?;
        let report = engine.aggregate(&kinds);

        let file = File::create(&out)
            .with_context(|| format!("failed to create summary file {}", out.display()))?;
        let mut writer = BufWriter::new(file);
        write_summary(&mut writer, &report)?;
        writer.flush()?;

        println!("Wrote requirements summary to {}", out.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_run_writes_the_xml_table() {
        let exports = tempfile::tempdir().unwrap();
        std::fs::write(
            exports.path().join("SYSTEM.csv"),
            "ID,SW Requirements\nREQ-1,Do X\n",
        )
        .unwrap();

        let out = exports.path().join("summary.xml");

        let summary = Summary {
            args: RunArgs {
                config: None,
                modules: vec!["SYSTEM".to_string()],
                module_dir: Some(exports.path().to_path_buf()),
                src_dirs: Vec::new(),
                test_dirs: Vec::new(),
                check_src_links: true,
                check_test_links: false,
            },
            out: out.clone(),
        };

        summary.run().expect("summary command should succeed");

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.contains("Source Links (%)"));
        assert!(content.contains(">SYSTEM</td>"));
        assert!(content.contains(r#"bgcolor="red""#));
    }
}
