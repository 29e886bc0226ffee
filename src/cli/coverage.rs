use std::process;

use clap::Parser;
use tracing::instrument;
use traceability::{CoverageReport, CoverageStats, Diagnostics, LinkKind};

use super::{
    run_engine,
    terminal::{is_narrow, Colorize},
    RunArgs,
};

#[derive(Debug, Parser)]
#[command(about = "Show requirement link coverage per module")]
pub struct Coverage {
    #[command(flatten)]
    args: RunArgs,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Exit with code 2 when coverage is incomplete or a pass failed
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Coverage {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let Self {
            args,
            output,
            check,
        } = self;

        let config = args.into_config()?;
        let kinds = config.checked_kinds();

        let (engine, failures) = run_engine(&config)?;
        let report = engine.aggregate(&kinds);

        match output {
            OutputFormat::Json => output_json(&report, engine.diagnostics())?,
            OutputFormat::Table => output_table(&report),
        }

        let incomplete = report
            .modules()
            .any(|(_, stats)| kinds.iter().any(|&kind| !stats.is_complete(kind)));

        // Exit with a non-zero code when the build pipeline should fail.
        if check && (incomplete || !failures.is_empty()) {
            process::exit(2);
        }

        Ok(())
    }
}

const fn column_title(kind: LinkKind) -> &'static str {
    match kind {
        LinkKind::Source => "Source Links",
        LinkKind::Test => "Test Links",
    }
}

fn format_stats(stats: &CoverageStats, kind: LinkKind) -> String {
    format!(
        "{}/{} ({:.2}%)",
        stats.satisfied(kind),
        stats.requirements(),
        stats.percent(kind)
    )
}

fn colorize(text: String, complete: bool) -> String {
    if complete {
        text.success()
    } else {
        text.warning()
    }
}

fn output_table(report: &CoverageReport) {
    let kinds = report.kinds();

    if is_narrow() {
        for (name, stats) in report.modules() {
            println!("{name}");
            for &kind in kinds {
                let value = format_stats(stats, kind);
                println!(
                    "  {}: {}",
                    column_title(kind),
                    colorize(value, stats.is_complete(kind))
                );
            }
        }
        println!("Total");
        for &kind in kinds {
            let overall = report.overall();
            let value = format_stats(overall, kind);
            println!(
                "  {}: {}",
                column_title(kind),
                colorize(value, overall.is_complete(kind))
            );
        }
        return;
    }

    let name_width = report
        .modules()
        .map(|(name, _)| name.len())
        .chain([6])
        .max()
        .unwrap_or(6);

    // Pad first, colorize after, so ANSI escapes don't break the alignment.
    print!("{:<name_width$}  {:>6}", "Module", "Reqs");
    for &kind in kinds {
        print!("  {:>20}", column_title(kind));
    }
    println!();
    println!(
        "{}",
        "─".repeat(name_width + 8 + kinds.len() * 22).dim()
    );

    for (name, stats) in report.modules() {
        print!("{name:<name_width$}  {:>6}", stats.requirements());
        for &kind in kinds {
            let value = format!("{:>20}", format_stats(stats, kind));
            print!("  {}", colorize(value, stats.is_complete(kind)));
        }
        println!();
    }

    let overall = report.overall();
    println!(
        "{}",
        "─".repeat(name_width + 8 + kinds.len() * 22).dim()
    );
    print!("{:<name_width$}  {:>6}", "Total", overall.requirements());
    for &kind in kinds {
        let value = format!("{:>20}", format_stats(overall, kind));
        print!("  {}", colorize(value, overall.is_complete(kind)));
    }
    println!();

    let incomplete = report
        .modules()
        .any(|(_, stats)| kinds.iter().any(|&kind| !stats.is_complete(kind)));
    if incomplete {
        println!();
        println!(
            "{}",
            "Run 'trace report' to list the unlinked requirements".dim()
        );
    }
}

fn output_json(report: &CoverageReport, diagnostics: &Diagnostics) -> anyhow::Result<()> {
    use serde_json::json;

    let kind_key = |kind: LinkKind| match kind {
        LinkKind::Source => "source",
        LinkKind::Test => "test",
    };

    let stats_json = |stats: &CoverageStats| {
        let mut links = serde_json::Map::new();
        for &kind in report.kinds() {
            links.insert(
                kind_key(kind).to_string(),
                json!({
                    "satisfied": stats.satisfied(kind),
                    "percent": stats.percent(kind),
                }),
            );
        }
        json!({
            "requirements": stats.requirements(),
            "links": links,
        })
    };

    let modules: Vec<_> = report
        .modules()
        .map(|(name, stats)| {
            let mut value = stats_json(stats);
            value["name"] = json!(name);
            value
        })
        .collect();

    let output = json!({
        "modules": modules,
        "total": stats_json(report.overall()),
        "warnings": diagnostics
            .warnings()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
