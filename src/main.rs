use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use xunit_explorer::cli;
use xunit_explorer::config::{Conventions, ProjectContext};
use xunit_explorer::logging::{self, Verbosity};
use xunit_explorer::output::OutputFormatter;
use xunit_explorer::{Project, XunitConventions};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));
    args.validate().context("Invalid arguments")?;

    let conventions = Conventions::load_or_default(args.config.as_deref())
        .context("Failed to load conventions")?;
    let context = ProjectContext::for_root(&args.path, args.assembly.clone());
    info!(
        project = %context.name,
        assembly = %context.assembly_location.display(),
        "scanning project"
    );

    let project = Project::new(context, Arc::new(XunitConventions::new(conventions)));

    let mut scans = Vec::new();
    for pass in 1..=args.passes {
        scans = project
            .scan_all(|| false)
            .with_context(|| format!("Scan pass {pass} failed"))?;
    }

    let rendered = OutputFormatter::format(&scans, project.registry(), args.passes, args.format)
        .context("Failed to format output")?;

    match &args.output_file {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "output written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
