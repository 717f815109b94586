//! Scaffold command - create a conforming package from scratch

use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::ScaffoldArgs;
use crate::ui;

pub fn run(ctx: &Context, args: &ScaffoldArgs) -> Result<()> {
    let catalog = ctx.config.load_catalog()?;
    let report = migration::scaffold(&args.path, &args.name, &catalog, args.dry_run)
        .with_context(|| format!("Could not scaffold {} at {}", args.name, args.path.display()))?;

    ui::header(&format!("Scaffold {} ({})", args.name, report.alignment));
    ui::section("Parameters");
    for (name, value) in report.params.iter() {
        ui::kv(name, &value.to_inline_string());
    }

    ui::section(if args.dry_run { "Would create" } else { "Created" });
    for dir in &report.directories {
        ui::dim(&format!("{}/", dir.display()));
    }
    for file in &report.files {
        ui::dim(&file.display().to_string());
    }
    println!();

    if args.dry_run {
        ui::info("Dry run - no changes made");
    } else {
        ui::success(&format!("Package {} is ready", args.name));
    }
    Ok(())
}
