//! Migrate commands - bring packages up to the current template

use anyhow::{Result, bail};
use colored::Colorize;
use migration::{
    AutoConfirm, BatchReport, FsPackageSource, MANIFEST_FILE, MigrationMode, MigrationPlan,
    MigrationRecord, Outcome, execute,
};
use templating::TemplateCatalog;

use crate::Context;
use crate::cli::{AllArgs, MigrateCommand, ModeArgs, PackageArgs};
use crate::progress::BarProgress;
use crate::prompt::TerminalConfirmer;
use crate::ui;

pub fn run(ctx: &Context, cmd: MigrateCommand) -> Result<()> {
    match cmd {
        MigrateCommand::Package(args) => package(ctx, &args),
        MigrateCommand::All(args) => all(ctx, &args),
        MigrateCommand::List => list(ctx),
    }
}

fn mode(args: ModeArgs) -> MigrationMode {
    if args.dry_run {
        MigrationMode::DryRun
    } else if args.force {
        MigrationMode::Forced
    } else {
        MigrationMode::Interactive
    }
}

fn mode_label(mode: MigrationMode) -> &'static str {
    match mode {
        MigrationMode::DryRun => "dry run",
        MigrationMode::Interactive => "interactive",
        MigrationMode::Forced => "forced",
    }
}

fn package(ctx: &Context, args: &PackageArgs) -> Result<()> {
    let dir = &args.path;
    if !dir.is_dir() {
        bail!("Package directory not found: {}", dir.display());
    }
    if !dir.join(MANIFEST_FILE).is_file() {
        bail!("No {MANIFEST_FILE} in {}", dir.display());
    }

    let catalog = ctx.config.load_catalog()?;
    let plan = MigrationPlan::single(dir);
    let report = run_plan(ctx, &plan, &catalog, mode(args.mode), None)?;
    print_report(ctx, &report);
    Ok(())
}

fn all(ctx: &Context, args: &AllArgs) -> Result<()> {
    let root = args.root.clone().unwrap_or_else(|| ctx.config.packages_root());
    let catalog = ctx.config.load_catalog()?;

    let source = FsPackageSource::new(&root);
    let plan = MigrationPlan::discover(&source, args.alignment.map(Into::into))?;
    if plan.is_empty() && !args.json {
        ui::info(&format!("No packages found under {}", root.join("packages").display()));
        return Ok(());
    }

    let report = run_plan(ctx, &plan, &catalog, mode(args.mode), args.jobs)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(ctx, &report);
    }
    Ok(())
}

fn run_plan(
    ctx: &Context,
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    mode: MigrationMode,
    jobs: Option<usize>,
) -> Result<BatchReport> {
    let opts = ctx.config.migrate_options(mode, jobs);
    // Prompts and a live bar would fight over the terminal
    let mut progress = BarProgress::new(!ctx.quiet && mode != MigrationMode::Interactive);

    log::debug!(
        "Migrating {} package(s), mode {}, {} job(s)",
        plan.len(),
        mode_label(mode),
        opts.effective_jobs()
    );

    match mode {
        MigrationMode::Interactive => {
            execute(plan, catalog, &opts, &mut progress, &mut TerminalConfirmer)
        }
        _ => execute(plan, catalog, &opts, &mut progress, &mut AutoConfirm),
    }
}

fn print_report(ctx: &Context, report: &BatchReport) {
    ui::header(&format!(
        "Migration to template v{} ({})",
        report.template_version,
        mode_label(report.mode)
    ));

    for record in &report.records {
        print_record(ctx, report.mode, record);
    }

    let summary = &report.summary;
    ui::section("Summary");
    ui::kv("Applied", &summary.applied.to_string());
    ui::kv("Previewed", &summary.previewed.to_string());
    ui::kv("Already conformant", &summary.no_op.to_string());
    ui::kv("Skipped", &summary.skipped.to_string());
    ui::kv("Failed", &summary.failed.to_string());
    let elapsed = report.finished_at - report.started_at;
    ui::kv("Elapsed", &format!("{}ms", elapsed.num_milliseconds()));
    println!();

    if summary.failed > 0 {
        ui::warn(&format!("{} package(s) failed", summary.failed));
    } else if summary.previewed > 0 {
        ui::info("Dry run - no changes made");
    } else if summary.applied > 0 {
        ui::success(&format!("{} package(s) migrated", summary.applied));
    } else if !ctx.quiet {
        ui::success("Everything already conforms");
    }
}

fn print_record(ctx: &Context, mode: MigrationMode, record: &MigrationRecord) {
    if ctx.quiet && matches!(record.outcome, Outcome::NoOp) {
        return;
    }
    println!(
        "  {} {}",
        ui::outcome_label(&record.outcome),
        record.path.display()
    );

    match &record.outcome {
        Outcome::Skipped { reason } => ui::dim(reason),
        Outcome::Previewed => {
            if let Some(diff) = &record.diff {
                ui::diff(diff);
            }
        }
        Outcome::Applied if mode == MigrationMode::Forced && ctx.verbose > 0 => {
            for backup in &record.backups {
                ui::dim(&format!("backup: {}", backup.display()));
            }
        }
        _ => {}
    }

    if ctx.verbose > 1
        && let (Some(before), Some(after)) = (&record.fingerprint_before, &record.fingerprint_after)
        && before != after
    {
        ui::dim(&format!("fingerprint {} -> {}", short(before), short(after)));
    }
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

fn list(ctx: &Context) -> Result<()> {
    let catalog = ctx.config.load_catalog()?;
    ui::header(&format!("Template catalog v{}", catalog.version()));

    if catalog.migrations().is_empty() {
        ui::info("No template versions recorded");
        return Ok(());
    }

    for entry in catalog.migrations() {
        println!(
            "  {}  {} ({} change(s))",
            format!("v{}", entry.version).bold(),
            entry.description,
            entry.change_count()
        );
        if ctx.verbose > 0 {
            for change in &entry.changes {
                ui::dim(&format!("- {}", change.to_inline_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_flags() {
        let flags = |dry_run, force| ModeArgs { dry_run, force };
        assert_eq!(mode(flags(true, false)), MigrationMode::DryRun);
        assert_eq!(mode(flags(false, true)), MigrationMode::Forced);
        assert_eq!(mode(flags(false, false)), MigrationMode::Interactive);
    }

    #[test]
    fn test_short_fingerprint() {
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }
}
