//! Migration engine - runs packages through infer, render, merge, detect, apply
//!
//! Each package is independent: a failure becomes that package's outcome
//! and the batch carries on. Non-interactive batches run on a rayon pool;
//! interactive ones run sequentially because prompts are serialized.

use crate::backup::{backup_artifacts, write_atomic};
use crate::context::{CancelToken, Confirmer, ProgressCallback};
use crate::diff::ManifestDiff;
use crate::error::{MigrationError, Result};
use crate::inference::infer;
use crate::planner::MigrationPlan;
use crate::record::MigrationRecord;
use crate::types::{BatchReport, BatchSummary, Candidate, MigrateOptions, MigrationMode, Outcome};
use chrono::Utc;
use manifest::Node;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use templating::TemplateCatalog;

/// Migrate a single package
///
/// Never fails: every error ends up in the record's outcome.
pub fn migrate_package<C: Confirmer + ?Sized>(
    candidate: &Candidate,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    confirm: &mut C,
) -> MigrationRecord {
    let mut record = MigrationRecord::new(&candidate.dir);
    match run_pipeline(candidate, catalog, opts, confirm, &mut record) {
        Ok(outcome) => record.finish(outcome),
        Err(e) => {
            log::warn!("{}: {e}", candidate.dir.display());
            record.finish(Outcome::failed(e.to_string()))
        }
    }
}

fn run_pipeline<C: Confirmer + ?Sized>(
    candidate: &Candidate,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    confirm: &mut C,
    record: &mut MigrationRecord,
) -> Result<Outcome> {
    // The discovery copy may be stale; merge against what is on disk now
    let manifest_path = candidate.manifest_path();
    let current_text = match std::fs::read_to_string(&manifest_path) {
        Ok(text) => text,
        Err(e) => return Ok(Outcome::failed(format!("unreadable manifest: {e}"))),
    };
    let existing = match manifest::from_str(&current_text) {
        Ok(doc) => doc,
        Err(e) => return Ok(Outcome::failed(format!("unreadable manifest: {e}"))),
    };

    // INFER
    let (alignment, params) = infer(&candidate.dir, &existing);
    record.params = params;
    let Some(alignment) = alignment else {
        return Ok(Outcome::skipped("could not infer alignment from path or name"));
    };
    record.alignment = Some(alignment);

    // RENDER
    let violations = catalog.validate_params(&record.params);
    if !violations.is_empty() {
        return Err(MigrationError::Validation(violations));
    }
    let rendered = catalog.render_project(alignment, &record.params)?;

    // MERGE
    let merged = templating::merge(&rendered, &existing, catalog.policy())?;
    record.fingerprint_before = Some(manifest::fingerprint(&existing));
    record.fingerprint_after = Some(manifest::fingerprint(&merged));
    record.rendered = Some(rendered);

    // DETECT
    if manifest::equivalent(&merged, &existing) {
        record.existing = Some(existing);
        record.merged = Some(merged);
        return Ok(Outcome::NoOp);
    }

    let merged_text = manifest::to_string(&merged)?;
    record.diff = Some(ManifestDiff::compute(&current_text, &merged_text));
    record.existing = Some(existing);
    record.merged = Some(merged);

    match opts.mode {
        MigrationMode::DryRun => return Ok(Outcome::Previewed),
        MigrationMode::Interactive => {
            if let Some(diff) = &record.diff {
                confirm.review(&candidate.dir, diff);
            }
            let prompt = format!("Apply changes to {}?", record.display_name());
            let approved = confirm
                .confirm(&prompt)
                .map_err(|e| MigrationError::Prompt(e.to_string()))?;
            if !approved {
                return Ok(Outcome::skipped("declined"));
            }
        }
        MigrationMode::Forced => {}
    }

    // APPLY
    record.backups = backup_artifacts(&candidate.dir, &opts.backup_suffix)?;
    write_atomic(&manifest_path, &merged_text)?;
    log::info!("Migrated {}", manifest_path.display());
    Ok(Outcome::Applied)
}

/// Run every package in a plan
///
/// Records come back in discovery order regardless of completion order.
pub fn execute<P, C>(
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    progress: &mut P,
    confirm: &mut C,
) -> anyhow::Result<BatchReport>
where
    P: ProgressCallback,
    C: Confirmer,
{
    execute_with_cancel(plan, catalog, opts, progress, confirm, &CancelToken::new())
}

/// Run a plan, skipping packages not yet started once `cancel` fires
pub fn execute_with_cancel<P, C>(
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    progress: &mut P,
    confirm: &mut C,
    cancel: &CancelToken,
) -> anyhow::Result<BatchReport>
where
    P: ProgressCallback,
    C: Confirmer,
{
    let started_at = Utc::now();
    progress.on_batch_start(plan.len());

    let records = if opts.effective_jobs() == 1 || plan.len() <= 1 {
        execute_sequential(plan, catalog, opts, progress, confirm, cancel)
    } else {
        execute_parallel(plan, catalog, opts, progress, cancel)?
    };

    progress.on_batch_complete();

    let mut summary = BatchSummary::default();
    for record in &records {
        summary.add(&record.outcome);
    }

    Ok(BatchReport {
        template_version: catalog.version().to_string(),
        mode: opts.mode,
        started_at,
        finished_at: Utc::now(),
        summary,
        records,
    })
}

fn execute_sequential<P: ProgressCallback, C: Confirmer>(
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    progress: &mut P,
    confirm: &mut C,
    cancel: &CancelToken,
) -> Vec<MigrationRecord> {
    let mut records = Vec::with_capacity(plan.len());
    for candidate in &plan.candidates {
        let record = if cancel.is_cancelled() {
            cancelled(candidate)
        } else {
            migrate_package(candidate, catalog, opts, confirm)
        };
        progress.on_package_complete(&record.path, &record.outcome);
        records.push(record);
    }
    records
}

fn execute_parallel<P: ProgressCallback>(
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
    progress: &mut P,
    cancel: &CancelToken,
) -> anyhow::Result<Vec<MigrationRecord>> {
    let results: Arc<Mutex<Vec<(usize, MigrationRecord)>>> = Arc::new(Mutex::new(Vec::new()));
    // Progress callbacks are not thread-safe; guard the one we were given.
    let progress = Mutex::new(progress);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.effective_jobs())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create migration thread pool: {e}"))?;

    pool.install(|| {
        plan.candidates
            .par_iter()
            .enumerate()
            .for_each(|(index, candidate)| {
                // Parallel runs never prompt: the mode is dry run or forced.
                let record = if cancel.is_cancelled() {
                    cancelled(candidate)
                } else {
                    migrate_package(candidate, catalog, opts, &mut crate::context::AutoDecline)
                };

                match progress.lock() {
                    Ok(mut p) => p.on_package_complete(&record.path, &record.outcome),
                    Err(poisoned) => poisoned
                        .into_inner()
                        .on_package_complete(&record.path, &record.outcome),
                }
                push_record(&results, index, record);
            });
    });

    let mut records = into_records(results)?;
    records.sort_by_key(|(index, _)| *index);
    Ok(records.into_iter().map(|(_, record)| record).collect())
}

fn cancelled(candidate: &Candidate) -> MigrationRecord {
    MigrationRecord::new(&candidate.dir).finish(Outcome::skipped("cancelled"))
}

fn push_record(
    results: &Arc<Mutex<Vec<(usize, MigrationRecord)>>>,
    index: usize,
    record: MigrationRecord,
) {
    match results.lock() {
        Ok(mut locked) => locked.push((index, record)),
        Err(poisoned) => poisoned.into_inner().push((index, record)),
    }
}

fn into_records(
    results: Arc<Mutex<Vec<(usize, MigrationRecord)>>>,
) -> anyhow::Result<Vec<(usize, MigrationRecord)>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect migration results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Migrate with no progress reporting and no prompts
///
/// For tests and callers that pick `DryRun` or `Forced`.
pub fn execute_simple(
    plan: &MigrationPlan,
    catalog: &TemplateCatalog,
    opts: &MigrateOptions,
) -> anyhow::Result<BatchReport> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(plan, catalog, opts, &mut NoProgress, &mut AutoConfirm)
}

/// Whether a document already matches what the catalog would produce
pub fn conforms(
    candidate_dir: &std::path::Path,
    document: &Node,
    catalog: &TemplateCatalog,
) -> Result<bool> {
    let (Some(alignment), params) = infer(candidate_dir, document) else {
        return Err(MigrationError::InferenceAmbiguous(candidate_dir.to_path_buf()));
    };
    let rendered = catalog.render_project(alignment, &params)?;
    let merged = templating::merge(&rendered, document, catalog.policy())?;
    Ok(manifest::equivalent(&merged, document))
}
