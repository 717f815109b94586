//! Terminal confirmation for interactive migrations

use anyhow::Result;
use dialoguer::Confirm;
use migration::{Confirmer, ManifestDiff};
use std::path::Path;

use crate::ui;

/// Shows each pending diff and asks before writing
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn review(&mut self, package: &Path, diff: &ManifestDiff) {
        ui::section(&package.display().to_string());
        ui::diff(diff);
        ui::dim(&format!(
            "{} insertion(s), {} deletion(s)",
            diff.insertions(),
            diff.deletions()
        ));
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
