//! Batch progress bar
//!
//! Bridges [`migration::ProgressCallback`] to an indicatif bar. Hidden in
//! quiet mode and for single-package runs.

use indicatif::{ProgressBar, ProgressStyle};
use migration::{Outcome, ProgressCallback};
use std::path::Path;

use crate::ui;

pub struct BarProgress {
    bar: Option<ProgressBar>,
    enabled: bool,
}

impl BarProgress {
    pub fn new(enabled: bool) -> Self {
        Self { bar: None, enabled }
    }
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize) {
        if !self.enabled || count < 2 {
            return;
        }
        let bar = ProgressBar::new(count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        self.bar = Some(bar);
    }

    fn on_package_complete(&mut self, path: &Path, outcome: &Outcome) {
        if let Some(bar) = &self.bar {
            let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
            bar.set_message(format!("{} {}", ui::truncate_path(&name, 30), outcome));
            bar.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_bar_never_draws() {
        let mut progress = BarProgress::new(false);
        progress.on_batch_start(10);
        assert!(progress.bar.is_none());
        progress.on_package_complete(Path::new("packages/a"), &Outcome::NoOp);
        progress.on_batch_complete();
    }

    #[test]
    fn test_bar_tracks_packages() {
        let mut progress = BarProgress::new(true);
        progress.on_batch_start(3);
        progress.on_package_complete(Path::new("packages/a"), &Outcome::Applied);
        assert_eq!(progress.bar.as_ref().map(ProgressBar::position), Some(1));
        progress.on_batch_complete();
        assert!(progress.bar.is_none());
    }
}
