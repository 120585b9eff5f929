use std::sync::Mutex;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use xrdmerge_core::pipeline::{MergeStage, ProgressReporter};

/// Drives one indicatif bar per pipeline stage.
///
/// Stages with a known item count get a bar, the rest a spinner.
pub struct BarReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:20} [{bar:40}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: MergeStage, total_items: Option<usize>) {
        let pb = match total_items {
            Some(total) => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(bar_style());
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(spinner_style());
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        pb.set_message(stage.to_string());

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn advance(&self, items_done: usize) {
        self.with_bar(|pb| pb.set_position(items_done as u64));
    }

    fn finish_stage(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish();
            }
        }
    }

    fn partial_window(&self, leftover: usize, window: usize) {
        let warn = Style::new().yellow().bold();
        let message = format!(
            "{} last window holds {leftover} frame(s) instead of {window}",
            warn.apply_to("warning:")
        );
        let mut shown = false;
        self.with_bar(|pb| {
            pb.println(&message);
            shown = true;
        });
        if !shown {
            eprintln!("{message}");
        }
    }
}
