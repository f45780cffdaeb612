//! Per-file progress for publish runs.
//!
//! Draws an indicatif bar when stderr is a terminal and falls back to plain
//! line output when it is not (CI logs, pipes).

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub struct PublishProgress {
    /// The total number of files in the publish set
    total_files: usize,
    /// Current file being uploaded (1-indexed)
    current_file: usize,
    /// Progress bar (absent outside a terminal)
    bar: Option<ProgressBar>,
    /// Start time for calculating elapsed time
    start_time: Instant,
}

impl PublishProgress {
    pub fn new(total_files: usize) -> Self {
        let bar = ProgressBar::new(total_files as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        // The stderr draw target reports itself hidden when stderr is not
        // a terminal; plain line output takes over in that case.
        let bar = if bar.is_hidden() { None } else { Some(bar) };

        Self {
            total_files,
            current_file: 0,
            bar,
            start_time: Instant::now(),
        }
    }

    /// Progress sink that never draws, regardless of the terminal.
    #[allow(dead_code)]
    pub fn silent(total_files: usize) -> Self {
        Self {
            total_files,
            current_file: 0,
            bar: None,
            start_time: Instant::now(),
        }
    }

    /// Marks the next file as in flight.
    pub fn begin_file(&mut self, name: &str) {
        self.current_file += 1;
        let elapsed = self.start_time.elapsed();
        let msg = format!(
            "[{}/{}] Uploading {name}... ({elapsed:?})",
            self.current_file, self.total_files
        );
        match &self.bar {
            Some(bar) => {
                bar.set_message(msg);
                bar.set_position((self.current_file - 1) as u64);
            }
            None => eprintln!("{msg}"),
        }
    }

    /// Marks the current file as done.
    pub fn finish_file(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Finishes the progress reporting.
    pub fn finish(self) {
        let elapsed = self.start_time.elapsed();
        match self.bar {
            Some(bar) => {
                bar.set_message(format!(
                    "Processed {} files in {elapsed:?}",
                    self.total_files
                ));
                bar.finish();
            }
            None => eprintln!("Processed {} files in {elapsed:?}", self.total_files),
        }
    }
}
