// file: src/pipeline/progress.rs
// description: progress tracking and statistics for reconciliation runs
// reference: uses indicatif for progress bars and tracks per-page metrics

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub pages_processed: usize,
    pub pages_failed: usize,
    pub examples_seen: usize,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.pages_processed as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.pages_processed + self.pages_failed;
        if total == 0 {
            return 0.0;
        }
        (self.pages_processed as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    pages_processed: AtomicUsize,
    pages_failed: AtomicUsize,
    examples_seen: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_pages: usize) -> Self {
        Self::with_color(total_pages, true)
    }

    pub fn with_color(total_pages: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();
        let main_bar = create_progress_bar(&multi_progress, total_pages as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);
        Self::from_bars(main_bar, detail_bar)
    }

    /// Tracks counts without drawing anything.
    pub fn hidden() -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let main_bar = multi_progress.add(ProgressBar::new(0));
        let detail_bar = multi_progress.add(ProgressBar::new(0));
        Self::from_bars(main_bar, detail_bar)
    }

    fn from_bars(main_bar: ProgressBar, detail_bar: ProgressBar) -> Self {
        Self {
            main_bar,
            detail_bar,
            pages_processed: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
            examples_seen: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Pages are discovered per project, so the total grows as projects load.
    pub fn add_pages(&self, pages: usize) {
        self.main_bar.inc_length(pages as u64);
    }

    pub fn inc_pages_processed(&self, examples: usize) {
        self.pages_processed.fetch_add(1, Ordering::SeqCst);
        self.examples_seen.fetch_add(examples, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_pages_failed(&self) {
        self.pages_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Reconciliation complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            pages_processed: self.pages_processed.load(Ordering::SeqCst),
            pages_failed: self.pages_failed.load(Ordering::SeqCst),
            examples_seen: self.examples_seen.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn update_detail_bar(&self) {
        let examples = self.examples_seen.load(Ordering::SeqCst);
        let failed = self.pages_failed.load(Ordering::SeqCst);
        self.detail_bar
            .set_message(format!("Examples: {} | Failed pages: {}", examples, failed));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} pages ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
