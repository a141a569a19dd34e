// file: src/publisher/progress.rs
// description: progress reporting while file contents are read
// reference: uses indicatif for progress bars and tracks read metrics

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Clone)]
pub struct ReadProgress {
    bar: ProgressBar,
    files_read: Arc<AtomicUsize>,
    bytes_read: Arc<AtomicU64>,
}

impl ReadProgress {
    pub fn new(total_files: usize, visible: bool) -> Self {
        let bar = if visible {
            create_progress_bar(total_files as u64)
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            files_read: Arc::new(AtomicUsize::new(0)),
            bytes_read: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record(&self, path: &str, bytes: u64) {
        self.files_read.fetch_add(1, Ordering::SeqCst);
        self.bytes_read.fetch_add(bytes, Ordering::SeqCst);
        self.bar.set_message(path.to_string());
        self.bar.inc(1);
    }

    pub fn files_read(&self) -> usize {
        self.files_read.load(Ordering::SeqCst)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::SeqCst)
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Failed to create progress bar template")
            .progress_chars("█▓▒░"),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_counts() {
        let progress = ReadProgress::new(3, false);
        progress.record("a.txt", 5);
        progress.clone().record("sub/b.txt", 7);

        assert_eq!(progress.files_read(), 2);
        assert_eq!(progress.bytes_read(), 12);
        progress.finish();
    }
}
