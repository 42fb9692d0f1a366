//! Progress reporting hook for the orchestrator.

use serde::Serialize;

/// Running counters for one orchestration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Municipalities scheduled for this run, after any limit.
    pub total:        usize,
    pub processed:    usize,
    pub with_data:    usize,
    pub without_data: usize,
    pub records:      usize,
}

impl RunSummary {
    /// Share of scheduled municipalities that returned rows, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_data as f64 / self.total as f64 * 100.0
    }
}

/// Called by the orchestrator after every municipality and once at the end.
pub trait ProgressObserver {
    fn on_municipality(&mut self, municipality: &str, rows: usize, summary: &RunSummary);

    fn on_finished(&mut self, summary: &RunSummary);
}

/// Default observer: writes progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_municipality(&mut self, municipality: &str, rows: usize, summary: &RunSummary) {
        if rows > 0 {
            log::info!("Added {rows} records for '{municipality}'");
        } else {
            log::warn!("No data found for '{municipality}'");
        }
        log::info!(
            "[{}/{}] records={} with_data={} without_data={}",
            summary.processed,
            summary.total,
            summary.records,
            summary.with_data,
            summary.without_data
        );
    }

    fn on_finished(&mut self, summary: &RunSummary) {
        log::info!(
            "Processing complete: {} records, {} municipalities with data, {} without, success rate {:.1}%",
            summary.records,
            summary.with_data,
            summary.without_data,
            summary.success_rate()
        );
    }
}
