//! The aggregation orchestrator.
//!
//! EXECUTION ORDER (fixed):
//!   1. Read the municipality directory (failure aborts the run).
//!   2. Apply the optional limit.
//!   3. For each municipality, in directory order:
//!        aggregate → append rows → update counters → notify observer
//!        → pause one delay unit unless it was the last one.
//!   4. Notify the observer with the final summary.
//!
//! RULES:
//!   - One municipality at a time; the table is only touched here.
//!   - Per-municipality failures never stop the loop.
//!   - The table is handed out by value from `finish`, after which the run
//!     is over.

use crate::{
    aggregator::{Aggregator, Sleeper, ThreadSleeper},
    config::PipelineConfig,
    error::PipelineResult,
    progress::{LogProgress, ProgressObserver, RunSummary},
    source::SalesSource,
    types::AccumulatedTable,
};

pub struct Orchestrator<S, O = LogProgress, Z = ThreadSleeper> {
    aggregator: Aggregator<S, Z>,
    observer:   O,
    table:      AccumulatedTable,
    summary:    RunSummary,
}

impl<S: SalesSource> Orchestrator<S, LogProgress> {
    pub fn new(source: S, config: &PipelineConfig) -> Self {
        Self::with_observer(source, config, LogProgress)
    }
}

impl<S: SalesSource, O: ProgressObserver> Orchestrator<S, O, ThreadSleeper> {
    pub fn with_observer(source: S, config: &PipelineConfig, observer: O) -> Self {
        Self::with_sleeper(source, config, observer, ThreadSleeper)
    }
}

impl<S: SalesSource, O: ProgressObserver, Z: Sleeper> Orchestrator<S, O, Z> {
    pub fn with_sleeper(source: S, config: &PipelineConfig, observer: O, sleeper: Z) -> Self {
        Self {
            aggregator: Aggregator::with_sleeper(source, config, sleeper),
            observer,
            table: AccumulatedTable::new(),
            summary: RunSummary::default(),
        }
    }

    /// Process every municipality, or only the first `limit` of them.
    ///
    /// Returns `Ok(false)` when the directory is empty and `Ok(true)` once
    /// the loop has completed, whether or not any municipality had data.
    /// A directory lookup failure is returned as an error. Each call starts
    /// from an empty table.
    pub fn run_all(&mut self, limit: Option<usize>) -> PipelineResult<bool> {
        self.table = AccumulatedTable::new();
        self.summary = RunSummary::default();

        let mut municipalities = self.aggregator.source().list_municipalities()?;
        log::info!("Found {} municipalities", municipalities.len());

        if municipalities.is_empty() {
            log::error!("No municipalities found; nothing to process");
            return Ok(false);
        }

        match limit {
            Some(n) if n > 0 => {
                municipalities.truncate(n);
                log::info!("Limited run: processing only {} municipalities", municipalities.len());
            }
            _ => log::info!("Processing all {} municipalities", municipalities.len()),
        }

        self.summary = RunSummary {
            total: municipalities.len(),
            ..RunSummary::default()
        };

        let last = municipalities.len();
        for (i, municipality) in municipalities.iter().enumerate() {
            log::info!("[{}/{last}] Processing {}", i + 1, municipality.name);

            let rows = self.aggregator.aggregate(&municipality.name);
            let count = rows.len();
            if count > 0 {
                self.table.append(rows);
                self.summary.records += count;
                self.summary.with_data += 1;
            } else {
                self.summary.without_data += 1;
            }
            self.summary.processed += 1;
            self.observer
                .on_municipality(&municipality.name, count, &self.summary);

            if i + 1 < last {
                log::debug!("Pausing before the next municipality");
                self.aggregator.pause();
            }
        }

        self.observer.on_finished(&self.summary);
        if self.table.is_empty() {
            log::warn!("Run completed but no municipality returned data");
        }
        Ok(true)
    }

    pub fn table(&self) -> &AccumulatedTable {
        &self.table
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// End the run and take the accumulated table.
    pub fn finish(self) -> AccumulatedTable {
        self.table
    }
}
