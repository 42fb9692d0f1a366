//! Per-municipality aggregation with bounded retry.
//!
//! A timed-out query is retried after one delay unit, up to
//! `max_attempts` attempts in total. Any other failure, or running out of
//! attempts, skips the municipality with an empty result. Nothing raised by
//! the source escapes `aggregate`.

use crate::{
    config::PipelineConfig,
    source::SalesSource,
    types::SalesAggregateRow,
};
use std::time::{Duration, Instant};

/// Every pause in the pipeline goes through a Sleeper.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread. Zero durations return immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

pub struct Aggregator<S, Z = ThreadSleeper> {
    source:       S,
    sleeper:      Z,
    max_attempts: u32,
    delay:        Duration,
}

impl<S: SalesSource> Aggregator<S, ThreadSleeper> {
    pub fn new(source: S, config: &PipelineConfig) -> Self {
        Self::with_sleeper(source, config, ThreadSleeper)
    }
}

impl<S: SalesSource, Z: Sleeper> Aggregator<S, Z> {
    pub fn with_sleeper(source: S, config: &PipelineConfig, sleeper: Z) -> Self {
        Self {
            source,
            sleeper,
            max_attempts: config.max_attempts.max(1),
            delay: config.delay(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Wait one delay unit.
    pub fn pause(&self) {
        self.sleeper.sleep(self.delay);
    }

    pub fn aggregate(&self, municipality: &str) -> Vec<SalesAggregateRow> {
        for attempt in 1..=self.max_attempts {
            log::info!("Querying municipality '{municipality}' (attempt {attempt}/{})", self.max_attempts);

            let started = Instant::now();
            match self.source.grouped_totals(municipality) {
                Ok(rows) => {
                    log::info!(
                        "Municipality '{municipality}': {} rows in {:.2}s",
                        rows.len(),
                        started.elapsed().as_secs_f64()
                    );
                    return rows;
                }
                Err(e) if e.is_timeout() && attempt < self.max_attempts => {
                    log::warn!(
                        "Municipality '{municipality}': {e}; retrying ({}/{}) in {:?}",
                        attempt + 1,
                        self.max_attempts,
                        self.delay
                    );
                    self.pause();
                }
                Err(e) => {
                    log::error!("Municipality '{municipality}' skipped after attempt {attempt}: {e}");
                    return Vec::new();
                }
            }
        }
        Vec::new()
    }
}
