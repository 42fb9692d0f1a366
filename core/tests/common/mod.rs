//! Scripted SalesSource used by the pipeline tests.

#![allow(dead_code)]

use medsales_core::{
    aggregator::Sleeper,
    error::{LookupError, QueryError},
    source::SalesSource,
    types::{MunicipalityRef, SalesAggregateRow},
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

/// What a scripted municipality answers on its next query.
pub enum Reply {
    Rows(Vec<SalesAggregateRow>),
    Timeout,
    Failure,
}

#[derive(Default)]
pub struct ScriptedSource {
    directory:      Vec<MunicipalityRef>,
    unreachable:    bool,
    replies:        RefCell<HashMap<String, VecDeque<Reply>>>,
    always_timeout: HashSet<String>,
    calls:          RefCell<HashMap<String, usize>>,
}

impl ScriptedSource {
    pub fn new(names: &[&str]) -> Self {
        Self {
            directory: names
                .iter()
                .enumerate()
                .map(|(i, n)| MunicipalityRef::new(i as i64 + 1, *n))
                .collect(),
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Queue replies for a municipality; once they run out it returns no rows.
    pub fn reply(self, name: &str, replies: Vec<Reply>) -> Self {
        self.replies
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn timing_out(mut self, name: &str) -> Self {
        self.always_timeout.insert(name.to_string());
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.borrow().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

impl SalesSource for ScriptedSource {
    fn list_municipalities(&self) -> Result<Vec<MunicipalityRef>, LookupError> {
        if self.unreachable {
            return Err(LookupError::new("connection refused"));
        }
        Ok(self.directory.clone())
    }

    fn grouped_totals(&self, municipality: &str) -> Result<Vec<SalesAggregateRow>, QueryError> {
        *self.calls.borrow_mut().entry(municipality.to_string()).or_insert(0) += 1;
        if self.always_timeout.contains(municipality) {
            return Err(QueryError::Timeout("statement timeout".to_string()));
        }
        let next = self
            .replies
            .borrow_mut()
            .get_mut(municipality)
            .and_then(|q| q.pop_front());
        match next {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Timeout) => Err(QueryError::Timeout("lock wait timeout".to_string())),
            Some(Reply::Failure) => Err(QueryError::Failed("syntax error".to_string())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn row(year: i32, municipality: &str, ingredient: &str, total: f64) -> SalesAggregateRow {
    SalesAggregateRow::new(year, municipality, ingredient, total)
}

/// Records every requested pause instead of sleeping.
#[derive(Default)]
pub struct CountingSleeper {
    pauses: RefCell<Vec<Duration>>,
}

impl CountingSleeper {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.borrow().clone()
    }
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, duration: Duration) {
        self.pauses.borrow_mut().push(duration);
    }
}
