//! Per-municipality aggregation and its retry policy.

mod common;

use common::{row, CountingSleeper, Reply, ScriptedSource};
use medsales_core::{aggregator::Aggregator, config::PipelineConfig};
use std::time::Duration;

fn build(source: &ScriptedSource) -> Aggregator<&ScriptedSource> {
    Aggregator::new(source, &PipelineConfig::default_test())
}

#[test]
fn rows_are_returned_on_first_success() {
    let source = ScriptedSource::new(&["Niterói"]).reply(
        "Niterói",
        vec![Reply::Rows(vec![
            row(2016, "Niterói", "DIPIRONA", 60.0),
            row(2016, "Niterói", "AMOXICILINA", 40.0),
        ])],
    );
    let rows = build(&source).aggregate("Niterói");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].active_ingredient, "DIPIRONA");
    assert_eq!(source.calls("Niterói"), 1);
}

#[test]
fn persistent_timeout_is_attempted_exactly_three_times() {
    let source = ScriptedSource::new(&["Macaé"]).timing_out("Macaé");
    let rows = build(&source).aggregate("Macaé");

    assert!(rows.is_empty(), "exhausted retries must yield no rows");
    assert_eq!(source.calls("Macaé"), 3);
}

#[test]
fn timeout_then_success_recovers() {
    let source = ScriptedSource::new(&["Resende"]).reply(
        "Resende",
        vec![
            Reply::Timeout,
            Reply::Timeout,
            Reply::Rows(vec![row(2017, "Resende", "LOSARTANA", 12.0)]),
        ],
    );
    let rows = build(&source).aggregate("Resende");

    assert_eq!(rows, vec![row(2017, "Resende", "LOSARTANA", 12.0)]);
    assert_eq!(source.calls("Resende"), 3);
}

#[test]
fn non_timeout_failure_is_not_retried() {
    let source = ScriptedSource::new(&["Paraty"]).reply(
        "Paraty",
        vec![Reply::Failure, Reply::Rows(vec![row(2016, "Paraty", "X", 1.0)])],
    );
    let rows = build(&source).aggregate("Paraty");

    assert!(rows.is_empty());
    assert_eq!(source.calls("Paraty"), 1);
}

#[test]
fn attempt_bound_follows_config() {
    let source = ScriptedSource::new(&["Itaguaí"]).timing_out("Itaguaí");
    let config = PipelineConfig {
        max_attempts: 5,
        ..PipelineConfig::default_test()
    };
    let rows = Aggregator::new(&source, &config).aggregate("Itaguaí");

    assert!(rows.is_empty());
    assert_eq!(source.calls("Itaguaí"), 5);
}

#[test]
fn each_retry_waits_one_delay_unit() {
    let source = ScriptedSource::new(&["Macaé"]).timing_out("Macaé");
    let sleeper = CountingSleeper::default();
    let config = PipelineConfig {
        delay_ms: 250,
        ..PipelineConfig::default_test()
    };
    let rows = Aggregator::with_sleeper(&source, &config, &sleeper).aggregate("Macaé");

    assert!(rows.is_empty());
    assert_eq!(source.calls("Macaé"), 3);
    assert_eq!(sleeper.pauses(), vec![Duration::from_millis(250); 2]);
}

#[test]
fn no_wait_without_a_retry() {
    let source = ScriptedSource::new(&["Paraty", "Rio Bonito"])
        .reply("Paraty", vec![Reply::Failure])
        .reply("Rio Bonito", vec![Reply::Rows(vec![row(2016, "Rio Bonito", "X", 1.0)])]);
    let sleeper = CountingSleeper::default();
    let aggregator =
        Aggregator::with_sleeper(&source, &PipelineConfig::default_test(), &sleeper);

    assert!(aggregator.aggregate("Paraty").is_empty());
    assert_eq!(aggregator.aggregate("Rio Bonito").len(), 1);
    assert!(sleeper.pauses().is_empty(), "got {:?}", sleeper.pauses());
}
