//! medsales-runner: headless runner for the sales aggregation pipeline.
//!
//! Usage:
//!   medsales-runner --db vendas.db
//!   medsales-runner --db vendas.db --limit 5 --delay-ms 0
//!   medsales-runner --db vendas.db --config pipeline.json --json out.json --csv out.csv

use anyhow::Result;
use medsales_core::{
    config::PipelineConfig,
    orchestrator::Orchestrator,
    output::OutputWriter,
    statistics::{compute_statistics, sample_for_year, year_breakdown, Statistics},
    store::SalesStore,
    types::AccumulatedTable,
};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = find_arg(&args, "--db").unwrap_or("vendas.db");
    let limit = find_arg(&args, "--limit").and_then(|v| v.parse::<usize>().ok());
    let json_path = find_arg(&args, "--json").map(PathBuf::from);
    let csv_path = find_arg(&args, "--csv").map(PathBuf::from);

    let mut config = match find_arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.delay_ms = parse_arg(&args, "--delay-ms", config.delay_ms);

    println!("Sales aggregation runner");
    println!("  db:        {db}");
    println!("  limit:     {}", limit.map_or("all".to_string(), |n| n.to_string()));
    println!("  delay:     {} ms", config.delay_ms);
    println!("  attempts:  {}", config.max_attempts);
    println!();

    let store = SalesStore::open(db)?;
    store.migrate()?;
    store.set_query_timeout(config.query_timeout())?;

    let mut orchestrator = Orchestrator::new(&store, &config);
    if !orchestrator.run_all(limit)? {
        println!("No municipalities found; nothing was processed.");
        return Ok(());
    }
    let summary = *orchestrator.summary();
    let table = orchestrator.finish();

    if table.is_empty() {
        println!(
            "Run completed but empty: none of the {} municipalities returned data.",
            summary.total
        );
        return Ok(());
    }

    print_year_breakdown(&table);
    print_sample(&table, &config);

    let writer = OutputWriter::new(&config);
    let json = write_or_report("JSON", || writer.write_structured(&table, json_path.as_deref()));
    let csv = write_or_report("CSV", || writer.write_tabular(&table, csv_path.as_deref()));

    let stats = compute_statistics(&table)?;
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  municipalities:  {}/{} with data", summary.with_data, summary.total);
    println!("  without data:    {}", summary.without_data);
    println!("  success rate:    {:.1}%", summary.success_rate());
    if let Statistics::Computed(s) = &stats {
        println!("  records:         {}", s.total_records);
        println!("  municipalities:  {}", s.distinct_municipalities);
        println!("  years:           {}", s.distinct_years);
        println!("  ingredients:     {}", s.distinct_ingredients);
        println!("  total sold:      {:.0} units", s.total_quantity);
    }
    println!("  json:            {}", display_path(json.as_deref()));
    println!("  csv:             {}", display_path(csv.as_deref()));
    log::debug!("Statistics: {}", serde_json::to_string(&stats)?);

    Ok(())
}

fn print_year_breakdown(table: &AccumulatedTable) {
    println!();
    println!("=== BY YEAR ===");
    for year in year_breakdown(table) {
        println!(
            "  {} | {:.0} units | {} municipalities | {} records",
            year.year, year.total_quantity, year.municipalities, year.records
        );
        for (ingredient, total) in &year.top_ingredients {
            println!("      - {ingredient}: {total:.0}");
        }
    }
}

fn print_sample(table: &AccumulatedTable, config: &PipelineConfig) {
    let sample = sample_for_year(table, config.sample_year, config.sample_size);
    println!();
    if sample.is_empty() {
        println!("No data found for {}", config.sample_year);
        return;
    }
    println!("=== SAMPLE {} (first {}) ===", config.sample_year, sample.len());
    for row in sample {
        println!(
            "  {} | {} | {} | {:.0}",
            row.year, row.municipality, row.active_ingredient, row.total_quantity
        );
    }
}

fn write_or_report<E: std::fmt::Display>(
    label: &str,
    write: impl FnOnce() -> Result<PathBuf, E>,
) -> Option<PathBuf> {
    match write() {
        Ok(path) => Some(path),
        Err(e) => {
            log::error!("{label} output failed: {e}");
            None
        }
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or("(not written)".to_string(), |p| p.display().to_string())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
