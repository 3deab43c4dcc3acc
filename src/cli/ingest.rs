use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use std::path::Path;

use modelcompass::catalog::{Catalog, RawBatch};
use modelcompass::config::Config;
use modelcompass::ingest;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let config = Config::load()?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file: {}", file.display()))?;
    let batch: RawBatch = serde_json::from_str(&content).context("Failed to parse batch file")?;

    let catalog_path = config.catalog_path()?;
    let mut catalog = Catalog::load(&catalog_path)?;
    let report = ingest::ingest(&mut catalog, batch);
    catalog.save(&catalog_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Ingested {} benchmarks, {} models, {} scores ({} records failed)",
        report.benchmarks_created,
        report.models_created,
        report.scores_created,
        report.failed.len()
    );

    if !report.failed.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec!["Record", "Reason"]);
        for failure in &report.failed {
            table.add_row(vec![failure.record.clone(), failure.reason.clone()]);
        }
        println!("{table}");
    }

    if report.benchmarks_created > 0 {
        println!("Benchmark dictionary changed; run `compass index` to rebuild the search index.");
    }

    Ok(())
}
