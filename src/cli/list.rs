use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use modelcompass::catalog::Catalog;
use modelcompass::config::Config;

pub fn models(json: bool) -> Result<()> {
    let config = Config::load()?;
    let catalog = Catalog::load(&config.catalog_path()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.models)?);
        return Ok(());
    }

    if catalog.models.is_empty() {
        println!("Catalog is empty; run `compass ingest` first");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        "ID", "Name", "Provider", "Context", "Cost (in/out)", "Speed", "Flags",
    ]);
    for model in &catalog.models {
        let mut flags = Vec::new();
        if model.is_reasoning_model {
            flags.push("reasoning");
        }
        if model.has_tool_calling {
            flags.push("tools");
        }
        if model.is_open_weights {
            flags.push("open");
        }
        if model.is_outdated {
            flags.push("outdated");
        }
        table.add_row(vec![
            model.id.to_string(),
            model.name_normalized.clone(),
            model.provider.clone(),
            model.context_str(),
            model.cost_str(),
            format!("{:?}", model.speed_class).to_lowercase(),
            if flags.is_empty() { "-".to_string() } else { flags.join(", ") },
        ]);
    }
    println!("{table}");

    Ok(())
}

pub fn benchmarks(json: bool) -> Result<()> {
    let config = Config::load()?;
    let catalog = Catalog::load(&config.catalog_path()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.benchmarks)?);
        return Ok(());
    }

    if catalog.benchmarks.is_empty() {
        println!("Catalog is empty; run `compass ingest` first");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["ID", "Name", "Variant", "Categories", "Description"]);
    for benchmark in &catalog.benchmarks {
        table.add_row(vec![
            benchmark.id.to_string(),
            benchmark.name_normalized.clone(),
            benchmark
                .variant
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            benchmark.categories.join(", "),
            benchmark.description.clone(),
        ]);
    }
    println!("{table}");

    Ok(())
}
