use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use serde::Serialize;

use modelcompass::catalog::Catalog;
use modelcompass::config::Config;
use modelcompass::embedding::OpenRouterEmbeddings;
use modelcompass::index::SemanticIndex;

#[derive(Serialize)]
struct SearchResult {
    benchmark_id: i64,
    name: String,
    variant: Option<String>,
    similarity: f32,
}

pub fn run(query: &str, k: Option<usize>, json: bool) -> Result<()> {
    let config = Config::load()?;
    let catalog = Catalog::load(&config.catalog_path()?)?;
    let provider = OpenRouterEmbeddings::new(&config.embedding, config.api_key()?)?;
    let index = SemanticIndex::load(
        &config.index_path()?,
        &config.embedding.model,
        config.embedding.dimension,
    )?;

    let k = k.unwrap_or(config.ranking.search_k);
    let hits = index.search(&provider, query, k)?;

    let results: Vec<SearchResult> = hits
        .into_iter()
        .filter_map(|(id, similarity)| {
            catalog.benchmark(id).map(|b| SearchResult {
                benchmark_id: id,
                name: b.name_normalized.clone(),
                variant: b.variant.clone(),
                similarity,
            })
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No benchmarks found for '{query}'");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["ID", "Benchmark", "Variant", "Similarity"]);
    for result in results {
        table.add_row(vec![
            result.benchmark_id.to_string(),
            result.name,
            result.variant.unwrap_or_else(|| "-".to_string()),
            format!("{:.3}", result.similarity),
        ]);
    }
    println!("{table}");

    Ok(())
}
