use anyhow::{bail, Result};

use modelcompass::catalog::Catalog;
use modelcompass::config::Config;
use modelcompass::embedding::OpenRouterEmbeddings;
use modelcompass::index::SemanticIndex;

pub fn run() -> Result<()> {
    let config = Config::load()?;
    let catalog = Catalog::load(&config.catalog_path()?)?;

    if catalog.benchmarks.is_empty() {
        bail!("No benchmarks in the catalog; run `compass ingest` first");
    }

    let provider = OpenRouterEmbeddings::new(&config.embedding, config.api_key()?)?;
    let entries: Vec<(i64, String)> = catalog
        .benchmarks
        .iter()
        .map(|b| (b.id, format!("{}: {}", b.name_normalized, b.description)))
        .collect();

    let index = SemanticIndex::build(&provider, &entries)?;
    index.save(&config.index_path()?)?;

    println!("Indexed {} benchmark descriptions", index.len());
    Ok(())
}
