use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};

use modelcompass::calibrate::{self, ScoreMatrix};
use modelcompass::catalog::{Catalog, ConstraintSet, Deployment, IoRatio, Modality, SpeedClass};
use modelcompass::config::Config;
use modelcompass::embedding::OpenRouterEmbeddings;
use modelcompass::index::SemanticIndex;
use modelcompass::rank::{self, RankedModel};

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Free-text description of the task
    pub query: String,

    /// Predicted share of input tokens in the workload
    #[arg(long, default_value_t = 0.8)]
    pub input_ratio: f64,

    /// Predicted share of output tokens in the workload
    #[arg(long, default_value_t = 0.2)]
    pub output_ratio: f64,

    /// Minimum context window in tokens
    #[arg(long)]
    pub min_context: Option<u64>,

    /// Required input modalities (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub modality_input: Vec<Modality>,

    /// Required output modalities (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub modality_output: Vec<Modality>,

    /// Deployment target
    #[arg(long, value_enum, default_value_t = Deployment::Any)]
    pub deployment: Deployment,

    /// Only consider reasoning models
    #[arg(long)]
    pub require_reasoning: bool,

    /// Only consider models with tool calling
    #[arg(long)]
    pub require_tools: bool,

    /// Minimum speed class
    #[arg(long, value_enum)]
    pub min_speed: Option<SpeedClass>,

    /// Number of candidate benchmarks to search for
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Size cap for each output list
    #[arg(long)]
    pub top: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &RankArgs) -> Result<()> {
    let config = Config::load()?;
    let io_ratio = IoRatio {
        input: args.input_ratio,
        output: args.output_ratio,
    };
    io_ratio.validate()?;

    let catalog = Catalog::load(&config.catalog_path()?)?;
    let provider = OpenRouterEmbeddings::new(&config.embedding, config.api_key()?)?;
    let index = SemanticIndex::load(
        &config.index_path()?,
        &config.embedding.model,
        config.embedding.dimension,
    )?;

    let k = args.k.unwrap_or(config.ranking.search_k);
    let candidates = index.search(&provider, &args.query, k)?;
    let target_ids: Vec<i64> = candidates.iter().map(|&(id, _)| id).collect();
    // Every catalog benchmark may serve as a bridge; the estimator restricts
    // to siblings of each target by base identity.
    let bridge_ids: Vec<i64> = catalog.benchmarks.iter().map(|b| b.id).collect();

    let matrix = ScoreMatrix::from_scores(&catalog.scores);
    let filled = calibrate::estimate(&matrix, &catalog.benchmarks, &target_ids, &bridge_ids);

    let constraints = ConstraintSet {
        min_context_window: args.min_context,
        modality_input: args.modality_input.clone(),
        modality_output: args.modality_output.clone(),
        deployment: args.deployment,
        require_reasoning: args.require_reasoning,
        require_tool_calling: args.require_tools,
        min_speed_class: args.min_speed,
    };

    let cap = args.top.unwrap_or(config.ranking.list_cap);
    let lists = rank::rank(&catalog.models, &constraints, io_ratio, &candidates, &filled, cap)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&lists)?);
        return Ok(());
    }

    print_list("Top performance", &lists.top_performance);
    print_list("Balanced", &lists.balanced);
    print_list("Budget", &lists.budget);

    Ok(())
}

fn print_list(title: &str, models: &[RankedModel]) {
    println!("\n{title}:");
    if models.is_empty() {
        println!("  (no models satisfied the constraints with sufficient data)");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Model", "Provider", "Perf", "Cost", "Scores", "Reason"]);
    for model in models {
        let estimated = model
            .benchmark_results
            .iter()
            .filter(|r| r.is_estimated)
            .count();
        let citations = if estimated > 0 {
            format!("{} ({} est.)", model.benchmark_results.len(), estimated)
        } else {
            model.benchmark_results.len().to_string()
        };
        table.add_row(vec![
            model.name_normalized.clone(),
            model.provider.clone(),
            format!("{:.3}", model.rank_metrics.performance_index),
            format!("{:.2}", model.rank_metrics.blended_cost_index),
            citations,
            model.reason_for_ranking.clone(),
        ]);
    }
    println!("{table}");
}
