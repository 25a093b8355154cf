mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{Overrides, RunConfig};
use data_loader::{
    aggregate_duplicates, generate_synthetic, parse_interactions, train_test_split,
    write_interactions, DatasetStats, Interaction, SyntheticConfig,
};
use evaluation::{EvaluationReport, Evaluator};
use recommender::{
    Explanation, FactorizationEngine, Preprocessed, Preprocessor, Recommendation, SimilarItem,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// List lengths used by the `run` demo
const DEMO_RECOMMENDATIONS: usize = 5;
const DEMO_EVALUATION_K: usize = 5;
const DEMO_SIMILAR_ITEMS: usize = 10;

/// recs - implicit-feedback recommendation engine
#[derive(Parser)]
#[command(name = "recs")]
#[command(about = "Latent factor recommendations from implicit feedback", long_about = None)]
struct Cli {
    /// CSV file of user, item, weight interactions
    #[arg(short, long, default_value = "implicit_feedback_data.csv")]
    data_file: PathBuf,

    /// JSON file with hyperparameters, split settings and column names
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of latent factors
    #[arg(long)]
    factors: Option<usize>,

    /// Number of ALS sweeps
    #[arg(long)]
    iterations: Option<usize>,

    /// L2 regularization strength
    #[arg(long)]
    regularization: Option<f32>,

    /// Share of interactions held out for evaluation [default: 0.2]
    #[arg(long)]
    test_size: Option<f64>,

    /// Seed for the split and the factor initialization [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic Zipf-distributed interaction log
    Generate {
        #[arg(long, default_value = "1000")]
        users: usize,

        #[arg(long, default_value = "5000")]
        items: usize,

        /// Number of raw clicks drawn before duplicates are merged
        #[arg(long, default_value = "10000")]
        interactions: usize,

        /// Output file (defaults to --data-file)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Get recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: String,

        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show an explanation for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Explain why an item would be recommended to a user
    Explain {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        item_id: String,

        /// Print the explanation as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the items closest to an item in latent space
    Similar {
        #[arg(long)]
        item_id: String,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Measure precision@k and recall@k on the held-out split
    Evaluate {
        #[arg(long, default_value = "10")]
        k: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split, train, recommend, explain and evaluate in one go
    Run,
}

/// A trained engine and the interactions it did not see
struct Session {
    engine: FactorizationEngine,
    train: Vec<Interaction>,
    held_out: Vec<Interaction>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RunConfig::resolve(
        cli.config.as_deref(),
        Overrides {
            factors: cli.factors,
            iterations: cli.iterations,
            regularization: cli.regularization,
            test_size: cli.test_size,
            seed: cli.seed,
        },
    )?;

    match cli.command {
        Commands::Generate {
            users,
            items,
            interactions,
            output,
        } => {
            let output = output.unwrap_or_else(|| cli.data_file.clone());
            handle_generate(&config, users, items, interactions, &output)?
        }
        Commands::Recommend {
            user_id,
            limit,
            explain,
        } => {
            let session = prepare(&cli.data_file, &config)?;
            handle_recommend(&session, &user_id, limit, explain)?
        }
        Commands::Explain {
            user_id,
            item_id,
            json,
        } => {
            let session = prepare(&cli.data_file, &config)?;
            handle_explain(&session, &user_id, &item_id, json)?
        }
        Commands::Similar { item_id, limit } => {
            let session = prepare(&cli.data_file, &config)?;
            handle_similar(&session, &item_id, limit)?
        }
        Commands::Evaluate { k, json } => {
            let session = prepare(&cli.data_file, &config)?;
            handle_evaluate(&session, k, json)?
        }
        Commands::Run => handle_run(&cli.data_file, &config)?,
    }

    Ok(())
}

/// Load, split, preprocess and train
fn prepare(data_file: &Path, config: &RunConfig) -> Result<Session> {
    println!("Loading interactions from {}...", data_file.display());
    let start = Instant::now();
    let raw = parse_interactions(data_file, &config.columns)
        .with_context(|| format!("Failed to load interactions from {}", data_file.display()))?;
    let log = aggregate_duplicates(raw);
    print_stats(&DatasetStats::compute(&log));

    let (train, held_out) = train_test_split(log, config.test_size, config.seed)?;
    info!(
        "Split into {} training and {} held-out interactions",
        train.len(),
        held_out.len()
    );

    let Preprocessed { matrix, catalog } = Preprocessor::new()
        .preprocess(&train)
        .context("Failed to preprocess training interactions")?;
    let mut engine = FactorizationEngine::new(Arc::new(catalog), config.hyperparameters.clone());
    engine.train(matrix).context("Training failed")?;

    println!("{} Trained model in {:?}", "✓".green(), start.elapsed());
    Ok(Session {
        engine,
        train,
        held_out,
    })
}

/// Handle the 'generate' command
fn handle_generate(
    config: &RunConfig,
    users: usize,
    items: usize,
    interactions: usize,
    output: &Path,
) -> Result<()> {
    let synthetic = SyntheticConfig::default()
        .with_users(users)
        .with_items(items)
        .with_interactions(interactions)
        .with_seed(config.seed);
    let log = generate_synthetic(&synthetic)?;
    write_interactions(output, &log, &config.columns)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Wrote {} interactions to {}",
        "✓".green(),
        log.len(),
        output.display()
    );
    print_stats(&DatasetStats::compute(&log));
    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(session: &Session, user_id: &str, limit: usize, explain: bool) -> Result<()> {
    let recommendations = session.engine.recommend(user_id, limit)?;
    if !session.engine.catalog().users.contains(user_id) {
        println!(
            "{}",
            format!("User {} is not in the training data, showing popular items", user_id).yellow()
        );
    }

    print_recommendations(user_id, &recommendations);

    if explain {
        for rec in &recommendations {
            let explanation = session.engine.explain(user_id, &rec.item_id)?;
            println!("\n{} {}", "Why".bold(), rec.item_id.cyan());
            print_explanation(&explanation);
        }
    }
    Ok(())
}

/// Handle the 'explain' command
fn handle_explain(session: &Session, user_id: &str, item_id: &str, json: bool) -> Result<()> {
    let explanation = session.engine.explain(user_id, item_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        println!(
            "{}",
            format!("Explanation for {} -> {}:", user_id, item_id).bold().blue()
        );
        print_explanation(&explanation);
    }
    Ok(())
}

/// Handle the 'similar' command
fn handle_similar(session: &Session, item_id: &str, limit: usize) -> Result<()> {
    let similar = session
        .engine
        .similar_items(item_id, limit)
        .with_context(|| format!("Cannot find items similar to {}", item_id))?;
    print_similar(item_id, &similar);
    Ok(())
}

/// Handle the 'evaluate' command
fn handle_evaluate(session: &Session, k: usize, json: bool) -> Result<()> {
    let report = Evaluator::new(&session.engine).evaluate(&session.held_out, k)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Handle the 'run' command
fn handle_run(data_file: &Path, config: &RunConfig) -> Result<()> {
    let session = prepare(data_file, config)?;
    let engine = &session.engine;

    let user_id = session
        .train
        .first()
        .map(|i| i.user_id.clone())
        .context("Training split is empty")?;

    let recommendations = engine.recommend(&user_id, DEMO_RECOMMENDATIONS)?;
    print_recommendations(&user_id, &recommendations);

    // the top recommendation, or the most popular item when there is none
    let focus_item = recommendations
        .first()
        .map(|r| r.item_id.clone())
        .or_else(|| engine.catalog().popular_items.first().cloned());

    if let Some(item_id) = &focus_item {
        println!(
            "\n{}",
            format!("Explanation for {} -> {}:", user_id, item_id).bold().blue()
        );
        print_explanation(&engine.explain(&user_id, item_id)?);
    }

    println!();
    let report = Evaluator::new(engine).evaluate(&session.held_out, DEMO_EVALUATION_K)?;
    print_report(&report);

    if let Some(item_id) = &focus_item {
        println!();
        print_similar(item_id, &engine.similar_items(item_id, DEMO_SIMILAR_ITEMS)?);
    }
    Ok(())
}

fn print_stats(stats: &DatasetStats) {
    println!(
        "{}Interactions: {}  Users: {}  Items: {}  Sparsity: {:.4}%",
        "• ".cyan(),
        stats.interactions,
        stats.users,
        stats.items,
        stats.sparsity * 100.0
    );
}

fn print_recommendations(user_id: &str, recommendations: &[Recommendation]) {
    println!("{}", format!("Recommendations for {}:", user_id).bold().blue());
    if recommendations.is_empty() {
        println!("  (none)");
    }
    for (rank, rec) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - Score: {:.4}",
            (rank + 1).to_string().green(),
            rec.item_id,
            rec.score
        );
    }
}

fn print_explanation(explanation: &Explanation) {
    println!("  {}", explanation.message());
    if let Explanation::SimilarityBased { similar_items } = explanation {
        for item in similar_items {
            println!("  {}{} ({:.4})", "- ".green(), item.item_id, item.similarity);
        }
    }
}

fn print_similar(item_id: &str, similar: &[SimilarItem]) {
    println!("{}", format!("Items similar to {}:", item_id).bold().blue());
    for (rank, item) in similar.iter().enumerate() {
        println!(
            "{}. {} - Similarity: {:.4}",
            (rank + 1).to_string().green(),
            item.item_id,
            item.similarity
        );
    }
}

fn print_report(report: &EvaluationReport) {
    println!("{}", "Evaluation:".bold().blue());
    println!(
        "{}Precision@{}: {:.4}",
        "• ".cyan(),
        report.k,
        report.precision_at_k
    );
    println!("{}Recall@{}: {:.4}", "• ".cyan(), report.k, report.recall_at_k);
    println!(
        "{}Users evaluated: {} ({} skipped)",
        "• ".cyan(),
        report.evaluated_users,
        report.skipped_users
    );
}
