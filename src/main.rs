//! QA Response Evaluator CLI
//!
//! Benchmarks a generation model against a QA suite, scoring answers by
//! embedding similarity against reference answers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use qa_response_evaluator::{
    config::Config,
    dataset::{self, QADataset},
    embeddings::EmbeddingModel,
    evaluator::{Evaluator, EvaluatorOptions},
    generation::GenerationClient,
    inference::{InferenceRunner, load_questions},
    scoring::SimilarityScorer,
};
use std::path::PathBuf;

/// QA Response Evaluator - score generative model answers against references
#[derive(Parser)]
#[command(name = "qa-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a model on a QA dataset
    Evaluate {
        /// Name of a built-in dataset (see `qa-eval datasets`)
        #[arg(default_value = "appliance-faq")]
        dataset: String,

        /// Load the dataset from a JSON file instead of the registry
        #[arg(long, conflicts_with = "dataset")]
        dataset_file: Option<PathBuf>,

        /// Save the report (.csv, .txt, or .json; format from extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of items to evaluate
        #[arg(long)]
        max_items: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a question list through the model without scoring
    Infer {
        /// Question file: JSON array of strings, or one question per line
        questions: PathBuf,

        /// Directory for the transcript file
        #[arg(short, long, default_value = "outputs")]
        output_dir: PathBuf,
    },

    /// List built-in datasets
    Datasets,

    /// Test connectivity to the generation API
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            dataset,
            dataset_file,
            output,
            max_items,
            verbose,
        } => cmd_evaluate(dataset, dataset_file, output, max_items, verbose).await,
        Commands::Infer {
            questions,
            output_dir,
        } => cmd_infer(questions, output_dir).await,
        Commands::Datasets => cmd_datasets(),
        Commands::Test => cmd_test().await,
    }
}

async fn cmd_evaluate(
    dataset_name: String,
    dataset_file: Option<PathBuf>,
    output: Option<PathBuf>,
    max_items: Option<usize>,
    verbose: bool,
) -> Result<()> {
    println!("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let dataset: QADataset = match dataset_file {
        Some(path) => {
            println!("Loading dataset from {}...", path.display());
            QADataset::load_json(&path).context("Failed to load dataset")?
        }
        None => dataset::builtin(&dataset_name)?,
    };
    println!("Dataset: {} ({} items)", dataset.name, dataset.len());
    println!("Model:   {}", config.generation.model);

    println!("Loading embedding model: {}...", config.embedding.model_id);
    let embedding_model = EmbeddingModel::load(&config.embedding.model_id)
        .context("Failed to load embedding model")?;
    let scorer = SimilarityScorer::new(embedding_model);

    let generator = GenerationClient::new(config.generation.clone());
    let runner = Evaluator::from_config(
        &config,
        EvaluatorOptions { max_items, verbose },
    )?;

    println!("Evaluating...");
    let report = runner.run(&dataset, &generator, &scorer).await?;

    report.print_summary();

    if let Some(path) = output {
        report.save(&path)?;
        println!("Report saved to {}", path.display());
    }

    Ok(())
}

async fn cmd_infer(questions_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    println!("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let questions = load_questions(&questions_path).context("Failed to load questions")?;
    println!(
        "Running {} questions through {}...",
        questions.len(),
        config.generation.model
    );

    let generator = GenerationClient::new(config.generation.clone());
    let runner = InferenceRunner::from_config(&config)?;

    let path = runner.run(&questions, &generator, &output_dir).await?;
    println!("Transcript saved to {}", path.display());

    Ok(())
}

fn cmd_datasets() -> Result<()> {
    println!("Built-in datasets:");
    for name in dataset::builtin_names() {
        let bundle = dataset::builtin(name)?;
        println!("  {} ({} items)", name, bundle.len());
    }
    Ok(())
}

async fn cmd_test() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    println!("Testing connection to {}...", config.generation.api_base);
    let client = GenerationClient::new(config.generation.clone());
    client.probe().await?;
    println!("Connection OK (model: {})", config.generation.model);

    Ok(())
}
