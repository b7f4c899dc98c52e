//! QA Response Evaluator - a benchmark harness for generative QA models.
//!
//! This library evaluates how well a generative language model answers
//! domain-specific questions when given a fixed reference context, scoring
//! each generated answer against a known-good reference answer using
//! embedding cosine similarity.
//!
//! # Overview
//!
//! For each item in a QA dataset, the harness:
//! 1. Assembles a prompt from the dataset's reference context and the question
//! 2. Plans the generation budget from the model's context window
//! 3. Sends the prompt to the generation model
//! 4. Extracts the model's answer from the raw output
//! 5. Scores the answer against the reference answer via embedding similarity
//!
//! Per-item generation failures are isolated; the run continues with an empty
//! answer for that item. The report preserves dataset order and carries the
//! arithmetic mean similarity.
//!
//! # Quick Start
//!
//! ```no_run
//! use qa_response_evaluator::{
//!     config::Config,
//!     dataset,
//!     embeddings::EmbeddingModel,
//!     evaluator::{Evaluator, EvaluatorOptions},
//!     generation::GenerationClient,
//!     scoring::SimilarityScorer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     // Pick a dataset bundle from the registry
//!     let dataset = dataset::builtin("appliance-faq")?;
//!
//!     // Wire up the generation model and the similarity scorer
//!     let generator = GenerationClient::new(config.generation.clone());
//!     let scorer = SimilarityScorer::new(EmbeddingModel::load(&config.embedding.model_id)?);
//!
//!     // Run the evaluation
//!     let runner = Evaluator::from_config(&config, EvaluatorOptions::default())?;
//!     let report = runner.run(&dataset, &generator, &scorer).await?;
//!
//!     report.print_summary();
//!     report.save(std::path::Path::new("results/report.csv"))?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **QADataset**: named QA suite bound to one reference context
//! - **TokenBudgetPlanner**: adaptive generation-length budgeting
//! - **GenerationClient**: OpenAI-compatible completions client
//! - **EmbeddingModel**: local candle-based sentence embeddings
//! - **SimilarityScorer**: cosine similarity between answer embeddings
//! - **Evaluator**: the orchestration loop producing an EvaluationReport

pub mod budget;
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod generation;
pub mod inference;
pub mod prompt;
pub mod report;
pub mod scoring;

// Re-export commonly used types
pub use budget::TokenBudgetPlanner;
pub use config::Config;
pub use dataset::{QADataset, QAItem};
pub use embeddings::{Embedder, EmbeddingModel};
pub use error::{EvalError, Result};
pub use evaluator::{Evaluator, EvaluatorOptions};
pub use generation::{GenerationClient, GenerationOutcome, GenerationRequest, TextGenerator};
pub use report::{EvaluationReport, ScoredAnswer};
pub use scoring::SimilarityScorer;
