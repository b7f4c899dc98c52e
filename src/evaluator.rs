//! Evaluation loop driving prompt assembly, generation, extraction, and
//! scoring over a QA dataset.

use crate::budget::TokenBudgetPlanner;
use crate::config::Config;
use crate::dataset::{QADataset, QAItem};
use crate::embeddings::Embedder;
use crate::error::{EvalError, Result};
use crate::extract::extract_answer;
use crate::generation::{GenerationOutcome, GenerationRequest, SamplingParams, TextGenerator};
use crate::prompt::{ANSWER_CUE, assemble_prompt, estimate_tokens};
use crate::report::{EvaluationReport, ScoredAnswer};
use crate::scoring::SimilarityScorer;
use std::time::Instant;

/// Options for an evaluation run.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorOptions {
    /// Maximum items to evaluate (for quick testing).
    pub max_items: Option<usize>,
    /// Verbose output.
    pub verbose: bool,
}

/// Runs one deterministic, order-preserving pass over a QA dataset.
///
/// Each item completes generation and scoring before the next item starts.
/// Generation failures are isolated per item; scoring failures abort the run.
pub struct Evaluator {
    budget: TokenBudgetPlanner,
    sampling: SamplingParams,
    options: EvaluatorOptions,
}

impl Evaluator {
    /// Create an evaluator with an explicit budget planner and sampling
    /// parameters.
    pub fn new(
        budget: TokenBudgetPlanner,
        sampling: SamplingParams,
        options: EvaluatorOptions,
    ) -> Self {
        Self {
            budget,
            sampling,
            options,
        }
    }

    /// Create an evaluator from application configuration.
    pub fn from_config(config: &Config, options: EvaluatorOptions) -> Result<Self> {
        Ok(Self::new(
            TokenBudgetPlanner::from_settings(&config.budget)?,
            SamplingParams::from_settings(&config.generation),
            options,
        ))
    }

    /// Evaluate a dataset against a generation model, scoring each extracted
    /// answer against its reference answer.
    pub async fn run<G, E>(
        &self,
        dataset: &QADataset,
        generator: &G,
        scorer: &SimilarityScorer<E>,
    ) -> Result<EvaluationReport>
    where
        G: TextGenerator + ?Sized,
        E: Embedder,
    {
        dataset.validate()?;

        let items: Vec<&QAItem> = match self.options.max_items {
            Some(max) => dataset.items.iter().take(max).collect(),
            None => dataset.items.iter().collect(),
        };

        if items.is_empty() {
            return Err(EvalError::EmptyDataset(dataset.name.clone()));
        }

        let start_time = Instant::now();
        let mut answers = Vec::with_capacity(items.len());

        for (idx, item) in items.iter().enumerate() {
            if self.options.verbose {
                println!(
                    "\n[{}/{}] Evaluating item {}: {}",
                    idx + 1,
                    items.len(),
                    item.id,
                    item.question
                );
            } else {
                print!(".");
                use std::io::Write;
                std::io::stdout().flush().ok();
            }

            let answer = self
                .process_item(dataset, item, generator, scorer)
                .await?;
            answers.push(answer);
        }

        if !self.options.verbose {
            println!(); // Newline after dots
        }

        let mean_similarity = answers
            .iter()
            .map(|a| a.similarity as f64)
            .sum::<f64>()
            / answers.len() as f64;

        Ok(EvaluationReport {
            model: generator.model_id().to_string(),
            dataset_name: dataset.name.clone(),
            answers,
            mean_similarity,
            total_time_secs: start_time.elapsed().as_secs_f64(),
        })
    }

    /// Process a single dataset item.
    async fn process_item<G, E>(
        &self,
        dataset: &QADataset,
        item: &QAItem,
        generator: &G,
        scorer: &SimilarityScorer<E>,
    ) -> Result<ScoredAnswer>
    where
        G: TextGenerator + ?Sized,
        E: Embedder,
    {
        let prompt = assemble_prompt(&dataset.context, &item.question);
        let prompt_tokens = estimate_tokens(&prompt) as u32;
        let max_new_tokens = self.budget.plan(prompt_tokens, generator.max_context_tokens());

        let request = GenerationRequest {
            prompt,
            max_new_tokens,
            sampling: self.sampling.clone(),
        };

        let (model_answer, generation_failed) = match generator.generate(&request).await {
            GenerationOutcome::Completed { raw_text } => {
                (extract_answer(&raw_text, ANSWER_CUE), false)
            }
            GenerationOutcome::Failed { error } => {
                eprintln!(
                    "Warning: generation failed for question '{}': {}",
                    item.question, error
                );
                (String::new(), true)
            }
        };

        let similarity = scorer.score(&model_answer, &item.expected_answer)?;

        Ok(ScoredAnswer {
            item_id: item.id,
            question: item.question.clone(),
            expected_answer: item.expected_answer.clone(),
            model_answer,
            similarity,
            generation_failed,
        })
    }
}
