//! Inference-only transcript runs.
//!
//! Runs a list of bare questions through the generation model with no
//! reference context and no scoring, appending Q/A blocks to a per-model
//! transcript file. Useful for eyeballing a model's raw behavior before
//! committing to a scored evaluation suite.

use crate::budget::TokenBudgetPlanner;
use crate::config::Config;
use crate::error::{EvalError, Result};
use crate::generation::{GenerationOutcome, GenerationRequest, SamplingParams, TextGenerator};
use crate::prompt::estimate_tokens;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Runs unscored question lists against a generation model.
pub struct InferenceRunner {
    budget: TokenBudgetPlanner,
    sampling: SamplingParams,
}

impl InferenceRunner {
    /// Create a runner with an explicit budget planner and sampling
    /// parameters.
    pub fn new(budget: TokenBudgetPlanner, sampling: SamplingParams) -> Self {
        Self { budget, sampling }
    }

    /// Create a runner from application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            TokenBudgetPlanner::from_settings(&config.budget)?,
            SamplingParams::from_settings(&config.generation),
        ))
    }

    /// Run each question through the model and append the raw responses to
    /// `<output_dir>/<model>.txt` (slashes in the model id are escaped).
    ///
    /// Returns the transcript path. Generation failures recover to an empty
    /// answer with a warning, same as in scored evaluation.
    pub async fn run<G>(
        &self,
        questions: &[String],
        generator: &G,
        output_dir: &Path,
    ) -> Result<PathBuf>
    where
        G: TextGenerator + ?Sized,
    {
        fs::create_dir_all(output_dir).map_err(|e| EvalError::io(output_dir, e))?;

        let file_name = format!("{}.txt", generator.model_id().replace('/', "_"));
        let path = output_dir.join(file_name);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| EvalError::io(&path, e))?;

        writeln!(file, "\n{}", "=".repeat(80)).map_err(|e| EvalError::io(&path, e))?;
        writeln!(file, "Responses from model: {}", generator.model_id())
            .map_err(|e| EvalError::io(&path, e))?;
        writeln!(file, "{}\n", "=".repeat(80)).map_err(|e| EvalError::io(&path, e))?;

        for (i, question) in questions.iter().enumerate() {
            let prompt_tokens = estimate_tokens(question) as u32;
            let max_new_tokens = self
                .budget
                .plan(prompt_tokens, generator.max_context_tokens());

            let request = GenerationRequest {
                prompt: question.clone(),
                max_new_tokens,
                sampling: self.sampling.clone(),
            };

            let answer = match generator.generate(&request).await {
                GenerationOutcome::Completed { raw_text } => raw_text,
                GenerationOutcome::Failed { error } => {
                    eprintln!(
                        "Warning: generation failed for question '{}': {}",
                        question, error
                    );
                    String::new()
                }
            };

            writeln!(file, "Q{}: {}", i + 1, question).map_err(|e| EvalError::io(&path, e))?;
            writeln!(file, "Answer: {}", answer).map_err(|e| EvalError::io(&path, e))?;
            writeln!(file, "{}", "-".repeat(60)).map_err(|e| EvalError::io(&path, e))?;
        }

        Ok(path)
    }
}

/// Load a question list from a file.
///
/// A `.json` file is parsed as a JSON array of strings; anything else is
/// read as plain text with one question per non-empty line.
pub fn load_questions(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;

    let questions: Vec<String> =
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&content)?
        } else {
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };

    if questions.is_empty() {
        return Err(EvalError::InvalidDataset {
            name: path.display().to_string(),
            reason: "no questions found".to_string(),
        });
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct CannedGenerator;

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
            GenerationOutcome::Completed {
                raw_text: format!("{} canned response", request.prompt),
            }
        }

        fn max_context_tokens(&self) -> u32 {
            2048
        }

        fn model_id(&self) -> &str {
            "org/mock-model"
        }
    }

    #[tokio::test]
    async fn test_transcript_contains_all_questions() {
        let dir = TempDir::new().unwrap();
        let runner = InferenceRunner::new(
            TokenBudgetPlanner::new(10, 100).unwrap(),
            SamplingParams::default(),
        );
        let questions = vec![
            "What is the first thing?".to_string(),
            "And the second?".to_string(),
        ];

        let path = runner
            .run(&questions, &CannedGenerator, dir.path())
            .await
            .unwrap();

        // Slashes in the model id are escaped in the file name
        assert_eq!(path.file_name().unwrap(), "org_mock-model.txt");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Responses from model: org/mock-model"));
        assert!(content.contains("Q1: What is the first thing?"));
        assert!(content.contains("Q2: And the second?"));
        assert!(content.contains("canned response"));
    }

    #[tokio::test]
    async fn test_transcript_appends_across_runs() {
        let dir = TempDir::new().unwrap();
        let runner = InferenceRunner::new(
            TokenBudgetPlanner::new(10, 100).unwrap(),
            SamplingParams::default(),
        );
        let questions = vec!["Only question?".to_string()];

        let first = runner
            .run(&questions, &CannedGenerator, dir.path())
            .await
            .unwrap();
        let second = runner
            .run(&questions, &CannedGenerator, dir.path())
            .await
            .unwrap();
        assert_eq!(first, second);

        let content = fs::read_to_string(&first).unwrap();
        assert_eq!(content.matches("Q1: Only question?").count(), 2);
    }

    #[test]
    fn test_load_questions_from_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.txt");
        fs::write(&path, "First?\n\n  Second?  \n").unwrap();

        let questions = load_questions(&path).unwrap();
        assert_eq!(questions, vec!["First?", "Second?"]);
    }

    #[test]
    fn test_load_questions_from_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.json");
        fs::write(&path, r#"["First?", "Second?"]"#).unwrap();

        let questions = load_questions(&path).unwrap();
        assert_eq!(questions, vec!["First?", "Second?"]);
    }

    #[test]
    fn test_load_questions_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("questions.txt");
        fs::write(&path, "\n\n").unwrap();

        assert!(load_questions(&path).is_err());
    }
}
