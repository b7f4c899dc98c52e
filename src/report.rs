//! Evaluation report types and persistence.
//!
//! A report can be serialized as a CSV table (one row per item), a sequence
//! of delimited text blocks, or JSON. The format is chosen from the output
//! file extension.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Scored result for a single dataset item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredAnswer {
    /// Id of the source QA item.
    pub item_id: u32,
    /// The question posed to the model.
    pub question: String,
    /// The known-good reference answer.
    pub expected_answer: String,
    /// The model's extracted answer; empty when generation failed.
    pub model_answer: String,
    /// Cosine similarity between model and reference answer, in [-1, 1].
    pub similarity: f32,
    /// Whether the generation call failed for this item. Distinguishes a
    /// failed call from a model that legitimately produced empty output.
    pub generation_failed: bool,
}

/// Aggregate results for one (dataset, model) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Identifier of the evaluated model.
    pub model: String,
    /// Name of the evaluated dataset.
    pub dataset_name: String,
    /// Per-item results, in dataset order.
    pub answers: Vec<ScoredAnswer>,
    /// Arithmetic mean of all per-item similarities.
    pub mean_similarity: f64,
    /// Total evaluation wall-clock time (seconds).
    pub total_time_secs: f64,
}

/// Output format for saved reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// One row per item plus a header.
    Csv,
    /// Delimited text blocks with a summary footer.
    Text,
    /// Full report as pretty-printed JSON.
    Json,
}

impl ReportFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => ReportFormat::Text,
            Some("json") => ReportFormat::Json,
            _ => ReportFormat::Csv, // Default to CSV
        }
    }
}

impl EvaluationReport {
    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Evaluation Summary ==========");
        println!("Model:   {}", self.model);
        println!("Dataset: {} ({} items)", self.dataset_name, self.answers.len());
        println!("----------------------------------------");
        for answer in &self.answers {
            let marker = if answer.generation_failed { "!" } else { " " };
            println!(
                "{} [{:>3}] {:.3}  {}",
                marker,
                answer.item_id,
                answer.similarity,
                truncate(&answer.question, 60)
            );
        }
        println!("----------------------------------------");
        println!("Mean similarity: {:.3}", self.mean_similarity);
        println!("Total time: {:.1}s", self.total_time_secs);
        println!("========================================\n");
    }

    /// Save the report, choosing the format from the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
            }
        }

        match ReportFormat::from_path(path) {
            ReportFormat::Csv => self.write_csv(path),
            ReportFormat::Text => self.write_text(path),
            ReportFormat::Json => self.write_json(path),
        }
    }

    /// Write one row per item as CSV.
    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| EvalError::Serialization(e.to_string()))?;

        for answer in &self.answers {
            writer
                .serialize(answer)
                .map_err(|e| EvalError::Serialization(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }

    /// Write delimited Q/A blocks with a summary footer.
    fn write_text(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(80));
        let _ = writeln!(
            out,
            "Evaluation of model {} on dataset {}",
            self.model, self.dataset_name
        );
        let _ = writeln!(out, "{}", "=".repeat(80));

        for answer in &self.answers {
            let _ = writeln!(out, "\nQ{}: {}", answer.item_id, answer.question);
            let _ = writeln!(out, "Expected: {}", answer.expected_answer);
            let _ = writeln!(out, "Answer: {}", answer.model_answer);
            if answer.generation_failed {
                let _ = writeln!(out, "Note: generation failed for this item");
            }
            let _ = writeln!(out, "Similarity: {:.3}", answer.similarity);
            let _ = writeln!(out, "{}", "-".repeat(60));
        }

        let _ = writeln!(out, "\nMean similarity: {:.3}", self.mean_similarity);

        fs::write(path, out).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }

    /// Write the full report as pretty-printed JSON.
    fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_report() -> EvaluationReport {
        EvaluationReport {
            model: "qwen".to_string(),
            dataset_name: "appliance-faq".to_string(),
            answers: vec![
                ScoredAnswer {
                    item_id: 1,
                    question: "How do I thread the machine?".to_string(),
                    expected_answer: "Raise the needle first.".to_string(),
                    model_answer: "Raise the needle to the top.".to_string(),
                    similarity: 0.91,
                    generation_failed: false,
                },
                ScoredAnswer {
                    item_id: 2,
                    question: "Why are stitches skipping?".to_string(),
                    expected_answer: "The needle may be bent.".to_string(),
                    model_answer: String::new(),
                    similarity: 0.02,
                    generation_failed: true,
                },
            ],
            mean_similarity: 0.465,
            total_time_secs: 3.2,
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ReportFormat::from_path(Path::new("out.csv")),
            ReportFormat::Csv
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("out.txt")),
            ReportFormat::Text
        );
        assert_eq!(
            ReportFormat::from_path(Path::new("out.json")),
            ReportFormat::Json
        );
        assert_eq!(ReportFormat::from_path(Path::new("out")), ReportFormat::Csv);
    }

    #[test]
    fn test_csv_row_count_matches_items() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.csv");

        let report = sample_report();
        report.save(&path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<ScoredAnswer> = reader
            .deserialize()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), report.answers.len());
        assert_eq!(rows[0].item_id, 1);
        assert_eq!(rows[1].model_answer, "");
        assert!(rows[1].generation_failed);
    }

    #[test]
    fn test_text_format_contains_questions_and_mean() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.txt");

        let report = sample_report();
        report.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        for answer in &report.answers {
            assert!(content.contains(&answer.question));
        }
        assert!(content.contains("Mean similarity: 0.465"));
        assert!(content.contains("generation failed"));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let report = sample_report();
        report.save(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let loaded: EvaluationReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.model, report.model);
        assert_eq!(loaded.answers.len(), report.answers.len());
        assert!((loaded.mean_similarity - report.mean_similarity).abs() < 1e-9);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/results/report.csv");

        sample_report().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer question here", 8), "a longer...");
    }
}
