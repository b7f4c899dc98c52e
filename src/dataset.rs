//! QA dataset types and the built-in dataset registry.
//!
//! A dataset is an ordered sequence of question/reference-answer pairs bound
//! to a single reference context. The context is supplied to the model with
//! every question, simulating a retrieval-augmented prompt without an actual
//! retrieval step.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A single question with its known-good reference answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAItem {
    /// Unique identifier within the dataset.
    pub id: u32,
    /// The question posed to the model.
    pub question: String,
    /// The reference answer the model output is scored against.
    pub expected_answer: String,
}

/// A named, ordered QA suite with its bound reference context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QADataset {
    /// Dataset name.
    pub name: String,
    /// Reference context shared by every item in this dataset.
    pub context: String,
    /// Dataset items, in evaluation order.
    pub items: Vec<QAItem>,
}

impl QADataset {
    /// Create a new empty dataset.
    pub fn new(name: &str, context: &str) -> Self {
        Self {
            name: name.to_string(),
            context: context.to_string(),
            items: Vec::new(),
        }
    }

    /// Add an item to the dataset.
    pub fn add_item(&mut self, item: QAItem) {
        self.items.push(item);
    }

    /// Number of items in the dataset.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a subset of items (for quick testing).
    pub fn take(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            context: self.context.clone(),
            items: self.items.iter().take(n).cloned().collect(),
        }
    }

    /// Check structural invariants: item ids must be unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(EvalError::InvalidDataset {
                    name: self.name.clone(),
                    reason: format!("duplicate item id {}", item.id),
                });
            }
        }
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let dataset: QADataset = serde_json::from_str(&content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Save to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| EvalError::io(path, e))?;
        Ok(())
    }
}

/// Names of all built-in datasets.
pub fn builtin_names() -> Vec<&'static str> {
    vec!["appliance-faq"]
}

/// Look up a built-in dataset bundle by name.
///
/// Resolution is a direct lookup; an unknown key is a defined error.
pub fn builtin(name: &str) -> Result<QADataset> {
    match name {
        "appliance-faq" => Ok(appliance_faq_dataset()),
        other => Err(EvalError::UnknownDataset(other.to_string())),
    }
}

/// Built-in sample dataset: a product FAQ suite for a sewing machine, with
/// the product description as reference context.
pub fn appliance_faq_dataset() -> QADataset {
    let context = "\
The Beldray BEL0197 12 Stitch Sewing Machine is designed for both novice and \
experienced users seeking versatility and ease of use. It features a robust build with a \
compact, portable design, making it ideal for sewing enthusiasts with limited space. The \
machine offers 12 distinct stitch patterns, enabling users to perform a range of sewing \
tasks, from basic stitching to decorative designs. It is equipped with an easy-to-use dial \
for selecting stitch patterns, allowing for quick adjustments to suit various fabric types \
and sewing requirements.
The BEL0197 includes a four-step buttonhole function, simplifying the process of \
creating neat and consistent buttonholes. Its adjustable stitch length and zigzag width \
provide greater control over stitch customization. The machine is fitted with a powerful \
motor that ensures steady performance, even when working with thicker fabrics. A built-in \
LED light illuminates the sewing area, enhancing visibility and precision during sewing \
tasks.
Additional features include a thread cutter for convenience, a reverse sewing lever for \
reinforcing stitches, and a free arm for sewing cylindrical items like sleeves and cuffs. The \
Beldray BEL0197 also offers easy bobbin winding and a drop-in bobbin system for \
straightforward threading. Accessories such as extra bobbins, needles, and a foot pedal \
are included, providing users with everything needed to start sewing immediately. With \
its user-friendly operation and comprehensive features, the Beldray BEL0197 is an \
excellent choice for anyone looking to explore sewing projects with ease and efficiency.";

    let mut dataset = QADataset::new("appliance-faq", context);

    dataset.add_item(QAItem {
        id: 1,
        question: "How do I thread the Beldray BEL0197 sewing machine?".to_string(),
        expected_answer: "To thread the machine, first raise the needle to its highest position. \
Place the spool of thread on the spool pin and guide the thread through the thread guide, \
down the tension dial, and into the needle. Ensure the thread is properly secured in the \
take-up lever."
            .to_string(),
    });

    dataset.add_item(QAItem {
        id: 2,
        question: "What should I do if the stitches are skipping?".to_string(),
        expected_answer: "Skipped stitches can be due to a dull or bent needle. Replace the \
needle with a new one, ensuring it is the correct type for your fabric. Also, check that \
the machine is threaded correctly."
            .to_string(),
    });

    dataset.add_item(QAItem {
        id: 3,
        question: "How can I adjust the tension on my sewing machine?".to_string(),
        expected_answer: "To adjust the tension, use the tension dial located on the front of \
the machine. For tighter tension, turn the dial to a higher number. For looser tension, \
turn it to a lower number. Always test on a scrap piece of fabric first."
            .to_string(),
    });

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_operations() {
        let mut dataset = QADataset::new("test", "Some context.");
        assert!(dataset.is_empty());

        dataset.add_item(QAItem {
            id: 1,
            question: "Test question?".to_string(),
            expected_answer: "Test answer".to_string(),
        });

        assert_eq!(dataset.len(), 1);
        assert!(!dataset.is_empty());
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut dataset = QADataset::new("test", "ctx");
        dataset.add_item(QAItem {
            id: 7,
            question: "First?".to_string(),
            expected_answer: "One".to_string(),
        });
        dataset.add_item(QAItem {
            id: 7,
            question: "Second?".to_string(),
            expected_answer: "Two".to_string(),
        });

        let err = dataset.validate().unwrap_err();
        assert!(matches!(err, EvalError::InvalidDataset { .. }));
    }

    #[test]
    fn test_dataset_take() {
        let dataset = appliance_faq_dataset();
        assert_eq!(dataset.len(), 3);

        let subset = dataset.take(2);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.context, dataset.context);
    }

    #[test]
    fn test_builtin_lookup() {
        let dataset = builtin("appliance-faq").unwrap();
        assert_eq!(dataset.name, "appliance-faq");
        assert!(!dataset.is_empty());

        let err = builtin("nonexistent").unwrap_err();
        assert!(matches!(err, EvalError::UnknownDataset(name) if name == "nonexistent"));
    }

    #[test]
    fn test_appliance_faq_dataset() {
        let dataset = appliance_faq_dataset();
        assert!(dataset.validate().is_ok());
        assert!(dataset.context.contains("BEL0197"));

        for item in &dataset.items {
            assert!(!item.question.is_empty());
            assert!(!item.expected_answer.is_empty());
        }
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dataset.json");

        let original = appliance_faq_dataset();
        original.save_json(&path).unwrap();

        let loaded = QADataset::load_json(&path).unwrap();
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.context, original.context);
        assert_eq!(loaded.len(), original.len());
        assert_eq!(loaded.items[0].id, original.items[0].id);
    }
}
