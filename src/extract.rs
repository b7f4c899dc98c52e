//! Answer isolation from raw model output.

/// Extract the model's answer from raw generated text.
///
/// The prompt itself ends with the cue, and models sometimes echo or repeat
/// the prompt structure in their continuation, so the substring after the
/// LAST occurrence of the cue is the model's own answer. If the cue is
/// absent entirely, the trimmed raw text is returned as a degraded but
/// non-fatal fallback.
pub fn extract_answer(raw_text: &str, cue: &str) -> String {
    if cue.is_empty() {
        return raw_text.trim().to_string();
    }
    match raw_text.rfind(cue) {
        Some(pos) => raw_text[pos + cue.len()..].trim().to_string(),
        None => raw_text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_after_single_cue() {
        let raw = "Context:\nC\n\nQuestion: Q?\nAnswer: The sky is blue.";
        assert_eq!(extract_answer(raw, "Answer:"), "The sky is blue.");
    }

    #[test]
    fn test_extract_uses_last_occurrence() {
        let raw = "Question: Q?\nAnswer: Question: Q?\nAnswer: the real answer";
        assert_eq!(extract_answer(raw, "Answer:"), "the real answer");
    }

    #[test]
    fn test_extract_trims_whitespace() {
        let raw = "Answer:   \n  padded answer  \n";
        assert_eq!(extract_answer(raw, "Answer:"), "padded answer");
    }

    #[test]
    fn test_missing_cue_falls_back_to_raw() {
        let raw = "  the model ignored the format  ";
        assert_eq!(extract_answer(raw, "Answer:"), "the model ignored the format");
    }

    #[test]
    fn test_cue_at_end_yields_empty() {
        assert_eq!(extract_answer("Question: Q?\nAnswer:", "Answer:"), "");
    }

    #[test]
    fn test_empty_cue_falls_back_to_raw() {
        assert_eq!(extract_answer(" text ", ""), "text");
    }
}
