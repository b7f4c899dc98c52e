//! Prompt construction and token estimation.

/// Marker string delimiting where the model's answer begins.
///
/// The extractor locates this cue in raw model output, so it must stay
/// stable across prompt assembly and extraction.
pub const ANSWER_CUE: &str = "Answer:";

/// Build the full prompt from a reference context and a question.
///
/// The context and question sections are delimited by labels, and the prompt
/// ends with the answer cue so the model continues from there. No truncation
/// happens here; fitting the context window is the budget planner's concern.
pub fn assemble_prompt(context: &str, question: &str) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {}\n{}",
        context, question, ANSWER_CUE
    )
}

/// Estimate token count from text (rough approximation: words / 0.75).
pub fn estimate_tokens(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    (word_count as f64 / 0.75) as usize
}
