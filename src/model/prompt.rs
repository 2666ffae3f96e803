//! Prompt construction and response parsing

use crate::model::{Answer, MAX_FOLLOW_UPS};

/// Separator the model is asked to put before its follow-up questions
pub const FOLLOW_UP_MARKER: &str = "\n\nFollow-up questions:\n";

/// Keeps at most `max_chars` characters of `context`, suffixed with `...`
///
/// Cuts on a char boundary, never inside a multi-byte character.
pub fn truncate_context(context: &str, max_chars: usize) -> String {
    let cut = context
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(context.len());
    format!("{}...", &context[..cut])
}

/// Builds the full prompt for one question
pub fn build_prompt(question: &str, context: &str, max_chars: usize) -> String {
    let context = truncate_context(context, max_chars);
    format!(
        "You are an AI assistant. Your knowledge is based solely on the following content from the website:

{context}

Using only this information, please answer the following question:

{question}

Provide a clear and concise response, focusing on relevant information and provide source url. If the question is not directly related to the content on the website, politely inform the user that you can only provide information available related to the content of the website.

Include relevant facts, figures, and examples from the website when applicable. If appropriate, use emoji to make your response more engaging, but don't overuse them.

If you're unsure about any information or if it's not covered in the provided content, state that clearly rather than making assumptions.

After the answer, write a blank line, then the line \"Follow-up questions:\", then up to {MAX_FOLLOW_UPS} short follow-up questions the user might ask next, one per line."
    )
}

/// Splits raw model text into the answer and its follow-up questions
pub fn parse_response(text: &str) -> Answer {
    let (head, tail) = match text.split_once(FOLLOW_UP_MARKER) {
        Some((head, tail)) => (head, Some(tail)),
        None => (text, None),
    };

    let follow_up_questions = tail
        .map(|tail| {
            tail.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .take(MAX_FOLLOW_UPS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Answer {
        answer: head.trim().to_string(),
        follow_up_questions,
    }
}
