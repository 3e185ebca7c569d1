//! Prompt templates for grounded generation

/// Prompt builder for document-grounded answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the grounding prompt for a question and retrieved context.
    ///
    /// The constraint wording is fixed: answers must come only from the
    /// supplied content, and missing answers must be admitted rather than
    /// filled in from model knowledge.
    pub fn grounded(question: &str, context: &str) -> String {
        format!(
            r#"Based ONLY on the following document content:

{context}

Answer this question: {question}

If the document doesn't contain the exact answer, say "I don't have information about this in my documents". Do not use any external knowledge."#,
            context = context,
            question = question
        )
    }
}
