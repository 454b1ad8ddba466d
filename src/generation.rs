//! Grounded prompt assembly and the generation-collaborator seam.
//!
//! Text generation itself is an external collaborator: something that takes
//! a prompt string and returns a completion or fails. This module owns the
//! instruction template the collaborator is handed — the identity,
//! formatting, and grounding rules are content-policy contracts passed
//! through verbatim, never re-derived downstream.

use async_trait::async_trait;

use crate::retriever::Retriever;
use crate::types::RagError;

/// The exact sentence the assistant must use when the context cannot answer
/// the question. Also returned directly when retrieval finds no context at
/// all, without spending a generation call.
pub const FALLBACK_ANSWER: &str = "This information is not available in the portfolio.";

const GROUNDED_TEMPLATE: &str = "\
You are an AI assistant for the portfolio of Majeti Lahari.

IMPORTANT IDENTITY RULES:
- Majeti Lahari is female.
- Refer to her using \"she/her\" pronouns consistently.
- Do NOT use \"he\", \"they\", or neutral references.

CRITICAL FORMATTING RULES (STRICT):
- DO NOT use Markdown
- DO NOT use *, **, -, #, or any Markdown symbols
- Use plain text only

STYLE RULES:
- Professional, recruiter-friendly tone
- Clean paragraphs
- No emojis
- No excessive formatting

CONTENT RULES:
- Use ONLY the provided context
- Answer strictly from retrieved content
- Do NOT add external knowledge
- If information is missing, say exactly:
  \"This information is not available in the portfolio.\"

====================
CONTEXT:
{context}
====================

QUESTION:
{question}

ANSWER:
";

/// Renders the grounded instruction template around retrieved context and
/// the user's question.
pub fn build_prompt(context: &str, question: &str) -> String {
    GROUNDED_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

/// External text-generation collaborator: prompt in, completion out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Answers `question` from the index: retrieves context, short-circuits to
/// [`FALLBACK_ANSWER`] when none exists, otherwise hands the grounded prompt
/// to the collaborator.
pub async fn answer(
    retriever: &Retriever,
    generator: &dyn Generator,
    question: &str,
) -> Result<String, RagError> {
    let context = retriever.retrieve_context(question).await?;
    if context.is_empty() {
        return Ok(FALLBACK_ANSWER.to_string());
    }
    let completion = generator.complete(&build_prompt(&context, question)).await?;
    let answer = completion.trim();
    if answer.is_empty() {
        Ok(FALLBACK_ANSWER.to_string())
    } else {
        Ok(answer.to_string())
    }
}
