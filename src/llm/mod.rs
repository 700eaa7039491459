//! Text generation for reminder email bodies.
//!
//! The composer talks to a `TextGenerator` trait object; `gemini` provides
//! the production implementation against the generative-language REST API.

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiGenerator};

use async_trait::async_trait;

use crate::error::GenerationError;

/// A text-completion capability: prompt in, completion out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Strip markdown code-fence markers from a completion.
///
/// Upstream models wrap HTML bodies in ``` fences often enough that callers
/// must not trust the raw text.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // The opening fence line may carry a language tag.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fences_plain_passthrough() {
        assert_eq!(strip_code_fences("<p>hi</p>"), "<p>hi</p>");
    }

    #[test]
    fn strip_fences_bare() {
        assert_eq!(strip_code_fences("```\n<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn strip_fences_with_language_tag() {
        assert_eq!(strip_code_fences("```html\n<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn strip_fences_single_line() {
        assert_eq!(strip_code_fences("```<p>hi</p>```"), "<p>hi</p>");
    }

    #[test]
    fn strip_fences_surrounding_whitespace() {
        assert_eq!(strip_code_fences("  \n```\n<p>hi</p>\n```\n  "), "<p>hi</p>");
    }

    #[test]
    fn strip_fences_empty_input() {
        assert_eq!(strip_code_fences("   "), "");
    }
}
