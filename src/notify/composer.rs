//! Notification composer — renders a reminder into an email body.
//!
//! Primary path asks the text generator for an HTML body; any failure,
//! timeout, or empty result falls back to the static template. The
//! plain-text part is always the deterministic one-liner.

use std::sync::Arc;

use crate::llm::{TextGenerator, strip_code_fences};
use crate::notify::template::{escape_html, render_fallback};
use crate::reminders::Action;

/// A composed email: plain text plus rich HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailBody {
    pub text: String,
    pub html: String,
}

/// Builds reminder email bodies.
pub struct Composer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Composer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Compose the body for one reminder. Never returns an empty body.
    pub async fn compose(
        &self,
        plant_name: &str,
        action: Action,
        remedy_text: Option<&str>,
    ) -> EmailBody {
        let text = format!("Reminder: {} for {}", action.as_str(), plant_name);

        let html = match self.generate_html(plant_name, action, remedy_text).await {
            Some(html) => html,
            None => render_fallback(plant_name, action, remedy_text),
        };

        EmailBody { text, html }
    }

    async fn generate_html(
        &self,
        plant_name: &str,
        action: Action,
        remedy_text: Option<&str>,
    ) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let prompt = build_prompt(plant_name, action, remedy_text);

        match generator.generate(&prompt).await {
            Ok(raw) => {
                let html = strip_code_fences(&raw);
                if html.is_empty() {
                    tracing::warn!("Generator returned an empty body, using fallback");
                    None
                } else {
                    Some(html)
                }
            }
            Err(e) => {
                tracing::warn!("Email body generation failed: {e}");
                None
            }
        }
    }
}

/// The generation prompt. Free text is escaped up front so the "insert
/// exactly as provided" instruction yields HTML-safe output.
fn build_prompt(plant_name: &str, action: Action, remedy_text: Option<&str>) -> String {
    let action_word = match action {
        Action::Water => "Watering",
        Action::Treatment => "Treatment",
    };
    let remedies = match remedy_text.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => escape_html(r),
        None => "No remedies provided.".to_string(),
    };

    format!(
        r#"You are a friendly plant-care assistant. Generate a clean, concise HTML-formatted reminder email.

Plant: "{plant}"
Action: "{action_word}"

Write:
- Warm greeting
- Why the action matters
- 2 short actionable steps
- A section titled "Suggested Remedies"
- Insert the following remedies *exactly as provided*, no rephrasing:

REMEDY TEXT BELOW:
{remedies}

Return ONLY clean HTML (no backticks)."#,
        plant = escape_html(plant_name),
    )
}
