//! Static fallback email template.
//!
//! Local string interpolation only; no network dependency. The scheduler
//! must always have a body to send, so this path never returns an empty
//! string.

use crate::reminders::Action;

/// Minimal HTML escaping for user-originated text embedded in email bodies.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the deterministic fallback body.
pub fn render_fallback(plant_name: &str, action: Action, remedy_text: Option<&str>) -> String {
    let safe_plant = escape_html(plant_name);
    let verb = match action {
        Action::Water => "water",
        Action::Treatment => "apply treatment to",
    };
    let step = match action {
        Action::Water => "Give 200-400 ml of water depending on pot size.",
        Action::Treatment => "Apply the recommended plant treatment as instructed.",
    };

    let mut body = format!(
        r#"<div style="font-family:system-ui, sans-serif; color:#0f172a;">
  <h2 style="color:#059669;">🌱 Reminder — {safe_plant}</h2>

  <p>Hello! This is a gentle reminder to <strong>{verb}</strong> your plant <strong>{safe_plant}</strong>.</p>

  <p><strong>Why:</strong> Consistent care helps keep the plant healthy and stress-free.</p>

  <ol>
    <li>{step}</li>
    <li>Monitor changes over the next 24-48 hours.</li>
  </ol>
"#
    );

    if let Some(remedy) = remedy_text.map(str::trim).filter(|r| !r.is_empty()) {
        let safe_remedy = escape_html(remedy);
        body.push_str("\n  <h3>Suggested Remedies</h3>\n  <p>");
        body.push_str(&safe_remedy);
        body.push_str("</p>\n");
    }

    body.push_str(
        "\n  <p style=\"color:#6b7280; margin-top:20px;\">— VrikZo Plant Care</p>\n</div>\n",
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("hi")</script>"#),
            "&lt;script&gt;alert(&quot;hi&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("Tom & Jerry's"), "Tom &amp; Jerry&#39;s");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn fallback_contains_plant_and_watering_language() {
        let body = render_fallback("Aloe", Action::Water, None);
        assert!(!body.is_empty());
        assert!(body.contains("Aloe"));
        assert!(body.contains("water"));
        assert!(body.contains("ml of water"));
    }

    #[test]
    fn fallback_contains_treatment_language() {
        let body = render_fallback("Fern", Action::Treatment, None);
        assert!(body.contains("Fern"));
        assert!(body.contains("treatment"));
        assert!(body.contains("recommended plant treatment"));
    }

    #[test]
    fn fallback_escapes_plant_name() {
        let body = render_fallback("<b>Aloe</b>", Action::Water, None);
        assert!(body.contains("&lt;b&gt;Aloe&lt;/b&gt;"));
        assert!(!body.contains("<b>Aloe</b>"));
    }

    #[test]
    fn fallback_includes_escaped_remedy_section() {
        let body = render_fallback("Aloe", Action::Treatment, Some("use <neem> oil"));
        assert!(body.contains("Suggested Remedies"));
        assert!(body.contains("use &lt;neem&gt; oil"));
    }

    #[test]
    fn fallback_omits_remedy_section_when_blank() {
        let body = render_fallback("Aloe", Action::Water, Some("   "));
        assert!(!body.contains("Suggested Remedies"));
    }
}
