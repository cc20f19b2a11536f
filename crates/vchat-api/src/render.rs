//! Markdown rendering of interaction results.

use vchat_models::ConversationHistory;
use vchat_session::InteractionReport;

pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Render the answer, summary, key moments and the full Q&A history.
pub fn render_interaction(report: &InteractionReport, history: &ConversationHistory) -> String {
    let mut out = String::new();

    if let Some(answer) = &report.answer {
        out.push_str(answer);
        out.push_str("\n\n");
    }

    out.push_str("### Summary:\n\n");
    out.push_str(&report.summary);
    out.push_str("\n\n");

    out.push_str("### Key Moments:\n\n");
    for moment in &report.key_moments {
        out.push_str(&format!("- {}\n", moment));
    }
    out.push('\n');

    out.push_str(&render_history(history));
    out
}

/// Render the Q&A history, numbering turns from 1.
pub fn render_history(history: &ConversationHistory) -> String {
    let mut out = String::from("### Question and Answer History\n\n");
    for (i, turn) in history.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!("**Q{}:** {}\n\n", n, turn.prompt));
        out.push_str(&format!("**A{}:** {}\n\n", n, turn.response));
        out.push_str("---\n\n");
    }
    out
}
