//! System prompt and history window for completion requests.

use crate::domain::fact::Facts;

use super::Message;

/// Builds the system instructions for one turn.
///
/// The prompt carries the strategy goal, any retrieved reference context and
/// the facts collected so far.
pub fn system_prompt(strategy_name: &str, goal: &str, context: Option<&str>, facts: &Facts) -> String {
    let mut prompt = format!(
        "You are a clinical intake assistant running the \"{}\" conversation.\n\
         Goal: {}\n\n\
         Ask one clear question at a time. Be warm and concise. Do not give a diagnosis; \
         a clinician will review the answers.",
        strategy_name, goal
    );

    if !facts.is_empty() {
        prompt.push_str("\n\nInformation collected so far:\n");
        for (name, value) in facts.iter() {
            prompt.push_str(&format!("- {}: {}\n", name, value));
        }
        prompt.push_str("Do not ask again for information already collected.");
    }

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nReference material (use it to ground your answer; do not quote it verbatim):\n");
        prompt.push_str(context);
    }

    prompt
}

/// Returns the last `window` user/assistant messages, oldest first.
///
/// `messages` must already be in stored order.
pub fn history_window(messages: &[Message], window: usize) -> Vec<&Message> {
    let visible: Vec<&Message> = messages.iter().filter(|m| m.role().is_user_visible()).collect();
    let start = visible.len().saturating_sub(window);
    visible[start..].to_vec()
}
