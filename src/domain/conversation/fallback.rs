//! Deterministic rule-based responder.
//!
//! Used when the completion capability times out or errors. The reply is a
//! pure function of the accumulated facts, the strategy's required facts and
//! the turn number, so the conversation keeps moving without the model.

use crate::domain::fact::Facts;

const FOLLOW_UP_PROMPTS: &[&str] = &[
    "Have any of your close relatives been diagnosed with a serious illness? If so, who, and at what age?",
    "Are you currently taking any medications or receiving any treatment?",
    "Have you noticed any new or changing symptoms recently?",
    "Is there anything else about your health or your family's health that you'd like to share?",
];

/// Rule-based replacement for a model reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResponder;

impl FallbackResponder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the next question.
    ///
    /// Asks for age first, then for the first missing required fact, then
    /// cycles through general follow-up prompts by turn number.
    pub fn respond(&self, facts: &Facts, required_facts: &[String], turn: u32) -> String {
        let ack = if facts.is_empty() {
            "Thank you."
        } else {
            "Thank you, I've noted that."
        };

        if !facts.contains("age") {
            return format!("{} Could you tell me your age?", ack);
        }

        if let Some(missing) = required_facts.iter().find(|name| !facts.contains(name)) {
            return format!("{} Could you tell me about your {}?", ack, humanize(missing));
        }

        let prompt = FOLLOW_UP_PROMPTS[turn as usize % FOLLOW_UP_PROMPTS.len()];
        format!("{} {}", ack, prompt)
    }
}

fn humanize(fact: &str) -> String {
    fact.replace('_', " ")
}
