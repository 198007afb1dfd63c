//! Opening message templates.
//!
//! The opening message is chosen by matching specialty keywords against the
//! strategy name. Strategies without a recognised specialty get a generic
//! greeting built from their goal text. A strategy-level override always wins.

use crate::domain::strategy::Strategy;

/// Specialty keyword sets and the opening each one selects, checked in order.
const SPECIALTY_OPENINGS: &[(&[&str], &str)] = &[
    (&["genetic", "hereditary"], GENETIC_OPENING),
    (&["cardi", "heart"], CARDIO_OPENING),
    (&["oncology", "cancer"], ONCOLOGY_OPENING),
    (&["mental", "depression", "anxiety"], MENTAL_HEALTH_OPENING),
    (&["pediatric", "child"], PEDIATRIC_OPENING),
];

/// Returns the opening assistant message for a strategy.
pub fn opening_message_for(strategy: &Strategy) -> String {
    if let Some(message) = strategy.opening_message.as_deref().filter(|m| !m.trim().is_empty()) {
        return message.to_string();
    }

    let name = strategy.name.to_lowercase();
    SPECIALTY_OPENINGS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map(|(_, opening)| opening.to_string())
        .unwrap_or_else(|| generic_opening(&strategy.goal))
}

fn generic_opening(goal: &str) -> String {
    let goal = goal.trim().trim_end_matches('.');
    format!(
        "Hello! Thank you for taking the time to talk with me. I'd like to ask you a few questions so we can {}. \
         Your answers help your care team understand your situation.\n\nTo begin, could you tell me your age?",
        lowercase_first(goal)
    )
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "understand your needs".to_string(),
    }
}

// ============================================================================
// Specialty openings
// ============================================================================

const GENETIC_OPENING: &str = "Hello! I'm here to help gather information about your personal and family health history. \
This helps determine whether genetic counselling or testing could be useful for you.\n\n\
To begin, could you tell me your age and whether any close relatives have been diagnosed with cancer or another inherited condition?";

const CARDIO_OPENING: &str = "Hello! I'd like to ask some questions about your heart health. \
We'll cover symptoms, lifestyle and family history of heart disease.\n\n\
To begin, could you tell me your age and whether you have experienced chest pain, shortness of breath or palpitations?";

const ONCOLOGY_OPENING: &str = "Hello! I'm here to collect some information for your cancer screening. \
Your answers help your care team decide on the right next steps.\n\n\
To begin, could you tell me your age and whether you or anyone in your family has had cancer?";

const MENTAL_HEALTH_OPENING: &str = "Hello, and thank you for reaching out. I'd like to ask a few questions about how you've been feeling lately. \
There are no right or wrong answers, and you can share as much or as little as you like.\n\n\
Over the past two weeks, how often have you felt down, depressed or anxious?";

const PEDIATRIC_OPENING: &str = "Hello! I'm here to gather some information about your child's health. \
Please answer on behalf of your child as best you can.\n\n\
To begin, how old is your child, and what brings you here today?";
