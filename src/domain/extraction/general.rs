//! General-purpose extractors that run for every strategy.
//!
//! - `age`: integer in 0..=120 from common phrasings
//! - `affirmative`: yes/no classification by lexicon voting
//! - `family_members`: relatives mentioned, canonical singular names
//! - `medical_terms`: conditions and symptoms from a fixed vocabulary

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{ExtractionContext, ExtractionError, FactExtractor};
use crate::domain::fact::{FactValue, Facts};

pub const AGE: &str = "age";
pub const AFFIRMATIVE: &str = "affirmative";
pub const FAMILY_MEMBERS: &str = "family_members";
pub const MEDICAL_TERMS: &str = "medical_terms";

const MIN_AGE: i64 = 0;
const MAX_AGE: i64 = 120;

static AGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(\d{1,3})\s*(?:-\s*)?(?:years?|yrs?)(?:\s*-?\s*old)?\b",
        r"(?i)\b(\d{1,3})\s*(?:y/?o|y-o)\b",
        r"(?i)\bage(?:d)?\s*(?:is|:|of)?\s*(\d{1,3})\b",
        r"(?i)\b(?:i'?m|i\s+am)\s+(\d{1,3})\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const YES_WORDS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "y", "correct", "right", "sure", "definitely", "absolutely", "affirmative", "true",
    "indeed", "ok", "okay",
];

const NO_WORDS: &[&str] = &[
    "no", "nope", "nah", "n", "not", "never", "negative", "none", "false", "don't", "didn't", "haven't", "hasn't",
    "isn't", "wasn't", "doesn't",
];

const FAMILY_VOCABULARY: &[&str] = &[
    "mother", "father", "mom", "dad", "sister", "brother", "daughter", "son", "grandmother", "grandfather", "aunt",
    "uncle", "cousin", "niece", "nephew", "parent", "sibling", "grandparent",
];

const MEDICAL_VOCABULARY: &[&str] = &[
    "cancer",
    "breast cancer",
    "ovarian cancer",
    "colon cancer",
    "colorectal cancer",
    "prostate cancer",
    "pancreatic cancer",
    "lung cancer",
    "melanoma",
    "leukemia",
    "lymphoma",
    "tumor",
    "brca",
    "lynch syndrome",
    "diabetes",
    "hypertension",
    "high blood pressure",
    "cholesterol",
    "heart disease",
    "heart attack",
    "stroke",
    "arrhythmia",
    "chest pain",
    "shortness of breath",
    "palpitations",
    "asthma",
    "copd",
    "depression",
    "anxiety",
    "dementia",
    "alzheimer's",
    "obesity",
    "arthritis",
    "kidney disease",
];

/// Runs all general extractors.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralExtractor;

impl GeneralExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous core; all general extractors are pure text functions.
    pub fn extract_all(&self, utterance: &str) -> Facts {
        let mut facts = Facts::new();
        if let Some(age) = extract_age(utterance) {
            facts.insert(AGE, FactValue::Integer(age));
        }
        if let Some(answer) = classify_affirmative(utterance) {
            facts.insert(AFFIRMATIVE, FactValue::Boolean(answer));
        }
        let relatives = find_family_members(utterance);
        if !relatives.is_empty() {
            facts.insert(FAMILY_MEMBERS, FactValue::List(relatives));
        }
        let terms = find_medical_terms(utterance);
        if !terms.is_empty() {
            facts.insert(MEDICAL_TERMS, FactValue::List(terms));
        }
        facts
    }
}

#[async_trait]
impl FactExtractor for GeneralExtractor {
    fn name(&self) -> &str {
        "general"
    }

    async fn extract(&self, utterance: &str, _context: &ExtractionContext) -> Result<Facts, ExtractionError> {
        Ok(self.extract_all(utterance))
    }
}

/// First plausible age in the utterance.
pub fn extract_age(utterance: &str) -> Option<i64> {
    AGE_PATTERNS.iter().find_map(|re| {
        re.captures_iter(utterance)
            .filter_map(|c| c.get(1)?.as_str().parse::<i64>().ok())
            .find(|age| (MIN_AGE..=MAX_AGE).contains(age))
    })
}

/// Yes/no by token voting. A tie (including no votes) is `None`.
pub fn classify_affirmative(utterance: &str) -> Option<bool> {
    let tokens = tokenize(utterance);
    let yes = tokens.iter().filter(|t| YES_WORDS.contains(&t.as_str())).count();
    let no = tokens.iter().filter(|t| NO_WORDS.contains(&t.as_str())).count();
    match yes.cmp(&no) {
        std::cmp::Ordering::Greater => Some(true),
        std::cmp::Ordering::Less => Some(false),
        std::cmp::Ordering::Equal => None,
    }
}

/// Relatives mentioned, in order of first mention, singular form.
pub fn find_family_members(utterance: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for token in tokenize(utterance) {
        let token = token.trim_end_matches("'s");
        let singular = token.strip_suffix('s').unwrap_or(token);
        let canonical = [token, singular]
            .into_iter()
            .find(|candidate| FAMILY_VOCABULARY.contains(candidate));
        if let Some(relative) = canonical {
            if !found.iter().any(|f| f == relative) {
                found.push(relative.to_string());
            }
        }
    }
    found
}

/// Vocabulary terms present, in vocabulary order.
pub fn find_medical_terms(utterance: &str) -> Vec<String> {
    let padded = format!(" {} ", tokenize(utterance).join(" "));
    MEDICAL_VOCABULARY
        .iter()
        .filter(|term| padded.contains(&format!(" {} ", term)))
        .map(|term| term.to_string())
        .collect()
}

/// Lowercase word tokens; apostrophes stay inside words.
fn tokenize(utterance: &str) -> Vec<String> {
    utterance
        .to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
