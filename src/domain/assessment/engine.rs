//! Criteria assessment engine.
//!
//! A pure function of (facts, criteria): no I/O, no clock reads other than
//! stamping `assessed_at`. Evaluators never panic; anything they cannot
//! decide becomes `Indeterminate` with a reason.

use super::result::{
    AssessmentResult, AssessmentStatus, CriterionOutcome, CriterionStatus, GroupScore, RecommendationTier,
    TierThresholds,
};
use crate::domain::fact::{FactValue, Facts};
use crate::domain::foundation::Timestamp;
use crate::domain::strategy::{AssessmentCriteria, Criterion, Evaluator};

/// Scores facts against a strategy's criteria.
#[derive(Debug, Clone, Default)]
pub struct AssessmentEngine {
    thresholds: TierThresholds,
}

impl AssessmentEngine {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Evaluates every criterion and derives the tier.
    ///
    /// Returns a `NoCriteria` result when no group carries a criterion.
    pub fn assess(&self, facts: &Facts, criteria: &AssessmentCriteria) -> AssessmentResult {
        let missing_required_facts: Vec<String> = criteria
            .required_facts
            .iter()
            .filter(|name| !facts.contains(name))
            .cloned()
            .collect();

        if criteria.is_empty() {
            return AssessmentResult {
                status: AssessmentStatus::NoCriteria,
                groups: Vec::new(),
                met: 0,
                total: 0,
                percentage: 0.0,
                met_criteria: Vec::new(),
                not_met_criteria: Vec::new(),
                indeterminate_criteria: Vec::new(),
                missing_required_facts,
                tier: None,
                recommendation: None,
                summary: "No assessment criteria are configured for this strategy.".to_string(),
                assessed_at: Timestamp::now(),
            };
        }

        let mut groups = Vec::with_capacity(criteria.groups.len());
        let mut met_criteria = Vec::new();
        let mut not_met_criteria = Vec::new();
        let mut indeterminate_criteria = Vec::new();

        for group in &criteria.groups {
            let outcomes: Vec<CriterionOutcome> = group
                .criteria
                .iter()
                .map(|criterion| evaluate(&group.name, criterion, facts))
                .collect();
            let met = outcomes.iter().filter(|o| o.status == CriterionStatus::Met).count();
            let total = outcomes.len();

            for outcome in &outcomes {
                match outcome.status {
                    CriterionStatus::Met => met_criteria.push(outcome.clone()),
                    CriterionStatus::NotMet => not_met_criteria.push(outcome.clone()),
                    CriterionStatus::Indeterminate => indeterminate_criteria.push(outcome.clone()),
                }
            }

            groups.push(GroupScore {
                name: group.name.clone(),
                met,
                total,
                percentage: percentage(met, total),
                outcomes,
            });
        }

        // Sum over groups so larger groups weigh proportionally more.
        let met: usize = groups.iter().map(|g| g.met).sum();
        let total: usize = groups.iter().map(|g| g.total).sum();
        let overall = percentage(met, total);
        let tier = self.thresholds.tier_for(overall);
        let recommendation = criteria
            .recommendations
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| tier.default_recommendation().to_string());

        let summary = summarize(met, total, overall, groups.len(), indeterminate_criteria.len(), tier);

        AssessmentResult {
            status: AssessmentStatus::Scored,
            groups,
            met,
            total,
            percentage: overall,
            met_criteria,
            not_met_criteria,
            indeterminate_criteria,
            missing_required_facts,
            tier: Some(tier),
            recommendation: Some(recommendation),
            summary,
            assessed_at: Timestamp::now(),
        }
    }
}

fn percentage(met: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        met as f64 * 100.0 / total as f64
    }
}

fn summarize(
    met: usize,
    total: usize,
    overall: f64,
    group_count: usize,
    indeterminate: usize,
    tier: RecommendationTier,
) -> String {
    let mut summary = format!(
        "{} of {} criteria met ({:.0}%) across {} group{}",
        met,
        total,
        overall,
        group_count,
        if group_count == 1 { "" } else { "s" }
    );
    if indeterminate > 0 {
        summary.push_str(&format!(", {} could not be determined", indeterminate));
    }
    summary.push_str(&format!(". Recommendation tier: {}.", tier));
    summary
}

fn evaluate(group: &str, criterion: &Criterion, facts: &Facts) -> CriterionOutcome {
    let value = facts.get(&criterion.fact);
    let (status, reason) = match value {
        None => (
            CriterionStatus::Indeterminate,
            Some(format!("missing fact '{}'", criterion.fact)),
        ),
        Some(value) => match apply(&criterion.evaluator, value) {
            Ok(true) => (CriterionStatus::Met, None),
            Ok(false) => (
                CriterionStatus::NotMet,
                Some(not_met_reason(&criterion.fact, &criterion.evaluator, value)),
            ),
            Err(reason) => (CriterionStatus::Indeterminate, Some(reason)),
        },
    };

    CriterionOutcome {
        criterion_id: criterion.id.clone(),
        group: group.to_string(),
        fact: criterion.fact.clone(),
        status,
        value: value.cloned(),
        reason,
    }
}

/// Ok(met?) or Err(reason) when the value cannot be judged.
fn apply(evaluator: &Evaluator, value: &FactValue) -> Result<bool, String> {
    match evaluator {
        Evaluator::Numeric { operator, threshold } => {
            let v = numeric(value)?;
            Ok(operator.compare(v, *threshold))
        }
        Evaluator::Range { min, max } => {
            let v = numeric(value)?;
            Ok(v >= *min && v <= *max)
        }
        Evaluator::Boolean { expected } => value
            .as_bool()
            .map(|b| b == *expected)
            .ok_or_else(|| format!("expected a yes/no value, found {}", value.kind())),
        Evaluator::OneOf { values } => {
            let items = value
                .as_items()
                .ok_or_else(|| format!("expected text or a list, found {}", value.kind()))?;
            Ok(items
                .iter()
                .any(|item| values.iter().any(|allowed| allowed.trim().eq_ignore_ascii_case(item.trim()))))
        }
        Evaluator::Exists => Ok(true),
    }
}

fn numeric(value: &FactValue) -> Result<f64, String> {
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err("value is not a finite number".to_string()),
        None => Err(format!("expected a number, found {}", value.kind())),
    }
}

fn not_met_reason(fact: &str, evaluator: &Evaluator, value: &FactValue) -> String {
    match evaluator {
        Evaluator::Numeric { operator, threshold } => {
            format!("{} = {} does not satisfy {} {}", fact, value, operator.symbol(), threshold)
        }
        Evaluator::Range { min, max } => format!("{} = {} is outside {}..={}", fact, value, min, max),
        Evaluator::Boolean { expected } => format!(
            "{} is {}, expected {}",
            fact,
            value,
            if *expected { "yes" } else { "no" }
        ),
        Evaluator::OneOf { values } => format!("{} = {} is not one of [{}]", fact, value, values.join(", ")),
        Evaluator::Exists => format!("{} is absent", fact),
    }
}
