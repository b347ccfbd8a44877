//! Rank a pool of people for an issue and pick the decision set.

use serde::{Deserialize, Serialize};

use crate::domain::{Candidate, Issue, Person};
use crate::metrics::METRICS;
use crate::obs::emit_ranking_computed;

use super::model::ScoreModel;

/// Number of ranked candidates kept for display.
pub const CANDIDATE_LIMIT: usize = 12;

/// Size of the minimal judgment set drawn from the top candidates.
pub const DECISION_SET_SIZE: usize = 5;

/// Outcome of ranking a pool against an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub owner_org_path: String,
    pub candidates: Vec<Candidate>,
    pub decision_set: Vec<Candidate>,
}

/// Org unit accountable for an issue: finance issues go to `/Finance`,
/// everything else to `/Product`.
pub fn owner_org_path(tags: &[String]) -> &'static str {
    if tags.iter().any(|t| t == "finance") {
        "/Finance"
    } else {
        "/Product"
    }
}

/// Score every person in `pool`, highest first.
///
/// The sort is stable, so equal scores keep pool order and re-ranking the
/// same pool yields the same order.
pub fn score_pool(pool: &[Person], issue: &Issue, owner_path: &str) -> Vec<Candidate> {
    let model = ScoreModel::STANDARD;
    let reason = match issue.tags.first() {
        Some(tag) => format!("High domain match for {}", tag),
        None => "General fit".to_string(),
    };

    let mut scored: Vec<Candidate> = pool
        .iter()
        .map(|person| {
            let breakdown = model.breakdown(person, &issue.tags, owner_path);
            METRICS.inc_candidates_scored();
            Candidate {
                person: person.clone(),
                score: model.combine(&breakdown),
                score_breakdown: breakdown,
                reason: reason.clone(),
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Rank `pool` for `issue`: top [`CANDIDATE_LIMIT`] candidates and the
/// top [`DECISION_SET_SIZE`] as the decision set.
pub fn rank(pool: &[Person], issue: &Issue) -> RoutingResult {
    let owner = owner_org_path(&issue.tags);
    let mut candidates = score_pool(pool, issue, owner);
    candidates.truncate(CANDIDATE_LIMIT);
    let decision_set: Vec<Candidate> = candidates
        .iter()
        .take(DECISION_SET_SIZE)
        .cloned()
        .collect();

    emit_ranking_computed(pool.len(), candidates.len(), decision_set.len());

    RoutingResult {
        owner_org_path: owner.to_string(),
        candidates,
        decision_set,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_org::MockOrg;
    use crate::domain::{CostImpact, Urgency};

    fn issue(tags: &[&str]) -> Issue {
        Issue {
            title: "t".to_string(),
            description: "d".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            urgency: Urgency::High,
            cost_impact: CostImpact::Low,
            timeline_days: None,
        }
    }

    #[test]
    fn owner_path_follows_finance_tag() {
        assert_eq!(owner_org_path(&["finance".to_string()]), "/Finance");
        assert_eq!(owner_org_path(&["privacy".to_string()]), "/Product");
    }

    #[test]
    fn rank_limits_sizes() {
        let org = MockOrg::generate(200, MockOrg::DEFAULT_SEED);
        let result = rank(&org.people, &issue(&["privacy"]));
        assert_eq!(result.candidates.len(), CANDIDATE_LIMIT);
        assert_eq!(result.decision_set.len(), DECISION_SET_SIZE);
        assert_eq!(result.decision_set[..], result.candidates[..DECISION_SET_SIZE]);
    }

    #[test]
    fn rank_orders_descending() {
        let org = MockOrg::generate(100, 7);
        let result = rank(&org.people, &issue(&["security", "tech"]));
        for pair in result.candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn small_pool_is_not_padded() {
        let org = MockOrg::generate(3, 1);
        let result = rank(&org.people, &issue(&["privacy"]));
        assert_eq!(result.candidates.len(), 3);
        assert_eq!(result.decision_set.len(), 3);
    }
}
