//! Candidate scoring and ranking over the generated organization.

use decide_core::{
    org_distance, rank, score, score_pool, CostImpact, Issue, MockOrg, ScoreModel, Urgency,
    CANDIDATE_LIMIT, DECISION_SET_SIZE,
};

fn issue(tags: &[&str]) -> Issue {
    Issue {
        title: "Customer data retention".to_string(),
        description: "Keep support transcripts for 90 days".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        urgency: Urgency::Mid,
        cost_impact: CostImpact::Low,
        timeline_days: Some(14),
    }
}

#[test]
fn every_score_is_bounded_and_weighted() {
    let org = MockOrg::default();
    let model = ScoreModel::STANDARD;
    let tags = vec!["privacy".to_string(), "security".to_string()];
    for person in &org.people {
        let (s, b) = score(person, &tags, "/Product");
        assert!((0.0..=1.0).contains(&s), "score {} out of range", s);
        let expected = model.participation_weight * b.participation
            + model.domain_weight * b.domain
            + model.tree_weight * b.tree
            + model.load_weight * b.load;
        assert!((s - expected).abs() < 1e-12);
    }
}

#[test]
fn tree_distance_properties_over_real_paths() {
    let org = MockOrg::generate(60, 21);
    for a in &org.people {
        assert_eq!(org_distance(&a.org_path, &a.org_path), 0);
        for b in org.people.iter().take(10) {
            assert_eq!(
                org_distance(&a.org_path, &b.org_path),
                org_distance(&b.org_path, &a.org_path)
            );
        }
    }
}

#[test]
fn reranking_is_stable() {
    let org = MockOrg::default();
    let issue = issue(&["privacy"]);
    let first = score_pool(&org.people, &issue, "/Product");
    let second = score_pool(&org.people, &issue, "/Product");
    let ids = |c: &[decide_core::Candidate]| c.iter().map(|c| c.person.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn full_pool_ranking_shapes_result() {
    let org = MockOrg::default();
    assert_eq!(org.people.len(), MockOrg::DEFAULT_SIZE);
    let result = rank(&org.people, &issue(&["privacy", "tech"]));
    assert_eq!(result.owner_org_path, "/Product");
    assert_eq!(result.candidates.len(), CANDIDATE_LIMIT);
    assert_eq!(result.decision_set.len(), DECISION_SET_SIZE);
    assert!(result
        .candidates
        .iter()
        .all(|c| c.reason == "High domain match for privacy"));
}

#[test]
fn untagged_issue_scores_without_nan() {
    let org = MockOrg::generate(20, 4);
    let result = rank(&org.people, &issue(&[]));
    assert!(result.candidates.iter().all(|c| c.score.is_finite()));
    assert!(result.candidates.iter().all(|c| c.score_breakdown.domain == 0.1));
}
