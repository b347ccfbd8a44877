//! Request and response bodies of the decision backend.

use decide_core::{CostImpact, ImpactScope, Issue, Urgency};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueCreateRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_impact: Option<CostImpact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_scope: Option<ImpactScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_possible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<String>,
}

impl From<&Issue> for IssueCreateRequest {
    fn from(issue: &Issue) -> Self {
        IssueCreateRequest {
            text: issue.description.clone(),
            title: Some(issue.title.clone()).filter(|t| !t.is_empty()),
            tags: issue.tags.clone(),
            urgency: Some(issue.urgency),
            cost_impact: Some(issue.cost_impact),
            timeline_days: issue.timeline_days,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCreateResponse {
    pub issue_id: String,
    pub run_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query of the issue listing. Unset fields are left off the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListIssuesParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub my_issues: Option<bool>,
}

impl ListIssuesParams {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(skip) = self.skip {
            query.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query.push(("status", status.to_string()));
        }
        if let Some(mine) = self.my_issues {
            query.push(("my_issues", mine.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub expertise: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub turn: u32,
    pub speaker_role: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perspective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
}

/// A meeting transcript submitted for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub utterances: Vec<Utterance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_existing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualParticipant {
    pub name: String,
    pub role: String,
    pub persona_description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMeetingRequest {
    pub issue_id: String,
    pub participants: Vec<VirtualParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_config: Option<MeetingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproveBody<'a> {
    pub approver_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalApproveBody<'a> {
    pub approver_id: &'a str,
    pub conditions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectBody<'a> {
    pub approver_id: &'a str,
    pub reason: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawBody<'a> {
    pub requester_id: &'a str,
    pub reason: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_request_omits_unset_fields() {
        let issue = Issue {
            title: "Retention".to_string(),
            description: "Keep transcripts".to_string(),
            tags: vec!["privacy".to_string()],
            urgency: Urgency::High,
            cost_impact: CostImpact::None,
            timeline_days: None,
        };
        let body = serde_json::to_value(IssueCreateRequest::from(&issue)).unwrap();
        assert_eq!(
            body,
            json!({
                "text": "Keep transcripts",
                "title": "Retention",
                "tags": ["privacy"],
                "urgency": "HIGH",
                "cost_impact": "NONE"
            })
        );
    }

    #[test]
    fn listing_query_skips_unset_params() {
        let params = ListIssuesParams {
            limit: Some(20),
            my_issues: Some(true),
            ..Default::default()
        };
        assert_eq!(
            params.query(),
            vec![("limit", "20".to_string()), ("my_issues", "true".to_string())]
        );
        assert!(ListIssuesParams::default().query().is_empty());
    }
}
