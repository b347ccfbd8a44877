//! Typed decision-stream events.
//!
//! Every recognized event name maps to one [`DecisionEvent`] variant with
//! a payload struct whose fields are all optional. Frames with other names
//! become [`DecisionEvent::Unknown`]; payloads that are not JSON, or JSON
//! that does not fit the variant's shape, become [`DecisionEvent::Raw`] so
//! their text can still be surfaced.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{CandidateSource, CardAssignment, DecisionCardData, RoutingCandidate};

use super::sse::{Payload, SseFrame};

pub const INITIAL_DECISION_STARTED: &str = "initial_decision.started";
pub const INITIAL_DECISION_THINKING: &str = "initial_decision.thinking";
pub const INITIAL_DECISION_COMPLETED: &str = "initial_decision.completed";
pub const SAFETY_CHECK_APPLIED: &str = "safety_check.applied";
pub const RULE_APPLIED: &str = "rule_applied";
pub const GRAPH_SCOPE_ACTIVATED: &str = "graph_scope_activated";
pub const GRAPH_CANDIDATES: &str = "graph_candidates";
pub const VECTOR_RANKED: &str = "vector_ranked";
pub const REFERENCE_NODES_FOUND: &str = "reference_nodes_found";
pub const MEETING_READY: &str = "meeting_ready";
pub const RISK_REVIEW_STARTED: &str = "risk_review.started";
pub const RISK_REVIEW_AGENT_MESSAGE: &str = "risk_review.agent.message";
pub const RISK_REVIEW_COMPLETED: &str = "risk_review.completed";
pub const OWNER_SEARCH_STARTED: &str = "owner_search.started";
pub const OWNER_SEARCH_CANDIDATES: &str = "owner_search.candidates";
pub const OWNER_SEARCH_ASSIGNED: &str = "owner_search.assigned";
pub const DECISION_CARD: &str = "decision_card";
pub const DECISION_CARD_ASSIGNED: &str = "decision_card.assigned";
pub const ERROR: &str = "error";

/// Every event name the reducer acts on.
pub const KNOWN_EVENTS: [&str; 19] = [
    INITIAL_DECISION_STARTED,
    INITIAL_DECISION_THINKING,
    INITIAL_DECISION_COMPLETED,
    SAFETY_CHECK_APPLIED,
    RULE_APPLIED,
    GRAPH_SCOPE_ACTIVATED,
    GRAPH_CANDIDATES,
    VECTOR_RANKED,
    REFERENCE_NODES_FOUND,
    MEETING_READY,
    RISK_REVIEW_STARTED,
    RISK_REVIEW_AGENT_MESSAGE,
    RISK_REVIEW_COMPLETED,
    OWNER_SEARCH_STARTED,
    OWNER_SEARCH_CANDIDATES,
    OWNER_SEARCH_ASSIGNED,
    DECISION_CARD,
    DECISION_CARD_ASSIGNED,
    ERROR,
];

/// Null and missing both read as the default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A person as it appears in stream payloads. Different stages populate
/// different subsets of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamPerson {
    pub id: Option<String>,
    pub person_id: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub team: Option<String>,
    pub department: Option<String>,
    pub score: Option<f64>,
    pub match_score: Option<f64>,
    pub similarity: Option<f64>,
    pub experience_summary: Option<String>,
}

impl StreamPerson {
    /// `person_id`, else `id`.
    pub fn key(&self) -> Option<&str> {
        self.person_id.as_deref().or(self.id.as_deref())
    }

    fn base(&self, id: &str) -> RoutingCandidate {
        RoutingCandidate {
            name: self.name.clone(),
            role: self.role.clone(),
            ..RoutingCandidate::new(id)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionStarted {
    pub issue_id: Option<String>,
    pub issue_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thinking {
    pub content: Option<String>,
    pub is_final: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionCompleted {
    pub reasoning: Option<String>,
    pub key_factors: Option<Vec<String>>,
    pub risk_tier: Option<String>,
    pub execution_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SafetyCheck {
    pub final_risk_tier: Option<String>,
    pub final_execution_path: Option<String>,
    pub override_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuleApplied {
    pub risk_tier: Option<String>,
    pub execution_path: Option<String>,
    pub budget_impact: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphScope {
    pub scope: Option<Value>,
    pub hop: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CandidateBatch {
    pub count: Option<u64>,
    #[serde(deserialize_with = "nullable")]
    pub candidates: Vec<StreamPerson>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VectorRanked {
    #[serde(deserialize_with = "nullable")]
    pub core_nodes: Vec<StreamPerson>,
    #[serde(deserialize_with = "nullable")]
    pub reference_nodes: Vec<StreamPerson>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReferencesFound {
    #[serde(deserialize_with = "nullable")]
    pub references: Vec<StreamPerson>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeetingReady {
    #[serde(deserialize_with = "nullable")]
    pub participants: Vec<StreamPerson>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskReviewStarted {
    pub agent_count: Option<u64>,
    pub agents: Option<Vec<String>>,
}

/// One risk finding attached to an agent's final message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Finding {
    pub risk_type: Option<String>,
    pub severity: Option<f64>,
    pub evidence: Option<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentMessage {
    pub agent_type: Option<String>,
    pub message_type: Option<String>,
    pub content: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub findings: Vec<Finding>,
}

impl AgentMessage {
    pub fn is_delta(&self) -> bool {
        self.message_type.as_deref() == Some("delta")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OwnerSearchStarted {
    pub required_level: Option<String>,
    pub domains: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OwnerAssigned {
    pub owner: Option<StreamPerson>,
    #[serde(deserialize_with = "nullable")]
    pub co_reviewers: Vec<StreamPerson>,
    pub approval_status: Option<String>,
    pub assignment_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
}

/// A decoded decision-stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionEvent {
    InitialDecisionStarted(DecisionStarted),
    InitialDecisionThinking(Thinking),
    InitialDecisionCompleted(DecisionCompleted),
    SafetyCheckApplied(SafetyCheck),
    RuleApplied(RuleApplied),
    GraphScopeActivated(GraphScope),
    GraphCandidates(CandidateBatch),
    VectorRanked(VectorRanked),
    ReferenceNodesFound(ReferencesFound),
    MeetingReady(MeetingReady),
    RiskReviewStarted(RiskReviewStarted),
    RiskReviewAgentMessage(AgentMessage),
    RiskReviewCompleted,
    OwnerSearchStarted(OwnerSearchStarted),
    OwnerSearchCandidates(CandidateBatch),
    OwnerSearchAssigned(OwnerAssigned),
    DecisionCard(DecisionCardData),
    DecisionCardAssigned(CardAssignment),
    Error { message: Option<String> },
    /// Payload that could not be read as its event's shape.
    Raw { event: String, text: String },
    /// Event name this client does not know.
    Unknown { event: String },
}

fn typed<T: DeserializeOwned>(value: &Value) -> Option<T> {
    T::deserialize(value).ok()
}

impl DecisionEvent {
    pub fn from_frame(frame: &SseFrame) -> Self {
        Self::decode(&frame.event, &frame.data)
    }

    pub fn decode(event: &str, payload: &Payload) -> Self {
        if !KNOWN_EVENTS.contains(&event) {
            return DecisionEvent::Unknown {
                event: event.to_string(),
            };
        }

        let value = match payload {
            Payload::Json(value) => value,
            Payload::Text(text) if event == ERROR => {
                return DecisionEvent::Error {
                    message: Some(text.clone()).filter(|t| !t.is_empty()),
                }
            }
            Payload::Text(text) => {
                return DecisionEvent::Raw {
                    event: event.to_string(),
                    text: text.clone(),
                }
            }
        };

        let decoded = match event {
            INITIAL_DECISION_STARTED => typed(value).map(Self::InitialDecisionStarted),
            INITIAL_DECISION_THINKING => typed(value).map(Self::InitialDecisionThinking),
            INITIAL_DECISION_COMPLETED => typed(value).map(Self::InitialDecisionCompleted),
            SAFETY_CHECK_APPLIED => typed(value).map(Self::SafetyCheckApplied),
            RULE_APPLIED => typed(value).map(Self::RuleApplied),
            GRAPH_SCOPE_ACTIVATED => typed(value).map(Self::GraphScopeActivated),
            GRAPH_CANDIDATES => typed(value).map(Self::GraphCandidates),
            VECTOR_RANKED => typed(value).map(Self::VectorRanked),
            REFERENCE_NODES_FOUND => typed(value).map(Self::ReferenceNodesFound),
            MEETING_READY => typed(value).map(Self::MeetingReady),
            RISK_REVIEW_STARTED => typed(value).map(Self::RiskReviewStarted),
            RISK_REVIEW_AGENT_MESSAGE => typed(value).map(Self::RiskReviewAgentMessage),
            RISK_REVIEW_COMPLETED => Some(Self::RiskReviewCompleted),
            OWNER_SEARCH_STARTED => typed(value).map(Self::OwnerSearchStarted),
            OWNER_SEARCH_CANDIDATES => typed(value).map(Self::OwnerSearchCandidates),
            OWNER_SEARCH_ASSIGNED => typed(value).map(Self::OwnerSearchAssigned),
            DECISION_CARD => typed(value).map(Self::DecisionCard),
            DECISION_CARD_ASSIGNED => typed(value).map(Self::DecisionCardAssigned),
            ERROR => Some(match value {
                Value::String(s) => Self::Error {
                    message: Some(s.clone()),
                },
                other => Self::Error {
                    message: typed::<ErrorBody>(other).and_then(|b| b.message),
                },
            }),
            _ => {
                return DecisionEvent::Unknown {
                    event: event.to_string(),
                }
            }
        };

        decoded.unwrap_or_else(|| DecisionEvent::Raw {
            event: event.to_string(),
            text: payload.to_text(),
        })
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            Self::InitialDecisionStarted(_) => INITIAL_DECISION_STARTED,
            Self::InitialDecisionThinking(_) => INITIAL_DECISION_THINKING,
            Self::InitialDecisionCompleted(_) => INITIAL_DECISION_COMPLETED,
            Self::SafetyCheckApplied(_) => SAFETY_CHECK_APPLIED,
            Self::RuleApplied(_) => RULE_APPLIED,
            Self::GraphScopeActivated(_) => GRAPH_SCOPE_ACTIVATED,
            Self::GraphCandidates(_) => GRAPH_CANDIDATES,
            Self::VectorRanked(_) => VECTOR_RANKED,
            Self::ReferenceNodesFound(_) => REFERENCE_NODES_FOUND,
            Self::MeetingReady(_) => MEETING_READY,
            Self::RiskReviewStarted(_) => RISK_REVIEW_STARTED,
            Self::RiskReviewAgentMessage(_) => RISK_REVIEW_AGENT_MESSAGE,
            Self::RiskReviewCompleted => RISK_REVIEW_COMPLETED,
            Self::OwnerSearchStarted(_) => OWNER_SEARCH_STARTED,
            Self::OwnerSearchCandidates(_) => OWNER_SEARCH_CANDIDATES,
            Self::OwnerSearchAssigned(_) => OWNER_SEARCH_ASSIGNED,
            Self::DecisionCard(_) => DECISION_CARD,
            Self::DecisionCardAssigned(_) => DECISION_CARD_ASSIGNED,
            Self::Error { .. } => ERROR,
            Self::Raw { event, .. } | Self::Unknown { event } => event,
        }
    }
}

/// Candidates reported by the graph scope stage.
pub fn graph_candidates(batch: &CandidateBatch) -> Vec<RoutingCandidate> {
    batch
        .candidates
        .iter()
        .filter_map(|p| {
            let id = p.key()?;
            Some(RoutingCandidate {
                level: p.level.clone(),
                team: p.team.clone(),
                department: p.department.clone(),
                source: Some(CandidateSource::Graph),
                ..p.base(id)
            })
        })
        .collect()
}

/// Ranked core or reference nodes from the vector stage.
pub fn ranked_candidates(
    nodes: &[StreamPerson],
    source: CandidateSource,
) -> Vec<RoutingCandidate> {
    nodes
        .iter()
        .filter_map(|p| {
            let id = p.key()?;
            Some(RoutingCandidate {
                score: p.score,
                source: Some(source),
                ..p.base(id)
            })
        })
        .collect()
}

/// Similar-experience references: score is the similarity, reason the
/// experience summary.
pub fn reference_candidates(found: &ReferencesFound) -> Vec<RoutingCandidate> {
    found
        .references
        .iter()
        .filter_map(|p| {
            let id = p.key()?;
            Some(RoutingCandidate {
                name: p.name.clone().or_else(|| p.person_id.clone()),
                score: p.similarity,
                reason: p.experience_summary.clone(),
                source: Some(CandidateSource::Reference),
                ..p.base(id)
            })
        })
        .collect()
}

/// Meeting participants, keyed by `person_id`, `id` or, failing both, name.
pub fn meeting_participants(ready: &MeetingReady) -> Vec<RoutingCandidate> {
    ready
        .participants
        .iter()
        .filter_map(|p| {
            let id = p.key().or(p.name.as_deref())?;
            Some(RoutingCandidate {
                source: Some(CandidateSource::Meeting),
                ..p.base(id)
            })
        })
        .collect()
}

/// Owner candidates: keyed by `id`, scored by `match_score`.
pub fn owner_candidates(batch: &CandidateBatch) -> Vec<RoutingCandidate> {
    batch
        .candidates
        .iter()
        .filter_map(|p| {
            let id = p.id.as_deref()?;
            Some(RoutingCandidate {
                name: p.name.clone(),
                level: p.level.clone(),
                score: p.match_score,
                source: Some(CandidateSource::Owner),
                ..RoutingCandidate::new(id)
            })
        })
        .collect()
}

/// Owner followed by co-reviewers.
pub fn assigned_members(assigned: &OwnerAssigned) -> Vec<RoutingCandidate> {
    assigned
        .owner
        .iter()
        .chain(assigned.co_reviewers.iter())
        .filter_map(|p| {
            let id = p.id.as_deref()?;
            Some(RoutingCandidate {
                name: p.name.clone(),
                level: p.level.clone(),
                source: Some(CandidateSource::Owner),
                ..RoutingCandidate::new(id)
            })
        })
        .collect()
}

impl OwnerAssigned {
    pub fn assignment(&self) -> CardAssignment {
        CardAssignment {
            card_id: None,
            owner_id: self.owner.as_ref().and_then(|o| o.id.clone()),
            owner_name: self.owner.as_ref().and_then(|o| o.name.clone()),
            co_reviewer_ids: Some(
                self.co_reviewers
                    .iter()
                    .filter_map(|r| r.id.clone())
                    .collect(),
            ),
            approval_status: self.approval_status.clone(),
        }
    }
}
