//! Decision cards: the synthesized outcome of a run, its assignment and
//! its audit trail.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::candidate::RoutingCandidate;
use super::error::DecideError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendedAction {
    Approve,
    Reject,
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    #[serde(alias = "MEDIUM", alias = "MED")]
    Mid,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionPath {
    AutoApprove,
    SoftGate,
    HardGate,
}

macro_rules! display_as_serde {
    ($($ty:ty),*) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match serde_json::to_value(self) {
                    Ok(Value::String(s)) => write!(f, "{}", s),
                    _ => write!(f, "{:?}", self),
                }
            }
        })*
    };
}

display_as_serde!(RecommendedAction, RiskTier, ExecutionPath);

/// Off-contract values read as `None` so the rest of the card survives.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match T::deserialize(&v) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::debug!(value = %v, error = %err, "ignoring off-contract card field");
            None
        }
    }))
}

/// Card body as produced by the `decision_card` stream event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionCardData {
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<RecommendedAction>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub execution_path: Option<ExecutionPath>,
    #[serde(default, deserialize_with = "lenient")]
    pub risk_tier: Option<RiskTier>,
    #[serde(default, deserialize_with = "lenient")]
    pub budget_estimate: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub timeline_days: Option<u32>,
    #[serde(default)]
    pub rollback_conditions: Option<String>,
    #[serde(default)]
    pub next_steps: Option<Vec<String>>,
}

/// Who owns the card and who reviews it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardAssignment {
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub co_reviewer_ids: Option<Vec<String>>,
    #[serde(default)]
    pub approval_status: Option<String>,
}

impl CardAssignment {
    /// Overlay the fields present on `newer`.
    pub fn merge_from(&mut self, newer: &CardAssignment) {
        if newer.card_id.is_some() {
            self.card_id.clone_from(&newer.card_id);
        }
        if newer.owner_id.is_some() {
            self.owner_id.clone_from(&newer.owner_id);
        }
        if newer.owner_name.is_some() {
            self.owner_name.clone_from(&newer.owner_name);
        }
        if newer.co_reviewer_ids.is_some() {
            self.co_reviewer_ids.clone_from(&newer.co_reviewer_ids);
        }
        if newer.approval_status.is_some() {
            self.approval_status.clone_from(&newer.approval_status);
        }
    }
}

/// One record of the backend's run timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub event_type: String,
    pub event_timestamp: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub issue_id: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
}

/// A line in a card's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub label: String,
    pub timestamp: String,
}

impl From<&AuditRecord> for AuditEntry {
    fn from(record: &AuditRecord) -> Self {
        let label = match &record.actor_id {
            Some(actor) => format!("{} · {}", record.event_type, actor),
            None => record.event_type.clone(),
        };
        AuditEntry {
            id: record.id.clone(),
            label,
            timestamp: record.event_timestamp.clone(),
        }
    }
}

/// Local review state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    Draft,
    Sent,
}

/// The assembled decision card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionCard {
    pub data: DecisionCardData,
    pub assignment: CardAssignment,
    pub participants: Vec<RoutingCandidate>,
    pub audit_trail: Vec<AuditEntry>,
    pub status: CardStatus,
}

impl DecisionCard {
    pub fn compose(
        data: DecisionCardData,
        assignment: CardAssignment,
        participants: Vec<RoutingCandidate>,
        audit_trail: Vec<AuditEntry>,
    ) -> Self {
        DecisionCard {
            data,
            assignment,
            participants,
            audit_trail,
            status: CardStatus::Draft,
        }
    }

    pub fn card_id(&self) -> Option<&str> {
        self.assignment.card_id.as_deref()
    }

    /// Append an entry to the audit trail.
    pub fn record(&mut self, entry: AuditEntry) {
        self.audit_trail.push(entry);
    }

    /// Multi-line plain-text rendering.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "Decision card #{}",
            self.card_id().unwrap_or("(unassigned)")
        ));
        if let Some(summary) = &self.data.summary {
            lines.push(format!("  Summary:        {}", summary));
        }
        if let Some(action) = self.data.action {
            lines.push(format!("  Recommendation: {}", action));
        }
        if let Some(tier) = self.data.risk_tier {
            lines.push(format!("  Risk tier:      {}", tier));
        }
        if let Some(path) = self.data.execution_path {
            lines.push(format!("  Execution path: {}", path));
        }
        if let Some(rollback) = &self.data.rollback_conditions {
            lines.push(format!("  Rollback when:  {}", rollback));
        }
        if let Some(steps) = &self.data.next_steps {
            for step in steps {
                lines.push(format!("  - {}", step));
            }
        }
        if let Some(owner) = self
            .assignment
            .owner_name
            .as_deref()
            .or(self.assignment.owner_id.as_deref())
        {
            lines.push(format!("  Owner:          {}", owner));
        }
        if let Some(reviewers) = &self.assignment.co_reviewer_ids {
            if !reviewers.is_empty() {
                lines.push(format!("  Co-reviewers:   {}", reviewers.join(", ")));
            }
        }
        if !self.participants.is_empty() {
            let names: Vec<&str> = self.participants.iter().map(|p| p.display_name()).collect();
            lines.push(format!("  Participants:   {}", names.join(", ")));
        }
        if !self.audit_trail.is_empty() {
            lines.push("  Audit trail:".to_string());
            for entry in &self.audit_trail {
                lines.push(format!("    [{}] {}", entry.timestamp, entry.label));
            }
        }
        lines.join("\n")
    }
}

/// A reviewer action taken on a card.
#[derive(Debug, Clone, PartialEq)]
pub enum CardAction {
    Approve {
        comment: Option<String>,
    },
    ConditionalApprove {
        conditions: Vec<String>,
        comment: Option<String>,
    },
    Reject {
        reason: String,
        comment: Option<String>,
    },
    Withdraw {
        reason: String,
    },
}

impl CardAction {
    /// Path segment of the backend endpoint for this action.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CardAction::Approve { .. } => "approve",
            CardAction::ConditionalApprove { .. } => "conditional-approve",
            CardAction::Reject { .. } => "reject",
            CardAction::Withdraw { .. } => "withdraw",
        }
    }

    /// Reject actions that the backend would refuse anyway.
    pub fn validate(&self) -> Result<(), DecideError> {
        match self {
            CardAction::ConditionalApprove { conditions, .. }
                if conditions.iter().all(|c| c.trim().is_empty()) =>
            {
                Err(DecideError::CardAction(
                    "conditional approval needs at least one condition".to_string(),
                ))
            }
            CardAction::Reject { reason, .. } | CardAction::Withdraw { reason }
                if reason.trim().is_empty() =>
            {
                Err(DecideError::CardAction("a reason is required".to_string()))
            }
            _ => Ok(()),
        }
    }
}
