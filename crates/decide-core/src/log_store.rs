//! In-process store of reviewer actions on decision cards.
//!
//! Serves as the audit trail when the backend timeline cannot be fetched,
//! and records local "sent to owner" notes. Entries live for the lifetime
//! of the store.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AuditEntry, CardStatus, DecideError, DecisionCard, Result};

/// Action name recorded for a note sent to the card owner.
pub const ACTION_SENT: &str = "sent";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    pub id: Uuid,
    pub card_id: String,
    pub actor_id: String,
    pub action: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&DecisionLog> for AuditEntry {
    fn from(log: &DecisionLog) -> Self {
        AuditEntry {
            id: log.id.to_string(),
            label: format!("{} by {}", log.action, log.actor_id),
            timestamp: log.timestamp.to_rfc3339(),
        }
    }
}

/// Which entries [`LogStore::list`] returns. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub card_id: Option<String>,
    pub action: Option<String>,
}

impl LogFilter {
    pub fn card(card_id: impl Into<String>) -> Self {
        Self {
            card_id: Some(card_id.into()),
            action: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    fn matches(&self, log: &DecisionLog) -> bool {
        self.card_id.as_deref().map_or(true, |c| c == log.card_id)
            && self.action.as_deref().map_or(true, |a| a == log.action)
    }
}

#[derive(Debug, Default)]
pub struct LogStore {
    logs: Mutex<Vec<DecisionLog>>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, card_id: &str, action: &str, comment: &str, actor_id: &str) -> DecisionLog {
        let log = DecisionLog {
            id: Uuid::new_v4(),
            card_id: card_id.to_string(),
            actor_id: actor_id.to_string(),
            action: action.to_string(),
            comment: comment.to_string(),
            timestamp: Utc::now(),
        };
        tracing::debug!(card_id = %card_id, action = %action, actor_id = %actor_id, "decision log appended");
        self.logs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(log.clone());
        log
    }

    /// Matching entries in insertion order.
    pub fn list(&self, filter: &LogFilter) -> Vec<DecisionLog> {
        self.logs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect()
    }

    /// Audit-trail view of a card's entries.
    pub fn audit_trail(&self, card_id: &str) -> Vec<AuditEntry> {
        self.list(&LogFilter::card(card_id))
            .iter()
            .map(AuditEntry::from)
            .collect()
    }

    /// Record a note to the card owner and mark the card sent.
    ///
    /// The note must not be blank.
    pub fn send_to_owner(
        &self,
        card: &mut DecisionCard,
        comment: &str,
        actor_id: &str,
    ) -> Result<DecisionLog> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(DecideError::CardAction(
                "a note for the owner is required".to_string(),
            ));
        }
        let card_id = card.card_id().unwrap_or_default().to_string();
        let log = self.append(&card_id, ACTION_SENT, comment, actor_id);
        card.record(AuditEntry::from(&log));
        card.status = CardStatus::Sent;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CardAssignment, DecisionCardData};

    fn card(id: &str) -> DecisionCard {
        DecisionCard::compose(
            DecisionCardData::default(),
            CardAssignment {
                card_id: Some(id.to_string()),
                ..Default::default()
            },
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn list_filters_by_card_and_action() {
        let store = LogStore::new();
        store.append("c-1", "approve", "ok", "p-1");
        store.append("c-1", ACTION_SENT, "fyi", "p-2");
        store.append("c-2", "reject", "no", "p-1");

        assert_eq!(store.list(&LogFilter::default()).len(), 3);
        assert_eq!(store.list(&LogFilter::card("c-1")).len(), 2);
        let sent = store.list(&LogFilter::card("c-1").with_action(ACTION_SENT));
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].actor_id, "p-2");
    }

    #[test]
    fn audit_labels_name_action_and_actor() {
        let store = LogStore::new();
        store.append("c-1", "approve", "", "person-staff-720");
        let trail = store.audit_trail("c-1");
        assert_eq!(trail[0].label, "approve by person-staff-720");
    }

    #[test]
    fn send_to_owner_requires_note() {
        let store = LogStore::new();
        let mut c = card("c-1");
        assert!(matches!(
            store.send_to_owner(&mut c, "   ", "p-1"),
            Err(DecideError::CardAction(_))
        ));
        assert_eq!(c.status, CardStatus::Draft);
        assert!(store.list(&LogFilter::default()).is_empty());
    }

    #[test]
    fn send_to_owner_marks_card_sent() {
        let store = LogStore::new();
        let mut c = card("c-1");
        let log = store.send_to_owner(&mut c, "please review by Friday", "p-1").unwrap();
        assert_eq!(log.action, ACTION_SENT);
        assert_eq!(c.status, CardStatus::Sent);
        assert_eq!(c.audit_trail.len(), 1);
        assert_eq!(store.audit_trail("c-1").len(), 1);
    }
}
