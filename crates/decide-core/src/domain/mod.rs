//! Domain models for decision routing.
//!
//! Canonical definitions for the core entities:
//! - `Person`: member of the organization, as read by the scorer
//! - `Issue`: a question submitted for routing
//! - `Candidate` / `RoutingCandidate`: scored people and streamed candidates
//! - `DecisionCard`: the synthesized outcome of a run

pub mod candidate;
pub mod decision;
pub mod error;
pub mod issue;
pub mod person;

// Re-export main types and errors
pub use candidate::{merge_candidates, Candidate, CandidateSource, RoutingCandidate, ScoreBreakdown};
pub use decision::{
    AuditEntry, AuditRecord, CardAction, CardAssignment, CardStatus, DecisionCard,
    DecisionCardData, ExecutionPath, RecommendedAction, RiskTier,
};
pub use error::{DecideError, IntakeError, Result};
pub use issue::{
    format_age, parse_timestamp, status_label, timeline_days_until, CostImpact, ImpactScope,
    Issue, IssueDraft, IssueRecord, IssueSummary, Urgency,
};
pub use person::{DecisionStyle, Person, RiskTolerance, SeniorityLevel};
