//! Decide Core Library
//!
//! Candidate scoring, decision-stream reduction, graph normalization and
//! the local stores behind the `decide` tools.

pub mod domain;
pub mod graph;
pub mod log_store;
pub mod metrics;
pub mod mock_org;
pub mod obs;
pub mod run_cache;
pub mod scoring;
pub mod stream;
pub mod telemetry;

pub use domain::{
    format_age, merge_candidates, parse_timestamp, status_label, timeline_days_until,
    AuditEntry, AuditRecord, Candidate, CandidateSource, CardAction, CardAssignment, CardStatus,
    CostImpact, DecideError, DecisionCard, DecisionCardData, DecisionStyle, ExecutionPath,
    ImpactScope, IntakeError, Issue, IssueDraft, IssueRecord, IssueSummary, Person,
    RecommendedAction, Result, RiskTier, RiskTolerance, RoutingCandidate, ScoreBreakdown,
    SeniorityLevel, Urgency,
};

pub use graph::{EdgeKind, Graph, GraphEdge, GraphNode, GraphPayload};
pub use log_store::{DecisionLog, LogFilter, LogStore};
pub use mock_org::{MockOrg, OrgEdge};
pub use run_cache::RunCache;
pub use scoring::{
    org_distance, owner_org_path, rank, score, score_pool, RoutingResult, ScoreModel,
    CANDIDATE_LIMIT, DECISION_SET_SIZE,
};
pub use stream::{
    reduce, AgentLog, AgentRole, AnalysisState, DecisionEvent, Effect, LogKind, Payload,
    ProgressStep, RunPhase, SseDecoder, SseFrame, StreamReducer,
};

pub use metrics::METRICS;
pub use obs::{
    emit_event_reduced, emit_ranking_computed, emit_run_completed, emit_stream_failed,
    emit_stream_opened, RunSpan,
};
pub use telemetry::init_tracing;

/// Decide version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
