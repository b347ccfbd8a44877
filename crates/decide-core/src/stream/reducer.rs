//! Fold decision-stream events into an analysis view.
//!
//! [`reduce`] is a pure state transition: it mutates an owned
//! [`AnalysisState`] and returns the side effects the caller must perform.
//! [`StreamReducer`] wraps it for a live run and publishes every new state
//! through a `tokio::sync::watch` channel.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::{merge_candidates, CandidateSource, CardAssignment, DecisionCardData, RoutingCandidate};
use crate::graph::Graph;
use crate::metrics::METRICS;
use crate::obs;
use crate::scoring::DECISION_SET_SIZE;

use super::events::{self, AgentMessage, DecisionEvent};
use super::format::{format_findings, format_structured_message, present};
use super::sse::SseFrame;

pub const INITIAL_STATUS: &str = "Analyzing issue...";
pub const CLOSED_EARLY: &str = "stream closed before the run completed";
pub const STREAM_ERROR: &str = "decision stream error";

const SYSTEM_AGENT: &str = "System";

/// Milestones of a run, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    InitialDecision,
    SafetyCheck,
    RuleApplied,
    GraphScope,
    VectorRanked,
    MeetingReady,
    RiskReview,
    OwnerAssigned,
    CardAssigned,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 9] = [
        ProgressStep::InitialDecision,
        ProgressStep::SafetyCheck,
        ProgressStep::RuleApplied,
        ProgressStep::GraphScope,
        ProgressStep::VectorRanked,
        ProgressStep::MeetingReady,
        ProgressStep::RiskReview,
        ProgressStep::OwnerAssigned,
        ProgressStep::CardAssigned,
    ];

    /// The step an event name completes, if any.
    pub fn from_event(name: &str) -> Option<Self> {
        Some(match name {
            events::INITIAL_DECISION_COMPLETED => ProgressStep::InitialDecision,
            events::SAFETY_CHECK_APPLIED => ProgressStep::SafetyCheck,
            events::RULE_APPLIED => ProgressStep::RuleApplied,
            events::GRAPH_SCOPE_ACTIVATED => ProgressStep::GraphScope,
            events::VECTOR_RANKED => ProgressStep::VectorRanked,
            events::MEETING_READY => ProgressStep::MeetingReady,
            events::RISK_REVIEW_COMPLETED => ProgressStep::RiskReview,
            events::OWNER_SEARCH_ASSIGNED => ProgressStep::OwnerAssigned,
            events::DECISION_CARD_ASSIGNED => ProgressStep::CardAssigned,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressStep::InitialDecision => "Initial judgment",
            ProgressStep::SafetyCheck => "Safety check",
            ProgressStep::RuleApplied => "Rule judgment",
            ProgressStep::GraphScope => "Graph scope",
            ProgressStep::VectorRanked => "Vector re-ranking",
            ProgressStep::MeetingReady => "Meeting prep",
            ProgressStep::RiskReview => "Risk review",
            ProgressStep::OwnerAssigned => "Owner assignment",
            ProgressStep::CardAssigned => "Card finalized",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Human-readable status for a recognized event name.
pub fn status_line(name: &str) -> Option<&'static str> {
    Some(match name {
        events::INITIAL_DECISION_STARTED => "LLM judgment started",
        events::INITIAL_DECISION_THINKING => "LLM reasoning",
        events::INITIAL_DECISION_COMPLETED => "Initial judgment complete",
        events::SAFETY_CHECK_APPLIED => "Safety check applied",
        events::RULE_APPLIED => "Rule-based judgment",
        events::GRAPH_SCOPE_ACTIVATED => "Graph scope set",
        events::GRAPH_CANDIDATES => "Collecting graph candidates",
        events::VECTOR_RANKED => "Vector re-ranking complete",
        events::REFERENCE_NODES_FOUND => "Consulting similar experience",
        events::MEETING_READY => "Meeting ready",
        events::RISK_REVIEW_STARTED => "Risk review started",
        events::RISK_REVIEW_AGENT_MESSAGE => "Risk message received",
        events::RISK_REVIEW_COMPLETED => "Risk review complete",
        events::OWNER_SEARCH_STARTED => "Owner search started",
        events::OWNER_SEARCH_CANDIDATES => "Collecting owner candidates",
        events::OWNER_SEARCH_ASSIGNED => "Owner assigned",
        events::DECISION_CARD => "Decision card created",
        events::DECISION_CARD_ASSIGNED => "Decision complete",
        _ => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    System,
    Security,
    Legal,
    Product,
}

impl AgentRole {
    /// Review agent type to display role.
    pub fn for_agent(agent_type: Option<&str>) -> Self {
        match agent_type {
            Some("SECURITY") => AgentRole::Security,
            Some("LEGAL") => AgentRole::Legal,
            Some("FINANCE" | "OPS" | "REPUTATION" | "PRODUCT") => AgentRole::Product,
            _ => AgentRole::System,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Action,
    Check,
    Warning,
    Consensus,
    /// Payload text shown as received.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub id: Uuid,
    pub agent: String,
    pub role: AgentRole,
    pub kind: LogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "message", rename_all = "snake_case")]
pub enum RunPhase {
    Streaming,
    Complete,
    Failed(String),
}

/// Work the caller must perform on behalf of the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load the run-scoped subgraph. Emitted at most once per run.
    FetchSubgraph,
}

/// Everything the analysis view shows for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisState {
    pub run_id: String,
    pub phase: RunPhase,
    pub status: String,
    pub candidates: Vec<RoutingCandidate>,
    pub decision_set: Vec<RoutingCandidate>,
    pub meeting_participants: Vec<RoutingCandidate>,
    pub logs: Vec<AgentLog>,
    pub progress: Option<ProgressStep>,
    pub seen_steps: BTreeSet<ProgressStep>,
    pub card: Option<DecisionCardData>,
    pub assignment: Option<CardAssignment>,
    pub issue_id: Option<String>,
    pub issue_title: Option<String>,
    pub graph: Option<Graph>,
    pub graph_error: Option<String>,
    pub events_seen: u64,
    #[serde(skip)]
    thinking: String,
    #[serde(skip)]
    agent_buffers: BTreeMap<String, String>,
    #[serde(skip)]
    subgraph_requested: bool,
}

impl AnalysisState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            phase: RunPhase::Streaming,
            status: INITIAL_STATUS.to_string(),
            candidates: Vec::new(),
            decision_set: Vec::new(),
            meeting_participants: Vec::new(),
            logs: Vec::new(),
            progress: None,
            seen_steps: BTreeSet::new(),
            card: None,
            assignment: None,
            issue_id: None,
            issue_title: None,
            graph: None,
            graph_error: None,
            events_seen: 0,
            thinking: String::new(),
            agent_buffers: BTreeMap::new(),
            subgraph_requested: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Complete
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.phase, RunPhase::Streaming)
    }

    /// Meeting participants when a meeting was convened, else the decision set.
    pub fn roster(&self) -> &[RoutingCandidate] {
        if self.meeting_participants.is_empty() {
            &self.decision_set
        } else {
            &self.meeting_participants
        }
    }

    /// Mark the run failed. A run that already failed keeps its first message.
    pub fn fail(&mut self, message: impl Into<String>) {
        if !matches!(self.phase, RunPhase::Failed(_)) {
            self.phase = RunPhase::Failed(message.into());
        }
    }

    /// Replace the displayed graph with the full organization graph.
    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = Some(graph);
        self.graph_error = None;
    }

    /// Replace the displayed graph with the run's subgraph, unless it is
    /// empty, in which case the current graph stays.
    pub fn set_subgraph(&mut self, graph: Graph) {
        if graph.is_empty() {
            tracing::warn!(run_id = %self.run_id, "subgraph empty, keeping full graph");
            return;
        }
        self.set_graph(graph);
    }

    pub fn set_graph_error(&mut self, message: impl Into<String>) {
        self.graph_error = Some(message.into());
    }

    fn advance(&mut self, step: ProgressStep) {
        self.seen_steps.insert(step);
        if self.progress.map_or(true, |current| step > current) {
            self.progress = Some(step);
        }
    }

    fn log(&mut self, agent: &str, role: AgentRole, kind: LogKind, message: impl Into<String>) {
        self.logs.push(AgentLog {
            id: Uuid::new_v4(),
            agent: agent.to_string(),
            role,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    fn system(&mut self, kind: LogKind, message: impl Into<String>) {
        self.log(SYSTEM_AGENT, AgentRole::System, kind, message);
    }

    /// Log `base`, followed by ` · `-joined details when there are any.
    fn summary(&mut self, kind: LogKind, base: &str, parts: Vec<Option<String>>) {
        let details: Vec<String> = parts.into_iter().flatten().collect();
        if details.is_empty() {
            self.system(kind, base);
        } else {
            self.system(kind, format!("{} · {}", base, details.join(" · ")));
        }
    }

    fn flush_thinking(&mut self, header: Option<&str>) {
        let text = self.thinking.trim();
        if text.is_empty() {
            return;
        }
        let cleaned = format_structured_message(text);
        self.thinking.clear();
        let message = match header {
            Some(h) => format!("{}\n{}", h, cleaned),
            None => cleaned,
        };
        self.system(LogKind::Check, message);
    }

    fn request_subgraph(&mut self, effects: &mut Vec<Effect>) {
        if !self.subgraph_requested {
            self.subgraph_requested = true;
            effects.push(Effect::FetchSubgraph);
        }
    }

    fn agent_message(&mut self, msg: &AgentMessage) {
        let key = msg.agent_type.clone().unwrap_or_else(|| "Agent".to_string());
        let content = msg.content.as_deref().unwrap_or("");
        if msg.is_delta() && !content.is_empty() {
            self.agent_buffers.entry(key).or_default().push_str(content);
            return;
        }

        let mut combined = self.agent_buffers.remove(&key).unwrap_or_default();
        combined.push_str(content);
        let combined = combined.trim();
        let formatted = if combined.is_empty() {
            "Risk message received".to_string()
        } else {
            format_structured_message(combined)
        };
        let findings = format_findings(&msg.findings);
        let message = if findings.is_empty() {
            formatted
        } else {
            format!("{}\n{}", formatted, findings)
        };
        let role = AgentRole::for_agent(msg.agent_type.as_deref());
        self.log(&key, role, LogKind::Check, message);
    }
}

fn labelled(label: &str, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| format!("{} {}", label, v))
}

fn listed(label: &str, items: Option<&Vec<String>>) -> Option<String> {
    items.map(|items| format!("{} {}", label, items.join(", ")))
}

/// Apply one event to `state`, returning the effects it requests.
///
/// Events arriving after the run has failed are ignored.
pub fn reduce(state: &mut AnalysisState, event: &DecisionEvent) -> Vec<Effect> {
    let mut effects = Vec::new();
    if matches!(state.phase, RunPhase::Failed(_)) {
        return effects;
    }

    let name = event.name();
    if let Some(status) = status_line(name) {
        state.status = status.to_string();
    }
    if let Some(step) = ProgressStep::from_event(name) {
        state.advance(step);
    }

    match event {
        DecisionEvent::InitialDecisionStarted(started) => {
            state.thinking.clear();
            state.issue_id.clone_from(&started.issue_id);
            state.issue_title.clone_from(&started.issue_title);
            state.system(LogKind::Action, "LLM judgment started");
        }
        DecisionEvent::InitialDecisionThinking(thinking) => {
            if let Some(content) = thinking.content.as_deref().filter(|c| !c.is_empty()) {
                state.thinking.push_str(content);
                if thinking.is_final == Some(true) {
                    state.flush_thinking(Some("LLM reasoning complete"));
                }
            }
        }
        DecisionEvent::InitialDecisionCompleted(done) => {
            state.flush_thinking(None);
            let details: Vec<String> = [
                labelled("Rationale:", done.reasoning.as_deref()),
                done.key_factors
                    .as_ref()
                    .filter(|f| !f.is_empty())
                    .map(|f| format!("Key factors: {}", f.join(", "))),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !details.is_empty() {
                state.system(LogKind::Check, details.join("\n"));
            }
            state.summary(
                LogKind::Check,
                "Initial judgment complete",
                vec![
                    labelled("risk", done.risk_tier.as_deref()),
                    labelled("path", done.execution_path.as_deref()),
                ],
            );
        }
        DecisionEvent::SafetyCheckApplied(check) => state.summary(
            LogKind::Warning,
            "Safety check applied",
            vec![
                labelled("risk", check.final_risk_tier.as_deref()),
                labelled("path", check.final_execution_path.as_deref()),
                labelled("reason:", check.override_reason.as_deref()),
            ],
        ),
        DecisionEvent::RuleApplied(rule) => state.summary(
            LogKind::Check,
            "Rule-based judgment",
            vec![
                labelled("risk", rule.risk_tier.as_deref()),
                labelled("path", rule.execution_path.as_deref()),
                present(rule.budget_impact.as_ref()).map(|v| format!("budget impact {}", v)),
            ],
        ),
        DecisionEvent::GraphScopeActivated(scope) => state.summary(
            LogKind::Action,
            "Graph scope set",
            vec![
                present(scope.scope.as_ref()).map(|v| format!("scope {}", v)),
                scope.hop.map(|h| format!("hop {}", h)),
            ],
        ),
        DecisionEvent::GraphCandidates(batch) => {
            if let Some(count) = batch.count {
                state.system(LogKind::Action, format!("Collected {} graph candidates", count));
            }
            state.candidates = events::graph_candidates(batch);
        }
        DecisionEvent::VectorRanked(ranked) => {
            let core = ranked.core_nodes.len();
            let refs = ranked.reference_nodes.len();
            if core + refs > 0 {
                state.system(
                    LogKind::Action,
                    format!("Vector re-ranking complete · core {} · reference {}", core, refs),
                );
            }
            let core_nodes = events::ranked_candidates(&ranked.core_nodes, CandidateSource::Vector);
            let reference_nodes =
                events::ranked_candidates(&ranked.reference_nodes, CandidateSource::Reference);
            merge_candidates(&mut state.candidates, &core_nodes);
            merge_candidates(&mut state.candidates, &reference_nodes);
            if state.decision_set.is_empty() {
                state.decision_set = core_nodes.into_iter().take(DECISION_SET_SIZE).collect();
            }
        }
        DecisionEvent::ReferenceNodesFound(found) => {
            let references = events::reference_candidates(found);
            if !references.is_empty() {
                state.system(
                    LogKind::Check,
                    format!("Consulted {} people with similar experience", references.len()),
                );
                merge_candidates(&mut state.candidates, &references);
            }
        }
        DecisionEvent::MeetingReady(ready) => {
            let participants = events::meeting_participants(ready);
            state.decision_set = participants.clone();
            state.meeting_participants = participants;
            if let Some(summary) = ready.summary.as_deref().filter(|s| !s.is_empty()) {
                state.system(LogKind::Check, format!("Meeting ready · {}", summary));
            }
        }
        DecisionEvent::RiskReviewStarted(started) => state.summary(
            LogKind::Action,
            "Risk review started",
            vec![
                started.agent_count.map(|n| format!("{} agents", n)),
                listed("participating:", started.agents.as_ref()),
            ],
        ),
        DecisionEvent::RiskReviewAgentMessage(msg) => state.agent_message(msg),
        DecisionEvent::RiskReviewCompleted => {
            state.system(LogKind::Consensus, "Risk review complete");
        }
        DecisionEvent::OwnerSearchStarted(started) => state.summary(
            LogKind::Action,
            "Owner search started",
            vec![
                labelled("required level", started.required_level.as_deref()),
                listed("domains", started.domains.as_ref()),
            ],
        ),
        DecisionEvent::OwnerSearchCandidates(batch) => {
            if let Some(count) = batch.count {
                state.system(LogKind::Action, format!("Searched {} owner candidates", count));
            }
            let owners = events::owner_candidates(batch);
            merge_candidates(&mut state.candidates, &owners);
        }
        DecisionEvent::OwnerSearchAssigned(assigned) => {
            state.summary(
                LogKind::Action,
                "Owner assigned",
                vec![labelled("reason:", assigned.assignment_reason.as_deref())],
            );
            state.decision_set = events::assigned_members(assigned);
            state.assignment = Some(assigned.assignment());
            state.request_subgraph(&mut effects);
        }
        DecisionEvent::DecisionCard(card) => {
            state.system(LogKind::Check, "Decision card created");
            state.card = Some(card.clone());
        }
        DecisionEvent::DecisionCardAssigned(assignment) => {
            state
                .assignment
                .get_or_insert_with(CardAssignment::default)
                .merge_from(assignment);
            state.system(LogKind::Consensus, "Decision complete");
            state.phase = RunPhase::Complete;
            state.request_subgraph(&mut effects);
        }
        DecisionEvent::Error { message } => {
            let message = message.clone().unwrap_or_else(|| STREAM_ERROR.to_string());
            state.fail(message);
        }
        DecisionEvent::Raw { text, .. } => {
            state.system(LogKind::Raw, text.clone());
        }
        DecisionEvent::Unknown { .. } => {}
    }

    effects
}

/// A live run: applies events serially and publishes each resulting state.
#[derive(Debug)]
pub struct StreamReducer {
    run_id: String,
    tx: watch::Sender<AnalysisState>,
}

impl StreamReducer {
    pub fn new(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let (tx, _rx) = watch::channel(AnalysisState::new(run_id.clone()));
        Self { run_id, tx }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AnalysisState {
        self.tx.borrow().clone()
    }

    pub fn apply_frame(&self, frame: &SseFrame) -> Vec<Effect> {
        self.apply(&DecisionEvent::from_frame(frame))
    }

    pub fn apply(&self, event: &DecisionEvent) -> Vec<Effect> {
        if let DecisionEvent::Unknown { event } = event {
            METRICS.inc_events_ignored();
            tracing::debug!(run_id = %self.run_id, event = %event, "ignoring unknown stream event");
            return Vec::new();
        }
        if matches!(self.tx.borrow().phase, RunPhase::Failed(_)) {
            METRICS.inc_events_ignored();
            tracing::debug!(run_id = %self.run_id, event = %event.name(), "ignoring event after failure");
            return Vec::new();
        }

        let mut effects = Vec::new();
        let mut completed = None;
        let mut failed = None;
        self.tx.send_modify(|state| {
            let was_terminal = state.is_terminal();
            state.events_seen += 1;
            effects = reduce(state, event);
            if !was_terminal {
                match &state.phase {
                    RunPhase::Complete => completed = Some((
                        state.assignment.as_ref().and_then(|a| a.card_id.clone()),
                        state.events_seen,
                    )),
                    RunPhase::Failed(message) => failed = Some(message.clone()),
                    RunPhase::Streaming => {}
                }
            }
            if matches!(event, DecisionEvent::Raw { .. }) {
                METRICS.inc_events_ignored();
            } else {
                METRICS.inc_events_reduced();
            }
            obs::emit_event_reduced(event.name(), state.events_seen);
        });

        if let Some((card_id, total)) = completed {
            obs::emit_run_completed(&self.run_id, card_id.as_deref(), total);
        }
        if let Some(message) = failed {
            obs::emit_stream_failed(&self.run_id, &message);
        }
        effects
    }

    /// The transport ended. A run that had not completed fails.
    pub fn on_closed(&self) {
        let mut failed = false;
        self.tx.send_modify(|state| {
            if state.phase == RunPhase::Streaming {
                state.fail(CLOSED_EARLY);
                failed = true;
            }
        });
        if failed {
            obs::emit_stream_failed(&self.run_id, &CLOSED_EARLY);
        }
    }

    /// Transport or setup failure.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        obs::emit_stream_failed(&self.run_id, &message);
        self.tx.send_modify(|state| state.fail(message));
    }

    /// Mutate the published state outside of event reduction (graph loads).
    pub fn update(&self, f: impl FnOnce(&mut AnalysisState)) {
        self.tx.send_modify(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::events::{Thinking, VectorRanked};
    use crate::stream::sse::Payload;
    use serde_json::json;

    fn event(name: &str, value: serde_json::Value) -> DecisionEvent {
        DecisionEvent::decode(name, &Payload::Json(value))
    }

    #[test]
    fn progress_steps_are_ordered() {
        for pair in ProgressStep::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ProgressStep::CardAssigned.index(), 8);
    }

    #[test]
    fn thinking_is_buffered_until_final() {
        let mut s = AnalysisState::new("run-1");
        let chunk = |content: &str, is_final: bool| {
            DecisionEvent::InitialDecisionThinking(Thinking {
                content: Some(content.to_string()),
                is_final: Some(is_final),
            })
        };
        reduce(&mut s, &chunk("Weighing ", false));
        reduce(&mut s, &chunk("options", false));
        assert!(s.logs.is_empty());
        reduce(&mut s, &chunk(".", true));
        assert_eq!(s.logs.len(), 1);
        assert_eq!(s.logs[0].message, "LLM reasoning complete\nWeighing options.");
    }

    #[test]
    fn completed_flushes_pending_thinking() {
        let mut s = AnalysisState::new("run-1");
        reduce(&mut s, &event(events::INITIAL_DECISION_THINKING, json!({"content": "partial"})));
        reduce(
            &mut s,
            &event(events::INITIAL_DECISION_COMPLETED, json!({"risk_tier": "HIGH"})),
        );
        let messages: Vec<&str> = s.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["partial", "Initial judgment complete · risk HIGH"]);
    }

    #[test]
    fn agent_deltas_flush_as_one_entry() {
        let mut s = AnalysisState::new("run-1");
        let msg = |kind: &str, content: &str| {
            event(
                events::RISK_REVIEW_AGENT_MESSAGE,
                json!({"agent_type": "LEGAL", "message_type": kind, "content": content}),
            )
        };
        reduce(&mut s, &msg("delta", "GDPR "));
        reduce(&mut s, &msg("delta", "exposure"));
        reduce(&mut s, &msg("final", ""));
        assert_eq!(s.logs.len(), 1);
        assert_eq!(s.logs[0].agent, "LEGAL");
        assert_eq!(s.logs[0].role, AgentRole::Legal);
        assert_eq!(s.logs[0].message, "GDPR exposure");
    }

    #[test]
    fn vector_ranked_seeds_empty_decision_set_only() {
        let mut s = AnalysisState::new("run-1");
        let nodes: Vec<_> = (0..7).map(|i| json!({"id": format!("p-{}", i), "score": 0.5})).collect();
        reduce(&mut s, &event(events::VECTOR_RANKED, json!({"core_nodes": nodes})));
        assert_eq!(s.decision_set.len(), DECISION_SET_SIZE);
        assert_eq!(s.candidates.len(), 7);

        s.decision_set.truncate(1);
        reduce(&mut s, &DecisionEvent::VectorRanked(VectorRanked::default()));
        assert_eq!(s.decision_set.len(), 1);
    }

    #[test]
    fn graph_candidates_replace_running_set() {
        let mut s = AnalysisState::new("run-1");
        reduce(&mut s, &event(events::VECTOR_RANKED, json!({"core_nodes": [{"id": "v-1"}]})));
        reduce(
            &mut s,
            &event(events::GRAPH_CANDIDATES, json!({"count": 1, "candidates": [{"person_id": "g-1"}]})),
        );
        assert_eq!(s.candidates.len(), 1);
        assert_eq!(s.candidates[0].id, "g-1");
    }

    #[test]
    fn subgraph_is_requested_once() {
        let mut s = AnalysisState::new("run-1");
        let first = reduce(
            &mut s,
            &event(events::OWNER_SEARCH_ASSIGNED, json!({"owner": {"id": "o-1"}})),
        );
        let second = reduce(
            &mut s,
            &event(events::DECISION_CARD_ASSIGNED, json!({"card_id": "c-1"})),
        );
        assert_eq!(first, vec![Effect::FetchSubgraph]);
        assert!(second.is_empty());
        assert!(s.is_complete());
        let a = s.assignment.as_ref().unwrap();
        assert_eq!(a.owner_id.as_deref(), Some("o-1"));
        assert_eq!(a.card_id.as_deref(), Some("c-1"));
    }

    #[test]
    fn error_event_fails_with_default_message() {
        let mut s = AnalysisState::new("run-1");
        reduce(&mut s, &event(events::ERROR, json!({})));
        assert_eq!(s.phase, RunPhase::Failed(STREAM_ERROR.to_string()));
        reduce(&mut s, &event(events::RISK_REVIEW_COMPLETED, json!({})));
        assert!(s.logs.is_empty());
    }

    #[test]
    fn empty_subgraph_keeps_current_graph() {
        let mut s = AnalysisState::new("run-1");
        let full = crate::mock_org::MockOrg::generate(10, 1).to_graph();
        s.set_graph(full.clone());
        s.set_subgraph(Graph::default());
        assert_eq!(s.graph.as_ref(), Some(&full));
    }

    #[tokio::test]
    async fn subscribers_see_each_state() {
        let reducer = StreamReducer::new("run-9");
        let mut rx = reducer.subscribe();
        reducer.apply(&event(events::RISK_REVIEW_COMPLETED, json!({})));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().status, "Risk review complete");
        reducer.on_closed();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().phase, RunPhase::Failed(CLOSED_EARLY.to_string()));
    }

    #[test]
    fn close_after_completion_is_clean() {
        let reducer = StreamReducer::new("run-9");
        reducer.apply(&event(events::DECISION_CARD_ASSIGNED, json!({"card_id": "c-1"})));
        reducer.on_closed();
        assert_eq!(reducer.state().phase, RunPhase::Complete);
    }

    #[test]
    fn events_after_failure_are_ignored_and_counted() {
        let reducer = StreamReducer::new("run-9");
        reducer.fail("boom");
        let before = reducer.state();
        let ignored = METRICS.events_ignored();
        let effects = reducer.apply(&event(events::DECISION_CARD_ASSIGNED, json!({"card_id": "c-1"})));
        assert!(effects.is_empty());
        assert_eq!(reducer.state(), before);
        assert_eq!(reducer.state().events_seen, 0);
        assert!(METRICS.events_ignored() > ignored);
    }

    #[test]
    fn raw_payloads_count_as_ignored() {
        let reducer = StreamReducer::new("run-9");
        let ignored = METRICS.events_ignored();
        reducer.apply(&DecisionEvent::decode(
            events::RISK_REVIEW_STARTED,
            &Payload::Text("warming up".to_string()),
        ));
        let state = reducer.state();
        assert_eq!(state.events_seen, 1);
        assert_eq!(state.logs.len(), 1);
        assert!(METRICS.events_ignored() > ignored);
    }

    #[test]
    fn unknown_events_do_not_touch_state() {
        let reducer = StreamReducer::new("run-9");
        let before = reducer.state();
        reducer.apply(&event("heartbeat", json!({"n": 1})));
        assert_eq!(reducer.state(), before);
    }
}
