//! Decide - decision routing CLI
//!
//! The `decide` command submits issues to the routing backend and follows
//! the resulting analysis runs.
//!
//! ## Commands
//!
//! - `submit`: Submit an issue and optionally follow its run
//! - `issues`: List submitted issues
//! - `watch`: Follow the decision stream of a run
//! - `rank`: Rank a mock organization offline
//! - `graph`: Summarize the organization graph or a run subgraph
//! - `timeline`: Show the audit timeline of a run
//! - `card`: Show or act on a decision card
//! - `meeting`: Submit a meeting transcript or generate a virtual meeting

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use decide_client::{
    AnalysisSession, ApiClient, ClientConfig, IssueCreateRequest, ListIssuesParams, MeetingInput,
    StreamMessage, VirtualMeetingRequest,
};
use decide_core::{
    rank, AnalysisState, AuditEntry, AuditRecord, CardAction, CostImpact, DecisionCard, EdgeKind, Graph,
    IssueDraft, IssueSummary, LogStore, MockOrg, RunCache, RunPhase, Urgency, CANDIDATE_LIMIT,
    DECISION_SET_SIZE,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "decide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Route decisions to the right people", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Backend base URL
    #[arg(long, global = true, env = "DECIDE_API_BASE_URL")]
    base_url: Option<String>,

    /// Identity sent as X-User-ID
    #[arg(long, global = true, env = "DECIDE_USER_ID")]
    user: Option<String>,

    /// Local issue-to-run cache file
    #[arg(long, global = true, default_value = decide_core::run_cache::DEFAULT_PATH)]
    run_cache: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an issue for routing
    Submit {
        /// Issue text
        #[arg(long)]
        text: String,

        /// Short title
        #[arg(long, default_value = "")]
        title: String,

        /// Domain tag (repeatable)
        #[arg(short, long = "tag", required = true)]
        tags: Vec<String>,

        /// LOW, MID or HIGH
        #[arg(long, default_value = "LOW", value_parser = parse_upper::<Urgency>)]
        urgency: Urgency,

        /// NONE, LOW, MID or HIGH
        #[arg(long, default_value = "NONE", value_parser = parse_upper::<CostImpact>)]
        cost_impact: CostImpact,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Follow the run after submitting
        #[arg(short, long)]
        watch: bool,
    },

    /// List submitted issues
    Issues {
        /// Only issues submitted by the current user
        #[arg(long)]
        mine: bool,

        /// Backend status filter (PENDING, PROCESSING, ...)
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of issues
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Follow the decision stream of a run
    Watch {
        /// Run ID, or an issue ID found in the run cache
        target: String,

        /// After completion, send the card to its owner with this note
        #[arg(long)]
        send: Option<String>,
    },

    /// Rank a generated organization for the given tags, offline
    Rank {
        /// Domain tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Organization size
        #[arg(long, default_value_t = MockOrg::DEFAULT_SIZE)]
        size: usize,

        /// Generator seed
        #[arg(long, default_value_t = MockOrg::DEFAULT_SEED)]
        seed: u64,
    },

    /// Summarize the organization graph
    Graph {
        /// Show the subgraph of this run instead
        #[arg(long)]
        run: Option<String>,

        /// Use the generated organization instead of the backend
        #[arg(long, conflicts_with = "run")]
        offline: bool,
    },

    /// Show the audit timeline of a run
    Timeline {
        /// Run ID
        run: String,
    },

    /// Show or act on a decision card
    Card {
        #[command(subcommand)]
        action: CardCommand,
    },

    /// Meeting transcripts and virtual meetings
    Meeting {
        #[command(subcommand)]
        action: MeetingCommand,
    },

    /// Show the current user
    Whoami,
}

#[derive(Subcommand)]
enum CardCommand {
    /// Print a stored card
    Show { card_id: String },

    /// Approve a card
    Approve {
        card_id: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Approve a card under conditions
    Conditional {
        card_id: String,
        /// Condition (repeatable)
        #[arg(short, long = "condition", required = true)]
        conditions: Vec<String>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Reject a card
    Reject {
        card_id: String,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Withdraw a card
    Withdraw {
        card_id: String,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand)]
enum MeetingCommand {
    /// Submit a meeting transcript (JSON file) for a run
    Submit { run: String, file: PathBuf },

    /// Generate a virtual meeting from a request (JSON file) and stream it
    Virtual { run: String, file: PathBuf },
}

fn parse_upper<T: DeserializeOwned>(value: &str) -> std::result::Result<T, String> {
    serde_json::from_value(Value::String(value.trim().to_ascii_uppercase()))
        .map_err(|_| format!("unsupported value '{}'", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    decide_core::init_tracing(cli.json, level);

    let api = Arc::new(build_client(&cli)?);

    let result = match cli.command {
        Commands::Submit {
            text,
            title,
            tags,
            urgency,
            cost_impact,
            due,
            watch,
        } => {
            let draft = IssueDraft {
                title,
                description: text,
                tags,
                urgency,
                cost_impact,
                due_date: due,
            };
            let run_id = cmd_submit(&api, &cli.run_cache, draft).await?;
            if watch {
                cmd_watch(&api, &cli.run_cache, &run_id, None).await?;
            }
            Ok(())
        }
        Commands::Issues {
            mine,
            status,
            limit,
        } => cmd_issues(&api, &cli.run_cache, mine, status, limit).await,
        Commands::Watch { target, send } => {
            cmd_watch(&api, &cli.run_cache, &target, send.as_deref()).await
        }
        Commands::Rank { tags, size, seed } => cmd_rank(&tags, size, seed),
        Commands::Graph { run, offline } => cmd_graph(&api, run.as_deref(), offline).await,
        Commands::Timeline { run } => cmd_timeline(&api, &run).await,
        Commands::Card { action } => cmd_card(&api, action).await,
        Commands::Meeting { action } => cmd_meeting(&api, action).await,
        Commands::Whoami => {
            let me = api.current_user().await?;
            println!("{} ({})", me.name, me.id);
            if let Some(role) = me.role {
                println!("  Role: {}", role);
            }
            if let Some(department) = me.department {
                println!("  Department: {}", department);
            }
            Ok(())
        }
    };

    decide_core::METRICS.flush();
    result
}

fn build_client(cli: &Cli) -> Result<ApiClient> {
    let mut config = match &cli.base_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    if let Some(user) = &cli.user {
        config = config.with_user(user);
    }
    ApiClient::new(config).context("Failed to build API client")
}

/// Validate and submit an issue, remembering its run locally.
async fn cmd_submit(api: &ApiClient, cache_path: &Path, draft: IssueDraft) -> Result<String> {
    let issue = draft
        .validate(Utc::now().date_naive())
        .context("Issue rejected")?;
    let mut request = IssueCreateRequest::from(&issue);
    request.submitter_id = Some(api.user_id().to_string());

    let created = api.create_issue(&request).await?;
    let mut cache = RunCache::open(cache_path);
    cache
        .record(&created.issue_id, &created.run_id)
        .context("Failed to update run cache")?;

    info!(issue_id = %created.issue_id, run_id = %created.run_id, "issue submitted");
    println!("Submitted issue {}", created.issue_id);
    println!("  Run: {}", created.run_id);
    Ok(created.run_id)
}

async fn cmd_issues(
    api: &ApiClient,
    cache_path: &Path,
    mine: bool,
    status: Option<String>,
    limit: u32,
) -> Result<()> {
    let params = ListIssuesParams {
        limit: Some(limit),
        status,
        my_issues: mine.then_some(true),
        ..Default::default()
    };
    let records = api.list_issues(&params).await?;
    if records.is_empty() {
        println!("No issues found");
        return Ok(());
    }

    let cache = RunCache::open(cache_path);
    let now = Utc::now();
    for record in &records {
        let run_id = cache.get(&record.id).map(str::to_string);
        let row = IssueSummary::from_record(record, run_id, now);
        println!(
            "{}  {:<10} {:<4} {:>7}  {}",
            row.id, row.status, row.urgency, row.age, row.title
        );
        if !row.tags.is_empty() {
            println!("    tags: {}", row.tags.join(", "));
        }
        if let Some(run) = &row.run_id {
            println!("    run:  {}", run);
        }
    }
    Ok(())
}

/// Resolve a watch target: an issue ID known to the run cache maps to its
/// run, anything else is taken as a run ID.
fn resolve_run(cache: &RunCache, target: &str) -> (String, bool) {
    match cache.get(target) {
        Some(run_id) => (run_id.to_string(), true),
        None => (target.to_string(), false),
    }
}

async fn cmd_watch(
    api: &Arc<ApiClient>,
    cache_path: &Path,
    target: &str,
    send_note: Option<&str>,
) -> Result<()> {
    let cache = RunCache::open(cache_path);
    let (run_id, resumed) = resolve_run(&cache, target);
    if resumed {
        println!("Resuming run {} for issue {}", run_id, target);
    }

    let stream = api
        .stream_decision(&run_id)
        .await
        .with_context(|| format!("Failed to open decision stream for {}", run_id))?;
    let session = AnalysisSession::new(run_id.clone(), api.clone());
    let updates = session.subscribe();
    let (state, ()) = tokio::join!(session.run(stream, resumed), print_progress(updates));

    if let RunPhase::Failed(message) = &state.phase {
        bail!("Run {} failed: {}", run_id, message);
    }

    let timeline = match api.run_timeline(&run_id).await {
        Ok(records) => Some(records),
        Err(err) => {
            tracing::warn!(error = %err, "timeline unavailable, using local log");
            None
        }
    };

    let store = LogStore::new();
    let mut card = compose_card(&state, Vec::new());
    if let Some(note) = send_note {
        store
            .send_to_owner(&mut card, note, api.user_id())
            .context("Failed to send card")?;
    }
    attach_audit_trail(&mut card, timeline, &store);

    println!();
    println!("{}", card.render());
    Ok(())
}

/// Timeline entries first, then what this process logged locally.
/// Without a timeline the local log is the whole trail.
fn attach_audit_trail(card: &mut DecisionCard, timeline: Option<Vec<AuditRecord>>, store: &LogStore) {
    let card_id = card.card_id().unwrap_or_default().to_string();
    let local = store.audit_trail(&card_id);
    card.audit_trail = match timeline {
        Some(records) => records.iter().map(AuditEntry::from).chain(local).collect(),
        None => local,
    };
}

fn compose_card(state: &AnalysisState, trail: Vec<AuditEntry>) -> DecisionCard {
    DecisionCard::compose(
        state.card.clone().unwrap_or_default(),
        state.assignment.clone().unwrap_or_default(),
        state.roster().to_vec(),
        trail,
    )
}

/// Print status changes and new agent log lines until the run ends.
async fn print_progress(mut updates: watch::Receiver<AnalysisState>) {
    let mut printed = 0;
    let mut status = String::new();
    loop {
        let done = {
            let state = updates.borrow_and_update();
            if state.status != status {
                status = state.status.clone();
                println!("== {}", status);
            }
            for log in state.logs.iter().skip(printed) {
                println!("[{}] {}: {}", log.timestamp.format("%H:%M:%S"), log.agent, log.message);
            }
            printed = state.logs.len();
            state.is_terminal()
        };
        if done || updates.changed().await.is_err() {
            break;
        }
    }
}

fn cmd_rank(tags: &[String], size: usize, seed: u64) -> Result<()> {
    let draft = IssueDraft {
        description: "offline ranking".to_string(),
        tags: tags.to_vec(),
        ..Default::default()
    };
    let issue = draft
        .validate(Utc::now().date_naive())
        .context("Ranking needs at least one tag")?;
    let org = MockOrg::generate(size, seed);
    let result = rank(&org.people, &issue);

    println!(
        "Owner org: {}   (top {} of {}, decision set {})",
        result.owner_org_path,
        CANDIDATE_LIMIT,
        org.people.len(),
        DECISION_SET_SIZE
    );
    for (i, c) in result.candidates.iter().enumerate() {
        let b = &c.score_breakdown;
        println!(
            "{:>2}. {:<14} {:<28} {:.3}  part {:.2} dom {:.2} tree {:.2} load {:.2}",
            i + 1,
            c.person.name,
            c.person.role,
            c.score,
            b.participation,
            b.domain,
            b.tree,
            b.load
        );
    }
    let set: Vec<&str> = result
        .decision_set
        .iter()
        .map(|c| c.person.id.as_str())
        .collect();
    println!("Decision set: {}", set.join(", "));
    Ok(())
}

async fn cmd_graph(api: &Arc<ApiClient>, run: Option<&str>, offline: bool) -> Result<()> {
    let graph = if offline {
        MockOrg::default().to_graph()
    } else if let Some(run_id) = run {
        Graph::from_payload(api.subgraph(run_id, decide_client::SUBGRAPH_MAX_NODES).await?)
    } else {
        let payload = api
            .full_graph(
                Some(decide_client::FULL_GRAPH_MAX_NODES),
                Some(decide_client::FULL_GRAPH_MAX_EDGES),
            )
            .await?;
        Graph::from_payload(payload)
    };
    print_graph(&graph);
    Ok(())
}

fn print_graph(graph: &Graph) {
    println!("{} nodes, {} edges", graph.nodes.len(), graph.edges.len());
    for kind in [EdgeKind::Project, EdgeKind::Risk, EdgeKind::Budget, EdgeKind::Other] {
        let count = graph.edges.iter().filter(|e| e.kind() == kind).count();
        if count > 0 {
            println!("  {:?}: {}", kind, count);
        }
    }
}

async fn cmd_timeline(api: &ApiClient, run_id: &str) -> Result<()> {
    let records = api.run_timeline(run_id).await?;
    if records.is_empty() {
        println!("No timeline entries for run {}", run_id);
        return Ok(());
    }
    for record in &records {
        let entry = AuditEntry::from(record);
        println!("[{}] {}", entry.timestamp, entry.label);
    }
    Ok(())
}

async fn cmd_card(api: &ApiClient, command: CardCommand) -> Result<()> {
    let (card_id, action) = match command {
        CardCommand::Show { card_id } => {
            match api.decision_card(&card_id).await? {
                Some(card) => println!("{}", serde_json::to_string_pretty(&card)?),
                None => println!("No card {}", card_id),
            }
            return Ok(());
        }
        CardCommand::Approve { card_id, comment } => (card_id, CardAction::Approve { comment }),
        CardCommand::Conditional {
            card_id,
            conditions,
            comment,
        } => (
            card_id,
            CardAction::ConditionalApprove {
                conditions,
                comment,
            },
        ),
        CardCommand::Reject {
            card_id,
            reason,
            comment,
        } => (card_id, CardAction::Reject { reason, comment }),
        CardCommand::Withdraw { card_id, reason } => (card_id, CardAction::Withdraw { reason }),
    };

    let response = api.card_action(&card_id, &action).await?;
    println!("{} {}: ok", action.endpoint(), card_id);
    if let Some(body) = response {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

async fn cmd_meeting(api: &Arc<ApiClient>, command: MeetingCommand) -> Result<()> {
    match command {
        MeetingCommand::Submit { run, file } => {
            let meeting: MeetingInput = read_json(&file)?;
            if meeting.utterances.is_empty() {
                bail!("Meeting transcript has no utterances");
            }
            api.submit_meeting(&run, &meeting).await?;
            println!("Submitted {} utterances for run {}", meeting.utterances.len(), run);
            Ok(())
        }
        MeetingCommand::Virtual { run, file } => {
            let request: VirtualMeetingRequest = read_json(&file)?;
            let mut stream = api.generate_virtual_meeting(&run, &request).await?;
            while let Some(message) = stream.next().await {
                match message {
                    StreamMessage::Frame(frame) => {
                        println!("{}: {}", frame.event, frame.data.to_text())
                    }
                    StreamMessage::Failed(err) => return Err(err.into()),
                    StreamMessage::Closed => break,
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn replay_offline(run_id: &str, body: &str) -> AnalysisState {
        use decide_client::{StaticGraph, StreamHandle};
        use decide_core::SseDecoder;

        let mut decoder = SseDecoder::new();
        let mut messages: Vec<StreamMessage> = decoder
            .feed(body.as_bytes())
            .into_iter()
            .map(StreamMessage::Frame)
            .collect();
        messages.push(StreamMessage::Closed);
        let graphs = Arc::new(StaticGraph(MockOrg::generate(10, 1).to_graph()));
        AnalysisSession::new(run_id, graphs)
            .run(StreamHandle::from_messages(messages), false)
            .await
    }

    #[test]
    fn parses_submit_with_repeated_tags() {
        let cli = Cli::try_parse_from([
            "decide", "submit", "--text", "Keep logs", "-t", "privacy", "-t", "security",
            "--urgency", "high", "--cost-impact", "mid",
        ])
        .unwrap();
        match cli.command {
            Commands::Submit {
                tags,
                urgency,
                cost_impact,
                watch,
                ..
            } => {
                assert_eq!(tags, ["privacy", "security"]);
                assert_eq!(urgency, Urgency::High);
                assert_eq!(cost_impact, CostImpact::Mid);
                assert!(!watch);
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn rejects_unknown_urgency() {
        let result = Cli::try_parse_from([
            "decide", "submit", "--text", "x", "-t", "privacy", "--urgency", "someday",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn submit_requires_a_tag() {
        assert!(Cli::try_parse_from(["decide", "submit", "--text", "x"]).is_err());
    }

    #[test]
    fn graph_offline_conflicts_with_run() {
        assert!(Cli::try_parse_from(["decide", "graph", "--offline", "--run", "r-1"]).is_err());
    }

    #[test]
    fn parses_conditional_approval() {
        let cli = Cli::try_parse_from([
            "decide", "card", "conditional", "card-1", "-c", "budget cap", "-c", "legal review",
        ])
        .unwrap();
        match cli.command {
            Commands::Card {
                action: CardCommand::Conditional { conditions, .. },
            } => assert_eq!(conditions.len(), 2),
            _ => panic!("expected conditional approval"),
        }
    }

    #[test]
    fn watch_target_resolves_through_run_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");
        let mut cache = RunCache::open(&path);
        cache.record("issue-1", "run-1").unwrap();

        let cache = RunCache::open(&path);
        assert_eq!(resolve_run(&cache, "issue-1"), ("run-1".to_string(), true));
        assert_eq!(resolve_run(&cache, "run-9"), ("run-9".to_string(), false));
    }

    #[test]
    fn offline_rank_requires_tags() {
        assert!(cmd_rank(&[], 10, 1).is_err());
        assert!(cmd_rank(&["privacy".to_string()], 10, 1).is_ok());
    }

    #[tokio::test]
    async fn replayed_run_composes_a_sendable_card() {
        let body = "\
event: owner_search.assigned
data: {\"owner\": {\"id\": \"p-1\", \"name\": \"Kim\"}, \"co_reviewers\": [{\"id\": \"p-2\"}]}

event: decision_card
data: {\"action\": \"APPROVE\", \"summary\": \"Ship it\"}

event: decision_card.assigned
data: {\"card_id\": \"card-9\"}

";
        let state = replay_offline("run-9", body).await;
        assert_eq!(state.phase, RunPhase::Complete);

        let mut card = compose_card(&state, Vec::new());
        assert_eq!(card.card_id(), Some("card-9"));
        LogStore::new()
            .send_to_owner(&mut card, "please review", "person-7")
            .unwrap();
        let rendered = card.render();
        assert!(rendered.contains("Ship it"));
        assert!(rendered.contains("Owner:          Kim"));
        assert_eq!(card.audit_trail.len(), 1);
    }

    #[test]
    fn sent_note_survives_a_missing_timeline() {
        let mut card = DecisionCard::compose(
            Default::default(),
            decide_core::CardAssignment {
                card_id: Some("card-3".to_string()),
                ..Default::default()
            },
            Vec::new(),
            Vec::new(),
        );
        let store = LogStore::new();
        store.send_to_owner(&mut card, "needs a budget owner", "person-7").unwrap();

        attach_audit_trail(&mut card, None, &store);
        assert_eq!(card.audit_trail.len(), 1);
        assert!(card.audit_trail[0].label.contains("person-7"));

        let record = AuditRecord {
            id: "a-1".to_string(),
            event_type: "run.completed".to_string(),
            event_timestamp: "2026-03-01T10:00:00Z".to_string(),
            resource_type: None,
            resource_id: None,
            actor_id: None,
            actor_type: None,
            detail: None,
            run_id: Some("run-3".to_string()),
            issue_id: None,
            card_id: None,
        };
        attach_audit_trail(&mut card, Some(vec![record]), &store);
        let labels: Vec<&str> = card.audit_trail.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], "run.completed");
    }
}
