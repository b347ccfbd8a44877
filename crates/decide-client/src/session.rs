//! Drives one analysis run: the decision stream, the organization graph
//! behind it, and the run subgraph once the backend has one.

use std::sync::Arc;

use async_trait::async_trait;
use decide_core::{
    emit_stream_opened, AnalysisState, Effect, Graph, GraphPayload, RunSpan, SseFrame,
    StreamReducer, METRICS,
};
use tokio::sync::watch;
use tracing::{debug, Instrument};

use crate::api::{ApiClient, SUBGRAPH_MAX_NODES};
use crate::error::Result;
use crate::sse::{StreamHandle, StreamMessage};

pub const FULL_GRAPH_MAX_NODES: u32 = 500;
pub const FULL_GRAPH_MAX_EDGES: u32 = 1000;

/// Where a session loads graphs from.
#[async_trait]
pub trait GraphSource: Send + Sync {
    async fn load_full_graph(&self) -> Result<GraphPayload>;

    async fn load_subgraph(&self, run_id: &str) -> Result<GraphPayload>;
}

#[async_trait]
impl GraphSource for ApiClient {
    async fn load_full_graph(&self) -> Result<GraphPayload> {
        self.full_graph(Some(FULL_GRAPH_MAX_NODES), Some(FULL_GRAPH_MAX_EDGES))
            .await
    }

    async fn load_subgraph(&self, run_id: &str) -> Result<GraphPayload> {
        self.subgraph(run_id, SUBGRAPH_MAX_NODES).await
    }
}

/// Fixed graph, for offline sessions.
pub struct StaticGraph(pub Graph);

#[async_trait]
impl GraphSource for StaticGraph {
    async fn load_full_graph(&self) -> Result<GraphPayload> {
        Ok(GraphPayload {
            nodes: self.0.nodes.clone(),
            edges: self.0.edges.clone(),
        })
    }

    async fn load_subgraph(&self, _run_id: &str) -> Result<GraphPayload> {
        Ok(GraphPayload::default())
    }
}

pub struct AnalysisSession {
    reducer: StreamReducer,
    graphs: Arc<dyn GraphSource>,
}

impl AnalysisSession {
    pub fn new(run_id: impl Into<String>, graphs: Arc<dyn GraphSource>) -> Self {
        Self {
            reducer: StreamReducer::new(run_id),
            graphs,
        }
    }

    pub fn run_id(&self) -> &str {
        self.reducer.run_id()
    }

    /// Receives every state the session publishes.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.reducer.subscribe()
    }

    pub fn state(&self) -> AnalysisState {
        self.reducer.state()
    }

    /// Consume `stream` until it ends, loading the full graph alongside.
    /// Returns the final state. `resumed` marks a run reopened from the
    /// run cache.
    pub async fn run(&self, stream: StreamHandle, resumed: bool) -> AnalysisState {
        METRICS.inc_streams_opened();
        emit_stream_opened(self.run_id(), resumed);
        let span = tracing::info_span!("decide.session", run_id = %self.run_id());
        async {
            futures::join!(self.load_full_graph(), self.pump(stream));
        }
        .instrument(span)
        .await;
        self.state()
    }

    async fn load_full_graph(&self) {
        match self.graphs.load_full_graph().await {
            Ok(payload) => {
                let graph = Graph::from_payload(payload);
                debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "full graph loaded");
                // A subgraph that arrived first wins.
                self.reducer.update(|state| {
                    if state.graph.is_none() {
                        state.set_graph(graph);
                    }
                });
            }
            Err(err) => {
                let message = err.to_string();
                self.reducer.update(|state| state.set_graph_error(message));
            }
        }
    }

    async fn load_subgraph(&self) {
        match self.graphs.load_subgraph(self.run_id()).await {
            Ok(payload) => {
                let graph = Graph::from_payload(payload);
                debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "subgraph loaded");
                self.reducer.update(|state| state.set_subgraph(graph));
            }
            Err(err) => {
                let message = err.to_string();
                self.reducer.update(|state| state.set_graph_error(message));
            }
        }
    }

    async fn pump(&self, mut stream: StreamHandle) {
        while let Some(message) = stream.next().await {
            match message {
                StreamMessage::Frame(frame) => {
                    for effect in self.apply_frame(&frame) {
                        match effect {
                            Effect::FetchSubgraph => self.load_subgraph().await,
                        }
                    }
                }
                StreamMessage::Failed(err) => {
                    self.reducer.fail(err.to_string());
                    return;
                }
                StreamMessage::Closed => break,
            }
        }
        self.reducer.on_closed();
    }

    fn apply_frame(&self, frame: &SseFrame) -> Vec<Effect> {
        let _span = RunSpan::enter(self.run_id());
        self.reducer.apply_frame(frame)
    }
}
