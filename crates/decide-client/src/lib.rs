//! Decide Client
//!
//! HTTP and server-sent-event access to the decision routing backend,
//! plus [`AnalysisSession`], which folds a run's event stream into
//! [`decide_core::AnalysisState`].

pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod sse;
pub mod types;

pub use api::{ApiClient, SUBGRAPH_MAX_NODES};
pub use config::{ClientConfig, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_USER_ID, USER_ID_ENV};
pub use error::{ClientError, Result};
pub use session::{
    AnalysisSession, GraphSource, StaticGraph, FULL_GRAPH_MAX_EDGES, FULL_GRAPH_MAX_NODES,
};
pub use sse::{StreamHandle, StreamMessage};
pub use types::{
    IssueCreateRequest, IssueCreateResponse, ListIssuesParams, MeetingConfig, MeetingInput,
    PersonRecord, Utterance, VirtualMeetingRequest, VirtualParticipant,
};
