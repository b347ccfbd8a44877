//! Decision stream: SSE decoding, typed events and the analysis reducer.
//!
//! - [`sse`]: `SseDecoder`, `SseFrame`, `Payload`
//! - [`events`]: `DecisionEvent` and its payload types
//! - [`format`]: rendering of structured agent output
//! - [`reducer`]: `reduce`, `AnalysisState`, `StreamReducer`

pub mod events;
pub mod format;
pub mod reducer;
pub mod sse;

pub use events::{DecisionEvent, Finding, StreamPerson};
pub use format::{format_findings, format_structured_message};
pub use reducer::{
    reduce, status_line, AgentLog, AgentRole, AnalysisState, Effect, LogKind, ProgressStep,
    RunPhase, StreamReducer,
};
pub use sse::{Payload, SseDecoder, SseFrame};
