//! REST client for the decision backend.

use decide_core::{AuditRecord, CardAction, GraphPayload, IssueRecord};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, USER_HEADER};
use crate::error::{ClientError, Result};
use crate::sse::{self, StreamHandle};
use crate::types::{
    ApproveBody, ConditionalApproveBody, IssueCreateRequest, IssueCreateResponse,
    ListIssuesParams, MeetingInput, PersonRecord, RejectBody, VirtualMeetingRequest, WithdrawBody,
};

/// Default node cap for a run subgraph.
pub const SUBGRAPH_MAX_NODES: u32 = 120;

pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("decide-client/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;
        Ok(ApiClient { config, http })
    }

    /// Client configured from `DECIDE_API_BASE_URL` and `DECIDE_USER_ID`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Identity sent with every request.
    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_HEADER, &self.config.user_id)
    }

    /// Send and decode. `None` for 204 or an empty body.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, url: &str) -> Result<Option<T>> {
        let response = builder.send().await.map_err(|e| ClientError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status(status.as_u16(), url, &body));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await.map_err(|e| ClientError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Ok(None);
        }
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ClientError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.config.url(path);
        self.send(self.request(Method::GET, &url), &url).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>> {
        let url = self.config.url(path);
        self.send(self.request(Method::POST, &url).json(body), &url).await
    }

    fn required<T>(value: Option<T>, path: &str) -> Result<T> {
        value.ok_or_else(|| ClientError::NoContent(path.to_string()))
    }

    pub async fn create_issue(&self, request: &IssueCreateRequest) -> Result<IssueCreateResponse> {
        let path = "/api/issues/";
        let created: IssueCreateResponse = Self::required(self.post(path, request).await?, path)?;
        debug!(issue_id = %created.issue_id, run_id = %created.run_id, "issue created");
        Ok(created)
    }

    pub async fn list_issues(&self, params: &ListIssuesParams) -> Result<Vec<IssueRecord>> {
        let url = self.config.url("/api/issues/");
        let builder = self.request(Method::GET, &url).query(&params.query());
        Ok(self.send(builder, &url).await?.unwrap_or_default())
    }

    pub async fn get_issue(&self, issue_id: &str) -> Result<IssueRecord> {
        let path = format!("/api/issues/{}", issue_id);
        Self::required(self.get(&path).await?, &path)
    }

    pub async fn current_user(&self) -> Result<PersonRecord> {
        let path = "/api/persons/me";
        Self::required(self.get(path).await?, path)
    }

    /// Organization graph, optionally capped. Missing arrays read as empty.
    pub async fn full_graph(&self, max_nodes: Option<u32>, max_edges: Option<u32>) -> Result<GraphPayload> {
        let url = self.config.url("/api/graphs/full");
        let mut query = Vec::new();
        if let Some(n) = max_nodes.filter(|n| *n > 0) {
            query.push(("max_nodes", n));
        }
        if let Some(n) = max_edges.filter(|n| *n > 0) {
            query.push(("max_edges", n));
        }
        let builder = self.request(Method::GET, &url).query(&query);
        Ok(self.send(builder, &url).await?.unwrap_or_default())
    }

    /// Graph scoped to one run. Missing arrays read as empty.
    pub async fn subgraph(&self, run_id: &str, max_nodes: u32) -> Result<GraphPayload> {
        let url = self.config.url(&format!("/api/graphs/{}/subgraph", run_id));
        let builder = self
            .request(Method::GET, &url)
            .query(&[("max_nodes", max_nodes)]);
        Ok(self.send(builder, &url).await?.unwrap_or_default())
    }

    /// Stored decision card, as returned by the backend.
    pub async fn decision_card(&self, card_id: &str) -> Result<Option<Value>> {
        self.get(&format!("/api/decisions/{}", card_id)).await
    }

    pub async fn run_timeline(&self, run_id: &str) -> Result<Vec<AuditRecord>> {
        Ok(self
            .get(&format!("/api/audit/runs/{}/timeline", run_id))
            .await?
            .unwrap_or_default())
    }

    pub async fn submit_meeting(&self, run_id: &str, meeting: &MeetingInput) -> Result<Option<Value>> {
        self.post(&format!("/api/meetings/{}", run_id), meeting).await
    }

    /// Perform a reviewer action on a card as the configured user.
    pub async fn card_action(&self, card_id: &str, action: &CardAction) -> Result<Option<Value>> {
        action.validate()?;
        let path = format!("/api/decisions/{}/{}", card_id, action.endpoint());
        let actor = self.user_id();
        debug!(card_id = %card_id, action = action.endpoint(), actor = %actor, "card action");
        match action {
            CardAction::Approve { comment } => {
                let body = ApproveBody {
                    approver_id: actor,
                    comment: comment.as_deref(),
                };
                self.post(&path, &body).await
            }
            CardAction::ConditionalApprove { conditions, comment } => {
                let body = ConditionalApproveBody {
                    approver_id: actor,
                    conditions,
                    comment: comment.as_deref(),
                };
                self.post(&path, &body).await
            }
            CardAction::Reject { reason, comment } => {
                let body = RejectBody {
                    approver_id: actor,
                    reason,
                    comment: comment.as_deref(),
                };
                self.post(&path, &body).await
            }
            CardAction::Withdraw { reason } => {
                let body = WithdrawBody {
                    requester_id: actor,
                    reason,
                };
                self.post(&path, &body).await
            }
        }
    }

    /// Open the decision event stream of a run.
    pub async fn stream_decision(&self, run_id: &str) -> Result<StreamHandle> {
        let url = self.config.url(&format!("/api/decisions/stream/{}", run_id));
        self.open_stream(self.request(Method::GET, &url), url).await
    }

    /// Start a virtual meeting for a run and stream its events.
    pub async fn generate_virtual_meeting(
        &self,
        run_id: &str,
        request: &VirtualMeetingRequest,
    ) -> Result<StreamHandle> {
        let url = self
            .config
            .url(&format!("/api/virtual-meetings/generate/{}", run_id));
        self.open_stream(self.request(Method::POST, &url).json(request), url)
            .await
    }

    async fn open_stream(&self, builder: RequestBuilder, url: String) -> Result<StreamHandle> {
        let response = builder
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ClientError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status(status.as_u16(), &url, &body));
        }
        debug!(url = %url, "event stream opened");
        Ok(sse::spawn_reader(response))
    }
}
