//! The reqwest-backed backend client.
//!
//! [`ForestApi`] resolves every path against the configured base, attaches
//! the bearer token when one is set, and folds every outcome into an
//! [`ApiResponse`]. Roster-mutating calls (`approve`, `clear_forest`,
//! `delete_*`) are issued exactly once per call; callers must not loop them.

use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use forest_types::CreatureKind;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Path of the temporary cleaned capture awaiting review.
const PREVIEW_PATH: &str = "/static/rmbg_temp.png";

/// Default long-poll wait in seconds.
const DEFAULT_LONG_POLL_SECS: u32 = 20;

/// Uniform result of a JSON endpoint call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// `true` for a 2xx status.
    pub ok: bool,
    /// HTTP status, or 0 when the request never reached the server.
    pub status: u16,
    /// Decoded JSON body, or `None` when the body was absent or not JSON.
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Response for a request that never got an answer.
    pub const fn disconnected() -> Self {
        Self {
            ok: false,
            status: 0,
            data: None,
        }
    }

    /// Decode the body into `T`, treating a shape mismatch as absent.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| T::deserialize(data).ok())
    }

    /// The `error` string the backend puts in failure bodies.
    pub fn error_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("error"))
            .and_then(Value::as_str)
    }
}

/// Query for `GET /api/pipeline_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineQuery {
    /// Block server-side until the version moves past `since`.
    pub wait: bool,
    /// Maximum server-side wait in seconds.
    pub timeout_secs: u32,
    /// Last version the caller has seen.
    pub since: u64,
}

impl Default for PipelineQuery {
    fn default() -> Self {
        Self {
            wait: true,
            timeout_secs: DEFAULT_LONG_POLL_SECS,
            since: 0,
        }
    }
}

impl PipelineQuery {
    /// Blocking long-poll from `since`.
    pub const fn long_poll(timeout_secs: u32, since: u64) -> Self {
        Self {
            wait: true,
            timeout_secs,
            since,
        }
    }

    /// Immediate snapshot, no server-side wait.
    pub const fn snapshot() -> Self {
        Self {
            wait: false,
            timeout_secs: 1,
            since: 0,
        }
    }
}

/// Body of `POST /api/capture_process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRequest {
    /// Data-URL encoded photo of the drawing.
    pub image_data: String,
    /// Kind requested by the visitor, if any.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CreatureKind>,
}

/// Body of `POST /api/approve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproveRequest {
    /// Placement kind of the approved creature.
    #[serde(rename = "type")]
    pub kind: CreatureKind,
    /// Creature name.
    pub name: String,
    /// Name of the visitor who drew it.
    pub drawer_name: String,
    /// Optional contact number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Filters for `GET /api/gallery`. Empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryQuery {
    /// Substring of the drawer's name.
    pub drawer_name: String,
    /// Restrict to one kind.
    pub kind: Option<CreatureKind>,
}

/// HTTP client for the forest backend.
#[derive(Debug)]
pub struct ForestApi {
    client: reqwest::Client,
    base: String,
    request_timeout: Duration,
    token: RwLock<Option<String>>,
}

impl ForestApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the configuration is invalid, or
    /// [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base: config.normalized_base().to_owned(),
            request_timeout: config.request_timeout(),
            token: RwLock::new(config.token.clone()),
        })
    }

    /// Base URL every path is resolved against.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Replace the bearer token.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    /// Whether a bearer token is currently set.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    // -----------------------------------------------------------------------
    // URLs
    // -----------------------------------------------------------------------

    /// Resolve an asset path against the base. Absolute URLs pass through.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    /// URL of the cleaned capture awaiting review.
    pub fn preview_url(&self) -> String {
        self.asset_url(PREVIEW_PATH)
    }

    /// Download URL of an approved creature.
    pub fn download_url(&self, filename: &str) -> String {
        self.asset_url(&format!("/api/download/{filename}"))
    }

    /// Build `{base}{prefix}/{segment}` with `segment` percent-encoded.
    fn url_with_segment(&self, prefix: &str, segment: &str) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.asset_url(prefix))
            .map_err(|e| ClientError::InvalidUrl(format!("{prefix}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(format!("{prefix}: cannot be a base")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.asset_url(path))
            .header(CACHE_CONTROL, "no-store")
    }

    fn post_json(&self, path: &str, body: &impl Serialize) -> RequestBuilder {
        self.client.post(self.asset_url(path)).json(body)
    }

    /// Send a request and fold every outcome into an [`ApiResponse`].
    async fn request(&self, builder: RequestBuilder) -> ApiResponse {
        match self.send(builder).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "backend request failed");
                ApiResponse::disconnected()
            }
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse, ClientError> {
        let builder = match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().await?;
        let status = response.status();
        // Bodies that are not JSON (HTML error pages, empty 204s) degrade to None.
        let data = response.json::<Value>().await.ok();
        debug!(status = status.as_u16(), has_body = data.is_some(), "backend responded");
        Ok(ApiResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            data,
        })
    }

    // -----------------------------------------------------------------------
    // Endpoints
    // -----------------------------------------------------------------------

    /// `POST /api/login` with a 6-digit PIN. Stores the returned token on success.
    pub async fn login(&self, pin: &str) -> ApiResponse {
        let body = serde_json::json!({ "pin": pin });
        let response = self.request(self.post_json("/api/login", &body)).await;
        if response.ok {
            let token = response
                .data
                .as_ref()
                .and_then(|data| data.get("token"))
                .and_then(Value::as_str)
                .map(ToOwned::to_owned);
            if let Some(token) = token {
                self.set_token(Some(token)).await;
                info!("logged in, bearer token stored");
            }
        }
        response
    }

    /// `GET /api/latest_animals`.
    pub async fn latest_animals(&self) -> ApiResponse {
        self.request(self.get("/api/latest_animals")).await
    }

    /// `GET /api/pipeline_status?wait&timeout&since`.
    ///
    /// The HTTP timeout is extended by the server-side wait so a long-poll
    /// is not cut short by the client.
    pub async fn pipeline_status(&self, query: PipelineQuery) -> ApiResponse {
        let wait = if query.wait { "1" } else { "0" };
        let builder = self
            .get("/api/pipeline_status")
            .query(&[
                ("wait", wait.to_owned()),
                ("timeout", query.timeout_secs.to_string()),
                ("since", query.since.to_string()),
            ])
            .timeout(
                self.request_timeout
                    .saturating_add(Duration::from_secs(u64::from(query.timeout_secs))),
            );
        self.request(builder).await
    }

    /// `POST /api/capture_process`. Starts the background-removal pipeline.
    pub async fn capture_process(&self, request: &CaptureRequest) -> ApiResponse {
        self.request(self.post_json("/api/capture_process", request))
            .await
    }

    /// `GET /api/queue_status/{job_id}`.
    pub async fn queue_status(&self, job_id: &str) -> ApiResponse {
        match self.url_with_segment("/api/queue_status", job_id) {
            Ok(url) => {
                let builder = self.client.get(url).header(CACHE_CONTROL, "no-store");
                self.request(builder).await
            }
            Err(e) => {
                warn!(job_id = job_id, error = %e, "could not build queue status URL");
                ApiResponse::disconnected()
            }
        }
    }

    /// `POST /api/approve`. Commits the pending capture to the roster.
    pub async fn approve(&self, request: &ApproveRequest) -> ApiResponse {
        info!(kind = request.kind.as_str(), name = request.name, "approving creature");
        self.request(self.post_json("/api/approve", request)).await
    }

    /// `POST /api/clear_forest`. Removes every creature from the roster.
    pub async fn clear_forest(&self) -> ApiResponse {
        info!("clearing forest roster");
        self.request(self.client.post(self.asset_url("/api/clear_forest")))
            .await
    }

    /// `POST /api/forest_state` with the full set of rendered filenames.
    pub async fn report_forest_state(&self, rendered: &[String]) -> ApiResponse {
        let body = serde_json::json!({ "rendered": rendered });
        self.request(self.post_json("/api/forest_state", &body)).await
    }

    /// `GET /api/gallery` filtered by drawer name and kind.
    pub async fn search_gallery(&self, query: &GalleryQuery) -> ApiResponse {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if !query.drawer_name.is_empty() {
            params.push(("drawer_name", query.drawer_name.as_str()));
        }
        if let Some(kind) = query.kind {
            params.push(("type", kind.as_str()));
        }
        self.request(self.get("/api/gallery").query(&params)).await
    }

    /// `GET /api/pictures`.
    pub async fn pictures(&self) -> ApiResponse {
        self.request(self.get("/api/pictures")).await
    }

    /// `GET /api/queue_jobs`.
    pub async fn queue_jobs(&self) -> ApiResponse {
        self.request(self.get("/api/queue_jobs")).await
    }

    /// `DELETE /api/animals/{filename}`.
    pub async fn delete_animal(&self, filename: &str) -> ApiResponse {
        match self.url_with_segment("/api/animals", filename) {
            Ok(url) => self.request(self.client.request(Method::DELETE, url)).await,
            Err(e) => {
                warn!(filename = filename, error = %e, "could not build delete URL");
                ApiResponse::disconnected()
            }
        }
    }

    /// `POST /api/animals/delete_many`.
    pub async fn delete_animals(&self, filenames: &[String]) -> ApiResponse {
        let body = serde_json::json!({ "filenames": filenames });
        self.request(self.post_json("/api/animals/delete_many", &body))
            .await
    }

    /// Fetch the raw bytes of an asset, bypassing caches.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] on network failure or
    /// [`ClientError::Status`] on a non-success status.
    pub async fn fetch_asset(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        let url = cache_busted(&self.asset_url(path), chrono::Utc::now().timestamp_millis());
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Append a `t=<millis>` cache-busting parameter to `url`.
pub fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}t={millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> Option<ForestApi> {
        ForestApi::new(&ClientConfig::with_base(base)).ok()
    }

    #[test]
    fn asset_urls_resolve_against_base() {
        let Some(api) = api("http://forest.local:5000/") else {
            return;
        };
        assert_eq!(
            api.asset_url("/static/animations/fox.png"),
            "http://forest.local:5000/static/animations/fox.png"
        );
        assert_eq!(
            api.asset_url("static/animations/fox.png"),
            "http://forest.local:5000/static/animations/fox.png"
        );
        assert_eq!(
            api.asset_url("https://cdn.example/fox.png"),
            "https://cdn.example/fox.png"
        );
        assert_eq!(
            api.preview_url(),
            "http://forest.local:5000/static/rmbg_temp.png"
        );
        assert_eq!(
            api.download_url("fox.png"),
            "http://forest.local:5000/api/download/fox.png"
        );
    }

    #[test]
    fn segments_are_percent_encoded() {
        let Some(api) = api("http://forest.local:5000") else {
            return;
        };
        let url = api
            .url_with_segment("/api/queue_status", "job 1/2")
            .map(|u| u.to_string())
            .unwrap_or_default();
        assert_eq!(url, "http://forest.local:5000/api/queue_status/job%201%2F2");
    }

    #[test]
    fn cache_busting_picks_separator() {
        assert_eq!(cache_busted("/a.png", 5), "/a.png?t=5");
        assert_eq!(cache_busted("/a.png?v=2", 5), "/a.png?v=2&t=5");
    }

    #[test]
    fn response_helpers() {
        let response = ApiResponse {
            ok: false,
            status: 409,
            data: Some(serde_json::json!({"ok": false, "error": "Pipeline is busy."})),
        };
        assert_eq!(response.error_message(), Some("Pipeline is busy."));
        assert!(response.decode::<Vec<String>>().is_none());
        assert_eq!(ApiResponse::disconnected().status, 0);
    }

    #[test]
    fn approve_request_serializes_wire_names() {
        let request = ApproveRequest {
            kind: CreatureKind::Sky,
            name: "Bird".to_owned(),
            drawer_name: "Ploy".to_owned(),
            phone_number: None,
        };
        let json = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(json["type"], "sky");
        assert_eq!(json["drawer_name"], "Ploy");
        assert!(json.get("phone_number").is_none());
    }

    #[test]
    fn pipeline_query_defaults_match_dashboard() {
        let query = PipelineQuery::default();
        assert!(query.wait);
        assert_eq!(query.timeout_secs, 20);
        assert_eq!(query.since, 0);
        assert!(!PipelineQuery::snapshot().wait);
    }
}
