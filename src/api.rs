use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    error::ClientError,
    models::{AuthPayload, GeneratedImage, Idea, Suggestion, SuggestionsPayload, TrendingPayload, TrendingProject, UserProfile},
};

pub const SUGGEST_PATH: &str = "/suggest";
pub const GENERATE_IMAGE_PATH: &str = "/generate-image";
pub const TRENDING_PATH: &str = "/trending";
pub const AUTH_GOOGLE_PATH: &str = "/auth/google";
pub const LIVENESS_PATH: &str = "/";

/// Idea sent by the model readiness probe.
const PROBE_IDEA: &str = "test";

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: &'static str,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(path: &'static str) -> Self { Self { method: Method::GET, path, body: None } }

    pub fn post(path: &'static str, body: Value) -> Self { Self { method: Method::POST, path, body: Some(body) } }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Moves one request to the backend and back. Only transport failures are errors here;
/// status codes and bodies are interpreted by [`ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let url = format!("{}{}", self.base_url, request.path);
        info!("🔗 {} {}", request.method, url);

        let mut builder = self.client.request(request.method, &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!("❌ Request to {} failed: {}", url, e);
            ClientError::Network(e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ClientError::Network(e.to_string()))?;
        info!("📥 Response status: {} ({} bytes)", status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Typed calls against the craft backend. Every call resolves to a payload or a [`ClientError`];
/// nothing is retried.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self { Self { transport } }

    pub async fn fetch_suggestions(&self, idea: &Idea) -> Result<Vec<Suggestion>, ClientError> {
        info!("🚀 Requesting suggestions for: {}", idea);
        let response = self.transport.send(HttpRequest::post(SUGGEST_PATH, json!({ "idea": idea.as_str() }))).await?;
        let payload: SuggestionsPayload = parse_envelope(&response)?;
        info!("✅ Received {} suggestions", payload.suggestions.len());
        Ok(payload.suggestions)
    }

    pub async fn fetch_image(&self, idea: &Idea) -> Result<GeneratedImage, ClientError> {
        info!("🚀 Requesting preview image for: {}", idea);
        let response = self.transport.send(HttpRequest::post(GENERATE_IMAGE_PATH, json!({ "idea": idea.as_str() }))).await?;
        let image: GeneratedImage = parse_envelope(&response)?;
        if image.image.trim().is_empty() {
            warn!("⚠️ Backend reported success without image data");
            return Err(ClientError::Api("Failed to generate image".into()));
        }
        info!("🖼️ Received image: {}", preview(&image.image));
        Ok(image)
    }

    pub async fn fetch_trending(&self) -> Result<Vec<TrendingProject>, ClientError> {
        let response = self.transport.send(HttpRequest::get(TRENDING_PATH)).await?;
        let payload: TrendingPayload = parse_envelope(&response)?;
        info!("✅ Received {} trending projects", payload.ideas.len());
        Ok(payload.ideas)
    }

    pub async fn authenticate_google(&self, credential: &str) -> Result<UserProfile, ClientError> {
        if credential.trim().is_empty() {
            return Err(ClientError::Validation("Missing Google credential".into()));
        }
        let response = self.transport.send(HttpRequest::post(AUTH_GOOGLE_PATH, json!({ "credential": credential }))).await?;
        let payload: AuthPayload = parse_envelope(&response)?;
        Ok(payload.user)
    }

    /// True when the backend answers its root path with any 2xx.
    pub async fn check_liveness(&self) -> bool {
        match self.transport.send(HttpRequest::get(LIVENESS_PATH)).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                warn!("Liveness probe failed: {}", e);
                false
            }
        }
    }

    /// True when a throwaway image request is accepted.
    pub async fn check_image_model(&self) -> bool {
        match self.transport.send(HttpRequest::post(GENERATE_IMAGE_PATH, json!({ "idea": PROBE_IDEA }))).await {
            Ok(response) => response.is_success(),
            Err(e) => {
                warn!("Model probe failed: {}", e);
                false
            }
        }
    }
}

/// Turn a raw response into its payload. 429 wins over everything, then the HTTP status,
/// then the envelope's `success` flag, then the payload shape.
pub fn parse_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ClientError> {
    if response.status == 429 {
        warn!("⏳ Backend rate limited the request");
        return Err(ClientError::RateLimited);
    }

    let parsed = serde_json::from_str::<Value>(&response.body);

    if !response.is_success() {
        let message = parsed
            .as_ref()
            .ok()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", response.status));
        error!("❌ Backend returned {}: {}", response.status, message);
        return Err(ClientError::Http { status: response.status, message });
    }

    let value = parsed.map_err(|e| ClientError::Parse(e.to_string()))?;
    match value.get("success").and_then(Value::as_bool) {
        None => Err(ClientError::Parse("envelope has no boolean `success` field".into())),
        Some(false) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string();
            error!("❌ Backend reported failure: {}", message);
            Err(ClientError::Api(message))
        }
        Some(true) => serde_json::from_value(value).map_err(|e| ClientError::Parse(e.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    Pinterest,
    Instructables,
}

impl Platform {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.to_ascii_lowercase().as_str() {
            "youtube" => Some(Self::YouTube),
            "pinterest" => Some(Self::Pinterest),
            "instructables" => Some(Self::Instructables),
            _ => None,
        }
    }

    /// External search page for the idea on this platform.
    pub fn search_url(self, idea: &Idea) -> Result<Url, ClientError> {
        let (base, param, suffix) = match self {
            Self::YouTube => ("https://www.youtube.com/results", "search_query", "craft tutorial"),
            Self::Pinterest => ("https://www.pinterest.com/search/pins/", "q", "craft ideas"),
            Self::Instructables => ("https://www.instructables.com/search/", "q", "craft"),
        };
        let mut url = Url::parse(base).map_err(|e| ClientError::Parse(e.to_string()))?;
        url.query_pairs_mut().append_pair(param, &format!("{} {}", idea.as_str(), suffix));
        Ok(url)
    }
}

/// Short loggable form of a base64 payload.
pub fn preview(payload: &str) -> String {
    if payload.len() > 50 {
        let head: String = payload.chars().take(50).collect();
        format!("{}...[{} chars total]", head, payload.len())
    } else {
        payload.to_string()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(transport: &Arc<ScriptedTransport>) -> ApiClient { ApiClient::new(transport.clone()) }

    fn idea(raw: &str) -> Idea { Idea::parse(raw).unwrap() }

    #[tokio::test]
    async fn suggestions_preserve_backend_order() {
        let transport = ScriptedTransport::new();
        transport.reply(SUGGEST_PATH, 200, json!({
            "success": true,
            "suggestions": [{ "title": "First" }, { "title": "Second" }, { "title": "Third" }]
        }));

        let suggestions = client(&transport).fetch_suggestions(&idea("  lanterns ")).await.unwrap();
        let titles: Vec<_> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);

        let sent = transport.requests.lock()[0].clone();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.body, Some(json!({ "idea": "lanterns" })));
    }

    #[tokio::test]
    async fn http_429_is_rate_limited_even_with_envelope() {
        let transport = ScriptedTransport::new();
        transport.reply(GENERATE_IMAGE_PATH, 429, json!({ "success": false, "error": "quota" }));

        let err = client(&transport).fetch_image(&idea("vase")).await.unwrap_err();
        assert_eq!(err, ClientError::RateLimited);
        assert_eq!(err.to_string(), "Rate limit exceeded. Please try again later.");
    }

    #[tokio::test]
    async fn envelope_failure_carries_server_message() {
        let transport = ScriptedTransport::new();
        transport.reply(SUGGEST_PATH, 200, json!({ "success": false, "error": "model overloaded" }));

        let err = client(&transport).fetch_suggestions(&idea("vase")).await.unwrap_err();
        assert_eq!(err, ClientError::Api("model overloaded".into()));
    }

    #[tokio::test]
    async fn non_2xx_is_distinct_from_envelope_failure() {
        let transport = ScriptedTransport::new();
        transport.reply(SUGGEST_PATH, 500, json!({ "success": false, "error": "upstream exploded" }));
        transport.reply_raw(TRENDING_PATH, 502, "<html>bad gateway</html>");

        let api = client(&transport);
        assert_eq!(
            api.fetch_suggestions(&idea("vase")).await.unwrap_err(),
            ClientError::Http { status: 500, message: "upstream exploded".into() }
        );
        assert_eq!(
            api.fetch_trending().await.unwrap_err(),
            ClientError::Http { status: 502, message: "Request failed with status 502".into() }
        );
    }

    #[tokio::test]
    async fn malformed_bodies_are_parse_errors() {
        let transport = ScriptedTransport::new();
        transport.reply_raw(SUGGEST_PATH, 200, "not json");
        transport.reply(SUGGEST_PATH, 200, json!({ "suggestions": [] }));
        transport.reply(SUGGEST_PATH, 200, json!({ "success": true, "suggestions": "nope" }));

        let api = client(&transport);
        for _ in 0..3 {
            assert!(matches!(api.fetch_suggestions(&idea("vase")).await, Err(ClientError::Parse(_))));
        }
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let transport = ScriptedTransport::new();
        transport.fail(TRENDING_PATH, "connection refused");

        let err = client(&transport).fetch_trending().await.unwrap_err();
        assert_eq!(err, ClientError::Network("connection refused".into()));
    }

    #[tokio::test]
    async fn image_carries_remaining_requests() {
        let transport = ScriptedTransport::new();
        transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": "AAAA", "remaining_requests": 7 }));
        transport.reply(GENERATE_IMAGE_PATH, 200, json!({ "success": true, "image": "" }));

        let api = client(&transport);
        let image = api.fetch_image(&idea("vase")).await.unwrap();
        assert_eq!(image, GeneratedImage { image: "AAAA".into(), remaining_requests: Some(7) });
        assert_eq!(api.fetch_image(&idea("vase")).await.unwrap_err(), ClientError::Api("Failed to generate image".into()));
    }

    #[tokio::test]
    async fn probes_report_reachability() {
        let transport = ScriptedTransport::new();
        transport.reply_raw(LIVENESS_PATH, 200, "<html></html>");
        transport.fail(GENERATE_IMAGE_PATH, "refused");

        let api = client(&transport);
        assert!(api.check_liveness().await);
        assert!(!api.check_image_model().await);
        assert_eq!(transport.requests.lock()[1].body, Some(json!({ "idea": "test" })));
    }

    #[tokio::test]
    async fn google_sign_in_returns_profile() {
        let transport = ScriptedTransport::new();
        transport.reply(AUTH_GOOGLE_PATH, 200, json!({
            "success": true,
            "user": { "picture": "https://pics.example/me.png", "name": "Sam" }
        }));

        let api = client(&transport);
        let user = api.authenticate_google("token-123").await.unwrap();
        assert_eq!(user.picture.as_deref(), Some("https://pics.example/me.png"));
        assert!(matches!(api.authenticate_google(" ").await, Err(ClientError::Validation(_))));
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn platform_search_urls_encode_the_idea() {
        let idea = idea("paper & glue");
        assert_eq!(
            Platform::YouTube.search_url(&idea).unwrap().as_str(),
            "https://www.youtube.com/results?search_query=paper+%26+glue+craft+tutorial"
        );
        assert_eq!(
            Platform::from_slug("Pinterest").map(|p| p.search_url(&idea).unwrap().to_string()),
            Some("https://www.pinterest.com/search/pins/?q=paper+%26+glue+craft+ideas".to_string())
        );
        assert_eq!(Platform::from_slug("etsy"), None);
    }
}
