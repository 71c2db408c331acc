use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::token::TokenStore;

/// One message/reply exchange as the server records it. Server-assigned and
/// immutable once returned.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub message: String,
    pub reply: String,
    /// ISO-8601 timestamp, kept opaque; the client never interprets it.
    #[allow(dead_code)]
    pub timestamp: String,
}

/// Successful `/login` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenOut {
    pub access_token: String,
    #[allow(dead_code)]
    pub token_type: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 401. The stored token has already been cleared
    /// by the time the caller sees this.
    #[error("{0}")]
    Unauthorized(String),
    /// Any other non-success status, carrying the response body text.
    #[error("{0}")]
    Status(String),
    /// Connection-level failure before a usable response arrived.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// The token file could not be written after login.
    #[error("token store: {0}")]
    TokenStore(#[from] std::io::Error),
}

/// HTTP client for the chatbot backend.
///
/// Holds the token store it signs requests with; there is no ambient token
/// global. Cheap to clone into spawned request tasks.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: TokenStore) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Local presence check only; never validates against the server.
    pub fn has_token(&self) -> bool {
        self.tokens.read().is_some()
    }

    /// Exchange credentials for a bearer token and persist it.
    ///
    /// The backend's login route takes OAuth2 form fields, not JSON. On
    /// rejection the raw response body is the error message.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenOut, ApiError> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("login rejected: {text}");
            return Err(ApiError::Status(text));
        }

        let token: TokenOut = serde_json::from_str(&response.text().await?)?;
        self.tokens.save(&token.access_token)?;
        debug!("login succeeded, token stored");
        Ok(token)
    }

    /// Forget the stored token. Purely local, no network call.
    pub fn logout(&self) {
        self.tokens.clear();
    }

    /// Fetch the full chat history, ascending chronological. No pagination.
    pub async fn chat_logs(&self) -> Result<Vec<ChatRecord>, ApiError> {
        self.request(Method::GET, "/chat/logs", None).await
    }

    /// Submit a message. The response contains the whole created record,
    /// reply included; the backend computes it before responding.
    pub async fn send_message(&self, text: &str) -> Result<ChatRecord, ApiError> {
        let body = serde_json::json!({ "message": text });
        self.request(Method::POST, "/chat", Some(body)).await
    }

    /// Send a JSON request and decode the JSON response.
    ///
    /// Attaches `Authorization: Bearer <token>` when the store holds a
    /// token, omits it otherwise. A 401 clears the stored token before the
    /// error is returned. Never retries; no timeout beyond reqwest's
    /// defaults.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        if let Some(token) = self.tokens.read() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                warn!("{method} {path} returned 401, clearing stored token");
                self.tokens.clear();
                return Err(ApiError::Unauthorized(text));
            }
            warn!("{method} {path} failed with {status}");
            return Err(ApiError::Status(text));
        }

        debug!("{method} {path} -> {status}");
        if status == StatusCode::NO_CONTENT {
            // 204 carries no body; decode the empty object instead.
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&response.text().await?)?)
    }
}
