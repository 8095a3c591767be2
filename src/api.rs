//! Client for the external session API.
//!
//! The playground consumes the API as four async operations: create a
//! session, update it, persist a named save, and fetch a save back. Error
//! bodies are JSON `{message}` where the API produced them, plain text
//! otherwise; both surface as [`ApiError::Status`].

use crate::session::Session;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Failures talking to the session API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session API request failed")]
    Transport(#[from] reqwest::Error),

    #[error("session API returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Thin typed wrapper over the session API's four operations.
#[derive(Debug, Clone)]
pub struct SessionApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct Saved {
    save_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl SessionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `POST /api/session/new` → the new session id.
    pub async fn create_session(&self, session: &Session) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{}/api/session/new", self.base_url))
            .json(&json!({ "session": session }))
            .send()
            .await?;
        let body: SessionCreated = ok(res).await?.json().await?;
        Ok(body.session_id)
    }

    /// `PUT /api/session` with the current in-memory session.
    pub async fn update_session(&self, session_id: &str, session: &Session) -> Result<(), ApiError> {
        let res = self
            .client
            .put(format!("{}/api/session", self.base_url))
            .json(&json!({ "session_id": session_id, "session": session }))
            .send()
            .await?;
        ok(res).await?;
        Ok(())
    }

    /// `POST /api/save` → the persistent save id.
    pub async fn save(&self, session: &Session) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{}/api/save", self.base_url))
            .json(&json!({ "session": session }))
            .send()
            .await?;
        let body: Saved = ok(res).await?.json().await?;
        Ok(body.save_id)
    }

    /// `GET /api/saved/:id` → the stored session.
    pub async fn get_saved(&self, save_id: &str) -> Result<Session, ApiError> {
        let res = self
            .client
            .get(format!("{}/api/saved/{save_id}", self.base_url))
            .send()
            .await?;
        let session = ok(res).await?.json().await?;
        Ok(session)
    }
}

/// Maps non-2xx responses to [`ApiError::Status`], extracting the `message`
/// field when the body is JSON.
async fn ok(res: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status().as_u16();
    let is_json = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/json"));

    let message = if is_json {
        res.json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| "Unknown".to_string())
    } else {
        res.text().await.unwrap_or_else(|_| "Unknown".to_string())
    };

    Err(ApiError::Status { status, message })
}
