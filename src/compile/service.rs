//! Client for the external transpiler service.
//!
//! The transpiler is consumed as a single operation: `compile(code) -> code`.
//! Its error bodies are `{errId, message}` JSON; the message is carried
//! through to the caller unchanged.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamError {
    err_id: String,
    message: String,
}

/// Failures of the `compile(code) -> code` operation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to reach the transpiler service")]
    Transport(#[from] reqwest::Error),

    #[error("transpiler returned {status} with an unreadable body")]
    Upstream { status: u16 },

    #[error("{message}")]
    Compiler { err_id: String, message: String },
}

/// HTTP client for the transpiler's compile endpoint.
#[derive(Debug, Clone)]
pub struct CompileClient {
    client: reqwest::Client,
    base_url: String,
}

impl CompileClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Transpiles `code` into browser-runnable JavaScript.
    pub async fn compile(&self, code: &str) -> Result<String, CompileError> {
        let res = self
            .client
            .post(format!("{}/api/babel", self.base_url))
            .json(&json!({ "code": code }))
            .send()
            .await?;

        if res.status().is_success() {
            return Ok(res.text().await?);
        }

        let status = res.status().as_u16();
        match res.json::<UpstreamError>().await {
            Ok(body) => Err(CompileError::Compiler {
                err_id: body.err_id,
                message: body.message,
            }),
            Err(_) => Err(CompileError::Upstream { status }),
        }
    }
}
