//! The compile proxy: a thin HTTP service in front of the transpiler.
//!
//! Routes:
//! - `GET /health` → `{"healthy": true}`
//! - `POST /api/babel` → transpiled `application/javascript`, or a JSON
//!   error `{errId, message}` (422 for bad input or compile failure, 500
//!   for anything unexpected)
//! - everything else → 404 with a stable `ject_compile::*` error id
//!
//! The request body is either `text/plain` source or `application/json`
//! `{code}`. Failure to bind the listen port is fatal and propagates out of
//! `main`.

pub mod service;

use crate::config::Config;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Deserialize;
use serde_json::json;
use service::{CompileClient, CompileError};

fn error_json(status: StatusCode, err_id: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "errId": err_id, "message": message }))
}

#[get("/health")]
async fn r_health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "healthy": true }))
}

async fn r_index(req: HttpRequest) -> HttpResponse {
    log::info!("index route hit by {:?}", req.peer_addr());
    error_json(
        StatusCode::NOT_FOUND,
        "ject_compile::index",
        "ject-compile has no index route",
    )
}

async fn r_api_index() -> HttpResponse {
    error_json(
        StatusCode::NOT_FOUND,
        "ject_compile::api::index",
        "ject-compile has no index route at /api",
    )
}

#[derive(Debug, Deserialize)]
struct BabelBody {
    code: String,
}

fn bad_body() -> HttpResponse {
    error_json(
        StatusCode::UNPROCESSABLE_ENTITY,
        "ject_compile::babel::bad_body",
        "expected body to be text/plain of the JS code, or JSON with .code being a string",
    )
}

/// Extracts the source code from a `text/plain` or JSON `{code}` body.
fn extract_code(content_type: Option<&str>, body: &[u8]) -> Option<String> {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    if content_type.starts_with("application/json") {
        serde_json::from_slice::<BabelBody>(body).ok().map(|b| b.code)
    } else if content_type.starts_with("text/plain") {
        String::from_utf8(body.to_vec()).ok()
    } else {
        None
    }
}

async fn r_babel(
    req: HttpRequest,
    body: web::Bytes,
    client: web::Data<CompileClient>,
) -> HttpResponse {
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let Some(code) = extract_code(content_type, &body) else {
        return bad_body();
    };

    match client.compile(&code).await {
        Ok(output) => HttpResponse::Ok()
            .content_type("application/javascript")
            .body(output),
        Err(CompileError::Compiler { err_id, message }) => {
            log::error!("transpiler failed ({err_id}) on submitted code: {message}");
            error_json(
                StatusCode::UNPROCESSABLE_ENTITY,
                "ject_compile::babel::compiler_error",
                &message,
            )
        }
        Err(err) => {
            log::error!("compile proxy internal error: {err}");
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ject_compile::api::internal_server_error",
                &err.to_string(),
            )
        }
    }
}

/// Route table, shared between `serve` and the tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(r_health)
        .route("/", web::get().to(r_index))
        .route("/api", web::get().to(r_api_index))
        .route("/api/babel", web::post().to(r_babel));
}

/// Runs the proxy until shutdown. A bind failure is returned to the caller,
/// which exits the process.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let client = web::Data::new(CompileClient::new(config.transpiler_url.clone()));
    let port = config.compile_port;

    log::info!("compile proxy listening on port {port}");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(client.clone())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}

/// Blocking wrapper for the CLI entry point.
pub fn serve_blocking(config: &Config) -> anyhow::Result<()> {
    actix_web::rt::System::new().block_on(serve(config))
}
