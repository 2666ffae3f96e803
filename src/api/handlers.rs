use crate::context::AppContext;
use crate::model::answer_or_error;
use crate::url::normalize_url;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

type ApiResponse = (StatusCode, Json<Value>);

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub message: String,
    /// Site text fetched earlier by the client; crawled afresh when absent
    #[serde(default)]
    pub website_text: Option<String>,
}

fn error(status: StatusCode, body: Value) -> ApiResponse {
    (status, Json(body))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /scrape_website
pub async fn scrape_website(State(ctx): State<Arc<AppContext>>) -> ApiResponse {
    let seed = ctx.engine.seed_url();

    let reachable = match normalize_url(seed) {
        Ok(url) => match ctx.engine.fetcher().probe(&url).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to access {}: {}", seed, e);
                false
            }
        },
        Err(e) => {
            tracing::error!("Invalid seed URL {}: {}", seed, e);
            false
        }
    };
    if !reachable {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Unable to access the website" }),
        );
    }

    match ctx.engine.crawl_site().await {
        Ok(result) if !result.is_empty() => {
            (StatusCode::OK, Json(json!({ "website_text": result.text })))
        }
        Ok(_) => {
            let robots_txt = ctx.engine.robots_txt(seed).await.unwrap_or_default();
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "No content extracted from the website",
                    "robots_txt": robots_txt,
                }),
            )
        }
        Err(e) => {
            tracing::error!("Error in scrape_website endpoint: {}", e);
            let robots_txt = ctx.engine.robots_txt(seed).await.unwrap_or_default();
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string(), "robots_txt": robots_txt }),
            )
        }
    }
}

/// POST /predict
pub async fn predict(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResponse {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!("Rejected /predict body: {}", rejection);
            return error(rejection.status(), json!({ "error": rejection.body_text() }));
        }
    };

    let question = body.message.trim();
    if question.is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "error": "message must not be empty" }),
        );
    }

    let website_text = match body.website_text.filter(|t| !t.trim().is_empty()) {
        Some(text) => text,
        None => match ctx.engine.crawl_site().await {
            Ok(result) => result.text,
            Err(e) => {
                tracing::error!("Error in predict endpoint: {}", e);
                return error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": e.to_string() }),
                );
            }
        },
    };

    if website_text.is_empty() {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "No content available from the website" }),
        );
    }

    let answer = answer_or_error(
        ctx.model.as_ref(),
        question,
        &website_text,
        ctx.config.model.max_output_tokens,
    )
    .await;

    (StatusCode::OK, Json(json!(answer)))
}
