//! HTTP API for ZABAL.
//!
//! Exposes newsletter and social generation, the newsletter archive, and
//! persona memory editing over JSON. Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use zabal_config::AppConfig;
use zabal_memory::{PersonaMemory, PersonaMemoryStore};
use zabal_workflow::{
    ArchiveEntry, ArchiveError, GenerationWorkflow, NewsletterRequest, SocialRequest,
};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub workflow: GenerationWorkflow,
}

impl GatewayState {
    fn store(&self) -> &PersonaMemoryStore {
        self.workflow.assembler().store()
    }
}

type SharedState = Arc<GatewayState>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/generate/newsletter", post(newsletter_handler))
        .route("/generate/social", post(social_handler))
        .route("/history/newsletters", get(list_newsletters_handler))
        .route("/history/newsletter/{filename}", get(get_newsletter_handler))
        .route("/memory/get", get(get_memory_handler))
        .route("/memory/add", post(add_memory_handler))
        .route("/memory/update", post(update_memory_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = zabal_providers::build_from_config(&config);
    let provider = router.require_default()?;
    let model = zabal_providers::default_model(&config);

    let workflow = GenerationWorkflow::from_config(&config, provider, model)?;
    workflow.assembler().store().ensure_exists()?;

    let app = build_router(Arc::new(GatewayState { workflow }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsletterBody {
    daily_input: String,
    badass_quote: Option<String>,
    lens: Option<String>,
    calendar_key: Option<String>,
    calendar_text: Option<String>,
    editing_instructions: Option<String>,
    voice_parameters: Option<zabal_workflow::VoiceParameters>,
}

#[derive(Serialize)]
struct NewsletterResponse {
    success: bool,
    newsletter: String,
    filepath: String,
    day_num: Option<i64>,
    date: String,
    remaining_issues: Vec<String>,
    auto_fixed: bool,
    lens: Option<String>,
    lens_reason: Option<String>,
}

async fn newsletter_handler(
    State(state): State<SharedState>,
    Json(body): Json<NewsletterBody>,
) -> Result<Json<NewsletterResponse>, ApiError> {
    if body.daily_input.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Daily input is required"));
    }

    let request = NewsletterRequest {
        daily_input: body.daily_input,
        quote: body.badass_quote,
        lens_override: body.lens,
        calendar_key: body.calendar_key,
        calendar_text: body.calendar_text,
        editing_instructions: body.editing_instructions,
        voice_parameters: body.voice_parameters,
        date: None,
    };

    let result = state.workflow.generate_newsletter(&request).await.map_err(|e| {
        error!(error = %e, "Newsletter generation failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(NewsletterResponse {
        success: true,
        filepath: result.saved.to_string(),
        day_num: result.day_number,
        date: result.date,
        remaining_issues: result.remaining_issues.iter().map(ToString::to_string).collect(),
        auto_fixed: result.auto_fixed,
        lens: result.lens_id,
        lens_reason: result.lens_reason,
        newsletter: result.artifact.text,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SocialBody {
    newsletter_content: String,
    newsletter_link: Option<String>,
    has_video: bool,
}

#[derive(Serialize)]
struct SocialResponse {
    success: bool,
    social_content: String,
    filepath: String,
    remaining_issues: Vec<String>,
}

async fn social_handler(
    State(state): State<SharedState>,
    Json(body): Json<SocialBody>,
) -> Result<Json<SocialResponse>, ApiError> {
    if body.newsletter_content.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Newsletter content is required"));
    }

    let request = SocialRequest {
        newsletter_content: body.newsletter_content,
        link: body.newsletter_link,
        has_video: body.has_video,
    };

    let result = state.workflow.generate_social(&request).await.map_err(|e| {
        error!(error = %e, "Social generation failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(SocialResponse {
        success: true,
        filepath: result.saved.to_string(),
        remaining_issues: result.remaining_issues.iter().map(ToString::to_string).collect(),
        social_content: result.artifact.text,
    }))
}

#[derive(Serialize)]
struct NewsletterListResponse {
    newsletters: Vec<ArchiveEntry>,
}

async fn list_newsletters_handler(
    State(state): State<SharedState>,
) -> Result<Json<NewsletterListResponse>, ApiError> {
    let Some(archive) = state.workflow.archive() else {
        return Ok(Json(NewsletterListResponse { newsletters: Vec::new() }));
    };
    let newsletters = archive
        .list_newsletters()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(NewsletterListResponse { newsletters }))
}

#[derive(Serialize)]
struct NewsletterContentResponse {
    success: bool,
    content: String,
    filename: String,
}

async fn get_newsletter_handler(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Json<NewsletterContentResponse>, ApiError> {
    let archive = state
        .workflow
        .archive()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Newsletter not found"))?;

    match archive.read_newsletter(&filename) {
        Ok(content) => Ok(Json(NewsletterContentResponse {
            success: true,
            content,
            filename,
        })),
        Err(ArchiveError::InvalidName(_)) => {
            warn!(filename = %filename, "Rejected archive file name");
            Err(api_error(StatusCode::BAD_REQUEST, "Invalid file name"))
        }
        Err(ArchiveError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, "Newsletter not found")),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

#[derive(Serialize)]
struct MemoryResponse {
    success: bool,
    memory: PersonaMemory,
}

async fn get_memory_handler(State(state): State<SharedState>) -> Json<MemoryResponse> {
    Json(MemoryResponse {
        success: true,
        memory: state.store().load(),
    })
}

#[derive(Debug, Deserialize)]
struct AddMemoryBody {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: Option<String>,
    content: String,
}

#[derive(Serialize)]
struct AddMemoryResponse {
    success: bool,
    /// False when the entry was already present
    added: bool,
}

async fn add_memory_handler(
    State(state): State<SharedState>,
    Json(body): Json<AddMemoryBody>,
) -> Result<Json<AddMemoryResponse>, ApiError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Content is required"));
    }

    let store = state.store();
    let result = match body.kind.as_str() {
        "voice_example" => {
            let title = body
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Title is required for voice examples"))?;
            store.add_voice_example(title, content)
        }
        "voice_dont" => store.add_voice_dont(content),
        "style_note" => store.add_style_note(content),
        "context_memory" => store.add_context_memory(content),
        other => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!(
                    "Unknown memory type '{other}'. Use voice_example, voice_dont, style_note, or context_memory."
                ),
            ));
        }
    };

    let added = result.map_err(|e| {
        error!(error = %e, kind = %body.kind, "Failed to add memory entry");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!(kind = %body.kind, added, "Memory entry added");

    Ok(Json(AddMemoryResponse { success: true, added }))
}

#[derive(Debug, Deserialize)]
struct UpdateMemoryBody {
    memory: PersonaMemory,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn update_memory_handler(
    State(state): State<SharedState>,
    Json(body): Json<UpdateMemoryBody>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.store().save(&body.memory).map_err(|e| {
        error!(error = %e, "Failed to save memory");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!("Memory replaced");
    Ok(Json(SuccessResponse { success: true }))
}
