use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use hikefind_caption::default_captioner;
use hikefind_core::config::Config;
use hikefind_core::error::Error;
use hikefind_core::taxonomy::Taxonomy;
use hikefind_embed::default_embedder;
use hikefind_rank::{RankWeights, SketchSearchEngine};
use hikefind_store::load_corpus;

/// Shared state for the server.
#[derive(Clone)]
struct AppState {
    engine: Arc<SketchSearchEngine>,
    originals_dir: PathBuf,
}

/// Response payload for the search endpoint.
#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
struct SearchResult {
    id: String,
    score: f32,
    compositional_score: f32,
    aesthetic_score: f32,
    original_image_url: Option<String>,
    class_map_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load()?;

    tracing::info!(dir = %config.data.processed_dir.display(), "loading corpus");
    let corpus = load_corpus(&config.data.processed_dir)?;
    tracing::info!(items = corpus.len(), "corpus ready");

    let engine = SketchSearchEngine::new(
        default_captioner(&config.caption),
        default_embedder(&config.models.clip_dir)?,
        Taxonomy::landscape(),
        corpus,
        config.search.metric,
        RankWeights {
            compositional: config.search.weight_comp,
            aesthetic: config.search.weight_aes,
        },
        config.search.top_k,
        config.sketch.min_pixel_count,
    );

    let state = AppState {
        engine: Arc::new(engine),
        originals_dir: config.data.originals_dir.clone(),
    };

    let app = Router::new()
        .route("/api/search", post(post_search))
        .nest_service("/images/original", ServeDir::new(&config.data.originals_dir))
        .nest_service("/images/processed", ServeDir::new(&config.data.processed_dir))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Handler for POST /api/search: one sketch upload in, ranked ids out.
/// A failed query produces exactly one structured error response; no
/// partial results.
async fn post_search(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut sketch_bytes = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() == Some("file") {
            sketch_bytes = Some(field.bytes().await.map_err(bad_request)?);
        }
    }
    let Some(bytes) = sketch_bytes else {
        return Err(bad_request("missing 'file' field"));
    };

    // The whole pipeline is blocking (rasterization, oracle HTTP calls,
    // model inference), so it runs off the async worker threads.
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.query_bytes(&bytes))
        .await
        .map_err(|e| internal(&e.to_string()))?
        .map_err(query_error)?;

    let results = outcome
        .candidates
        .into_iter()
        .map(|candidate| {
            let original_image_url = find_original(&state.originals_dir, &candidate.id)
                .map(|name| format!("/images/original/{name}"));
            SearchResult {
                original_image_url,
                class_map_url: format!("/images/processed/{}.classmap.png", candidate.id),
                id: candidate.id,
                score: candidate.combined_score,
                compositional_score: candidate.compositional_score,
                aesthetic_score: candidate.aesthetic_score,
            }
        })
        .collect();
    Ok(Json(SearchResponse { results }))
}

fn query_error(e: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        Error::InvalidImage(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn bad_request(e: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() }))
}

fn internal(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: message.to_string() }))
}

/// Resolve a corpus id back to its original file name, whatever the
/// extension.
fn find_original(originals_dir: &Path, id: &str) -> Option<String> {
    let entries = std::fs::read_dir(originals_dir).ok()?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) == Some(id) {
            return path.file_name().map(|n| n.to_string_lossy().to_string());
        }
    }
    None
}
