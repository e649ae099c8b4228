//! Property listing server with cache metrics endpoints.
//!
//! ```bash
//! cargo run --example properties_server
//! curl http://127.0.0.1:3000/
//! curl -X POST http://127.0.0.1:3000/properties \
//!      -H 'content-type: application/json' \
//!      -d '{"title":"Loft","description":"Top floor","price":1800,"location":"Lisbon"}'
//! curl http://127.0.0.1:3000/metrics/
//! curl http://127.0.0.1:3000/metrics/accessor/
//! curl http://127.0.0.1:3000/report/
//! ```

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use property_cache::backend::InMemoryBackend;
use property_cache::observability::CountingMetrics;
use property_cache::repository::InMemoryRepository;
use property_cache::{CacheConfig, InvalidationListener, Property, PropertyService};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Repository = Arc<InMemoryRepository<Property>>;

/// Application state
#[derive(Clone)]
struct AppState {
    service: PropertyService<InMemoryBackend, Repository>,
    repository: Repository,
    counters: CountingMetrics,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct NewProperty {
    title: String,
    description: String,
    price: f64,
    location: String,
}

/// Listing with the metrics shown next to it
async fn property_list(State(state): State<AppState>) -> Response {
    match state.service.listing().await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Repository error: {}", e)})),
        )
            .into_response(),
    }
}

/// Create a property; the repository invalidates the listing before returning
async fn create_property(
    State(state): State<AppState>,
    Json(body): Json<NewProperty>,
) -> Response {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let property = Property::new(id, body.title, body.description, body.price, body.location);

    match state.repository.save(property.clone()).await {
        Ok(_) => (StatusCode::CREATED, Json(property)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Backend metrics snapshot as JSON
async fn cache_metrics_json(State(state): State<AppState>) -> Response {
    match state.service.metrics_json().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// This process's own hit/miss counters for the listing accessor
async fn accessor_metrics_json(State(state): State<AppState>) -> Response {
    Json(json!({
        "hits": state.counters.hits(),
        "misses": state.counters.misses(),
        "hit_rate": state.counters.hit_rate(),
    }))
    .into_response()
}

async fn cache_effectiveness_report(State(state): State<AppState>) -> String {
    state.service.build_report().await
}

fn seed() -> Vec<Property> {
    vec![
        Property::new(1, "Riverside Loft", "Open plan, top floor", 1800.0, "Lisbon"),
        Property::new(2, "Garden Cottage", "Two bedrooms, quiet street", 950.0, "Sintra"),
        Property::new(3, "Harbour Studio", "Sea view", 700.0, "Porto"),
    ]
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    let config = match CacheConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid cache configuration: {}", e);
            std::process::exit(1);
        }
    };
    let backend = InMemoryBackend::new();
    let counters = CountingMetrics::new();

    let mut repository = InMemoryRepository::with_entities(seed());
    repository.subscribe(Arc::new(
        InvalidationListener::new(backend.clone(), config.clone())
            .with_metrics(Arc::new(counters.clone())),
    ));
    let repository = Arc::new(repository);

    let service = PropertyService::with_metrics(
        backend,
        repository.clone(),
        &config,
        Arc::new(counters.clone()),
    );

    let state = AppState {
        service,
        repository,
        counters,
        next_id: Arc::new(AtomicU64::new(4)),
    };

    // Build router
    let app = Router::new()
        .route("/", get(property_list))
        .route("/properties", axum::routing::post(create_property))
        .route("/metrics/", get(cache_metrics_json))
        .route("/metrics/accessor/", get(accessor_metrics_json))
        .route("/report/", get(cache_effectiveness_report))
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind port 3000");

    println!("Server running on http://127.0.0.1:3000");
    println!("Listing: http://127.0.0.1:3000/");
    println!("Metrics: http://127.0.0.1:3000/metrics/");
    println!("Report:  http://127.0.0.1:3000/report/");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
