//! HTTP server for the Peerpool views

use crate::config::Config;
use crate::db::{AvailabilityBlock, Database};
use crate::error::Result;
use crate::modules::availability::{self, BroadcastRequest};
use crate::modules::create::{self, CreateDraft, CreateHangoutRequest, CreatedHangout, DraftQuery};
use crate::modules::hangouts::{self, HangoutsView, ParticipationAction};
use crate::modules::home::{self, HomeView};
use crate::modules::people;
use crate::modules::time::{self, TimeView};
use crate::schedule::TimeFilter;
use crate::session::{Session, SESSION_HEADER};
use anyhow::Context;
use axum::{
    extract::{Json, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        Self {
            config,
            db,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, e.g. to pin "today" in tests
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Tz> {
        (self.clock)().with_timezone(&self.config.schedule.timezone)
    }
}

/// Build the API router
pub fn router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(state.config.server.cors_origin.as_deref())?;

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/home", get(home_view))
        .route("/hangouts", get(hangouts_view).post(create_hangout))
        .route("/hangouts/:id/:action", post(respond))
        .route("/create", get(create_draft))
        .route("/time", get(time_view))
        .route("/availability", post(broadcast))
        .route("/friends", get(friends))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors {
        app = app.layer(cors);
    }
    Ok(app)
}

fn cors_layer(origin: Option<&str>) -> anyhow::Result<Option<CorsLayer>> {
    let Some(origin) = origin.map(str::trim).filter(|o| !o.is_empty()) else {
        return Ok(None);
    };
    let origin = HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin {}", origin))?;

    Ok(Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(SESSION_HEADER)]),
    ))
}

/// Serve the API until ctrl-c
pub async fn serve(config: Config, db: Database) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(AppState::new(config, db))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    #[serde(default)]
    filter: TimeFilter,
}

/// Health check endpoint
async fn health() -> &'static str {
    "OK"
}

async fn home_view(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<FilterQuery>,
) -> Json<HomeView> {
    let view = home::load(&state.db, &state.config.schedule, &session, query.filter, state.now()).await;
    Json(view)
}

async fn hangouts_view(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<FilterQuery>,
) -> Json<HangoutsView> {
    let view = hangouts::load(&state.db, &state.config.schedule, &session, query.filter, state.now()).await;
    Json(view)
}

/// Join, mark interested or pass, then return the refreshed hangouts view
async fn respond(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((id, action)): Path<(String, ParticipationAction)>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<HangoutsView>> {
    hangouts::respond(&state.db, &session, &id, action).await?;
    let view = hangouts::load(&state.db, &state.config.schedule, &session, query.filter, state.now()).await;
    Ok(Json(view))
}

async fn create_draft(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<DraftQuery>,
) -> Json<CreateDraft> {
    Json(create::draft(&state.db, &session, query).await)
}

async fn create_hangout(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(request): Json<CreateHangoutRequest>,
) -> Result<(StatusCode, Json<CreatedHangout>)> {
    let created = create::create(&state.db, &session, request, state.now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn time_view(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<FilterQuery>,
) -> Json<TimeView> {
    let view = time::load(&state.db, &state.config.schedule, &session, query.filter, state.now()).await;
    Json(view)
}

async fn broadcast(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(request): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<AvailabilityBlock>)> {
    let block = availability::broadcast(&state.db, &session, request).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn friends(State(state): State<Arc<AppState>>, session: Session) -> Result<Json<serde_json::Value>> {
    let friends = people::friends(&state.db, &session).await?;
    Ok(Json(serde_json::json!({ "friends": friends })))
}
