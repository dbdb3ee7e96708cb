use crate::config::Config;
use crate::favorites::FavoritesStore;
use crate::feeds::{FeedKey, SectionFeeds};
use crate::home::HomeView;
use crate::models::Movie;
use crate::storage::{FavoritesStorage, FileStorage};
use crate::tmdb::{TmdbApi, TmdbClient};
use crate::view::{self, FavoritesPage, HomePage};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub favorites: Arc<Mutex<FavoritesStore>>,
    pub home: Arc<Mutex<HomeView>>,
    pub feeds: Arc<SectionFeeds>,
}

impl AppState {
    /// Loads favorites from `storage` and starts on the trending section.
    pub fn new(tmdb: Arc<dyn TmdbApi>, storage: Box<dyn FavoritesStorage>) -> Self {
        Self {
            tmdb,
            favorites: Arc::new(Mutex::new(FavoritesStore::load(storage))),
            home: Arc::new(Mutex::new(HomeView::new())),
            feeds: Arc::new(SectionFeeds::new()),
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
    )?);
    let storage = FileStorage::new(config.favorites_path.clone());
    let state = AppState::new(tmdb, Box::new(storage));

    let feeds = state.feeds.clone();
    let tmdb_for_task = state.tmdb.clone();
    tokio::spawn(async move {
        feeds.prefetch_all(tmdb_for_task.as_ref()).await;
    });

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(get_home))
        .route("/api/home/section", post(select_section))
        .route("/api/home/search", post(search))
        .route("/api/home/back", post(back_to_trending))
        .route("/api/movies/:id", get(movie_details))
        .route(
            "/api/favorites",
            get(list_favorites).post(add_favorite).delete(clear_favorites),
        )
        .route("/api/favorites/toggle", post(toggle_favorite))
        .route("/api/favorites/:id", delete(remove_favorite))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct SectionRequest {
    section: FeedKey,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct ClearQuery {
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Serialize)]
struct FavoriteStatus {
    movie_id: i32,
    is_favorite: bool,
    count: usize,
}

async fn get_home(State(state): State<AppState>) -> Json<HomePage> {
    let active = state.home.lock().await.active();
    if let Some(key) = active.feed() {
        if state.feeds.state(key).await.is_none() {
            state.feeds.ensure(key, state.tmdb.as_ref()).await;
        }
    }
    Json(render_home(&state).await)
}

async fn select_section(
    State(state): State<AppState>,
    Json(req): Json<SectionRequest>,
) -> Json<HomePage> {
    let switched = state.home.lock().await.select_section(req.section);
    if switched {
        debug!("Switched to {} section", req.section.as_str());
        state.feeds.ensure(req.section, state.tmdb.as_ref()).await;
    }
    Json(render_home(&state).await)
}

async fn search(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Json<HomePage> {
    let ticket = state.home.lock().await.submit_search(&req.query);
    match ticket {
        Some(ticket) => {
            let outcome = state.tmdb.search_by_title(&ticket.query).await;
            state.home.lock().await.complete_search(&ticket, outcome);
        }
        None => {
            state
                .feeds
                .ensure(FeedKey::Trending, state.tmdb.as_ref())
                .await;
        }
    }
    Json(render_home(&state).await)
}

async fn back_to_trending(State(state): State<AppState>) -> Json<HomePage> {
    state.home.lock().await.back_to_trending();
    state
        .feeds
        .ensure(FeedKey::Trending, state.tmdb.as_ref())
        .await;
    Json(render_home(&state).await)
}

async fn render_home(state: &AppState) -> HomePage {
    let snapshot = {
        let home = state.home.lock().await;
        home.snapshot(&state.feeds).await
    };
    let favorites = state.favorites.lock().await;
    view::home_page(snapshot, |id| favorites.is_favorite(id), favorites.count())
}

async fn movie_details(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let Ok(id) = raw_id.parse::<i32>() else {
        warn!("Rejecting movie id '{}'", raw_id);
        return not_found();
    };

    let (details, credits) = tokio::join!(
        state.tmdb.fetch_details(id),
        state.tmdb.fetch_credits(id)
    );
    let details = match details {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to fetch details for movie {}: {:#}", id, e);
            return not_found();
        }
    };
    let credits = match credits {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("Failed to fetch credits for movie {}: {:#}", id, e);
            None
        }
    };

    let is_favorite = state.favorites.lock().await.is_favorite(id);
    Json(view::detail_page(&details, credits.as_ref(), is_favorite)).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(view::not_found_page())).into_response()
}

async fn list_favorites(State(state): State<AppState>) -> Json<FavoritesPage> {
    let favorites = state.favorites.lock().await;
    Json(view::favorites_page(favorites.favorites()))
}

async fn add_favorite(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> Json<FavoriteStatus> {
    let mut favorites = state.favorites.lock().await;
    let movie_id = movie.id;
    favorites.add(movie);
    Json(FavoriteStatus {
        movie_id,
        is_favorite: true,
        count: favorites.count(),
    })
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> Json<FavoriteStatus> {
    let mut favorites = state.favorites.lock().await;
    let movie_id = movie.id;
    let is_favorite = favorites.toggle(movie);
    Json(FavoriteStatus {
        movie_id,
        is_favorite,
        count: favorites.count(),
    })
}

async fn remove_favorite(
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> Json<FavoriteStatus> {
    let mut favorites = state.favorites.lock().await;
    favorites.remove(movie_id);
    Json(FavoriteStatus {
        movie_id,
        is_favorite: false,
        count: favorites.count(),
    })
}

/// Destructive, so it only proceeds with `?confirm=true`.
async fn clear_favorites(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> (StatusCode, Json<FavoritesPage>) {
    let mut favorites = state.favorites.lock().await;
    if !query.confirm {
        info!("Clear favorites not confirmed, keeping {}", favorites.count());
        return (
            StatusCode::CONFLICT,
            Json(view::favorites_page(favorites.favorites())),
        );
    }
    favorites.clear();
    (StatusCode::OK, Json(view::favorites_page(favorites.favorites())))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
