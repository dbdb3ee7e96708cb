use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use cinescope::app::{build_router, AppState};
use cinescope::models::{CastMember, Credits, CrewMember, Genre, Movie, MovieDetails};
use cinescope::storage::MemoryStorage;
use cinescope::tmdb::TmdbApi;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

#[derive(Default)]
struct FakeTmdb {
    trending: Vec<Movie>,
    popular: Vec<Movie>,
    top_rated: Vec<Movie>,
    fail_listings: bool,
    details: HashMap<i32, MovieDetails>,
    searches: HashMap<String, Vec<Movie>>,
    fail_search: bool,
    listing_calls: AtomicUsize,
}

impl FakeTmdb {
    fn listing(&self, movies: &[Movie]) -> anyhow::Result<Vec<Movie>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listings {
            anyhow::bail!("TMDB API error: 503");
        }
        Ok(movies.to_vec())
    }
}

#[async_trait::async_trait]
impl TmdbApi for FakeTmdb {
    async fn fetch_trending(&self) -> anyhow::Result<Vec<Movie>> {
        self.listing(&self.trending)
    }
    async fn fetch_popular(&self) -> anyhow::Result<Vec<Movie>> {
        self.listing(&self.popular)
    }
    async fn fetch_top_rated(&self) -> anyhow::Result<Vec<Movie>> {
        self.listing(&self.top_rated)
    }
    async fn fetch_details(&self, id: i32) -> anyhow::Result<MovieDetails> {
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("TMDB API error: 404 for movie {}", id))
    }
    async fn fetch_credits(&self, id: i32) -> anyhow::Result<Credits> {
        if !self.details.contains_key(&id) {
            anyhow::bail!("TMDB API error: 404 for credits {}", id);
        }
        Ok(Credits {
            cast: vec![CastMember {
                id: 6384,
                name: "Keanu Reeves".to_string(),
                character: "Neo".to_string(),
                profile_path: None,
            }],
            crew: vec![CrewMember {
                id: 9340,
                name: "Lilly Wachowski".to_string(),
                job: "Director".to_string(),
            }],
        })
    }
    async fn search_by_title(&self, query: &str) -> anyhow::Result<Vec<Movie>> {
        if self.fail_search {
            anyhow::bail!("search timed out");
        }
        Ok(self.searches.get(query).cloned().unwrap_or_default())
    }
}

fn movie(id: i32, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{id}.jpg")),
        backdrop_path: None,
        vote_average: 7.05,
        vote_count: 1200,
        release_date: "2021-09-15".to_string(),
        overview: format!("{title} overview"),
    }
}

fn fake_tmdb() -> FakeTmdb {
    let mut details = HashMap::new();
    details.insert(
        603,
        MovieDetails {
            movie: movie(603, "The Matrix"),
            runtime: Some(136),
            budget: 63_000_000,
            revenue: 0,
            status: "Released".to_string(),
            genres: vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
            production_companies: Vec::new(),
            homepage: Some("https://www.warnerbros.com/movies/matrix".to_string()),
            tagline: None,
        },
    );
    let mut searches = HashMap::new();
    searches.insert("Dune".to_string(), vec![movie(438631, "Dune")]);
    FakeTmdb {
        trending: vec![movie(1, "Trending A"), movie(2, "Trending B")],
        popular: vec![movie(3, "Popular A")],
        top_rated: vec![movie(4, "Top A")],
        details,
        searches,
        ..FakeTmdb::default()
    }
}

fn app_with(tmdb: FakeTmdb, storage: &MemoryStorage) -> (Router, Arc<FakeTmdb>) {
    let tmdb = Arc::new(tmdb);
    let state = AppState::new(tmdb.clone(), Box::new(storage.clone()));
    (build_router(state), tmdb)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

fn stored_ids(storage: &MemoryStorage) -> Vec<i32> {
    let stored: Vec<Movie> = serde_json::from_str(&storage.contents().unwrap()).unwrap();
    stored.into_iter().map(|m| m.id).collect()
}

#[tokio::test]
async fn health_ok() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn home_starts_on_trending() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let (status, body) = send(&app, get("/api/home")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["section"], "trending");
    assert_eq!(body["title"], "Trending Movies");
    assert_eq!(body["loading"], false);
    assert_eq!(body["show_sections"], true);
    assert_eq!(ids(&body["movies"]), vec![1, 2]);
    assert_eq!(body["movies"][0]["rating"], "7.1");
    assert_eq!(body["movies"][0]["year"], "2021");
    assert_eq!(body["movies"][0]["is_favorite"], false);
    assert!(body["empty_state"].is_null());
}

#[tokio::test]
async fn section_switch_fetches_each_feed_once() {
    let (app, tmdb) = app_with(fake_tmdb(), &MemoryStorage::new());
    send(&app, get("/api/home")).await;

    let (_, body) = send(&app, post_json("/api/home/section", json!({ "section": "popular" }))).await;
    assert_eq!(body["title"], "Popular Movies");
    assert_eq!(ids(&body["movies"]), vec![3]);

    let (_, body) = send(&app, post_json("/api/home/section", json!({ "section": "top_rated" }))).await;
    assert_eq!(body["section"], "top_rated");
    assert_eq!(ids(&body["movies"]), vec![4]);

    send(&app, post_json("/api/home/section", json!({ "section": "popular" }))).await;
    send(&app, post_json("/api/home/section", json!({ "section": "trending" }))).await;
    assert_eq!(tmdb.listing_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn failed_listing_shows_try_again() {
    let tmdb = FakeTmdb {
        fail_listings: true,
        ..fake_tmdb()
    };
    let (app, _) = app_with(tmdb, &MemoryStorage::new());
    let (status, body) = send(&app, get("/api/home")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["movies"].as_array().unwrap().is_empty());
    assert_eq!(body["loading"], false);
    assert_eq!(body["empty_state"]["heading"], "No movies available");
    assert_eq!(
        body["empty_state"]["hint"],
        "Please check your connection and try again"
    );
}

#[tokio::test]
async fn empty_search_result_stays_in_search() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let (_, body) = send(&app, post_json("/api/home/search", json!({ "query": "Matrix" }))).await;
    assert_eq!(body["section"], "search");
    assert_eq!(body["title"], "Search Results for \"Matrix\"");
    assert_eq!(body["empty_state"]["heading"], "No movies found");
    assert_eq!(body["show_sections"], false);
    assert_eq!(body["show_back"], false);

    // Section buttons are hidden in search mode.
    let (_, body) = send(&app, post_json("/api/home/section", json!({ "section": "popular" }))).await;
    assert_eq!(body["section"], "search");
}

#[tokio::test]
async fn failed_search_resolves_to_empty_list() {
    let tmdb = FakeTmdb {
        fail_search: true,
        ..fake_tmdb()
    };
    let (app, _) = app_with(tmdb, &MemoryStorage::new());
    let (status, body) = send(&app, post_json("/api/home/search", json!({ "query": "Dune" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loading"], false);
    assert!(body["movies"].as_array().unwrap().is_empty());
    assert_eq!(body["empty_state"]["heading"], "No movies found");
}

#[tokio::test]
async fn search_then_back_to_trending() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let (_, body) = send(&app, post_json("/api/home/search", json!({ "query": "  Dune " }))).await;
    assert_eq!(body["title"], "Search Results for \"Dune\"");
    assert_eq!(ids(&body["movies"]), vec![438631]);
    assert_eq!(body["show_back"], true);

    let (_, body) = send(&app, post_json("/api/home/back", json!({}))).await;
    assert_eq!(body["section"], "trending");
    assert_eq!(ids(&body["movies"]), vec![1, 2]);
}

#[tokio::test]
async fn blank_search_returns_to_trending() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    send(&app, post_json("/api/home/search", json!({ "query": "Dune" }))).await;
    let (_, body) = send(&app, post_json("/api/home/search", json!({ "query": "   " }))).await;
    assert_eq!(body["section"], "trending");
    assert_eq!(body["title"], "Trending Movies");
}

#[tokio::test]
async fn movie_details_render_with_credits() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let (status, body) = send(&app, get("/api/movies/603")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Matrix");
    assert_eq!(body["runtime"], "2h 16m");
    assert_eq!(body["budget"], "$63,000,000");
    assert_eq!(body["revenue"], "Unknown");
    assert_eq!(body["release_date"], "September 15, 2021");
    assert_eq!(body["director"], "Lilly Wachowski");
    assert_eq!(body["cast"][0]["profile"]["src"], "/placeholder-person.jpg");
    assert_eq!(body["favorite_label"], "Add to Favorites");
}

#[tokio::test]
async fn missing_movie_is_not_found() {
    let (app, _) = app_with(fake_tmdb(), &MemoryStorage::new());
    let (status, body) = send(&app, get("/api/movies/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Movie Not Found");
    assert_eq!(body["back_link"], "/");

    let (status, _) = send(&app, get("/api/movies/not-a-number")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unfavorite_scenario_updates_store_and_slot() {
    let storage = MemoryStorage::new();
    let (app, _) = app_with(fake_tmdb(), &storage);
    let a = serde_json::to_value(movie(1, "A")).unwrap();
    let b = serde_json::to_value(movie(2, "B")).unwrap();

    let (_, status) = send(&app, post_json("/api/favorites/toggle", a.clone())).await;
    assert_eq!(status["is_favorite"], true);
    send(&app, post_json("/api/favorites/toggle", b)).await;
    let (_, status) = send(&app, post_json("/api/favorites/toggle", a)).await;
    assert_eq!(status["is_favorite"], false);
    assert_eq!(status["count"], 1);

    let (_, page) = send(&app, get("/api/favorites")).await;
    assert_eq!(ids(&page["movies"]), vec![2]);
    assert_eq!(page["summary"], "You have 1 favorite movie");
    assert_eq!(stored_ids(&storage), vec![2]);

    let (_, home) = send(&app, get("/api/home")).await;
    assert_eq!(home["movies"][1]["is_favorite"], true);
    assert_eq!(home["favorites_count"], 1);
}

#[tokio::test]
async fn add_and_remove_are_idempotent() {
    let storage = MemoryStorage::new();
    let (app, _) = app_with(fake_tmdb(), &storage);
    let m = serde_json::to_value(movie(7, "G")).unwrap();
    send(&app, post_json("/api/favorites", m.clone())).await;
    let (_, status) = send(&app, post_json("/api/favorites", m)).await;
    assert_eq!(status["count"], 1);

    send(&app, delete("/api/favorites/7")).await;
    let (_, status) = send(&app, delete("/api/favorites/7")).await;
    assert_eq!(status["count"], 0);
    assert_eq!(storage.write_count(), 2);
}

#[tokio::test]
async fn clear_requires_confirmation() {
    let storage = MemoryStorage::new();
    let (app, _) = app_with(fake_tmdb(), &storage);
    send(&app, post_json("/api/favorites", serde_json::to_value(movie(1, "A")).unwrap())).await;
    send(&app, post_json("/api/favorites", serde_json::to_value(movie(2, "B")).unwrap())).await;

    let (status, page) = send(&app, delete("/api/favorites")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(page["count"], 2);
    assert_eq!(stored_ids(&storage), vec![2, 1]);

    let (status, page) = send(&app, delete("/api/favorites?confirm=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 0);
    assert_eq!(page["summary"], "No favorite movies yet");
    assert_eq!(storage.contents().as_deref(), Some("[]"));
}

#[tokio::test]
async fn corrupt_slot_starts_with_no_favorites() {
    let storage = MemoryStorage::with_contents("[{\"id\": ");
    let (app, _) = app_with(fake_tmdb(), &storage);
    let (status, page) = send(&app, get("/api/favorites")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 0);
}
