use crate::models::Movie;
use crate::tmdb::TmdbApi;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The three listing endpoints shown on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKey {
    Trending,
    Popular,
    TopRated,
}

impl FeedKey {
    pub const ALL: [FeedKey; 3] = [FeedKey::Trending, FeedKey::Popular, FeedKey::TopRated];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKey::Trending => "trending",
            FeedKey::Popular => "popular",
            FeedKey::TopRated => "top_rated",
        }
    }

    async fn fetch(&self, api: &dyn TmdbApi) -> Result<Vec<Movie>> {
        match self {
            FeedKey::Trending => api.fetch_trending().await,
            FeedKey::Popular => api.fetch_popular().await,
            FeedKey::TopRated => api.fetch_top_rated().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    Loading,
    Ready(Vec<Movie>),
    Failed,
}

/// Once-per-key cache of listing results. A successful fetch is never repeated;
/// a failed one is only reissued when something asks for that key again.
#[derive(Debug, Default)]
pub struct SectionFeeds {
    slots: Mutex<HashMap<FeedKey, FeedState>>,
}

impl SectionFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self, key: FeedKey) -> Option<FeedState> {
        self.slots.lock().await.get(&key).cloned()
    }

    pub async fn view(&self, key: FeedKey) -> FeedView {
        match self.state(key).await {
            Some(FeedState::Ready(movies)) => FeedView {
                movies,
                loading: false,
            },
            Some(FeedState::Loading) | None => FeedView {
                movies: Vec::new(),
                loading: true,
            },
            Some(FeedState::Failed) => FeedView {
                movies: Vec::new(),
                loading: false,
            },
        }
    }

    /// Fetches `key` unless it is cached or already in flight.
    pub async fn ensure(&self, key: FeedKey, api: &dyn TmdbApi) {
        {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(FeedState::Ready(_)) | Some(FeedState::Loading) => return,
                Some(FeedState::Failed) | None => {
                    slots.insert(key, FeedState::Loading);
                }
            }
        }

        let next = match key.fetch(api).await {
            Ok(movies) => {
                info!("Loaded {} {} movies", movies.len(), key.as_str());
                FeedState::Ready(movies)
            }
            Err(e) => {
                warn!("Failed to load {} movies: {:#}", key.as_str(), e);
                FeedState::Failed
            }
        };
        self.slots.lock().await.insert(key, next);
    }

    /// Issues all three listing fetches concurrently.
    pub async fn prefetch_all(&self, api: &dyn TmdbApi) {
        tokio::join!(
            self.ensure(FeedKey::Trending, api),
            self.ensure(FeedKey::Popular, api),
            self.ensure(FeedKey::TopRated, api),
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    pub movies: Vec<Movie>,
    pub loading: bool,
}
