use crate::models::{Credits, Movie, MovieDetails};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
pub const PLACEHOLDER_MOVIE: &str = "/placeholder-movie.jpg";
pub const PLACEHOLDER_PERSON: &str = "/placeholder-person.jpg";

#[async_trait]
pub trait TmdbApi: Send + Sync {
    async fn fetch_trending(&self) -> Result<Vec<Movie>>;
    async fn fetch_popular(&self) -> Result<Vec<Movie>>;
    async fn fetch_top_rated(&self) -> Result<Vec<Movie>>;
    async fn fetch_details(&self, id: i32) -> Result<MovieDetails>;
    async fn fetch_credits(&self, id: i32) -> Result<Credits>;
    async fn search_by_title(&self, query: &str) -> Result<Vec<Movie>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cinescope/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_list(&self, endpoint: &str) -> Result<Vec<Movie>> {
        let url = format!("{}{endpoint}?api_key={}", self.base_url, self.api_key);
        let page: Page<Movie> = self.get_json(&url, endpoint).await?;
        Ok(page.results)
    }

    // `label` is logged and reported instead of the URL so the key never leaks.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, label: &str) -> Result<T> {
        debug!("TMDB GET {}", label);
        let res = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("TMDB request {label} failed"))?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TMDB API error: {} -> {} {}", label, status, text));
        }
        let parsed: T = serde_json::from_str(&text)
            .with_context(|| format!("JSON parse failed for {label}"))?;
        Ok(parsed)
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn fetch_trending(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/trending/movie/week").await
    }

    async fn fetch_popular(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/movie/popular").await
    }

    async fn fetch_top_rated(&self) -> Result<Vec<Movie>> {
        self.fetch_list("/movie/top_rated").await
    }

    async fn fetch_details(&self, id: i32) -> Result<MovieDetails> {
        let endpoint = format!("/movie/{id}");
        let url = format!("{}{endpoint}?api_key={}", self.base_url, self.api_key);
        self.get_json(&url, &endpoint).await
    }

    async fn fetch_credits(&self, id: i32) -> Result<Credits> {
        let endpoint = format!("/movie/{id}/credits");
        let url = format!("{}{endpoint}?api_key={}", self.base_url, self.api_key);
        self.get_json(&url, &endpoint).await
    }

    async fn search_by_title(&self, query: &str) -> Result<Vec<Movie>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/search/movie?query={}&api_key={}",
            self.base_url,
            urlencoding::encode(query),
            self.api_key
        );
        let page: Page<Movie> = self.get_json(&url, "/search/movie").await?;
        Ok(page.results)
    }
}

/// Size tiers offered by the TMDB image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W200,
    W300,
    W400,
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W200 => "w200",
            ImageSize::W300 => "w300",
            ImageSize::W400 => "w400",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

/// Full CDN URL for `path`, or the movie placeholder when there is no path.
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{IMAGE_BASE}/{}{p}", size.as_str()),
        None => PLACEHOLDER_MOVIE.to_string(),
    }
}

pub fn poster_url(path: Option<&str>) -> String {
    image_url(path, ImageSize::W500)
}

pub fn backdrop_url(path: Option<&str>) -> String {
    image_url(path, ImageSize::W780)
}
