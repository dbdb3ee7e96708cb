//! Home page section switching and search sequencing.
use crate::feeds::{FeedKey, SectionFeeds};
use crate::models::Movie;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Trending,
    Popular,
    TopRated,
    Search,
}

impl Section {
    pub fn feed(&self) -> Option<FeedKey> {
        match self {
            Section::Trending => Some(FeedKey::Trending),
            Section::Popular => Some(FeedKey::Popular),
            Section::TopRated => Some(FeedKey::TopRated),
            Section::Search => None,
        }
    }
}

impl From<FeedKey> for Section {
    fn from(key: FeedKey) -> Self {
        match key {
            FeedKey::Trending => Section::Trending,
            FeedKey::Popular => Section::Popular,
            FeedKey::TopRated => Section::TopRated,
        }
    }
}

/// Identifies one issued search. Only the most recent ticket may apply results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmptyState {
    pub heading: &'static str,
    pub hint: &'static str,
}

const NO_SEARCH_RESULTS: EmptyState = EmptyState {
    heading: "No movies found",
    hint: "Try searching with different keywords",
};

const NO_FEED_RESULTS: EmptyState = EmptyState {
    heading: "No movies available",
    hint: "Please check your connection and try again",
};

/// Everything the home page needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeSnapshot {
    pub section: Section,
    pub title: String,
    pub movies: Vec<Movie>,
    pub loading: bool,
    pub show_sections: bool,
    pub show_back: bool,
    pub empty_state: Option<EmptyState>,
}

#[derive(Debug)]
pub struct HomeView {
    active: Section,
    query: String,
    results: Vec<Movie>,
    searching: bool,
    latest_seq: u64,
}

impl Default for HomeView {
    fn default() -> Self {
        Self::new()
    }
}

impl HomeView {
    pub fn new() -> Self {
        Self {
            active: Section::Trending,
            query: String::new(),
            results: Vec::new(),
            searching: false,
            latest_seq: 0,
        }
    }

    pub fn active(&self) -> Section {
        self.active
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// A blank query returns to trending and yields no ticket.
    pub fn submit_search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            self.reset_to_trending();
            return None;
        }
        self.latest_seq += 1;
        self.active = Section::Search;
        self.query = query.to_string();
        self.searching = true;
        debug!(seq = self.latest_seq, query, "Search issued");
        Some(SearchTicket {
            seq: self.latest_seq,
            query: self.query.clone(),
        })
    }

    /// Applies a search outcome if `ticket` is still the latest request. A failure
    /// applies as an empty result list. Returns whether anything changed.
    pub fn complete_search(&mut self, ticket: &SearchTicket, outcome: Result<Vec<Movie>>) -> bool {
        if ticket.seq != self.latest_seq || self.active != Section::Search {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding stale search result"
            );
            return false;
        }
        self.results = match outcome {
            Ok(movies) => {
                info!("Search '{}' returned {} movie(s)", ticket.query, movies.len());
                movies
            }
            Err(e) => {
                warn!("Search '{}' failed: {:#}", ticket.query, e);
                Vec::new()
            }
        };
        self.searching = false;
        true
    }

    pub fn back_to_trending(&mut self) {
        self.reset_to_trending();
    }

    /// Section buttons are hidden while searching, so this is ignored in search mode.
    pub fn select_section(&mut self, key: FeedKey) -> bool {
        if self.active == Section::Search {
            return false;
        }
        self.active = key.into();
        true
    }

    pub async fn snapshot(&self, feeds: &SectionFeeds) -> HomeSnapshot {
        let (title, movies, loading) = match self.active.feed() {
            Some(key) => {
                let view = feeds.view(key).await;
                (feed_title(key).to_string(), view.movies, view.loading)
            }
            None => (
                format!("Search Results for \"{}\"", self.query),
                self.results.clone(),
                self.searching,
            ),
        };

        let in_search = self.active == Section::Search;
        let empty_state = if loading || !movies.is_empty() {
            None
        } else if in_search {
            Some(NO_SEARCH_RESULTS)
        } else {
            Some(NO_FEED_RESULTS)
        };

        HomeSnapshot {
            section: self.active,
            title,
            show_sections: !in_search,
            show_back: in_search && !movies.is_empty(),
            movies,
            loading,
            empty_state,
        }
    }

    fn reset_to_trending(&mut self) {
        // Bumping the sequence orphans any search still in flight.
        self.latest_seq += 1;
        self.active = Section::Trending;
        self.query.clear();
        self.results.clear();
        self.searching = false;
    }
}

fn feed_title(key: FeedKey) -> &'static str {
    match key {
        FeedKey::Trending => "Trending Movies",
        FeedKey::Popular => "Popular Movies",
        FeedKey::TopRated => "Top Rated Movies",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i32) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            poster_path: None,
            backdrop_path: None,
            vote_average: 5.0,
            vote_count: 1,
            release_date: String::new(),
            overview: String::new(),
        }
    }

    #[test]
    fn starts_on_trending() {
        let view = HomeView::new();
        assert_eq!(view.active(), Section::Trending);
        assert!(!view.is_searching());
    }

    #[test]
    fn section_buttons_switch_outside_search() {
        let mut view = HomeView::new();
        assert!(view.select_section(FeedKey::TopRated));
        assert_eq!(view.active(), Section::TopRated);
        assert!(view.select_section(FeedKey::Popular));
        assert_eq!(view.active(), Section::Popular);
    }

    #[test]
    fn section_buttons_ignored_in_search() {
        let mut view = HomeView::new();
        view.submit_search("Alien");
        assert!(!view.select_section(FeedKey::Popular));
        assert_eq!(view.active(), Section::Search);
    }

    #[test]
    fn blank_query_returns_to_trending() {
        let mut view = HomeView::new();
        let ticket = view.submit_search("Alien").unwrap();
        view.complete_search(&ticket, Ok(vec![sample(1)]));
        assert!(view.submit_search("   ").is_none());
        assert_eq!(view.active(), Section::Trending);
        assert_eq!(view.query(), "");
    }

    #[test]
    fn stale_search_result_is_discarded() {
        let mut view = HomeView::new();
        let first = view.submit_search("Alien").unwrap();
        let second = view.submit_search("Aliens").unwrap();

        assert!(view.complete_search(&second, Ok(vec![sample(2)])));
        assert!(!view.complete_search(&first, Ok(vec![sample(1)])));
        assert_eq!(view.results, vec![sample(2)]);
        assert!(!view.is_searching());
    }

    #[test]
    fn older_result_does_not_clear_in_flight_flag() {
        let mut view = HomeView::new();
        let first = view.submit_search("Alien").unwrap();
        let _second = view.submit_search("Aliens").unwrap();
        assert!(!view.complete_search(&first, Ok(vec![sample(1)])));
        assert!(view.is_searching());
    }

    #[test]
    fn result_after_back_to_trending_is_discarded() {
        let mut view = HomeView::new();
        let ticket = view.submit_search("Alien").unwrap();
        view.back_to_trending();
        assert!(!view.complete_search(&ticket, Ok(vec![sample(1)])));
        assert_eq!(view.active(), Section::Trending);
        assert!(view.results.is_empty());
    }

    #[tokio::test]
    async fn failed_search_shows_no_movies_found() {
        let feeds = SectionFeeds::new();
        let mut view = HomeView::new();
        let ticket = view.submit_search("Matrix").unwrap();
        assert!(view.snapshot(&feeds).await.loading);

        view.complete_search(&ticket, Err(anyhow::anyhow!("timeout")));
        let snap = view.snapshot(&feeds).await;
        assert_eq!(snap.section, Section::Search);
        assert_eq!(snap.title, "Search Results for \"Matrix\"");
        assert!(!snap.loading);
        assert!(!snap.show_sections);
        assert!(!snap.show_back);
        assert_eq!(snap.empty_state.map(|e| e.heading), Some("No movies found"));
    }

    #[tokio::test]
    async fn feed_section_titles() {
        let feeds = SectionFeeds::new();
        let mut view = HomeView::new();
        let snap = view.snapshot(&feeds).await;
        assert_eq!(snap.title, "Trending Movies");
        assert!(snap.loading);
        assert!(snap.empty_state.is_none());

        view.select_section(FeedKey::TopRated);
        assert_eq!(view.snapshot(&feeds).await.title, "Top Rated Movies");
    }
}
