//! Display formatting and the view models served to the browser.
use crate::home::{EmptyState, HomeSnapshot, Section};
use crate::models::{Credits, Movie, MovieDetails};
use crate::tmdb::{self, ImageSize, PLACEHOLDER_MOVIE, PLACEHOLDER_PERSON};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

const UNKNOWN: &str = "Unknown";
const TBA: &str = "TBA";
const MAX_CAST: usize = 10;
const MAX_COMPANIES: usize = 3;

/// An image source plus the sources the page swaps in, in order, when a load fails.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageRef {
    pub src: String,
    pub fallbacks: Vec<String>,
}

impl ImageRef {
    fn with_placeholder(url: String, placeholder: &str) -> Self {
        let fallbacks = if url == placeholder {
            Vec::new()
        } else {
            vec![placeholder.to_string()]
        };
        Self {
            src: url,
            fallbacks,
        }
    }

    pub fn poster(path: Option<&str>) -> Self {
        Self::with_placeholder(tmdb::poster_url(path), PLACEHOLDER_MOVIE)
    }

    /// Backdrop, then poster, then placeholder.
    pub fn backdrop(backdrop: Option<&str>, poster: Option<&str>) -> Self {
        let mut chain: Vec<String> = [
            backdrop.filter(|p| !p.is_empty()).map(|p| tmdb::backdrop_url(Some(p))),
            poster.filter(|p| !p.is_empty()).map(|p| tmdb::poster_url(Some(p))),
        ]
        .into_iter()
        .flatten()
        .collect();
        chain.push(PLACEHOLDER_MOVIE.to_string());
        let src = chain.remove(0);
        Self {
            src,
            fallbacks: chain,
        }
    }

    pub fn profile(path: Option<&str>) -> Self {
        let url = match path.filter(|p| !p.is_empty()) {
            Some(_) => tmdb::image_url(path, ImageSize::W200),
            None => PLACEHOLDER_PERSON.to_string(),
        };
        Self::with_placeholder(url, PLACEHOLDER_PERSON)
    }
}

/// Round half up to one decimal: 7.05 -> "7.1". Whole numbers drop the decimal.
pub fn format_rating(vote_average: f64) -> String {
    let rounded = (vote_average * 10.0 + 0.5).floor() / 10.0;
    let text = format!("{rounded:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}

pub fn format_year(release_date: &str) -> String {
    match parse_date(release_date) {
        Some(date) => date.year().to_string(),
        None => release_date
            .split('-')
            .next()
            .filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .unwrap_or_else(|| TBA.to_string()),
    }
}

pub fn format_long_date(release_date: &str) -> String {
    match parse_date(release_date) {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => TBA.to_string(),
    }
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(m) if m > 0 => format!("{}h {}m", m / 60, m % 60),
        _ => UNKNOWN.to_string(),
    }
}

/// US dollars, no decimals. Zero means TMDB has no figure.
pub fn format_money(amount: u64) -> String {
    if amount == 0 {
        return UNKNOWN.to_string();
    }
    format!("${}", group_thousands(amount))
}

pub fn format_votes(count: u32) -> String {
    format!("{} votes", group_thousands(count as u64))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MovieCard {
    pub id: i32,
    pub title: String,
    pub link: String,
    pub poster: ImageRef,
    pub rating: String,
    pub year: String,
    pub is_favorite: bool,
    /// The record posted back when the heart is clicked.
    pub movie: Movie,
}

pub fn movie_card(movie: &Movie, is_favorite: bool) -> MovieCard {
    MovieCard {
        id: movie.id,
        title: movie.title.clone(),
        link: format!("/movie/{}", movie.id),
        poster: ImageRef::poster(movie.poster_path.as_deref()),
        rating: format_rating(movie.vote_average),
        year: format_year(&movie.release_date),
        is_favorite,
        movie: movie.clone(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HomePage {
    pub section: Section,
    pub title: String,
    pub loading: bool,
    pub show_sections: bool,
    pub show_back: bool,
    pub movies: Vec<MovieCard>,
    pub empty_state: Option<EmptyState>,
    pub favorites_count: usize,
}

pub fn home_page(
    snapshot: HomeSnapshot,
    is_favorite: impl Fn(i32) -> bool,
    favorites_count: usize,
) -> HomePage {
    HomePage {
        movies: snapshot
            .movies
            .iter()
            .map(|m| movie_card(m, is_favorite(m.id)))
            .collect(),
        section: snapshot.section,
        title: snapshot.title,
        loading: snapshot.loading,
        show_sections: snapshot.show_sections,
        show_back: snapshot.show_back,
        empty_state: snapshot.empty_state,
        favorites_count,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CastCard {
    pub name: String,
    pub character: String,
    pub profile: ImageRef,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailPage {
    pub id: i32,
    pub title: String,
    pub tagline: Option<String>,
    pub backdrop: ImageRef,
    pub poster: ImageRef,
    pub rating: String,
    pub votes: String,
    pub release_date: String,
    pub runtime: String,
    pub genres: Vec<String>,
    pub overview: String,
    pub director: Option<String>,
    pub cast: Vec<CastCard>,
    pub status: String,
    pub budget: String,
    pub revenue: String,
    pub production_companies: Vec<String>,
    pub homepage: Option<String>,
    pub is_favorite: bool,
    pub favorite_label: &'static str,
    pub movie: Movie,
}

pub fn detail_page(
    details: &MovieDetails,
    credits: Option<&Credits>,
    is_favorite: bool,
) -> DetailPage {
    let movie = &details.movie;
    let overview = if movie.overview.trim().is_empty() {
        "No overview available.".to_string()
    } else {
        movie.overview.clone()
    };
    let cast = credits
        .map(|c| {
            c.cast
                .iter()
                .take(MAX_CAST)
                .map(|a| CastCard {
                    name: a.name.clone(),
                    character: a.character.clone(),
                    profile: ImageRef::profile(a.profile_path.as_deref()),
                })
                .collect()
        })
        .unwrap_or_default();

    DetailPage {
        id: movie.id,
        title: movie.title.clone(),
        tagline: details.tagline.clone(),
        backdrop: ImageRef::backdrop(movie.backdrop_path.as_deref(), movie.poster_path.as_deref()),
        poster: ImageRef::poster(movie.poster_path.as_deref()),
        rating: format_rating(movie.vote_average),
        votes: format_votes(movie.vote_count),
        release_date: format_long_date(&movie.release_date),
        runtime: format_runtime(details.runtime),
        genres: details.genres.iter().map(|g| g.name.clone()).collect(),
        overview,
        director: credits.and_then(|c| c.director()).map(|d| d.name.clone()),
        cast,
        status: if details.status.is_empty() {
            UNKNOWN.to_string()
        } else {
            details.status.clone()
        },
        budget: format_money(details.budget),
        revenue: format_money(details.revenue),
        production_companies: details
            .production_companies
            .iter()
            .take(MAX_COMPANIES)
            .map(|c| c.name.clone())
            .collect(),
        homepage: details.homepage.clone(),
        is_favorite,
        favorite_label: if is_favorite {
            "Remove from Favorites"
        } else {
            "Add to Favorites"
        },
        movie: details.summary(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotFoundPage {
    pub title: &'static str,
    pub message: &'static str,
    pub back_link: &'static str,
}

pub fn not_found_page() -> NotFoundPage {
    NotFoundPage {
        title: "Movie Not Found",
        message: "The movie you're looking for doesn't exist or couldn't be loaded.",
        back_link: "/",
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FavoritesPage {
    pub count: usize,
    pub summary: String,
    pub can_clear: bool,
    pub movies: Vec<MovieCard>,
}

pub fn favorites_page(favorites: &[Movie]) -> FavoritesPage {
    let count = favorites.len();
    let summary = match count {
        0 => "No favorite movies yet".to_string(),
        1 => "You have 1 favorite movie".to_string(),
        n => format!("You have {n} favorite movies"),
    };
    FavoritesPage {
        count,
        summary,
        can_clear: count > 0,
        movies: favorites.iter().map(|m| movie_card(m, true)).collect(),
    }
}
