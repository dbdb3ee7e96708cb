//! Fetch TMDB data and print the view models the server would return.
//! Usage:
//!   cargo run --bin tmdb_props -- movie <tmdb_id>
//!   cargo run --bin tmdb_props -- search <title>
//!   cargo run --bin tmdb_props -- list <trending|popular|top_rated>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinescope::models::Movie;
use cinescope::tmdb::{TmdbApi, TmdbClient, TMDB_BASE};
use cinescope::view;
use dotenvy::dotenv;
use serde_json::Value;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Movie,
    Search,
    List,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(Command::Movie),
            "search" => Ok(Command::Search),
            "list" => Ok(Command::List),
            _ => Err(anyhow::anyhow!("command must be 'movie', 'search' or 'list'")),
        }
    }
}

fn cards(movies: &[Movie]) -> Result<Value> {
    let cards: Vec<_> = movies.iter().map(|m| view::movie_card(m, false)).collect();
    Ok(serde_json::to_value(cards)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let mut args = env::args().skip(1);
    let command: Command = args
        .next()
        .context("usage: tmdb_props <movie|search|list> <arg>")?
        .parse()?;
    let arg = args.collect::<Vec<_>>().join(" ");
    if arg.is_empty() {
        anyhow::bail!("missing argument for {:?}", command);
    }

    let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
    let base = env::var("TMDB_BASE_URL").unwrap_or_else(|_| TMDB_BASE.to_string());
    let client = TmdbClient::new(api_key, base)?;

    let output = match command {
        Command::Movie => {
            let id: i32 = arg.parse().context("movie id must be numeric")?;
            let (details, credits) =
                tokio::join!(client.fetch_details(id), client.fetch_credits(id));
            let details = details?;
            let credits = credits.ok();
            serde_json::to_value(view::detail_page(&details, credits.as_ref(), false))?
        }
        Command::Search => cards(&client.search_by_title(&arg).await?)?,
        Command::List => {
            let movies = match arg.as_str() {
                "trending" => client.fetch_trending().await?,
                "popular" => client.fetch_popular().await?,
                "top_rated" => client.fetch_top_rated().await?,
                other => anyhow::bail!("unknown list '{}'", other),
            };
            cards(&movies)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
