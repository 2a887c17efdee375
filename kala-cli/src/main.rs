use clap::{Parser, Subcommand};
use kala_common::{search_ready, QueryState};
use kala_core::models::{Artwork, LikeState};
use kala_core::{BackendClient, Config, GalleryService, Session};
use std::sync::Arc;
use tracing::{error, info, warn};

/// kala headless client: browse the community gallery from a terminal.
#[derive(Parser)]
#[command(name = "kala")]
struct Args {
    /// Access token of a signed-in user. Needed for likes.
    #[arg(long, env = "KALA_ACCESS_TOKEN", requires = "user_id")]
    access_token: Option<String>,

    /// Id of the signed-in user the access token belongs to.
    #[arg(long, env = "KALA_USER_ID")]
    user_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Page through the gallery.
    Browse {
        /// Free-text search over title, description and style.
        #[arg(long, default_value = "")]
        search: String,

        /// Only show this art style.
        #[arg(long, default_value = "")]
        style: String,

        /// Only show this region.
        #[arg(long, default_value = "")]
        region: String,

        /// How many pages to load.
        #[arg(long, default_value = "1")]
        pages: usize,
    },
    /// Show one artwork with its comments.
    Show { artwork_id: String },
    /// List the styles and regions available as filters.
    Filters,
    /// Community totals.
    Stats,
    /// Like or unlike an artwork.
    Like { artwork_id: String },
}

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    configure_logging();
    let args = Args::parse();

    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load config: {e}");
        std::process::exit(1);
    });
    info!("Using backend at {}", config.backend_url);

    let mut client = BackendClient::from_config(&config);
    if let (Some(token), Some(user_id)) = (args.access_token, args.user_id) {
        client.set_session(Some(Session::new(user_id, token)));
    }

    let result = match args.command {
        Command::Browse {
            search,
            style,
            region,
            pages,
        } => browse(client, &config, search, style, region, pages).await,
        Command::Show { artwork_id } => show(&client, &artwork_id).await,
        Command::Filters => filters(&client).await,
        Command::Stats => stats(&client).await,
        Command::Like { artwork_id } => like(&client, &artwork_id).await,
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

async fn browse(
    client: BackendClient,
    config: &Config,
    mut search: String,
    style: String,
    region: String,
    pages: usize,
) -> CliResult {
    if !search_ready(&search) {
        warn!("Search text needs at least 2 characters, ignoring {:?}", search);
        search.clear();
    }
    let query = QueryState::new()
        .with_search(search)
        .with_style(style)
        .with_region(region);

    let image_client = BackendClient::from_config(config);
    let gallery = GalleryService::start(Arc::new(client), config.page_size, config.fetch_timeout);

    gallery.set_query(query).await?;
    let mut snapshot = gallery.wait_until_idle().await?;
    let mut printed = 0;
    for page in 1..=pages.max(1) {
        if let Some(err) = &snapshot.last_error {
            error!("Loading page {page} failed: {err}");
            break;
        }
        for artwork in &snapshot.items[printed..] {
            print_artwork(&image_client, artwork);
        }
        printed = snapshot.items.len();

        if page == pages.max(1) || !gallery.request_more().await? {
            break;
        }
        snapshot = gallery.wait_until_idle().await?;
    }

    if snapshot.items.is_empty() {
        println!("No artworks found.");
    } else if !snapshot.has_more {
        println!("-- end of results ({} artworks) --", snapshot.items.len());
    }
    Ok(())
}

fn print_artwork(client: &BackendClient, artwork: &Artwork) {
    let tags: Vec<&str> = [artwork.style.as_deref(), artwork.region.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    println!(
        "{:>6}  {}  by {}  [{}]  {} likes\n        {}",
        artwork.id,
        artwork.title,
        artwork.artist_name(),
        tags.join(", "),
        artwork.like_count,
        client.public_image_url(&artwork.image_ref)
    );
}

async fn show(client: &BackendClient, artwork_id: &str) -> CliResult {
    let Some(artwork) = client.get_artwork(artwork_id).await? else {
        println!("Artwork {artwork_id} not found.");
        return Ok(());
    };
    print_artwork(client, &artwork);
    if let Some(description) = &artwork.description {
        println!("\n{description}");
    }

    let comments = client.list_comments(artwork_id).await?;
    println!("\n{} comments", comments.len());
    for comment in comments {
        let author = comment
            .user
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or("Anonymous");
        println!(
            "  {} ({}): {}",
            author,
            comment.created_at.format("%Y-%m-%d"),
            comment.content
        );
    }
    Ok(())
}

async fn filters(client: &BackendClient) -> CliResult {
    let options = client.filter_options().await?;
    println!("Styles:  {}", options.styles.join(", "));
    println!("Regions: {}", options.regions.join(", "));
    Ok(())
}

async fn stats(client: &BackendClient) -> CliResult {
    let stats = client.community_stats().await?;
    println!("Artworks: {}", stats.total_artworks);
    println!("Artists:  {}", stats.total_artists);
    println!("Regions:  {}", stats.total_regions);
    Ok(())
}

async fn like(client: &BackendClient, artwork_id: &str) -> CliResult {
    match client.toggle_like(artwork_id).await? {
        LikeState::Liked => println!("Liked artwork {artwork_id}"),
        LikeState::NotLiked => println!("Removed like from artwork {artwork_id}"),
    }
    Ok(())
}
