use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podfinder::{
    CATEGORIES, CatalogClient, Config, Episode, FavoriteEntry, FavoritesChange, FavoritesStore,
    Podcast, ReqwestClient, SortOrder, ThemePreference, format_date, format_duration,
    sort_podcasts, strip_html,
};

// Emoji with fallback for terminals without Unicode support
static RADIO: Emoji<'_, '_> = Emoji("📻 ", "");
static TRENDING: Emoji<'_, '_> = Emoji("📈 ", "[^] ");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static HEART: Emoji<'_, '_> = Emoji("❤️  ", "[+] ");
static BROKEN_HEART: Emoji<'_, '_> = Emoji("💔 ", "[-] ");
static PLAY: Emoji<'_, '_> = Emoji("▶️  ", "> ");
static MOON: Emoji<'_, '_> = Emoji("🌙 ", "[dark] ");
static SUN: Emoji<'_, '_> = Emoji("☀️  ", "[light] ");
static EMPTY: Emoji<'_, '_> = Emoji("🕳️  ", "[ ] ");
static REFRESH: Emoji<'_, '_> = Emoji("🔄 ", "[*] ");

/// Discover podcasts and keep a local list of favorites
#[derive(Parser, Debug)]
#[command(name = "podfinder")]
#[command(about = "Discover podcasts and keep a local list of favorites")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the podcast search API
    #[arg(long, global = true, env = "PODFINDER_BASE_URL")]
    base_url: Option<String>,

    /// Directory for favorites and preferences
    #[arg(long, global = true, env = "PODFINDER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Log requests and dropped records to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show trending podcasts (the home page)
    Trending {
        #[arg(short, long, default_value = "24")]
        limit: u32,
    },

    /// Browse a category; "All" shows trending podcasts
    Category {
        name: String,

        #[arg(short, long, default_value = "24")]
        limit: u32,
    },

    /// List the categories available for browsing
    Categories,

    /// Search podcasts by keyword
    Search {
        query: String,

        /// Result order: relevance, newest or popular
        #[arg(short, long, default_value = "relevance")]
        sort: SortOrder,

        #[arg(short, long, default_value = "50")]
        limit: u32,
    },

    /// Show podcast details and its latest episodes
    Show {
        id: String,

        /// Maximum number of episodes to list
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },

    /// Manage bookmarked podcasts
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Show or change the dark-mode preference
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeMode>,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// List saved podcasts
    List,
    /// Bookmark a podcast by id
    Add { id: String },
    /// Remove a bookmark by id
    Remove { id: String },
    /// Bookmark or unbookmark a podcast by id
    Toggle { id: String },
    /// Remove all bookmarks
    Clear,
    /// Report changes made by other podfinder processes until Ctrl-C
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeMode {
    On,
    Off,
    Toggle,
}

/// Everything a command needs, created once at startup
struct App {
    catalog: CatalogClient<ReqwestClient>,
    favorites: FavoritesStore,
    theme: ThemePreference,
    json: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("podfinder=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Show a spinner on stderr while `request` is pending
async fn with_spinner<F: Future>(app: &App, message: String, request: F) -> F::Output {
    if app.json {
        return request.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.magenta} {wide_msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = request.await;
    spinner.finish_and_clear();
    output
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut.trim_end())
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn print_podcasts(app: &App, heading: String, podcasts: &[Podcast], empty_hint: &str) -> Result<()> {
    if app.json {
        return print_json(&podcasts);
    }

    println!("\n{}\n", heading.bold());

    if podcasts.is_empty() {
        println!("  {EMPTY}{}\n", empty_hint.dimmed());
        return Ok(());
    }

    for (index, podcast) in podcasts.iter().enumerate() {
        let marker = if app.favorites.is_favorite(&podcast.collection_id.to_string()) {
            HEART.to_string()
        } else {
            String::new()
        };

        println!(
            "{:>4}. {}{}",
            (index + 1).to_string().cyan(),
            marker,
            truncate(&podcast.collection_name, 60).bold()
        );

        let mut details = Vec::new();
        if let Some(artist) = &podcast.artist_name {
            details.push(artist.clone());
        }
        if let Some(genre) = &podcast.primary_genre_name {
            details.push(genre.magenta().to_string());
        }
        if let Some(count) = podcast.track_count {
            details.push(format!("{count} episodes"));
        }
        details.push(format!("id {}", podcast.collection_id).dimmed().to_string());
        println!("      {}", details.join(" • "));
    }
    println!();
    Ok(())
}

fn print_episode(episode: &Episode) {
    println!("  {}", episode.track_name.bold());

    let mut details = Vec::new();
    if let Some(date) = &episode.release_date {
        details.push(format_date(date));
    }
    if let Some(millis) = episode.track_time_millis {
        details.push(format_duration(millis));
    }
    if !details.is_empty() {
        println!("    {}", details.join(" • ").dimmed());
    }

    if let Some(description) = &episode.description {
        let text = strip_html(description);
        if !text.is_empty() {
            println!("    {}", truncate(&text, 140));
        }
    }

    if let Some(preview) = &episode.preview_url {
        println!("    {PLAY}{}", preview.cyan());
    }
    println!();
}

async fn show_podcast(app: &App, id: &str, limit: u32) -> Result<()> {
    let (podcast, episodes) = with_spinner(
        app,
        format!("Loading podcast {id}..."),
        async {
            futures::join!(
                app.catalog.get_podcast_by_id(id),
                app.catalog.get_podcast_episodes(id, limit)
            )
        },
    )
    .await;

    let Some(podcast) = podcast else {
        eprintln!("{}", "Podcast not found".red().bold());
        std::process::exit(1);
    };
    let is_favorite = app.favorites.is_favorite(id);

    if app.json {
        return print_json(&serde_json::json!({
            "podcast": podcast,
            "episodes": episodes,
            "favorite": is_favorite,
        }));
    }

    println!("\n{HEADPHONES}{}", podcast.collection_name.bold().green());
    if let Some(artist) = &podcast.artist_name {
        println!("   by {}", artist.yellow());
    }

    let mut badges = Vec::new();
    if let Some(genre) = &podcast.primary_genre_name {
        badges.push(genre.magenta().to_string());
    }
    if let Some(count) = podcast.track_count {
        badges.push(format!("{count} episodes"));
    }
    if let Some(rating) = &podcast.content_advisory_rating {
        badges.push(rating.clone());
    }
    if let Some(date) = &podcast.release_date {
        badges.push(format!("updated {}", format_date(date)));
    }
    if !badges.is_empty() {
        println!("   {}", badges.join(" • "));
    }
    if let Some(link) = &podcast.collection_view_url {
        println!("   {}", link.cyan().underline());
    }
    println!(
        "   {}",
        if is_favorite {
            format!("{HEART}In your favorites").red().to_string()
        } else {
            format!("podfinder favorites add {id}").dimmed().to_string()
        }
    );

    println!("\n{} ({})\n", "Episodes".bold(), episodes.len());
    if episodes.is_empty() {
        println!("  {EMPTY}{}\n", "No episodes available for this podcast.".dimmed());
    }
    for episode in &episodes {
        print_episode(episode);
    }
    Ok(())
}

async fn favorites(app: &App, action: FavoritesAction) -> Result<()> {
    let json = app.json;
    let reader = app.favorites.clone();
    // Confirms changes the same way any other mounted view would learn of them
    let _status = app.favorites.on_change(move |change: &FavoritesChange| match change {
        FavoritesChange::External if json => {
            if let Ok(line) = serde_json::to_string(&reader.list()) {
                println!("{line}");
            }
        }
        _ if json => {}
        FavoritesChange::Added(id) => println!("{HEART}Added {} to favorites", id.cyan()),
        FavoritesChange::Removed(id) => {
            println!("{BROKEN_HEART}Removed {} from favorites", id.cyan())
        }
        FavoritesChange::Cleared => println!("{BROKEN_HEART}Cleared all favorites"),
        FavoritesChange::External => println!(
            "{REFRESH}Favorites changed elsewhere, {} saved now",
            reader.list().len().to_string().bold()
        ),
    });

    match action {
        FavoritesAction::List => {
            let entries = app.favorites.list();
            if json {
                return print_json(&entries);
            }

            let count = entries.len();
            println!(
                "\n{HEART}{} {}\n",
                "My Favorites".bold(),
                format!("({count} podcast{} saved)", if count == 1 { "" } else { "s" }).dimmed()
            );
            if entries.is_empty() {
                println!(
                    "  {EMPTY}{}\n",
                    "No favorites yet. Start exploring with `podfinder trending`.".dimmed()
                );
            }
            for entry in &entries {
                let artist = entry.artist.as_deref().unwrap_or("Unknown artist");
                println!("  {} {}", entry.title.bold(), format!("({})", entry.id).dimmed());
                println!("    {}", artist);
            }
        }
        FavoritesAction::Add { id } => {
            let entry = lookup_entry(app, &id).await?;
            if !app.favorites.add(entry).context("Failed to save favorites")? && !json {
                println!("{HEART}{} is already a favorite", id.cyan());
            }
        }
        FavoritesAction::Remove { id } => {
            if !app.favorites.remove(&id).context("Failed to save favorites")? && !json {
                println!("{} is not a favorite", id.cyan());
            }
        }
        FavoritesAction::Toggle { id } => {
            let entry = match app.favorites.list().into_iter().find(|e| e.id == id) {
                Some(entry) => entry,
                None => lookup_entry(app, &id).await?,
            };
            let now_favorite = app.favorites.toggle(entry).context("Failed to save favorites")?;
            if json {
                print_json(&serde_json::json!({ "id": id, "favorite": now_favorite }))?;
            }
        }
        FavoritesAction::Clear => {
            app.favorites.clear_all().context("Failed to save favorites")?;
        }
        FavoritesAction::Watch { interval } => {
            let _watch = app.favorites.watch_external(Duration::from_millis(interval));
            if !json {
                println!("{REFRESH}Watching favorites for changes, press Ctrl-C to stop");
            }
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
        }
    }
    Ok(())
}

async fn lookup_entry(app: &App, id: &str) -> Result<FavoriteEntry> {
    let podcast = with_spinner(
        app,
        format!("Looking up podcast {id}..."),
        app.catalog.get_podcast_by_id(id),
    )
    .await;

    match podcast {
        Some(podcast) => Ok(FavoriteEntry::from_podcast(&podcast)),
        None => bail!("Podcast {id} not found"),
    }
}

fn theme(app: &App, mode: Option<ThemeMode>) -> Result<()> {
    let dark = match mode {
        None => app.theme.is_dark(),
        Some(ThemeMode::On) => {
            app.theme.set_dark(true).context("Failed to save theme")?;
            true
        }
        Some(ThemeMode::Off) => {
            app.theme.set_dark(false).context("Failed to save theme")?;
            false
        }
        Some(ThemeMode::Toggle) => app.theme.toggle().context("Failed to save theme")?,
    };

    if app.json {
        return print_json(&serde_json::json!({ "darkMode": dark }));
    }
    if dark {
        println!("{MOON}Dark mode is {}", "on".bold());
    } else {
        println!("{SUN}Dark mode is {}", "off".bold());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::resolve(args.base_url.as_deref(), args.data_dir.clone())
        .context("Invalid configuration")?;

    let app = App {
        catalog: CatalogClient::with_config(ReqwestClient::new(), config.catalog_config()),
        favorites: FavoritesStore::open(config.storage()),
        theme: ThemePreference::open(config.storage()),
        json: args.json,
    };

    if !app.json {
        println!("\n{}{}", RADIO, "PodFinder".bold().magenta());
    }

    match args.command {
        Command::Trending { limit } => {
            let podcasts = with_spinner(
                &app,
                "Fetching trending podcasts...".to_string(),
                app.catalog.get_trending_podcasts(limit),
            )
            .await;
            print_podcasts(
                &app,
                format!("{TRENDING}Trending Podcasts"),
                &podcasts,
                "No podcasts found. Try a different category.",
            )?;
        }

        Command::Category { name, limit } => {
            let podcasts = with_spinner(
                &app,
                format!("Browsing {name}..."),
                app.catalog.browse(&name, limit),
            )
            .await;
            let heading = if name.eq_ignore_ascii_case(CATEGORIES[0]) {
                format!("{TRENDING}Trending Podcasts")
            } else {
                format!("{TRENDING}{name} Podcasts")
            };
            print_podcasts(
                &app,
                heading,
                &podcasts,
                "No podcasts found. Try a different category.",
            )?;
        }

        Command::Categories => {
            if app.json {
                print_json(&CATEGORIES)?;
            } else {
                println!();
                for category in CATEGORIES {
                    println!("  {}", category.cyan());
                }
                println!();
            }
        }

        Command::Search { query, sort, limit } => {
            let mut podcasts = with_spinner(
                &app,
                format!("{SEARCH}Searching for \"{query}\"..."),
                app.catalog.search_podcasts(&query, limit),
            )
            .await;
            sort_podcasts(&mut podcasts, sort);

            print_podcasts(
                &app,
                format!(
                    "{SEARCH}Results for \"{}\" ({} found, sorted by {sort})",
                    query.magenta(),
                    podcasts.len()
                ),
                &podcasts,
                "No results found. Try searching with different keywords.",
            )?;
        }

        Command::Show { id, limit } => show_podcast(&app, &id, limit).await?,

        Command::Favorites { action } => {
            favorites(&app, action.unwrap_or(FavoritesAction::List)).await?
        }

        Command::Theme { mode } => theme(&app, mode)?,
    }

    Ok(())
}
