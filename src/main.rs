//! # Shelf Scanner CLI (`shelf`)
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the SQLite database and run schema migrations |
//! | `shelf providers` | Show which OCR, catalog, and storage backends are configured |
//! | `shelf scan <image>` | Scan a shelf photo and print titles, books, and recommendations |
//! | `shelf books list` | List stored books |
//! | `shelf books get <id>` | Show one stored book |
//! | `shelf bookmarks ...` | List, add, remove, or clear a user's bookmarks |
//! | `shelf serve` | Start the HTTP API server |
//!
//! ## Examples
//!
//! ```bash
//! shelf init --config ./config/shelf.toml
//! GOOGLE_VISION_API_KEY=... shelf scan ./photos/shelf.jpg --json
//! shelf books list --query dune
//! shelf bookmarks add --user user_1a2b3c4d <book-id>
//! shelf serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shelf_scanner::{bookmarks, books, config, logging, migrate, providers, scan_cmd, server};

/// Shelf Scanner CLI — identify the books in a shelf photo and recommend more.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Shelf Scanner — identify the books in a shelf photo and recommend more",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `books` and `bookmarks`
    /// tables. Running it more than once is safe.
    Init,

    /// Show configured providers and whether they are ready.
    Providers,

    /// Scan a shelf photo.
    ///
    /// Runs OCR on the image, looks up every candidate title, stores the
    /// books found, and prints recommendations.
    Scan {
        /// Path to a JPEG or PNG image.
        image: PathBuf,

        /// Print the raw JSON response instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Inspect stored books.
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },

    /// Manage a user's bookmarks.
    Bookmarks {
        #[command(subcommand)]
        action: BookmarksAction,
    },

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum BooksAction {
    /// List stored books, newest first.
    List {
        /// Only show books whose title contains this text (case-insensitive).
        #[arg(long)]
        query: Option<String>,

        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Show one stored book.
    Get {
        /// Book id.
        id: String,
    },
}

#[derive(Subcommand)]
enum BookmarksAction {
    /// List a user's bookmarks.
    List {
        #[arg(long)]
        user: String,
    },
    /// Bookmark a stored book.
    Add {
        #[arg(long)]
        user: String,
        /// Id of a stored book (see `shelf books list`).
        book_id: String,
    },
    /// Remove one bookmark.
    Remove {
        #[arg(long)]
        user: String,
        bookmark_id: String,
    },
    /// Remove all of a user's bookmarks.
    Clear {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Providers => {
            providers::list_providers(&cfg)?;
        }
        Commands::Scan { image, json } => {
            scan_cmd::run_scan(&cfg, &image, json).await?;
        }
        Commands::Books { action } => match action {
            BooksAction::List { query, limit } => {
                books::run_list(&cfg, query.as_deref(), limit).await?;
            }
            BooksAction::Get { id } => {
                books::run_get(&cfg, &id).await?;
            }
        },
        Commands::Bookmarks { action } => match action {
            BookmarksAction::List { user } => {
                bookmarks::run_list(&cfg, &user).await?;
            }
            BookmarksAction::Add { user, book_id } => {
                bookmarks::run_add(&cfg, &user, &book_id).await?;
            }
            BookmarksAction::Remove { user, bookmark_id } => {
                bookmarks::run_remove(&cfg, &user, &bookmark_id).await?;
            }
            BookmarksAction::Clear { user } => {
                bookmarks::run_clear(&cfg, &user).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
