//! CLI command implementations

use anyhow::Context;
use clap::Subcommand;
use trove_core::TroveConfig;
use trove_search::{
    Category, ContentRecord, DataSource, FetchMode, SearchDispatcher, SearchOptions,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Search one content category
    Search {
        /// Content type: book, video, game, music or certificate
        content_type: String,
        /// Search text; "<title> - <author>" narrows book searches
        query: String,
        /// 1-indexed result page
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Ask the global book provider first
        #[arg(long)]
        prefer_secondary: bool,
        /// Query both book providers at once
        #[arg(long)]
        concurrent: bool,
        /// Print persistence-ready records instead of search results
        #[arg(long)]
        records: bool,
    },
    /// Look a book up by ISBN or Google Books volume id
    Isbn {
        /// ISBN-10, ISBN-13 or volume id
        id: String,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the configuration, provider or serialization failure of the
/// command that ran
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    let config = TroveConfig::from_env().context("Invalid configuration")?;
    tracing::debug!("Loaded configuration: {config:?}");

    match command {
        Commands::Search {
            content_type,
            query,
            page,
            prefer_secondary,
            concurrent,
            records,
        } => {
            let fetch_mode = if concurrent {
                FetchMode::Concurrent
            } else {
                FetchMode::Sequential
            };
            let options = SearchOptions { prefer_secondary };
            search(&config, &content_type, &query, page, options, fetch_mode, records).await
        }
        Commands::Isbn { id } => lookup(&config, &id).await,
    }
}

/// Run one search and print the page as JSON
///
/// # Errors
/// - `SearchError::UnsupportedContentType` - Unknown content type
/// - `SearchError::ProviderUnavailable` - Provider failed
/// - `SearchError::MissingCredentials` - Provider not configured
pub async fn search(
    config: &TroveConfig,
    content_type: &str,
    query: &str,
    page: u32,
    options: SearchOptions,
    fetch_mode: FetchMode,
    records: bool,
) -> anyhow::Result<()> {
    let category: Category = content_type.parse()?;
    let dispatcher = SearchDispatcher::new(config)?.with_fetch_mode(fetch_mode);

    let result = if category == Category::Certificate {
        let found = dispatcher.search_certificates(query, page).await;
        if let DataSource::LocalFallback { reason } = &found.source {
            eprintln!("Note: certificate registry unavailable ({reason:?}), showing local data");
        }
        found.result
    } else {
        dispatcher
            .search_category(category, query, page, options)
            .await
            .with_context(|| format!("{category} search for '{query}' failed"))?
    };

    let output = if records {
        let records: Vec<ContentRecord> = result.items.iter().map(ContentRecord::from).collect();
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{output}");

    Ok(())
}

/// Look up a single book and print it
///
/// # Errors
/// - `SearchError::ProviderUnavailable` - Lookup provider failed
pub async fn lookup(config: &TroveConfig, id: &str) -> anyhow::Result<()> {
    let dispatcher = SearchDispatcher::new(config)?;

    match dispatcher.lookup_book(id).await? {
        Some(book) => println!("{}", serde_json::to_string_pretty(&book)?),
        None => println!("No book found for '{id}'"),
    }

    Ok(())
}
