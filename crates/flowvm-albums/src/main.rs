//! album-search: drive the album search screen from the command line.
//!
//! Each argument is treated as one keystroke-level update of the search box;
//! only the last query survives. The first hit is then opened through the
//! navigation event, like a tap on the result list.
//!
//! ```text
//! album-search k ku kuu kuuki
//! RUST_LOG=flowvm_core=debug album-search ocarina
//! ```

use std::sync::Arc;
use std::time::Duration;

use flowvm_albums::{
    album_results, query_intents, query_settled, AlbumScreen, DemoConfig, NavEvent, Screen,
    SearchIntent, SearchState, ViewEffect,
};
use flowvm_core::{ChannelSink, StateContainer};
use futures::stream::{self, StreamExt};

const DEFAULT_QUERY: &str = "kuuki";

// =============================================================================
// Screen Session
// =============================================================================

async fn run(config: DemoConfig, queries: Vec<String>) -> Result<(), String> {
    let service = config
        .service()
        .map_err(|e| format!("Catalog setup failed: {}", e))?;
    let last_query = queries.last().cloned().unwrap_or_default();

    let (sink, mut navigation) = ChannelSink::<NavEvent>::new();
    let container = AlbumScreen::new(Arc::new(service))
        .container()
        .config(config.container.clone())
        .event_sink(Arc::new(sink))
        .intent_source(query_intents(stream::iter(queries)))
        .spawn();
    tracing::info!("Container {} started", container.id());

    let mut effects = container.observe_effects();
    let toasts = tokio::spawn(async move {
        while let Some(ViewEffect::Toast(text)) = effects.next().await {
            println!("! {}", text);
        }
    });

    let mut results = album_results(&container);
    let printer = tokio::spawn(async move {
        while let Some(albums) = results.next().await {
            println!("{} album(s)", albums.len());
            for album in &albums {
                println!("  {}  {}", album.link, album.title());
            }
        }
    });

    let deadline = config.latency() * 4 + config.timeout().unwrap_or(Duration::from_secs(5));
    let state = tokio::time::timeout(deadline, query_settled(&container, &last_query))
        .await
        .map_err(|_| format!("No answer within {:?}", deadline))?
        .ok_or_else(|| "Container terminated".to_string())?;

    if let Some(first) = state.albums().first().cloned() {
        container
            .submit(SearchIntent::ClickAlbum { album: first })
            .map_err(|e| e.to_string())?;

        if let Some(NavEvent::Navigate(screen)) = navigation.recv().await {
            println!("-> {}", screen);
            if let Screen::Album { link } = screen {
                container
                    .submit(SearchIntent::ShowAlbum { link })
                    .map_err(|e| e.to_string())?;

                let state = settle(&container, deadline, |s| s.album.is_some()).await?;
                if let Some(album) = state.album {
                    println!("{} ({} cover(s))", album.name, album.covers.len());
                    for cover in &album.covers {
                        println!("  {}", cover.thumb);
                    }
                }
            }
        }
    }

    container.shutdown().await;
    // Observer streams end with the container
    let _ = toasts.await;
    let _ = printer.await;
    tracing::info!("Container {} shut down", container.id());
    Ok(())
}

async fn settle<F>(
    container: &StateContainer<AlbumScreen>,
    deadline: Duration,
    predicate: F,
) -> Result<SearchState, String>
where
    F: FnMut(&SearchState) -> bool,
{
    tokio::time::timeout(deadline, container.wait_for(predicate))
        .await
        .map_err(|_| format!("No answer within {:?}", deadline))?
        .ok_or_else(|| "Container terminated".to_string())
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match DemoConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut queries: Vec<String> = std::env::args().skip(1).collect();
    if queries.is_empty() {
        queries.push(DEFAULT_QUERY.to_string());
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run(config, queries)) {
        tracing::error!("Search session failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
