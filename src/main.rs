// ABOUTME: Entry point for the eventhub binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and serves, lists, or runs the demo walkthrough.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use eventhub_core::{Category, Comment, Event, EventDraft, Group, User, create_category, create_group, create_user};
use eventhub_server::{AppState, ServerConfig, create_router};
use eventhub_store::{
    EventService, Persist, Repository, RepositoryFactory, StorageKind, Wishlist,
};
use tokio::signal;

/// Event catalogue with pluggable SQLite, XML and JSON persistence
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Storage backend: relational, xml or json (overrides EVENTHUB_STORAGE)
    #[arg(long, global = true)]
    storage: Option<String>,

    /// Data directory (overrides EVENTHUB_HOME)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Socket address to bind (overrides EVENTHUB_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print every stored event as a JSON field map
    List,
    /// Seed sample entities, post a comment and save a wishlist
    Demo {
        /// Simulated latency before the wishlist is written
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eventhub=debug,tower_http=debug")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env().context("loading configuration")?;
    if let Some(token) = &args.storage {
        config.store.kind = token.parse::<StorageKind>()?;
    }
    if let Some(dir) = args.data_dir {
        config.store.data_dir = dir;
    }

    tracing::info!(
        "eventhub starting with {} storage in {}",
        config.store.kind,
        config.store.data_dir.display()
    );
    let factory = RepositoryFactory::new(config.store.clone());

    match args.command {
        Command::Serve { bind } => {
            if let Some(raw) = bind {
                config.bind = eventhub_server::config::parse_bind(&raw)?;
            }
            serve(&factory, &config).await
        }
        Command::List => list(&factory),
        Command::Demo { delay_ms } => demo(&factory, Duration::from_millis(delay_ms)).await,
    }
}

async fn serve(factory: &RepositoryFactory, config: &ServerConfig) -> anyhow::Result<()> {
    let events = factory.create::<Event>()?;
    let app = create_router(Arc::new(AppState::new(Box::new(events))));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

fn list(factory: &RepositoryFactory) -> anyhow::Result<()> {
    let events = factory.create::<Event>()?;
    for event in events.get_all()? {
        println!("{}", event.to_record().to_json());
    }
    Ok(())
}

/// Add `entity` and read back the stored copy with its assigned ID.
fn ensure_stored<T: Persist>(repo: &impl Repository<T>, entity: T) -> anyhow::Result<T> {
    let id = repo.add(&entity)?;
    repo.get_by_id(id)?
        .with_context(|| format!("{} {} vanished after add", T::KIND, id))
}

async fn demo(factory: &RepositoryFactory, delay: Duration) -> anyhow::Result<()> {
    let groups = factory.create::<Group>()?;
    let users = factory.create::<User>()?;
    let categories = factory.create::<Category>()?;

    let group = ensure_stored(&groups, create_group("members", false, false, false))?;
    let user = ensure_stored(&users, create_user("Ann", "ann@example.com", group))?;
    let category = ensure_stored(&categories, create_category("Music", "Concerts and gigs"))?;

    let service = EventService::new(factory.create::<Event>()?, factory.create::<Comment>()?);

    let mut draft = EventDraft::new("Conf", user.clone(), category.clone());
    draft.description = "Talks and demos".to_string();
    draft.place = "Main hall".to_string();
    let event_id = service.add_event(&Event::new(0, draft))?;
    let comment = service.post_comment(event_id, user.clone(), "Looking forward to it")?;
    println!("posted comment {} at {}", comment.comment_id(), comment.date);

    let mut wishlist = Wishlist::new();
    for title in ["Open air", "Jazz night"] {
        let mut draft = EventDraft::new(title, user.clone(), category.clone());
        draft.place = "Park".to_string();
        wishlist.add_event(Event::new(0, draft));
    }
    for line in wishlist.lines() {
        println!("wishlist: {line}");
    }

    let ids = wishlist.save(service.events(), delay).await?;
    println!("saved wishlist events {ids:?}");
    println!("{} events stored", service.events().count()?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
