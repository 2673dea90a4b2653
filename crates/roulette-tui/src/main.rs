mod action;
mod app;
mod app_state;
mod component;
mod components;
mod fields;
mod focus;
mod plain;
mod render;
mod theme;
mod view;
mod widgets;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use roulette_core::{
    platform, share, Config, FileStore, HttpBackend, MemoryStore, Orchestrator, ProtocolKind,
    Store,
};

/// Pick a random film from one or more Letterboxd lists.
#[derive(Parser, Debug)]
#[command(name = "roulette", version, about, long_about = None)]
struct Cli {
    /// List URLs to seed the form with (up to five). Starts a pick immediately.
    urls: Vec<String>,

    /// Shared link carrying list URLs in its query (`?urls=a,b&list=c`).
    #[arg(long)]
    link: Option<String>,

    /// Print one pick to stdout instead of opening the terminal UI.
    #[arg(long)]
    plain: bool,

    /// Backend base URL (overrides `api.base_url`).
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Backend protocol: `multi-step` or `single-call` (overrides `api.protocol`).
    #[arg(long, value_name = "KIND")]
    protocol: Option<String>,

    /// Keep history and recent lists in memory only.
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    if cli.plain {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(log_filter.as_str())
            .init();
    } else {
        let log_path = data_dir.join("roulette.log");
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_env_filter(log_filter.as_str())
            .with_ansi(false)
            .init();
        // Print log path to stderr so the operator can tail it immediately.
        eprintln!("roulette log: {}", log_path.display());
    }

    tracing::info!("roulette starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {:#}", e);
        Config::default()
    });
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(protocol) = cli.protocol.as_deref() {
        config.api.protocol = protocol.parse::<ProtocolKind>()?;
    }

    // ── Seed URLs ────────────────────────────────────────────────────────────
    let max = config.ui.max_slots;
    let mut seed: Vec<String> = match cli.link.as_deref() {
        Some(link) => share::urls_from_link(link, max)
            .with_context(|| format!("reading shared link {}", link))?,
        None => Vec::new(),
    };
    for url in cli.urls {
        let url = url.trim().to_string();
        if !url.is_empty() && !seed.contains(&url) {
            seed.push(url);
        }
    }
    seed.truncate(max);

    // ── Wiring ───────────────────────────────────────────────────────────────
    let backend = Arc::new(HttpBackend::new(&config.api)?);
    let orchestrator = Arc::new(Orchestrator::new(backend, &config));
    let store: Arc<dyn Store> = if cli.no_save {
        Arc::new(MemoryStore::new(&config.storage))
    } else {
        Arc::new(FileStore::new(&config.storage))
    };

    if cli.plain {
        return plain::run(&orchestrator, store.as_ref(), seed).await;
    }

    let app = app::App::new(config, orchestrator, store, seed);
    app.run().await?;

    Ok(())
}
