//! Newsdesk Extract server and CLI
//!
//! Renders JavaScript-heavy news articles and returns their clean content.

use anyhow::Context;
use clap::{Parser, Subcommand};
use newsdesk_extract::browser::{BrowserController, BrowserRenderer};
use newsdesk_extract::server::{self, AppState};
use newsdesk_extract::{DomainRegistry, ExtractionPipeline, ResultCache, Settings};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Newsdesk article extraction
#[derive(Parser, Debug)]
#[command(name = "nd-extract")]
#[command(author = "Newsdesk Team")]
#[command(version)]
#[command(about = "Article extraction for JavaScript-rendered news sites")]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to Chrome/Chromium executable
    #[arg(long, global = true)]
    chrome_path: Option<String>,

    /// Run the browser headless (overrides NEWSDESK_HEADLESS)
    #[arg(long, global = true)]
    headless: Option<bool>,

    /// Disable the Chrome sandbox (needed in most containers)
    #[arg(long, global = true)]
    no_sandbox: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract one article and print it as JSON
    Extract {
        /// Article URL
        url: String,

        /// Registered domain to apply instead of hostname detection
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// List built-in domains
    Domains {
        /// Include selectors and wait strategy
        #[arg(long)]
        details: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut settings = Settings::from_env().context("invalid NEWSDESK_* environment")?;
    if let Some(path) = args.chrome_path.clone() {
        settings.chrome_path = Some(path);
    }
    if let Some(headless) = args.headless {
        settings.headless = headless;
    }

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            serve(settings, args.no_sandbox).await
        }
        Command::Extract { url, domain } => extract(settings, args.no_sandbox, &url, domain).await,
        Command::Domains { details } => {
            let registry = DomainRegistry::with_builtins();
            let output = if details {
                serde_json::to_string_pretty(&registry.list_details())?
            } else {
                serde_json::to_string_pretty(&registry.list_domains())?
            };
            println!("{}", output);
            Ok(())
        }
    }
}

async fn launch(settings: &Settings, no_sandbox: bool) -> anyhow::Result<Arc<BrowserController>> {
    let mut config = settings.browser_config();
    config.sandbox = !no_sandbox;
    let controller = BrowserController::with_config(config)
        .await
        .context("failed to launch browser")?;
    Ok(Arc::new(controller))
}

fn pipeline(
    settings: &Settings,
    controller: &Arc<BrowserController>,
) -> ExtractionPipeline<BrowserRenderer> {
    ExtractionPipeline::new(
        BrowserRenderer::new(Arc::clone(controller)),
        Arc::new(DomainRegistry::with_builtins()),
        Arc::new(ResultCache::new(settings.cache_ttl())),
    )
    .with_request_timeout(settings.request_timeout())
}

async fn serve(settings: Settings, no_sandbox: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Newsdesk Extract starting on {}:{} (pool_size={}, cache_ttl={}s)",
        settings.host,
        settings.port,
        settings.pool_size,
        settings.cache_ttl_secs
    );

    let controller = launch(&settings, no_sandbox).await?;
    let pipeline = Arc::new(pipeline(&settings, &controller));
    let sweeper = pipeline.cache().spawn_sweeper(settings.cache_ttl());

    let state = Arc::new(AppState::new(pipeline)?);
    let addr = format!("{}:{}", settings.host, settings.port);
    let served = server::serve(state, &addr, &settings.cors_origins).await;

    sweeper.abort();
    shutdown(controller).await;
    served.context("server failed")
}

async fn extract(
    settings: Settings,
    no_sandbox: bool,
    url: &str,
    domain: Option<String>,
) -> anyhow::Result<()> {
    let controller = launch(&settings, no_sandbox).await?;
    let outcome = {
        let pipeline = pipeline(&settings, &controller);
        pipeline.extract(url, domain.as_deref(), None).await
    };
    shutdown(controller).await;

    let result = outcome.with_context(|| format!("extraction failed for {}", url))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn shutdown(controller: Arc<BrowserController>) {
    match Arc::try_unwrap(controller) {
        Ok(controller) => {
            if let Err(e) = controller.close().await {
                tracing::warn!("Browser did not close cleanly: {}", e);
            }
        }
        Err(_) => tracing::warn!("Browser still in use at shutdown"),
    }
}
