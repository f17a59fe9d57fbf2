use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bench_core::Provider;
use browser_agent::LlmFactory;
use clap::{Parser, Subcommand};
use server::config::{ServiceConfig, DEFAULT_CONFIG_FILE};
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "webbench")]
#[command(about = "Run one browser task across several language models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path of the TOML config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Overrides `[server] port` from the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the configured model lineup
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => serve(&cli.config, port).await,
        Some(Commands::Init { force }) => init_config(&cli.config, force).await,
        Some(Commands::Models) => list_models(&cli.config).await,
        None => serve(&cli.config, None).await,
    }
}

async fn load_config(path: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::read(path).await;
    config.apply_env();
    config
}

async fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Pass --force to overwrite it.");
        return Ok(());
    }

    ServiceConfig::default()
        .write(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Export OPENAI_API_KEY and ANTHROPIC_API_KEY");
    println!("  2. Point [agent] url at the browser agent service");
    println!("  3. Run 'webbench serve'");

    Ok(())
}

async fn list_models(path: &Path) -> Result<()> {
    let config = load_config(path).await;
    let llm = LlmFactory::from_env();

    if config.models.is_empty() {
        println!("No models configured.");
        return Ok(());
    }

    println!("Models ({}), in execution order:", config.models.len());
    for model in &config.models {
        let key = match Provider::parse(&model.provider) {
            Ok(provider) if llm.has_credential(provider) => "●",
            Ok(_) => "○ missing key",
            Err(_) => "? unsupported provider",
        };
        println!(
            "  {:<20} {:<10} {:<30} {}",
            model.id, model.provider, model.model, key
        );
    }

    Ok(())
}

async fn serve(path: &Path, port: Option<u16>) -> Result<()> {
    init_tracing();

    let mut config = load_config(path).await;
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialise storage")?;
    let storage = state.storage_backend;
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        models = config.models.len(),
        storage,
        "Benchmark API listening"
    );

    println!();
    println!("Website benchmark API");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://localhost:{}", config.server.port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", config.server.port);
    println!("  Agent:       {}", config.agent.url);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "webbench=info,server=info,orchestrator=info,browser_agent=info,db=info,tower_http=info"
                    .into()
            }),
        )
        .init();
}
