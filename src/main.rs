use clap::Parser;
use std::sync::Arc;
use vaultgate::bootstrap::run_bootstrap;
use vaultgate::cli::{Cli, Commands, ConfigAction, ServeOpts, StoreOpts};
use vaultgate::config::{validate_config_object, Config};
use vaultgate::gateway::{GatewayServer, GatewayState};
use vaultgate::logging;
use vaultgate::store::{HttpSecretStore, MemoryStore, SecretStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve(ServeOpts::default())) {
        Commands::Serve(opts) => serve(opts).await?,
        Commands::Bootstrap(opts) => {
            let config = load(opts.config.as_deref())?;
            let store = build_store(&config, opts.dev_store)?;
            let report = run_bootstrap(store.as_ref(), config.resolve_namespace(), &config).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_failed() {
                std::process::exit(1);
            }
        }
        Commands::Status(opts) => status(opts).await?,
        Commands::Config(opts) => {
            let config = load(opts.config.as_deref())?;
            match opts.action {
                ConfigAction::Show => {
                    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
                }
                ConfigAction::Validate => {
                    info!("Configuration is valid");
                }
            }
        }
        Commands::Version => {
            println!("vaultgate {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Load configuration, install logging, then validate.
fn load(path: Option<&str>) -> anyhow::Result<Config> {
    let source = Config::locate(path);
    let config = Config::load_from(source.as_deref())?;
    logging::init(&config.logging);
    match &source {
        Some(source) => info!("Loaded config from {}", source.display()),
        None => info!("No config file found; using defaults and environment"),
    }
    validate_config_object(&config)?;
    Ok(config)
}

fn build_store(config: &Config, dev_store: bool) -> anyhow::Result<Arc<dyn SecretStore>> {
    if dev_store {
        warn!("Using in-process development store; secrets are lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = HttpSecretStore::new(&config.store.address, config.request_timeout())?;
    info!("Secret store endpoint: {}", store.base_url());
    Ok(Arc::new(store))
}

async fn serve(opts: ServeOpts) -> anyhow::Result<()> {
    let config = load(opts.config.as_deref())?;
    let store = build_store(&config, opts.dev_store)?;
    let namespace = config.resolve_namespace();
    info!("Using namespace {}", namespace);

    // Bootstrap runs to completion first; its failure never stops the gateway.
    let report = run_bootstrap(store.as_ref(), namespace, &config).await;
    if report.is_failed() {
        warn!(
            "Bootstrap ended in {}; reads will fail until the store is brought to a healthy state",
            report.state
        );
    }

    let state = GatewayState::new(
        store,
        report.credentials(),
        config.request_timeout(),
        report.state,
    );
    let addr = config.socket_addr(opts.port, opts.bind.as_deref())?;
    GatewayServer::new(state, addr).run_until_shutdown().await
}

async fn status(opts: StoreOpts) -> anyhow::Result<()> {
    let config = load(opts.config.as_deref())?;
    let store = build_store(&config, opts.dev_store)?;

    let initialized = store.is_initialized().await?;
    let seal_state = store.seal_status().await?;
    let out = serde_json::json!({
        "address": config.store.address,
        "initialized": initialized,
        "sealState": seal_state,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
