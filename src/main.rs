use std::sync::Arc;

use tracing::{error, info};

use confab::{Config, Directory, Dispatcher, Limits, RpcServer, WebServer};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONFAB_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = confab::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        confab::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Confab chat directory");

    let directory = Arc::new(Directory::with_rooms(
        config.directory.default_rooms.iter().cloned(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        directory,
        Limits::from(&config.directory),
    ));

    let server = match RpcServer::bind(&config.server).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind RPC server: {}", e);
            std::process::exit(1);
        }
    };

    if config.web.enabled {
        match WebServer::new(&config.web, Arc::clone(&dispatcher)) {
            Ok(web) => {
                tokio::spawn(async move {
                    if let Err(e) = web.run().await {
                        error!("Web server error: {}", e);
                    }
                });
            }
            Err(e) => error!("Web server disabled: {}", e),
        }
    }

    tokio::select! {
        result = server.run(dispatcher) => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }
}
