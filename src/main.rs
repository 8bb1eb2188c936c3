use clap::Parser;
use dashboard_relay::{
    AppState, Server,
    auth::{
        AccountDirectory, Authenticator, InMemoryAccountDirectory, JwtAuthenticator,
        RemoteAuthenticator,
    },
    config::{AuthMode, Config},
    store::InMemoryMessageStore,
    websocket::Hub,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dashboard_relay=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn authenticator(
    config: &Config,
    accounts: Arc<dyn AccountDirectory>,
) -> Result<Arc<dyn Authenticator>, Box<dyn std::error::Error>> {
    let authenticator: Arc<dyn Authenticator> = match config.auth_mode {
        AuthMode::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .ok_or("RELAY_JWT_SECRET must be set in jwt mode")?;
            Arc::new(JwtAuthenticator::new(secret.as_bytes(), accounts))
        }
        AuthMode::Remote => {
            let endpoint = config
                .auth_endpoint
                .clone()
                .ok_or("RELAY_AUTH_ENDPOINT must be set in remote mode")?;
            Arc::new(RemoteAuthenticator::new(endpoint))
        }
    };
    Ok(authenticator)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(config.json_logs);

    let accounts: Arc<dyn AccountDirectory> = Arc::new(InMemoryAccountDirectory::new());
    let state = AppState::new(
        Hub::spawn(config.hub_capacity),
        authenticator(&config, accounts.clone())?,
        accounts,
        Arc::new(InMemoryMessageStore::new()),
        config.admin_token.clone(),
    )
    .with_rate_limit(config.rate_limit_count, config.rate_limit_window())
    .with_limits(config.connection_limits());

    tracing::info!(
        auth_mode = ?config.auth_mode,
        port = config.port,
        "starting dashboard relay"
    );

    Server::new(state, config.listen_addr()).run().await
}
