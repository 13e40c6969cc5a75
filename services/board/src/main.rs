use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use board::{
    AppState,
    accounts::AccountService,
    board::MessageBoard,
    database::open_stores,
    hasher::CredentialHasher,
    jwt::{JwtConfig, JwtService},
    mailer::{MailerConfig, build_notifier},
    routes,
    settings::ServerConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting board service");

    let server_config = ServerConfig::from_env()?;
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let notifier = build_notifier(MailerConfig::from_env());

    let stores = open_stores(server_config.store_backend).await?;

    let accounts = AccountService::new(
        stores.accounts,
        notifier,
        CredentialHasher::default(),
        jwt_service.clone(),
        server_config.upgrade_code.clone(),
    );
    let board = MessageBoard::new(stores.messages);

    let app_state = AppState {
        accounts,
        board,
        jwt_service,
        cookie_secure: server_config.cookie_secure,
    };

    info!("Board service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&server_config.bind_address).await?;
    info!("Board service listening on {}", server_config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
