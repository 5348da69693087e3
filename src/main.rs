use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use yatube::{AppState, Config, app, db, mail};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yatube=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let db_pool = db::connect(&config.database_url).await?;
    let mailer = mail::from_config(&config.smtp)?;
    tokio::fs::create_dir_all(&config.media_dir).await?;

    let bind_addr = config.bind_addr.clone();
    let app = app(AppState::new(db_pool, config, mailer));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
