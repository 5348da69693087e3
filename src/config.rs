use std::{fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, anyhow};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub posts_per_page: u32,
    pub index_cache_ttl: Duration,
    pub media_dir: PathBuf,
    pub feedback_recipient: String,
    pub smtp: SmtpConfig,
    pub session_days: i64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Empty host means mail is only logged.
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://yatube.db?mode=rwc".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            posts_per_page: 10,
            index_cache_ttl: Duration::from_secs(20),
            media_dir: PathBuf::from("media"),
            feedback_recipient: "admin@yatube.local".to_owned(),
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: None,
                password: None,
            },
            session_days: 14,
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and the environment on top of the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();
        let defaults = Config::default();

        let posts_per_page = try_load("POSTS_PER_PAGE", defaults.posts_per_page)?;
        if posts_per_page == 0 {
            return Err(anyhow!("POSTS_PER_PAGE must be positive"));
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", defaults.database_url)?,
            bind_addr: try_load("BIND_ADDR", defaults.bind_addr)?,
            posts_per_page,
            index_cache_ttl: Duration::from_secs(try_load(
                "INDEX_CACHE_SECONDS",
                defaults.index_cache_ttl.as_secs(),
            )?),
            media_dir: PathBuf::from(try_load::<String>(
                "MEDIA_DIR",
                defaults.media_dir.to_string_lossy().into_owned(),
            )?),
            feedback_recipient: try_load("FEEDBACK_RECIPIENT", defaults.feedback_recipient)?,
            smtp: SmtpConfig {
                host: try_load("SMTP_HOST", defaults.smtp.host)?,
                port: try_load("SMTP_PORT", defaults.smtp.port)?,
                username: dotenv::var("SMTP_USERNAME").ok(),
                password: dotenv::var("SMTP_PASSWORD").ok(),
            },
            session_days: try_load("SESSION_DAYS", defaults.session_days)?,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {key} value {raw:?}")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
