use std::str::FromStr;
use std::time::Duration;

pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_cli_or_env(cli_arg: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else {
            "sqlite::memory:".to_string()
        };

        // every connection to :memory: opens its own database, so an
        // in-memory url must not be pooled
        let max_connections = if url.contains(":memory:") { 1 } else { 20 };

        Self {
            url,
            max_connections,
        }
    }

    pub async fn create_pool(&self) -> Result<sqlx::SqlitePool, sqlx::Error> {
        let options = sqlx::sqlite::SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(options)
            .await
    }
}
