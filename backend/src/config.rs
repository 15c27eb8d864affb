use anyhow::Context;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub listen_addr: String,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters for security");
        }
        if jwt_secret.contains("change_me") {
            anyhow::bail!("JWT_SECRET contains placeholder value; set a real secret before running");
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got {other:?}"),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret,
            jwt_expiry_hours: lookup("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|| "12".into())
                .parse()
                .context("JWT_EXPIRY_HOURS must be a number")?,
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:8080".into()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:5173".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "20".into())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a number")?,
            log_format,
        })
    }
}
