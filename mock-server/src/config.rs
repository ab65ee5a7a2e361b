use std::env;

/// Mock backend settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_origins: parse_origins("http://localhost:5173,http://localhost:3000"),
            environment: "development".to_string(),
        }
    }
}

impl MockConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_origins),
            environment: env::var("NODE_ENV").unwrap_or(defaults.environment),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
