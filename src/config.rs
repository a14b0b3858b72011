//! Runtime configuration read from the environment (and `.env`).

use std::env;

use thiserror::Error;

use crate::pdf::job::MAX_SCALE;
use crate::pdf::raster::DEFAULT_RASTERIZER_BIN;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:8080",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// HS256 secret of the auth provider. Without it every token is rejected.
    pub jwt_secret: Option<String>,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub rasterizer_bin: String,
    pub default_scale: f32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url =
            get("SUPABASE_DATABASE_URL").ok_or(ConfigError::Missing("SUPABASE_DATABASE_URL"))?;

        let jwt_secret = get("SUPABASE_JWT_SECRET");
        if jwt_secret.is_none() {
            log::warn!("SUPABASE_JWT_SECRET not set, authenticated endpoints will reject every request");
        }

        let port = match get("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let default_scale = match get("PDF_DEFAULT_SCALE") {
            Some(value) => match value.parse::<f32>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 && scale <= MAX_SCALE => scale,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "PDF_DEFAULT_SCALE",
                        value,
                    })
                }
            },
            None => 1.0,
        };

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            allowed_origins,
            rasterizer_bin: get("RASTERIZER_BIN")
                .unwrap_or_else(|| DEFAULT_RASTERIZER_BIN.to_string()),
            default_scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            config(&[]),
            Err(ConfigError::Missing("SUPABASE_DATABASE_URL"))
        ));
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("SUPABASE_DATABASE_URL", "postgres://localhost/app")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.rasterizer_bin, "wkhtmltoimage");
        assert_eq!(cfg.default_scale, 1.0);
        assert!(cfg.jwt_secret.is_none());
        assert_eq!(cfg.allowed_origins.len(), 3);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("SUPABASE_DATABASE_URL", "postgres://db"),
            ("SUPABASE_JWT_SECRET", "s3cret"),
            ("PORT", "9000"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("PDF_DEFAULT_SCALE", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(cfg.default_scale, 2.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = config(&[("SUPABASE_DATABASE_URL", "x"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value 'eighty' for PORT");
        assert!(config(&[("SUPABASE_DATABASE_URL", "x"), ("PDF_DEFAULT_SCALE", "9")]).is_err());
    }
}
