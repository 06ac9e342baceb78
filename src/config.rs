use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    /// When true, the auth gate re-reads the user row on every request
    /// instead of trusting the decoded claim until it expires.
    pub reverify: bool,
}

/// Google OAuth credentials. Absent when the deployment has no Google
/// sign-in configured; the auth routes answer 503 in that case.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub google: Option<GoogleConfig>,
    /// Client page that picks the token out of the query string.
    pub client_success_url: String,
    /// Client login page, used when the provider denies authentication.
    pub client_failure_url: String,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "meetyourband".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "meetyourband-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            reverify: std::env::var("JWT_REVERIFY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        };

        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(GoogleConfig {
                    client_id,
                    client_secret,
                    redirect_url: std::env::var("GOOGLE_REDIRECT_URL").unwrap_or_else(|_| {
                        "http://localhost:8080/api/auth/google/callback".into()
                    }),
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt,
            google,
            client_success_url: std::env::var("CLIENT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:5173/auth/callback".into()),
            client_failure_url: std::env::var("CLIENT_FAILURE_URL")
                .unwrap_or_else(|_| "http://localhost:5173/login".into()),
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
        })
    }
}
