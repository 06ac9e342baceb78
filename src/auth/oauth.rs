use anyhow::Context;
use serde::Deserialize;

use crate::config::GoogleConfig;

/// Identity proof returned by Google once the code exchange completes.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    /// Google subject id, stable per account.
    pub id: String,
    /// Display name, used as the username for first-time sign-ins.
    pub name: String,
    pub email: Option<String>,
}

/// Google OAuth2 authorization-code flow, done directly against the
/// provider endpoints.
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }

    /// Consent-page URL the client is redirected to.
    pub fn authorization_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "profile email"),
            ("state", state),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("https://accounts.google.com/o/oauth2/v2/auth?{query}")
    }

    /// Trade the callback code for the user's profile.
    pub async fn exchange_code(&self, code: &str) -> anyhow::Result<GoogleProfile> {
        let client = reqwest::Client::new();

        let token: TokenResponse = client
            .post("https://oauth2.googleapis.com/token")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("exchange authorization code")?
            .error_for_status()
            .context("token endpoint rejected the code")?
            .json()
            .await
            .context("parse token response")?;

        let info: UserInfo = client
            .get("https://www.googleapis.com/oauth2/v3/userinfo")
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("fetch user info")?
            .error_for_status()
            .context("userinfo endpoint rejected the token")?
            .json()
            .await
            .context("parse user info")?;

        Ok(GoogleProfile {
            name: info.name.unwrap_or_else(|| "musician".to_string()),
            id: info.sub,
            email: info.email,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_service() -> GoogleOAuth {
        GoogleOAuth::new(&GoogleConfig {
            client_id: "test-client".into(),
            client_secret: "shh".into(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".into(),
        })
    }

    #[test]
    fn authorization_url_carries_required_params() {
        let url = make_service().authorization_url("abc123");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=profile%20email"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
    }

    #[test]
    fn authorization_url_encodes_state() {
        let url = make_service().authorization_url("a b&c");
        assert!(url.contains("state=a%20b%26c"));
    }
}
