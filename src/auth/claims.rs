use serde::{Deserialize, Serialize};

/// JWT payload: the identity snapshot taken at issuance. Holds everything
/// downstream handlers need without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,               // user ID
    pub username: String,       // display name at issuance
    pub avatar: Option<String>, // profile picture URL at issuance
    pub iat: usize,             // issued at (unix timestamp)
    pub exp: usize,             // expires at (unix timestamp)
    pub iss: String,            // issuer
    pub aud: String,            // audience
}
