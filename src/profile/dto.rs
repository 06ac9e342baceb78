use serde::Serialize;

use crate::auth::dto::PublicUser;

/// Profile updates re-issue the token because the claims carry a snapshot
/// of the username and avatar.
#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub user: PublicUser,
    pub token: String,
}
