/// Cookie-backed user sessions
///
/// The session is a small JSON document stored in a single signed cookie.
/// The signing key is derived from the database secret, so sessions survive
/// restarts but cannot be forged.
use crate::error::{GistError, GistResult};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "default";

/// Build the cookie signing key from the database secret
pub fn signing_key(secret: &[u8]) -> GistResult<Key> {
    Key::try_from(secret)
        .map_err(|e| GistError::Internal(format!("Invalid session secret: {}", e)))
}

/// Values stored in a user's session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// OAuth state issued by the login redirect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_state: Option<String>,
}

impl Session {
    /// Read the session from the request cookies.
    ///
    /// Missing, unsigned or undecodable cookies yield an empty session.
    pub fn load(jar: &SignedCookieJar) -> Self {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| URL_SAFE_NO_PAD.decode(cookie.value()).ok())
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    /// Write the session into the cookie jar
    pub fn save(&self, jar: SignedCookieJar) -> GistResult<SignedCookieJar> {
        let json = serde_json::to_vec(self)
            .map_err(|e| GistError::Internal(format!("Failed to encode session: {}", e)))?;

        let cookie = Cookie::build((SESSION_COOKIE, URL_SAFE_NO_PAD.encode(json)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);

        Ok(jar.add(cookie))
    }

    /// Remove the session cookie
    pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }

    /// True if there is a user attached to the session
    pub fn authenticated(&self) -> bool {
        self.user_id.map(|id| id != 0).unwrap_or(false)
    }

    /// User id on the session, 0 if anonymous
    pub fn user_id(&self) -> i64 {
        self.user_id.unwrap_or(0)
    }
}
