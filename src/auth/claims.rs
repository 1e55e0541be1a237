use serde::{Deserialize, Serialize};

/// JWT payload carried in the session cookie.
///
/// `sub` and `id` are optional on the way in: a correctly signed token that
/// lacks either one is treated as anonymous rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<String>, // username
    pub id: Option<i64>,     // user ID
    pub exp: usize,          // expires at (unix timestamp)
}

/// Who the caller is, as recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub id: i64,
}

impl Claims {
    pub fn identity(self) -> Option<Identity> {
        Some(Identity {
            username: self.sub?,
            id: self.id?,
        })
    }
}
