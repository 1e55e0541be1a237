use serde::Deserialize;

/// Login form. The login page posts the username under `email`; API clients
/// send `username`. Either is accepted, `username` wins when both are set.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn login_name(&self) -> &str {
        [&self.username, &self.email]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }
}

/// Registration form as posted by the registration page.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

