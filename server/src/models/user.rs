use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::rules::optional_http_url;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// A validated registration, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub location: String,
    pub profile_picture: String,
}

impl Profile {
    pub fn apply(&mut self, changes: ProfileChanges) {
        if let Some(full_name) = changes.full_name {
            self.full_name = full_name;
        }
        if let Some(bio) = changes.bio {
            self.bio = bio;
        }
        if let Some(location) = changes.location {
            self.location = location;
        }
        if let Some(profile_picture) = changes.profile_picture {
            self.profile_picture = profile_picture;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileChanges {
    #[garde(length(chars, max = 255))]
    pub full_name: Option<String>,
    #[garde(skip)]
    pub bio: Option<String>,
    #[garde(length(chars, max = 255))]
    pub location: Option<String>,
    #[garde(length(chars, max = 200), custom(optional_http_url))]
    pub profile_picture: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "trimmed")]
    #[garde(length(chars, min = 1, max = 150), pattern(r"^[\w.@+-]+$"))]
    pub username: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[garde(email)]
    pub email: Option<String>,
    #[garde(custom(confirmed_by(&self.password2)), length(min = 1))]
    pub password: String,
    #[garde(skip)]
    pub password2: String,
    #[serde(default)]
    #[garde(length(chars, max = 150))]
    pub first_name: Option<String>,
    #[serde(default)]
    #[garde(length(chars, max = 150))]
    pub last_name: Option<String>,
}

fn confirmed_by(confirmation: &str) -> impl FnOnce(&str, &()) -> garde::Result + '_ {
    move |password, _| {
        if password != confirmation {
            return Err(garde::Error::new("Password fields didn't match."));
        }
        Ok(())
    }
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Registration fields that passed validation; the password is still plain text.
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl ValidRegistration {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash,
        }
    }
}

impl From<RegisterRequest> for ValidRegistration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email.unwrap_or_default(),
            first_name: req.first_name.unwrap_or_default(),
            last_name: req.last_name.unwrap_or_default(),
            password: req.password,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(password: &str, password2: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "username": "  alice ",
            "email": "alice@example.com",
            "password": password,
            "password2": password2,
        }))
        .unwrap()
    }

    fn messages(report: &garde::Report) -> Vec<(String, String)> {
        report
            .iter()
            .map(|(path, error)| (path.to_string(), error.to_string()))
            .collect()
    }

    #[test]
    fn test_password_mismatch_names_password_field() {
        let report = register("secret-1", "secret-2").validate(&()).unwrap_err();
        assert_eq!(
            messages(&report),
            vec![(
                "password".to_string(),
                "Password fields didn't match.".to_string()
            )]
        );
    }

    #[test]
    fn test_matching_passwords_pass() {
        let req = register("secret-1", "secret-1");
        assert!(req.validate(&()).is_ok());
        let valid = ValidRegistration::from(req);
        assert_eq!(valid.username, "alice");
        assert_eq!(valid.first_name, "");
    }

    #[test]
    fn test_invalid_emails_rejected() {
        for email in ["not-an-email", "a@b@example.com", "alice@"] {
            let mut req = register("pw", "pw");
            req.email = Some(email.to_string());
            let report = req.validate(&()).unwrap_err();
            assert_eq!(messages(&report)[0].0, "email", "{email} should be rejected");
        }
    }

    #[test]
    fn test_blank_email_is_omitted() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "   ",
            "password": "pw",
            "password2": "pw",
        }))
        .unwrap();
        assert_eq!(req.email, None);
        assert!(req.validate(&()).is_ok());
    }

    #[test]
    fn test_username_rules() {
        let mut req = register("pw", "pw");
        req.username = "bad name".to_string();
        assert!(req.validate(&()).is_err());

        req.username = "x".repeat(151);
        assert!(req.validate(&()).is_err());

        req.username = "ada.lovelace+1@home".to_string();
        assert!(req.validate(&()).is_ok());
    }

    #[test]
    fn test_profile_picture_must_be_http_url() {
        let picture = |url: &str| ProfileChanges {
            profile_picture: Some(url.to_string()),
            ..Default::default()
        };
        assert!(picture("ftp://example.com/a.png").validate(&()).is_err());
        assert!(picture("http://:::/").validate(&()).is_err());
        assert!(picture("https://example.com/a.png").validate(&()).is_ok());
        assert!(picture("").validate(&()).is_ok());
    }

    #[test]
    fn test_profile_length_limits() {
        let changes = ProfileChanges {
            full_name: Some("é".repeat(255)),
            location: Some("x".repeat(256)),
            ..Default::default()
        };
        let report = changes.validate(&()).unwrap_err();
        assert_eq!(messages(&report).len(), 1);
        assert_eq!(messages(&report)[0].0, "location");
    }
}
