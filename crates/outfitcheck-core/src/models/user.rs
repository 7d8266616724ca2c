//! Account and authentication payloads.

use serde::{Deserialize, Serialize};

/// Body of `POST /users/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login; the token is the only field the backend sends back
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST /users/register`
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Public profile of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "profilePicUrl", default)]
    pub profile_pic_url: Option<String>,
}

impl UserProfile {
    /// Name to show in lists: the username, else the email, else the id
    pub fn display_name(&self) -> String {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.email.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FollowStatus {
    pub following: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_backend_json() {
        let json = r#"{"id":3,"username":"ana","email":"ana@example.com","profilePicUrl":null}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, 3);
        assert_eq!(profile.display_name(), "ana");
        assert_eq!(profile.profile_pic_url, None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile = UserProfile {
            id: 9,
            username: Some(String::new()),
            email: Some("x@example.com".to_string()),
            profile_pic_url: None,
        };
        assert_eq!(profile.display_name(), "x@example.com");
        profile.email = None;
        assert_eq!(profile.display_name(), "user #9");
    }
}
