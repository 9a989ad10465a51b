use std::collections::HashMap;

use serde::Deserialize;

/// GET `/` service info.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    pub message: String,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

/// POST `/enroll` success.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub user: String,
    pub jwt_token: String,
    pub token_expires_in_hours: Option<u32>,
    pub original_format: Option<String>,
    pub processed_format: Option<String>,
}

/// POST `/authenticate` result. `authenticated: false` is a normal value,
/// not an error; the diagnostics explain what the verifier saw.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub authenticated: bool,
    #[serde(default)]
    pub message: String,
    pub recognized_user: Option<String>,
    pub jwt_token: Option<String>,
    pub token_expires_in_hours: Option<u32>,
    pub distance: Option<f64>,
    pub confidence_score: Option<f64>,
    pub all_distances: Option<HashMap<String, f64>>,
    pub threshold: Option<f64>,
    pub closest_match: Option<String>,
}

impl AuthResponse {
    /// The server saw no enrolled profiles at all: failure with an empty
    /// distances map.
    pub fn no_enrolled_users(&self) -> bool {
        !self.authenticated
            && self
                .all_distances
                .as_ref()
                .map(|d| d.is_empty())
                .unwrap_or(false)
    }
}

/// GET `/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserListResponse {
    pub enrolled_users: Vec<String>,
    pub count: usize,
}

/// DELETE `/users/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteUserResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_tolerates_minimal_body() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"authenticated": false}"#).unwrap();
        assert!(!resp.authenticated);
        assert!(resp.recognized_user.is_none());
        assert!(!resp.no_enrolled_users());
    }

    #[test]
    fn empty_distances_map_means_no_enrolled_users() {
        let resp: AuthResponse = serde_json::from_str(
            r#"{"authenticated": false, "all_distances": {}}"#,
        )
        .unwrap();
        assert!(resp.no_enrolled_users());

        let resp: AuthResponse = serde_json::from_str(
            r#"{"authenticated": false, "all_distances": {"alice": 0.42}}"#,
        )
        .unwrap();
        assert!(!resp.no_enrolled_users());
    }

    #[test]
    fn enroll_response_parses_server_shape() {
        let resp: EnrollResponse = serde_json::from_str(
            r#"{
                "status": "success",
                "message": "User enrolled",
                "user": "Alice",
                "jwt_token": "jwt-abc",
                "token_expires_in_hours": 24,
                "original_format": "webm",
                "processed_format": "wav"
            }"#,
        )
        .unwrap();
        assert_eq!(resp.user, "Alice");
        assert_eq!(resp.jwt_token, "jwt-abc");
        assert_eq!(resp.token_expires_in_hours, Some(24));
    }
}
