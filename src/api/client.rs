use std::sync::Arc;

use reqwest::{multipart, Client as ReqwestClient, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::capture::Capture;
use crate::session::TokenStore;

use super::{
    error::{ApiError, Result},
    types::{ApiInfo, AuthResponse, DeleteUserResponse, EnrollResponse, UserListResponse},
};

/// HTTP client for the Voice Vault API.
///
/// The bearer credential lives in the injected [`TokenStore`]; enrollment
/// and authentication deposit freshly issued tokens there, a 401 from any
/// endpoint evicts the stored one.
pub struct ApiClient {
    http: ReqwestClient,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<TokenStore>) -> Self {
        Self {
            http: ReqwestClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// GET `/`: service banner and endpoint listing.
    pub async fn api_info(&self) -> Result<ApiInfo> {
        let response = self.http.get(self.endpoint("/")).send().await?;
        self.parse_json(response).await
    }

    /// POST `/enroll`: register a voice profile under `name`.
    /// The issued token becomes the ambient credential immediately.
    pub async fn enroll(&self, name: &str, audio: &Capture) -> Result<EnrollResponse> {
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .part("audio_file", audio_part(audio)?);

        let response = self
            .http
            .post(self.endpoint("/enroll"))
            .multipart(form)
            .send()
            .await?;

        let result: EnrollResponse = self.parse_json(response).await?;
        if !result.jwt_token.is_empty() {
            self.tokens.set(result.jwt_token.clone());
        }
        Ok(result)
    }

    /// POST `/authenticate`: verify a voice sample against enrolled
    /// profiles. A token is stored only when the sample matched.
    pub async fn authenticate(&self, audio: &Capture) -> Result<AuthResponse> {
        let form = multipart::Form::new().part("audio_file", audio_part(audio)?);

        let response = self
            .http
            .post(self.endpoint("/authenticate"))
            .multipart(form)
            .send()
            .await?;

        let result: AuthResponse = self.parse_json(response).await?;
        if result.authenticated {
            if let Some(ref token) = result.jwt_token {
                self.tokens.set(token.clone());
            }
        }
        Ok(result)
    }

    /// POST `/clone-voice`: synthesize `question` in the enrolled voice,
    /// optionally guided by a reference clip and a generation seed.
    ///
    /// Requires a stored bearer token; without one this fails locally
    /// before any network I/O. Success is the raw audio payload.
    pub async fn clone_voice(
        &self,
        reference: Option<&Capture>,
        question: &str,
        seed: Option<u64>,
    ) -> Result<Vec<u8>> {
        let token = self.tokens.get().ok_or(ApiError::AuthRequired)?;

        let mut form = multipart::Form::new().text("question", question.to_string());
        if let Some(capture) = reference {
            form = form.part("audio_file", audio_part(capture)?);
        }
        if let Some(seed) = seed {
            form = form.text("seed", seed.to_string());
        }

        let response = self
            .http
            .post(self.endpoint("/clone-voice"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let response = self.check_status(response).await?;

        // The payload is synthesized audio of unknown size; stream it in.
        use futures_util::StreamExt;
        let mut stream = response.bytes_stream();
        let mut bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes)
    }

    /// GET `/users`.
    pub async fn list_users(&self) -> Result<UserListResponse> {
        let response = self.http.get(self.endpoint("/users")).send().await?;
        self.parse_json(response).await
    }

    /// DELETE `/users/{name}`: the name is path-escaped.
    pub async fn delete_user(&self, name: &str) -> Result<DeleteUserResponse> {
        let response = self.http.delete(self.user_url(name)?).send().await?;
        self.parse_json(response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for a single user, with the name percent-encoded as one path
    /// segment.
    fn user_url(&self, name: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config("base url cannot carry a path".into()))?
            .pop_if_empty()
            .push("users")
            .push(name);
        Ok(url.to_string())
    }

    /// Parse a JSON success body after status normalization.
    async fn parse_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = self.check_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Pass successful responses through; turn anything else into a typed
    /// failure.
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(self.normalize_error(status, &body))
    }

    /// Build the typed failure for a non-success status. A 401 also
    /// clears the stored credential so the caller drops back into an
    /// unauthenticated flow.
    fn normalize_error(&self, status: StatusCode, body: &[u8]) -> ApiError {
        if status == StatusCode::UNAUTHORIZED {
            log::info!("Server rejected credential; clearing stored token");
            self.tokens.clear();
        }
        ApiError::Api {
            status: status.as_u16(),
            message: error_message(status, body),
        }
    }
}

/// Multipart part for an audio clip, carrying its file name and MIME type.
fn audio_part(capture: &Capture) -> Result<multipart::Part> {
    let part = multipart::Part::bytes(capture.bytes.clone())
        .file_name(capture.file_name.clone())
        .mime_str(&capture.mime)?;
    Ok(part)
}

/// Message from a structured error body when present, else the status line.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(detail) = parsed.detail {
            return detail;
        }
        if let Some(message) = parsed.message {
            return message;
        }
    }

    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("request failed")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Capture, CaptureSource};
    use tempfile::TempDir;

    fn client_with_store(dir: &TempDir) -> (ApiClient, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::new(dir.path().to_path_buf()));
        (
            ApiClient::new("http://localhost:8000", tokens.clone()),
            tokens,
        )
    }

    fn dummy_capture() -> Capture {
        Capture {
            bytes: vec![0; 16],
            mime: "audio/wav".into(),
            source: CaptureSource::Recording,
            duration_secs: Some(0.1),
            file_name: "recording.wav".into(),
        }
    }

    #[tokio::test]
    async fn clone_voice_without_token_fails_before_network() {
        let dir = TempDir::new().unwrap();
        let (client, tokens) = client_with_store(&dir);
        assert!(tokens.get().is_none());

        // Would hang or error differently if a request were attempted:
        // nothing listens on the base URL in tests.
        let err = client
            .clone_voice(Some(&dummy_capture()), "What is the weather?", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired));
    }

    #[test]
    fn unauthorized_response_clears_stored_token() {
        let dir = TempDir::new().unwrap();
        let (client, tokens) = client_with_store(&dir);
        tokens.set("jwt-old".into());

        let err = client.normalize_error(
            StatusCode::UNAUTHORIZED,
            br#"{"detail": "Token has expired"}"#,
        );

        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Token has expired");
        assert!(tokens.get().is_none());
    }

    #[test]
    fn other_errors_leave_token_alone() {
        let dir = TempDir::new().unwrap();
        let (client, tokens) = client_with_store(&dir);
        tokens.set("jwt-live".into());

        let err = client.normalize_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert!(!err.is_unauthorized());
        assert_eq!(tokens.get().as_deref(), Some("jwt-live"));
    }

    #[test]
    fn error_message_prefers_detail_then_message_then_status_line() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                br#"{"detail": "Question cannot be empty"}"#
            ),
            "Question cannot be empty"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, br#"{"message": "nope"}"#),
            "nope"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, b"<html>gateway</html>"),
            "HTTP 502: Bad Gateway"
        );
    }

    #[test]
    fn user_url_escapes_path_segment() {
        let dir = TempDir::new().unwrap();
        let (client, _) = client_with_store(&dir);

        assert_eq!(
            client.user_url("Bob").unwrap(),
            "http://localhost:8000/users/Bob"
        );
        assert_eq!(
            client.user_url("Bob Smith").unwrap(),
            "http://localhost:8000/users/Bob%20Smith"
        );
        // A slash in the name must not create an extra path segment.
        assert_eq!(
            client.user_url("a/b").unwrap(),
            "http://localhost:8000/users/a%2Fb"
        );
    }
}
