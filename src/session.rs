use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long an issued bearer token stays usable.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

const SESSION_FILE: &str = "session.json";
const TOKEN_FILE: &str = "token.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The logged-in identity, persisted across launches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub voice_enrolled: bool,
    #[serde(default)]
    pub voice_cloned: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            voice_enrolled: true,
            voice_cloned: false,
            token_expires_at: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    jwt_token: String,
}

/// Holds the bearer credential, mirrored to disk.
///
/// This is the single writer for the credential: the API client clears it
/// on a 401 and the session service clears it on logout, both through
/// here, so the session record and the token can never diverge.
pub struct TokenStore {
    dir: PathBuf,
    token: Mutex<Option<String>>,
}

impl TokenStore {
    pub fn new(dir: PathBuf) -> Self {
        let token = load_json::<StoredToken>(&dir.join(TOKEN_FILE)).map(|t| t.jwt_token);
        Self {
            dir,
            token: Mutex::new(token),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn set(&self, token: String) {
        if let Err(e) = save_json(
            &self.dir,
            TOKEN_FILE,
            &StoredToken {
                jwt_token: token.clone(),
            },
        ) {
            log::warn!("Failed to persist token: {e}");
        }
        *self.token.lock().unwrap() = Some(token);
    }

    pub fn clear(&self) {
        let _ = fs::remove_file(self.dir.join(TOKEN_FILE));
        *self.token.lock().unwrap() = None;
    }
}

/// Session lifecycle: `Anonymous -> Enrolled(no token) ->
/// Enrolled+TokenValid -> [expiry or logout] -> Anonymous`.
///
/// Owns the persisted session record and shares the token store with the
/// API client.
pub struct SessionService {
    dir: PathBuf,
    session: Option<Session>,
    tokens: Arc<TokenStore>,
}

impl SessionService {
    pub fn new(dir: PathBuf, tokens: Arc<TokenStore>) -> Self {
        Self {
            dir,
            session: None,
            tokens,
        }
    }

    /// Stores under the platform data dir: ~/.local/share/voice-vault/
    pub fn default_dir() -> PathBuf {
        let mut p = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("voice-vault");
        p
    }

    /// Restore persisted state. A session whose token has expired is
    /// logged out in full rather than surfaced as stale.
    pub fn restore(&mut self) {
        let Some(session) = load_json::<Session>(&self.dir.join(SESSION_FILE)) else {
            return;
        };

        if self.tokens.get().is_some() {
            match session.token_expires_at {
                Some(expires_at) if expires_at <= Utc::now() => {
                    log::info!("Stored token for '{}' has expired", session.name);
                    self.logout();
                    return;
                }
                _ => {}
            }
        }

        log::info!("Restored session for '{}'", session.name);
        self.session = Some(session);
    }

    /// Install a fresh identity with token expiry 24h out and persist it.
    pub fn login(&mut self, mut session: Session) {
        session.token_expires_at = Some(Utc::now() + Duration::hours(TOKEN_VALIDITY_HOURS));
        if let Err(e) = save_json(&self.dir, SESSION_FILE, &session) {
            log::warn!("Failed to persist session: {e}");
        }
        self.session = Some(session);
    }

    /// Clear the session record and the credential together.
    pub fn logout(&mut self) {
        self.session = None;
        let _ = fs::remove_file(self.dir.join(SESSION_FILE));
        self.tokens.clear();
    }

    /// Apply a partial update to the current session and persist it.
    pub fn update<F: FnOnce(&mut Session)>(&mut self, f: F) {
        if let Some(ref mut session) = self.session {
            f(session);
            if let Err(e) = save_json(&self.dir, SESSION_FILE, session) {
                log::warn!("Failed to persist session: {e}");
            }
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Enrolled voice profile present.
    pub fn is_authenticated(&self) -> bool {
        self.session.as_ref().map(|s| s.voice_enrolled).unwrap_or(false)
    }

    /// Enrolled AND holding a live, non-expired bearer token.
    pub fn is_token_authenticated(&self) -> bool {
        if !self.is_authenticated() || self.tokens.get().is_none() {
            return false;
        }
        match self.session.as_ref().and_then(|s| s.token_expires_at) {
            Some(expires_at) => expires_at > Utc::now(),
            None => false,
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Option<T> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt state file {}: {e}", path.display());
            None
        }
    }
}

fn save_json<T: Serialize>(
    dir: &PathBuf,
    file: &str,
    value: &T,
) -> Result<(), StoreError> {
    fs::create_dir_all(dir)?;
    let data = serde_json::to_string_pretty(value)?;
    fs::write(dir.join(file), data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service_in(dir: &TempDir) -> (SessionService, Arc<TokenStore>) {
        let tokens = Arc::new(TokenStore::new(dir.path().to_path_buf()));
        (
            SessionService::new(dir.path().to_path_buf(), tokens.clone()),
            tokens,
        )
    }

    #[test]
    fn login_sets_expiry_24h_out_and_persists() {
        let dir = TempDir::new().unwrap();
        let (mut service, tokens) = service_in(&dir);

        tokens.set("tok-alice".into());
        service.login(Session::new("Alice"));

        let expires = service.current().unwrap().token_expires_at.unwrap();
        let delta = expires - Utc::now();
        assert!(delta > Duration::hours(23) && delta <= Duration::hours(24));
        assert!(service.is_authenticated());
        assert!(service.is_token_authenticated());

        // A second service over the same dir sees the same identity.
        let (mut other, _) = service_in(&dir);
        other.restore();
        let restored = other.current().unwrap();
        assert_eq!(restored.name, "Alice");
        assert!(restored.voice_enrolled);
    }

    #[test]
    fn restore_with_expired_token_matches_fresh_logout() {
        let dir = TempDir::new().unwrap();
        let (mut service, tokens) = service_in(&dir);

        tokens.set("stale".into());
        let mut session = Session::new("Bob");
        session.token_expires_at = Some(Utc::now() - Duration::hours(1));
        save_json(&dir.path().to_path_buf(), SESSION_FILE, &session).unwrap();

        service.restore();

        assert!(service.current().is_none());
        assert!(!service.is_authenticated());
        assert!(!service.is_token_authenticated());
        assert!(tokens.get().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert!(!dir.path().join(TOKEN_FILE).exists());
    }

    #[test]
    fn restore_without_token_keeps_enrolled_session() {
        let dir = TempDir::new().unwrap();
        let (mut service, _) = service_in(&dir);

        let mut session = Session::new("Carol");
        session.token_expires_at = Some(Utc::now() - Duration::hours(1));
        save_json(&dir.path().to_path_buf(), SESSION_FILE, &session).unwrap();

        // Expiry has passed but no token is held, so the profile survives
        // as Enrolled(no token).
        service.restore();
        assert!(service.is_authenticated());
        assert!(!service.is_token_authenticated());
    }

    #[test]
    fn logout_clears_session_and_token_together() {
        let dir = TempDir::new().unwrap();
        let (mut service, tokens) = service_in(&dir);

        tokens.set("tok".into());
        service.login(Session::new("Dave"));
        service.logout();

        assert!(!service.is_authenticated());
        assert!(tokens.get().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert!(!dir.path().join(TOKEN_FILE).exists());
    }

    #[test]
    fn update_applies_partial_changes() {
        let dir = TempDir::new().unwrap();
        let (mut service, _) = service_in(&dir);

        service.login(Session::new("Erin"));
        service.update(|s| s.voice_cloned = true);
        assert!(service.current().unwrap().voice_cloned);

        let (mut other, _) = service_in(&dir);
        other.restore();
        assert!(other.current().unwrap().voice_cloned);
    }

    #[test]
    fn token_store_round_trips_across_instances() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        assert!(store.get().is_none());

        store.set("jwt-123".into());
        let reopened = TokenStore::new(dir.path().to_path_buf());
        assert_eq!(reopened.get().as_deref(), Some("jwt-123"));

        reopened.clear();
        assert!(TokenStore::new(dir.path().to_path_buf()).get().is_none());
    }
}
