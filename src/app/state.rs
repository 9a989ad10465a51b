use std::sync::{Arc, Mutex};

use gtk4::glib;

use crate::api::{
    ApiClient, ApiError, AuthResponse, DeleteUserResponse, EnrollResponse, UserListResponse,
};
use crate::capture::CaptureController;
use crate::config::Config;
use crate::player::ClipPlayer;
use crate::session::{SessionService, TokenStore};
use crate::ui::window::MainWindow;

/// Which page of the view stack a capture or completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Home,
    Enroll,
    Login,
    Cloning,
    Testing,
    Users,
}

impl Flow {
    pub fn stack_name(self) -> &'static str {
        match self {
            Flow::Home => "home",
            Flow::Enroll => "enroll",
            Flow::Login => "login",
            Flow::Cloning => "cloning",
            Flow::Testing => "testing",
            Flow::Users => "users",
        }
    }

    pub fn from_stack_name(name: &str) -> Option<Self> {
        Some(match name {
            "home" => Flow::Home,
            "enroll" => Flow::Enroll,
            "login" => Flow::Login,
            "cloning" => Flow::Cloning,
            "testing" => Flow::Testing,
            "users" => Flow::Users,
            _ => return None,
        })
    }
}

/// Where a generated clip should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneOrigin {
    Cloning,
    Testing,
}

/// Remote operations that carry a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Enroll,
    Authenticate,
    CloneVoice,
    TestVoice,
    ListUsers,
    DeleteUser,
}

/// Per-operation sequence counters. Concurrent requests cannot be
/// cancelled, so completions carry the sequence they were issued with and
/// anything but the latest is dropped instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct RequestSeqs {
    enroll: u64,
    authenticate: u64,
    clone_voice: u64,
    test_voice: u64,
    list_users: u64,
    delete_user: u64,
}

impl RequestSeqs {
    fn slot(&mut self, op: Op) -> &mut u64 {
        match op {
            Op::Enroll => &mut self.enroll,
            Op::Authenticate => &mut self.authenticate,
            Op::CloneVoice => &mut self.clone_voice,
            Op::TestVoice => &mut self.test_voice,
            Op::ListUsers => &mut self.list_users,
            Op::DeleteUser => &mut self.delete_user,
        }
    }

    /// Reserve the next sequence number for an operation.
    pub fn issue(&mut self, op: Op) -> u64 {
        let slot = self.slot(op);
        *slot += 1;
        *slot
    }

    /// True when `seq` is the latest issued for `op`.
    pub fn is_current(&mut self, op: Op, seq: u64) -> bool {
        *self.slot(op) == seq
    }
}

/// Events sent from background tasks to the GTK main thread.
#[derive(Debug)]
pub enum BackendEvent {
    /// ~1s countdown tick while recording.
    RecordTick,
    /// RMS of the most recent captured audio, for the waveform.
    AudioLevel(f32),
    EnrollFinished {
        seq: u64,
        result: Result<EnrollResponse, ApiError>,
    },
    AuthFinished {
        seq: u64,
        result: Result<AuthResponse, ApiError>,
    },
    CloneFinished {
        seq: u64,
        origin: CloneOrigin,
        result: Result<Vec<u8>, ApiError>,
    },
    UsersLoaded {
        seq: u64,
        result: Result<UserListResponse, ApiError>,
    },
    UserDeleted {
        seq: u64,
        name: String,
        result: Result<DeleteUserResponse, ApiError>,
    },
}

/// Microphone/capture status of the shared recorder panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Recording,
    Ready,
}

/// Steps of the enrollment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStep {
    NameEntry,
    Recording,
}

/// Central application state. Lives on the GTK main thread inside
/// Rc<RefCell<>>.
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<TokenStore>,
    pub session: SessionService,
    pub api: Arc<ApiClient>,
    pub tokio_rt: tokio::runtime::Runtime,
    pub backend_sender: async_channel::Sender<BackendEvent>,

    // Capture state: one live clip, owned by whichever page recorded or
    // uploaded it last (active_flow); switching pages resets it.
    pub capture: CaptureController,
    pub capture_status: CaptureStatus,
    pub active_flow: Flow,
    pub audio_buffer: Arc<Mutex<Vec<f32>>>,
    pub cpal_stream: Option<cpal::Stream>,
    pub sample_rate: u32,
    pub elapsed_secs: u32,
    pub timer_source: Option<glib::SourceId>,

    // Playback: captured-clip preview and generated-result player.
    pub preview_player: ClipPlayer,
    pub result_player: ClipPlayer,
    /// Which page's generated clip is loaded in `result_player`.
    pub result_origin: Option<CloneOrigin>,
    pub cloning_result: Option<Vec<u8>>,
    pub testing_result: Option<Vec<u8>>,

    // Flow state
    pub seqs: RequestSeqs,
    pub enroll_step: EnrollStep,
    pub users: Vec<String>,

    // UI handles
    pub window: Option<MainWindow>,
}

impl AppState {
    pub fn new(sender: async_channel::Sender<BackendEvent>) -> Self {
        let config = Config::load();
        let state_dir = SessionService::default_dir();
        let tokens = Arc::new(TokenStore::new(state_dir.clone()));
        let mut session = SessionService::new(state_dir, tokens.clone());
        session.restore();
        let api = Arc::new(ApiClient::new(&config.api_base_url, tokens.clone()));
        let tokio_rt = tokio::runtime::Runtime::new()
            .expect("Failed to create tokio runtime");

        Self {
            config,
            tokens,
            session,
            api,
            tokio_rt,
            backend_sender: sender,
            capture: CaptureController::new(),
            capture_status: CaptureStatus::Idle,
            active_flow: Flow::Home,
            audio_buffer: Arc::new(Mutex::new(Vec::new())),
            cpal_stream: None,
            sample_rate: crate::recorder::CAPTURE_RATE,
            elapsed_secs: 0,
            timer_source: None,
            preview_player: ClipPlayer::new(),
            result_player: ClipPlayer::new(),
            result_origin: None,
            cloning_result: None,
            testing_result: None,
            seqs: RequestSeqs::default(),
            enroll_step: EnrollStep::NameEntry,
            users: Vec::new(),
            window: None,
        }
    }

    /// Swap the API client after the base URL changed. In-flight requests
    /// keep the client they were dispatched with.
    pub fn rebuild_api_client(&mut self) {
        self.api = Arc::new(ApiClient::new(
            &self.config.api_base_url,
            self.tokens.clone(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_counters_are_per_operation() {
        let mut seqs = RequestSeqs::default();
        let e1 = seqs.issue(Op::Enroll);
        let a1 = seqs.issue(Op::Authenticate);
        assert_eq!(e1, 1);
        assert_eq!(a1, 1);
        assert!(seqs.is_current(Op::Enroll, e1));
        assert!(seqs.is_current(Op::Authenticate, a1));
    }

    #[test]
    fn stale_sequences_are_not_current() {
        let mut seqs = RequestSeqs::default();
        let first = seqs.issue(Op::CloneVoice);
        let second = seqs.issue(Op::CloneVoice);

        // The older in-flight request must be ignored once a newer one
        // has been dispatched.
        assert!(!seqs.is_current(Op::CloneVoice, first));
        assert!(seqs.is_current(Op::CloneVoice, second));

        // Requests on other operations don't invalidate it.
        seqs.issue(Op::ListUsers);
        assert!(seqs.is_current(Op::CloneVoice, second));
    }
}
