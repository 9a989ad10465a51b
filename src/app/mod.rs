mod event_handler;
mod flows;
mod recording;
mod state;

pub use event_handler::handle_backend_event;
pub use flows::{
    dispatch_authenticate, dispatch_clone, dispatch_delete_user, dispatch_enroll,
    dispatch_list_users,
};
pub use recording::{
    load_capture_from_file, poll_playback, reset_capture, start_recording, stop_recording,
    toggle_preview, toggle_result,
};
pub use state::{
    AppState, BackendEvent, CaptureStatus, CloneOrigin, EnrollStep, Flow,
};
