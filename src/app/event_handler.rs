use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;

use super::recording;
use super::state::{AppState, BackendEvent, CaptureStatus, CloneOrigin, EnrollStep, Flow, Op};
use crate::api::{
    ApiError, AuthResponse, DeleteUserResponse, EnrollResponse, UserListResponse,
};
use crate::session::Session;
use crate::ui;
use crate::ui::recorder_panel;

/// Message shown when authentication fails because nobody is enrolled.
const NO_ENROLLED_USERS_MSG: &str =
    "No enrolled users found. Please enroll your voice first.";

/// Handle a backend event on the GTK main thread. This is the core state
/// machine: every network completion and recording tick lands here.
pub fn handle_backend_event(state: &Rc<RefCell<AppState>>, event: BackendEvent) {
    match event {
        BackendEvent::RecordTick => on_record_tick(state),
        BackendEvent::AudioLevel(level) => on_audio_level(state, level),
        BackendEvent::EnrollFinished { seq, result } => on_enroll_finished(state, seq, result),
        BackendEvent::AuthFinished { seq, result } => on_auth_finished(state, seq, result),
        BackendEvent::CloneFinished { seq, origin, result } => {
            on_clone_finished(state, seq, origin, result)
        }
        BackendEvent::UsersLoaded { seq, result } => on_users_loaded(state, seq, result),
        BackendEvent::UserDeleted { seq, name, result } => {
            on_user_deleted(state, seq, name, result)
        }
    }
}

/// One ~1s countdown step; stops the recording at the configured cap.
fn on_record_tick(state: &Rc<RefCell<AppState>>) {
    let should_stop = {
        let mut s = state.borrow_mut();
        if s.capture_status != CaptureStatus::Recording {
            return;
        }
        s.elapsed_secs += 1;
        let max = s.config.max_record_secs;
        let elapsed = s.elapsed_secs;
        if let Some(ref win) = s.window {
            if let Some(panel) = win.recorder_panel(s.active_flow) {
                panel
                    .timer_label
                    .set_text(&recorder_panel::timer_text(elapsed, max));
            }
        }
        elapsed >= max
    };

    if should_stop {
        log::info!("Recording cap reached, stopping");
        recording::stop_recording(state);
    }
}

fn on_audio_level(state: &Rc<RefCell<AppState>>, level: f32) {
    let s = state.borrow();
    if s.capture_status != CaptureStatus::Recording {
        return;
    }
    if let Some(ref win) = s.window {
        if let Some(panel) = win.recorder_panel(s.active_flow) {
            let mut levels = panel.audio_levels.borrow_mut();
            if levels.len() >= recorder_panel::NUM_BARS {
                levels.pop_front();
            }
            levels.push_back(level);
            drop(levels);
            panel.waveform.queue_draw();
        }
    }
}

fn on_enroll_finished(
    state: &Rc<RefCell<AppState>>,
    seq: u64,
    result: Result<EnrollResponse, ApiError>,
) {
    if !state.borrow_mut().seqs.is_current(Op::Enroll, seq) {
        log::info!("Ignoring stale enrollment response");
        return;
    }

    match result {
        Ok(resp) => {
            log::info!("Enrolled as '{}'", resp.user);
            {
                let mut s = state.borrow_mut();
                s.session.login(Session::new(resp.user));
                s.enroll_step = EnrollStep::NameEntry;
            }
            recording::reset_capture(state, Flow::Enroll);

            let nav = {
                let s = state.borrow();
                if let Some(ref win) = s.window {
                    ui::enroll::set_step(&win.enroll, EnrollStep::NameEntry);
                    win.enroll.name_row.set_text("");
                    ui::set_error_label(&win.enroll.error_label, None);
                    win.refresh_home(s.session.current(), s.session.is_token_authenticated());
                    win.show_toast("Voice profile enrolled");
                }
                s.window.as_ref().map(|w| w.nav())
            };
            // Navigation fires stack signals that re-enter the state, so
            // no borrow may be held here.
            if let Some(nav) = nav {
                nav.update(true);
                nav.go_home();
            }
        }
        Err(e) => {
            log::warn!("Enrollment failed: {e}");
            let s = state.borrow();
            if let Some(ref win) = s.window {
                win.enroll.submit_button.set_sensitive(s.capture.has_capture());
                ui::set_error_label(&win.enroll.error_label, Some(&e.to_string()));
            }
        }
    }
}

fn on_auth_finished(
    state: &Rc<RefCell<AppState>>,
    seq: u64,
    result: Result<AuthResponse, ApiError>,
) {
    if !state.borrow_mut().seqs.is_current(Op::Authenticate, seq) {
        log::info!("Ignoring stale authentication response");
        return;
    }

    match result {
        Ok(resp) if resp.authenticated && resp.recognized_user.is_some() => {
            let user = resp.recognized_user.unwrap_or_default();
            log::info!("Authenticated as '{user}'");
            state.borrow_mut().session.login(Session::new(user.clone()));
            recording::reset_capture(state, Flow::Login);

            let nav = {
                let s = state.borrow();
                if let Some(ref win) = s.window {
                    ui::set_error_label(&win.login.error_label, None);
                    win.refresh_home(s.session.current(), s.session.is_token_authenticated());
                    win.show_toast(&format!("Welcome back, {user}"));
                }
                s.window.as_ref().map(|w| w.nav())
            };
            if let Some(nav) = nav {
                nav.update(true);
                nav.go_home();
            }
        }
        Ok(resp) => {
            // A rejected sample is a normal domain outcome, not an error.
            let message = if resp.no_enrolled_users() {
                NO_ENROLLED_USERS_MSG.to_string()
            } else {
                log::info!(
                    "Authentication rejected (closest match: {:?}, distance: {:?})",
                    resp.closest_match,
                    resp.distance
                );
                "Voice authentication failed.".to_string()
            };
            let s = state.borrow();
            if let Some(ref win) = s.window {
                win.login.submit_button.set_sensitive(s.capture.has_capture());
                ui::set_error_label(&win.login.error_label, Some(&message));
            }
        }
        Err(e) => {
            log::warn!("Authentication failed: {e}");
            let s = state.borrow();
            if let Some(ref win) = s.window {
                win.login.submit_button.set_sensitive(s.capture.has_capture());
                ui::set_error_label(&win.login.error_label, Some(&e.to_string()));
            }
        }
    }
}

fn on_clone_finished(
    state: &Rc<RefCell<AppState>>,
    seq: u64,
    origin: CloneOrigin,
    result: Result<Vec<u8>, ApiError>,
) {
    let op = match origin {
        CloneOrigin::Cloning => Op::CloneVoice,
        CloneOrigin::Testing => Op::TestVoice,
    };
    if !state.borrow_mut().seqs.is_current(op, seq) {
        log::info!("Ignoring stale voice generation response");
        return;
    }

    match result {
        Ok(bytes) => {
            log::info!("Received {} bytes of generated audio", bytes.len());
            let mut s = state.borrow_mut();

            // Force a reload if this page's previous result is loaded.
            if s.result_origin == Some(origin) {
                s.result_player.unload();
                s.result_origin = None;
            }
            match origin {
                CloneOrigin::Cloning => s.cloning_result = Some(bytes),
                CloneOrigin::Testing => s.testing_result = Some(bytes),
            }
            if origin == CloneOrigin::Cloning {
                s.session.update(|u| u.voice_cloned = true);
            }

            if let Some(ref win) = s.window {
                let page = win.clone_page(origin);
                page.generate_button.set_sensitive(true);
                page.play_button.set_sensitive(true);
                page.save_button.set_sensitive(true);
                page.status_label
                    .set_text("Audio generated - press play to listen");
                win.set_result_playing(origin, false);
                win.refresh_home(s.session.current(), s.session.is_token_authenticated());
            }
        }
        Err(e) => {
            log::warn!("Voice generation failed: {e}");
            let s = state.borrow();
            if let Some(ref win) = s.window {
                let page = win.clone_page(origin);
                page.generate_button.set_sensitive(true);
                ui::set_error_label(page.error_label, Some(&e.to_string()));
                // A cleared credential sends the user back through login.
                if e.is_unauthorized() {
                    win.refresh_home(s.session.current(), s.session.is_token_authenticated());
                }
            }
        }
    }
}

fn on_users_loaded(
    state: &Rc<RefCell<AppState>>,
    seq: u64,
    result: Result<UserListResponse, ApiError>,
) {
    if !state.borrow_mut().seqs.is_current(Op::ListUsers, seq) {
        log::info!("Ignoring stale user listing");
        return;
    }

    match result {
        Ok(resp) => {
            log::info!("Loaded {} enrolled users", resp.count);
            state.borrow_mut().users = resp.enrolled_users;
            ui::users::populate(state);
        }
        Err(e) => {
            log::warn!("Failed to load users: {e}");
            let s = state.borrow();
            if let Some(ref win) = s.window {
                ui::set_error_label(&win.users.error_label, Some(&e.to_string()));
            }
        }
    }
}

fn on_user_deleted(
    state: &Rc<RefCell<AppState>>,
    seq: u64,
    name: String,
    result: Result<DeleteUserResponse, ApiError>,
) {
    if !state.borrow_mut().seqs.is_current(Op::DeleteUser, seq) {
        log::info!("Ignoring stale delete response");
        return;
    }

    match result {
        Ok(resp) => {
            log::info!("Deleted user '{name}': {}", resp.message);
            // Reflect the removal locally; no re-fetch needed.
            state.borrow_mut().users.retain(|u| u != &name);
            ui::users::populate(state);
            let s = state.borrow();
            if let Some(ref win) = s.window {
                win.show_toast(&format!("User \"{name}\" deleted successfully"));
            }
        }
        Err(e) => {
            log::warn!("Failed to delete user '{name}': {e}");
            let s = state.borrow();
            if let Some(ref win) = s.window {
                ui::set_error_label(&win.users.error_label, Some(&e.to_string()));
            }
        }
    }
}
