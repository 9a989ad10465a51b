use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;

use super::state::{AppState, BackendEvent, CloneOrigin, Flow, Op};
use crate::capture::{is_supported_audio_file, supported_formats_label, Capture};
use crate::ui;

/// Validate and dispatch the enrollment request.
pub fn dispatch_enroll(state: &Rc<RefCell<AppState>>, name: &str) {
    let name = name.trim().to_string();
    if name.is_empty() {
        show_error(state, Flow::Enroll, "Please enter your name");
        return;
    }
    let Some(capture) = validated_capture(state, Flow::Enroll, "Please record your voice sample")
    else {
        return;
    };

    let seq = {
        let mut s = state.borrow_mut();
        if let Some(ref win) = s.window {
            win.enroll.submit_button.set_sensitive(false);
            ui::set_error_label(&win.enroll.error_label, None);
        }
        s.seqs.issue(Op::Enroll)
    };

    let api = state.borrow().api.clone();
    let sender = state.borrow().backend_sender.clone();
    state.borrow().tokio_rt.spawn(async move {
        let result = api.enroll(&name, &capture).await;
        let _ = sender.send(BackendEvent::EnrollFinished { seq, result }).await;
    });
}

/// Validate and dispatch the voice authentication request.
pub fn dispatch_authenticate(state: &Rc<RefCell<AppState>>) {
    let Some(capture) = validated_capture(state, Flow::Login, "Please record your voice") else {
        return;
    };

    let seq = {
        let mut s = state.borrow_mut();
        if let Some(ref win) = s.window {
            win.login.submit_button.set_sensitive(false);
            ui::set_error_label(&win.login.error_label, None);
        }
        s.seqs.issue(Op::Authenticate)
    };

    let api = state.borrow().api.clone();
    let sender = state.borrow().backend_sender.clone();
    state.borrow().tokio_rt.spawn(async move {
        let result = api.authenticate(&capture).await;
        let _ = sender.send(BackendEvent::AuthFinished { seq, result }).await;
    });
}

/// Validate and dispatch a voice generation request. The cloning page may
/// attach the captured clip as reference audio; the testing page never
/// does.
pub fn dispatch_clone(state: &Rc<RefCell<AppState>>, origin: CloneOrigin, question: &str) {
    let flow = match origin {
        CloneOrigin::Cloning => Flow::Cloning,
        CloneOrigin::Testing => Flow::Testing,
    };

    let question = question.trim().to_string();
    if question.is_empty() {
        let msg = match origin {
            CloneOrigin::Cloning => "Please enter a question for your cloned voice",
            CloneOrigin::Testing => "Please enter some text to generate audio",
        };
        show_error(state, flow, msg);
        return;
    }

    let seed = match origin {
        CloneOrigin::Cloning => {
            let text = state
                .borrow()
                .window
                .as_ref()
                .map(|w| w.cloning.seed_row.text().to_string())
                .unwrap_or_default();
            let text = text.trim().to_string();
            if text.is_empty() {
                None
            } else {
                match text.parse::<u64>() {
                    Ok(seed) => Some(seed),
                    Err(_) => {
                        show_error(state, flow, "Seed must be a whole number");
                        return;
                    }
                }
            }
        }
        CloneOrigin::Testing => None,
    };

    let reference = match origin {
        // Reference audio is optional; the service falls back to the
        // enrolled profile when none is attached.
        CloneOrigin::Cloning => state.borrow().capture.current().cloned(),
        CloneOrigin::Testing => None,
    };
    if let Some(ref capture) = reference {
        if !is_supported_audio_file(&capture.file_name) {
            show_unsupported_format(state, flow);
            return;
        }
    }

    let op = match origin {
        CloneOrigin::Cloning => Op::CloneVoice,
        CloneOrigin::Testing => Op::TestVoice,
    };
    let seq = {
        let mut s = state.borrow_mut();
        if let Some(ref win) = s.window {
            let page = win.clone_page(origin);
            page.generate_button.set_sensitive(false);
            ui::set_error_label(&page.error_label, None);
        }
        s.seqs.issue(op)
    };

    let api = state.borrow().api.clone();
    let sender = state.borrow().backend_sender.clone();
    state.borrow().tokio_rt.spawn(async move {
        let result = api
            .clone_voice(reference.as_ref(), &question, seed)
            .await;
        let _ = sender
            .send(BackendEvent::CloneFinished { seq, origin, result })
            .await;
    });
}

/// Fetch the enrolled-user listing.
pub fn dispatch_list_users(state: &Rc<RefCell<AppState>>) {
    let seq = {
        let mut s = state.borrow_mut();
        if let Some(ref win) = s.window {
            ui::set_error_label(&win.users.error_label, None);
        }
        s.seqs.issue(Op::ListUsers)
    };

    let api = state.borrow().api.clone();
    let sender = state.borrow().backend_sender.clone();
    state.borrow().tokio_rt.spawn(async move {
        let result = api.list_users().await;
        let _ = sender.send(BackendEvent::UsersLoaded { seq, result }).await;
    });
}

/// Delete an enrolled voice profile.
pub fn dispatch_delete_user(state: &Rc<RefCell<AppState>>, name: String) {
    let seq = {
        let mut s = state.borrow_mut();
        if let Some(ref win) = s.window {
            ui::set_error_label(&win.users.error_label, None);
        }
        s.seqs.issue(Op::DeleteUser)
    };

    let api = state.borrow().api.clone();
    let sender = state.borrow().backend_sender.clone();
    state.borrow().tokio_rt.spawn(async move {
        let result = api.delete_user(&name).await;
        let _ = sender
            .send(BackendEvent::UserDeleted { seq, name, result })
            .await;
    });
}

/// The active capture, checked against the supported formats. Shows the
/// page's inline error and returns `None` when invalid or missing.
fn validated_capture(
    state: &Rc<RefCell<AppState>>,
    flow: Flow,
    missing_msg: &str,
) -> Option<Capture> {
    let capture = state.borrow().capture.current().cloned();
    let Some(capture) = capture else {
        show_error(state, flow, missing_msg);
        return None;
    };
    if !is_supported_audio_file(&capture.file_name) {
        show_unsupported_format(state, flow);
        return None;
    }
    Some(capture)
}

fn show_unsupported_format(state: &Rc<RefCell<AppState>>, flow: Flow) {
    let msg = format!(
        "Unsupported audio format. Supported formats: {}",
        supported_formats_label()
    );
    show_error(state, flow, &msg);
}

fn show_error(state: &Rc<RefCell<AppState>>, flow: Flow, msg: &str) {
    let s = state.borrow();
    if let Some(ref win) = s.window {
        if let Some(label) = win.error_label(flow) {
            ui::set_error_label(label, Some(msg));
        }
    }
}
