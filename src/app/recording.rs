use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gtk4::glib;
use gtk4::prelude::*;

use super::state::{AppState, BackendEvent, CaptureStatus, CloneOrigin, Flow};
use crate::capture::Capture;
use crate::ui::recorder_panel::{self, PanelPhase};

/// Start recording audio from the microphone for the given page.
pub fn start_recording(state: &Rc<RefCell<AppState>>, flow: Flow) {
    if state.borrow().capture_status == CaptureStatus::Recording {
        return;
    }
    log::info!("Starting recording for {flow:?}");

    // A new capture supersedes whatever clip/timer/playback state was left
    // from the previous source.
    reset_capture(state, flow);

    {
        let s = state.borrow();
        s.audio_buffer.lock().unwrap().clear();
    }

    let buffer = state.borrow().audio_buffer.clone();
    match crate::recorder::start_capture(buffer) {
        Ok((stream, sample_rate)) => {
            let mut s = state.borrow_mut();
            s.cpal_stream = Some(stream);
            s.sample_rate = sample_rate;
            s.elapsed_secs = 0;
            s.capture_status = CaptureStatus::Recording;
            s.active_flow = flow;

            let max = s.config.max_record_secs;
            if let Some(ref win) = s.window {
                if let Some(panel) = win.recorder_panel(flow) {
                    recorder_panel::set_phase(panel, PanelPhase::Recording);
                    panel.timer_label.set_text(&recorder_panel::timer_text(0, max));
                }
            }
        }
        Err(e) => {
            // Microphone permission/device failure: log only; the panel
            // stays in its ready-to-record state and the user may retry.
            log::error!("Failed to start recording: {e}");
            return;
        }
    }

    // 80ms tick for waveform updates; every 12th tick (~1s, best-effort
    // wall clock) drives the countdown that enforces the recording cap.
    let sender = state.borrow().backend_sender.clone();
    let audio_buf = state.borrow().audio_buffer.clone();
    let tick_counter = Arc::new(AtomicUsize::new(0));

    let source = glib::timeout_add_local(
        std::time::Duration::from_millis(80),
        move || {
            let rms = compute_rms(&audio_buf);
            let _ = sender.try_send(BackendEvent::AudioLevel(rms));

            let count = tick_counter.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 12 == 0 {
                let _ = sender.try_send(BackendEvent::RecordTick);
            }

            glib::ControlFlow::Continue
        },
    );
    state.borrow_mut().timer_source = Some(source);
}

/// Compute RMS of the last ~1280 samples in the audio buffer.
fn compute_rms(buffer: &Arc<std::sync::Mutex<Vec<f32>>>) -> f32 {
    let buf = buffer.lock().unwrap();
    let n = buf.len().min(1280);
    if n == 0 {
        return 0.0;
    }
    let start = buf.len() - n;
    let sum_sq: f32 = buf[start..].iter().map(|&s| s * s).sum();
    (sum_sq / n as f32).sqrt()
}

/// Stop recording and install the finalized clip.
pub fn stop_recording(state: &Rc<RefCell<AppState>>) {
    if state.borrow().capture_status != CaptureStatus::Recording {
        return;
    }
    log::info!("Stopping recording");

    if let Some(source) = state.borrow_mut().timer_source.take() {
        source.remove();
    }
    state.borrow_mut().cpal_stream = None;

    let samples: Vec<f32> = state.borrow().audio_buffer.lock().unwrap().clone();
    let sample_rate = state.borrow().sample_rate;

    if samples.is_empty() {
        let mut s = state.borrow_mut();
        s.capture_status = CaptureStatus::Idle;
        if let Some(ref win) = s.window {
            if let Some(panel) = win.recorder_panel(s.active_flow) {
                recorder_panel::set_phase(panel, PanelPhase::Idle);
                panel.status_label.set_text("No audio captured");
            }
        }
        return;
    }

    log::info!(
        "Captured {} samples ({:.1}s at {}Hz)",
        samples.len(),
        samples.len() as f32 / sample_rate as f32,
        sample_rate
    );

    match Capture::from_recording(&samples, sample_rate) {
        Ok(capture) => install_capture(state, capture),
        Err(e) => {
            log::error!("Failed to encode recording: {e}");
            let mut s = state.borrow_mut();
            s.capture_status = CaptureStatus::Idle;
            if let Some(ref win) = s.window {
                if let Some(panel) = win.recorder_panel(s.active_flow) {
                    recorder_panel::set_phase(panel, PanelPhase::Idle);
                }
            }
        }
    }
}

/// Install an uploaded audio file as the active capture. Non-audio files
/// are rejected with no state change.
pub fn load_capture_from_file(state: &Rc<RefCell<AppState>>, flow: Flow, path: &Path) {
    let Some(capture) = Capture::from_file(path) else {
        log::info!("Ignoring non-audio file {}", path.display());
        return;
    };

    log::info!("Loaded audio file '{}'", capture.file_name);
    // Uploading counts as a source switch: timer and playback reset fully.
    reset_capture(state, flow);
    state.borrow_mut().active_flow = flow;
    install_capture(state, capture);
}

/// Put a finalized capture in place, dropping the previous clip and any
/// stale preview playback, then reflect it in the page's panel.
fn install_capture(state: &Rc<RefCell<AppState>>, capture: Capture) {
    let mut s = state.borrow_mut();
    s.preview_player.unload();
    s.capture.install(capture);
    s.capture_status = CaptureStatus::Ready;
    s.elapsed_secs = 0;

    let flow = s.active_flow;
    if let Some(ref win) = s.window {
        if let Some(panel) = win.recorder_panel(flow) {
            recorder_panel::set_phase(panel, PanelPhase::Ready);
            if let Some(current) = s.capture.current() {
                panel
                    .file_label
                    .set_text(&recorder_panel::describe_capture(current));
                panel
                    .status_label
                    .set_text(recorder_panel::ready_status(current.source));
            }
        }
        win.set_capture_ready(flow, true);
    }
}

/// Tear down recording/clip/preview state for a page, returning its panel
/// to idle.
pub fn reset_capture(state: &Rc<RefCell<AppState>>, flow: Flow) {
    let mut s = state.borrow_mut();
    if let Some(source) = s.timer_source.take() {
        source.remove();
    }
    s.cpal_stream = None;
    s.capture.reset();
    s.preview_player.unload();
    s.capture_status = CaptureStatus::Idle;
    s.elapsed_secs = 0;

    let max = s.config.max_record_secs;
    if let Some(ref win) = s.window {
        if let Some(panel) = win.recorder_panel(flow) {
            recorder_panel::set_phase(panel, PanelPhase::Idle);
            panel.timer_label.set_text(&recorder_panel::timer_text(0, max));
        }
        win.set_capture_ready(flow, false);
    }
}

/// Two-state play/pause toggle for the captured clip.
pub fn toggle_preview(state: &Rc<RefCell<AppState>>) {
    let s = &mut *state.borrow_mut();

    if !s.preview_player.has_clip() {
        let Some(capture) = s.capture.current() else {
            return;
        };
        if let Err(e) = s.preview_player.load(&capture.bytes) {
            log::warn!("Cannot preview '{}': {e}", capture.file_name);
            if let Some(ref win) = s.window {
                if let Some(panel) = win.recorder_panel(s.active_flow) {
                    panel.status_label.set_text(&e.to_string());
                }
            }
            return;
        }
    }

    if let Err(e) = s.preview_player.toggle() {
        log::error!("Preview playback failed: {e}");
        return;
    }

    if let Some(ref win) = s.window {
        if let Some(panel) = win.recorder_panel(s.active_flow) {
            recorder_panel::set_playing(panel, s.preview_player.is_playing());
        }
    }
}

/// Two-state play/pause toggle for a generated clip.
pub fn toggle_result(state: &Rc<RefCell<AppState>>, origin: CloneOrigin) {
    let s = &mut *state.borrow_mut();

    let bytes = match origin {
        CloneOrigin::Cloning => s.cloning_result.as_ref(),
        CloneOrigin::Testing => s.testing_result.as_ref(),
    };
    let Some(bytes) = bytes else {
        return;
    };

    if s.result_origin != Some(origin) {
        if let Err(e) = s.result_player.load(bytes) {
            log::error!("Cannot play generated audio: {e}");
            return;
        }
        s.result_origin = Some(origin);
    }

    if let Err(e) = s.result_player.toggle() {
        log::error!("Result playback failed: {e}");
        return;
    }

    if let Some(ref win) = s.window {
        win.set_result_playing(origin, s.result_player.is_playing());
    }
}

/// Poll both players for natural end of playback; reaching the end drops
/// back to paused-at-start and the buttons flip back to "play".
pub fn poll_playback(state: &Rc<RefCell<AppState>>) {
    let s = &mut *state.borrow_mut();

    if s.preview_player.take_finished() {
        if let Some(ref win) = s.window {
            if let Some(panel) = win.recorder_panel(s.active_flow) {
                recorder_panel::set_playing(panel, false);
            }
        }
    }

    if s.result_player.take_finished() {
        if let (Some(ref win), Some(origin)) = (&s.window, s.result_origin) {
            win.set_result_playing(origin, false);
        }
    }
}
