use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::Align;

use crate::capture::{Capture, CaptureSource};

pub const NUM_BARS: usize = 24;

/// Handles for one record/upload/playback panel. Each capture page embeds
/// its own instance; the shared capture state lives in the app state.
pub struct RecorderPanelWidgets {
    pub root: gtk4::Box,
    pub waveform: gtk4::DrawingArea,
    pub audio_levels: Rc<RefCell<VecDeque<f32>>>,
    pub placeholder_label: gtk4::Label,
    pub file_label: gtk4::Label,
    pub timer_label: gtk4::Label,
    pub status_label: gtk4::Label,
    pub record_button: gtk4::Button,
    pub upload_button: gtk4::Button,
    pub play_button: gtk4::Button,
    pub reset_button: gtk4::Button,
}

/// Visual state of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Idle,
    Recording,
    Ready,
}

/// Build one capture panel.
pub fn build_recorder_panel(max_secs: u32) -> RecorderPanelWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 10);
    root.add_css_class("card");
    root.set_margin_top(6);
    root.set_margin_bottom(6);

    // Visualization area: placeholder text, live waveform, or file info.
    let viz = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
    viz.set_margin_top(16);
    viz.set_margin_start(16);
    viz.set_margin_end(16);
    viz.set_halign(Align::Center);

    let placeholder_label = gtk4::Label::new(Some("Ready to record or drop an audio file here"));
    placeholder_label.add_css_class("dim-label");
    viz.append(&placeholder_label);

    let audio_levels: Rc<RefCell<VecDeque<f32>>> =
        Rc::new(RefCell::new(VecDeque::from(vec![0.0; NUM_BARS])));
    let waveform = gtk4::DrawingArea::new();
    waveform.set_content_width(((3 + 2) * NUM_BARS) as i32);
    waveform.set_content_height(36);
    waveform.set_visible(false);

    let levels_for_draw = audio_levels.clone();
    waveform.set_draw_func(move |_area, cr, width, height| {
        draw_waveform(cr, width, height, &levels_for_draw.borrow());
    });
    viz.append(&waveform);

    let file_label = gtk4::Label::new(None);
    file_label.add_css_class("dim-label");
    file_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
    file_label.set_visible(false);
    viz.append(&file_label);

    root.append(&viz);

    let timer_label = gtk4::Label::new(Some(&timer_text(0, max_secs)));
    timer_label.add_css_class("numeric");
    timer_label.add_css_class("title-2");
    timer_label.set_halign(Align::Center);
    root.append(&timer_label);

    // Controls
    let controls = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    controls.set_halign(Align::Center);

    let record_button = gtk4::Button::from_icon_name("media-record-symbolic");
    record_button.add_css_class("circular");
    record_button.add_css_class("destructive-action");
    record_button.set_tooltip_text(Some("Start recording"));
    controls.append(&record_button);

    let upload_button = gtk4::Button::from_icon_name("document-open-symbolic");
    upload_button.add_css_class("circular");
    upload_button.set_tooltip_text(Some("Upload an audio file"));
    controls.append(&upload_button);

    let play_button = gtk4::Button::from_icon_name("media-playback-start-symbolic");
    play_button.add_css_class("circular");
    play_button.set_tooltip_text(Some("Play"));
    play_button.set_sensitive(false);
    controls.append(&play_button);

    let reset_button = gtk4::Button::from_icon_name("view-refresh-symbolic");
    reset_button.add_css_class("circular");
    reset_button.set_tooltip_text(Some("Discard and start over"));
    reset_button.set_sensitive(false);
    controls.append(&reset_button);

    root.append(&controls);

    let status_label = gtk4::Label::new(Some("Record your voice or upload an audio file"));
    status_label.add_css_class("dim-label");
    status_label.set_wrap(true);
    status_label.set_margin_bottom(12);
    root.append(&status_label);

    RecorderPanelWidgets {
        root,
        waveform,
        audio_levels,
        placeholder_label,
        file_label,
        timer_label,
        status_label,
        record_button,
        upload_button,
        play_button,
        reset_button,
    }
}

/// Update panel widgets to reflect the capture phase.
pub fn set_phase(panel: &RecorderPanelWidgets, phase: PanelPhase) {
    match phase {
        PanelPhase::Idle => {
            panel.placeholder_label.set_visible(true);
            panel.waveform.set_visible(false);
            panel.file_label.set_visible(false);
            panel.record_button.set_icon_name("media-record-symbolic");
            panel.record_button.set_tooltip_text(Some("Start recording"));
            panel.upload_button.set_sensitive(true);
            panel.play_button.set_sensitive(false);
            panel.reset_button.set_sensitive(false);
            panel
                .status_label
                .set_text("Record your voice or upload an audio file");
            set_playing(panel, false);
        }
        PanelPhase::Recording => {
            panel.placeholder_label.set_visible(false);
            panel.waveform.set_visible(true);
            panel.file_label.set_visible(false);
            panel.record_button.set_icon_name("media-playback-stop-symbolic");
            panel.record_button.set_tooltip_text(Some("Stop recording"));
            panel.upload_button.set_sensitive(false);
            panel.play_button.set_sensitive(false);
            panel.reset_button.set_sensitive(false);
            panel.status_label.set_text("Recording in progress...");
        }
        PanelPhase::Ready => {
            panel.placeholder_label.set_visible(false);
            panel.waveform.set_visible(false);
            panel.file_label.set_visible(true);
            panel.record_button.set_icon_name("media-record-symbolic");
            panel.record_button.set_tooltip_text(Some("Record again"));
            panel.upload_button.set_sensitive(true);
            panel.play_button.set_sensitive(true);
            panel.reset_button.set_sensitive(true);
            set_playing(panel, false);
        }
    }
}

/// Flip the play button between play and pause.
pub fn set_playing(panel: &RecorderPanelWidgets, playing: bool) {
    if playing {
        panel.play_button.set_icon_name("media-playback-pause-symbolic");
        panel.play_button.set_tooltip_text(Some("Pause"));
    } else {
        panel.play_button.set_icon_name("media-playback-start-symbolic");
        panel.play_button.set_tooltip_text(Some("Play"));
    }
}

/// "0:07 / 0:30"
pub fn timer_text(elapsed_secs: u32, max_secs: u32) -> String {
    format!("{} / {}", format_clock(elapsed_secs), format_clock(max_secs))
}

/// "m:ss"
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// File label for a finalized clip: name plus duration when known.
pub fn describe_capture(capture: &Capture) -> String {
    match capture.duration_secs {
        Some(secs) => format!(
            "{} ({})",
            capture.file_name,
            format_clock(secs.round() as u32)
        ),
        None => capture.file_name.clone(),
    }
}

/// Status line for a finalized clip, by source.
pub fn ready_status(source: CaptureSource) -> &'static str {
    match source {
        CaptureSource::Recording => "Recording complete - Click play to review",
        CaptureSource::Upload => "Audio file uploaded - Click play to review",
    }
}

fn draw_waveform(
    cr: &gtk4::cairo::Context,
    width: i32,
    height: i32,
    levels: &VecDeque<f32>,
) {
    let h = height as f64;
    let bar_w = 3.0;
    let gap = 2.0;
    let total_w = (bar_w + gap) * NUM_BARS as f64 - gap;
    let x_offset = (width as f64 - total_w) / 2.0;

    for (i, &level) in levels.iter().enumerate() {
        let clamped = (level as f64).clamp(0.0, 1.0);
        let bar_h = (2.0 + clamped * (h - 4.0)).max(2.0);
        let x = x_offset + i as f64 * (bar_w + gap);
        let y = (h - bar_h) / 2.0;
        let alpha = 0.4 + 0.6 * clamped;
        cr.set_source_rgba(0.21, 0.52, 0.89, alpha);
        let _ = cr.rectangle(x, y, bar_w, bar_h);
        let _ = cr.fill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(7), "0:07");
        assert_eq!(format_clock(30), "0:30");
        assert_eq!(format_clock(95), "1:35");
    }

    #[test]
    fn timer_text_includes_cap() {
        assert_eq!(timer_text(5, 30), "0:05 / 0:30");
    }
}
