use gtk4::prelude::*;
use libadwaita::prelude::*;

use super::recorder_panel::{build_recorder_panel, RecorderPanelWidgets};

/// Handles for the voice cloning page.
pub struct CloningWidgets {
    pub root: gtk4::Box,
    pub panel: RecorderPanelWidgets,
    pub question_view: gtk4::TextView,
    pub seed_row: libadwaita::EntryRow,
    pub generate_button: gtk4::Button,
    pub play_button: gtk4::Button,
    pub save_button: gtk4::Button,
    pub status_label: gtk4::Label,
    pub error_label: gtk4::Label,
}

/// Build the voice cloning page: optional reference clip, a question for
/// the cloned voice to answer, an optional generation seed.
pub fn build_cloning_page(max_record_secs: u32) -> CloningWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    let title = gtk4::Label::new(Some("Voice Cloning"));
    title.add_css_class("title-1");
    root.append(&title);

    let subtitle = gtk4::Label::new(Some(
        "Ask a question and hear the answer spoken in your cloned voice",
    ));
    subtitle.add_css_class("dim-label");
    subtitle.set_wrap(true);
    root.append(&subtitle);

    let error_label = super::build_error_label();
    root.append(&error_label);

    // Optional reference clip; without one the service falls back to the
    // enrolled profile audio.
    let reference_group = libadwaita::PreferencesGroup::new();
    reference_group.set_title("Reference Audio (optional)");
    root.append(&reference_group);

    let panel = build_recorder_panel(max_record_secs);
    root.append(&panel.root);

    let question_group = libadwaita::PreferencesGroup::new();
    question_group.set_title("Question");
    root.append(&question_group);

    let question_frame = gtk4::Frame::new(None);
    let question_view = gtk4::TextView::new();
    question_view.set_wrap_mode(gtk4::WrapMode::WordChar);
    question_view.set_top_margin(8);
    question_view.set_bottom_margin(8);
    question_view.set_left_margin(8);
    question_view.set_right_margin(8);
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .min_content_height(80)
        .child(&question_view)
        .build();
    question_frame.set_child(Some(&scrolled));
    root.append(&question_frame);

    let seed_group = libadwaita::PreferencesGroup::new();
    let seed_row = libadwaita::EntryRow::builder()
        .title("Generation seed (optional)")
        .build();
    seed_group.add(&seed_row);
    root.append(&seed_group);

    let actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    actions.set_halign(gtk4::Align::Center);

    let generate_button = gtk4::Button::builder().label("Generate Answer").build();
    generate_button.add_css_class("suggested-action");
    generate_button.add_css_class("pill");
    actions.append(&generate_button);

    let play_button = gtk4::Button::from_icon_name("media-playback-start-symbolic");
    play_button.add_css_class("circular");
    play_button.set_tooltip_text(Some("Play generated audio"));
    play_button.set_sensitive(false);
    actions.append(&play_button);

    let save_button = gtk4::Button::from_icon_name("document-save-symbolic");
    save_button.add_css_class("circular");
    save_button.set_tooltip_text(Some("Save generated audio"));
    save_button.set_sensitive(false);
    actions.append(&save_button);

    root.append(&actions);

    let status_label = gtk4::Label::new(None);
    status_label.add_css_class("dim-label");
    root.append(&status_label);

    CloningWidgets {
        root,
        panel,
        question_view,
        seed_row,
        generate_button,
        play_button,
        save_button,
        status_label,
        error_label,
    }
}

/// Current question text.
pub fn question_text(widgets: &CloningWidgets) -> String {
    let buffer = widgets.question_view.buffer();
    buffer
        .text(&buffer.start_iter(), &buffer.end_iter(), false)
        .to_string()
}
