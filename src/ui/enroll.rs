use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::app::EnrollStep;

use super::recorder_panel::{build_recorder_panel, RecorderPanelWidgets};

/// Handles for the enrollment page.
pub struct EnrollWidgets {
    pub root: gtk4::Box,
    pub name_box: gtk4::Box,
    pub name_row: libadwaita::EntryRow,
    pub continue_button: gtk4::Button,
    pub record_box: gtk4::Box,
    pub back_button: gtk4::Button,
    pub panel: RecorderPanelWidgets,
    pub submit_button: gtk4::Button,
    pub error_label: gtk4::Label,
}

/// Build the two-step enrollment page: name entry, then voice recording.
pub fn build_enroll_page(max_record_secs: u32) -> EnrollWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    let title = gtk4::Label::new(Some("Enroll Your Voice"));
    title.add_css_class("title-1");
    root.append(&title);

    let subtitle = gtk4::Label::new(Some("Create your secure voice profile with Voice Vault"));
    subtitle.add_css_class("dim-label");
    root.append(&subtitle);

    let error_label = super::build_error_label();
    root.append(&error_label);

    // --- Step 1: name entry ---
    let name_box = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    name_box.set_margin_top(12);

    let name_group = libadwaita::PreferencesGroup::new();
    name_group.set_title("Your Name");

    let name_row = libadwaita::EntryRow::builder().title("Full name").build();
    name_group.add(&name_row);
    name_box.append(&name_group);

    let continue_button = gtk4::Button::builder()
        .label("Continue")
        .halign(gtk4::Align::Center)
        .build();
    continue_button.add_css_class("suggested-action");
    continue_button.add_css_class("pill");
    name_box.append(&continue_button);

    root.append(&name_box);

    // --- Step 2: voice sample ---
    let record_box = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    record_box.set_margin_top(12);
    record_box.set_visible(false);

    let instructions = gtk4::Label::new(Some(
        "Record a short voice sample. Speak naturally for a few seconds.",
    ));
    instructions.add_css_class("dim-label");
    instructions.set_wrap(true);
    record_box.append(&instructions);

    let panel = build_recorder_panel(max_record_secs);
    record_box.append(&panel.root);

    let actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    actions.set_halign(gtk4::Align::Center);

    let back_button = gtk4::Button::builder().label("Back").build();
    back_button.add_css_class("pill");
    actions.append(&back_button);

    let submit_button = gtk4::Button::builder().label("Enroll Voice").build();
    submit_button.add_css_class("suggested-action");
    submit_button.add_css_class("pill");
    submit_button.set_sensitive(false);
    actions.append(&submit_button);

    record_box.append(&actions);
    root.append(&record_box);

    EnrollWidgets {
        root,
        name_box,
        name_row,
        continue_button,
        record_box,
        back_button,
        panel,
        submit_button,
        error_label,
    }
}

/// Show the widgets for the given enrollment step.
pub fn set_step(widgets: &EnrollWidgets, step: EnrollStep) {
    widgets.name_box.set_visible(step == EnrollStep::NameEntry);
    widgets.record_box.set_visible(step == EnrollStep::Recording);
}
