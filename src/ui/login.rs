use gtk4::prelude::*;

use super::recorder_panel::{build_recorder_panel, RecorderPanelWidgets};

/// Handles for the voice login page.
pub struct LoginWidgets {
    pub root: gtk4::Box,
    pub panel: RecorderPanelWidgets,
    pub submit_button: gtk4::Button,
    pub error_label: gtk4::Label,
}

/// Build the voice login page: one recording, one button.
pub fn build_login_page(max_record_secs: u32) -> LoginWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    let title = gtk4::Label::new(Some("Voice Login"));
    title.add_css_class("title-1");
    root.append(&title);

    let subtitle = gtk4::Label::new(Some(
        "Speak to authenticate against your enrolled voice profile",
    ));
    subtitle.add_css_class("dim-label");
    subtitle.set_wrap(true);
    root.append(&subtitle);

    let error_label = super::build_error_label();
    root.append(&error_label);

    let panel = build_recorder_panel(max_record_secs);
    root.append(&panel.root);

    let submit_button = gtk4::Button::builder()
        .label("Authenticate")
        .halign(gtk4::Align::Center)
        .build();
    submit_button.add_css_class("suggested-action");
    submit_button.add_css_class("pill");
    submit_button.set_sensitive(false);
    root.append(&submit_button);

    LoginWidgets {
        root,
        panel,
        submit_button,
        error_label,
    }
}
