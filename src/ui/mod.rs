pub mod cloning;
pub mod enroll;
pub mod home;
pub mod login;
pub mod recorder_panel;
pub mod testing;
pub mod users;
pub mod window;

use gtk4::prelude::*;

/// Show or hide a page's inline error message.
pub(crate) fn set_error_label(label: &gtk4::Label, message: Option<&str>) {
    match message {
        Some(msg) => {
            label.set_text(msg);
            label.set_visible(true);
        }
        None => {
            label.set_text("");
            label.set_visible(false);
        }
    }
}

/// Build the standard inline error label used by every page.
pub(crate) fn build_error_label() -> gtk4::Label {
    let label = gtk4::Label::new(None);
    label.add_css_class("error");
    label.set_wrap(true);
    label.set_xalign(0.0);
    label.set_visible(false);
    label
}
