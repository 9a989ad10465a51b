use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::app::{self, AppState};

/// Handles for the user management page.
pub struct UsersWidgets {
    pub root: gtk4::Box,
    pub count_label: gtk4::Label,
    pub refresh_button: gtk4::Button,
    pub list_box: gtk4::ListBox,
    pub empty_label: gtk4::Label,
    pub error_label: gtk4::Label,
}

/// Build the enrolled-users page.
pub fn build_users_page() -> UsersWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    let header = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);

    let title = gtk4::Label::new(Some("Enrolled Users"));
    title.add_css_class("title-2");
    title.set_hexpand(true);
    title.set_xalign(0.0);
    header.append(&title);

    let count_label = gtk4::Label::new(None);
    count_label.add_css_class("dim-label");
    header.append(&count_label);

    let refresh_button = gtk4::Button::from_icon_name("view-refresh-symbolic");
    refresh_button.set_tooltip_text(Some("Reload the user list"));
    header.append(&refresh_button);

    root.append(&header);

    let error_label = super::build_error_label();
    root.append(&error_label);

    let list_box = gtk4::ListBox::new();
    list_box.set_selection_mode(gtk4::SelectionMode::None);
    list_box.add_css_class("boxed-list");
    root.append(&list_box);

    let empty_label = gtk4::Label::new(Some("No users enrolled yet."));
    empty_label.add_css_class("dim-label");
    empty_label.set_margin_top(24);
    root.append(&empty_label);

    UsersWidgets {
        root,
        count_label,
        refresh_button,
        list_box,
        empty_label,
        error_label,
    }
}

/// Rebuild the user rows from the in-memory listing.
pub fn populate(state: &Rc<RefCell<AppState>>) {
    let users: Vec<String> = state.borrow().users.clone();

    let s = state.borrow();
    let Some(ref win) = s.window else { return };
    let widgets = &win.users;

    while let Some(child) = widgets.list_box.first_child() {
        widgets.list_box.remove(&child);
    }

    widgets
        .count_label
        .set_text(&format!("{} enrolled", users.len()));
    widgets.empty_label.set_visible(users.is_empty());

    let parent_window = win.window.clone();
    for name in users {
        let row = libadwaita::ActionRow::builder().title(&name).build();

        let avatar = libadwaita::Avatar::new(28, Some(&name), true);
        row.add_prefix(&avatar);

        let delete_button = gtk4::Button::from_icon_name("user-trash-symbolic");
        delete_button.add_css_class("flat");
        delete_button.set_valign(gtk4::Align::Center);
        delete_button.set_tooltip_text(Some("Delete this voice profile"));

        let state_for_delete = state.clone();
        let window_for_delete = parent_window.clone();
        delete_button.connect_clicked(move |_| {
            confirm_delete(&state_for_delete, &window_for_delete, &name);
        });
        row.add_suffix(&delete_button);

        widgets.list_box.append(&row);
    }
}

/// Ask before removing a profile; deletion cannot be undone server-side.
fn confirm_delete(
    state: &Rc<RefCell<AppState>>,
    parent: &libadwaita::ApplicationWindow,
    name: &str,
) {
    let dialog = libadwaita::AlertDialog::new(
        Some("Delete user?"),
        Some(&format!(
            "Are you sure you want to delete user \"{name}\"? This action cannot be undone."
        )),
    );
    dialog.add_responses(&[("cancel", "Cancel"), ("delete", "Delete")]);
    dialog.set_response_appearance("delete", libadwaita::ResponseAppearance::Destructive);
    dialog.set_default_response(Some("cancel"));
    dialog.set_close_response("cancel");

    let state_for_response = state.clone();
    let name = name.to_string();
    dialog.connect_response(Some("delete"), move |_, _| {
        app::dispatch_delete_user(&state_for_response, name.clone());
    });

    dialog.present(Some(parent));
}
