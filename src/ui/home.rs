use chrono::Local;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::session::Session;

/// Handles for the landing/profile page.
pub struct HomeWidgets {
    pub root: gtk4::Box,
    pub anon_box: gtk4::Box,
    pub enroll_button: gtk4::Button,
    pub login_button: gtk4::Button,
    pub profile_box: gtk4::Box,
    pub name_label: gtk4::Label,
    pub enrolled_label: gtk4::Label,
    pub cloned_label: gtk4::Label,
    pub token_label: gtk4::Label,
    pub logout_button: gtk4::Button,
    pub api_row: libadwaita::EntryRow,
}

/// Build the home page: a welcome view while anonymous, the profile once
/// a session exists, and the service settings in both.
pub fn build_home_page(api_base_url: &str) -> HomeWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    // --- Anonymous view ---
    let anon_box = gtk4::Box::new(gtk4::Orientation::Vertical, 12);

    let status = libadwaita::StatusPage::builder()
        .icon_name("audio-input-microphone-symbolic")
        .title("Voice Vault")
        .description("Your voice is your password. Enroll a voice profile or log in with a spoken sample.")
        .build();
    anon_box.append(&status);

    let anon_actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    anon_actions.set_halign(gtk4::Align::Center);

    let enroll_button = gtk4::Button::builder().label("Enroll Your Voice").build();
    enroll_button.add_css_class("suggested-action");
    enroll_button.add_css_class("pill");
    anon_actions.append(&enroll_button);

    let login_button = gtk4::Button::builder().label("Voice Login").build();
    login_button.add_css_class("pill");
    anon_actions.append(&login_button);

    anon_box.append(&anon_actions);
    root.append(&anon_box);

    // --- Profile view ---
    let profile_box = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    profile_box.set_visible(false);

    let profile_group = libadwaita::PreferencesGroup::new();
    profile_group.set_title("Profile");

    let name_row = libadwaita::ActionRow::builder().title("Name").build();
    let name_label = gtk4::Label::new(None);
    name_label.add_css_class("dim-label");
    name_row.add_suffix(&name_label);
    profile_group.add(&name_row);

    let enrolled_row = libadwaita::ActionRow::builder()
        .title("Voice Enrolled")
        .build();
    let enrolled_label = gtk4::Label::new(None);
    enrolled_label.add_css_class("dim-label");
    enrolled_row.add_suffix(&enrolled_label);
    profile_group.add(&enrolled_row);

    let cloned_row = libadwaita::ActionRow::builder().title("Clone Ready").build();
    let cloned_label = gtk4::Label::new(None);
    cloned_label.add_css_class("dim-label");
    cloned_row.add_suffix(&cloned_label);
    profile_group.add(&cloned_row);

    let token_row = libadwaita::ActionRow::builder()
        .title("Access Token")
        .build();
    let token_label = gtk4::Label::new(None);
    token_label.add_css_class("dim-label");
    token_row.add_suffix(&token_label);
    profile_group.add(&token_row);

    profile_box.append(&profile_group);

    let logout_button = gtk4::Button::builder()
        .label("Sign Out")
        .halign(gtk4::Align::Center)
        .build();
    logout_button.add_css_class("destructive-action");
    logout_button.add_css_class("pill");
    profile_box.append(&logout_button);

    root.append(&profile_box);

    // --- Service settings ---
    let service_group = libadwaita::PreferencesGroup::new();
    service_group.set_title("Service");
    service_group.set_margin_top(12);

    let api_row = libadwaita::EntryRow::builder()
        .title("API base URL")
        .text(api_base_url)
        .build();
    service_group.add(&api_row);
    root.append(&service_group);

    HomeWidgets {
        root,
        anon_box,
        enroll_button,
        login_button,
        profile_box,
        name_label,
        enrolled_label,
        cloned_label,
        token_label,
        logout_button,
        api_row,
    }
}

/// Reflect the current session on the home page.
pub fn refresh(widgets: &HomeWidgets, session: Option<&Session>, token_authenticated: bool) {
    let Some(session) = session else {
        widgets.anon_box.set_visible(true);
        widgets.profile_box.set_visible(false);
        return;
    };

    widgets.anon_box.set_visible(false);
    widgets.profile_box.set_visible(true);
    widgets.name_label.set_text(&session.name);
    widgets
        .enrolled_label
        .set_text(if session.voice_enrolled { "Yes" } else { "No" });
    widgets
        .cloned_label
        .set_text(if session.voice_cloned { "Yes" } else { "No" });

    let token_text = if token_authenticated {
        match session.token_expires_at {
            Some(expires) => format!(
                "Valid until {}",
                expires.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            ),
            None => "Valid".to_string(),
        }
    } else {
        "Not authenticated".to_string()
    };
    widgets.token_label.set_text(&token_text);
}
