use gtk4::prelude::*;
use libadwaita::prelude::*;

/// Canned prompts for quickly trying out a cloned voice.
const SAMPLE_TEXTS: [&str; 5] = [
    "Hello, this is my cloned voice speaking. How does it sound?",
    "The weather today is absolutely beautiful with clear blue skies.",
    "Thank you for trying out Voice Vault's voice cloning technology.",
    "I hope you're having a wonderful day today!",
    "Voice cloning technology has come a long way in recent years.",
];

/// Handles for the voice testing page.
pub struct TestingWidgets {
    pub root: gtk4::Box,
    pub text_view: gtk4::TextView,
    pub generate_button: gtk4::Button,
    pub play_button: gtk4::Button,
    pub save_button: gtk4::Button,
    pub status_label: gtk4::Label,
    pub error_label: gtk4::Label,
}

/// Build the voice testing page: free text in, generated speech out.
/// No reference audio is attached; generation uses the enrolled profile.
pub fn build_testing_page() -> TestingWidgets {
    let root = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    root.set_margin_start(24);
    root.set_margin_end(24);
    root.set_margin_top(16);
    root.set_margin_bottom(16);

    let title = gtk4::Label::new(Some("Voice Testing"));
    title.add_css_class("title-1");
    root.append(&title);

    let subtitle = gtk4::Label::new(Some("Hear any text spoken in your cloned voice"));
    subtitle.add_css_class("dim-label");
    root.append(&subtitle);

    let error_label = super::build_error_label();
    root.append(&error_label);

    let text_frame = gtk4::Frame::new(None);
    let text_view = gtk4::TextView::new();
    text_view.set_wrap_mode(gtk4::WrapMode::WordChar);
    text_view.set_top_margin(8);
    text_view.set_bottom_margin(8);
    text_view.set_left_margin(8);
    text_view.set_right_margin(8);
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .min_content_height(100)
        .child(&text_view)
        .build();
    text_frame.set_child(Some(&scrolled));
    root.append(&text_frame);

    // Sample prompts fill the text view directly.
    let samples_group = libadwaita::PreferencesGroup::new();
    samples_group.set_title("Sample Texts");
    for sample in SAMPLE_TEXTS {
        let row = libadwaita::ActionRow::builder()
            .title(sample)
            .activatable(true)
            .build();
        let buffer = text_view.buffer();
        row.connect_activated(move |_| {
            buffer.set_text(sample);
        });
        samples_group.add(&row);
    }
    root.append(&samples_group);

    let actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    actions.set_halign(gtk4::Align::Center);

    let generate_button = gtk4::Button::builder().label("Generate Audio").build();
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

    TestingWidgets {
        root,
        text_view,
        generate_button,
        play_button,
        save_button,
        status_label,
        error_label,
    }
}

/// Current text to synthesize.
pub fn testing_text(widgets: &TestingWidgets) -> String {
    let buffer = widgets.text_view.buffer();
    buffer
        .text(&buffer.start_iter(), &buffer.end_iter(), false)
        .to_string()
}
