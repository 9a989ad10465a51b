use gtk4::prelude::*;
use libadwaita::prelude::*;

use crate::app::{CloneOrigin, Flow};
use crate::config::Config;
use crate::session::Session;

use super::cloning::{build_cloning_page, CloningWidgets};
use super::enroll::{build_enroll_page, EnrollWidgets};
use super::home::{self, build_home_page, HomeWidgets};
use super::login::{build_login_page, LoginWidgets};
use super::recorder_panel::{self, RecorderPanelWidgets};
use super::testing::{build_testing_page, TestingWidgets};
use super::users::{build_users_page, UsersWidgets};

/// Stack and page handles for navigation changes.
#[derive(Clone)]
pub struct NavHandles {
    stack: libadwaita::ViewStack,
    enroll: libadwaita::ViewStackPage,
    login: libadwaita::ViewStackPage,
    cloning: libadwaita::ViewStackPage,
    testing: libadwaita::ViewStackPage,
    users: libadwaita::ViewStackPage,
}

impl NavHandles {
    pub fn update(&self, authenticated: bool) {
        self.enroll.set_visible(!authenticated);
        self.login.set_visible(!authenticated);
        self.cloning.set_visible(authenticated);
        self.testing.set_visible(authenticated);
        self.users.set_visible(authenticated);
    }

    pub fn go_home(&self) {
        self.stack.set_visible_child_name(Flow::Home.stack_name());
    }
}

/// Shared references to the generation controls of a cloning/testing page.
pub struct ClonePageRefs<'a> {
    pub generate_button: &'a gtk4::Button,
    pub play_button: &'a gtk4::Button,
    pub save_button: &'a gtk4::Button,
    pub status_label: &'a gtk4::Label,
    pub error_label: &'a gtk4::Label,
}

/// Handles returned from building the main window.
pub struct MainWindow {
    pub window: libadwaita::ApplicationWindow,
    pub stack: libadwaita::ViewStack,
    pub toast_overlay: libadwaita::ToastOverlay,
    pub home: HomeWidgets,
    pub enroll: EnrollWidgets,
    pub login: LoginWidgets,
    pub cloning: CloningWidgets,
    pub testing: TestingWidgets,
    pub users: UsersWidgets,
    enroll_nav: libadwaita::ViewStackPage,
    login_nav: libadwaita::ViewStackPage,
    cloning_nav: libadwaita::ViewStackPage,
    testing_nav: libadwaita::ViewStackPage,
    users_nav: libadwaita::ViewStackPage,
}

/// Build the main window: a header with a view switcher over the six
/// pages, wrapped in a toast overlay.
pub fn build_main_window(app: &libadwaita::Application, config: &Config) -> MainWindow {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("Voice Vault")
        .default_width(560)
        .default_height(720)
        .build();

    let stack = libadwaita::ViewStack::new();

    let home = build_home_page(&config.api_base_url);
    let enroll = build_enroll_page(config.max_record_secs);
    let login = build_login_page(config.max_record_secs);
    let cloning = build_cloning_page(config.max_record_secs);
    let testing = build_testing_page();
    let users = build_users_page();

    stack.add_titled_with_icon(
        &scrollable(&home.root),
        Some(Flow::Home.stack_name()),
        "Home",
        "go-home-symbolic",
    );
    let enroll_nav = stack.add_titled_with_icon(
        &scrollable(&enroll.root),
        Some(Flow::Enroll.stack_name()),
        "Enroll",
        "contact-new-symbolic",
    );
    let login_nav = stack.add_titled_with_icon(
        &scrollable(&login.root),
        Some(Flow::Login.stack_name()),
        "Login",
        "dialog-password-symbolic",
    );
    let cloning_nav = stack.add_titled_with_icon(
        &scrollable(&cloning.root),
        Some(Flow::Cloning.stack_name()),
        "Cloning",
        "audio-input-microphone-symbolic",
    );
    let testing_nav = stack.add_titled_with_icon(
        &scrollable(&testing.root),
        Some(Flow::Testing.stack_name()),
        "Testing",
        "audio-speakers-symbolic",
    );
    let users_nav = stack.add_titled_with_icon(
        &scrollable(&users.root),
        Some(Flow::Users.stack_name()),
        "Users",
        "system-users-symbolic",
    );

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();
    let switcher = libadwaita::ViewSwitcher::builder()
        .stack(&stack)
        .policy(libadwaita::ViewSwitcherPolicy::Wide)
        .build();
    header.set_title_widget(Some(&switcher));
    toolbar_view.add_top_bar(&header);
    toolbar_view.set_content(Some(&stack));

    let toast_overlay = libadwaita::ToastOverlay::new();
    toast_overlay.set_child(Some(&toolbar_view));
    window.set_content(Some(&toast_overlay));

    MainWindow {
        window,
        stack,
        toast_overlay,
        home,
        enroll,
        login,
        cloning,
        testing,
        users,
        enroll_nav,
        login_nav,
        cloning_nav,
        testing_nav,
        users_nav,
    }
}

fn scrollable(child: &gtk4::Box) -> gtk4::ScrolledWindow {
    gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(child)
        .build()
}

impl MainWindow {
    /// The capture panel embedded in a page, if it has one.
    pub fn recorder_panel(&self, flow: Flow) -> Option<&RecorderPanelWidgets> {
        match flow {
            Flow::Enroll => Some(&self.enroll.panel),
            Flow::Login => Some(&self.login.panel),
            Flow::Cloning => Some(&self.cloning.panel),
            Flow::Home | Flow::Testing | Flow::Users => None,
        }
    }

    /// The page's inline error label, if it has one.
    pub fn error_label(&self, flow: Flow) -> Option<&gtk4::Label> {
        match flow {
            Flow::Home => None,
            Flow::Enroll => Some(&self.enroll.error_label),
            Flow::Login => Some(&self.login.error_label),
            Flow::Cloning => Some(&self.cloning.error_label),
            Flow::Testing => Some(&self.testing.error_label),
            Flow::Users => Some(&self.users.error_label),
        }
    }

    /// Generation controls for the cloning or testing page.
    pub fn clone_page(&self, origin: CloneOrigin) -> ClonePageRefs<'_> {
        match origin {
            CloneOrigin::Cloning => ClonePageRefs {
                generate_button: &self.cloning.generate_button,
                play_button: &self.cloning.play_button,
                save_button: &self.cloning.save_button,
                status_label: &self.cloning.status_label,
                error_label: &self.cloning.error_label,
            },
            CloneOrigin::Testing => ClonePageRefs {
                generate_button: &self.testing.generate_button,
                play_button: &self.testing.play_button,
                save_button: &self.testing.save_button,
                status_label: &self.testing.status_label,
                error_label: &self.testing.error_label,
            },
        }
    }

    /// Enable a page's submit affordance once a clip is ready.
    pub fn set_capture_ready(&self, flow: Flow, ready: bool) {
        match flow {
            Flow::Enroll => self.enroll.submit_button.set_sensitive(ready),
            Flow::Login => self.login.submit_button.set_sensitive(ready),
            // The cloning reference clip is optional; generate stays live.
            _ => {}
        }
    }

    /// Flip a result play button between play and pause.
    pub fn set_result_playing(&self, origin: CloneOrigin, playing: bool) {
        let page = self.clone_page(origin);
        if playing {
            page.play_button
                .set_icon_name("media-playback-pause-symbolic");
            page.play_button.set_tooltip_text(Some("Pause"));
        } else {
            page.play_button
                .set_icon_name("media-playback-start-symbolic");
            page.play_button
                .set_tooltip_text(Some("Play generated audio"));
        }
    }

    pub fn show_toast(&self, message: &str) {
        let toast = libadwaita::Toast::new(message);
        toast.set_timeout(2);
        self.toast_overlay.add_toast(toast);
    }

    /// Clonable navigation handles. Session changes adjust the stack
    /// through these with no app-state borrow held: toggling page
    /// visibility or the visible child fires the stack's notify signal
    /// synchronously, which re-enters the state.
    pub fn nav(&self) -> NavHandles {
        NavHandles {
            stack: self.stack.clone(),
            enroll: self.enroll_nav.clone(),
            login: self.login_nav.clone(),
            cloning: self.cloning_nav.clone(),
            testing: self.testing_nav.clone(),
            users: self.users_nav.clone(),
        }
    }

    /// Gate pages on the session state: enroll/login while anonymous,
    /// cloning/testing/users once authenticated.
    pub fn update_nav(&self, authenticated: bool) {
        self.nav().update(authenticated);
    }

    /// Reflect the session on the home page.
    pub fn refresh_home(&self, session: Option<&Session>, token_authenticated: bool) {
        home::refresh(&self.home, session, token_authenticated);
    }

    /// Reset the waveform history of every capture panel.
    pub fn clear_waveforms(&self) {
        for flow in [Flow::Enroll, Flow::Login, Flow::Cloning] {
            if let Some(panel) = self.recorder_panel(flow) {
                let mut levels = panel.audio_levels.borrow_mut();
                levels.clear();
                levels.extend(std::iter::repeat(0.0).take(recorder_panel::NUM_BARS));
            }
        }
    }
}
