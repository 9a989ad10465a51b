mod api;
mod app;
mod capture;
mod config;
mod player;
mod recorder;
mod session;
mod ui;

use std::cell::RefCell;
use std::rc::Rc;

use gtk4::gio;
use gtk4::prelude::*;
use libadwaita::prelude::*;

use app::{AppState, BackendEvent, CaptureStatus, CloneOrigin, EnrollStep, Flow};

fn main() {
    env_logger::init();
    log::info!("Voice Vault starting");

    let application = libadwaita::Application::builder()
        .application_id("com.voicevault.VoiceVault")
        .build();

    application.connect_activate(on_activate);
    application.run();
}

fn on_activate(app: &libadwaita::Application) {
    // Async channel for backend → UI communication
    let (backend_tx, backend_rx) = async_channel::unbounded::<BackendEvent>();

    // Build app state; this restores any persisted session (and logs it
    // out on the spot if its token has expired).
    let state = Rc::new(RefCell::new(AppState::new(backend_tx)));

    // Build UI
    let window = ui::window::build_main_window(app, &state.borrow().config);
    state.borrow_mut().window = Some(window);

    {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        win.update_nav(s.session.is_authenticated());
        win.refresh_home(s.session.current(), s.session.is_token_authenticated());
        ui::enroll::set_step(&win.enroll, s.enroll_step);
        win.window.present();
    }

    // Wire up the three capture panels
    wire_recorder_panel(&state, Flow::Enroll);
    wire_recorder_panel(&state, Flow::Login);
    wire_recorder_panel(&state, Flow::Cloning);

    wire_home(&state);
    wire_enroll(&state);
    wire_login(&state);
    wire_cloning(&state);
    wire_testing(&state);
    wire_users(&state);
    wire_navigation(&state);

    // Probe the service banner in the background; purely informational.
    {
        let api = state.borrow().api.clone();
        state.borrow().tokio_rt.spawn(async move {
            match api.api_info().await {
                Ok(info) => log::info!(
                    "Connected to Voice Vault API: {} ({} endpoints)",
                    info.message,
                    info.endpoints.len()
                ),
                Err(e) => log::warn!("Voice Vault API not reachable: {e}"),
            }
        });
    }

    // Attach backend event handler
    {
        let state_clone = state.clone();
        gtk4::glib::spawn_future_local(async move {
            while let Ok(event) = backend_rx.recv().await {
                app::handle_backend_event(&state_clone, event);
            }
        });
    }

    // Poll for natural end of clip playback
    {
        let state_clone = state.clone();
        gtk4::glib::timeout_add_local(std::time::Duration::from_millis(200), move || {
            app::poll_playback(&state_clone);
            gtk4::glib::ControlFlow::Continue
        });
    }
}

/// Connect one page's capture panel: record toggle, upload, preview
/// playback, reset, and drag-and-drop.
fn wire_recorder_panel(state: &Rc<RefCell<AppState>>, flow: Flow) {
    let (record, upload, play, reset, root) = {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        let panel = win.recorder_panel(flow).expect("page has a capture panel");
        (
            panel.record_button.clone(),
            panel.upload_button.clone(),
            panel.play_button.clone(),
            panel.reset_button.clone(),
            panel.root.clone(),
        )
    };

    {
        let state_clone = state.clone();
        record.connect_clicked(move |_| {
            let recording =
                state_clone.borrow().capture_status == CaptureStatus::Recording;
            if recording {
                app::stop_recording(&state_clone);
            } else {
                app::start_recording(&state_clone, flow);
            }
        });
    }

    {
        let state_clone = state.clone();
        upload.connect_clicked(move |_| {
            open_audio_file_dialog(&state_clone, flow);
        });
    }

    {
        let state_clone = state.clone();
        play.connect_clicked(move |_| {
            app::toggle_preview(&state_clone);
        });
    }

    {
        let state_clone = state.clone();
        reset.connect_clicked(move |_| {
            app::reset_capture(&state_clone, flow);
        });
    }

    // Drag-and-drop an audio file anywhere on the panel
    let drop_target =
        gtk4::DropTarget::new(gio::File::static_type(), gtk4::gdk::DragAction::COPY);
    {
        let state_clone = state.clone();
        drop_target.connect_drop(move |_, value, _, _| {
            if let Ok(file) = value.get::<gio::File>() {
                if let Some(path) = file.path() {
                    app::load_capture_from_file(&state_clone, flow, &path);
                    return true;
                }
            }
            false
        });
    }
    root.add_controller(drop_target);
}

/// File picker for uploads, filtered to the supported audio types.
fn open_audio_file_dialog(state: &Rc<RefCell<AppState>>, flow: Flow) {
    let parent = state.borrow().window.as_ref().unwrap().window.clone();

    let filter = gtk4::FileFilter::new();
    filter.set_name(Some("Audio files"));
    for ext in capture::SUPPORTED_EXTENSIONS {
        filter.add_suffix(ext);
    }
    let filters = gio::ListStore::new::<gtk4::FileFilter>();
    filters.append(&filter);

    let dialog = gtk4::FileDialog::builder()
        .title("Select an audio file")
        .filters(&filters)
        .build();

    let state_clone = state.clone();
    dialog.open(Some(&parent), None::<&gio::Cancellable>, move |result| {
        if let Ok(file) = result {
            if let Some(path) = file.path() {
                app::load_capture_from_file(&state_clone, flow, &path);
            }
        }
    });
}

fn wire_home(state: &Rc<RefCell<AppState>>) {
    let (enroll_button, login_button, logout_button, api_row, stack) = {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        (
            win.home.enroll_button.clone(),
            win.home.login_button.clone(),
            win.home.logout_button.clone(),
            win.home.api_row.clone(),
            win.stack.clone(),
        )
    };

    {
        let stack = stack.clone();
        enroll_button.connect_clicked(move |_| {
            stack.set_visible_child_name(Flow::Enroll.stack_name());
        });
    }
    {
        let stack = stack.clone();
        login_button.connect_clicked(move |_| {
            stack.set_visible_child_name(Flow::Login.stack_name());
        });
    }

    {
        let state_clone = state.clone();
        logout_button.connect_clicked(move |_| {
            log::info!("Signing out");
            {
                let mut s = state_clone.borrow_mut();
                s.session.logout();
                s.cloning_result = None;
                s.testing_result = None;
                s.result_player.unload();
                s.result_origin = None;
            }
            let active = state_clone.borrow().active_flow;
            app::reset_capture(&state_clone, active);

            let nav = {
                let s = state_clone.borrow();
                if let Some(ref win) = s.window {
                    for origin in [CloneOrigin::Cloning, CloneOrigin::Testing] {
                        let page = win.clone_page(origin);
                        page.play_button.set_sensitive(false);
                        page.save_button.set_sensitive(false);
                        page.status_label.set_text("");
                    }
                    win.refresh_home(None, false);
                    win.show_toast("Signed out");
                }
                s.window.as_ref().map(|w| w.nav())
            };
            // Stack signals re-enter the state; navigate with no borrow held.
            if let Some(nav) = nav {
                nav.update(false);
                nav.go_home();
            }
        });
    }

    // Base URL edits take effect for the next request
    {
        let state_clone = state.clone();
        api_row.connect_changed(move |row| {
            let url = row.text().to_string();
            let mut s = state_clone.borrow_mut();
            s.config.api_base_url = url;
            if let Err(e) = s.config.save() {
                log::warn!("Failed to save config: {e}");
            }
            s.rebuild_api_client();
        });
    }
}

fn wire_enroll(state: &Rc<RefCell<AppState>>) {
    let (continue_button, back_button, submit_button) = {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        (
            win.enroll.continue_button.clone(),
            win.enroll.back_button.clone(),
            win.enroll.submit_button.clone(),
        )
    };

    {
        let state_clone = state.clone();
        continue_button.connect_clicked(move |_| {
            let name = {
                let s = state_clone.borrow();
                s.window
                    .as_ref()
                    .map(|w| w.enroll.name_row.text().to_string())
                    .unwrap_or_default()
            };
            if name.trim().is_empty() {
                let s = state_clone.borrow();
                if let Some(ref win) = s.window {
                    ui::set_error_label(
                        &win.enroll.error_label,
                        Some("Please enter your name"),
                    );
                }
                return;
            }
            state_clone.borrow_mut().enroll_step = EnrollStep::Recording;
            let s = state_clone.borrow();
            if let Some(ref win) = s.window {
                ui::set_error_label(&win.enroll.error_label, None);
                ui::enroll::set_step(&win.enroll, EnrollStep::Recording);
            }
        });
    }

    {
        let state_clone = state.clone();
        back_button.connect_clicked(move |_| {
            app::reset_capture(&state_clone, Flow::Enroll);
            state_clone.borrow_mut().enroll_step = EnrollStep::NameEntry;
            let s = state_clone.borrow();
            if let Some(ref win) = s.window {
                ui::enroll::set_step(&win.enroll, EnrollStep::NameEntry);
            }
        });
    }

    {
        let state_clone = state.clone();
        submit_button.connect_clicked(move |_| {
            let name = {
                let s = state_clone.borrow();
                s.window
                    .as_ref()
                    .map(|w| w.enroll.name_row.text().to_string())
                    .unwrap_or_default()
            };
            app::dispatch_enroll(&state_clone, &name);
        });
    }
}

fn wire_login(state: &Rc<RefCell<AppState>>) {
    let submit_button = {
        let s = state.borrow();
        s.window.as_ref().unwrap().login.submit_button.clone()
    };
    let state_clone = state.clone();
    submit_button.connect_clicked(move |_| {
        app::dispatch_authenticate(&state_clone);
    });
}

fn wire_cloning(state: &Rc<RefCell<AppState>>) {
    let (generate_button, play_button, save_button) = {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        (
            win.cloning.generate_button.clone(),
            win.cloning.play_button.clone(),
            win.cloning.save_button.clone(),
        )
    };

    {
        let state_clone = state.clone();
        generate_button.connect_clicked(move |_| {
            let question = {
                let s = state_clone.borrow();
                s.window
                    .as_ref()
                    .map(|w| ui::cloning::question_text(&w.cloning))
                    .unwrap_or_default()
            };
            app::dispatch_clone(&state_clone, CloneOrigin::Cloning, &question);
        });
    }
    {
        let state_clone = state.clone();
        play_button.connect_clicked(move |_| {
            app::toggle_result(&state_clone, CloneOrigin::Cloning);
        });
    }
    {
        let state_clone = state.clone();
        save_button.connect_clicked(move |_| {
            save_result_dialog(&state_clone, CloneOrigin::Cloning);
        });
    }
}

fn wire_testing(state: &Rc<RefCell<AppState>>) {
    let (generate_button, play_button, save_button) = {
        let s = state.borrow();
        let win = s.window.as_ref().unwrap();
        (
            win.testing.generate_button.clone(),
            win.testing.play_button.clone(),
            win.testing.save_button.clone(),
        )
    };

    {
        let state_clone = state.clone();
        generate_button.connect_clicked(move |_| {
            let text = {
                let s = state_clone.borrow();
                s.window
                    .as_ref()
                    .map(|w| ui::testing::testing_text(&w.testing))
                    .unwrap_or_default()
            };
            app::dispatch_clone(&state_clone, CloneOrigin::Testing, &text);
        });
    }
    {
        let state_clone = state.clone();
        play_button.connect_clicked(move |_| {
            app::toggle_result(&state_clone, CloneOrigin::Testing);
        });
    }
    {
        let state_clone = state.clone();
        save_button.connect_clicked(move |_| {
            save_result_dialog(&state_clone, CloneOrigin::Testing);
        });
    }
}

fn wire_users(state: &Rc<RefCell<AppState>>) {
    let refresh_button = {
        let s = state.borrow();
        s.window.as_ref().unwrap().users.refresh_button.clone()
    };
    let state_clone = state.clone();
    refresh_button.connect_clicked(move |_| {
        app::dispatch_list_users(&state_clone);
    });
}

/// Page switches reset any in-progress capture and lazily fetch the user
/// listing.
fn wire_navigation(state: &Rc<RefCell<AppState>>) {
    let stack = {
        let s = state.borrow();
        s.window.as_ref().unwrap().stack.clone()
    };

    let state_clone = state.clone();
    stack.connect_visible_child_name_notify(move |stack| {
        let Some(name) = stack.visible_child_name() else {
            return;
        };
        let Some(flow) = Flow::from_stack_name(&name) else {
            return;
        };

        let previous = state_clone.borrow().active_flow;
        if previous != flow {
            app::reset_capture(&state_clone, previous);
            state_clone.borrow_mut().active_flow = flow;
            let s = state_clone.borrow();
            if let Some(ref win) = s.window {
                win.clear_waveforms();
            }
        }

        if flow == Flow::Users {
            app::dispatch_list_users(&state_clone);
        }
    });
}

/// Save the generated clip with a file chooser.
fn save_result_dialog(state: &Rc<RefCell<AppState>>, origin: CloneOrigin) {
    let parent = state.borrow().window.as_ref().unwrap().window.clone();

    let dialog = gtk4::FileDialog::builder()
        .title("Save generated audio")
        .initial_name("voice-clone-output.wav")
        .build();

    let state_clone = state.clone();
    dialog.save(Some(&parent), None::<&gio::Cancellable>, move |result| {
        let Ok(file) = result else { return };
        let Some(path) = file.path() else { return };

        let bytes = {
            let s = state_clone.borrow();
            match origin {
                CloneOrigin::Cloning => s.cloning_result.clone(),
                CloneOrigin::Testing => s.testing_result.clone(),
            }
        };
        let Some(bytes) = bytes else { return };

        match std::fs::write(&path, &bytes) {
            Ok(()) => {
                log::info!("Saved generated audio to {}", path.display());
                let s = state_clone.borrow();
                if let Some(ref win) = s.window {
                    win.show_toast("Audio saved");
                }
            }
            Err(e) => log::error!("Failed to save audio: {e}"),
        }
    });
}
