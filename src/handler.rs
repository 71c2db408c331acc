use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::api::ApiClient;
use crate::app::{App, LoginField, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
        AppEvent::LoggedIn(result) => {
            let logged_in = result.is_ok();
            app.finish_login(result);
            // Chat-screen entry: load the transcript right away.
            if logged_in {
                spawn_history_fetch(&app.api, tx);
            }
        }
        AppEvent::History(result) => app.finish_history(result),
        AppEvent::Sent(result) => app.finish_send(result),
    }
}

pub fn spawn_history_fetch(api: &ApiClient, tx: &UnboundedSender<AppEvent>) {
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = api.chat_logs().await;
        let _ = tx.send(AppEvent::History(result));
    });
}

fn spawn_login(api: &ApiClient, username: String, password: String, tx: &UnboundedSender<AppEvent>) {
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = api.login(&username, &password).await.map(|_| ());
        let _ = tx.send(AppEvent::LoggedIn(result));
    });
}

fn spawn_send(api: &ApiClient, text: String, tx: &UnboundedSender<AppEvent>) {
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = api.send_message(&text).await;
        let _ = tx.send(AppEvent::Sent(result));
    });
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Global keys that work on any screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen {
        Screen::Login => handle_login_key(app, key, tx),
        Screen::Chat => handle_chat_key(app, key, tx),
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,

        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login_field = match app.login_field {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
        }

        KeyCode::Enter => {
            if let Some((username, password)) = app.login_submit() {
                spawn_login(&app.api, username, password, tx);
            }
        }

        KeyCode::Backspace => {
            match app.login_field {
                LoginField::Username => app.username.pop(),
                LoginField::Password => app.password.pop(),
            };
        }

        KeyCode::Char(c) => {
            match app.login_field {
                LoginField::Username => app.username.push(c),
                LoginField::Password => app.password.push(c),
            };
        }

        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Log out: clear the token and return to the login screen
    if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
        info!("logout requested");
        app.logout();
        return;
    }

    match key.code {
        // Transcript scrolling
        KeyCode::Up => app.scroll = app.scroll.saturating_sub(1),
        KeyCode::Down => app.scroll = app.scroll.saturating_add(1),
        KeyCode::PageUp => {
            app.scroll = app.scroll.saturating_sub(app.chat_height / 2);
        }
        KeyCode::PageDown => {
            app.scroll = app.scroll.saturating_add(app.chat_height / 2);
        }

        KeyCode::Enter => {
            if let Some(text) = app.submit_message() {
                spawn_send(&app.api, text, tx);
            }
        }

        // Input editing is locked while a send is in flight, like the
        // disabled input field in a web form.
        _ if app.busy() => {}

        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }

        _ => {}
    }
}
