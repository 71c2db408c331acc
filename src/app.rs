use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, ChatRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Chat request state. `Awaiting` means one send is in flight; submission
/// is a no-op until the outcome comes back through the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Awaiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// Client-only rendering unit. History rows get `u-<id>`/`a-<id>` ids from
/// the server record; optimistic bubbles get a local uuid. The two id
/// spaces are never reconciled.
#[derive(Debug, Clone)]
pub struct DisplayMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

/// Expand server records into display messages: the user message always,
/// the assistant message only when a reply is present.
pub fn expand_records(records: &[ChatRecord]) -> Vec<DisplayMessage> {
    let mut messages = Vec::new();
    for record in records {
        messages.push(DisplayMessage {
            id: format!("u-{}", record.id),
            role: Role::User,
            text: record.message.clone(),
        });
        if !record.reply.is_empty() {
            messages.push(DisplayMessage {
                id: format!("a-{}", record.id),
                role: Role::Assistant,
                text: record.reply.clone(),
            });
        }
    }
    messages
}

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,

    // Login form state
    pub username: String,
    pub password: String,
    pub login_field: LoginField,
    pub login_error: Option<String>,
    pub login_busy: bool,

    // Chat transcript state
    pub messages: Vec<DisplayMessage>,
    pub chat_state: ChatState,
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars
    pub scroll: u16,
    pub chat_height: u16, // inner height of the transcript, for scroll math
    pub chat_width: u16,  // inner width of the transcript, for wrap math

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub api: ApiClient,
}

impl App {
    /// Session guard, landing edition: a stored token starts us on the
    /// chat screen (the caller then kicks off the history fetch), no token
    /// starts us on login. Local check only.
    pub fn new(api: ApiClient) -> Self {
        let screen = if api.has_token() {
            Screen::Chat
        } else {
            Screen::Login
        };

        Self {
            should_quit: false,
            screen,

            username: String::new(),
            password: String::new(),
            login_field: LoginField::Username,
            login_error: None,
            login_busy: false,

            messages: Vec::new(),
            chat_state: ChatState::Idle,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            api,
        }
    }

    pub fn busy(&self) -> bool {
        self.chat_state == ChatState::Awaiting
    }

    // Login flow

    /// Returns the credentials to exchange if a login attempt should start.
    pub fn login_submit(&mut self) -> Option<(String, String)> {
        if self.login_busy {
            return None;
        }
        if self.username.is_empty() || self.password.is_empty() {
            self.login_error = Some("Username and password are required".to_string());
            return None;
        }
        self.login_error = None;
        self.login_busy = true;
        Some((self.username.clone(), self.password.clone()))
    }

    pub fn finish_login(&mut self, result: Result<(), ApiError>) {
        self.login_busy = false;
        match result {
            Ok(()) => {
                info!(username = %self.username, "logged in");
                self.password.clear();
                self.login_error = None;
                self.screen = Screen::Chat;
            }
            Err(err) => {
                self.login_error = Some(err.to_string());
            }
        }
    }

    /// Drop the session and return to the login screen.
    pub fn logout(&mut self) {
        info!("logged out");
        self.api.logout();
        self.reset_to_login();
    }

    fn reset_to_login(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.cursor = 0;
        self.scroll = 0;
        self.chat_state = ChatState::Idle;
        self.screen = Screen::Login;
    }

    // History

    /// Rebuild the transcript wholesale from server records.
    pub fn load_history(&mut self, records: &[ChatRecord]) {
        self.messages = expand_records(records);
        self.scroll_to_bottom();
    }

    pub fn finish_history(&mut self, result: Result<Vec<ChatRecord>, ApiError>) {
        match result {
            Ok(records) => {
                debug!(count = records.len(), "history loaded");
                self.load_history(&records);
            }
            Err(err) => {
                // Guard: a failed history fetch redirects to login. A 401
                // already cleared the token inside the client; any other
                // failure leaves it in place for the next attempt.
                warn!("history fetch failed: {err}");
                self.reset_to_login();
            }
        }
    }

    // Chat view state machine

    /// Idle -> Awaiting. Returns the text to send if the transition
    /// happened: appends the optimistic user bubble and clears the input.
    /// Whitespace-only input and submissions while a send is in flight are
    /// no-ops.
    pub fn submit_message(&mut self) -> Option<String> {
        if self.chat_state == ChatState::Awaiting {
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        let message = DisplayMessage {
            id: format!("local-{}", Uuid::new_v4()),
            role: Role::User,
            text: text.clone(),
        };
        debug!(id = %message.id, "optimistic user bubble");
        self.messages.push(message);

        self.input.clear();
        self.cursor = 0;
        self.chat_state = ChatState::Awaiting;
        self.scroll_to_bottom();
        Some(text)
    }

    /// Awaiting -> Idle. A failure becomes an assistant-styled error bubble
    /// in the transcript; the input is not restored.
    pub fn finish_send(&mut self, result: Result<ChatRecord, ApiError>) {
        let text = match result {
            Ok(record) => {
                debug!(id = record.id, "reply received");
                record.reply
            }
            Err(err) => {
                warn!("send failed: {err}");
                format!("Error: {err}")
            }
        };
        self.messages.push(DisplayMessage {
            id: format!("local-{}", Uuid::new_v4()),
            role: Role::Assistant,
            text,
        });
        self.chat_state = ChatState::Idle;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the transcript so the newest bubble (and the typing
    /// indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        // Use actual transcript width for wrap calculation, default to 50
        // before the first render sizes it.
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // Role line ("You:" or "AI:")
            for line in msg.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.busy() {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenStore;

    fn record(id: i64, message: &str, reply: &str) -> ChatRecord {
        ChatRecord {
            id,
            message: message.to_string(),
            reply: reply.to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    fn test_app() -> (tempfile::TempDir, TokenStore, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        let api = ApiClient::new("http://localhost:0", store.clone());
        let app = App::new(api);
        (dir, store, app)
    }

    #[test]
    fn expand_with_reply_yields_user_then_assistant() {
        let messages = expand_records(&[record(1, "hi", "hello")]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "u-1");
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "hi");
        assert_eq!(messages[1].id, "a-1");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, "hello");
    }

    #[test]
    fn expand_without_reply_yields_user_only() {
        let messages = expand_records(&[record(7, "anyone there?", "")]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "u-7");
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn expand_preserves_record_order() {
        let messages = expand_records(&[record(1, "a", "b"), record(2, "c", "")]);
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["u-1", "a-1", "u-2"]);
    }

    #[test]
    fn load_history_is_idempotent() {
        let (_dir, _store, mut app) = test_app();
        let records = [record(1, "hi", "hello"), record(2, "bye", "see ya")];

        app.load_history(&records);
        let first: Vec<String> = app.messages.iter().map(|m| m.id.clone()).collect();

        app.load_history(&records);
        let second: Vec<String> = app.messages.iter().map(|m| m.id.clone()).collect();

        assert_eq!(first, second);
        assert_eq!(app.messages.len(), 4);
    }

    #[test]
    fn guard_starts_on_login_without_token() {
        let (_dir, _store, app) = test_app();
        assert_eq!(app.screen, Screen::Login);
    }

    #[test]
    fn guard_starts_on_chat_with_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save("T1").unwrap();
        let app = App::new(ApiClient::new("http://localhost:0", store));
        assert_eq!(app.screen, Screen::Chat);
    }

    #[test]
    fn submit_appends_optimistic_bubble_and_clears_input() {
        let (_dir, _store, mut app) = test_app();
        app.input = "ping".to_string();
        app.cursor = 4;

        let sent = app.submit_message();

        assert_eq!(sent.as_deref(), Some("ping"));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].role, Role::User);
        assert_eq!(app.messages[0].text, "ping");
        assert!(app.messages[0].id.starts_with("local-"));
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.chat_state, ChatState::Awaiting);
    }

    #[test]
    fn submit_trims_surrounding_whitespace() {
        let (_dir, _store, mut app) = test_app();
        app.input = "  ping  ".to_string();
        assert_eq!(app.submit_message().as_deref(), Some("ping"));
        assert_eq!(app.messages[0].text, "ping");
    }

    #[test]
    fn whitespace_only_submit_is_a_noop() {
        let (_dir, _store, mut app) = test_app();
        app.input = "   ".to_string();

        assert_eq!(app.submit_message(), None);
        assert!(app.messages.is_empty());
        assert_eq!(app.chat_state, ChatState::Idle);
        // the typed whitespace stays in the field
        assert_eq!(app.input, "   ");
    }

    #[test]
    fn submit_while_awaiting_is_a_noop() {
        let (_dir, _store, mut app) = test_app();
        app.input = "first".to_string();
        assert!(app.submit_message().is_some());

        app.input = "second".to_string();
        assert_eq!(app.submit_message(), None);
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.chat_state, ChatState::Awaiting);
    }

    #[test]
    fn finish_send_success_appends_assistant_bubble() {
        let (_dir, _store, mut app) = test_app();
        app.input = "ping".to_string();
        app.submit_message();

        app.finish_send(Ok(record(2, "ping", "pong")));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, Role::Assistant);
        assert_eq!(app.messages[1].text, "pong");
        assert_eq!(app.chat_state, ChatState::Idle);
    }

    #[test]
    fn finish_send_failure_becomes_error_bubble() {
        let (_dir, _store, mut app) = test_app();
        app.input = "x".to_string();
        app.submit_message();

        app.finish_send(Err(ApiError::Status("boom".to_string())));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].role, Role::Assistant);
        assert_eq!(app.messages[1].text, "Error: boom");
        assert_eq!(app.chat_state, ChatState::Idle);
        // failed sends do not restore the input
        assert!(app.input.is_empty());
    }

    #[test]
    fn login_submit_requires_both_fields() {
        let (_dir, _store, mut app) = test_app();
        app.username = "alice".to_string();

        assert_eq!(app.login_submit(), None);
        assert!(app.login_error.is_some());
        assert!(!app.login_busy);
    }

    #[test]
    fn login_submit_is_gated_while_busy() {
        let (_dir, _store, mut app) = test_app();
        app.username = "alice".to_string();
        app.password = "good-pw".to_string();

        assert!(app.login_submit().is_some());
        assert!(app.login_busy);
        assert_eq!(app.login_submit(), None);
    }

    #[test]
    fn finish_login_success_moves_to_chat() {
        let (_dir, _store, mut app) = test_app();
        app.username = "alice".to_string();
        app.password = "good-pw".to_string();
        app.login_submit();

        app.finish_login(Ok(()));

        assert_eq!(app.screen, Screen::Chat);
        assert!(!app.login_busy);
        assert!(app.password.is_empty());
        assert_eq!(app.login_error, None);
    }

    #[test]
    fn finish_login_failure_shows_error_inline() {
        let (_dir, _store, mut app) = test_app();
        app.username = "alice".to_string();
        app.password = "bad-pw".to_string();
        app.login_submit();

        app.finish_login(Err(ApiError::Status(
            "Invalid username or password".to_string(),
        )));

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(
            app.login_error.as_deref(),
            Some("Invalid username or password")
        );
        assert!(!app.login_busy);
    }

    #[test]
    fn history_failure_redirects_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save("T1").unwrap();
        let mut app = App::new(ApiClient::new("http://localhost:0", store.clone()));
        assert_eq!(app.screen, Screen::Chat);

        app.finish_history(Err(ApiError::Status("service unavailable".to_string())));

        assert_eq!(app.screen, Screen::Login);
        assert!(app.messages.is_empty());
        // Only a 401 invalidates the token, and the HTTP client handles
        // that; a plain failure leaves it for the next attempt.
        assert_eq!(store.read(), Some("T1".to_string()));
    }

    #[test]
    fn logout_clears_token_and_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save("T1").unwrap();
        let mut app = App::new(ApiClient::new("http://localhost:0", store.clone()));
        app.finish_history(Ok(vec![record(1, "hi", "hello")]));

        app.logout();

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(store.read(), None);
        assert!(app.messages.is_empty());
    }

    #[test]
    fn history_success_populates_transcript() {
        let (_dir, _store, mut app) = test_app();
        app.finish_history(Ok(vec![record(1, "hi", "hello")]));

        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[0].text, "hi");
        assert_eq!(app.messages[1].text, "hello");
    }

    #[test]
    fn animation_only_ticks_while_awaiting() {
        let (_dir, _store, mut app) = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.input = "hi".to_string();
        app.submit_message();
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
