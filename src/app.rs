use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use std::path::PathBuf;
use tracing::{error, warn};

use charla::chat::{ChatSession, Message, Renderer, SubmitOutcome};
use charla::config::Config;
use charla::crypto::IdentityManager;

const MAX_VISIBLE_MESSAGES: usize = 250;
const MAX_STATUS_MESSAGES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Terminal side of the conversation: the messages on screen, oldest first.
#[derive(Default)]
pub struct ConversationView {
    pub messages: Vec<Message>,
    reset_requested: bool,
}

impl ConversationView {
    fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }
}

impl Renderer for ConversationView {
    fn display(&mut self, message: &Message, insert_at_top: bool) {
        if insert_at_top {
            self.messages.insert(0, message.clone());
        } else {
            self.messages.push(message.clone());
        }

        if self.messages.len() > MAX_VISIBLE_MESSAGES {
            let remove_count = self.messages.len() - MAX_VISIBLE_MESSAGES;
            self.messages.drain(0..remove_count);
        }
    }

    fn reset(&mut self) {
        self.reset_requested = true;
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input: String,
    pub cursor_position: usize,
    pub scroll_offset: usize,

    pub session: ChatSession<ConversationView>,
    pub fingerprint: Option<String>,
    pub database_path: PathBuf,
    pub message_count: u64,
    pub status_messages: Vec<String>,
}

impl App {
    pub async fn new(config: &Config, generate_identity: bool) -> Result<Self> {
        let session = ChatSession::start(config, ConversationView::default()).await?;
        let message_count = session.repository().message_count().await?;

        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            input: String::new(),
            cursor_position: 0,
            scroll_offset: 0,

            session,
            fingerprint: None,
            database_path: config.database.path.clone(),
            message_count,
            status_messages: Vec::new(),
        };

        app.add_status_message(format!(
            "Charla v{} - {} messages on this device",
            env!("CARGO_PKG_VERSION"),
            message_count
        ));

        if generate_identity {
            match app.session.generate_identity(config.identity.modulus_bits).await {
                Ok(pair) => {
                    let fingerprint = IdentityManager::fingerprint(pair.public_key());
                    app.add_status_message(format!("Signing key ready ({fingerprint})"));
                    app.fingerprint = Some(fingerprint);
                }
                Err(e) => {
                    error!("could not create signing key: {e}");
                    app.add_status_message(format!("Could not create signing key: {e}"));
                }
            }
        }

        Ok(app)
    }

    pub async fn handle_input(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key_event(key).await?;
            }
        }
        Ok(())
    }

    async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                }
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Editing;
                }
                KeyCode::Up => self.scroll_back(1),
                KeyCode::Down => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(1);
                }
                KeyCode::PageUp => self.scroll_back(10),
                KeyCode::PageDown => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(10);
                }
                _ => {}
            },
            InputMode::Editing => match key.code {
                KeyCode::Enter => {
                    self.submit_input().await;
                }
                KeyCode::Char(c) => {
                    let at = self.byte_index();
                    self.input.insert(at, c);
                    self.cursor_position += 1;
                }
                KeyCode::Backspace => {
                    if self.cursor_position > 0 {
                        self.cursor_position -= 1;
                        let at = self.byte_index();
                        self.input.remove(at);
                    }
                }
                KeyCode::Delete => {
                    if self.cursor_position < self.input.chars().count() {
                        let at = self.byte_index();
                        self.input.remove(at);
                    }
                }
                KeyCode::Left => {
                    self.cursor_position = self.cursor_position.saturating_sub(1);
                }
                KeyCode::Right => {
                    if self.cursor_position < self.input.chars().count() {
                        self.cursor_position += 1;
                    }
                }
                KeyCode::Home => {
                    self.cursor_position = 0;
                }
                KeyCode::End => {
                    self.cursor_position = self.input.chars().count();
                }
                KeyCode::Esc => {
                    self.clear_input();
                    self.input_mode = InputMode::Normal;
                }
                _ => {}
            },
        }
        Ok(())
    }

    /// Hand the input line to the session. Failures become status notices; the
    /// input is kept unless the session asked for the form to be reset.
    async fn submit_input(&mut self) {
        let input = self.input.clone();

        match self.session.submit(&input).await {
            Ok(SubmitOutcome::Rejected(_)) => {}
            Ok(SubmitOutcome::Posted(_)) => self.message_count += 1,
            Ok(SubmitOutcome::Answered { .. }) => self.message_count += 2,
            Err(e) => {
                warn!("submit failed: {e}");
                self.add_status_message(format!("Error: {e}"));
                if e.is_fatal() {
                    self.should_quit = true;
                }
            }
        }

        if self.session.renderer_mut().take_reset() {
            self.clear_input();
            self.scroll_offset = 0;
        }
    }

    /// `scroll_offset` counts messages hidden below the view.
    fn scroll_back(&mut self, by: usize) {
        let max = self.session.renderer().messages.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + by).min(max);
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn add_status_message(&mut self, message: String) {
        self.status_messages.push(format!(
            "[{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            message
        ));

        if self.status_messages.len() > MAX_STATUS_MESSAGES {
            self.status_messages.remove(0);
        }
    }

    pub fn display_name(&self) -> &str {
        self.session.display_name().unwrap_or("anónimo")
    }

    /// Messages that fit in `height` rows, counting back from the newest.
    pub fn get_visible_messages(&self, height: usize) -> &[Message] {
        let messages = &self.session.renderer().messages;
        let end = messages.len().saturating_sub(self.scroll_offset);
        let start = end.saturating_sub(height);
        &messages[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> Message {
        Message::new(content, true).unwrap()
    }

    #[test]
    fn test_view_inserts_history_at_top() {
        let mut view = ConversationView::default();
        view.display_batch(&[message("a"), message("b")]);
        view.display(&message("c"), false);

        let contents: Vec<&str> = view.messages.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_view_reset_is_consumed_once() {
        let mut view = ConversationView::default();
        assert!(!view.take_reset());
        view.reset();
        assert!(view.take_reset());
        assert!(!view.take_reset());
    }

    #[test]
    fn test_view_caps_messages() {
        let mut view = ConversationView::default();
        for i in 0..(MAX_VISIBLE_MESSAGES + 5) {
            view.display(&message(&format!("m{i}")), false);
        }
        assert_eq!(view.messages.len(), MAX_VISIBLE_MESSAGES);
        assert_eq!(view.messages[0].content(), "m5");
    }
}
