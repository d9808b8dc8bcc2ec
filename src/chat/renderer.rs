use super::message::Message;

/// Presentation side of the chat. Receives only messages that have already
/// been validated and stored.
pub trait Renderer {
    /// Show one message, appended at the bottom or inserted at the top.
    fn display(&mut self, message: &Message, insert_at_top: bool);

    /// Show history, given oldest first.
    fn display_batch(&mut self, messages: &[Message]) {
        for message in messages.iter().rev() {
            self.display(message, true);
        }
    }

    /// Clear the input form.
    fn reset(&mut self);
}
