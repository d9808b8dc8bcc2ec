//! Slash-command parsing and dispatch.
//!
//! Input of the form `/<word>[<whitespace><args>]` is an instruction; anything
//! else is plain content. `<word>` is one or more ASCII word characters and
//! `<args>` runs verbatim to the end of the input. An argument containing a
//! line break makes the whole input plain content.

use std::future::Future;
use tracing::debug;

use crate::error::StoreError;

pub const NAME_CHANGED: &str = "Nombre cambiado.";
pub const NAME_MISSING: &str = "Nombre no insertado.";
pub const NOT_SUPPORTED: &str = "Instrucción no disponible todavía.";
pub const UNRECOGNIZED: &str = "Instrucción no reconocida.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change the display name.
    Username,
    /// Reserved: create a signing key.
    Auth,
    /// Reserved: choose the conversation receiver.
    Chat,
    /// Reserved: clear the message history.
    Empty,
    Unrecognized(String),
}

impl Command {
    fn from_token(token: &str) -> Self {
        match token {
            "username" => Command::Username,
            "auth" => Command::Auth,
            "chat" => Command::Chat,
            "empty" => Command::Empty,
            other => Command::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub command: Command,
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    Plain(String),
    Instruction(Instruction),
}

/// What a command may touch on the session.
pub trait CommandTarget {
    fn set_display_name(&mut self, name: &str) -> impl Future<Output = Result<(), StoreError>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandInterpreter;

impl CommandInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, input: &str) -> ParsedInput {
        match parse_instruction(input) {
            Some(instruction) => ParsedInput::Instruction(instruction),
            None => ParsedInput::Plain(input.to_string()),
        }
    }

    /// Run an instruction and produce the text of its reply.
    pub async fn dispatch<T: CommandTarget>(
        &self,
        instruction: &Instruction,
        target: &mut T,
    ) -> Result<String, StoreError> {
        debug!(command = ?instruction.command, "dispatching instruction");

        let reply = match &instruction.command {
            Command::Username => {
                if instruction.args.is_empty() {
                    NAME_MISSING
                } else {
                    target.set_display_name(&instruction.args).await?;
                    NAME_CHANGED
                }
            }
            Command::Auth | Command::Chat | Command::Empty => NOT_SUPPORTED,
            Command::Unrecognized(_) => UNRECOGNIZED,
        };

        Ok(reply.to_string())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn parse_instruction(input: &str) -> Option<Instruction> {
    let rest = input.strip_prefix('/')?;

    let token_len = rest
        .find(|c: char| !is_word_char(c))
        .unwrap_or(rest.len());
    if token_len == 0 {
        return None;
    }
    let (token, rest) = rest.split_at(token_len);

    let args = rest.trim_start();
    if args.contains(is_line_terminator) {
        return None;
    }

    Some(Instruction {
        command: Command::from_token(token),
        args: args.to_string(),
    })
}
