pub use command::{Command, CommandInterpreter, CommandTarget, Instruction, ParsedInput};
pub use message::{InvalidMessageId, Message, MessageId};
pub use renderer::Renderer;
pub use repository::{chat_schema, MessageRepository, Setting, USER_KEY};
pub use session::{ChatSession, SubmitOutcome};

pub mod command;
mod message;
mod renderer;
mod repository;
mod session;
