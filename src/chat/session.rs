//! The chat orchestrator.
//!
//! Each submitted line goes through validation, is stored, shown, and only
//! then interpreted. When it is an instruction, the reply is built, stored and
//! shown as a second message. A failure while answering never loses the
//! user's own message because it is already on disk.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::command::{CommandInterpreter, CommandTarget, ParsedInput};
use super::message::Message;
use super::renderer::Renderer;
use super::repository::{chat_schema, MessageRepository, USER_KEY};
use crate::config::Config;
use crate::crypto::{IdentityManager, KeyPair, Signature, SignatureService};
use crate::error::{SessionError, StoreError, ValidationError};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing stored, nothing shown.
    Rejected(ValidationError),
    /// Plain content stored and shown.
    Posted(Message),
    /// An instruction and its reply, both stored and shown.
    Answered { message: Message, reply: Message },
}

pub struct ChatSession<R: Renderer> {
    repository: MessageRepository,
    interpreter: CommandInterpreter,
    identities: IdentityManager,
    signatures: SignatureService,
    renderer: R,
    display_name: Option<String>,
    key_pair: Option<KeyPair>,
}

impl<R: Renderer> ChatSession<R> {
    /// Open the configured database and bring the session up.
    pub async fn start(config: &Config, renderer: R) -> Result<Self, SessionError> {
        let store = Store::open(&config.database, config.timeouts.storage()).await?;
        Self::with_store(Arc::new(store), config, renderer).await
    }

    /// Initialize the schema on `store`, then load settings and recent
    /// history into the renderer. Nothing is read before `init` completes.
    pub async fn with_store(
        store: Arc<Store>,
        config: &Config,
        mut renderer: R,
    ) -> Result<Self, SessionError> {
        let created = store.init(&chat_schema()).await?;
        if created {
            info!(path = %store.path().display(), "created chat database");
        }

        let repository = MessageRepository::new(store);

        let display_name = repository
            .load_settings()
            .await?
            .into_iter()
            .find(|setting| setting.key == USER_KEY)
            .and_then(|setting| setting.value);

        let mut recent = repository
            .load_recent(config.history.recent_limit)
            .await?;
        recent.reverse();
        renderer.display_batch(&recent);

        info!(history = recent.len(), user = ?display_name, "chat session started");

        Ok(Self {
            repository,
            interpreter: CommandInterpreter::new(),
            identities: IdentityManager::new(config.timeouts.crypto()),
            signatures: SignatureService::new(config.timeouts.crypto()),
            renderer,
            display_name,
            key_pair: None,
        })
    }

    pub async fn submit(&mut self, raw: &str) -> Result<SubmitOutcome, SessionError> {
        let message = match Message::new(raw, true) {
            Ok(message) => message,
            Err(reason) => {
                debug!(%reason, "input rejected");
                return Ok(SubmitOutcome::Rejected(reason));
            }
        };

        if let Err(e) = self.repository.save_message(&message).await {
            warn!("failed to store message: {e}");
            return Err(e.into());
        }
        self.renderer.display(&message, false);
        self.renderer.reset();

        let instruction = match self.interpreter.parse(message.content()) {
            ParsedInput::Plain(_) => return Ok(SubmitOutcome::Posted(message)),
            ParsedInput::Instruction(instruction) => instruction,
        };

        let mut target = SessionSettings {
            repository: &self.repository,
            display_name: &mut self.display_name,
        };
        let text = match self.interpreter.dispatch(&instruction, &mut target).await {
            Ok(text) => text,
            Err(e) => {
                warn!(command = ?instruction.command, "instruction failed: {e}");
                return Err(e.into());
            }
        };

        let reply = Message::new(text, false)?;
        if let Err(e) = self.repository.save_message(&reply).await {
            warn!("failed to store reply: {e}");
            return Err(e.into());
        }
        self.renderer.display(&reply, false);

        Ok(SubmitOutcome::Answered { message, reply })
    }

    /// Generate and hold a fresh key pair for this session.
    pub async fn generate_identity(&mut self, modulus_bits: usize) -> Result<&KeyPair, SessionError> {
        let pair = self.identities.generate_key_pair(modulus_bits).await?;
        info!(
            fingerprint = %IdentityManager::fingerprint(pair.public_key()),
            "session identity generated"
        );
        let pair = self.key_pair.insert(pair);
        Ok(&*pair)
    }

    pub fn set_identity(&mut self, pair: KeyPair) {
        self.key_pair = Some(pair);
    }

    pub fn identity(&self) -> Option<&KeyPair> {
        self.key_pair.as_ref()
    }

    pub async fn sign(&self, message: &Message) -> Result<Signature, SessionError> {
        let pair = self.key_pair.as_ref().ok_or(SessionError::NoIdentity)?;
        Ok(self.signatures.sign(pair, message.content()).await?)
    }

    /// Recomputed from the stored content every time.
    pub async fn verify(&self, message: &Message, signature: &Signature) -> Result<bool, SessionError> {
        let pair = self.key_pair.as_ref().ok_or(SessionError::NoIdentity)?;
        Ok(self
            .signatures
            .verify(pair.public_key(), message.content(), signature.as_bytes())
            .await?)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn repository(&self) -> &MessageRepository {
        &self.repository
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

/// The slice of session state commands are allowed to change.
struct SessionSettings<'a> {
    repository: &'a MessageRepository,
    display_name: &'a mut Option<String>,
}

impl CommandTarget for SessionSettings<'_> {
    async fn set_display_name(&mut self, name: &str) -> Result<(), StoreError> {
        self.repository.set_setting(USER_KEY, Some(name)).await?;
        *self.display_name = Some(name.to_string());
        info!(name, "display name changed");
        Ok(())
    }
}
