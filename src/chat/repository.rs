//! Typed persistence for messages and settings on top of [`Store`].

use std::sync::Arc;
use tracing::debug;

use super::message::{Message, MessageId};
use crate::error::StoreError;
use crate::store::{
    ColumnDef, DataType, DatabaseSchema, Direction, InsertOptions, Record, SelectQuery, Store,
    TableSchema,
};

pub const OPTION_TABLE: &str = "option";
pub const MESSAGE_TABLE: &str = "message";

/// Setting key holding the display name.
pub const USER_KEY: &str = "user";

/// The `chat` database: an `option` key-value table and the `message` log.
pub fn chat_schema() -> DatabaseSchema {
    DatabaseSchema::new(
        "chat",
        vec![
            TableSchema::new(
                OPTION_TABLE,
                vec![
                    ColumnDef::new("key", DataType::String).primary_key(),
                    ColumnDef::new("option", DataType::String),
                ],
            ),
            TableSchema::new(
                MESSAGE_TABLE,
                vec![
                    ColumnDef::new("uuid", DataType::String).primary_key(),
                    ColumnDef::new("sent", DataType::Boolean).not_null(),
                    ColumnDef::new("own", DataType::Boolean).not_null(),
                    ColumnDef::new("content", DataType::String).not_null(),
                    ColumnDef::new("instant", DataType::DateTime).not_null(),
                ],
            ),
        ],
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}

pub struct MessageRepository {
    store: Arc<Store>,
}

impl MessageRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Append a message. Messages are never overwritten, so a repeated id is
    /// a [`StoreError::Constraint`].
    pub async fn save_message(&self, message: &Message) -> Result<(), StoreError> {
        self.store
            .insert(MESSAGE_TABLE, &[to_record(message)], InsertOptions::default())
            .await?;
        debug!(id = %message.id(), own = message.is_own(), "saved message");
        Ok(())
    }

    /// The `n` most recent messages, newest first.
    pub async fn load_recent(&self, n: u32) -> Result<Vec<Message>, StoreError> {
        let query = SelectQuery::new()
            .order_by("instant", Direction::Desc)
            .limit(n);

        self.store
            .select(MESSAGE_TABLE, &query)
            .await?
            .iter()
            .map(from_record)
            .collect()
    }

    pub async fn message_count(&self) -> Result<u64, StoreError> {
        self.store.count(MESSAGE_TABLE).await
    }

    /// Value stored under `key`. A missing row and a null value both read as `None`.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rows = self
            .store
            .select(OPTION_TABLE, &SelectQuery::new().filter("key", key).limit(1))
            .await?;

        match rows.first() {
            Some(row) => row.optional_text("option"),
            None => Ok(None),
        }
    }

    pub async fn load_settings(&self) -> Result<Vec<Setting>, StoreError> {
        let rows = self.store.select(OPTION_TABLE, &SelectQuery::new()).await?;

        rows.iter()
            .map(|row| {
                Ok(Setting {
                    key: row.text("key")?,
                    value: row.optional_text("option")?,
                })
            })
            .collect()
    }

    pub async fn set_setting(&self, key: &str, value: Option<&str>) -> Result<(), StoreError> {
        let record = Record::new().with("key", key).with("option", value);
        self.store
            .insert(OPTION_TABLE, &[record], InsertOptions::upsert())
            .await?;
        debug!(key, "stored setting");
        Ok(())
    }
}

fn to_record(message: &Message) -> Record {
    Record::new()
        .with("uuid", message.id().to_string())
        .with("sent", message.is_sent())
        .with("own", message.is_own())
        .with("content", message.content())
        .with("instant", message.created_at())
}

fn from_record(record: &Record) -> Result<Message, StoreError> {
    let uuid = record.text("uuid")?;
    let id: MessageId = uuid.parse().map_err(|e| StoreError::Decode {
        column: "uuid".to_string(),
        reason: format!("{e}"),
    })?;

    Message::restore(
        id,
        record.text("content")?,
        record.boolean("own")?,
        record.boolean("sent")?,
        record.datetime("instant")?,
    )
    .map_err(|e| StoreError::Decode {
        column: "content".to_string(),
        reason: e.to_string(),
    })
}
