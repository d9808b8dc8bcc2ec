use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ValidationError;

/// 128-bit message identifier, displayed as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not 32 hex characters")]
pub struct InvalidMessageId(pub String);

impl FromStr for MessageId {
    type Err = InvalidMessageId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidMessageId(s.to_string()));
        }
        Uuid::try_parse(s)
            .map(Self)
            .map_err(|_| InvalidMessageId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    content: String,
    own: bool,
    sent: bool,
    created_at: DateTime<Utc>,
}

impl Message {
    /// A freshly authored message. Empty content is rejected.
    pub fn new(content: impl Into<String>, own: bool) -> Result<Self, ValidationError> {
        Self::new_at(content, own, Utc::now())
    }

    pub(crate) fn new_at(
        content: impl Into<String>,
        own: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }

        Ok(Self {
            id: MessageId::generate(),
            content,
            own,
            sent: false,
            created_at,
        })
    }

    /// Rebuild a message read back from storage; nothing is regenerated.
    pub(crate) fn restore(
        id: MessageId,
        content: String,
        own: bool,
        sent: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if content.is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(Self {
            id,
            content,
            own,
            sent,
            created_at,
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_own(&self) -> bool {
        self.own
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `HH:MM`, 24-hour, in the local timezone.
    pub fn formatted_time(&self) -> String {
        self.format_time(&Local)
    }

    pub fn format_time<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        self.created_at.with_timezone(tz).format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_empty_content_rejected() {
        assert_eq!(Message::new("", true), Err(ValidationError::EmptyContent));
    }

    #[test]
    fn test_whitespace_is_content() {
        let message = Message::new(" ", true).unwrap();
        assert_eq!(message.content(), " ");
    }

    #[test]
    fn test_new_message_defaults() {
        let message = Message::new("hola", true).unwrap();
        assert!(message.is_own());
        assert!(!message.is_sent());
    }

    #[test]
    fn test_id_format() {
        let id = MessageId::generate().to_string();
        assert_eq!(id.len(), 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(id.parse::<MessageId>().unwrap().to_string(), id);
    }

    #[test]
    fn test_id_parse_rejects_hyphenated_form() {
        let hyphenated = Uuid::new_v4().hyphenated().to_string();
        assert!(hyphenated.parse::<MessageId>().is_err());
        assert!("xyz".parse::<MessageId>().is_err());
    }

    #[test]
    fn test_ids_unique_over_ten_thousand() {
        let ids: HashSet<String> = (0..10_000)
            .map(|_| Message::new("x", true).unwrap().id().to_string())
            .collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_time_is_zero_padded_24h() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        let message = Message::new_at("x", true, at).unwrap();
        assert_eq!(message.format_time(&Utc), "07:05");

        let evening = Utc.with_ymd_and_hms(2024, 3, 9, 21, 40, 0).unwrap();
        let message = Message::new_at("x", true, evening).unwrap();
        assert_eq!(message.format_time(&Utc), "21:40");
    }
}
