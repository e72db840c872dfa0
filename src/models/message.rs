use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Ai,
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub author: Author,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only chat log. Timestamps never go backwards, even if the wall clock does.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Transcript(Vec<ChatMessage>);

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, author: Author, text: impl Into<String>) -> &ChatMessage {
        let mut timestamp = Utc::now();
        if let Some(last) = self.0.last() {
            timestamp = timestamp.max(last.timestamp);
        }
        self.0.push(ChatMessage {
            id: Uuid::new_v4(),
            author,
            text: text.into(),
            timestamp,
        });
        &self.0[self.0.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count_by(&self, author: Author) -> usize {
        self.0.iter().filter(|m| m.author == author).count()
    }
}
