//! ChatMessage domain type: one logged user/assistant exchange

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use todostore::{IndexValue, Record, now_ms};

use super::id::generate_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_message: String,
    #[serde(default)]
    pub ai_reply: String,
    /// Exchange time (Unix milliseconds)
    pub timestamp: i64,
    pub updated_at: i64,
}

impl ChatMessage {
    pub fn new(user_message: impl Into<String>, ai_reply: impl Into<String>) -> Self {
        let user_message = user_message.into();
        let now = now_ms();
        Self {
            id: generate_id("chat", &user_message),
            user_message,
            ai_reply: ai_reply.into(),
            timestamp: now,
            updated_at: now,
        }
    }
}

impl Record for ChatMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "chat_messages"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("timestamp".to_string(), IndexValue::Int(self.timestamp));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_new() {
        let msg = ChatMessage::new("Tạo đăng nhập", "I. PHÂN TÍCH YÊU CẦU");
        assert!(msg.id.contains("-chat-"));
        assert_eq!(msg.ai_reply, "I. PHÂN TÍCH YÊU CẦU");
        assert_eq!(msg.timestamp, msg.updated_at);
        assert_eq!(ChatMessage::collection_name(), "chat_messages");
    }

    #[test]
    fn test_chat_message_json_shape() {
        let json = serde_json::to_value(ChatMessage::new("hi", "hello")).unwrap();
        assert_eq!(json["userMessage"], "hi");
        assert_eq!(json["aiReply"], "hello");
    }
}
