//! TodoList domain type
//!
//! A generated BA to-do list for one user story, optionally accepted by the user.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use todostore::{IndexValue, Record, now_ms};

use super::id::generate_id;
use crate::parser::Section;

/// A persisted to-do list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    /// Unique identifier (e.g., "3f9a01c2-todo-as-a-shopper")
    pub id: String,

    /// The user story the list was generated from
    pub user_story: String,

    /// Parsed sections, normally three
    pub sections: Vec<Section>,

    /// Whether the user accepted this list
    #[serde(default)]
    pub accepted: bool,

    /// Client session identifier (empty when unknown)
    #[serde(default)]
    pub session_id: String,

    /// Generation timestamp (Unix milliseconds)
    pub generated_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl TodoList {
    /// Create a new, not yet accepted list with a generated ID
    pub fn new(user_story: impl Into<String>, sections: Vec<Section>) -> Self {
        let user_story = user_story.into();
        let now = now_ms();
        Self {
            id: generate_id("todo", &user_story),
            user_story,
            sections,
            accepted: false,
            session_id: String::new(),
            generated_at: now,
            updated_at: now,
        }
    }

    /// Builder-style session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Builder-style accepted flag
    pub fn with_accepted(mut self, accepted: bool) -> Self {
        self.accepted = accepted;
        self
    }

    /// Mark the list as accepted
    pub fn accept(&mut self) {
        self.accepted = true;
        self.updated_at = now_ms();
    }

    /// Total number of tasks across all sections
    pub fn task_count(&self) -> usize {
        self.sections.iter().map(|s| s.tasks.len()).sum()
    }
}

impl Record for TodoList {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn collection_name() -> &'static str {
        "todo_lists"
    }

    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        let mut fields = HashMap::new();
        fields.insert("accepted".to_string(), IndexValue::Bool(self.accepted));
        fields.insert("generated_at".to_string(), IndexValue::Int(self.generated_at));
        fields.insert("session_id".to_string(), IndexValue::String(self.session_id.clone()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SectionKind;

    fn sections() -> Vec<Section> {
        vec![
            Section::new(SectionKind::RequirementAnalysis, vec!["a".to_string(), "b".to_string()]),
            Section::new(SectionKind::AcceptanceCriteria, vec!["c".to_string()]),
            Section::new(SectionKind::BaTasks, vec![]),
        ]
    }

    #[test]
    fn test_todo_list_new() {
        let list = TodoList::new("As a shopper I want to pay", sections());
        assert!(list.id.contains("-todo-as-a-shopper"));
        assert!(!list.accepted);
        assert!(list.session_id.is_empty());
        assert_eq!(list.generated_at, list.updated_at);
        assert_eq!(list.task_count(), 3);
    }

    #[test]
    fn test_todo_list_accept() {
        let mut list = TodoList::new("story", sections());
        let before = list.updated_at;
        list.accept();
        assert!(list.accepted);
        assert!(list.updated_at >= before);
    }

    #[test]
    fn test_todo_list_serializes_camel_case() {
        let list = TodoList::new("story", sections()).with_session("s1");
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["userStory"], "story");
        assert_eq!(json["sessionId"], "s1");
        assert!(json["generatedAt"].is_i64());
        assert_eq!(json["sections"][0]["title"], "PHÂN TÍCH YÊU CẦU");
    }

    #[test]
    fn test_todo_list_defaults_on_deserialize() {
        let json = serde_json::json!({
            "id": "x",
            "userStory": "story",
            "sections": [],
            "generatedAt": 1,
            "updatedAt": 1
        });
        let list: TodoList = serde_json::from_value(json).unwrap();
        assert!(!list.accepted);
        assert!(list.session_id.is_empty());
    }

    #[test]
    fn test_todo_list_indexed_fields() {
        let list = TodoList::new("story", sections()).with_accepted(true);
        let fields = list.indexed_fields();
        assert_eq!(fields.get("accepted"), Some(&IndexValue::Bool(true)));
        assert_eq!(fields.get("generated_at"), Some(&IndexValue::Int(list.generated_at)));
    }
}
