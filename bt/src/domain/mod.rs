//! Domain types for BA Todo
//!
//! Core domain types: TodoList, ChatMessage.
//! All implement the Record trait for TodoStore persistence.

mod chat_message;
mod id;
mod todo_list;

pub use chat_message::ChatMessage;
pub use id::{generate_id, slugify};
pub use todo_list::TodoList;

// Re-export todostore types for convenience
pub use todostore::{Filter, FilterOp, IndexValue, Record, Store};
