//! State manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{ChatMessage, TodoList};

/// Errors from state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Channel error")]
    ChannelError,
}

/// Response from state operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the StateManager actor
#[derive(Debug)]
pub enum StateCommand {
    // TodoList operations
    CreateTodoList {
        list: TodoList,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    GetTodoList {
        id: String,
        reply: oneshot::Sender<StateResponse<Option<TodoList>>>,
    },
    UpdateTodoList {
        list: TodoList,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    AcceptTodoList {
        id: String,
        reply: oneshot::Sender<StateResponse<TodoList>>,
    },
    ListTodoLists {
        accepted: Option<bool>,
        limit: Option<usize>,
        reply: oneshot::Sender<StateResponse<Vec<TodoList>>>,
    },

    // ChatMessage operations
    RecordChat {
        message: ChatMessage,
        reply: oneshot::Sender<StateResponse<String>>,
    },
    ListChats {
        limit: Option<usize>,
        reply: oneshot::Sender<StateResponse<Vec<ChatMessage>>>,
    },

    // Sync operations
    Sync {
        reply: oneshot::Sender<StateResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
