//! StateManager - actor that owns TodoStore
//!
//! Processes commands via channels for thread-safe access to persistent state.

use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{ChatMessage, Filter, IndexValue, Store, TodoList};

use super::messages::{StateCommand, StateError, StateResponse};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let mut store = Store::open(store_path.as_ref())?;

        // Replayed records may predate the current index layout
        rebuild_indexes(&mut store)?;

        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(actor_loop(store, rx));

        info!("StateManager spawned");

        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand,
    ) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === TodoList operations ===

    /// Persist a new TodoList, returning its ID
    pub async fn create_todo_list(&self, list: TodoList) -> StateResponse<String> {
        debug!(list_id = %list.id, "create_todo_list: called");
        self.request(|reply| StateCommand::CreateTodoList { list, reply }).await
    }

    /// Get a TodoList by ID
    pub async fn get_todo_list(&self, id: &str) -> StateResponse<Option<TodoList>> {
        debug!(%id, "get_todo_list: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::GetTodoList { id, reply }).await
    }

    /// Get a TodoList by ID, returning error if not found
    pub async fn get_todo_list_required(&self, id: &str) -> StateResponse<TodoList> {
        debug!(%id, "get_todo_list_required: called");
        self.get_todo_list(id)
            .await?
            .ok_or_else(|| StateError::NotFound(format!("TodoList {}", id)))
    }

    /// Replace an existing TodoList
    pub async fn update_todo_list(&self, list: TodoList) -> StateResponse<()> {
        debug!(list_id = %list.id, "update_todo_list: called");
        self.request(|reply| StateCommand::UpdateTodoList { list, reply }).await
    }

    /// Mark a TodoList as accepted and return the updated record
    pub async fn accept_todo_list(&self, id: &str) -> StateResponse<TodoList> {
        debug!(%id, "accept_todo_list: called");
        let id = id.to_string();
        self.request(|reply| StateCommand::AcceptTodoList { id, reply }).await
    }

    /// List TodoLists, most recently generated first
    pub async fn list_todo_lists(&self, accepted: Option<bool>, limit: Option<usize>) -> StateResponse<Vec<TodoList>> {
        debug!(?accepted, ?limit, "list_todo_lists: called");
        self.request(|reply| StateCommand::ListTodoLists { accepted, limit, reply })
            .await
    }

    // === ChatMessage operations ===

    /// Log one chat exchange, returning its ID
    pub async fn record_chat(&self, message: ChatMessage) -> StateResponse<String> {
        debug!(message_id = %message.id, "record_chat: called");
        self.request(|reply| StateCommand::RecordChat { message, reply }).await
    }

    /// List logged chat exchanges, newest first
    pub async fn list_chats(&self, limit: Option<usize>) -> StateResponse<Vec<ChatMessage>> {
        debug!(?limit, "list_chats: called");
        self.request(|reply| StateCommand::ListChats { limit, reply }).await
    }

    // === Maintenance ===

    /// Replay JSONL logs changed outside this process (e.g. by `git pull`)
    ///
    /// Returns the number of records loaded from replayed logs.
    pub async fn sync(&self) -> StateResponse<usize> {
        debug!("sync: called");
        self.request(|reply| StateCommand::Sync { reply }).await
    }

    /// Shutdown the StateManager
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

/// Recompute the index table of every record type
///
/// A JSONL replay drops the indexes of the collections it touched, so this
/// must follow every `Store::open` and `Store::sync` that replayed anything.
fn rebuild_indexes(store: &mut Store) -> eyre::Result<()> {
    let list_count = store.rebuild_indexes::<TodoList>()?;
    let chat_count = store.rebuild_indexes::<ChatMessage>()?;
    info!(list_count, chat_count, "Rebuilt indexes for TodoList and ChatMessage records");
    Ok(())
}

fn sync_store(store: &mut Store) -> eyre::Result<usize> {
    let replayed = store.sync()?;
    if replayed > 0 {
        rebuild_indexes(store)?;
    }
    Ok(replayed)
}

fn store_err(e: eyre::Report) -> StateError {
    StateError::StoreError(format!("{:#}", e))
}

/// The actor loop that owns the Store and processes commands
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreateTodoList { list, reply } => {
                debug!(list_id = %list.id, "actor_loop: CreateTodoList command");
                let _ = reply.send(store.create(list).map_err(store_err));
            }

            StateCommand::GetTodoList { id, reply } => {
                debug!(%id, "actor_loop: GetTodoList command");
                let _ = reply.send(store.get::<TodoList>(&id).map_err(store_err));
            }

            StateCommand::UpdateTodoList { list, reply } => {
                debug!(list_id = %list.id, "actor_loop: UpdateTodoList command");
                let _ = reply.send(store.update(list).map_err(store_err));
            }

            StateCommand::AcceptTodoList { id, reply } => {
                debug!(%id, "actor_loop: AcceptTodoList command");
                let result = match store.get::<TodoList>(&id) {
                    Ok(Some(mut list)) => {
                        list.accept();
                        store.update(list.clone()).map(|_| list).map_err(store_err)
                    }
                    Ok(None) => Err(StateError::NotFound(format!("TodoList {}", id))),
                    Err(e) => Err(store_err(e)),
                };
                let _ = reply.send(result);
            }

            StateCommand::ListTodoLists { accepted, limit, reply } => {
                debug!(?accepted, ?limit, "actor_loop: ListTodoLists command");
                let filters: Vec<Filter> = accepted
                    .map(|a| Filter::eq("accepted", IndexValue::Bool(a)))
                    .into_iter()
                    .collect();
                let result = store.list::<TodoList>(&filters).map_err(store_err).map(|mut lists| {
                    lists.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then_with(|| a.id.cmp(&b.id)));
                    if let Some(limit) = limit {
                        lists.truncate(limit);
                    }
                    lists
                });
                let _ = reply.send(result);
            }

            StateCommand::RecordChat { message, reply } => {
                debug!(message_id = %message.id, "actor_loop: RecordChat command");
                let _ = reply.send(store.create(message).map_err(store_err));
            }

            StateCommand::ListChats { limit, reply } => {
                debug!(?limit, "actor_loop: ListChats command");
                let result = store.list::<ChatMessage>(&[]).map_err(store_err).map(|mut chats| {
                    chats.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
                    if let Some(limit) = limit {
                        chats.truncate(limit);
                    }
                    chats
                });
                let _ = reply.send(result);
            }

            StateCommand::Sync { reply } => {
                debug!("actor_loop: Sync command");
                let _ = reply.send(sync_store(&mut store).map_err(store_err));
            }

            StateCommand::Shutdown => {
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}
