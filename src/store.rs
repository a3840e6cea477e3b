//! In-memory todo collection with a JSON snapshot on disk.
//!
//! The collection is authoritative; the snapshot file is rewritten in full
//! on tokio's blocking pool after every mutation. Snapshot failures are
//! logged and never turn a successful mutation into an error.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use crate::error::StoreError;
use crate::models::{NewTodo, TodoItem, TodoPatch};

/// Durable copy of the collection.
pub trait Persist: Send + Sync + 'static {
    /// `Ok(None)` means there is no snapshot yet.
    fn read(&self) -> Result<Option<Vec<TodoItem>>, StoreError>;
    fn write(&self, todos: &[TodoItem]) -> Result<(), StoreError>;
}

/// Snapshot stored as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl Persist for JsonFile {
    fn read(&self) -> Result<Option<Vec<TodoItem>>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn write(&self, todos: &[TodoItem]) -> Result<(), StoreError> {
        replace_file(&self.path, todos).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Write to a temp file next to `path`, then rename over it.
fn replace_file(path: &Path, todos: &[TodoItem]) -> io::Result<()> {
    let content = serde_json::to_vec_pretty(todos)?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub struct Store {
    todos: Vec<TodoItem>,
    persist: Arc<dyn Persist>,
}

impl Store {
    /// Load the snapshot. A missing snapshot is created empty; an unreadable
    /// one is logged and the store starts empty. Runs before serving, so the
    /// initial write happens on the calling thread.
    pub fn load<P: Persist>(persist: P) -> Self {
        let mut store = Self {
            todos: Vec::new(),
            persist: Arc::new(persist),
        };

        match store.persist.read() {
            Ok(Some(todos)) => {
                store.todos = todos;
                match store.assign_missing_ids() {
                    Ok(0) => {}
                    Ok(assigned) => {
                        warn!(assigned, "assigned ids to entries saved without one");
                        log_write(store.persist.write(&store.todos));
                    }
                    Err(err) => {
                        error!(error = %err, "could not assign ids to entries saved without one");
                    }
                }
            }
            Ok(None) => {
                info!("no snapshot yet, starting with an empty list");
                log_write(store.persist.write(&store.todos));
            }
            Err(err) => {
                error!(error = %err, "failed to load todos, starting with an empty list");
            }
        }

        info!(count = store.todos.len(), "todos loaded");
        store
    }

    pub fn list(&self) -> &[TodoItem] {
        &self.todos
    }

    pub fn get(&self, id: i64) -> Option<&TodoItem> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub async fn create(&mut self, new: NewTodo) -> Result<TodoItem, StoreError> {
        let description = required_description(new.description.as_deref())?;
        let todo = TodoItem {
            id: self.next_id()?,
            description,
            checked: false,
            deadline: new.deadline,
        };
        self.todos.push(todo.clone());
        info!(id = todo.id, "todo created");
        self.persist().await;
        Ok(todo)
    }

    /// Apply the supplied fields. An unknown id wins over an invalid patch.
    pub async fn update(&mut self, id: i64, patch: TodoPatch) -> Result<TodoItem, StoreError> {
        let todo = self
            .todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or(StoreError::NotFound { id })?;

        if let Some(raw) = patch.description.as_deref() {
            todo.description = required_description(Some(raw))?;
        }
        if let Some(checked) = patch.checked {
            todo.checked = checked;
        }
        if let Some(deadline) = patch.deadline {
            todo.deadline = deadline;
        }

        let updated = todo.clone();
        info!(id, "todo updated");
        self.persist().await;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: i64) -> Result<TodoItem, StoreError> {
        let index = self
            .todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or(StoreError::NotFound { id })?;
        let removed = self.todos.remove(index);
        info!(id, "todo deleted");
        self.persist().await;
        Ok(removed)
    }

    /// Remove every checked item in one mutation. Returns the removed ids in
    /// collection order.
    pub async fn delete_checked(&mut self) -> Vec<i64> {
        let deleted: Vec<i64> = self
            .todos
            .iter()
            .filter(|todo| todo.checked)
            .map(|todo| todo.id)
            .collect();
        if deleted.is_empty() {
            return deleted;
        }

        self.todos.retain(|todo| !todo.checked);
        info!(count = deleted.len(), "checked todos deleted");
        self.persist().await;
        deleted
    }

    /// Split into (overdue, rest), both in collection order.
    pub fn partition_overdue(&self, now: DateTime<Utc>) -> (Vec<&TodoItem>, Vec<&TodoItem>) {
        self.todos.iter().partition(|todo| todo.is_overdue(now))
    }

    /// Flush the whole collection on the blocking pool. Failures are logged
    /// only.
    pub async fn persist(&self) {
        let persist = Arc::clone(&self.persist);
        let todos = self.todos.clone();
        match tokio::task::spawn_blocking(move || persist.write(&todos)).await {
            Ok(result) => log_write(result),
            Err(err) => error!(error = %err, "snapshot writer task failed"),
        }
    }

    fn next_id(&self) -> Result<i64, StoreError> {
        self.todos
            .iter()
            .map(|todo| todo.id)
            .max()
            .unwrap_or(0)
            .max(0)
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted)
    }

    fn assign_missing_ids(&mut self) -> Result<usize, StoreError> {
        let mut next = Some(self.next_id()?);
        let mut assigned = 0;
        for todo in self.todos.iter_mut().filter(|todo| todo.id <= 0) {
            let id = next.ok_or(StoreError::IdsExhausted)?;
            todo.id = id;
            next = id.checked_add(1);
            assigned += 1;
        }
        Ok(assigned)
    }
}

fn log_write(result: Result<(), StoreError>) {
    if let Err(err) = result {
        error!(error = %err, "failed to save todos");
    }
}

fn required_description(raw: Option<&str>) -> Result<String, StoreError> {
    match raw.map(str::trim) {
        Some(description) if !description.is_empty() => Ok(description.to_string()),
        _ => Err(StoreError::MissingDescription),
    }
}
