use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{BatchDeleted, Message, NewTodo, TodoItem, TodoPatch};
use crate::store::Store;
use crate::view;

/// Shared handle to the store. Every request takes the lock for the whole
/// mutation including the snapshot write.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn store(&self) -> &Mutex<Store> {
        &self.store
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/checked", delete(delete_checked))
        .route("/todos/:id", put(update_todo).delete(delete_todo))
        .merge(view::routes())
        .with_state(state)
}

async fn list_todos(State(state): State<AppState>) -> Json<Vec<TodoItem>> {
    let store = state.store().lock().await;
    Json(store.list().to_vec())
}

async fn create_todo(
    State(state): State<AppState>,
    Json(new): Json<NewTodo>,
) -> Result<(StatusCode, Json<TodoItem>), StoreError> {
    let mut store = state.store().lock().await;
    let todo = store.create(new).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(patch): Json<TodoPatch>,
) -> Result<Json<TodoItem>, StoreError> {
    let id = parse_id(raw)?;
    let mut store = state.store().lock().await;
    let todo = store.update(id, patch).await?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Message>, StoreError> {
    let id = parse_id(raw)?;
    let mut store = state.store().lock().await;
    store.delete(id).await?;
    Ok(Json(Message {
        message: "Todo deleted".to_string(),
    }))
}

async fn delete_checked(State(state): State<AppState>) -> Json<BatchDeleted> {
    let mut store = state.store().lock().await;
    let deleted = store.delete_checked().await;
    Json(BatchDeleted {
        message: format!("{} todos deleted", deleted.len()),
        deleted,
    })
}

/// Anything that does not parse as an id cannot name a todo.
fn parse_id(raw: String) -> Result<i64, StoreError> {
    raw.parse().map_err(|_| StoreError::InvalidId { raw })
}
