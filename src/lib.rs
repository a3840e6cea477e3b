//! A personal todo list served over HTTP and kept in a JSON file.
//!
//! [`store::Store`] owns the collection and rewrites the snapshot after every
//! mutation. [`api::router`] exposes it as a JSON API under `/todos` and as a
//! server-rendered page at `/`.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod view;

pub use api::{router, AppState};
pub use config::Config;
pub use error::StoreError;
pub use models::{NewTodo, TodoItem, TodoPatch};
pub use store::{JsonFile, Persist, Store};
