//! Browser UI: a server-rendered page plus the form routes that drive it.
//!
//! Forms post to the routes below, which call the same store operations as
//! the JSON API and redirect back to `/`. Edit mode and the completion notice
//! live in the query string, so they vanish on the next plain reload.

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::api::AppState;
use crate::error::StoreError;
use crate::models::{NewTodo, TodoItem, TodoPatch};
use crate::store::Store;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/add", post(add_todo))
        .route("/toggle", post(toggle_todo))
        .route("/edit", post(save_edit))
        .route("/delete-checked", post(delete_checked))
}

/// Transient per-render state carried in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct PageState {
    /// Item currently shown with its edit form.
    pub edit: Option<i64>,
    /// Item that was just checked off. Only the redirect after a toggle sets
    /// it, so the notice shows once per toggle; reloading that exact URL
    /// shows it again while the item stays checked.
    pub done: Option<i64>,
}

#[derive(Deserialize)]
struct AddForm {
    #[serde(default)]
    description: String,
    #[serde(default)]
    deadline: String,
}

#[derive(Deserialize)]
struct IdForm {
    id: i64,
}

#[derive(Deserialize)]
struct EditForm {
    id: i64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    deadline: String,
}

async fn index(State(state): State<AppState>, Query(page): Query<PageState>) -> Html<String> {
    let store = state.store().lock().await;
    Html(render_page(&store, &page, Utc::now()))
}

async fn add_todo(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> Result<Response, StoreError> {
    if form.description.trim().is_empty() {
        return Ok(StatusCode::BAD_REQUEST.into_response());
    }
    let Some(deadline) = parse_deadline(&form.deadline) else {
        return Ok(StatusCode::BAD_REQUEST.into_response());
    };

    let mut store = state.store().lock().await;
    store
        .create(NewTodo {
            description: Some(form.description),
            deadline: Some(deadline),
        })
        .await?;

    Ok(redirect_to("/"))
}

async fn toggle_todo(
    State(state): State<AppState>,
    Form(form): Form<IdForm>,
) -> Result<Response, StoreError> {
    let mut store = state.store().lock().await;
    let checked = !store
        .get(form.id)
        .ok_or(StoreError::NotFound { id: form.id })?
        .checked;
    store
        .update(
            form.id,
            TodoPatch {
                checked: Some(checked),
                ..Default::default()
            },
        )
        .await?;

    if checked {
        Ok(redirect_to(&format!("/?done={}", form.id)))
    } else {
        Ok(redirect_to("/"))
    }
}

async fn save_edit(
    State(state): State<AppState>,
    Form(form): Form<EditForm>,
) -> Result<Response, StoreError> {
    let deadline = match form.deadline.trim() {
        "" => None,
        raw => match parse_deadline(raw) {
            Some(deadline) => Some(deadline),
            None => return Ok(StatusCode::BAD_REQUEST.into_response()),
        },
    };

    let mut store = state.store().lock().await;
    store
        .update(
            form.id,
            TodoPatch {
                description: Some(form.description),
                checked: None,
                deadline: Some(deadline),
            },
        )
        .await?;

    Ok(redirect_to("/"))
}

async fn delete_checked(State(state): State<AppState>) -> Response {
    let mut store = state.store().lock().await;
    store.delete_checked().await;
    redirect_to("/")
}

fn redirect_to(location: &str) -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())]).into_response()
}

/// Accepts RFC 3339, or the `datetime-local` input format read as local time.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(deadline) = DateTime::parse_from_rfc3339(raw) {
        return Some(deadline.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|deadline| deadline.with_timezone(&Utc))
}

/// Green palette with one card per item; overdue cards turn red.
const STYLESHEET: &str = r#"
    body { margin: 0; padding: 2rem; background: #c8e6c9; font-family: "Roboto", sans-serif; }
    .app { max-width: 40rem; margin: 0 auto; background: #fff; border-radius: 1rem; padding: 1.5rem; }
    h2 { font-size: 1rem; color: #64748b; }
    form.add, .controls, .actions { display: flex; gap: 0.5rem; margin-bottom: 1rem; }
    input[type="text"] { flex: 1; }
    button, a.button { border: 0; border-radius: 0.5rem; padding: 0.5rem 0.75rem; background: #a7c7e7; color: #0f172a; text-decoration: none; }
    button.delete { background: #e7a7a7; }
    .notice { padding: 0.75rem; border-radius: 0.75rem; background: #dcfce7; color: #166534; }
    .todo { display: flex; justify-content: space-between; padding: 0.75rem; margin-bottom: 0.5rem; border-radius: 0.75rem; background: #e8f5e9; }
    .todo.overdue { background: #fef2f2; }
    .todo.checked .title { text-decoration: line-through; color: #94a3b8; }
    .todo .time { font-size: 0.75rem; color: #94a3b8; }
"#;

pub fn render_page(store: &Store, page: &PageState, now: DateTime<Utc>) -> String {
    let mut body = String::new();
    body.push_str(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>todofile</title>
  <style>
"#,
    );
    body.push_str(STYLESHEET);
    body.push_str(
        r#"  </style>
</head>
<body>
  <div class="app">
    <h1>todofile</h1>
"#,
    );

    if let Some(todo) = page.done.and_then(|id| store.get(id)).filter(|todo| todo.checked) {
        body.push_str(&format!(
            "    <div class=\"notice\">Done: {}</div>\n",
            html_escape(&todo.description)
        ));
    }

    body.push_str(
        r#"    <form class="add" method="post" action="/add">
      <input type="text" name="description" placeholder="New todo" required />
      <input type="datetime-local" name="deadline" required />
      <button type="submit">Add item</button>
    </form>
    <div class="controls">
      <form method="post" action="/delete-checked">
        <button class="delete" type="submit">Delete checked</button>
      </form>
    </div>
"#,
    );

    if store.list().is_empty() {
        body.push_str("    <div class=\"time\">Nothing to do yet. Add a task above.</div>\n");
    } else {
        let (overdue, upcoming) = store.partition_overdue(now);
        if !overdue.is_empty() {
            render_group(&mut body, "Overdue", &overdue, page, now);
        }
        if !upcoming.is_empty() {
            render_group(&mut body, "Upcoming", &upcoming, page, now);
        }
    }

    body.push_str(
        r#"  </div>
</body>
</html>"#,
    );

    body
}

fn render_group(
    body: &mut String,
    heading: &str,
    todos: &[&TodoItem],
    page: &PageState,
    now: DateTime<Utc>,
) {
    body.push_str(&format!(
        "    <h2>{heading}</h2>\n    <div class=\"todo-list\">\n"
    ));
    for todo in todos {
        if page.edit == Some(todo.id) {
            render_edit_form(body, todo);
        } else {
            render_item(body, todo, now);
        }
    }
    body.push_str("    </div>\n");
}

fn render_item(body: &mut String, todo: &TodoItem, now: DateTime<Utc>) {
    let mut class = String::from("todo");
    if todo.is_overdue(now) {
        class.push_str(" overdue");
    }
    if todo.checked {
        class.push_str(" checked");
    }
    let due = match todo.deadline {
        Some(deadline) => format!(
            "Due {}",
            deadline.with_timezone(&Local).format("%d.%m.%Y %H:%M")
        ),
        None => "No deadline".to_string(),
    };
    let toggle_label = if todo.checked { "Uncheck" } else { "Check" };

    body.push_str(&format!(
        r#"      <div class="{class}" id="todo-{id}">
        <div class="meta">
          <div class="title">{title}</div>
          <div class="time">{due}</div>
        </div>
        <div class="actions">
          <form method="post" action="/toggle">
            <input type="hidden" name="id" value="{id}" />
            <button type="submit">{toggle_label}</button>
          </form>
          <a class="button" href="/?edit={id}">Edit</a>
        </div>
      </div>
"#,
        id = todo.id,
        title = html_escape(&todo.description),
    ));
}

fn render_edit_form(body: &mut String, todo: &TodoItem) {
    let deadline = todo
        .deadline
        .map(|deadline| {
            deadline
                .with_timezone(&Local)
                .format("%Y-%m-%dT%H:%M")
                .to_string()
        })
        .unwrap_or_default();

    body.push_str(&format!(
        r#"      <form class="todo editing" id="todo-{id}" method="post" action="/edit">
        <input type="hidden" name="id" value="{id}" />
        <input type="text" name="description" value="{title}" required />
        <input type="datetime-local" name="deadline" value="{deadline}" />
        <div class="actions">
          <button type="submit">Save</button>
          <a class="button" href="/">Cancel</a>
        </div>
      </form>
"#,
        id = todo.id,
        title = html_escape(&todo.description),
    ));
}

fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
