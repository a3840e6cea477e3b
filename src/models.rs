use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Zero or negative only for entries written before ids existed; the
    /// store replaces those on load.
    #[serde(default)]
    pub id: i64,
    pub description: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// True when the deadline lies strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline < now)
    }
}

/// Body of `POST /todos`.
#[derive(Debug, Default, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

/// Body of `PUT /todos/:id`. Absent fields stay untouched; `deadline: null`
/// clears the deadline.
#[derive(Debug, Default, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchDeleted {
    pub message: String,
    pub deleted: Vec<i64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
