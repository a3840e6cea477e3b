use reqwest::{redirect, Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use todofile::{router, AppState, JsonFile, Store, TodoItem};

struct TestServer {
    base: String,
    client: Client,
    _dir: TempDir,
    data_file: std::path::PathBuf,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let data_file = dir.path().join("todos.json");
        let store = Store::load(JsonFile::new(&data_file));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(AppState::new(store)))
                .await
                .unwrap();
        });

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();
        Self {
            base: format!("http://{addr}"),
            client,
            _dir: dir,
            data_file,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn create(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/todos"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn list(&self) -> Vec<TodoItem> {
        let response = self.client.get(self.url("/todos")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.unwrap()
    }

    async fn put(&self, id: i64, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/todos/{id}")))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, id: i64) -> reqwest::Response {
        self.client
            .delete(self.url(&format!("/todos/{id}")))
            .send()
            .await
            .unwrap()
    }

    async fn page(&self, path: &str) -> String {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        response.text().await.unwrap()
    }
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn buy_milk_walk_dog() {
    let server = TestServer::start().await;
    assert!(server.list().await.is_empty());

    let response = server.create(json!({"description": "buy milk"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let milk: TodoItem = response.json().await.unwrap();
    assert_eq!(milk.id, 1);
    assert!(!milk.checked);
    assert_eq!(milk.deadline, None);

    let dog: TodoItem = server
        .create(json!({"description": "walk dog"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dog.id, 2);

    let response = server.put(1, json!({"checked": true})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let milk: TodoItem = response.json().await.unwrap();
    assert!(milk.checked);
    assert_eq!(milk.description, "buy milk");
    assert_eq!(server.list().await, vec![milk.clone(), dog]);

    let response = server.delete(2).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Todo deleted"}));
    assert_eq!(server.list().await, vec![milk]);

    let response = server.delete(2).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Todo not found"}));
}

#[tokio::test]
async fn create_requires_description() {
    let server = TestServer::start().await;

    for body in [json!({}), json!({"description": ""}), json!({"description": "  "})] {
        let response = server.create(body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"message": "Description is required"}));
    }
    assert!(server.list().await.is_empty());
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let server = TestServer::start().await;
    server.create(json!({"description": "exists"})).await;

    let response = server.put(7, json!({"checked": true})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list = server.list().await;
    assert_eq!(list.len(), 1);
    assert!(!list[0].checked);
}

#[tokio::test]
async fn update_checks_id_before_description() {
    let server = TestServer::start().await;
    server.create(json!({"description": "exists"})).await;

    let response = server.put(99, json!({"description": ""})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Todo not found"}));

    let response = server.put(1, json!({"description": "  "})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Description is required"}));
    assert_eq!(server.list().await[0].description, "exists");
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let server = TestServer::start().await;
    server.create(json!({"description": "exists"})).await;

    let response = server
        .client
        .put(server.url("/todos/abc"))
        .json(&json!({"checked": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Todo not found"}));

    let response = server
        .client
        .delete(server.url("/todos/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "Todo not found"}));
    assert_eq!(server.list().await.len(), 1);
}

#[tokio::test]
async fn deadline_round_trips_and_clears() {
    let server = TestServer::start().await;
    let created: TodoItem = server
        .create(json!({"description": "submit form", "deadline": "2026-11-30T17:00:00Z"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(
        created.deadline.map(|deadline| deadline.to_rfc3339()),
        Some("2026-11-30T17:00:00+00:00".to_string())
    );

    let renamed: TodoItem = server
        .put(created.id, json!({"description": "submit tax form"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(renamed.deadline, created.deadline);

    let cleared: TodoItem = server
        .put(created.id, json!({"deadline": null}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(cleared.deadline, None);
    assert_eq!(cleared.description, "submit tax form");
}

#[tokio::test]
async fn delete_checked_removes_only_checked() {
    let server = TestServer::start().await;
    for description in ["one", "two", "three"] {
        server.create(json!({"description": description})).await;
    }
    server.put(1, json!({"checked": true})).await;
    server.put(3, json!({"checked": true})).await;

    let response = server
        .client
        .delete(server.url("/todos/checked"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], json!([1, 3]));

    let ids: Vec<i64> = server.list().await.iter().map(|todo| todo.id).collect();
    assert_eq!(ids, vec![2]);
}

#[tokio::test]
async fn snapshot_matches_last_mutation() {
    let server = TestServer::start().await;
    server.create(json!({"description": "alpha"})).await;
    server.create(json!({"description": "beta"})).await;
    server.put(2, json!({"checked": true})).await;
    server.delete(1).await;

    let served = server.list().await;
    let reloaded = Store::load(JsonFile::new(&server.data_file));
    assert_eq!(reloaded.list(), served.as_slice());
}

#[tokio::test]
async fn page_flow_add_toggle_edit_delete() {
    let server = TestServer::start().await;
    assert!(server.page("/").await.contains("Nothing to do yet"));

    let response = server
        .client
        .post(server.url("/add"))
        .form(&[("description", "water plants"), ("deadline", "2020-01-01T09:00:00Z")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let html = server.page("/").await;
    assert!(html.contains("<h2>Overdue</h2>"));
    assert!(html.contains("water plants"));

    let response = server
        .client
        .post(server.url("/toggle"))
        .form(&[("id", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/?done=1");
    assert!(server
        .page("/?done=1")
        .await
        .contains("<div class=\"notice\">Done: water plants</div>"));
    assert!(!server.page("/").await.contains("class=\"notice\""));

    let html = server.page("/?edit=1").await;
    assert!(html.contains(r#"<form class="todo editing" id="todo-1""#));

    let response = server
        .client
        .post(server.url("/edit"))
        .form(&[("id", "1"), ("description", "water all plants"), ("deadline", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let list = server.list().await;
    assert_eq!(list[0].description, "water all plants");
    assert_eq!(list[0].deadline, None);
    assert!(list[0].checked);

    let response = server
        .client
        .post(server.url("/delete-checked"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(server.list().await.is_empty());
}

#[tokio::test]
async fn page_add_requires_both_fields() {
    let server = TestServer::start().await;

    for form in [
        [("description", ""), ("deadline", "2026-12-01T10:00")],
        [("description", "call bank"), ("deadline", "")],
        [("description", "call bank"), ("deadline", "soon")],
    ] {
        let response = server
            .client
            .post(server.url("/add"))
            .form(&form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(server.list().await.is_empty());

    let response = server
        .client
        .post(server.url("/toggle"))
        .form(&[("id", "9")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
