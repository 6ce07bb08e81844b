//! In-process Bot API double for transport tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

type Responder = dyn Fn(&str, &Value, usize) -> Value + Send + Sync;

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    responder: Arc<Responder>,
}

/// Records every call as `(lowercased method, JSON body)` and answers with
/// `responder(method, body, nth call of that method)`.
pub struct MockBotApi {
    url: String,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl MockBotApi {
    pub async fn serve(
        responder: impl Fn(&str, &Value, usize) -> Value + Send + Sync + 'static,
    ) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: Arc::clone(&requests),
            responder: Arc::new(responder),
        };
        let app = Router::new()
            .route("/{*path}", post(handle))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind mock bot api: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("mock bot api addr: {e}"));
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            url: format!("http://{addr}/"),
            requests,
            shutdown,
            server,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bot(&self) -> teloxide::Bot {
        let url = reqwest::Url::parse(&self.url).unwrap_or_else(|e| panic!("mock url: {e}"));
        teloxide::Bot::new("test-token").set_api_url(url)
    }

    /// Bodies of all calls to `method` (lowercase), in order.
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.server.await;
    }
}

async fn handle(State(state): State<MockState>, uri: Uri, body: Bytes) -> Json<Value> {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let nth = {
        let mut requests = state.requests.lock().unwrap_or_else(|e| e.into_inner());
        let nth = requests.iter().filter(|(m, _)| *m == method).count();
        requests.push((method.clone(), body.clone()));
        nth
    };
    if method == "getupdates" {
        // Keep idle polling loops from spinning.
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Json((state.responder)(&method, &body, nth))
}

pub fn ok_response(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}

pub fn error_response(code: u16, description: &str) -> Value {
    json!({ "ok": false, "error_code": code, "description": description })
}

pub fn message_response(chat_id: i64) -> Value {
    ok_response(json!({
        "message_id": 1,
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
        "text": "ok"
    }))
}
