//! In-process stand-in for the supplier registry backend, plus console
//! doubles for driving the client against it.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use supplier_admin::api::HttpTransport;
use supplier_admin::config::Config;
use supplier_admin::session::SessionStore;
use supplier_admin::ui::{Confirmer, ListView, LoadingIndicator, Navigator, Notifier, Route};
use supplier_admin::AppState;

struct Account {
    id: String,
    username: String,
    email: String,
    password: String,
    role: String,
    active: bool,
}

impl Account {
    fn public(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "role": self.role,
            "active": self.active,
        })
    }
}

#[derive(Default)]
struct Db {
    suppliers: Vec<Value>,
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
}

/// Shared backend state. Suppliers are served as an id-keyed object and
/// users as an array, the two shapes the real backend produces.
#[derive(Default)]
pub struct Backend {
    db: Mutex<Db>,
    next_id: AtomicUsize,
    revoked: AtomicBool,
}

impl Backend {
    pub fn seeded() -> Arc<Self> {
        let backend = Arc::new(Self::default());
        backend.add_account("admin", "admin@example.com", "admin123", "admin");
        backend.add_account("alice", "alice@example.com", "pw123", "user");
        backend.add_supplier("Zeta Comércio", "12345678000190", "z@zeta.com", "11955512345");
        backend.add_supplier("Alpha Ltda", "98765432000121", "a@alpha.com", "2133334444");
        backend
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn add_account(&self, username: &str, email: &str, password: &str, role: &str) -> String {
        let id = self.next_id("usr");
        self.db.lock().accounts.push(Account {
            id: id.clone(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
            active: true,
        });
        id
    }

    pub fn add_supplier(&self, name: &str, cnpj: &str, email: &str, phone: &str) -> String {
        let id = self.next_id("sup");
        self.db.lock().suppliers.push(json!({
            "id": id, "name": name, "cnpj": cnpj, "email": email, "phone": phone
        }));
        id
    }

    pub fn supplier_count(&self) -> usize {
        self.db.lock().suppliers.len()
    }

    pub fn account(&self, username: &str) -> Option<Value> {
        self.db
            .lock()
            .accounts
            .iter()
            .find(|a| a.username == username)
            .map(Account::public)
    }

    /// Every token issued so far starts failing with 401.
    pub fn revoke_tokens(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    fn caller(&self, headers: &HeaderMap) -> Option<String> {
        if self.revoked.load(Ordering::SeqCst) {
            return None;
        }
        let token = headers
            .get("authorization")?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.db.lock().tokens.get(token).cloned()
    }

    fn is_admin(&self, username: &str) -> bool {
        self.db
            .lock()
            .accounts
            .iter()
            .any(|a| a.username == username && a.role == "admin")
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn unauthorized() -> Response {
    reply(
        StatusCode::UNAUTHORIZED,
        json!({ "success": false, "message": "Token inválido" }),
    )
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<LoginBody>) -> Response {
    let user = {
        let db = backend.db.lock();
        db.accounts
            .iter()
            .find(|a| a.username == body.username && a.password == body.password && a.active)
            .map(|a| (a.username.clone(), a.public()))
    };
    let Some((username, user)) = user else {
        return reply(
            StatusCode::UNAUTHORIZED,
            json!({ "success": false, "message": "Usuário ou senha inválidos" }),
        );
    };

    let token = format!("tok-{}-{}", username, backend.next_id.load(Ordering::SeqCst));
    backend.db.lock().tokens.insert(token.clone(), username);
    reply(
        StatusCode::OK,
        json!({ "success": true, "token": token, "user": user }),
    )
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(State(backend): State<Arc<Backend>>, Json(body): Json<RegisterBody>) -> Response {
    let taken = backend
        .db
        .lock()
        .accounts
        .iter()
        .any(|a| a.username == body.username || a.email == body.email);
    if taken {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Usuário já existe" }),
        );
    }

    backend.add_account(&body.username, &body.email, &body.password, "user");
    let user = backend.account(&body.username);
    reply(StatusCode::CREATED, json!({ "success": true, "user": user }))
}

async fn list_suppliers(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    let data: Map<String, Value> = backend
        .db
        .lock()
        .suppliers
        .iter()
        .map(|s| (s["id"].as_str().unwrap_or_default().to_string(), s.clone()))
        .collect();
    reply(StatusCode::OK, json!({ "success": true, "data": data }))
}

async fn create_supplier(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    let cnpj = body["cnpj"].as_str().unwrap_or_default().to_string();
    let duplicate = backend
        .db
        .lock()
        .suppliers
        .iter()
        .any(|s| s["cnpj"] == cnpj.as_str());
    if duplicate {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "CNPJ já cadastrado" }),
        );
    }

    let id = backend.add_supplier(
        body["name"].as_str().unwrap_or_default(),
        &cnpj,
        body["email"].as_str().unwrap_or_default(),
        body["phone"].as_str().unwrap_or_default(),
    );
    reply(StatusCode::CREATED, json!({ "success": true, "data": { "id": id } }))
}

async fn update_supplier(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    let mut db = backend.db.lock();
    let Some(supplier) = db.suppliers.iter_mut().find(|s| s["id"] == id.as_str()) else {
        return reply(
            StatusCode::NOT_FOUND,
            json!({ "success": false, "message": "Fornecedor não encontrado" }),
        );
    };
    for field in ["name", "cnpj", "email", "phone"] {
        if let Some(value) = body.get(field) {
            supplier[field] = value.clone();
        }
    }
    reply(StatusCode::OK, json!({ "success": true }))
}

async fn delete_supplier(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    backend.db.lock().suppliers.retain(|s| s["id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

async fn list_users(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let Some(caller) = backend.caller(&headers) else {
        return unauthorized();
    };
    if !backend.is_admin(&caller) {
        return reply(
            StatusCode::FORBIDDEN,
            json!({ "success": false, "message": "Acesso negado" }),
        );
    }
    let data: Vec<Value> = backend.db.lock().accounts.iter().map(Account::public).collect();
    reply(StatusCode::OK, json!({ "success": true, "data": data }))
}

async fn update_user(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(caller) = backend.caller(&headers) else {
        return unauthorized();
    };
    if !backend.is_admin(&caller) {
        return reply(
            StatusCode::FORBIDDEN,
            json!({ "success": false, "message": "Acesso negado" }),
        );
    }
    let mut db = backend.db.lock();
    let Some(account) = db.accounts.iter_mut().find(|a| a.id == id) else {
        return reply(
            StatusCode::NOT_FOUND,
            json!({ "success": false, "message": "Usuário não encontrado" }),
        );
    };
    if let Some(role) = body["role"].as_str() {
        account.role = role.to_string();
    }
    if let Some(active) = body["active"].as_bool() {
        account.active = active;
    }
    if let Some(email) = body["email"].as_str() {
        account.email = email.to_string();
    }
    if let Some(password) = body["password"].as_str() {
        account.password = password.to_string();
    }
    reply(StatusCode::OK, json!({ "success": true }))
}

async fn delete_user(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if backend.caller(&headers).is_none() {
        return unauthorized();
    }
    backend.db.lock().accounts.retain(|a| a.id != id);
    reply(StatusCode::OK, json!({ "success": true }))
}

/// Bind the stub on an ephemeral port and return its base URL.
pub async fn spawn_backend(backend: Arc<Backend>) -> String {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/:id", put(update_supplier).delete(delete_supplier))
        .route("/users", get(list_users))
        .route("/users/:id", put(update_user).delete(delete_user))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Default)]
pub struct Notices {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl Notifier for Notices {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

pub struct Answer(pub bool);

impl Confirmer for Answer {
    fn confirm(&self, _title: &str, _text: &str) -> bool {
        self.0
    }
}

/// Discards rendered rows; tests read the controller's projection instead.
pub struct NullView;

impl<E> ListView<E> for NullView {
    fn render(&self, _rows: &[E]) {}
}

pub struct Client {
    pub app: Arc<AppState>,
    pub notices: Arc<Notices>,
}

/// Client state pointed at `base_url`, sharing `session`.
pub fn client(base_url: &str, session: SessionStore, confirm: bool) -> Client {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    let transport = HttpTransport::new(base_url, None).unwrap();
    let notices = Arc::new(Notices::default());
    let app = AppState::new(
        config,
        session,
        Arc::new(transport),
        Navigator::new(Route::Login),
        notices.clone(),
        Arc::new(Answer(confirm)),
        LoadingIndicator::new(),
    );
    Client {
        app: Arc::new(app),
        notices,
    }
}
