//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use tokio::sync::Semaphore;

use crate::api::{ApiError, ApiRequest, Method, RawResponse, Transport};
use crate::config::Config;
use crate::models::{Role, UserProfile};
use crate::session::SessionStore;
use crate::ui::{Confirmer, ListView, LoadingIndicator, Navigator, Notifier, Route};
use crate::AppState;

/// Scripted transport. Each route replays its queued responses in order and
/// keeps answering with the last one; unknown routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<RawResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<(Method, String), Arc<Semaphore>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: Method, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(RawResponse {
                status,
                body: body.to_string(),
            });
    }

    /// Hold responses on one route until permits are added to the returned gate.
    pub fn hold(&self, method: Method, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .insert((method, path.to_string()), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let key = (request.method, request.path.clone());
        self.requests.lock().push(request);

        let gate = self.gates.lock().get(&key).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut routes = self.routes.lock();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| RawResponse {
            status: 404,
            body: r#"{"success":false,"message":"no route"}"#.to_string(),
        }))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

/// Answers every prompt with a fixed value and counts prompts.
pub struct ScriptedConfirmer {
    answer: AtomicBool,
    asked: AtomicUsize,
    asked_on: Mutex<Option<ThreadId>>,
}

impl ScriptedConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer: AtomicBool::new(answer),
            asked: AtomicUsize::new(0),
            asked_on: Mutex::new(None),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }

    /// Thread the last prompt ran on.
    pub fn asked_on(&self) -> Option<ThreadId> {
        *self.asked_on.lock()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, _title: &str, _text: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        *self.asked_on.lock() = Some(std::thread::current().id());
        self.answer.load(Ordering::SeqCst)
    }
}

/// Keeps every rendered projection.
pub struct RecordingView<E> {
    pub renders: Mutex<Vec<Vec<E>>>,
}

impl<E: Clone> RecordingView<E> {
    pub fn new() -> Self {
        Self {
            renders: Mutex::new(Vec::new()),
        }
    }

    pub fn last(&self) -> Option<Vec<E>> {
        self.renders.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.renders.lock().len()
    }
}

impl<E: Clone + Send + Sync> ListView<E> for RecordingView<E> {
    fn render(&self, rows: &[E]) {
        self.renders.lock().push(rows.to_vec());
    }
}

pub fn admin_profile() -> UserProfile {
    UserProfile {
        id: "usr_admin".to_string(),
        username: "admin".to_string(),
        role: Role::Admin,
        email: "admin@example.com".to_string(),
    }
}

pub fn alice_profile() -> UserProfile {
    UserProfile {
        id: "usr_alice".to_string(),
        username: "alice".to_string(),
        role: Role::User,
        email: "alice@example.com".to_string(),
    }
}

/// Application state wired to test doubles.
pub struct Harness {
    pub app: Arc<AppState>,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub confirmer: Arc<ScriptedConfirmer>,
}

impl Harness {
    pub fn new(confirm_answer: bool) -> Self {
        Self::with_session(SessionStore::in_memory(), confirm_answer)
    }

    pub fn with_session(session: SessionStore, confirm_answer: bool) -> Self {
        let transport = Arc::new(MockTransport::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let confirmer = Arc::new(ScriptedConfirmer::new(confirm_answer));
        let app = Arc::new(AppState::new(
            Config::default(),
            session,
            transport.clone(),
            Navigator::new(Route::Login),
            notifier.clone(),
            confirmer.clone(),
            LoadingIndicator::new(),
        ));

        Self {
            app,
            transport,
            notifier,
            confirmer,
        }
    }

    /// Harness with `profile` already signed in and on the suppliers page.
    pub fn signed_in(profile: &UserProfile, confirm_answer: bool) -> Self {
        let harness = Self::new(confirm_answer);
        harness
            .app
            .session
            .set_session("tok-test", profile)
            .expect("memory store never fails");
        harness.app.navigator.redirect(Route::Suppliers);
        harness
    }
}
